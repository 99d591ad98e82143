//! # mportal CLI Entry Point
//!
//! Assembles subcommands and dispatches to handler modules.

use clap::Parser;

/// Member portal operator toolchain.
#[derive(Parser, Debug)]
#[command(name = "mportal", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Print the normalized passport and reference id.
    RefId(mportal_cli::ref_id::RefIdArgs),
    /// Trigger one batch recovery run on a deployed service.
    Sweep(mportal_cli::sweep::SweepArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::RefId(args) => mportal_cli::ref_id::run(&args),
        Commands::Sweep(args) => mportal_cli::sweep::run(&args).await,
    }
}
