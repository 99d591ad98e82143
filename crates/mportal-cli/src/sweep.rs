//! # Sweep Subcommand
//!
//! Calls `POST /api/storehub/retry` on a running service with the automation
//! secret, then prints the batch report. Intended for cron hosts that have
//! the binary but no HTTP tooling.

use std::time::Duration;

use anyhow::Context;
use clap::Args;
use serde::Deserialize;

/// Path of the batch recovery endpoint.
pub const RETRY_PATH: &str = "/api/storehub/retry";

/// Arguments for the sweep subcommand.
#[derive(Args, Debug)]
pub struct SweepArgs {
    /// Base URL of the member portal API.
    #[arg(long, env = "PORTAL_URL", default_value = "http://localhost:8080")]
    pub url: String,

    /// Automation secret shared with the service.
    #[arg(long, env = "CRON_SECRET", hide_env_values = true)]
    pub secret: String,

    /// Request timeout in seconds.
    #[arg(long, default_value_t = 120)]
    pub timeout_secs: u64,
}

/// Counts reported by one batch run.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
pub struct SweepReport {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
}

#[derive(Debug, Deserialize)]
struct SweepResponse {
    success: bool,
    #[serde(default)]
    message: Option<String>,
    results: Option<SweepReport>,
}

fn endpoint(base: &str) -> String {
    format!("{}{}", base.trim_end_matches('/'), RETRY_PATH)
}

/// Run one sweep and return the report.
pub async fn sweep(args: &SweepArgs) -> anyhow::Result<SweepReport> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(args.timeout_secs))
        .build()
        .context("building HTTP client")?;

    let url = endpoint(&args.url);
    tracing::debug!(%url, "triggering batch recovery");

    let resp = client
        .post(&url)
        .bearer_auth(&args.secret)
        .send()
        .await
        .with_context(|| format!("POST {url}"))?;

    let status = resp.status();
    if status == reqwest::StatusCode::UNAUTHORIZED {
        anyhow::bail!("service rejected the automation secret");
    }
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        anyhow::bail!("batch recovery failed with HTTP {status}: {body}");
    }

    let body: SweepResponse = resp.json().await.context("decoding batch report")?;
    match (body.success, body.results) {
        (true, Some(report)) => Ok(report),
        _ => anyhow::bail!(
            "batch recovery reported failure: {}",
            body.message.unwrap_or_else(|| "no message".into())
        ),
    }
}

pub async fn run(args: &SweepArgs) -> anyhow::Result<()> {
    let report = sweep(args).await?;
    tracing::info!(
        total = report.total,
        succeeded = report.succeeded,
        failed = report.failed,
        "sweep complete"
    );
    println!(
        "{}",
        serde_json::json!({
            "total": report.total,
            "succeeded": report.succeeded,
            "failed": report.failed,
        })
    );
    Ok(())
}
