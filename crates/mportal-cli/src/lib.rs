//! # mportal-cli: Member Portal Operator CLI
//!
//! Small operator toolchain that sits beside the API service.
//!
//! ## Subcommands
//!
//! - `ref-id`: normalize a passport number and print its deterministic
//!   reference id, without touching the service
//! - `sweep`: trigger one batch recovery run against a deployed service,
//!   the way the scheduler does
//!
//! ## Crate Policy
//!
//! - Argument parsing lives in the `*Args` structs; handlers take parsed
//!   arguments and return `anyhow::Result`.
//! - Reference-id derivation delegates to `mportal-core` so the CLI and the
//!   service can never disagree.

pub mod ref_id;
pub mod sweep;
