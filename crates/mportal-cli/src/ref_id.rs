//! # Ref-Id Subcommand
//!
//! Prints the normalized passport and reference id for a passport number.
//! Staff use this to look a member up in StoreHub before a registration
//! exists in the portal.

use clap::Args;
use mportal_core::{normalize_passport, MIN_PASSPORT_LEN};
use serde::Serialize;

/// Arguments for the ref-id subcommand.
#[derive(Args, Debug)]
pub struct RefIdArgs {
    /// Passport number as written on the form.
    pub passport: String,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct RefIdOutput {
    pub normalized_passport: String,
    pub ref_id: String,
}

/// Derive the output for one passport number.
pub fn derive(args: &RefIdArgs) -> anyhow::Result<RefIdOutput> {
    let passport = normalize_passport(&args.passport);
    if passport.as_str().is_empty() {
        anyhow::bail!("passport number is empty after normalization");
    }
    if passport.as_str().chars().count() < MIN_PASSPORT_LEN {
        tracing::warn!(
            min = MIN_PASSPORT_LEN,
            "passport is shorter than the registration form accepts"
        );
    }
    Ok(RefIdOutput {
        ref_id: passport.ref_id().to_string(),
        normalized_passport: passport.as_str().to_string(),
    })
}

pub fn run(args: &RefIdArgs) -> anyhow::Result<()> {
    let output = derive(args)?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
