//! Touch command - extends a session's expiration.

use std::time::Duration;

use anyhow::Result;
use chrono::{TimeDelta, Utc};
use clap::Args;
use serde_json::json;

use super::Context;

/// Arguments for the touch command.
#[derive(Args, Debug)]
pub struct TouchArgs {
    /// Session id
    pub session_id: String,

    /// Seconds from now until expiration (default: the store TTL)
    #[arg(long)]
    pub ttl_secs: Option<u64>,
}

/// Run the touch command.
pub fn run(args: TouchArgs, ctx: &Context) -> Result<()> {
    let stores = ctx.open()?;
    let ttl = args
        .ttl_secs
        .map(Duration::from_secs)
        .unwrap_or_else(|| stores.store.ttl());
    let expires_at = Utc::now() + TimeDelta::from_std(ttl)?;

    stores
        .tracker
        .save_expiration_date_time(&args.session_id, expires_at)?;

    if ctx.json_output {
        let output = json!({
            "session_id": args.session_id,
            "expires_at": expires_at.to_rfc3339(),
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("{} expires at {}", args.session_id, expires_at.to_rfc3339());
    }
    Ok(())
}
