//! Status command - shows the expiration status of a session.

use anyhow::Result;
use chrono::Utc;
use clap::Args;
use console::{Style, style};
use dbsession::is_past;
use serde::Serialize;

use super::Context;

/// Arguments for the status command.
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Session id
    pub session_id: String,
}

/// Status response for JSON output.
#[derive(Debug, Serialize)]
struct StatusOutput {
    session_id: String,
    determinable: bool,
    expired: bool,
    expires_at: Option<String>,
}

/// Run the status command.
pub fn run(args: StatusArgs, ctx: &Context) -> Result<()> {
    let stores = ctx.open()?;
    let tracker = &stores.tracker;

    // One read, so the reported fields agree with each other.
    let expires_at = tracker.expires_at(&args.session_id)?;
    let now = Utc::now();
    let output = StatusOutput {
        determinable: expires_at.is_some(),
        expired: expires_at.is_none_or(|t| is_past(t, now)),
        expires_at: expires_at.map(|t| t.to_rfc3339()),
        session_id: args.session_id,
    };

    if ctx.json_output {
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    let dim = Style::new().dim();
    println!();
    println!("{}", style(&output.session_id).bold());
    println!("{}", dim.apply_to("─".repeat(40)));
    if !output.determinable {
        println!("  {} {}", dim.apply_to("Status:"), Style::new().red().apply_to("unknown"));
    } else if output.expired {
        println!("  {} {}", dim.apply_to("Status:"), Style::new().yellow().apply_to("expired"));
    } else {
        println!("  {} {}", dim.apply_to("Status:"), Style::new().green().apply_to("● active"));
    }
    if let Some(expires_at) = &output.expires_at {
        println!("  {} {}", dim.apply_to("Expires:"), expires_at);
    }
    println!();
    Ok(())
}
