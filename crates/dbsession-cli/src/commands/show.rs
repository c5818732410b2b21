//! Show command - prints the entries of a session.

use anyhow::Result;
use clap::Args;
use console::{Style, style};
use dbsession::{SessionEntry, SessionError};
use serde::Serialize;

use super::Context;

/// Arguments for the show command.
#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Session id
    pub session_id: String,
}

/// Show output for JSON.
#[derive(Debug, Serialize)]
struct ShowOutput {
    session_id: String,
    state: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    expired_at: Option<String>,
    entries: Vec<SessionEntry>,
}

/// Run the show command.
pub fn run(args: ShowArgs, ctx: &Context) -> Result<()> {
    let stores = ctx.open()?;

    let output = match stores.store.load(&args.session_id) {
        Ok(entries) if entries.is_empty() => ShowOutput {
            session_id: args.session_id,
            state: "missing",
            expired_at: None,
            entries,
        },
        Ok(entries) => ShowOutput {
            session_id: args.session_id,
            state: "active",
            expired_at: None,
            entries,
        },
        Err(SessionError::Expired(expired)) => ShowOutput {
            session_id: args.session_id,
            state: "expired",
            expired_at: Some(expired.expires_at.to_rfc3339()),
            entries: expired.entries,
        },
        Err(e) => return Err(e.into()),
    };

    if ctx.json_output {
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    let dim = Style::new().dim();
    let state = match output.state {
        "active" => Style::new().green().apply_to(output.state),
        "expired" => Style::new().yellow().apply_to(output.state),
        _ => Style::new().red().apply_to(output.state),
    };
    println!();
    println!("{} {}", style(&output.session_id).bold(), state);
    if let Some(expired_at) = &output.expired_at {
        println!("  {} {}", dim.apply_to("Expired at:"), expired_at);
    }
    for entry in &output.entries {
        println!("  {} {}", dim.apply_to(format!("{}:", entry.key)), entry.value);
    }
    println!();
    Ok(())
}
