//! Put command - stores entries in a session.

use anyhow::Result;
use clap::Args;
use serde_json::json;

use super::{Context, parse_entry};

/// Arguments for the put command.
#[derive(Args, Debug)]
pub struct PutArgs {
    /// Session id
    pub session_id: String,

    /// Entries as key=value (values are parsed as JSON when possible)
    #[arg(required = true)]
    pub entries: Vec<String>,
}

/// Run the put command.
pub fn run(args: PutArgs, ctx: &Context) -> Result<()> {
    let entries = args
        .entries
        .iter()
        .map(String::as_str)
        .map(parse_entry)
        .collect::<Result<Vec<_>>>()?;

    let stores = ctx.open()?;
    stores.store.save(&args.session_id, &entries)?;

    // Mirror the payload row's expiration into a dedicated expiration table.
    if stores.dedicated_expiration
        && let Some(expires_at) = stores.store.expires_at(&args.session_id)?
    {
        stores
            .tracker
            .save_expiration_date_time(&args.session_id, expires_at)?;
    }

    if ctx.json_output {
        let output = json!({ "session_id": args.session_id, "entries": entries.len() });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("Saved {} entries to {}", entries.len(), args.session_id);
    }
    Ok(())
}
