//! Delete command - removes a session.

use anyhow::Result;
use clap::Args;

use super::Context;

/// Arguments for the delete command.
#[derive(Args, Debug)]
pub struct DeleteArgs {
    /// Session id
    pub session_id: String,
}

/// Run the delete command.
pub fn run(args: DeleteArgs, ctx: &Context) -> Result<()> {
    let stores = ctx.open()?;
    stores.store.invalidate(&args.session_id)?;
    if stores.dedicated_expiration {
        stores.tracker.delete(&args.session_id)?;
    }

    if !ctx.json_output {
        println!("Deleted {}", args.session_id);
    } else {
        println!("{}", serde_json::json!({ "session_id": args.session_id, "deleted": true }));
    }
    Ok(())
}
