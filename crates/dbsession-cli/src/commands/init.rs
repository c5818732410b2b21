//! Init command - creates the session tables.

use anyhow::Result;
use clap::Args;
use console::Style;
use serde_json::json;

use super::Context;

/// Arguments for the init command.
#[derive(Args, Debug)]
pub struct InitArgs {}

/// Run the init command.
pub fn run(_args: InitArgs, ctx: &Context) -> Result<()> {
    let stores = ctx.open()?;
    stores.store.create_table()?;
    if stores.dedicated_expiration {
        stores.tracker.create_table()?;
    }

    let payload_table = stores.store.schema().table_name.to_string();
    let expiration_table = stores.tracker.schema().table_name.to_string();

    if ctx.json_output {
        let output = json!({
            "payload_table": payload_table,
            "expiration_table": expiration_table,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        if ctx.verbose {
            println!("{}", stores.store.schema().create_table_sql());
            if stores.dedicated_expiration {
                println!("{}", stores.tracker.schema().create_table_sql());
            }
        }
        let green = Style::new().green();
        println!("{} {}", green.apply_to("✓"), payload_table);
        if stores.dedicated_expiration {
            println!("{} {}", green.apply_to("✓"), expiration_table);
        }
    }
    Ok(())
}
