//! Get command - resolve a single entry

use super::{created_label, print_json};
use crate::cli::args::{GetArgs, OutputFormat};
use crate::context::Context;
use crate::engine::Vault;
use crate::error::{VaultError, VaultResult};
use crate::ui::{self, UiContext};

/// Execute the get command
pub async fn execute(args: GetArgs, vault: &Vault, ctx: &Context) -> VaultResult<()> {
    let entry = vault.get(ctx, &args.key).await.map_err(|e| match e {
        VaultError::NotFound => VaultError::User(format!("Entry not found: {}", args.key)),
        other => other,
    })?;

    match args.format {
        OutputFormat::Plain => println!("{}", entry.value),
        OutputFormat::Json => print_json(&entry)?,
        OutputFormat::Table => {
            let ui = UiContext::detect();
            ui::intro(&ui, &entry.key);
            ui::key_value(&ui, "value", &entry.value);
            ui::key_value(&ui, "source", &entry.source);
            ui::key_value(&ui, "created", &created_label(&entry));
        }
    }

    Ok(())
}
