//! List command - show stored entries

use super::{created_label, print_json};
use crate::cli::args::{ListArgs, OutputFormat};
use crate::context::Context;
use crate::engine::{Freshness, Vault};
use crate::entry::Entry;
use crate::error::VaultResult;
use crate::ui::{self, UiContext};
use chrono::Utc;
use console::style;

/// Execute the list command
pub async fn execute(args: ListArgs, vault: &Vault, ctx: &Context) -> VaultResult<()> {
    let mut entries = vault.list(ctx).await?;
    entries.sort_by(|a, b| a.key.cmp(&b.key));

    if entries.is_empty() {
        match args.format {
            OutputFormat::Json => println!("[]"),
            OutputFormat::Plain => {}
            OutputFormat::Table => ui::step_info(&UiContext::detect(), "No entries"),
        }
        return Ok(());
    }

    match args.format {
        OutputFormat::Table => print_table(&entries, vault),
        OutputFormat::Json => print_json(&entries)?,
        OutputFormat::Plain => print_plain(&entries),
    }

    Ok(())
}

fn print_table(entries: &[Entry], vault: &Vault) {
    let ctx = UiContext::detect();
    ui::intro(&ctx, "Entries");

    println!(
        "{:<30} {:<15} {:<18} {:<8}",
        style("KEY").bold(),
        style("SOURCE").bold(),
        style("CREATED").bold(),
        style("STATE").bold()
    );
    println!("{}", "-".repeat(74));

    let now = Utc::now();
    for entry in entries {
        let state = match vault.policy().classify(entry, now) {
            Freshness::Fresh => style("fresh").green(),
            Freshness::Stale => style("stale").yellow(),
        };

        println!(
            "{:<30} {:<15} {:<18} {:<8}",
            entry.key,
            entry.source,
            created_label(entry),
            state
        );
    }

    println!();
    println!("{} entr{}", entries.len(), if entries.len() == 1 { "y" } else { "ies" });
}

fn print_plain(entries: &[Entry]) {
    for entry in entries {
        println!("{}", entry.key);
    }
}
