//! Set command - store an entry directly

use crate::audit::{AuditEvent, AuditLog};
use crate::cli::args::SetArgs;
use crate::context::Context;
use crate::engine::Vault;
use crate::entry::{Entry, MANUAL_SOURCE};
use crate::error::VaultResult;
use crate::ui::{self, UiContext};

/// Execute the set command
pub async fn execute(args: SetArgs, vault: &Vault, ctx: &Context, audit: &AuditLog) -> VaultResult<()> {
    let mut entry = Entry::new(&args.key, args.value);
    if let Some(source) = args.source {
        entry = entry.with_source(source);
    }

    vault.set(ctx, entry.clone()).await?;

    let source = if entry.source.is_empty() {
        MANUAL_SOURCE
    } else {
        entry.source.as_str()
    };
    audit
        .record(AuditEvent::EntrySet {
            key: args.key.clone(),
            source: source.to_string(),
        })
        .await;

    ui::step_ok_detail(&UiContext::detect(), "Stored", &args.key);
    Ok(())
}
