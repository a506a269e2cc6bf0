//! Delete command - remove an entry

use crate::audit::{AuditEvent, AuditLog};
use crate::cli::args::DeleteArgs;
use crate::context::Context;
use crate::engine::Vault;
use crate::error::VaultResult;
use crate::ui::{self, UiContext};

/// Execute the delete command
pub async fn execute(args: DeleteArgs, vault: &Vault, ctx: &Context, audit: &AuditLog) -> VaultResult<()> {
    vault.delete(ctx, &args.key).await?;

    audit
        .record(AuditEvent::EntryDeleted {
            key: args.key.clone(),
        })
        .await;

    ui::step_ok_detail(&UiContext::detect(), "Deleted", &args.key);
    Ok(())
}
