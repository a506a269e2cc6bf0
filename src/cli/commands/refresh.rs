//! Refresh command - pull from every provider

use crate::audit::{AuditEvent, AuditLog};
use crate::context::Context;
use crate::engine::Vault;
use crate::error::VaultResult;
use crate::ui::{self, UiContext};

/// Execute the refresh command
pub async fn execute(vault: &Vault, ctx: &Context, audit: &AuditLog) -> VaultResult<()> {
    let ui = UiContext::detect();

    if vault.provider_count() == 0 {
        ui::step_warn_hint(
            &ui,
            "No providers configured",
            "Add [[providers]] to the config file",
        );
        return Ok(());
    }

    vault.refresh(ctx).await?;

    audit
        .record(AuditEvent::Refreshed {
            providers: vault.provider_count(),
        })
        .await;

    ui::step_ok(
        &ui,
        &format!("Refreshed from {} provider(s)", vault.provider_count()),
    );
    Ok(())
}
