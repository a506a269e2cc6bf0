//! CLI command implementations

pub mod config;
pub mod delete;
pub mod get;
pub mod list;
pub mod refresh;
pub mod set;

pub use config::execute as config;
pub use delete::execute as delete;
pub use get::execute as get;
pub use list::execute as list;
pub use refresh::execute as refresh;
pub use set::execute as set;

use crate::entry::Entry;
use crate::error::VaultResult;

pub(crate) fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> VaultResult<()> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{}", json);
    Ok(())
}

pub(crate) fn created_label(entry: &Entry) -> String {
    entry
        .created_at
        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".to_string())
}
