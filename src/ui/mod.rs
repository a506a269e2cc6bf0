//! Terminal output for the CLI
//!
//! Uses `cliclack` styling on interactive terminals and plain, greppable
//! lines everywhere else (pipes, CI).

mod context;
mod output;

pub use context::UiContext;
pub use output::{intro, key_value, step_info, step_ok, step_ok_detail, step_warn_hint};
