//! CLI command implementations

mod list;
mod script;

pub use list::{list_adapters, list_backends};
pub use script::{cmd_repl, cmd_run};
