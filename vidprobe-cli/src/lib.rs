// vidprobe-cli/src/lib.rs
//
// Library portion of the vidprobe CLI application.
// Contains argument definitions and command logic.

pub mod cli;
pub mod commands;

// Re-export items needed by the binary or integration tests
pub use cli::{Cli, Commands, FetchToolsArgs, ProbeArgs};
pub use commands::fetch::run_fetch_tools;
pub use commands::probe::run_probe;
