// vidprobe-cli/src/commands/mod.rs
//
// Subcommand implementations.

pub mod fetch;
pub mod probe;
