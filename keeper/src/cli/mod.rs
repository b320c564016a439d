//! Command-line interface for keeper.

mod args;
mod commands;

pub use args::{Cli, Commands, RequestSpec};
pub use commands::execute;
