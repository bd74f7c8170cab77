//! Command-line interface definitions and helpers.
//!
//! This module contains all CLI argument parsing and subcommand handlers.

mod args;
mod commands;

pub use args::{Args, Command};
pub use commands::{attendance, handle_config_action, mark, register, session, CommandError};
