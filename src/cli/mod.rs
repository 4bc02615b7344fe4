//! CLI module for helmsman - command-line interface and subcommands.

pub mod commands;

pub use commands::Cli;
