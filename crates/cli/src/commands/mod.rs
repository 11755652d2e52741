//! Subcommand implementations.

pub mod migrate;
pub mod settings;
pub mod webhook;
