//! CLI, configuration, event files and output rendering
//!
//! This crate provides the `eventslot` command-line interface.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod event_file;
pub mod render;

pub use cli::Cli;
pub use error::{ClientError, ClientResult};
