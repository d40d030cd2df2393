//! `shopledger` command-line shell.
//!
//! Parses arguments, opens the store and renders entity listings and reports
//! as terminal tables or JSON.

pub mod cli;
pub mod commands;
pub mod config;
pub mod render;

pub use cli::Cli;
pub use commands::{execute, run};
pub use config::AppConfig;
