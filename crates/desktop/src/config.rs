//! Runtime configuration: environment first, flags override (both handled by
//! `clap`), then built-in defaults.

use std::path::PathBuf;

use shopledger_observability::LogFormat;

use crate::cli::Cli;

const APP_DIR: &str = "shopledger";
const DB_FILE: &str = "shop.db";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub db_path: PathBuf,
    pub log_format: LogFormat,
}

impl AppConfig {
    pub fn from_cli(cli: &Cli) -> Self {
        Self {
            db_path: cli.db.clone().unwrap_or_else(default_db_path),
            log_format: cli.log_format,
        }
    }
}

/// `{data_dir}/shopledger/shop.db`, with `~/.local/share` when the platform
/// has no data directory.
pub fn default_db_path() -> PathBuf {
    let base = dirs::data_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join(".local").join("share")))
        .unwrap_or_else(|| PathBuf::from("."));
    base.join(APP_DIR).join(DB_FILE)
}
