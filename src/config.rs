// SPDX-FileCopyrightText: 2025 Joost van der Laan <joost@fashionunited.com>
//
// SPDX-License-Identifier: AGPL-3.0-only

use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use tracing::{info, warn};

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/116.0.0.0 Safari/537.36";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub tickers: Vec<String>,
    pub data_dir: PathBuf,
    pub symbol_delay_secs: u64,
    pub request_timeout_secs: u64,
    pub user_agent: String,
    pub sheets: SheetsConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SheetsConfig {
    pub spreadsheet_id: Option<String>,
    pub base_url: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tickers: ["AAPL", "AMC", "AMZN", "F", "GOOGL", "MSFT"]
                .iter()
                .map(|t| t.to_string())
                .collect(),
            data_dir: PathBuf::from("stock_data"),
            symbol_delay_secs: 15,
            request_timeout_secs: 120,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            sheets: SheetsConfig::default(),
        }
    }
}

impl Config {
    pub fn symbol_delay(&self) -> Duration {
        Duration::from_secs(self.symbol_delay_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn get_config_path() -> PathBuf {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("config.toml");
    path
}

/// Loads `config.toml` from the crate root.
pub fn load_config() -> anyhow::Result<Config> {
    load_config_from(&get_config_path())
}

/// Loads the config at `path`; a missing file yields the defaults.
pub fn load_config_from(path: &Path) -> anyhow::Result<Config> {
    match fs::read_to_string(path) {
        Ok(config_str) => {
            let config = toml::from_str(&config_str)
                .with_context(|| format!("Failed to parse {}", path.display()))?;
            info!(path = %path.display(), "Loaded config");
            Ok(config)
        }
        Err(e) if e.kind() == ErrorKind::NotFound => {
            warn!(path = %path.display(), "Config file not found, using defaults");
            Ok(Config::default())
        }
        Err(e) => Err(e).with_context(|| format!("Failed to read {}", path.display())),
    }
}
