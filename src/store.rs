// SPDX-FileCopyrightText: 2025 Joost van der Laan <joost@fashionunited.com>
//
// SPDX-License-Identifier: AGPL-3.0-only

//! File layout under the data directory:
//!
//! ```text
//! <data_dir>/<SYMBOL>/<SYMBOL>.json
//! <data_dir>/<SYMBOL>/quarterly.json
//! <data_dir>/<SYMBOL>/historical_data_by_month.csv
//! ```
//!
//! Histories are always read whole and rewritten whole. Only one process may
//! write a given symbol's files at a time; nothing here locks them.

use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::StoreError;
use crate::history::History;
use crate::quarterly::QuarterlyHistory;

#[derive(Debug, Clone)]
pub struct HistoryStore {
    root: PathBuf,
}

impl HistoryStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn symbol_dir(&self, symbol: &str) -> PathBuf {
        self.root.join(symbol)
    }

    pub fn daily_path(&self, symbol: &str) -> PathBuf {
        self.symbol_dir(symbol).join(format!("{}.json", symbol))
    }

    pub fn quarterly_path(&self, symbol: &str) -> PathBuf {
        self.symbol_dir(symbol).join("quarterly.json")
    }

    pub fn historical_csv_path(&self, symbol: &str) -> PathBuf {
        self.symbol_dir(symbol).join("historical_data_by_month.csv")
    }

    /// `Ok(None)` when the symbol has never been scraped.
    pub fn load_daily(&self, symbol: &str) -> Result<Option<History>, StoreError> {
        read_json(&self.daily_path(symbol))
    }

    pub fn save_daily(&self, symbol: &str, history: &History) -> Result<(), StoreError> {
        write_json(&self.daily_path(symbol), history)
    }

    pub fn load_quarterly(&self, symbol: &str) -> Result<Option<QuarterlyHistory>, StoreError> {
        read_json(&self.quarterly_path(symbol))
    }

    pub fn save_quarterly(&self, symbol: &str, history: &QuarterlyHistory) -> Result<(), StoreError> {
        write_json(&self.quarterly_path(symbol), history)
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, StoreError> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(StoreError::Io {
                path: path.to_path_buf(),
                source,
            });
        }
    };

    serde_json::from_slice(&bytes)
        .map(Some)
        .map_err(|source| StoreError::MalformedHistory {
            path: path.to_path_buf(),
            source,
        })
}

/// Writes to a sibling temp file first so a crash never leaves half a history.
fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), StoreError> {
    let io_err = |source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(io_err)?;
    }

    let body = serde_json::to_string(value).map_err(|source| StoreError::Serialize {
        path: path.to_path_buf(),
        source,
    })?;

    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, body).map_err(io_err)?;
    fs::rename(&tmp, path).map_err(io_err)?;
    Ok(())
}
