// SPDX-FileCopyrightText: 2025 Joost van der Laan <joost@fashionunited.com>
//
// SPDX-License-Identifier: AGPL-3.0-only

use std::path::PathBuf;
use thiserror::Error;

/// Failures reading or writing a symbol's JSON history.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to access {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The file exists but is not valid JSON or does not have the history shape.
    /// There is no repair policy, the symbol is skipped.
    #[error("malformed history in {}: {source}", .path.display())]
    MalformedHistory {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to serialize history for {}: {source}", .path.display())]
    Serialize {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Failures talking to the spreadsheet service.
#[derive(Debug, Error)]
pub enum SheetError {
    #[error("worksheet '{0}' not found")]
    WorksheetNotFound(String),
    #[error("sheets API returned {status}: {body}")]
    Api { status: u16, body: String },
    #[error("sheets request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("invalid sheets url: {0}")]
    Url(String),
    #[error("invalid cell reference '{0}'")]
    InvalidCell(String),
}

/// Failures fetching or parsing a quote page.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("request to {url} timed out")]
    Timeout { url: String },
    #[error("request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} returned status {status}")]
    Status { url: String, status: u16 },
    #[error("invalid selector '{0}'")]
    Selector(String),
}

impl ScrapeError {
    pub fn from_reqwest(url: &str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout {
                url: url.to_string(),
            }
        } else {
            Self::Http {
                url: url.to_string(),
                source: err,
            }
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}
