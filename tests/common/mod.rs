// SPDX-FileCopyrightText: 2025 Joost van der Laan <joost@fashionunited.com>
//
// SPDX-License-Identifier: AGPL-3.0-only

//! Common test utilities and helpers
//!
//! This module provides reusable test infrastructure for the integration tests.
//! It includes:
//! - Field and profile fixtures for the AAPL walkthrough
//! - A scripted snapshot producer that counts its calls
//! - Temporary history stores

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::{Value, json};
use tempfile::TempDir;

use ticker_snapshots::error::ScrapeError;
use ticker_snapshots::models::{FieldMap, Profile, QuarterlySnapshot};
use ticker_snapshots::producer::SnapshotProducer;
use ticker_snapshots::store::HistoryStore;

pub fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").expect("valid test date")
}

/// Object literal to an ordered field map.
pub fn fields(value: Value) -> FieldMap {
    value.as_object().cloned().expect("object literal")
}

pub fn aapl_profile() -> Profile {
    Profile {
        company: fields(json!({
            "name": "Apple Inc.",
            "address": "One Apple Park Way",
            "citystatezip": "Cupertino, CA 95014",
            "country": "United States",
            "phone": "408 996 1010",
            "site": "https://www.apple.com"
        })),
        sector: fields(json!({
            "Sector(s)": "Technology",
            "Industry": "Consumer Electronics",
            "Full Time Employees": "161,000"
        })),
    }
}

pub fn aapl_summary(price: &str, change: &str, percent: &str, pe: &str) -> FieldMap {
    fields(json!({
        "stock_symbol": "AAPL",
        "market_price": price,
        "market_change": change,
        "market_percent": percent,
        "P/E Ratio": pe
    }))
}

pub fn sample_quarter() -> QuarterlySnapshot {
    QuarterlySnapshot {
        stats: fields(json!({"Market Cap (intraday)": "2.9T", "Beta (5Y Monthly)": "1.29"})),
        income: fields(json!({"Total Revenue": "81,797,000"})),
        balance: fields(json!({"Total Assets": "335,038,000"})),
        cash: fields(json!({"Free Cash Flow": "26,000,000"})),
    }
}

/// Producer returning canned data. Symbols listed in `failing` return an
/// HTTP status error from every call.
#[derive(Default)]
pub struct StubProducer {
    profiles: HashMap<String, Profile>,
    summaries: Mutex<HashMap<String, FieldMap>>,
    quarterly: Option<QuarterlySnapshot>,
    failing: HashSet<String>,
    pub profile_calls: AtomicUsize,
    pub summary_calls: AtomicUsize,
    pub quarterly_calls: AtomicUsize,
}

impl StubProducer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_profile(mut self, symbol: &str, profile: Profile) -> Self {
        self.profiles.insert(symbol.to_string(), profile);
        self
    }

    pub fn with_summary(self, symbol: &str, summary: FieldMap) -> Self {
        self.set_summary(symbol, summary);
        self
    }

    pub fn with_quarterly(mut self, snapshot: QuarterlySnapshot) -> Self {
        self.quarterly = Some(snapshot);
        self
    }

    pub fn failing(mut self, symbol: &str) -> Self {
        self.failing.insert(symbol.to_string());
        self
    }

    /// Replaces what the next summary scrape returns for `symbol`.
    pub fn set_summary(&self, symbol: &str, summary: FieldMap) {
        self.summaries
            .lock()
            .unwrap()
            .insert(symbol.to_string(), summary);
    }

    pub fn calls(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }

    fn check(&self, symbol: &str) -> Result<(), ScrapeError> {
        if self.failing.contains(symbol) {
            return Err(ScrapeError::Status {
                url: format!("https://finance.yahoo.com/quote/{}", symbol),
                status: 503,
            });
        }
        Ok(())
    }
}

#[async_trait]
impl SnapshotProducer for StubProducer {
    async fn profile(&self, symbol: &str) -> Result<Profile, ScrapeError> {
        self.profile_calls.fetch_add(1, Ordering::SeqCst);
        self.check(symbol)?;
        Ok(self.profiles.get(symbol).cloned().unwrap_or_default())
    }

    async fn summary(&self, symbol: &str) -> Result<FieldMap, ScrapeError> {
        self.summary_calls.fetch_add(1, Ordering::SeqCst);
        self.check(symbol)?;
        Ok(self
            .summaries
            .lock()
            .unwrap()
            .get(symbol)
            .cloned()
            .unwrap_or_default())
    }

    async fn quarterly(&self, symbol: &str) -> Result<QuarterlySnapshot, ScrapeError> {
        self.quarterly_calls.fetch_add(1, Ordering::SeqCst);
        self.check(symbol)?;
        Ok(self.quarterly.clone().unwrap_or_default())
    }
}

/// A history store rooted in a fresh temporary directory.
pub fn temp_store() -> (HistoryStore, TempDir) {
    let dir = tempfile::tempdir().expect("temp dir");
    (HistoryStore::new(dir.path()), dir)
}

pub fn read_json(path: &std::path::Path) -> Value {
    let text = std::fs::read_to_string(path).expect("readable file");
    serde_json::from_str(&text).expect("valid json")
}
