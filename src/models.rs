// SPDX-FileCopyrightText: 2025 Joost van der Laan <joost@fashionunited.com>
//
// SPDX-License-Identifier: AGPL-3.0-only

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Either a calendar date (`YYYY-MM-DD`) or a quarter-end label (`2023-9-30`).
pub type DateKey = String;

/// Scraped field name to value, in the order the fields were scraped.
pub type FieldMap = Map<String, Value>;

pub const STOCK_SYMBOL: &str = "stock_symbol";
pub const MARKET_PRICE: &str = "market_price";
pub const MARKET_CHANGE: &str = "market_change";
pub const MARKET_PERCENT: &str = "market_percent";

/// Company profile, scraped once when a symbol has no history yet.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default)]
    pub company: FieldMap,
    #[serde(default)]
    pub sector: FieldMap,
}

/// One daily scrape of a quote's summary page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub summary: FieldMap,
}

impl Snapshot {
    pub fn new(summary: FieldMap) -> Self {
        Self { summary }
    }

    pub fn price(&self) -> String {
        field_text(&self.summary, MARKET_PRICE)
    }

    pub fn change(&self) -> String {
        field_text(&self.summary, MARKET_CHANGE)
    }

    pub fn percent(&self) -> String {
        field_text(&self.summary, MARKET_PERCENT)
    }
}

/// Key statistics merged with the three quarterly financial statements.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuarterlySnapshot {
    #[serde(default)]
    pub stats: FieldMap,
    #[serde(default)]
    pub income: FieldMap,
    #[serde(default)]
    pub balance: FieldMap,
    #[serde(default)]
    pub cash: FieldMap,
}

impl QuarterlySnapshot {
    pub fn is_empty(&self) -> bool {
        self.stats.is_empty() && self.income.is_empty() && self.balance.is_empty() && self.cash.is_empty()
    }
}

/// Everything the daily scrape produced for one symbol.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DailyScrape {
    /// Only requested when the symbol has no history yet.
    pub profile: Option<Profile>,
    pub summary: FieldMap,
}

/// Renders a scraped value the way it should appear in a cell.
pub fn field_text(fields: &FieldMap, key: &str) -> String {
    fields.get(key).map(value_text).unwrap_or_default()
}

pub fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
