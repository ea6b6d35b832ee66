// SPDX-FileCopyrightText: 2025 Joost van der Laan <joost@fashionunited.com>
//
// SPDX-License-Identifier: AGPL-3.0-only

//! Quarterly track, kept in its own file and deduplicated by quarter label.
//!
//! File shape: `[{"quarterly": [{label: [{stats, income, balance, cash}]}, ...]}]`,
//! newest quarter first.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::history::MergeOutcome;
use crate::models::{DateKey, QuarterlySnapshot};
use crate::quarter::QuarterBoundary;

const QUARTERLY_KEY: &str = "quarterly";

type RawQuarterly = Vec<Map<String, Value>>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawQuarterly", into = "RawQuarterly")]
pub struct QuarterlyHistory {
    /// Newest first.
    quarters: Vec<(DateKey, QuarterlySnapshot)>,
}

impl QuarterlyHistory {
    /// A history holding only the first collected quarter.
    pub fn bootstrap(label: DateKey, snapshot: QuarterlySnapshot) -> Self {
        Self {
            quarters: vec![(label, snapshot)],
        }
    }

    pub fn has(&self, label: &str) -> bool {
        self.quarters.iter().any(|(key, _)| key == label)
    }

    /// Puts a new quarter at the front of the list.
    pub fn insert_front(&mut self, label: DateKey, snapshot: QuarterlySnapshot) -> MergeOutcome {
        if self.has(&label) {
            return MergeOutcome::Duplicate;
        }
        self.quarters.insert(0, (label, snapshot));
        MergeOutcome::Inserted
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.quarters.iter().map(|(key, _)| key.as_str())
    }

    pub fn len(&self) -> usize {
        self.quarters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quarters.is_empty()
    }
}

/// What the quarterly pipeline should do for a symbol today.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuarterlyDecision {
    /// No quarterly file yet; collect regardless of month.
    Bootstrap { label: DateKey },
    /// Quarter-closing month and the quarter is not recorded yet.
    Collect { label: DateKey },
    NotClosingMonth,
    AlreadyPresent { label: DateKey },
}

impl QuarterlyDecision {
    pub fn should_collect(&self) -> bool {
        matches!(self, Self::Bootstrap { .. } | Self::Collect { .. })
    }
}

/// Adds a collected quarter, bootstrapping the history when there is none.
/// `None` when the label is already recorded.
pub fn record(
    existing: Option<QuarterlyHistory>,
    label: DateKey,
    snapshot: QuarterlySnapshot,
) -> Option<QuarterlyHistory> {
    match existing {
        None => Some(QuarterlyHistory::bootstrap(label, snapshot)),
        Some(mut history) => match history.insert_front(label, snapshot) {
            MergeOutcome::Inserted => Some(history),
            MergeOutcome::Duplicate => None,
        },
    }
}

pub fn decide(existing: Option<&QuarterlyHistory>, boundary: &QuarterBoundary) -> QuarterlyDecision {
    match existing {
        None => QuarterlyDecision::Bootstrap {
            label: boundary.label.clone(),
        },
        Some(_) if !boundary.is_closing_month => QuarterlyDecision::NotClosingMonth,
        Some(history) if history.has(&boundary.label) => QuarterlyDecision::AlreadyPresent {
            label: boundary.label.clone(),
        },
        Some(_) => QuarterlyDecision::Collect {
            label: boundary.label.clone(),
        },
    }
}

impl TryFrom<RawQuarterly> for QuarterlyHistory {
    type Error = String;

    fn try_from(raw: RawQuarterly) -> Result<Self, Self::Error> {
        let list = raw
            .into_iter()
            .find_map(|mut element| element.remove(QUARTERLY_KEY))
            .ok_or_else(|| "missing quarterly list".to_string())?;

        let elements: Vec<Map<String, Value>> = serde_json::from_value(list)
            .map_err(|e| format!("invalid quarterly list: {}", e))?;

        let mut history = QuarterlyHistory::default();
        for element in elements {
            for (label, value) in element {
                let parts: Vec<QuarterlySnapshot> = serde_json::from_value(value)
                    .map_err(|e| format!("invalid quarter {}: {}", label, e))?;
                let snapshot = parts
                    .into_iter()
                    .next()
                    .ok_or_else(|| format!("empty snapshot list for {}", label))?;
                if !history.has(&label) {
                    history.quarters.push((label, snapshot));
                }
            }
        }

        Ok(history)
    }
}

impl From<QuarterlyHistory> for RawQuarterly {
    fn from(history: QuarterlyHistory) -> Self {
        let quarters: Vec<Value> = history
            .quarters
            .into_iter()
            .map(|(label, snapshot)| {
                let mut element = Map::new();
                element.insert(
                    label,
                    json!([{
                        "stats": Value::Object(snapshot.stats),
                        "income": Value::Object(snapshot.income),
                        "balance": Value::Object(snapshot.balance),
                        "cash": Value::Object(snapshot.cash),
                    }]),
                );
                Value::Object(element)
            })
            .collect();

        let mut root = Map::new();
        root.insert(QUARTERLY_KEY.to_string(), Value::Array(quarters));
        vec![root]
    }
}
