// SPDX-FileCopyrightText: 2025 Joost van der Laan <joost@fashionunited.com>
//
// SPDX-License-Identifier: AGPL-3.0-only

//! Daily snapshot history for one symbol.
//!
//! On disk the history is a JSON array: an optional leading
//! `{"profile": {...}}` element followed by one `{DateKey: [{"summary": {...}}]}`
//! element per day, newest first. In memory the profile is a named field so
//! nothing depends on list positions.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::models::{DateKey, Profile, Snapshot};

const PROFILE_KEY: &str = "profile";

type RawHistory = Vec<Map<String, Value>>;

/// Result of merging a dated entry into a history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    Inserted,
    /// The date key was already present; nothing changed.
    Duplicate,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawHistory", into = "RawHistory")]
pub struct History {
    profile: Option<Profile>,
    /// Newest first.
    entries: Vec<(DateKey, Snapshot)>,
}

impl History {
    pub fn new(profile: Option<Profile>) -> Self {
        Self {
            profile,
            entries: Vec::new(),
        }
    }

    pub fn profile(&self) -> Option<&Profile> {
        self.profile.as_ref()
    }

    pub fn has(&self, date: &str) -> bool {
        self.entries.iter().any(|(key, _)| key == date)
    }

    /// Inserts `snapshot` under `date` as the newest entry, unless the date is
    /// already recorded.
    pub fn merge(&mut self, date: DateKey, snapshot: Snapshot) -> MergeOutcome {
        if self.has(&date) {
            return MergeOutcome::Duplicate;
        }
        self.entries.insert(0, (date, snapshot));
        MergeOutcome::Inserted
    }

    /// The entry with the greatest date key. Daily keys are zero-padded ISO
    /// dates, so string order is chronological.
    pub fn latest(&self) -> Option<(&str, &Snapshot)> {
        self.entries
            .iter()
            .max_by(|(a, _), (b, _)| a.cmp(b))
            .map(|(key, snapshot)| (key.as_str(), snapshot))
    }

    pub fn get(&self, date: &str) -> Option<&Snapshot> {
        self.entries
            .iter()
            .find(|(key, _)| key == date)
            .map(|(_, snapshot)| snapshot)
    }

    pub fn dates(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(key, _)| key.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl TryFrom<RawHistory> for History {
    type Error = String;

    fn try_from(raw: RawHistory) -> Result<Self, Self::Error> {
        let mut history = History::default();

        for element in raw {
            for (key, value) in element {
                if key == PROFILE_KEY {
                    if history.profile.is_some() {
                        return Err("more than one profile element".to_string());
                    }
                    let profile: Profile = serde_json::from_value(value)
                        .map_err(|e| format!("invalid profile: {}", e))?;
                    history.profile = Some(profile);
                    continue;
                }

                let parts: Vec<Snapshot> = serde_json::from_value(value)
                    .map_err(|e| format!("invalid snapshot for {}: {}", key, e))?;
                let snapshot = parts
                    .into_iter()
                    .next()
                    .ok_or_else(|| format!("empty snapshot list for {}", key))?;

                // First occurrence wins.
                if !history.has(&key) {
                    history.entries.push((key, snapshot));
                }
            }
        }

        Ok(history)
    }
}

impl From<History> for RawHistory {
    fn from(history: History) -> Self {
        let mut raw = Vec::with_capacity(history.entries.len() + 1);

        if let Some(profile) = history.profile {
            let mut element = Map::new();
            element.insert(
                PROFILE_KEY.to_string(),
                json!({
                    "company": Value::Object(profile.company),
                    "sector": Value::Object(profile.sector),
                }),
            );
            raw.push(element);
        }

        for (key, snapshot) in history.entries {
            let mut element = Map::new();
            element.insert(
                key,
                json!([{ "summary": Value::Object(snapshot.summary) }]),
            );
            raw.push(element);
        }

        raw
    }
}
