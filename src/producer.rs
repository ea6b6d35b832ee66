// SPDX-FileCopyrightText: 2025 Joost van der Laan <joost@fashionunited.com>
//
// SPDX-License-Identifier: AGPL-3.0-only

use async_trait::async_trait;

use crate::error::ScrapeError;
use crate::models::{DailyScrape, FieldMap, Profile, QuarterlySnapshot};

/// Source of raw field dictionaries for a symbol.
///
/// Implementations degrade a timed-out section to an empty dictionary
/// themselves; any error returned here fails the whole symbol.
#[async_trait]
pub trait SnapshotProducer: Send + Sync {
    async fn profile(&self, symbol: &str) -> Result<Profile, ScrapeError>;

    async fn summary(&self, symbol: &str) -> Result<FieldMap, ScrapeError>;

    async fn quarterly(&self, symbol: &str) -> Result<QuarterlySnapshot, ScrapeError>;

    /// Summary plus, for a symbol without history, its profile.
    async fn daily(&self, symbol: &str, with_profile: bool) -> Result<DailyScrape, ScrapeError> {
        let profile = if with_profile {
            Some(self.profile(symbol).await?)
        } else {
            None
        };
        let summary = self.summary(symbol).await?;
        Ok(DailyScrape { profile, summary })
    }
}
