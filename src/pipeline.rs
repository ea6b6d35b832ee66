// SPDX-FileCopyrightText: 2025 Joost van der Laan <joost@fashionunited.com>
//
// SPDX-License-Identifier: AGPL-3.0-only

//! Per-symbol collection and the sequential run loop.
//!
//! Symbols are processed one at a time. A failing symbol is logged and
//! counted, then the loop moves on after the usual delay. History files
//! assume a single writer.

use std::time::Duration;

use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{Instrument, error, info, info_span, warn};

use crate::history::{History, MergeOutcome};
use crate::layout::{self, SheetOutcome};
use crate::models::{DateKey, Snapshot};
use crate::producer::SnapshotProducer;
use crate::quarter::{daily_key, quarter_boundary};
use crate::quarterly::{self, QuarterlyDecision};
use crate::sheet::SheetService;
use crate::store::HistoryStore;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DailyOutcome {
    Saved { date: DateKey, first_run: bool },
    /// Today's snapshot is already recorded; nothing was scraped.
    NoNewData { date: DateKey },
    /// The summary came back empty; nothing was written.
    NoSummary,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuarterlyOutcome {
    Saved(QuarterlyDecision),
    Skipped(QuarterlyDecision),
    /// Every quarterly section came back empty; nothing was written.
    Empty { label: DateKey },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Daily,
    Quarterly,
    Sheets,
    /// Daily collection followed by the sheet update.
    Run,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SymbolReport {
    Daily(DailyOutcome),
    Quarterly(QuarterlyOutcome),
    Sheet(SheetOutcome),
    Run {
        daily: DailyOutcome,
        sheet: Option<SheetOutcome>,
    },
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub total: usize,
    pub succeeded: usize,
    /// Symbol and rendered error chain.
    pub failures: Vec<(String, String)>,
}

impl RunSummary {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Scrapes and stores today's summary for `symbol` unless it is already
/// recorded. The profile is only requested on the first run.
pub async fn collect_daily(
    producer: &dyn SnapshotProducer,
    store: &HistoryStore,
    symbol: &str,
    today: NaiveDate,
) -> Result<DailyOutcome> {
    let date = daily_key(today);
    let existing = store.load_daily(symbol)?;

    if existing.as_ref().is_some_and(|history| history.has(&date)) {
        info!(date = %date, "No new data");
        return Ok(DailyOutcome::NoNewData { date });
    }

    let first_run = existing.is_none();
    info!(first_run, "Scraping started");
    let scrape = producer
        .daily(symbol, first_run)
        .await
        .with_context(|| format!("Failed to scrape {}", symbol))?;

    if scrape.summary.is_empty() {
        warn!("Summary is empty, nothing saved");
        return Ok(DailyOutcome::NoSummary);
    }

    let mut history = existing.unwrap_or_else(|| History::new(scrape.profile));
    match history.merge(date.clone(), Snapshot::new(scrape.summary)) {
        MergeOutcome::Inserted => {
            store.save_daily(symbol, &history)?;
            info!(date = %date, entries = history.len(), "History updated");
            Ok(DailyOutcome::Saved { date, first_run })
        }
        MergeOutcome::Duplicate => Ok(DailyOutcome::NoNewData { date }),
    }
}

/// Records the current quarter for `symbol` when due. Nothing is scraped
/// unless the quarter will actually be stored.
pub async fn collect_quarterly(
    producer: &dyn SnapshotProducer,
    store: &HistoryStore,
    symbol: &str,
    today: NaiveDate,
) -> Result<QuarterlyOutcome> {
    let boundary = quarter_boundary(today);
    let existing = store.load_quarterly(symbol)?;
    let decision = quarterly::decide(existing.as_ref(), &boundary);

    if !decision.should_collect() {
        info!(?decision, "Quarterly data not collected");
        return Ok(QuarterlyOutcome::Skipped(decision));
    }

    info!(label = %boundary.label, "Scraping quarterly data");
    let snapshot = producer
        .quarterly(symbol)
        .await
        .with_context(|| format!("Failed to scrape quarterly data for {}", symbol))?;

    if snapshot.is_empty() {
        warn!(label = %boundary.label, "Quarterly data is empty, nothing saved");
        return Ok(QuarterlyOutcome::Empty {
            label: boundary.label,
        });
    }

    let Some(history) = quarterly::record(existing, boundary.label.clone(), snapshot) else {
        info!(label = %boundary.label, "Quarter already recorded");
        return Ok(QuarterlyOutcome::Skipped(QuarterlyDecision::AlreadyPresent {
            label: boundary.label,
        }));
    };
    store.save_quarterly(symbol, &history)?;
    info!(label = %boundary.label, quarters = history.len(), "Quarterly history updated");
    Ok(QuarterlyOutcome::Saved(decision))
}

/// Mirrors the newest stored snapshot of `symbol` into its worksheet.
pub async fn publish_sheet(
    service: &dyn SheetService,
    store: &HistoryStore,
    symbol: &str,
) -> Result<SheetOutcome> {
    let history = store
        .load_daily(symbol)?
        .with_context(|| format!("No history stored for {} yet", symbol))?;
    layout::sync_worksheet(service, symbol, &history).await
}

pub struct Pipeline<'a> {
    producer: &'a dyn SnapshotProducer,
    sheets: Option<&'a dyn SheetService>,
    store: HistoryStore,
    today: NaiveDate,
    delay: Duration,
    show_progress: bool,
}

impl<'a> Pipeline<'a> {
    pub fn new(producer: &'a dyn SnapshotProducer, store: HistoryStore, today: NaiveDate) -> Self {
        Self {
            producer,
            sheets: None,
            store,
            today,
            delay: Duration::ZERO,
            show_progress: false,
        }
    }

    pub fn with_sheets(mut self, service: &'a dyn SheetService) -> Self {
        self.sheets = Some(service);
        self
    }

    /// Pause awaited between two symbols.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    pub fn store(&self) -> &HistoryStore {
        &self.store
    }

    fn sheet_service(&self) -> Result<&'a dyn SheetService> {
        self.sheets.context("No sheet service configured")
    }

    pub async fn process(&self, phase: Phase, symbol: &str) -> Result<SymbolReport> {
        let report = match phase {
            Phase::Daily => SymbolReport::Daily(
                collect_daily(self.producer, &self.store, symbol, self.today).await?,
            ),
            Phase::Quarterly => SymbolReport::Quarterly(
                collect_quarterly(self.producer, &self.store, symbol, self.today).await?,
            ),
            Phase::Sheets => {
                SymbolReport::Sheet(publish_sheet(self.sheet_service()?, &self.store, symbol).await?)
            }
            Phase::Run => {
                let service = self.sheet_service()?;
                let daily = collect_daily(self.producer, &self.store, symbol, self.today).await?;
                let sheet = if daily == DailyOutcome::NoSummary
                    && self.store.load_daily(symbol)?.is_none()
                {
                    None
                } else {
                    Some(publish_sheet(service, &self.store, symbol).await?)
                };
                SymbolReport::Run { daily, sheet }
            }
        };
        Ok(report)
    }

    fn progress_bar(&self, len: usize) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }
        let progress = ProgressBar::new(len as u64);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos:>7}/{len:7} {msg}")
        {
            progress.set_style(style.progress_chars("=>-"));
        }
        progress
    }

    /// Runs `phase` for every symbol in order.
    pub async fn run(&self, phase: Phase, symbols: &[String]) -> Result<RunSummary> {
        if matches!(phase, Phase::Sheets | Phase::Run) {
            self.sheet_service()?;
        }
        if symbols.is_empty() {
            bail!("No symbols to process");
        }

        let mut summary = RunSummary {
            total: symbols.len(),
            ..RunSummary::default()
        };
        let progress = self.progress_bar(symbols.len());

        for (idx, symbol) in symbols.iter().enumerate() {
            if idx > 0 && !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            progress.set_message(symbol.clone());

            let span = info_span!("symbol", symbol = %symbol);
            match self.process(phase, symbol).instrument(span.clone()).await {
                Ok(report) => {
                    span.in_scope(|| info!(?report, "Symbol done"));
                    summary.succeeded += 1;
                }
                Err(e) => {
                    span.in_scope(|| error!("Skipping symbol: {:#}", e));
                    summary.failures.push((symbol.clone(), format!("{:#}", e)));
                }
            }
            progress.inc(1);
        }

        progress.finish_with_message("Done");
        Ok(summary)
    }
}
