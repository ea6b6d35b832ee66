// SPDX-FileCopyrightText: 2025 Joost van der Laan <joost@fashionunited.com>
//
// SPDX-License-Identifier: AGPL-3.0-only

use std::fs::{self, OpenOptions};
use std::path::Path;

use anyhow::{Context, Result, bail};
use chrono::{Local, NaiveDate, NaiveTime, TimeZone};
use reqwest::{Client, Url};
use tracing::info;

pub const DEFAULT_DOWNLOAD_URL: &str = "https://query1.finance.yahoo.com/v7/finance/download";

pub const INTERVALS: [&str; 3] = ["1d", "1wk", "1mo"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoricalRequest {
    pub symbol: String,
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub interval: String,
}

impl HistoricalRequest {
    pub fn new(symbol: &str, from: NaiveDate, to: NaiveDate, interval: &str) -> Result<Self> {
        if !INTERVALS.contains(&interval) {
            bail!("Unsupported interval {} (expected one of {:?})", interval, INTERVALS);
        }
        if from > to {
            bail!("Period start {} is after period end {}", from, to);
        }
        Ok(Self {
            symbol: symbol.to_string(),
            from,
            to,
            interval: interval.to_string(),
        })
    }
}

/// Unix timestamp of 23:59 local time on `date`.
pub fn period_bound(date: NaiveDate) -> Result<i64> {
    let end_of_day = date.and_time(NaiveTime::from_hms_opt(23, 59, 0).unwrap_or_default());
    Local
        .from_local_datetime(&end_of_day)
        .earliest()
        .map(|dt| dt.timestamp())
        .with_context(|| format!("No local time for {}", end_of_day))
}

pub fn download_url(base_url: &str, request: &HistoricalRequest) -> Result<Url> {
    let mut url = Url::parse(base_url.trim_end_matches('/'))
        .with_context(|| format!("Invalid download URL {}", base_url))?;
    url.path_segments_mut()
        .map_err(|_| anyhow::anyhow!("Download URL {} cannot take a path", base_url))?
        .push(&request.symbol);
    url.query_pairs_mut()
        .append_pair("period1", &period_bound(request.from)?.to_string())
        .append_pair("period2", &period_bound(request.to)?.to_string())
        .append_pair("interval", &request.interval)
        .append_pair("events", "history")
        .append_pair("includeAdjustedClose", "true");
    Ok(url)
}

/// Fetches the CSV export for the request and returns its body.
pub async fn download(client: &Client, base_url: &str, request: &HistoricalRequest) -> Result<String> {
    let url = download_url(base_url, request)?;
    info!(symbol = %request.symbol, "Downloading historical prices");

    let response = client
        .get(url)
        .send()
        .await
        .with_context(|| format!("Failed to download history for {}", request.symbol))?;
    let status = response.status();
    if !status.is_success() {
        bail!("History download for {} returned {}", request.symbol, status);
    }
    Ok(response.text().await?)
}

/// Appends the CSV `body` to `path`. The header line is written only when the
/// file is created; returns the number of data rows written.
pub fn append_history_csv(path: &Path, body: &str) -> Result<usize> {
    let is_new = !path.exists();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    let mut reader = csv::Reader::from_reader(body.as_bytes());
    let headers = reader.headers()?.clone();

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;
    let mut writer = csv::Writer::from_writer(file);

    if is_new {
        writer.write_record(&headers)?;
    }
    let mut rows = 0;
    for record in reader.records() {
        writer.write_record(&record?)?;
        rows += 1;
    }
    writer.flush()?;

    Ok(rows)
}
