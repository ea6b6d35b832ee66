// SPDX-FileCopyrightText: 2025 Joost van der Laan <joost@fashionunited.com>
//
// SPDX-License-Identifier: AGPL-3.0-only

use async_trait::async_trait;
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use serde_json::Value;
use std::time::Duration;
use tracing::{info, warn};

use crate::error::ScrapeError;
use crate::models::{
    FieldMap, MARKET_CHANGE, MARKET_PERCENT, MARKET_PRICE, Profile, QuarterlySnapshot,
    STOCK_SYMBOL,
};
use crate::producer::SnapshotProducer;

pub const DEFAULT_BASE_URL: &str = "https://finance.yahoo.com";

const COMPANY_FIELDS: [&str; 5] = ["address", "citystatezip", "country", "phone", "site"];

/// Builds the HTTP session shared by every request of a run.
pub fn build_client(user_agent: &str, timeout: Duration) -> reqwest::Result<Client> {
    Client::builder()
        .user_agent(user_agent)
        .timeout(timeout)
        .build()
}

/// Scrapes Yahoo Finance quote pages.
pub struct YahooScraper {
    client: Client,
    base_url: String,
}

impl YahooScraper {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    async fn fetch(&self, path: &str) -> Result<String, ScrapeError> {
        let url = format!("{}{}", self.base_url.trim_end_matches('/'), path);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ScrapeError::from_reqwest(&url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ScrapeError::Status {
                url,
                status: status.as_u16(),
            });
        }

        response
            .text()
            .await
            .map_err(|e| ScrapeError::from_reqwest(&url, e))
    }

    async fn statement(
        &self,
        symbol: &str,
        page: &str,
        value_column: usize,
    ) -> Result<FieldMap, ScrapeError> {
        info!("Scraping {} data", page);
        let html = self.fetch(&format!("/quote/{0}/{1}?p={0}", symbol, page)).await;
        tolerate_timeout(page, html.and_then(|html| parse_statement(&html, value_column)))
    }
}

#[async_trait]
impl SnapshotProducer for YahooScraper {
    async fn profile(&self, symbol: &str) -> Result<Profile, ScrapeError> {
        info!("Scraping profile data");
        let html = self.fetch(&format!("/quote/{0}/profile?p={0}", symbol)).await;
        tolerate_timeout("profile", html.and_then(|html| parse_profile(&html)))
    }

    async fn summary(&self, symbol: &str) -> Result<FieldMap, ScrapeError> {
        info!("Scraping summary data");
        let html = self.fetch(&format!("/quote/{0}?p={0}", symbol)).await;
        tolerate_timeout("summary", html.and_then(|html| parse_summary(symbol, &html)))
    }

    async fn quarterly(&self, symbol: &str) -> Result<QuarterlySnapshot, ScrapeError> {
        info!("Scraping statistics data");
        let html = self
            .fetch(&format!("/quote/{0}/key-statistics?p={0}", symbol))
            .await;
        let stats = tolerate_timeout("statistics", html.and_then(|html| parse_statistics(&html)))?;

        Ok(QuarterlySnapshot {
            stats,
            income: self.statement(symbol, "financials", 1).await?,
            balance: self.statement(symbol, "balance-sheet", 0).await?,
            cash: self.statement(symbol, "cash-flow", 1).await?,
        })
    }
}

/// A timed-out section is kept as an empty dictionary; the run goes on with
/// whatever else was scraped.
fn tolerate_timeout<T: Default>(
    section: &str,
    result: Result<T, ScrapeError>,
) -> Result<T, ScrapeError> {
    match result {
        Err(e) if e.is_timeout() => {
            warn!(section, "Timeout: {}", e);
            Ok(T::default())
        }
        other => other,
    }
}

fn selector(css: &str) -> Result<Selector, ScrapeError> {
    Selector::parse(css).map_err(|_| ScrapeError::Selector(css.to_string()))
}

fn element_text(element: ElementRef) -> String {
    element.text().collect::<String>().trim().to_string()
}

fn insert_text(fields: &mut FieldMap, key: &str, value: String) {
    fields.insert(key.to_string(), Value::String(value));
}

/// Company block and sector pairs from the profile page.
pub fn parse_profile(html: &str) -> Result<Profile, ScrapeError> {
    let document = Html::parse_document(html);
    let scope = selector("div[data-test='qsp-profile']")?;
    let heading = selector("h3")?;
    let paragraph = selector("p")?;
    let span = selector("span")?;

    let root = document
        .select(&scope)
        .next()
        .unwrap_or_else(|| document.root_element());

    let mut profile = Profile::default();
    let name = root.select(&heading).next().map(element_text).unwrap_or_default();
    insert_text(&mut profile.company, "name", name);

    // Address block lines are separated by <br>; some pages lead with an extra line.
    let mut lines: Vec<String> = root
        .select(&paragraph)
        .next()
        .map(|p| {
            p.text()
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(String::from)
                .collect()
        })
        .unwrap_or_default();
    if lines.len() > COMPANY_FIELDS.len() {
        lines.remove(0);
    }
    for (idx, key) in COMPANY_FIELDS.iter().enumerate() {
        insert_text(&mut profile.company, key, lines.get(idx).cloned().unwrap_or_default());
    }

    let spans: Vec<String> = root
        .select(&paragraph)
        .nth(1)
        .map(|p| p.select(&span).map(element_text).collect())
        .unwrap_or_default();
    for pair in spans.chunks(2) {
        if let [key, value] = pair {
            insert_text(&mut profile.sector, key, value.clone());
        }
    }

    Ok(profile)
}

/// Price header plus every row of the quote summary tables.
pub fn parse_summary(symbol: &str, html: &str) -> Result<FieldMap, ScrapeError> {
    let document = Html::parse_document(html);
    let price = selector("fin-streamer[data-test='qsp-price']")?;
    let change = selector("fin-streamer[data-test='qsp-price-change']")?;
    let percent = selector("fin-streamer[data-field='regularMarketChangePercent']")?;
    let rows = selector("#quote-summary table tr")?;
    let cell = selector("td")?;

    let mut fields = FieldMap::new();
    insert_text(&mut fields, STOCK_SYMBOL, symbol.to_string());
    if let Some(el) = document.select(&price).next() {
        insert_text(&mut fields, MARKET_PRICE, element_text(el));
    }
    if let Some(el) = document.select(&change).next() {
        insert_text(&mut fields, MARKET_CHANGE, element_text(el));
    }
    if let Some(value) = document
        .select(&percent)
        .next()
        .and_then(|el| el.value().attr("value"))
    {
        insert_text(&mut fields, MARKET_PERCENT, value.to_string());
    }

    for row in document.select(&rows) {
        let cells: Vec<String> = row.select(&cell).map(element_text).collect();
        if let [key, value, ..] = cells.as_slice() {
            insert_text(&mut fields, key, value.clone());
        }
    }

    // Only the symbol itself: the page carried no quote data (consent wall or
    // changed layout). Treated like a timeout so nothing gets recorded.
    if fields.len() == 1 {
        warn!(symbol, "Summary page has no quote data");
        return Ok(FieldMap::new());
    }

    Ok(fields)
}

/// Key statistics: the first table, label in the first cell, value in the third
/// (or the last when the row is shorter).
pub fn parse_statistics(html: &str) -> Result<FieldMap, ScrapeError> {
    let document = Html::parse_document(html);
    let table = selector("table")?;
    let rows = selector("tbody tr")?;
    let cell = selector("td")?;

    let mut fields = FieldMap::new();
    let Some(table) = document.select(&table).next() else {
        return Ok(fields);
    };
    for row in table.select(&rows) {
        let cells: Vec<String> = row.select(&cell).map(element_text).collect();
        if cells.len() < 2 {
            continue;
        }
        let value = cells.get(2).or(cells.last()).cloned().unwrap_or_default();
        insert_text(&mut fields, &cells[0], value);
    }

    Ok(fields)
}

/// Financial statement rows; `value_column` picks which period column to keep.
pub fn parse_statement(html: &str, value_column: usize) -> Result<FieldMap, ScrapeError> {
    let document = Html::parse_document(html);
    let rows = selector("div[data-test='fin-row']")?;
    let label = selector("span")?;
    let column = selector("div[data-test='fin-col']")?;

    let mut fields = FieldMap::new();
    for row in document.select(&rows) {
        let Some(key) = row.select(&label).next().map(element_text) else {
            continue;
        };
        let value = row
            .select(&column)
            .nth(value_column)
            .map(element_text)
            .unwrap_or_default();
        insert_text(&mut fields, &key, value);
    }

    Ok(fields)
}
