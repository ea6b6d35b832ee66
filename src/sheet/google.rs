// SPDX-FileCopyrightText: 2025 Joost van der Laan <joost@fashionunited.com>
//
// SPDX-License-Identifier: AGPL-3.0-only

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode, Url};
use serde::Deserialize;
use serde_json::json;

use super::{SheetService, Worksheet};
use crate::error::SheetError;

pub const DEFAULT_BASE_URL: &str = "https://sheets.googleapis.com/v4/spreadsheets";

/// Google Sheets REST (v4) client for one spreadsheet. The caller supplies a
/// ready OAuth bearer token.
pub struct GoogleSheetsClient {
    client: Client,
    base_url: String,
    spreadsheet_id: String,
    token: String,
}

#[derive(Debug, Deserialize)]
struct SpreadsheetResponse {
    #[serde(default)]
    sheets: Vec<SheetEntry>,
}

#[derive(Debug, Deserialize)]
struct SheetEntry {
    properties: SheetProperties,
}

#[derive(Debug, Deserialize)]
struct SheetProperties {
    title: String,
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<serde_json::Value>>,
}

impl GoogleSheetsClient {
    pub fn new(client: Client, spreadsheet_id: String, token: String) -> Self {
        Self {
            client,
            base_url: DEFAULT_BASE_URL.to_string(),
            spreadsheet_id,
            token,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// `<base>/<spreadsheet_id><suffix>/<segments...>`
    fn url(&self, suffix: &str, segments: &[&str]) -> Result<Url, SheetError> {
        let mut url = Url::parse(self.base_url.trim_end_matches('/'))
            .map_err(|e| SheetError::Url(e.to_string()))?;
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|_| SheetError::Url(self.base_url.clone()))?;
            path.push(&format!("{}{}", self.spreadsheet_id, suffix));
            path.extend(segments);
        }
        Ok(url)
    }

    async fn check(response: Response) -> Result<Response, SheetError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(SheetError::Api {
            status: status.as_u16(),
            body,
        })
    }
}

/// `'My Sheet'!A1`, with embedded quotes doubled.
fn qualified_range(title: &str, range: &str) -> String {
    format!("'{}'!{}", title.replace('\'', "''"), range)
}

fn cell_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[async_trait]
impl SheetService for GoogleSheetsClient {
    async fn list_worksheets(&self) -> Result<Vec<String>, SheetError> {
        let mut url = self.url("", &[])?;
        url.query_pairs_mut()
            .append_pair("fields", "sheets.properties.title");

        let response = self
            .client
            .get(url)
            .bearer_auth(&self.token)
            .send()
            .await?;
        let spreadsheet: SpreadsheetResponse = Self::check(response).await?.json().await?;

        Ok(spreadsheet
            .sheets
            .into_iter()
            .map(|s| s.properties.title)
            .collect())
    }

    async fn create_worksheet(
        &self,
        title: &str,
        rows: u32,
        cols: u32,
    ) -> Result<Worksheet, SheetError> {
        let url = self.url(":batchUpdate", &[])?;
        let body = json!({
            "requests": [{
                "addSheet": {
                    "properties": {
                        "title": title,
                        "gridProperties": { "rowCount": rows, "columnCount": cols }
                    }
                }
            }]
        });

        let response = self
            .client
            .post(url)
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await?;
        Self::check(response).await?;

        Ok(Worksheet {
            title: title.to_string(),
        })
    }

    async fn read_range(
        &self,
        worksheet: &Worksheet,
        range: &str,
    ) -> Result<Vec<Vec<String>>, SheetError> {
        let a1 = qualified_range(&worksheet.title, range);
        let url = self.url("", &["values", &a1])?;

        let response = self
            .client
            .get(url)
            .bearer_auth(&self.token)
            .send()
            .await?;

        // An unknown sheet title shows up as an unparseable range.
        if response.status() == StatusCode::BAD_REQUEST {
            let body = response.text().await.unwrap_or_default();
            if body.contains("Unable to parse range") {
                return Err(SheetError::WorksheetNotFound(worksheet.title.clone()));
            }
            return Err(SheetError::Api { status: 400, body });
        }

        let values: ValueRange = Self::check(response).await?.json().await?;
        Ok(values
            .values
            .iter()
            .map(|row| row.iter().map(cell_text).collect())
            .collect())
    }

    async fn write_cell(
        &self,
        worksheet: &Worksheet,
        cell: &str,
        value: &str,
    ) -> Result<(), SheetError> {
        let a1 = qualified_range(&worksheet.title, cell);
        let mut url = self.url("", &["values", &a1])?;
        url.query_pairs_mut()
            .append_pair("valueInputOption", "USER_ENTERED");

        let body = json!({
            "range": a1,
            "majorDimension": "ROWS",
            "values": [[value]],
        });

        let response = self
            .client
            .put(url)
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> GoogleSheetsClient {
        GoogleSheetsClient::new(Client::new(), "sheet-id".to_string(), "token".to_string())
    }

    #[test]
    fn test_qualified_range_quotes_title() {
        assert_eq!(qualified_range("AAPL", "7:7"), "'AAPL'!7:7");
        assert_eq!(qualified_range("O'Neil", "A1"), "'O''Neil'!A1");
    }

    #[test]
    fn test_urls() {
        let c = client();
        assert_eq!(
            c.url("", &[]).unwrap().as_str(),
            "https://sheets.googleapis.com/v4/spreadsheets/sheet-id"
        );
        assert_eq!(
            c.url(":batchUpdate", &[]).unwrap().as_str(),
            "https://sheets.googleapis.com/v4/spreadsheets/sheet-id:batchUpdate"
        );
        assert_eq!(
            c.url("", &["values", "'AAPL'!B1"]).unwrap().path(),
            "/v4/spreadsheets/sheet-id/values/'AAPL'!B1"
        );
    }

    #[test]
    fn test_url_rejects_bad_base() {
        let c = client().with_base_url("not a url");
        assert!(matches!(c.url("", &[]), Err(SheetError::Url(_))));
    }
}
