// SPDX-FileCopyrightText: 2025 Joost van der Laan <joost@fashionunited.com>
//
// SPDX-License-Identifier: AGPL-3.0-only

mod google;
mod memory;

pub use google::{DEFAULT_BASE_URL, GoogleSheetsClient};
pub use memory::{MemorySheetService, RecordedWrite};

use async_trait::async_trait;

use crate::error::SheetError;

/// Handle to an existing worksheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Worksheet {
    pub title: String,
}

/// Outcome of looking a worksheet up by title. `NotFound` is an expected
/// answer, not a failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorksheetLookup {
    Found(Worksheet),
    NotFound,
}

#[async_trait]
pub trait SheetService: Send + Sync {
    async fn list_worksheets(&self) -> Result<Vec<String>, SheetError>;

    async fn create_worksheet(
        &self,
        title: &str,
        rows: u32,
        cols: u32,
    ) -> Result<Worksheet, SheetError>;

    /// Reads an A1 range such as `"7:7"` or `"A1:E5"`. Rows are trimmed of
    /// trailing empty cells; gaps inside a row come back as empty strings.
    async fn read_range(
        &self,
        worksheet: &Worksheet,
        range: &str,
    ) -> Result<Vec<Vec<String>>, SheetError>;

    async fn write_cell(
        &self,
        worksheet: &Worksheet,
        cell: &str,
        value: &str,
    ) -> Result<(), SheetError>;

    async fn open_worksheet(&self, title: &str) -> Result<WorksheetLookup, SheetError> {
        let titles = self.list_worksheets().await?;
        if titles.iter().any(|t| t == title) {
            Ok(WorksheetLookup::Found(Worksheet {
                title: title.to_string(),
            }))
        } else {
            Ok(WorksheetLookup::NotFound)
        }
    }

    /// Cells of one row up to its last occupied cell.
    async fn row_values(&self, worksheet: &Worksheet, row: u32) -> Result<Vec<String>, SheetError> {
        let rows = self
            .read_range(worksheet, &format!("{}:{}", row, row))
            .await?;
        Ok(rows.into_iter().next().unwrap_or_default())
    }
}
