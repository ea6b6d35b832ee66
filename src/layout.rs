// SPDX-FileCopyrightText: 2025 Joost van der Laan <joost@fashionunited.com>
//
// SPDX-License-Identifier: AGPL-3.0-only

//! Worksheet layout for one symbol.
//!
//! ```text
//!      A              B       C        D            E
//!  1   SYMBOL         price   change   percent
//!  2   name
//!  3   address                         sector key   sector value
//!  4   citystatezip                    ...          ...
//!  5   site
//!  7   Summary                         2023-08-27   2023-08-28 ...
//!  8   field name                      value        value
//! ```
//!
//! A missing worksheet gets the whole block written once; an existing one
//! gets one more date column per new snapshot.

use anyhow::{Context, Result};
use serde_json::Value;
use tracing::info;

use crate::column::{cell_ref, column_letter};
use crate::history::History;
use crate::models::{
    FieldMap, MARKET_CHANGE, MARKET_PERCENT, MARKET_PRICE, Profile, STOCK_SYMBOL, Snapshot,
    value_text,
};
use crate::sheet::{SheetService, Worksheet, WorksheetLookup};

pub const HEADER_ROW: u32 = 7;
pub const FIRST_FIELD_ROW: u32 = 8;
pub const SECTOR_FIRST_ROW: u32 = 3;
pub const SUMMARY_LABEL: &str = "Summary";
pub const WORKSHEET_ROWS: u32 = 1000;
pub const WORKSHEET_COLS: u32 = 26;

/// Fields already shown in the header cells, never given their own row.
pub const SKIPPED_FIELDS: [&str; 4] = [STOCK_SYMBOL, MARKET_PRICE, MARKET_CHANGE, MARKET_PERCENT];

/// Company fields and the cells they land in.
const COMPANY_CELLS: [(&str, &str); 4] = [
    ("name", "A2"),
    ("address", "A3"),
    ("citystatezip", "A4"),
    ("site", "A5"),
];

const FIELD_KEY_COLUMN: usize = 0;
const FIRST_DATA_COLUMN: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellWrite {
    pub cell: String,
    pub value: String,
}

impl CellWrite {
    fn new(cell: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            cell: cell.into(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SheetOutcome {
    Created { cells: usize },
    Appended { column: String, cells: usize },
    /// The date is already in the header row; nothing was written.
    AlreadyCurrent,
}

/// Summary fields that get their own row, in scrape order.
pub fn summary_rows(summary: &FieldMap) -> impl Iterator<Item = (&String, &Value)> {
    summary
        .iter()
        .filter(|(key, _)| !SKIPPED_FIELDS.contains(&key.as_str()))
}

fn header_cells(snapshot: &Snapshot) -> [CellWrite; 3] {
    [
        CellWrite::new("B1", snapshot.price()),
        CellWrite::new("C1", snapshot.change()),
        CellWrite::new("D1", snapshot.percent()),
    ]
}

/// Every cell of a brand-new worksheet.
pub fn plan_new_sheet(
    symbol: &str,
    profile: Option<&Profile>,
    date: &str,
    snapshot: &Snapshot,
) -> Vec<CellWrite> {
    let mut plan = vec![CellWrite::new("A1", symbol)];

    if let Some(profile) = profile {
        for (field, cell) in COMPANY_CELLS {
            if let Some(value) = profile.company.get(field) {
                plan.push(CellWrite::new(cell, value_text(value)));
            }
        }
        for (row, (key, value)) in (SECTOR_FIRST_ROW..).zip(profile.sector.iter()) {
            plan.push(CellWrite::new(format!("D{}", row), key.as_str()));
            plan.push(CellWrite::new(format!("E{}", row), value_text(value)));
        }
    }

    plan.extend(header_cells(snapshot));
    plan.push(CellWrite::new(cell_ref(FIELD_KEY_COLUMN, HEADER_ROW), SUMMARY_LABEL));
    plan.push(CellWrite::new(cell_ref(FIRST_DATA_COLUMN, HEADER_ROW), date));

    for (row, (key, value)) in (FIRST_FIELD_ROW..).zip(summary_rows(&snapshot.summary)) {
        plan.push(CellWrite::new(cell_ref(FIELD_KEY_COLUMN, row), key.as_str()));
        plan.push(CellWrite::new(cell_ref(FIRST_DATA_COLUMN, row), value_text(value)));
    }

    plan
}

/// Cells for one more date column, or `None` when `header_row` already holds
/// `date`. `header_row` is the header row up to its last occupied cell.
pub fn plan_append(date: &str, snapshot: &Snapshot, header_row: &[String]) -> Option<Vec<CellWrite>> {
    if header_row.iter().any(|cell| cell == date) {
        return None;
    }

    let column = header_row.len();
    let mut plan: Vec<CellWrite> = header_cells(snapshot).into();
    plan.push(CellWrite::new(cell_ref(column, HEADER_ROW), date));

    for (row, (_, value)) in (FIRST_FIELD_ROW..).zip(summary_rows(&snapshot.summary)) {
        plan.push(CellWrite::new(cell_ref(column, row), value_text(value)));
    }

    Some(plan)
}

async fn apply(service: &dyn SheetService, worksheet: &Worksheet, plan: &[CellWrite]) -> Result<()> {
    for write in plan {
        service
            .write_cell(worksheet, &write.cell, &write.value)
            .await
            .with_context(|| format!("Failed to write {}!{}", worksheet.title, write.cell))?;
    }
    Ok(())
}

/// Brings the symbol's worksheet up to date with the newest snapshot in
/// `history`, creating the worksheet when it does not exist yet.
pub async fn sync_worksheet(
    service: &dyn SheetService,
    symbol: &str,
    history: &History,
) -> Result<SheetOutcome> {
    let (date, snapshot) = history
        .latest()
        .with_context(|| format!("No dated snapshots in history for {}", symbol))?;

    let lookup = service
        .open_worksheet(symbol)
        .await
        .with_context(|| format!("Failed to look up worksheet {}", symbol))?;

    match lookup {
        WorksheetLookup::NotFound => {
            info!("Worksheet not found, creating it");
            let worksheet = service
                .create_worksheet(symbol, WORKSHEET_ROWS, WORKSHEET_COLS)
                .await
                .with_context(|| format!("Failed to create worksheet {}", symbol))?;

            let plan = plan_new_sheet(symbol, history.profile(), date, snapshot);
            apply(service, &worksheet, &plan).await?;
            info!(cells = plan.len(), "Worksheet created");
            Ok(SheetOutcome::Created { cells: plan.len() })
        }
        WorksheetLookup::Found(worksheet) => {
            info!("Worksheet found");
            let header_row = service
                .row_values(&worksheet, HEADER_ROW)
                .await
                .with_context(|| format!("Failed to read header row of {}", symbol))?;

            let Some(plan) = plan_append(date, snapshot, &header_row) else {
                info!(date, "No new data");
                return Ok(SheetOutcome::AlreadyCurrent);
            };
            let column = column_letter(header_row.len());
            apply(service, &worksheet, &plan).await?;
            info!(column = %column, date, "Worksheet updated");
            Ok(SheetOutcome::Appended {
                column,
                cells: plan.len(),
            })
        }
    }
}
