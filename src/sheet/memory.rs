// SPDX-FileCopyrightText: 2025 Joost van der Laan <joost@fashionunited.com>
//
// SPDX-License-Identifier: AGPL-3.0-only

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::{SheetService, Worksheet};
use crate::column::{column_index, parse_cell_ref};
use crate::error::SheetError;

/// A cell write as seen by the service, in call order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedWrite {
    pub worksheet: String,
    pub cell: String,
    pub value: String,
}

/// (row, column) -> value. Rows are 1-indexed, columns 0-indexed.
type Grid = BTreeMap<(u32, usize), String>;

#[derive(Debug, Default)]
struct Workbook {
    sheets: Vec<(String, Grid)>,
    created: Vec<String>,
    writes: Vec<RecordedWrite>,
}

impl Workbook {
    fn grid(&self, title: &str) -> Option<&Grid> {
        self.sheets.iter().find(|(t, _)| t == title).map(|(_, g)| g)
    }

    fn grid_mut(&mut self, title: &str) -> Option<&mut Grid> {
        self.sheets
            .iter_mut()
            .find(|(t, _)| t == title)
            .map(|(_, g)| g)
    }
}

/// In-memory workbook. Backs the tests and `sheets --dry-run`.
#[derive(Debug, Default)]
pub struct MemorySheetService {
    book: Mutex<Workbook>,
}

impl MemorySheetService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an empty worksheet without recording it as created.
    pub fn with_worksheet(self, title: &str) -> Self {
        self.lock().sheets.push((title.to_string(), Grid::new()));
        self
    }

    /// Sets a cell without recording a write.
    pub fn seed(&self, title: &str, cell: &str, value: &str) -> Result<(), SheetError> {
        let (column, row) =
            parse_cell_ref(cell).ok_or_else(|| SheetError::InvalidCell(cell.to_string()))?;
        let mut book = self.lock();
        let grid = book
            .grid_mut(title)
            .ok_or_else(|| SheetError::WorksheetNotFound(title.to_string()))?;
        grid.insert((row, column), value.to_string());
        Ok(())
    }

    pub fn cell(&self, title: &str, cell: &str) -> Option<String> {
        let (column, row) = parse_cell_ref(cell)?;
        self.lock().grid(title)?.get(&(row, column)).cloned()
    }

    pub fn writes(&self) -> Vec<RecordedWrite> {
        self.lock().writes.clone()
    }

    pub fn created_worksheets(&self) -> Vec<String> {
        self.lock().created.clone()
    }

    /// Every row of a worksheet from row 1 to its last occupied row.
    pub fn rows(&self, title: &str) -> Vec<Vec<String>> {
        let book = self.lock();
        match book.grid(title) {
            Some(grid) => collect_rows(grid, None, None),
            None => Vec::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Workbook> {
        self.book.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl SheetService for MemorySheetService {
    async fn list_worksheets(&self) -> Result<Vec<String>, SheetError> {
        Ok(self.lock().sheets.iter().map(|(t, _)| t.clone()).collect())
    }

    async fn create_worksheet(
        &self,
        title: &str,
        _rows: u32,
        _cols: u32,
    ) -> Result<Worksheet, SheetError> {
        let mut book = self.lock();
        if book.grid(title).is_some() {
            return Err(SheetError::Api {
                status: 400,
                body: format!("A sheet with the name \"{}\" already exists", title),
            });
        }
        book.sheets.push((title.to_string(), Grid::new()));
        book.created.push(title.to_string());
        Ok(Worksheet {
            title: title.to_string(),
        })
    }

    async fn read_range(
        &self,
        worksheet: &Worksheet,
        range: &str,
    ) -> Result<Vec<Vec<String>>, SheetError> {
        let (rows, columns) =
            parse_range(range).ok_or_else(|| SheetError::InvalidCell(range.to_string()))?;
        let book = self.lock();
        let grid = book
            .grid(&worksheet.title)
            .ok_or_else(|| SheetError::WorksheetNotFound(worksheet.title.clone()))?;
        Ok(collect_rows(grid, rows, columns))
    }

    async fn write_cell(
        &self,
        worksheet: &Worksheet,
        cell: &str,
        value: &str,
    ) -> Result<(), SheetError> {
        let (column, row) =
            parse_cell_ref(cell).ok_or_else(|| SheetError::InvalidCell(cell.to_string()))?;
        let mut book = self.lock();
        let grid = book
            .grid_mut(&worksheet.title)
            .ok_or_else(|| SheetError::WorksheetNotFound(worksheet.title.clone()))?;

        if value.is_empty() {
            grid.remove(&(row, column));
        } else {
            grid.insert((row, column), value.to_string());
        }

        book.writes.push(RecordedWrite {
            worksheet: worksheet.title.clone(),
            cell: cell.to_string(),
            value: value.to_string(),
        });
        Ok(())
    }
}

type Span<T> = Option<(T, T)>;

/// Parses `"7:7"`, `"A:C"`, `"A1:E5"` or `"B2"` into row and column spans.
/// `None` for a span means unbounded.
fn parse_range(range: &str) -> Option<(Span<u32>, Span<usize>)> {
    let (start, end) = range.split_once(':').unwrap_or((range, range));

    if let (Ok(first), Ok(last)) = (start.parse::<u32>(), end.parse::<u32>()) {
        return (first > 0 && first <= last).then_some((Some((first, last)), None));
    }
    if let (Some(first), Some(last)) = (column_index(start), column_index(end)) {
        return (first <= last).then_some((None, Some((first, last))));
    }
    let (c1, r1) = parse_cell_ref(start)?;
    let (c2, r2) = parse_cell_ref(end)?;
    (r1 <= r2 && c1 <= c2).then_some((Some((r1, r2)), Some((c1, c2))))
}

fn collect_rows(grid: &Grid, rows: Span<u32>, columns: Span<usize>) -> Vec<Vec<String>> {
    let last_row = grid.keys().map(|(r, _)| *r).max().unwrap_or(0);
    let (first_row, last_row) = match rows {
        Some((first, last)) => (first, last.min(last_row)),
        None => (1, last_row),
    };
    let first_col = columns.map(|(first, _)| first).unwrap_or(0);
    let col_limit = columns.map(|(_, last)| last).unwrap_or(usize::MAX);

    let mut out: Vec<Vec<String>> = Vec::new();
    for row in first_row..=last_row {
        let occupied: Vec<(usize, &String)> = grid
            .range((row, first_col)..=(row, col_limit))
            .map(|((_, c), v)| (*c, v))
            .collect();

        let mut values = Vec::new();
        if let Some((last_col, _)) = occupied.last() {
            values = vec![String::new(); last_col - first_col + 1];
            for (col, value) in occupied {
                values[col - first_col] = value.clone();
            }
        }
        out.push(values);
    }

    while out.last().is_some_and(|row| row.is_empty()) {
        out.pop();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sheet::WorksheetLookup;

    fn sheet(title: &str) -> Worksheet {
        Worksheet {
            title: title.to_string(),
        }
    }

    #[tokio::test]
    async fn test_row_values_keep_gaps_and_trim_tail() {
        let service = MemorySheetService::new().with_worksheet("AAPL");
        service.seed("AAPL", "A7", "Summary").unwrap();
        service.seed("AAPL", "D7", "2023-08-27").unwrap();

        let row = service.row_values(&sheet("AAPL"), 7).await.unwrap();
        assert_eq!(row, ["Summary", "", "", "2023-08-27"]);

        let empty = service.row_values(&sheet("AAPL"), 9).await.unwrap();
        assert!(empty.is_empty());
    }

    #[tokio::test]
    async fn test_open_worksheet_lookup() {
        let service = MemorySheetService::new().with_worksheet("AAPL");

        assert_eq!(
            service.open_worksheet("AAPL").await.unwrap(),
            WorksheetLookup::Found(sheet("AAPL"))
        );
        assert_eq!(
            service.open_worksheet("MSFT").await.unwrap(),
            WorksheetLookup::NotFound
        );
    }

    #[tokio::test]
    async fn test_writes_are_recorded() {
        let service = MemorySheetService::new();
        let ws = service.create_worksheet("F", 1000, 26).await.unwrap();
        service.write_cell(&ws, "B1", "12.10").await.unwrap();

        assert_eq!(service.cell("F", "B1").as_deref(), Some("12.10"));
        assert_eq!(service.created_worksheets(), ["F"]);
        assert_eq!(
            service.writes(),
            [RecordedWrite {
                worksheet: "F".to_string(),
                cell: "B1".to_string(),
                value: "12.10".to_string(),
            }]
        );
        assert!(service.create_worksheet("F", 1000, 26).await.is_err());
    }

    #[tokio::test]
    async fn test_write_to_missing_worksheet() {
        let service = MemorySheetService::new();
        let err = service.write_cell(&sheet("GOOGL"), "A1", "x").await.unwrap_err();
        assert!(matches!(err, SheetError::WorksheetNotFound(_)));
    }

    #[test]
    fn test_parse_range() {
        assert_eq!(parse_range("7:7"), Some((Some((7, 7)), None)));
        assert_eq!(parse_range("A:C"), Some((None, Some((0, 2)))));
        assert_eq!(parse_range("A1:E5"), Some((Some((1, 5)), Some((0, 4)))));
        assert_eq!(parse_range("B2"), Some((Some((2, 2)), Some((1, 1)))));
        assert_eq!(parse_range("0:0"), None);
        assert_eq!(parse_range("E5:A1"), None);
    }

    #[test]
    fn test_rectangular_read() {
        let mut grid = Grid::new();
        grid.insert((1, 0), "AAPL".to_string());
        grid.insert((2, 1), "x".to_string());
        grid.insert((3, 3), "far".to_string());

        let rows = collect_rows(&grid, Some((1, 3)), Some((0, 1)));
        assert_eq!(rows, vec![vec!["AAPL".to_string()], vec!["".to_string(), "x".to_string()]]);
    }
}
