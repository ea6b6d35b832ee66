// SPDX-FileCopyrightText: 2025 Joost van der Laan <joost@fashionunited.com>
//
// SPDX-License-Identifier: AGPL-3.0-only

use chrono::{Datelike, Local, NaiveDate};

/// Months right after a fiscal quarter end, when the previous quarter's
/// figures have been published.
pub const QUARTER_CLOSING_MONTHS: [u32; 4] = [1, 4, 7, 10];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuarterBoundary {
    pub is_closing_month: bool,
    /// End of the most recently completed quarter, e.g. `2023-6-30`.
    pub label: String,
}

/// Computes the quarter boundary for `date`. The day of month is ignored.
pub fn quarter_boundary(date: NaiveDate) -> QuarterBoundary {
    let year = date.year();
    let month = date.month();

    let label = match month {
        1..=3 => format!("{}-12-31", year - 1),
        4..=6 => format!("{}-3-31", year),
        7..=9 => format!("{}-6-30", year),
        _ => format!("{}-9-30", year),
    };

    QuarterBoundary {
        is_closing_month: QUARTER_CLOSING_MONTHS.contains(&month),
        label,
    }
}

/// Today's date from the local system clock.
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Date key used for daily snapshots.
pub fn daily_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn boundary(year: i32, month: u32, day: u32) -> QuarterBoundary {
        quarter_boundary(NaiveDate::from_ymd_opt(year, month, day).unwrap())
    }

    #[test]
    fn test_labels_for_every_month_across_years() {
        for year in [2023, 2024] {
            let expected = [
                format!("{}-12-31", year - 1),
                format!("{}-12-31", year - 1),
                format!("{}-12-31", year - 1),
                format!("{}-3-31", year),
                format!("{}-3-31", year),
                format!("{}-3-31", year),
                format!("{}-6-30", year),
                format!("{}-6-30", year),
                format!("{}-6-30", year),
                format!("{}-9-30", year),
                format!("{}-9-30", year),
                format!("{}-9-30", year),
            ];
            for (idx, label) in expected.iter().enumerate() {
                let month = idx as u32 + 1;
                assert_eq!(&boundary(year, month, 15).label, label, "month {}", month);
            }
        }
    }

    #[test]
    fn test_year_boundary_december_to_january() {
        assert_eq!(boundary(2023, 12, 31).label, "2023-9-30");
        assert_eq!(boundary(2024, 1, 1).label, "2023-12-31");
    }

    #[test]
    fn test_label_ignores_day_of_month() {
        assert_eq!(boundary(2024, 5, 1).label, boundary(2024, 5, 31).label);
    }

    #[test]
    fn test_closing_months() {
        for month in 1..=12 {
            let expected = matches!(month, 1 | 4 | 7 | 10);
            assert_eq!(
                boundary(2024, month, 10).is_closing_month,
                expected,
                "month {}",
                month
            );
        }
    }

    #[test]
    fn test_daily_key_is_zero_padded() {
        let date = NaiveDate::from_ymd_opt(2023, 8, 7).unwrap();
        assert_eq!(daily_key(date), "2023-08-07");
    }
}
