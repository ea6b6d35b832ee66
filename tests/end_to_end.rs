// SPDX-FileCopyrightText: 2025 Joost van der Laan <joost@fashionunited.com>
//
// SPDX-License-Identifier: AGPL-3.0-only

mod common;

use common::{StubProducer, aapl_profile, aapl_summary, date, read_json, temp_store};
use pretty_assertions::assert_eq;
use serde_json::json;

use ticker_snapshots::layout::SheetOutcome;
use ticker_snapshots::pipeline::{DailyOutcome, Phase, Pipeline, SymbolReport};
use ticker_snapshots::sheet::MemorySheetService;

fn symbols(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

#[tokio::test]
async fn test_first_run_builds_history_and_worksheet() {
    let (store, _dir) = temp_store();
    let producer = StubProducer::new()
        .with_profile("AAPL", aapl_profile())
        .with_summary("AAPL", aapl_summary("150.00", "+1.00", "0.67%", "28.5"));
    let sheets = MemorySheetService::new();

    let pipeline = Pipeline::new(&producer, store, date("2023-08-27")).with_sheets(&sheets);
    let report = pipeline.process(Phase::Run, "AAPL").await.unwrap();

    assert_eq!(
        report,
        SymbolReport::Run {
            daily: DailyOutcome::Saved {
                date: "2023-08-27".to_string(),
                first_run: true
            },
            sheet: Some(SheetOutcome::Created { cells: 18 }),
        }
    );

    let file = read_json(&pipeline.store().daily_path("AAPL"));
    assert_eq!(
        file,
        json!([
            {"profile": {
                "company": {
                    "name": "Apple Inc.",
                    "address": "One Apple Park Way",
                    "citystatezip": "Cupertino, CA 95014",
                    "country": "United States",
                    "phone": "408 996 1010",
                    "site": "https://www.apple.com"
                },
                "sector": {
                    "Sector(s)": "Technology",
                    "Industry": "Consumer Electronics",
                    "Full Time Employees": "161,000"
                }
            }},
            {"2023-08-27": [{"summary": {
                "stock_symbol": "AAPL",
                "market_price": "150.00",
                "market_change": "+1.00",
                "market_percent": "0.67%",
                "P/E Ratio": "28.5"
            }}]}
        ])
    );

    let cell = |c: &str| sheets.cell("AAPL", c);
    assert_eq!(sheets.created_worksheets(), ["AAPL"]);
    assert_eq!(cell("A1").as_deref(), Some("AAPL"));
    assert_eq!(cell("A2").as_deref(), Some("Apple Inc."));
    assert_eq!(cell("A3").as_deref(), Some("One Apple Park Way"));
    assert_eq!(cell("A4").as_deref(), Some("Cupertino, CA 95014"));
    assert_eq!(cell("A5").as_deref(), Some("https://www.apple.com"));
    assert_eq!(cell("B1").as_deref(), Some("150.00"));
    assert_eq!(cell("C1").as_deref(), Some("+1.00"));
    assert_eq!(cell("D1").as_deref(), Some("0.67%"));
    assert_eq!(cell("D3").as_deref(), Some("Sector(s)"));
    assert_eq!(cell("E3").as_deref(), Some("Technology"));
    assert_eq!(cell("D5").as_deref(), Some("Full Time Employees"));
    assert_eq!(cell("E5").as_deref(), Some("161,000"));
    assert_eq!(cell("A7").as_deref(), Some("Summary"));
    assert_eq!(cell("D7").as_deref(), Some("2023-08-27"));
    assert_eq!(cell("A8").as_deref(), Some("P/E Ratio"));
    assert_eq!(cell("D8").as_deref(), Some("28.5"));
    assert_eq!(cell("A9"), None);
    assert_eq!(sheets.rows("AAPL").len(), 8);
}

#[tokio::test]
async fn test_history_file_keeps_scrape_order() {
    let (store, _dir) = temp_store();
    let producer = StubProducer::new()
        .with_profile("AAPL", aapl_profile())
        .with_summary("AAPL", aapl_summary("150.00", "+1.00", "0.67%", "28.5"));

    let pipeline = Pipeline::new(&producer, store, date("2023-08-27"));
    pipeline.process(Phase::Daily, "AAPL").await.unwrap();

    let text = std::fs::read_to_string(pipeline.store().daily_path("AAPL")).unwrap();
    let positions: Vec<usize> = [
        "\"stock_symbol\"",
        "\"market_price\"",
        "\"market_change\"",
        "\"market_percent\"",
        "\"P/E Ratio\"",
    ]
    .iter()
    .map(|key| text.find(key).unwrap())
    .collect();
    let mut sorted = positions.clone();
    sorted.sort();
    assert_eq!(positions, sorted);
    assert!(text.find("\"profile\"").unwrap() < text.find("\"2023-08-27\"").unwrap());
}

#[tokio::test]
async fn test_next_day_appends_one_column() {
    let (store, dir) = temp_store();
    let producer = StubProducer::new()
        .with_profile("AAPL", aapl_profile())
        .with_summary("AAPL", aapl_summary("150.00", "+1.00", "0.67%", "28.5"));
    let sheets = MemorySheetService::new();

    Pipeline::new(&producer, store, date("2023-08-27"))
        .with_sheets(&sheets)
        .run(Phase::Run, &symbols(&["AAPL"]))
        .await
        .unwrap();

    producer.set_summary("AAPL", aapl_summary("152.10", "+2.10", "1.40%", "28.9"));
    let store = ticker_snapshots::store::HistoryStore::new(dir.path());
    let pipeline = Pipeline::new(&producer, store, date("2023-08-28")).with_sheets(&sheets);
    let report = pipeline.process(Phase::Run, "AAPL").await.unwrap();

    assert_eq!(
        report,
        SymbolReport::Run {
            daily: DailyOutcome::Saved {
                date: "2023-08-28".to_string(),
                first_run: false
            },
            sheet: Some(SheetOutcome::Appended {
                column: "E".to_string(),
                cells: 5
            }),
        }
    );

    assert_eq!(sheets.cell("AAPL", "E7").as_deref(), Some("2023-08-28"));
    assert_eq!(sheets.cell("AAPL", "E8").as_deref(), Some("28.9"));
    assert_eq!(sheets.cell("AAPL", "D8").as_deref(), Some("28.5"));
    assert_eq!(sheets.cell("AAPL", "B1").as_deref(), Some("152.10"));
    assert_eq!(sheets.cell("AAPL", "D1").as_deref(), Some("1.40%"));
    assert_eq!(sheets.created_worksheets(), ["AAPL"]);

    // Profile scraped once, newest entry first after it.
    assert_eq!(StubProducer::calls(&producer.profile_calls), 1);
    let history = pipeline.store().load_daily("AAPL").unwrap().unwrap();
    assert_eq!(history.dates().collect::<Vec<_>>(), ["2023-08-28", "2023-08-27"]);
    let file = read_json(&pipeline.store().daily_path("AAPL"));
    assert!(file[0].get("profile").is_some());
    assert!(file[1].get("2023-08-28").is_some());
}

#[tokio::test]
async fn test_same_day_rerun_writes_nothing() {
    let (store, _dir) = temp_store();
    let producer = StubProducer::new()
        .with_profile("AAPL", aapl_profile())
        .with_summary("AAPL", aapl_summary("150.00", "+1.00", "0.67%", "28.5"));
    let sheets = MemorySheetService::new();
    let pipeline = Pipeline::new(&producer, store, date("2023-08-27")).with_sheets(&sheets);

    pipeline.process(Phase::Run, "AAPL").await.unwrap();
    let writes = sheets.writes().len();
    let before = std::fs::read_to_string(pipeline.store().daily_path("AAPL")).unwrap();

    let report = pipeline.process(Phase::Run, "AAPL").await.unwrap();

    assert_eq!(
        report,
        SymbolReport::Run {
            daily: DailyOutcome::NoNewData {
                date: "2023-08-27".to_string()
            },
            sheet: Some(SheetOutcome::AlreadyCurrent),
        }
    );
    assert_eq!(sheets.writes().len(), writes);
    assert_eq!(StubProducer::calls(&producer.summary_calls), 1);
    let after = std::fs::read_to_string(pipeline.store().daily_path("AAPL")).unwrap();
    assert_eq!(before, after);
}

#[tokio::test]
async fn test_existing_worksheet_is_never_rebuilt() {
    let (store, _dir) = temp_store();
    let producer = StubProducer::new()
        .with_summary("AAPL", aapl_summary("150.00", "+1.00", "0.67%", "28.5"));
    let sheets = MemorySheetService::new().with_worksheet("AAPL");
    sheets.seed("AAPL", "A7", "Summary").unwrap();
    sheets.seed("AAPL", "D7", "2023-08-25").unwrap();
    sheets.seed("AAPL", "E7", "2023-08-26").unwrap();

    let pipeline = Pipeline::new(&producer, store, date("2023-08-27")).with_sheets(&sheets);
    pipeline.process(Phase::Run, "AAPL").await.unwrap();

    assert!(sheets.created_worksheets().is_empty());
    assert_eq!(sheets.cell("AAPL", "F7").as_deref(), Some("2023-08-27"));
    assert_eq!(sheets.cell("AAPL", "F8").as_deref(), Some("28.5"));
    assert_eq!(sheets.cell("AAPL", "A1"), None);
    assert_eq!(sheets.cell("AAPL", "A8"), None);
}
