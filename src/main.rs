// SPDX-FileCopyrightText: 2025 Joost van der Laan <joost@fashionunited.com>
//
// SPDX-License-Identifier: AGPL-3.0-only

use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ticker_snapshots::config::{self, Config};
use ticker_snapshots::historical::{self, HistoricalRequest};
use ticker_snapshots::pipeline::{Phase, Pipeline, RunSummary};
use ticker_snapshots::quarter::{self, quarter_boundary};
use ticker_snapshots::sheet::{GoogleSheetsClient, MemorySheetService, SheetService};
use ticker_snapshots::store::HistoryStore;
use ticker_snapshots::yahoo::{self, YahooScraper};

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to config.toml (defaults to the one next to Cargo.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Symbols to process instead of the configured tickers (comma-separated)
    #[arg(long, global = true, value_delimiter = ',')]
    symbols: Option<Vec<String>>,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Scrape today's summary into each symbol's history (default)
    Daily,
    /// Record the current quarter's statistics and statements when due
    Quarterly,
    /// Mirror the latest snapshot of each symbol into its worksheet
    Sheets {
        /// Build the worksheets in memory and print them instead of writing
        #[arg(long)]
        dry_run: bool,
    },
    /// Daily collection followed by the sheet update
    Run,
    /// Download historical prices as CSV
    Historical {
        #[arg(long)]
        symbol: String,
        /// Start date (YYYY-MM-DD format)
        #[arg(long)]
        from: String,
        /// End date (YYYY-MM-DD format)
        #[arg(long)]
        to: String,
        /// 1d, 1wk or 1mo
        #[arg(long, default_value = "1mo")]
        interval: String,
    },
    /// Print today's quarter label and whether this is a quarter-closing month
    QuarterInfo,
}

fn parse_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .with_context(|| format!("Invalid date {} (expected YYYY-MM-DD)", value))
}

fn google_client(config: &Config, http: reqwest::Client) -> Result<GoogleSheetsClient> {
    let spreadsheet_id = config
        .sheets
        .spreadsheet_id
        .clone()
        .context("sheets.spreadsheet_id must be set in config.toml")?;
    let token = env::var("GOOGLE_SHEETS_TOKEN").context("GOOGLE_SHEETS_TOKEN must be set")?;

    let client = GoogleSheetsClient::new(http, spreadsheet_id, token);
    Ok(match &config.sheets.base_url {
        Some(base_url) => client.with_base_url(base_url.clone()),
        None => client,
    })
}

fn print_summary(label: &str, summary: &RunSummary) {
    println!(
        "✅ {}: {}/{} symbols processed",
        label, summary.succeeded, summary.total
    );
    for (symbol, error) in &summary.failures {
        eprintln!("❌ {}: {}", symbol, error);
    }
}

fn print_workbook(sheets: &MemorySheetService, symbols: &[String]) {
    for symbol in symbols {
        println!("--- {} ---", symbol);
        for (idx, row) in sheets.rows(symbol).iter().enumerate() {
            println!("{:>4} | {}", idx + 1, row.join(" | "));
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => config::load_config_from(path)?,
        None => config::load_config()?,
    };
    let symbols = cli.symbols.clone().unwrap_or_else(|| config.tickers.clone());
    let today = quarter::today();

    let http = yahoo::build_client(&config.user_agent, config.request_timeout())
        .context("Failed to build HTTP client")?;
    let store = HistoryStore::new(&config.data_dir);

    let command = cli.command.unwrap_or(Commands::Daily);
    let phase = match command {
        Commands::QuarterInfo => {
            let boundary = quarter_boundary(today);
            println!("Today:          {}", today);
            println!("Quarter label:  {}", boundary.label);
            println!("Closing month:  {}", boundary.is_closing_month);
            return Ok(());
        }
        Commands::Historical {
            symbol,
            from,
            to,
            interval,
        } => {
            let request =
                HistoricalRequest::new(&symbol, parse_date(&from)?, parse_date(&to)?, &interval)?;
            let body =
                historical::download(&http, historical::DEFAULT_DOWNLOAD_URL, &request).await?;
            let path = store.historical_csv_path(&symbol);
            let rows = historical::append_history_csv(&path, &body)?;
            println!("✅ {} rows written to: {}", rows, path.display());
            return Ok(());
        }
        Commands::Daily => Phase::Daily,
        Commands::Quarterly => Phase::Quarterly,
        Commands::Sheets { dry_run: true } => {
            let scraper = YahooScraper::new(http);
            let sheets = MemorySheetService::new();
            let pipeline = Pipeline::new(&scraper, store, today).with_sheets(&sheets);
            let summary = pipeline.run(Phase::Sheets, &symbols).await?;
            print_workbook(&sheets, &symbols);
            print_summary("Sheets (dry run)", &summary);
            return Ok(());
        }
        Commands::Sheets { dry_run: false } => Phase::Sheets,
        Commands::Run => Phase::Run,
    };

    info!(?phase, symbols = symbols.len(), "Starting");
    let scraper = YahooScraper::new(http.clone());
    let google = match phase {
        Phase::Sheets | Phase::Run => Some(google_client(&config, http)?),
        Phase::Daily | Phase::Quarterly => None,
    };

    let mut pipeline = Pipeline::new(&scraper, store, today)
        .with_delay(config.symbol_delay())
        .with_progress(true);
    if let Some(google) = &google {
        pipeline = pipeline.with_sheets(google as &dyn SheetService);
    }

    let summary = pipeline.run(phase, &symbols).await?;
    print_summary(&format!("{:?}", phase), &summary);
    Ok(())
}
