mod config;
mod db;
mod extract;
mod fetcher;
mod load;
mod models;
mod parser;
mod sheets;
mod transform;

use std::path::PathBuf;
use std::time::Instant;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};

use config::{DbConfig, ExtractConfig, NormalizeConfig, SheetsConfig};
use extract::{HttpSource, Paginator};
use load::{LoadOptions, LoadReport, SinkOutcome};

#[derive(Parser)]
#[command(name = "fashion_etl", about = "Fashion product scraper: extract, clean, load")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct SourceArgs {
    /// Listing URL for page 1 (page N is <base>pageN)
    #[arg(long, default_value = config::DEFAULT_BASE_URL)]
    base_url: String,
    /// Max pages to visit
    #[arg(long, default_value = "50")]
    max_pages: usize,
    /// Stop once this many raw products are collected
    #[arg(long, default_value = "1000")]
    target: usize,
}

impl SourceArgs {
    fn to_config(&self) -> ExtractConfig {
        ExtractConfig {
            base_url: self.base_url.clone(),
            max_pages: self.max_pages,
            target_records: self.target,
            ..Default::default()
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Scrape, clean and load into CSV + optional database and Google Sheets
    Run {
        #[command(flatten)]
        source: SourceArgs,
        /// Only write the CSV file
        #[arg(long)]
        csv_only: bool,
        /// Skip the database sink
        #[arg(long)]
        no_db: bool,
        /// Skip the Google Sheets sink
        #[arg(long)]
        no_sheets: bool,
        /// CSV output path
        #[arg(short, long, default_value = config::DEFAULT_CSV_PATH)]
        output_path: PathBuf,
        /// Database config file (JSON: path, table_name)
        #[arg(long)]
        db_config: Option<PathBuf>,
        /// Google Sheets credentials file (JSON: access_token)
        #[arg(long, default_value = "google-sheets-api.json")]
        sheets_creds: PathBuf,
        /// Spreadsheet name to reuse or create
        #[arg(long, default_value = config::DEFAULT_SHEET_NAME)]
        sheet_name: String,
    },
    /// Scrape only and dump raw records to CSV
    Extract {
        #[command(flatten)]
        source: SourceArgs,
        /// Raw CSV output path
        #[arg(short, long, default_value = config::DEFAULT_RAW_CSV_PATH)]
        output_path: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run {
            source,
            csv_only,
            no_db,
            no_sheets,
            output_path,
            db_config,
            sheets_creds,
            sheet_name,
        } => {
            let database = (!csv_only && !no_db).then(|| match db_config {
                Some(path) => DbConfig::load(&path),
                None => Ok(DbConfig::default()),
            });
            let sheets = (!csv_only && !no_sheets).then(|| SheetsConfig {
                credentials_path: sheets_creds,
                sheet_name,
            });
            let opts = LoadOptions {
                csv_path: output_path,
                database,
                sheets,
            };

            println!("Starting data extraction...");
            let extract_cfg = source.to_config();
            let raw = Paginator::new(HttpSource::new(&extract_cfg)?, extract_cfg).run().await;

            println!("Transforming {} raw records...", raw.len());
            let records = transform::normalize(raw, &NormalizeConfig::default());

            println!("Loading data...");
            let report = load::load_all(&records, &opts)
                .await
                .context("Pipeline failed while writing CSV")?;
            print_summary(records.len(), &report);
            Ok(())
        }
        Commands::Extract { source, output_path } => {
            let extract_cfg = source.to_config();
            let raw = Paginator::new(HttpSource::new(&extract_cfg)?, extract_cfg).run().await;
            let path = load::write_raw_csv(&raw, &output_path)?;
            println!("Extracted {} raw records to {}", raw.len(), path.display());
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    result
}

fn print_summary(count: usize, report: &LoadReport) {
    println!("\n=== Data Ingestion Summary ===");
    println!("Timestamp:  {}", chrono::Local::now().format("%Y-%m-%d %H:%M:%S"));
    println!("Records:    {}", count);
    println!("CSV:        {}", report.csv_path.display());
    match &report.spreadsheet {
        SinkOutcome::Skipped => {}
        SinkOutcome::Loaded(url) => println!("Sheets:     {}", url),
        SinkOutcome::Failed(_) => println!("Sheets:     {}", report.spreadsheet),
    }
    match &report.database {
        SinkOutcome::Skipped => {}
        SinkOutcome::Loaded(n) => println!("Database:   loaded {} rows", n),
        SinkOutcome::Failed(_) => println!("Database:   {}", report.database),
    }
    println!("==============================");
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
