use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{error, info};

use crate::config::{DbConfig, SheetsConfig};
use crate::models::{NormalizedRecord, RawRecord, RAW_HEADER};
use crate::{db, sheets};

/// Result of one optional sink.
#[derive(Debug, Clone, PartialEq)]
pub enum SinkOutcome<T> {
    Skipped,
    Loaded(T),
    Failed(String),
}

impl<T: fmt::Display> fmt::Display for SinkOutcome<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SinkOutcome::Skipped => write!(f, "skipped"),
            SinkOutcome::Loaded(v) => write!(f, "{}", v),
            SinkOutcome::Failed(e) => write!(f, "FAILED ({})", e),
        }
    }
}

pub struct LoadOptions {
    pub csv_path: PathBuf,
    /// `None` disables the database sink. `Some(Err)` is a config file that
    /// could not be loaded; the sink is reported as failed without writing.
    pub database: Option<Result<DbConfig>>,
    /// `None` disables the spreadsheet sink.
    pub sheets: Option<SheetsConfig>,
}

pub struct LoadReport {
    pub csv_path: PathBuf,
    /// Rows written.
    pub database: SinkOutcome<usize>,
    /// Spreadsheet URL.
    pub spreadsheet: SinkOutcome<String>,
}

/// CSV first (fatal on failure), then the optional sinks, whose errors are
/// reported in the outcome instead of propagated.
pub async fn load_all(records: &[NormalizedRecord], opts: &LoadOptions) -> Result<LoadReport> {
    let csv_path = write_csv(records, &opts.csv_path)?;

    let spreadsheet = match &opts.sheets {
        None => SinkOutcome::Skipped,
        Some(cfg) => match sheets::load(&cfg.credentials_path, &cfg.sheet_name, records).await {
            Ok(url) => SinkOutcome::Loaded(url),
            Err(e) => {
                error!("Failed to save to Google Sheets: {:#}", e);
                SinkOutcome::Failed(format!("{:#}", e))
            }
        },
    };

    let database = match &opts.database {
        None => SinkOutcome::Skipped,
        Some(Err(e)) => {
            error!("Database sink not configured: {:#}", e);
            SinkOutcome::Failed(format!("{:#}", e))
        }
        Some(Ok(cfg)) => match db::load(&cfg.path, &cfg.table_name, records) {
            Ok(n) => {
                info!("Loaded {} rows into {} ({})", n, cfg.table_name, cfg.path.display());
                SinkOutcome::Loaded(n)
            }
            Err(e) => {
                error!("Failed to save to database: {:#}", e);
                SinkOutcome::Failed(format!("{:#}", e))
            }
        },
    };

    Ok(LoadReport {
        csv_path,
        database,
        spreadsheet,
    })
}

fn create_writer(path: &Path) -> Result<csv::Writer<std::fs::File>> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;
    }
    csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .with_context(|| format!("Failed to open {}", path.display()))
}

/// Header row is written even when there are no records.
pub fn write_csv(records: &[NormalizedRecord], path: &Path) -> Result<PathBuf> {
    let mut wtr = create_writer(path)?;
    wtr.write_record(NormalizedRecord::HEADER)?;
    for r in records {
        wtr.serialize(r)?;
    }
    wtr.flush()?;
    info!("Saved {} rows to {}", records.len(), path.display());
    Ok(path.to_path_buf())
}

/// Raw records with placeholder text filled in, for inspecting extraction.
pub fn write_raw_csv(records: &[RawRecord], path: &Path) -> Result<PathBuf> {
    let mut wtr = create_writer(path)?;
    wtr.write_record(RAW_HEADER)?;
    for r in records {
        wtr.write_record(r.to_row())?;
    }
    wtr.flush()?;
    info!("Saved {} raw records to {}", records.len(), path.display());
    Ok(path.to_path_buf())
}
