use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

pub const DEFAULT_BASE_URL: &str = "https://fashion-studio.dicoding.dev/";
pub const DEFAULT_CSV_PATH: &str = "products.csv";
pub const DEFAULT_RAW_CSV_PATH: &str = "raw_products.csv";
pub const DEFAULT_SHEET_NAME: &str = "Fashion Data";

/// Knobs for the fetch/pagination loop.
#[derive(Debug, Clone)]
pub struct ExtractConfig {
    /// Page 1 URL. Page N is `base_url + "page" + N`.
    pub base_url: String,
    pub max_pages: usize,
    /// Stop once at least this many raw records are collected.
    pub target_records: usize,
    pub retry_attempts: u32,
    pub retry_delay: Duration,
    pub page_delay: Duration,
    pub request_timeout: Duration,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            max_pages: 50,
            target_records: 1000,
            retry_attempts: 3,
            retry_delay: Duration::from_secs(2),
            page_delay: Duration::from_millis(1500),
            request_timeout: Duration::from_secs(15),
        }
    }
}

impl ExtractConfig {
    pub fn page_url(&self, page: usize) -> String {
        if page <= 1 {
            self.base_url.clone()
        } else {
            format!("{}page{}", self.base_url, page)
        }
    }
}

#[derive(Debug, Clone)]
pub struct NormalizeConfig {
    /// Multiplier from the listed currency to the local one.
    pub exchange_rate: f64,
    pub max_rows: usize,
}

impl Default for NormalizeConfig {
    fn default() -> Self {
        Self {
            exchange_rate: 16000.0,
            max_rows: 1000,
        }
    }
}

/// SQLite sink settings, optionally read from a JSON file.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DbConfig {
    pub path: PathBuf,
    pub table_name: String,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data/fashion.sqlite"),
            table_name: "fashion_data".to_string(),
        }
    }
}

impl DbConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read database config {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("Invalid database config {}", path.display()))
    }
}

/// Spreadsheet sink settings. Credentials are only resolved when the sink runs.
#[derive(Debug, Clone)]
pub struct SheetsConfig {
    pub credentials_path: PathBuf,
    pub sheet_name: String,
}

impl Default for SheetsConfig {
    fn default() -> Self {
        Self {
            credentials_path: PathBuf::from("google-sheets-api.json"),
            sheet_name: DEFAULT_SHEET_NAME.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_urls() {
        let cfg = ExtractConfig::default();
        assert_eq!(cfg.page_url(1), "https://fashion-studio.dicoding.dev/");
        assert_eq!(cfg.page_url(2), "https://fashion-studio.dicoding.dev/page2");
        assert_eq!(cfg.page_url(50), "https://fashion-studio.dicoding.dev/page50");
    }

    #[test]
    fn db_config_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("db.json");
        std::fs::write(&path, r#"{"table_name": "products"}"#).unwrap();
        let cfg = DbConfig::load(&path).unwrap();
        assert_eq!(cfg.table_name, "products");
        assert_eq!(cfg.path, PathBuf::from("data/fashion.sqlite"));
    }

    #[test]
    fn db_config_missing_file() {
        let err = DbConfig::load(Path::new("/nonexistent/db.json")).unwrap_err();
        assert!(err.to_string().contains("Failed to read database config"));
    }
}
