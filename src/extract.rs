use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};

use crate::config::ExtractConfig;
use crate::fetcher::Fetcher;
use crate::models::{RawRecord, CAPTURED_AT_FORMAT};
use crate::parser;

/// Anything that can turn a page URL into raw records.
///
/// A page that could not be fetched is `Ok(vec![])`. `Err` is reserved for
/// unexpected failures, which the paginator logs and skips.
pub trait PageSource {
    async fn scrape_page(&self, url: &str) -> Result<Vec<RawRecord>>;
}

/// Live source: fetch with retries, then parse. One timestamp per page.
pub struct HttpSource {
    fetcher: Fetcher,
}

impl HttpSource {
    pub fn new(config: &ExtractConfig) -> Result<Self> {
        Ok(Self {
            fetcher: Fetcher::new(config)?,
        })
    }
}

impl PageSource for HttpSource {
    async fn scrape_page(&self, url: &str) -> Result<Vec<RawRecord>> {
        let Some(markup) = self.fetcher.fetch(url).await else {
            return Ok(Vec::new());
        };
        let captured_at = chrono::Local::now().format(CAPTURED_AT_FORMAT).to_string();
        let records = parser::parse_listings(&markup, &captured_at)?;
        info!("Extracted {} products from {}", records.len(), url);
        Ok(records)
    }
}

pub struct Paginator<S> {
    source: S,
    config: ExtractConfig,
}

impl<S: PageSource> Paginator<S> {
    pub fn new(source: S, config: ExtractConfig) -> Self {
        Self { source, config }
    }

    /// Walk pages in order until the target count, the page limit, or two
    /// consecutive empty pages.
    pub async fn run(&self) -> Vec<RawRecord> {
        let cfg = &self.config;
        info!(
            "Starting extraction: target {} products from up to {} pages",
            cfg.target_records, cfg.max_pages
        );

        let pb = ProgressBar::new(cfg.target_records as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("[{elapsed_precise}] {bar:40} {pos}/{len} products ({msg})")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=> "),
        );

        let mut all = Vec::new();
        // Records of a probed page, consumed instead of fetching it again.
        let mut probed: Option<Vec<RawRecord>> = None;
        let mut pages_scraped = 0usize;
        let mut page = 1;

        while page <= cfg.max_pages {
            let url = cfg.page_url(page);
            pb.set_message(format!("page {}/{}", page, cfg.max_pages));

            let result = match probed.take() {
                Some(records) => Ok(records),
                None => {
                    pages_scraped += 1;
                    self.source.scrape_page(&url).await
                }
            };

            match result {
                Err(e) => warn!(page, error = %e, "Error processing page"),
                Ok(records) => {
                    let found = records.len();
                    all.extend(records);
                    pb.set_position(all.len() as u64);
                    info!("Progress: {}/{} products collected", all.len(), cfg.target_records);

                    if all.len() >= cfg.target_records {
                        info!("Reached target of {} products", cfg.target_records);
                        break;
                    }

                    if found == 0 && page >= cfg.max_pages {
                        info!("No products on final page {}", page);
                    } else if found == 0 {
                        info!("No products on page {}, probing the next page", page);
                        pages_scraped += 1;
                        match self.source.scrape_page(&cfg.page_url(page + 1)).await {
                            Ok(next) if next.is_empty() => {
                                info!("Confirmed end of product listings");
                                break;
                            }
                            Ok(next) => probed = Some(next),
                            Err(e) => warn!(page = page + 1, error = %e, "Error probing page"),
                        }
                    }
                }
            }

            page += 1;
            if page <= cfg.max_pages {
                tokio::time::sleep(cfg.page_delay).await;
            }
        }

        pb.finish_and_clear();
        info!(
            "Extraction complete: {} products from {} page requests",
            all.len(),
            pages_scraped
        );
        all
    }
}
