use std::fmt;
use std::future::Future;
use std::time::Duration;

use anyhow::Result;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, USER_AGENT};
use thiserror::Error;
use tracing::{error, info, warn};

use crate::config::ExtractConfig;

const BROWSER_UA: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/96.0.4664.110 Safari/537.36";

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },
}

/// HTTP GET with a fixed attempt budget and a fixed pause between attempts.
pub struct Fetcher {
    client: reqwest::Client,
    attempts: u32,
    retry_delay: Duration,
}

impl Fetcher {
    pub fn new(config: &ExtractConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_UA));
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            client,
            attempts: config.retry_attempts,
            retry_delay: config.retry_delay,
        })
    }

    /// Page markup, or `None` once every attempt has failed.
    pub async fn fetch(&self, url: &str) -> Option<String> {
        self.with_retries(url, || self.fetch_once(url)).await
    }

    /// Run `attempt_once` up to the attempt budget, pausing `retry_delay`
    /// between failures. No pause follows the last attempt.
    async fn with_retries<T, E, F, Fut>(&self, url: &str, mut attempt_once: F) -> Option<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: fmt::Display,
    {
        for attempt in 1..=self.attempts {
            info!("Fetching {} (attempt {}/{})", url, attempt, self.attempts);
            match attempt_once().await {
                Ok(body) => return Some(body),
                Err(e) => {
                    warn!(attempt, error = %e, "fetch failed");
                    if attempt < self.attempts {
                        info!("Retrying in {:.1}s", self.retry_delay.as_secs_f64());
                        tokio::time::sleep(self.retry_delay).await;
                    }
                }
            }
        }

        error!("Failed to fetch {} after {} attempts", url, self.attempts);
        None
    }

    async fn fetch_once(&self, url: &str) -> Result<String, FetchError> {
        let request_err = |source| FetchError::Request {
            url: url.to_string(),
            source,
        };

        let response = self.client.get(url).send().await.map_err(request_err)?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        response.text().await.map_err(request_err)
    }
}
