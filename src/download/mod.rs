//! Song download with bounded retries
//!
//! The fetch itself is delegated to an [`AudioFetcher`]; this module owns
//! the retry policy around it.

pub mod fetcher;

pub use fetcher::{AudioFetcher, FetchError, YtDlpFetcher};

use crate::config::Settings;
use crate::error::{ClipError, Result};
use std::path::Path;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{error, info, warn};

/// Bounded retry policy with a fixed delay between attempts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub max_attempts: u32,
    /// Sleep between consecutive attempts
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.max_download_retries, settings.retry_delay())
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_secs(5))
    }
}

/// Downloads songs through a fetcher, retrying transient failures
pub struct Downloader {
    fetcher: Arc<dyn AudioFetcher>,
    policy: RetryPolicy,
    format: String,
}

impl Downloader {
    pub fn new(fetcher: Arc<dyn AudioFetcher>, policy: RetryPolicy, format: impl Into<String>) -> Self {
        Self {
            fetcher,
            policy,
            format: format.into(),
        }
    }

    /// Download `query` to `template`, returning whether any attempt succeeded
    pub fn download(&self, query: &str, template: &Path) -> bool {
        match self.try_download(query, template) {
            Ok(_) => true,
            Err(e) => {
                error!("{}", e);
                false
            }
        }
    }

    /// Download with retries, returning the number of attempts used
    pub fn try_download(&self, query: &str, template: &Path) -> Result<u32> {
        let max = self.policy.max_attempts;
        let mut last_error = String::new();

        for attempt in 1..=max {
            info!(
                "Attempting download: '{}', attempt {} ({})",
                query,
                attempt,
                self.fetcher.name()
            );
            match self.fetcher.fetch(query, template, &self.format) {
                Ok(()) => return Ok(attempt),
                Err(e) => {
                    warn!("Download attempt {} failed: {}", attempt, e);
                    last_error = e.to_string();
                    if attempt < max && !self.policy.delay.is_zero() {
                        thread::sleep(self.policy.delay);
                    }
                }
            }
        }

        Err(ClipError::DownloadFailed {
            query: query.to_string(),
            attempts: max,
            reason: last_error,
        })
    }
}
