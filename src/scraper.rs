use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_LANGUAGE};
use reqwest::{Client, StatusCode};
use std::time::{Duration, Instant};
use tokio_retry::strategy::FixedInterval;
use tokio_retry::RetryIf;

use crate::config::ScraperConfig;
use crate::utils::error::{AppError, FetchError};

/// Downloads the raw markup of a product page.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

/// `PageFetcher` over a plain HTTP GET.
///
/// Only a `200 OK` response counts as success. Redirects are followed the way
/// reqwest does by default and no cookies are kept between requests.
#[derive(Clone)]
pub struct HttpFetcher {
    client: Client,
    timeout: Duration,
    retry_attempts: u32,
    retry_delay: Duration,
}

impl HttpFetcher {
    pub fn new(config: &ScraperConfig) -> Result<Self, AppError> {
        let mut headers = HeaderMap::new();
        let accept_language = HeaderValue::from_str(&config.accept_language)
            .map_err(|e| AppError::Validation(format!("Invalid Accept-Language header: {}", e)))?;
        headers.insert(ACCEPT_LANGUAGE, accept_language);

        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            timeout: config.timeout(),
            retry_attempts: config.retry_attempts,
            retry_delay: Duration::from_millis(config.retry_delay_ms),
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    async fn fetch_once(&self, url: &str) -> Result<String, FetchError> {
        let response = self.client.get(url).timeout(self.timeout).send().await?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(FetchError::Status(status.as_u16()));
        }

        Ok(response.text().await?)
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let start_time = Instant::now();
        let strategy = FixedInterval::new(self.retry_delay).take(self.retry_attempts as usize);

        let result = RetryIf::spawn(
            strategy,
            || self.fetch_once(url),
            |e: &FetchError| {
                let transient = e.is_transient();
                if transient {
                    tracing::debug!("Retrying {} after transient failure: {}", url, e);
                }
                transient
            },
        )
        .await;

        // Covers every attempt, failed ones included
        let outcome = if result.is_ok() { "success" } else { "failure" };
        metrics::histogram!("price_notifier_fetch_duration_seconds", "outcome" => outcome)
            .record(start_time.elapsed().as_secs_f64());
        metrics::counter!("price_notifier_fetches_total", "outcome" => outcome).increment(1);
        result
    }
}
