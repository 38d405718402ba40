use futures::stream::{self, StreamExt};
use std::future::Future;
use std::sync::Arc;
use tokio::time::Instant;

use crate::element_finder::{ElementFinder, PriceMatch};
use crate::models::{now_timestamp, Product, ThousandsSeparator};
use crate::scraper::PageFetcher;
use crate::utils::error::CheckError;

/// A product whose price could not be observed during a pass.
#[derive(Debug, Clone)]
pub struct CheckFailure {
    pub name: String,
    pub url: String,
    pub error: CheckError,
}

/// Outcome of one pass over the in-memory collection.
#[derive(Debug, Clone, Default)]
pub struct PassOutcome {
    /// Products whose price observed in this pass is at or below their target,
    /// in store order.
    pub triggered: Vec<Product>,
    pub observed: usize,
    pub failures: Vec<CheckFailure>,
    /// Set when the shutdown signal fired before every product was checked.
    pub cancelled: bool,
    pub total_time_ms: u64,
}

#[derive(Debug)]
struct Job {
    index: usize,
    url: String,
    locator: Option<String>,
    separator: ThousandsSeparator,
}

/// Fetches and reads prices for tracked products.
///
/// Pages are downloaded concurrently, at most `max_concurrent_checks` at a
/// time. Every observation is applied to the collection by the task driving
/// the pass, so products are only ever mutated by one writer.
pub struct RefreshEngine {
    fetcher: Arc<dyn PageFetcher>,
    finder: ElementFinder,
    max_concurrent_checks: usize,
}

impl RefreshEngine {
    pub fn new(fetcher: Arc<dyn PageFetcher>, finder: ElementFinder, max_concurrent_checks: usize) -> Self {
        Self {
            fetcher,
            finder,
            max_concurrent_checks: max_concurrent_checks.max(1),
        }
    }

    /// Fetches `url` and reads the price from it.
    pub async fn observe(
        &self,
        url: &str,
        locator: Option<&str>,
        separator: ThousandsSeparator,
    ) -> Result<PriceMatch, CheckError> {
        let html = self.fetcher.fetch(url).await?;
        let found = self.finder.extract(&html, locator, separator)?;
        Ok(found)
    }

    /// Checks every product once, stopping early if `shutdown` completes.
    ///
    /// A failed fetch or extraction leaves that product untouched. Products
    /// not reached before shutdown are also left untouched.
    pub async fn run_pass<F>(&self, products: &mut [Product], shutdown: F) -> PassOutcome
    where
        F: Future<Output = ()>,
    {
        let start_time = Instant::now();
        let jobs: Vec<Job> = products
            .iter()
            .enumerate()
            .map(|(index, product)| Job {
                index,
                url: product.url.clone(),
                locator: product.locator.clone(),
                separator: product.thousands_separator,
            })
            .collect();

        let mut results: Vec<Option<Result<PriceMatch, CheckError>>> = vec![None; jobs.len()];
        let mut cancelled = false;

        {
            let checks = stream::iter(jobs)
                .map(|job| async move {
                    let result = self
                        .observe(&job.url, job.locator.as_deref(), job.separator)
                        .await;
                    (job.index, result)
                })
                .buffer_unordered(self.max_concurrent_checks);

            tokio::pin!(checks);
            tokio::pin!(shutdown);
            loop {
                tokio::select! {
                    biased;
                    _ = &mut shutdown => {
                        cancelled = true;
                        break;
                    }
                    next = checks.next() => match next {
                        Some((index, result)) => results[index] = Some(result),
                        None => break,
                    },
                }
            }
        }

        let now = now_timestamp();
        let mut outcome = PassOutcome {
            cancelled,
            ..PassOutcome::default()
        };

        for (product, result) in products.iter_mut().zip(results) {
            match result {
                Some(Ok(found)) => {
                    outcome.observed += 1;
                    metrics::counter!("price_notifier_observations_total", "outcome" => "success")
                        .increment(1);
                    if product.record_price(found.price, now) {
                        tracing::info!(
                            "{} is at {} (target {})",
                            product.name,
                            found.price,
                            product.target_price
                        );
                        outcome.triggered.push(product.clone());
                    }
                }
                Some(Err(error)) => {
                    metrics::counter!("price_notifier_observations_total", "outcome" => "failure")
                        .increment(1);
                    tracing::warn!("Price unavailable for {} ({}): {}", product.name, product.url, error);
                    outcome.failures.push(CheckFailure {
                        name: product.name.clone(),
                        url: product.url.clone(),
                        error,
                    });
                }
                None => {
                    tracing::debug!("Skipped {} after shutdown", product.url);
                }
            }
        }

        outcome.total_time_ms = start_time.elapsed().as_millis() as u64;
        outcome
    }
}
