use std::future::{pending, Future};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;
use validator::Validate;

use crate::config::AppConfig;
use crate::element_finder::ElementFinder;
use crate::models::{now_timestamp, NewProduct, Product};
use crate::refresh::{CheckFailure, PassOutcome, RefreshEngine};
use crate::scraper::HttpFetcher;
use crate::store::ProductStore;
use crate::utils::error::{AppError, StoreError};
use crate::Result;

/// Summary of one refresh over the whole store.
#[derive(Debug, Clone, Default)]
pub struct RefreshReport {
    /// Products at or below their target after this pass, in store order.
    pub triggered: Vec<Product>,
    pub observed: usize,
    pub failures: Vec<CheckFailure>,
    pub cancelled: bool,
    /// Whether the collection was written back after the pass.
    pub persisted: bool,
    pub total_time_ms: u64,
}

impl RefreshReport {
    fn from_outcome(outcome: PassOutcome, persisted: bool) -> Self {
        Self {
            triggered: outcome.triggered,
            observed: outcome.observed,
            failures: outcome.failures,
            cancelled: outcome.cancelled,
            persisted,
            total_time_ms: outcome.total_time_ms,
        }
    }
}

/// Entry point for everything that reads or changes the tracked products.
///
/// The store sits behind one async mutex which is held for the whole of each
/// operation, including the network work of `add` and `refresh_all`. There is
/// never more than one writer of the backing file.
pub struct ProductManager {
    store: Mutex<ProductStore>,
    engine: RefreshEngine,
}

impl ProductManager {
    pub fn new(store: ProductStore, engine: RefreshEngine) -> Self {
        Self {
            store: Mutex::new(store),
            engine,
        }
    }

    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let fetcher = HttpFetcher::new(&config.scraper)?;
        let engine = RefreshEngine::new(
            Arc::new(fetcher),
            ElementFinder::new(),
            config.scraper.max_concurrent_checks,
        );

        Ok(Self::new(
            ProductStore::new(config.storage.products_file.clone()),
            engine,
        ))
    }

    pub async fn store_path(&self) -> PathBuf {
        self.store.lock().await.path().to_path_buf()
    }

    /// Starts tracking a product.
    ///
    /// The page is fetched once right away; if a price can be read it becomes
    /// the first history entry. A failed first observation does not prevent
    /// the product from being added.
    pub async fn add(&self, new_product: NewProduct) -> Result<Product> {
        new_product.validate()?;
        if !new_product.target_price.is_finite() {
            return Err(AppError::Validation(format!(
                "target price must be a finite number, got {}",
                new_product.target_price
            )));
        }
        let parsed = url::Url::parse(&new_product.url)
            .map_err(|_| AppError::Validation(format!("Invalid URL: {}", new_product.url)))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(AppError::Validation(format!(
                "Unsupported URL scheme '{}': {}",
                parsed.scheme(),
                new_product.url
            )));
        }

        let store = self.store.lock().await;
        if store.contains_url(&new_product.url)? {
            return Err(AppError::Store(StoreError::DuplicateProduct {
                url: new_product.url,
            }));
        }

        let mut product = Product::new(new_product);
        match self
            .engine
            .observe(&product.url, product.locator.as_deref(), product.thousands_separator)
            .await
        {
            Ok(found) => {
                tracing::info!("Initial price for {} is {} (via '{}')", product.name, found.price, found.selector);
                product.record_price(found.price, now_timestamp());
            }
            Err(e) => {
                tracing::warn!("Could not read an initial price for {}: {}", product.url, e);
            }
        }

        store.add(product.clone())?;
        Ok(product)
    }

    pub async fn list(&self) -> Vec<Product> {
        self.store.lock().await.load()
    }

    /// Stops tracking the product at 1-based `index`.
    pub async fn remove(&self, index: usize) -> Result<Product> {
        let store = self.store.lock().await;
        Ok(store.remove(index)?)
    }

    pub async fn refresh_all(&self) -> RefreshReport {
        self.refresh_all_with_shutdown(pending()).await
    }

    /// Refreshes every product, stopping early once `shutdown` completes.
    ///
    /// Whatever was observed before shutdown is kept. The collection is
    /// written back exactly once; a failed write is logged and reported
    /// through [`RefreshReport::persisted`]. If the store cannot be read,
    /// nothing is fetched or written.
    pub async fn refresh_all_with_shutdown<F>(&self, shutdown: F) -> RefreshReport
    where
        F: Future<Output = ()>,
    {
        let store = self.store.lock().await;
        // A store that cannot be read is left as it is rather than overwritten
        let mut products = match store.try_load() {
            Ok(products) => products,
            Err(e) => {
                tracing::error!("Refresh skipped: {}", e);
                return RefreshReport::default();
            }
        };
        tracing::info!("Refreshing {} products", products.len());

        let outcome = self.engine.run_pass(&mut products, shutdown).await;

        let persisted = match store.save(&products) {
            Ok(()) => true,
            Err(e) => {
                tracing::error!("Refreshed prices were not saved: {}", e);
                false
            }
        };

        tracing::info!(
            "Refresh finished in {}ms: {} observed, {} failed, {} at or below target{}",
            outcome.total_time_ms,
            outcome.observed,
            outcome.failures.len(),
            outcome.triggered.len(),
            if outcome.cancelled { " (cancelled)" } else { "" }
        );

        RefreshReport::from_outcome(outcome, persisted)
    }
}
