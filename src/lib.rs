pub mod config;
pub mod element_finder;
pub mod models;
pub mod price;
pub mod product_manager;
pub mod refresh;
pub mod scraper;
pub mod store;
pub mod utils;

// Re-export commonly used types
pub use config::AppConfig;
pub use element_finder::{ElementFinder, PriceMatch};
pub use models::{NewProduct, Product, ThousandsSeparator};
pub use product_manager::{ProductManager, RefreshReport};
pub use refresh::RefreshEngine;
pub use scraper::{HttpFetcher, PageFetcher};
pub use store::ProductStore;
pub use utils::error::AppError;

pub type Result<T> = std::result::Result<T, AppError>;
