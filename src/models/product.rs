use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::{now_timestamp, timestamp_format, PriceHistory, ThousandsSeparator};

/// A tracked product, in the shape it is persisted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Product {
    pub name: String,
    pub url: String,
    pub target_price: f64,

    /// Explicit CSS selector for the price; `None` uses the built-in candidates.
    #[serde(rename = "selector_css", default)]
    pub locator: Option<String>,
    #[serde(default)]
    pub thousands_separator: ThousandsSeparator,

    #[serde(rename = "added_date", with = "timestamp_format")]
    pub added_at: NaiveDateTime,

    // Last successfully observed price
    #[serde(default)]
    pub current_price: Option<f64>,
    #[serde(default)]
    pub price_history: PriceHistory,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NewProduct {
    #[validate(length(min = 1, message = "name must not be empty"))]
    pub name: String,
    #[validate(url(message = "url must be a valid URL"))]
    pub url: String,
    #[validate(range(min = 0.0, message = "target price must not be negative"))]
    pub target_price: f64,
    #[validate(length(min = 1, message = "selector must not be empty"))]
    pub locator: Option<String>,
    pub thousands_separator: ThousandsSeparator,
}

impl Product {
    pub fn new(new_product: NewProduct) -> Self {
        Self {
            name: new_product.name,
            url: new_product.url,
            target_price: new_product.target_price,
            locator: new_product.locator,
            thousands_separator: new_product.thousands_separator,
            added_at: now_timestamp(),
            current_price: None,
            price_history: PriceHistory::new(),
        }
    }

    /// Stores a successful observation. Returns whether it crossed the target.
    pub fn record_price(&mut self, price: f64, at: NaiveDateTime) -> bool {
        self.current_price = Some(price);
        self.price_history.push(at, price);
        self.is_at_or_below_target()
    }

    pub fn is_at_or_below_target(&self) -> bool {
        matches!(self.current_price, Some(price) if price <= self.target_price)
    }

    pub fn is_observed(&self) -> bool {
        self.current_price.is_some() || !self.price_history.is_empty()
    }
}
