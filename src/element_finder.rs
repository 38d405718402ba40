use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};

use crate::models::ThousandsSeparator;
use crate::price::parse_price;
use crate::utils::error::ExtractionError;

/// Selectors tried, in order, when a product has no explicit locator.
pub const DEFAULT_PRICE_SELECTORS: [&str; 14] = [
    ".price",
    ".product-price",
    ".offer-price",
    ".current-price",
    "[itemprop=\"price\"]",
    ".price-value",
    ".price-current",
    ".money",
    // Amazon
    ".a-price",
    ".a-price-whole",
    ".a-offscreen",
    "#priceblock_ourprice",
    "#priceblock_dealprice",
    // Mercado Libre
    ".andes-money-amount__fraction",
];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PriceMatch {
    /// Selector that located the element.
    pub selector: String,
    /// Trimmed element text as found on the page.
    pub text: String,
    pub price: f64,
}

/// Finds the price element in a page and reads its value.
///
/// An explicit locator is queried on its own. Without one, the candidate
/// selectors are tried in order and the first selector that matches any
/// element wins, even if a later candidate would have read better.
#[derive(Debug, Clone)]
pub struct ElementFinder {
    candidates: Vec<String>,
}

impl Default for ElementFinder {
    fn default() -> Self {
        Self::new()
    }
}

impl ElementFinder {
    pub fn new() -> Self {
        Self::with_candidates(DEFAULT_PRICE_SELECTORS.iter().map(|s| s.to_string()).collect())
    }

    pub fn with_candidates(candidates: Vec<String>) -> Self {
        Self { candidates }
    }

    pub fn candidates(&self) -> &[String] {
        &self.candidates
    }

    pub fn extract(
        &self,
        html: &str,
        locator: Option<&str>,
        separator: ThousandsSeparator,
    ) -> Result<PriceMatch, ExtractionError> {
        let document = Html::parse_document(html);
        let (selector, element) = self.locate(&document, locator)?;

        let text = element_text(&element);
        let price = parse_price(&text, separator)?;
        tracing::debug!("Selector '{}' matched price text {:?} -> {}", selector, text, price);

        Ok(PriceMatch {
            selector,
            text,
            price,
        })
    }

    /// Resolves the element holding the price, returning the selector used.
    pub fn locate<'a>(
        &self,
        document: &'a Html,
        locator: Option<&str>,
    ) -> Result<(String, ElementRef<'a>), ExtractionError> {
        if let Some(locator) = locator {
            let selector = Selector::parse(locator).map_err(|_| ExtractionError::InvalidLocator {
                selector: locator.to_string(),
            })?;
            return document
                .select(&selector)
                .next()
                .map(|element| (locator.to_string(), element))
                .ok_or(ExtractionError::NoPriceElement);
        }

        for candidate in &self.candidates {
            let selector = match Selector::parse(candidate) {
                Ok(selector) => selector,
                Err(_) => {
                    tracing::warn!("Skipping unparsable candidate selector '{}'", candidate);
                    continue;
                }
            };

            if let Some(element) = document.select(&selector).next() {
                return Ok((candidate.clone(), element));
            }
        }

        Err(ExtractionError::NoPriceElement)
    }
}

fn element_text(element: &ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}
