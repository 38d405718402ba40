use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::models::timestamp_format;

/// Most observations kept per product.
pub const HISTORY_CAPACITY: usize = 30;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PriceEntry {
    #[serde(rename = "date", with = "timestamp_format")]
    pub timestamp: NaiveDateTime,
    pub price: f64,
}

/// Oldest-first observations, never longer than [`HISTORY_CAPACITY`].
///
/// Pushing onto a full history evicts the oldest entry. A persisted list that
/// is longer than the capacity keeps only its newest entries when loaded.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(from = "Vec<PriceEntry>", into = "Vec<PriceEntry>")]
pub struct PriceHistory {
    entries: VecDeque<PriceEntry>,
}

impl PriceHistory {
    pub fn new() -> Self {
        Self {
            entries: VecDeque::with_capacity(HISTORY_CAPACITY),
        }
    }

    pub fn push(&mut self, timestamp: NaiveDateTime, price: f64) {
        if self.entries.len() == HISTORY_CAPACITY {
            self.entries.pop_front();
        }
        self.entries.push_back(PriceEntry { timestamp, price });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn latest(&self) -> Option<&PriceEntry> {
        self.entries.back()
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &PriceEntry> + ExactSizeIterator {
        self.entries.iter()
    }

    /// The `n` most recent entries, oldest first.
    pub fn recent(&self, n: usize) -> impl Iterator<Item = &PriceEntry> {
        self.entries.iter().skip(self.entries.len().saturating_sub(n))
    }
}

impl From<Vec<PriceEntry>> for PriceHistory {
    fn from(mut entries: Vec<PriceEntry>) -> Self {
        if entries.len() > HISTORY_CAPACITY {
            entries.drain(..entries.len() - HISTORY_CAPACITY);
        }
        Self {
            entries: entries.into(),
        }
    }
}

impl From<PriceHistory> for Vec<PriceEntry> {
    fn from(history: PriceHistory) -> Self {
        history.entries.into()
    }
}
