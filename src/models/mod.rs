use chrono::{Local, NaiveDateTime, SubsecRound};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub mod price_history;
pub mod product;

pub use price_history::*;
pub use product::*;

/// Character used to group thousands in a page's price text.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum ThousandsSeparator {
    /// `1,234` grouping; `,` in page text is read as a decimal point.
    #[default]
    #[serde(rename = ",")]
    Comma,
    /// `1.234,56` grouping.
    #[serde(rename = ".")]
    Dot,
}

impl ThousandsSeparator {
    pub fn as_char(self) -> char {
        match self {
            ThousandsSeparator::Comma => ',',
            ThousandsSeparator::Dot => '.',
        }
    }
}

impl fmt::Display for ThousandsSeparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

impl FromStr for ThousandsSeparator {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "," => Ok(ThousandsSeparator::Comma),
            "." => Ok(ThousandsSeparator::Dot),
            other => Err(format!("thousands separator must be ',' or '.', got '{}'", other)),
        }
    }
}

/// Current local time truncated to whole seconds, the precision the store keeps.
pub fn now_timestamp() -> NaiveDateTime {
    Local::now().naive_local().trunc_subsecs(0)
}

/// `YYYY-MM-DD HH:MM:SS` (de)serialization for stored timestamps.
pub mod timestamp_format {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub const FORMAT: &str = "%Y-%m-%d %H:%M:%S";

    pub fn serialize<S>(value: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(&raw, FORMAT).map_err(serde::de::Error::custom)
    }
}
