//! Market categories and venue catalog.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Market segment recognized by the quote provider.
///
/// Each category maps to its own screener endpoint on the provider side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum MarketCategory {
    Forex = 1,
    Crypto = 2,
    Cfd = 3,
    Indices = 4,
    Stocks = 5,
}

impl MarketCategory {
    /// Menu position (1-based), as shown in chat prompts.
    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            1 => Some(MarketCategory::Forex),
            2 => Some(MarketCategory::Crypto),
            3 => Some(MarketCategory::Cfd),
            4 => Some(MarketCategory::Indices),
            5 => Some(MarketCategory::Stocks),
            _ => None,
        }
    }

    #[inline]
    pub fn id(self) -> u8 {
        self as u8
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MarketCategory::Forex => "forex",
            MarketCategory::Crypto => "crypto",
            MarketCategory::Cfd => "cfd",
            MarketCategory::Indices => "indices",
            MarketCategory::Stocks => "stocks",
        }
    }

    /// Path segment of the provider's scan endpoint. Stock symbols are
    /// served by the "america" screener rather than a "stocks" one.
    pub fn screener_id(self) -> &'static str {
        match self {
            MarketCategory::Stocks => "america",
            other => other.as_str(),
        }
    }

    /// All categories in menu order.
    pub fn all() -> &'static [MarketCategory] {
        &[
            MarketCategory::Forex,
            MarketCategory::Crypto,
            MarketCategory::Cfd,
            MarketCategory::Indices,
            MarketCategory::Stocks,
        ]
    }

    /// Categories in the order the fallback search walks them. Crypto first,
    /// since bare symbols are most often coin tickers.
    pub fn fallback_order() -> &'static [MarketCategory] {
        &[
            MarketCategory::Crypto,
            MarketCategory::Forex,
            MarketCategory::Cfd,
            MarketCategory::Indices,
            MarketCategory::Stocks,
        ]
    }
}

impl fmt::Display for MarketCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error for unrecognized category names.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown market category: {0}")]
pub struct ParseCategoryError(pub String);

impl FromStr for MarketCategory {
    type Err = ParseCategoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "forex" => Ok(MarketCategory::Forex),
            "crypto" => Ok(MarketCategory::Crypto),
            "cfd" => Ok(MarketCategory::Cfd),
            "indices" => Ok(MarketCategory::Indices),
            // Accept the screener alias so restored records parse too.
            "stocks" | "america" => Ok(MarketCategory::Stocks),
            other => Err(ParseCategoryError(other.to_string())),
        }
    }
}

/// Venues offered in the venue menu and walked by the fallback search.
///
/// The list is a default, not a closed set: resolved or restored alerts may
/// reference venues outside it.
pub const VENUE_CATALOG: &[&str] = &[
    "OANDA",
    "BINANCE",
    "FX",
    "PEPPERSTONE",
    "FOREXCOM",
    "TVC",
    "CAPITALCOM",
    "BITFINEX",
    "KRAKEN",
    "COINBASE",
    "BITSTAMP",
    "CRYPTOCAP",
    "MEXC",
];

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_category_from_id() {
        assert_eq!(MarketCategory::from_id(1), Some(MarketCategory::Forex));
        assert_eq!(MarketCategory::from_id(2), Some(MarketCategory::Crypto));
        assert_eq!(MarketCategory::from_id(5), Some(MarketCategory::Stocks));
        assert_eq!(MarketCategory::from_id(0), None);
        assert_eq!(MarketCategory::from_id(6), None);
    }

    #[test]
    fn test_category_roundtrip_ids() {
        for &cat in MarketCategory::all() {
            assert_eq!(MarketCategory::from_id(cat.id()), Some(cat));
        }
    }

    #[test]
    fn test_screener_id_maps_stocks_to_america() {
        assert_eq!(MarketCategory::Stocks.screener_id(), "america");
        assert_eq!(MarketCategory::Crypto.screener_id(), "crypto");
        assert_eq!(MarketCategory::Forex.screener_id(), "forex");
    }

    #[test]
    fn test_category_from_str() {
        assert_eq!("crypto".parse::<MarketCategory>(), Ok(MarketCategory::Crypto));
        assert_eq!("  Forex ".parse::<MarketCategory>(), Ok(MarketCategory::Forex));
        assert_eq!("america".parse::<MarketCategory>(), Ok(MarketCategory::Stocks));
        assert_eq!("stocks".parse::<MarketCategory>(), Ok(MarketCategory::Stocks));
        assert!("bonds".parse::<MarketCategory>().is_err());
    }

    #[test]
    fn test_fallback_order_starts_with_crypto() {
        let order = MarketCategory::fallback_order();
        assert_eq!(order[0], MarketCategory::Crypto);
        assert_eq!(order.len(), MarketCategory::all().len());
    }

    #[test]
    fn test_venue_catalog() {
        assert_eq!(VENUE_CATALOG.len(), 13);
        assert!(VENUE_CATALOG.contains(&"OANDA"));
        assert!(VENUE_CATALOG.contains(&"BINANCE"));
        assert!(VENUE_CATALOG.contains(&"MEXC"));
    }
}
