//! Instrument identification.

use crate::MarketCategory;
use compact_str::CompactString;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Fully qualified instrument accepted by the quote provider.
///
/// Symbol and venue are stored verbatim. Fallback resolution deliberately
/// probes a lowercase symbol variant, so normalizing case here would change
/// which listing the provider sees.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InstrumentSpec {
    pub symbol: CompactString,
    pub category: MarketCategory,
    pub venue: CompactString,
}

impl InstrumentSpec {
    pub fn new(
        symbol: impl Into<CompactString>,
        category: MarketCategory,
        venue: impl Into<CompactString>,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            category,
            venue: venue.into(),
        }
    }

    /// Ticker in the provider's `VENUE:SYMBOL` form.
    pub fn ticker(&self) -> String {
        format!("{}:{}", self.venue, self.symbol)
    }
}

impl fmt::Display for InstrumentSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{} ({})", self.venue, self.symbol, self.category)
    }
}
