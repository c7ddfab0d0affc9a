//! Quote provider abstraction.

use crate::error::ProviderResult;
use async_trait::async_trait;
use pricewatch_core::{CandleRange, InstrumentSpec};

/// Source of recent high/low bands for instruments.
///
/// The resolver and the polling scheduler only talk to this trait; the HTTP
/// scanner client is one implementation, tests plug in programmable ones.
#[async_trait]
pub trait RangeProvider: Send + Sync {
    /// Fetch the most recent candle band for an instrument.
    ///
    /// An `Err` means the band could not be obtained this time; callers
    /// treat `UnknownInstrument` as "this triple does not exist" and
    /// everything else as retryable.
    async fn fetch_range(&self, spec: &InstrumentSpec) -> ProviderResult<CandleRange>;
}
