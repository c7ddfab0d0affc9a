//! Instrument resolution: exact verification and grid fallback search.

use futures_util::stream::{self, StreamExt};
use pricewatch_core::{CandleRange, InstrumentSpec, MarketCategory, VENUE_CATALOG};
use pricewatch_feeds::{ProviderError, ProviderResult, RangeProvider};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Symbol variants the fallback search probes, in preference order:
/// uppercase, uppercase with a USD suffix (unless USD already appears),
/// lowercase. Duplicates collapse, first occurrence wins.
pub fn candidate_symbols(raw: &str) -> Vec<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }

    let upper = trimmed.to_uppercase();
    let mut candidates = vec![upper.clone()];
    if !upper.contains("USD") {
        candidates.push(format!("{upper}USD"));
    }
    let lower = trimmed.to_lowercase();
    if !candidates.contains(&lower) {
        candidates.push(lower);
    }
    candidates
}

/// Tuning for the fallback search.
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// Venues probed per category, in menu order.
    pub venues: Vec<String>,
    /// Categories in search order.
    pub categories: Vec<MarketCategory>,
    /// Budget for a single provider call.
    pub probe_timeout: Duration,
    /// Grid cells probed concurrently.
    pub fan_out: usize,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            venues: VENUE_CATALOG.iter().map(|v| v.to_string()).collect(),
            categories: MarketCategory::fallback_order().to_vec(),
            probe_timeout: Duration::from_secs(8),
            fan_out: 16,
        }
    }
}

/// Verifies user-supplied triples against the provider and, when the exact
/// triple is not listed, searches the category x venue grid for variants of
/// the symbol.
pub struct InstrumentResolver {
    provider: Arc<dyn RangeProvider>,
    config: ResolverConfig,
}

impl InstrumentResolver {
    pub fn new(provider: Arc<dyn RangeProvider>) -> Self {
        Self::with_config(provider, ResolverConfig::default())
    }

    pub fn with_config(provider: Arc<dyn RangeProvider>, config: ResolverConfig) -> Self {
        Self { provider, config }
    }

    /// Confirm the provider recognizes the exact triple. The fetched band is
    /// discarded; only recognition matters here.
    pub async fn verify(&self, spec: &InstrumentSpec) -> ProviderResult<()> {
        self.probe(spec).await.map(|_| ())
    }

    async fn probe(&self, spec: &InstrumentSpec) -> ProviderResult<CandleRange> {
        let fetch = self.provider.fetch_range(spec);
        match tokio::time::timeout(self.config.probe_timeout, fetch).await {
            Ok(result) => result,
            Err(_) => Err(ProviderError::Timeout(format!(
                "no response for {} within {:?}",
                spec.ticker(),
                self.config.probe_timeout
            ))),
        }
    }

    /// Exhaustive search for a raw symbol across the whole grid.
    ///
    /// Walks category (search order) x venue (catalog order). Within one
    /// cell the symbol variants are probed in order and only the first hit
    /// is kept, so a cell contributes at most one spec. Provider failures
    /// of any kind count as a miss for that probe and never abort the
    /// search. Cells run concurrently under a bounded window; the result
    /// preserves grid order.
    pub async fn resolve_fallback(&self, raw_symbol: &str) -> Vec<InstrumentSpec> {
        let candidates = candidate_symbols(raw_symbol);
        if candidates.is_empty() {
            return Vec::new();
        }

        let mut cells = Vec::with_capacity(self.config.categories.len() * self.config.venues.len());
        for &category in &self.config.categories {
            for venue in &self.config.venues {
                cells.push((category, venue.clone()));
            }
        }

        let probes = cells.into_iter().map(|(category, venue)| {
            let candidates = candidates.clone();
            async move {
                for symbol in &candidates {
                    let spec = InstrumentSpec::new(symbol.as_str(), category, venue.as_str());
                    if self.probe(&spec).await.is_ok() {
                        return Some(spec);
                    }
                }
                None
            }
        });

        let hits: Vec<Option<InstrumentSpec>> = stream::iter(probes)
            .buffered(self.config.fan_out.max(1))
            .collect()
            .await;

        let found: Vec<InstrumentSpec> = hits.into_iter().flatten().collect();
        debug!(symbol = raw_symbol, hits = found.len(), "fallback search finished");
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Provider that recognizes a fixed set of (screener, ticker) pairs.
    struct GridProvider {
        known: HashSet<(&'static str, String)>,
        calls: AtomicUsize,
    }

    impl GridProvider {
        fn new(known: &[(&'static str, &str)]) -> Self {
            Self {
                known: known
                    .iter()
                    .map(|(screener, ticker)| (*screener, ticker.to_string()))
                    .collect(),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl RangeProvider for GridProvider {
        async fn fetch_range(&self, spec: &InstrumentSpec) -> ProviderResult<CandleRange> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let key = (spec.category.screener_id(), spec.ticker());
            if self.known.contains(&key) {
                Ok(CandleRange::new(1.0, 0.5))
            } else {
                Err(ProviderError::UnknownInstrument(spec.ticker()))
            }
        }
    }

    /// Provider that never answers within any reasonable deadline.
    struct StalledProvider;

    #[async_trait]
    impl RangeProvider for StalledProvider {
        async fn fetch_range(&self, _spec: &InstrumentSpec) -> ProviderResult<CandleRange> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Err(ProviderError::Http("unreachable".into()))
        }
    }

    fn small_config() -> ResolverConfig {
        ResolverConfig {
            venues: vec!["OANDA".into(), "BINANCE".into()],
            categories: vec![MarketCategory::Crypto, MarketCategory::Forex],
            probe_timeout: Duration::from_secs(5),
            fan_out: 4,
        }
    }

    #[test]
    fn test_candidate_symbols_variants() {
        assert_eq!(candidate_symbols("btc"), vec!["BTC", "BTCUSD", "btc"]);
        // USD already present, no suffix variant
        assert_eq!(candidate_symbols("BTCUSDT"), vec!["BTCUSDT", "btcusdt"]);
        assert_eq!(candidate_symbols("  eth  "), vec!["ETH", "ETHUSD", "eth"]);
        assert_eq!(candidate_symbols(""), Vec::<String>::new());
        assert_eq!(candidate_symbols("   "), Vec::<String>::new());
    }

    #[test]
    fn test_candidate_symbols_dedup_caseless_input() {
        // All-digit input: upper == lower, kept once
        assert_eq!(candidate_symbols("123"), vec!["123", "123USD"]);
    }

    #[tokio::test]
    async fn test_verify_recognized_triple() {
        let provider = Arc::new(GridProvider::new(&[("crypto", "BINANCE:BTCUSDT")]));
        let resolver = InstrumentResolver::with_config(provider, small_config());
        let spec = InstrumentSpec::new("BTCUSDT", MarketCategory::Crypto, "BINANCE");
        assert!(resolver.verify(&spec).await.is_ok());
    }

    #[tokio::test]
    async fn test_verify_unknown_triple() {
        let provider = Arc::new(GridProvider::new(&[]));
        let resolver = InstrumentResolver::with_config(provider, small_config());
        let spec = InstrumentSpec::new("NOPE", MarketCategory::Crypto, "BINANCE");
        assert!(matches!(
            resolver.verify(&spec).await,
            Err(ProviderError::UnknownInstrument(_))
        ));
    }

    #[tokio::test]
    async fn test_fallback_returns_hits_in_grid_order() {
        let provider = Arc::new(GridProvider::new(&[
            ("crypto", "BINANCE:EURUSD"),
            ("forex", "OANDA:EURUSD"),
        ]));
        let resolver = InstrumentResolver::with_config(provider, small_config());

        let found = resolver.resolve_fallback("eurusd").await;
        assert_eq!(
            found,
            vec![
                InstrumentSpec::new("EURUSD", MarketCategory::Crypto, "BINANCE"),
                InstrumentSpec::new("EURUSD", MarketCategory::Forex, "OANDA"),
            ]
        );
    }

    #[tokio::test]
    async fn test_fallback_keeps_one_hit_per_cell() {
        // Both variants list on the same venue; only the first probed wins.
        let provider = Arc::new(GridProvider::new(&[
            ("crypto", "BINANCE:BTC"),
            ("crypto", "BINANCE:BTCUSD"),
        ]));
        let resolver = InstrumentResolver::with_config(provider, small_config());

        let found = resolver.resolve_fallback("btc").await;
        assert_eq!(
            found,
            vec![InstrumentSpec::new("BTC", MarketCategory::Crypto, "BINANCE")]
        );
    }

    #[tokio::test]
    async fn test_fallback_exhausts_grid_on_no_match() {
        let provider = Arc::new(GridProvider::new(&[]));
        let resolver = InstrumentResolver::with_config(provider.clone(), small_config());

        let found = resolver.resolve_fallback("btc").await;
        assert!(found.is_empty());
        // 2 categories x 2 venues x 3 candidates, nothing short-circuits
        assert_eq!(provider.calls.load(Ordering::SeqCst), 12);
    }

    #[tokio::test]
    async fn test_fallback_survives_probe_timeouts() {
        let mut config = small_config();
        config.probe_timeout = Duration::from_millis(20);
        let resolver = InstrumentResolver::with_config(Arc::new(StalledProvider), config);

        let found = resolver.resolve_fallback("btc").await;
        assert!(found.is_empty());
    }

    #[tokio::test]
    async fn test_verify_times_out() {
        let mut config = small_config();
        config.probe_timeout = Duration::from_millis(20);
        let resolver = InstrumentResolver::with_config(Arc::new(StalledProvider), config);

        let spec = InstrumentSpec::new("BTCUSDT", MarketCategory::Crypto, "BINANCE");
        assert!(matches!(
            resolver.verify(&spec).await,
            Err(ProviderError::Timeout(_))
        ));
    }
}
