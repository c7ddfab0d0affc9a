//! REST client for the scanner quote API.

use crate::error::{ProviderError, ProviderResult};
use crate::provider::RangeProvider;
use async_trait::async_trait;
use pricewatch_core::{CandleRange, InstrumentSpec, MarketCategory};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::debug;

/// Columns requested per ticker: high and low of the latest 5-minute candle.
const RANGE_COLUMNS: [&str; 2] = ["high|5", "low|5"];

/// HTTP client for the scanner's per-category scan endpoints.
pub struct ScannerClient {
    client: reqwest::Client,
    base_url: String,
}

impl ScannerClient {
    const BASE_URL: &'static str = "https://scanner.tradingview.com";

    pub fn new() -> Self {
        Self::with_base_url(Self::BASE_URL)
    }

    /// Client against a non-default endpoint (proxy or local stub).
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            base_url: base_url.into(),
        }
    }

    async fn scan(&self, category: MarketCategory, ticker: &str) -> ProviderResult<CandleRange> {
        let url = format!("{}/{}/scan", self.base_url, category.screener_id());
        let body = json!({
            "symbols": { "tickers": [ticker], "query": { "types": [] } },
            "columns": RANGE_COLUMNS,
        });

        let resp = self.client.post(&url).json(&body).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(ProviderError::Status(status.as_u16()));
        }

        let text = resp.text().await?;
        Self::parse_scan(ticker, &text)
    }

    /// Extract the requested ticker's band from a scan response body.
    ///
    /// An unknown ticker comes back as an empty `data` array (or null
    /// column cells), not as an HTTP error.
    fn parse_scan(ticker: &str, body: &str) -> ProviderResult<CandleRange> {
        #[derive(Deserialize)]
        struct ScanResponse {
            #[serde(default)]
            data: Option<Vec<ScanRow>>,
        }

        #[derive(Deserialize)]
        struct ScanRow {
            s: String,
            d: Vec<Option<f64>>,
        }

        let parsed: ScanResponse = serde_json::from_str(body)?;
        let row = parsed
            .data
            .unwrap_or_default()
            .into_iter()
            .find(|row| row.s == ticker)
            .ok_or_else(|| ProviderError::UnknownInstrument(ticker.to_string()))?;

        let high = row.d.first().copied().flatten();
        let low = row.d.get(1).copied().flatten();
        match (high, low) {
            (Some(high), Some(low)) => Ok(CandleRange::new(high, low)),
            _ => Err(ProviderError::UnknownInstrument(ticker.to_string())),
        }
    }
}

impl Default for ScannerClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RangeProvider for ScannerClient {
    async fn fetch_range(&self, spec: &InstrumentSpec) -> ProviderResult<CandleRange> {
        let ticker = spec.ticker();
        let range = self.scan(spec.category, &ticker).await?;
        debug!(ticker = %ticker, high = range.high, low = range.low, "scan ok");
        Ok(range)
    }
}
