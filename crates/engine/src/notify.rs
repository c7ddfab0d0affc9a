//! Outbound notification seam.

use async_trait::async_trait;
use pricewatch_core::{Alert, UserId};
use thiserror::Error;

/// Delivery failure. Logged by the controller and swallowed; a fired alert
/// stays fired whether or not the message made it out.
#[derive(Debug, Error)]
#[error("notification dispatch failed: {0}")]
pub struct NotifyError(pub String);

/// Transport seam for delivering firing messages.
///
/// Implementations render watcher mentions however their platform does;
/// the text itself is transport-neutral.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn deliver(&self, target: i64, text: &str, watchers: &[UserId]) -> Result<(), NotifyError>;
}

/// Text of the firing message. Names the symbol and the exact target price
/// so the reader can tell which alert fired without extra context.
pub fn fired_message(alert: &Alert) -> String {
    let mut msg = format!(
        "🔔 Alert #{} triggered for symbol {} at target price {}.",
        alert.id, alert.instrument.symbol, alert.target_price
    );

    if let Some(note) = &alert.note {
        msg.push_str(&format!(" Note: {note}"));
    }

    let now = chrono::Utc::now();
    msg.push_str(&format!("\n⏰ {}", now.format("%Y-%m-%d %H:%M:%S UTC")));

    msg
}

#[cfg(test)]
mod tests {
    use super::*;
    use pricewatch_core::{InstrumentSpec, MarketCategory};

    #[test]
    fn test_fired_message_names_symbol_and_price() {
        let mut alert = Alert::new(
            -1,
            InstrumentSpec::new("BTCUSDT", MarketCategory::Crypto, "BINANCE"),
            50000.0,
            1,
            -1,
        );
        alert.id = 12;

        let msg = fired_message(&alert);
        assert!(msg.contains("Alert #12"));
        assert!(msg.contains("BTCUSDT"));
        assert!(msg.contains("50000"));
        assert!(msg.contains("UTC"));
        assert!(!msg.contains("Note:"));
    }

    #[test]
    fn test_fired_message_includes_note() {
        let alert = Alert::new(
            -1,
            InstrumentSpec::new("XAUUSD", MarketCategory::Forex, "OANDA"),
            2400.5,
            1,
            -1,
        )
        .with_note(Some("weekly level".to_string()));

        let msg = fired_message(&alert);
        assert!(msg.contains("Note: weekly level"));
        assert!(msg.contains("2400.5"));
    }
}
