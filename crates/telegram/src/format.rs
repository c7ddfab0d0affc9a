//! Message templates shared by the bot handlers and the history restorer.

use pricewatch_core::{Alert, MarketCategory};
use regex::Regex;
use std::sync::OnceLock;

/// Confirmation sent to the chat when an alert is opened.
///
/// The wording is load-bearing: [`parse_confirmation`] reads these lines
/// back out of exported chat history to rebuild the store after a restart,
/// so any change here must keep the parser in step.
pub fn confirmation_message(alert: &Alert) -> String {
    let mut msg = format!(
        "Alert #{} set for symbol {} at target price {} using category: {} and exchange: {}.",
        alert.id,
        alert.instrument.symbol,
        alert.target_price,
        alert.instrument.category,
        alert.instrument.venue,
    );
    if let Some(note) = &alert.note {
        msg.push_str(&format!(" Note: {note}"));
    }
    msg
}

/// Fields recovered from one confirmation message.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedConfirmation {
    pub symbol: String,
    pub target_price: f64,
    pub category: MarketCategory,
    pub venue: String,
    pub note: Option<String>,
}

fn confirmation_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(
            r"(?s)^Alert(?: #\d+)? set for symbol\s+(.+?) at target price (-?[0-9.]+) using category: (\w+) and exchange: (\w+)\.?(?: Note: (.*))?$",
        )
        .expect("confirmation pattern is valid")
    })
}

/// Parse a chat message if it is one of our confirmations.
///
/// The alert id is deliberately not recovered; the store assigns fresh ids
/// on import. Returns `None` for anything that is not a confirmation.
pub fn parse_confirmation(text: &str) -> Option<ParsedConfirmation> {
    let caps = confirmation_pattern().captures(text.trim())?;
    let symbol = caps.get(1)?.as_str().trim().to_string();
    let target_price: f64 = caps.get(2)?.as_str().parse().ok()?;
    let category: MarketCategory = caps.get(3)?.as_str().parse().ok()?;
    let venue = caps.get(4)?.as_str().to_string();
    let note = caps
        .get(5)
        .map(|m| m.as_str().trim().to_string())
        .filter(|n| !n.is_empty());
    Some(ParsedConfirmation {
        symbol,
        target_price,
        category,
        venue,
        note,
    })
}

/// Render the `/list` reply for one chat.
pub fn list_message(alerts: &[Alert]) -> String {
    if alerts.is_empty() {
        return "No open alerts in this chat. Use /alert to create one.".to_string();
    }
    let mut msg = format!("📋 Open alerts ({}):\n", alerts.len());
    for alert in alerts {
        msg.push_str(&format!(
            "#{} {} @ {} ({} on {})",
            alert.id,
            alert.instrument.symbol,
            alert.target_price,
            alert.instrument.category,
            alert.instrument.venue,
        ));
        if let Some(note) = &alert.note {
            msg.push_str(&format!(" | {note}"));
        }
        msg.push('\n');
    }
    msg
}
