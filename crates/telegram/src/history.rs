//! Rebuilding alerts from exported chat history.
//!
//! The bot keeps no database. Its confirmation messages double as the
//! durable record: an export of the chat (or a bounced message dump) is
//! scanned for them and turned into [`RestoredAlert`] records for the
//! engine's reconciliation import.

use crate::format::parse_confirmation;
use pricewatch_engine::RestoredAlert;
use serde::Deserialize;
use tracing::debug;

/// One message from an exported chat dump, reduced to the fields the
/// restore pipeline needs. Reactions become watchers.
#[derive(Debug, Clone, Deserialize)]
pub struct HistoryMessage {
    pub chat_id: i64,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub reactors: Vec<u64>,
}

/// Scan exported messages for confirmations and convert the hits.
///
/// Everything else in the dump (chatter, firing announcements, menus) is
/// skipped. The creator cannot be recovered because the bot itself sent
/// the confirmation, so restored alerts come back unowned.
pub fn restored_from_history(messages: &[HistoryMessage]) -> Vec<RestoredAlert> {
    let mut records = Vec::new();
    for message in messages {
        let Some(parsed) = parse_confirmation(&message.text) else {
            continue;
        };
        records.push(RestoredAlert {
            scope: message.chat_id,
            notify_target: message.chat_id,
            owner: 0,
            symbol: parsed.symbol,
            category: parsed.category,
            venue: parsed.venue,
            target_price: parsed.target_price,
            note: parsed.note,
            watchers: message.reactors.clone(),
        });
    }
    debug!(
        scanned = messages.len(),
        restored = records.len(),
        "history scan finished"
    );
    records
}
