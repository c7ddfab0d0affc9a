//! Reconciliation import.
//!
//! There is no database. After a restart an external pipeline re-reads the
//! confirmation messages this service previously sent (chat history, export
//! file), parses them back into records and hands them here to repopulate
//! the store.

use crate::store::AlertStore;
use pricewatch_core::{Alert, InstrumentSpec, MarketCategory, ScopeId, UserId};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// One alert reconstructed from an external record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RestoredAlert {
    pub scope: ScopeId,
    pub notify_target: i64,
    /// Creator when the record carries one; 0 means unowned, cancellable
    /// only through the natural-key path.
    #[serde(default)]
    pub owner: UserId,
    pub symbol: String,
    pub category: MarketCategory,
    pub venue: String,
    pub target_price: f64,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub watchers: Vec<UserId>,
}

impl RestoredAlert {
    fn into_alert(self) -> Alert {
        Alert::new(
            self.scope,
            InstrumentSpec::new(self.symbol, self.category, self.venue),
            self.target_price,
            self.owner,
            self.notify_target,
        )
        .with_note(self.note)
        .with_watchers(self.watchers)
    }
}

/// Import tally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ImportStats {
    pub imported: usize,
    pub skipped: usize,
}

/// Upsert restored alerts into the store.
///
/// The natural key is (symbol, target price, notify target) within the
/// record's scope. Records whose key is already open are skipped, which
/// makes a re-run of the same history a no-op and collapses duplicates
/// inside one batch. Fresh ids are assigned; ids from before the restart
/// are gone for good.
pub fn import_restored(
    store: &AlertStore,
    records: impl IntoIterator<Item = RestoredAlert>,
) -> ImportStats {
    let mut stats = ImportStats::default();

    for record in records {
        let already_open = store
            .find_matching(
                record.scope,
                &record.symbol,
                record.target_price,
                record.notify_target,
            )
            .is_some();
        if already_open {
            debug!(
                symbol = %record.symbol,
                target = record.target_price,
                scope = record.scope,
                "restore record already open, skipping"
            );
            stats.skipped += 1;
            continue;
        }

        let id = store.insert(record.into_alert());
        debug!(alert_id = id, "alert restored");
        stats.imported += 1;
    }

    if stats.imported > 0 || stats.skipped > 0 {
        info!(
            imported = stats.imported,
            skipped = stats.skipped,
            "alert import finished"
        );
    }
    stats
}
