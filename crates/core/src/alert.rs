//! Alert data model.

use crate::{CandleRange, InstrumentSpec};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Process-unique alert identifier, assigned by the store.
pub type AlertId = u64;

/// Chat or guild partition an alert belongs to.
pub type ScopeId = i64;

/// Transport-level user identifier.
pub type UserId = u64;

/// Lifecycle state. `Fired` is terminal; a fired alert is removed from the
/// store, there is no pending-notification state in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlertStatus {
    Open,
    Fired,
}

/// A one-shot price alert.
///
/// Fires when the instrument's candle band covers `target_price`, then is
/// removed. Ids are never reused within a process lifetime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub id: AlertId,
    pub scope: ScopeId,
    pub instrument: InstrumentSpec,
    pub target_price: f64,
    /// Creator; authorizes cancel-by-id. 0 when reconstructed from history
    /// without a known creator.
    pub owner: UserId,
    /// Chat the firing message is delivered to.
    pub notify_target: i64,
    pub note: Option<String>,
    /// Users mentioned when the alert fires, accreted from acknowledgement
    /// events on the confirmation message.
    pub watchers: BTreeSet<UserId>,
    pub status: AlertStatus,
}

impl Alert {
    /// New open alert with no id yet; the store assigns one on insert.
    pub fn new(
        scope: ScopeId,
        instrument: InstrumentSpec,
        target_price: f64,
        owner: UserId,
        notify_target: i64,
    ) -> Self {
        Self {
            id: 0,
            scope,
            instrument,
            target_price,
            owner,
            notify_target,
            note: None,
            watchers: BTreeSet::new(),
            status: AlertStatus::Open,
        }
    }

    pub fn with_note(mut self, note: Option<String>) -> Self {
        self.note = note;
        self
    }

    pub fn with_watchers(mut self, watchers: impl IntoIterator<Item = UserId>) -> Self {
        self.watchers = watchers.into_iter().collect();
        self
    }

    #[inline]
    pub fn is_open(&self) -> bool {
        self.status == AlertStatus::Open
    }

    /// Match rule: the target lies inside the candle band, bounds inclusive.
    #[inline]
    pub fn matches(&self, range: &CandleRange) -> bool {
        range.contains(self.target_price)
    }
}
