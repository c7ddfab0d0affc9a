//! In-memory alert registry.

use dashmap::DashMap;
use pricewatch_core::{Alert, AlertId, ScopeId};
use std::sync::atomic::{AtomicU64, Ordering};

/// Registry of open alerts, partitioned by owning scope.
///
/// Every operation locks at most one scope shard. Reads hand out snapshots
/// rather than live views, so the polling loop and command handlers never
/// observe a half-applied mutation.
pub struct AlertStore {
    scopes: DashMap<ScopeId, Vec<Alert>>,
    next_id: AtomicU64,
}

impl AlertStore {
    pub fn new() -> Self {
        Self {
            scopes: DashMap::new(),
            next_id: AtomicU64::new(1),
        }
    }

    /// Assign the next id and make the alert visible to the scheduler.
    pub fn insert(&self, mut alert: Alert) -> AlertId {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        alert.id = id;
        self.scopes.entry(alert.scope).or_default().push(alert);
        id
    }

    pub fn get(&self, scope: ScopeId, id: AlertId) -> Option<Alert> {
        self.scopes
            .get(&scope)?
            .iter()
            .find(|a| a.id == id)
            .cloned()
    }

    /// Point-in-time snapshot of a scope's open alerts.
    pub fn open_alerts(&self, scope: ScopeId) -> Vec<Alert> {
        self.scopes
            .get(&scope)
            .map(|entry| entry.value().clone())
            .unwrap_or_default()
    }

    /// Remove by id, returning the removed alert. Removing an absent id is
    /// not an error; that is how the loser of a fire/cancel race finds out.
    pub fn remove(&self, scope: ScopeId, id: AlertId) -> Option<Alert> {
        let mut entry = self.scopes.get_mut(&scope)?;
        let pos = entry.iter().position(|a| a.id == id)?;
        let removed = entry.remove(pos);
        let now_empty = entry.is_empty();
        drop(entry);
        if now_empty {
            self.scopes.remove_if(&scope, |_, alerts| alerts.is_empty());
        }
        Some(removed)
    }

    /// Scopes that currently hold at least one open alert.
    pub fn scopes(&self) -> Vec<ScopeId> {
        self.scopes
            .iter()
            .filter(|entry| !entry.value().is_empty())
            .map(|entry| *entry.key())
            .collect()
    }

    /// First open alert matching symbol (case-insensitive), target price and
    /// notify target. Backs the idempotent import and cancel-by-spec.
    pub fn find_matching(
        &self,
        scope: ScopeId,
        symbol: &str,
        target_price: f64,
        notify_target: i64,
    ) -> Option<AlertId> {
        let entry = self.scopes.get(&scope)?;
        entry
            .iter()
            .find(|a| {
                a.instrument.symbol.eq_ignore_ascii_case(symbol)
                    && a.target_price == target_price
                    && a.notify_target == notify_target
            })
            .map(|a| a.id)
    }

    pub fn total_open(&self) -> usize {
        self.scopes.iter().map(|entry| entry.value().len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total_open() == 0
    }
}

impl Default for AlertStore {
    fn default() -> Self {
        Self::new()
    }
}
