//! Alert lifecycle: create, cancel, notify.

use crate::notify::{fired_message, Notifier};
use crate::resolver::InstrumentResolver;
use crate::store::AlertStore;
use pricewatch_core::{Alert, AlertId, InstrumentSpec, MarketCategory, ScopeId, UserId};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors surfaced to the chat layer for lifecycle requests.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LifecycleError {
    #[error("no listing found for \"{0}\" on any category/venue combination")]
    Unresolvable(String),

    #[error("alert {0} not found")]
    NotFound(AlertId),

    #[error("alert {0} belongs to another user")]
    Forbidden(AlertId),
}

/// Validated input bundle for opening an alert.
#[derive(Debug, Clone)]
pub struct AlertRequest {
    pub scope: ScopeId,
    pub owner: UserId,
    pub notify_target: i64,
    pub symbol: String,
    pub category: MarketCategory,
    pub venue: String,
    pub target_price: f64,
    pub note: Option<String>,
}

/// How a user-supplied triple resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// The exact triple (symbol uppercased) is listed.
    Verified(InstrumentSpec),
    /// Not listed as typed, but the grid search found variants.
    Candidates(Vec<InstrumentSpec>),
}

/// Outcome of a single-shot create.
#[derive(Debug, Clone, PartialEq)]
pub enum CreateOutcome {
    Created(Alert),
    /// Caller picks one candidate and re-enters through `create_resolved`.
    NeedsChoice(Vec<InstrumentSpec>),
}

/// Entry point for everything that opens, closes or announces alerts.
/// Chat transports and the scheduler both go through here.
pub struct AlertLifecycle {
    store: Arc<AlertStore>,
    resolver: InstrumentResolver,
    notifier: Arc<dyn Notifier>,
}

impl AlertLifecycle {
    pub fn new(
        store: Arc<AlertStore>,
        resolver: InstrumentResolver,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            store,
            resolver,
            notifier,
        }
    }

    pub fn store(&self) -> &AlertStore {
        &self.store
    }

    /// Resolve what the user typed. The preferred triple gets one verify
    /// attempt with the symbol uppercased; on failure the fallback grid
    /// search decides between candidates and unresolvable.
    pub async fn resolve(
        &self,
        symbol: &str,
        category: MarketCategory,
        venue: &str,
    ) -> Result<Resolution, LifecycleError> {
        let preferred = InstrumentSpec::new(symbol.trim().to_uppercase(), category, venue);
        match self.resolver.verify(&preferred).await {
            Ok(()) => Ok(Resolution::Verified(preferred)),
            Err(err) => {
                debug!(ticker = %preferred.ticker(), error = %err, "verify failed, searching grid");
                let candidates = self.resolver.resolve_fallback(symbol).await;
                if candidates.is_empty() {
                    Err(LifecycleError::Unresolvable(symbol.trim().to_string()))
                } else {
                    Ok(Resolution::Candidates(candidates))
                }
            }
        }
    }

    /// Single-shot create: resolve, then open immediately when verified.
    pub async fn create(&self, req: AlertRequest) -> Result<CreateOutcome, LifecycleError> {
        match self.resolve(&req.symbol, req.category, &req.venue).await? {
            Resolution::Verified(spec) => {
                let alert = self.create_resolved(
                    req.scope,
                    req.owner,
                    req.notify_target,
                    spec,
                    req.target_price,
                    req.note,
                );
                Ok(CreateOutcome::Created(alert))
            }
            Resolution::Candidates(candidates) => Ok(CreateOutcome::NeedsChoice(candidates)),
        }
    }

    /// Open an alert for an already resolved instrument (candidate pick
    /// re-entry; no second verify).
    pub fn create_resolved(
        &self,
        scope: ScopeId,
        owner: UserId,
        notify_target: i64,
        spec: InstrumentSpec,
        target_price: f64,
        note: Option<String>,
    ) -> Alert {
        let mut alert =
            Alert::new(scope, spec, target_price, owner, notify_target).with_note(note);
        let id = self.store.insert(alert.clone());
        alert.id = id;
        info!(
            alert_id = id,
            scope,
            ticker = %alert.instrument.ticker(),
            target = alert.target_price,
            "alert created"
        );
        alert
    }

    /// Cancel by id. Only the creator may do this; everyone else gets
    /// `Forbidden` and the alert stays put.
    pub fn cancel(
        &self,
        scope: ScopeId,
        id: AlertId,
        requester: UserId,
    ) -> Result<Alert, LifecycleError> {
        let alert = self.store.get(scope, id).ok_or(LifecycleError::NotFound(id))?;
        if alert.owner != requester {
            return Err(LifecycleError::Forbidden(id));
        }
        match self.store.remove(scope, id) {
            Some(removed) => {
                info!(alert_id = id, scope, "alert cancelled");
                Ok(removed)
            }
            // The scheduler fired it between our get and remove.
            None => Err(LifecycleError::NotFound(id)),
        }
    }

    /// Natural-key cancel: first open alert matching symbol, target price
    /// and notify target. No ownership check; the scope's members share it.
    pub fn cancel_matching(
        &self,
        scope: ScopeId,
        notify_target: i64,
        symbol: &str,
        target_price: f64,
    ) -> Option<Alert> {
        let id = self
            .store
            .find_matching(scope, symbol, target_price, notify_target)?;
        let removed = self.store.remove(scope, id);
        if removed.is_some() {
            info!(alert_id = id, scope, symbol, "alert cancelled by spec");
        }
        removed
    }

    /// Format and emit the firing message. Failures are logged and
    /// swallowed; the removal that preceded this call stands either way.
    pub async fn notify_fired(&self, alert: &Alert) {
        let text = fired_message(alert);
        let watchers: Vec<UserId> = alert.watchers.iter().copied().collect();
        match self
            .notifier
            .deliver(alert.notify_target, &text, &watchers)
            .await
        {
            Ok(()) => info!(
                alert_id = alert.id,
                chat_id = alert.notify_target,
                symbol = %alert.instrument.symbol,
                "alert notification sent"
            ),
            Err(err) => warn!(
                alert_id = alert.id,
                chat_id = alert.notify_target,
                error = %err,
                "alert notification failed"
            ),
        }
    }
}
