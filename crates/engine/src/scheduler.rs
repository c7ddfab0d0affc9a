//! Periodic evaluation of open alerts.

use crate::controller::AlertLifecycle;
use crate::store::AlertStore;
use futures_util::future::join_all;
use pricewatch_core::{Alert, AlertStatus, CandleRange};
use pricewatch_feeds::{ProviderError, ProviderResult, RangeProvider};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

/// Timing knobs for the polling loop.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Gap between evaluation passes.
    pub poll_interval: Duration,
    /// Delay before the first pass after startup.
    pub warmup_delay: Duration,
    /// Budget for one range fetch.
    pub fetch_timeout: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(29),
            warmup_delay: Duration::from_secs(10),
            fetch_timeout: Duration::from_secs(10),
        }
    }
}

/// Polls every open alert on a fixed cadence and fires the ones whose
/// target falls inside the fresh candle band.
pub struct PollingScheduler {
    store: Arc<AlertStore>,
    provider: Arc<dyn RangeProvider>,
    lifecycle: Arc<AlertLifecycle>,
    config: SchedulerConfig,
    running: AtomicBool,
}

impl PollingScheduler {
    pub fn new(
        store: Arc<AlertStore>,
        provider: Arc<dyn RangeProvider>,
        lifecycle: Arc<AlertLifecycle>,
        config: SchedulerConfig,
    ) -> Self {
        Self {
            store,
            provider,
            lifecycle,
            config,
            running: AtomicBool::new(true),
        }
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn shutdown(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    /// Loop until `shutdown`. The first evaluation happens after the
    /// warm-up delay, then once per `poll_interval`.
    pub async fn run(self: Arc<Self>) {
        info!(
            interval_secs = self.config.poll_interval.as_secs(),
            warmup_secs = self.config.warmup_delay.as_secs(),
            "polling scheduler started"
        );

        let first_tick = tokio::time::Instant::now() + self.config.warmup_delay;
        let mut interval = tokio::time::interval_at(first_tick, self.config.poll_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        while self.is_running() {
            interval.tick().await;
            if !self.is_running() {
                break;
            }
            self.run_tick().await;
        }

        info!("polling scheduler stopped");
    }

    /// One full evaluation pass over every scope. Fetches within a scope run
    /// concurrently; a failed fetch only costs that alert its turn.
    pub async fn run_tick(&self) {
        for scope in self.store.scopes() {
            let snapshot = self.store.open_alerts(scope);
            if snapshot.is_empty() {
                continue;
            }
            debug!(scope, alerts = snapshot.len(), "evaluating scope");

            let fetches = snapshot.into_iter().map(|alert| async move {
                let result = self.fetch_with_timeout(&alert).await;
                (alert, result)
            });

            for (alert, result) in join_all(fetches).await {
                match result {
                    Ok(range) if alert.matches(&range) => self.fire(alert, range).await,
                    Ok(_) => {}
                    Err(err) => {
                        debug!(
                            alert_id = alert.id,
                            ticker = %alert.instrument.ticker(),
                            error = %err,
                            "range fetch failed, retrying next tick"
                        );
                    }
                }
            }
        }
    }

    async fn fetch_with_timeout(&self, alert: &Alert) -> ProviderResult<CandleRange> {
        let fetch = self.provider.fetch_range(&alert.instrument);
        match tokio::time::timeout(self.config.fetch_timeout, fetch).await {
            Ok(result) => result,
            Err(_) => Err(ProviderError::Timeout(format!(
                "no range for {} within {:?}",
                alert.instrument.ticker(),
                self.config.fetch_timeout
            ))),
        }
    }

    /// Terminal action. Removing first makes the store the arbiter of the
    /// fire/cancel race: whoever removes the alert owns its ending, so a
    /// cancelled alert can never produce a notification.
    async fn fire(&self, alert: Alert, range: CandleRange) {
        match self.store.remove(alert.scope, alert.id) {
            Some(mut fired) => {
                fired.status = AlertStatus::Fired;
                info!(
                    alert_id = fired.id,
                    ticker = %fired.instrument.ticker(),
                    target = fired.target_price,
                    high = range.high,
                    low = range.low,
                    "alert fired"
                );
                self.lifecycle.notify_fired(&fired).await;
            }
            None => debug!(
                alert_id = alert.id,
                "matched alert already removed, skipping dispatch"
            ),
        }
    }
}
