//! Liveness endpoint for process supervisors.

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use pricewatch_engine::AlertStore;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};

#[derive(Clone)]
struct HealthState {
    store: Arc<AlertStore>,
    started: Instant,
}

#[derive(Debug, Serialize)]
struct HealthReport {
    status: &'static str,
    open_alerts: usize,
    uptime_secs: u64,
}

async fn healthz(State(state): State<HealthState>) -> Json<HealthReport> {
    Json(HealthReport {
        status: "ok",
        open_alerts: state.store.total_open(),
        uptime_secs: state.started.elapsed().as_secs(),
    })
}

/// Bind the health server and keep serving it in the background.
pub async fn start_health_server(store: Arc<AlertStore>, port: u16) -> Result<(), std::io::Error> {
    let state = HealthState {
        store,
        started: Instant::now(),
    };
    let app = Router::new()
        .route("/healthz", get(healthz))
        .with_state(state);

    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Health endpoint on http://{}/healthz", addr);

    tokio::spawn(async move {
        if let Err(err) = axum::serve(listener, app).await {
            error!("Health server error: {}", err);
        }
    });

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_healthz_reports_open_alerts() {
        let store = Arc::new(AlertStore::new());
        let state = HealthState {
            store: store.clone(),
            started: Instant::now(),
        };

        let Json(report) = healthz(State(state.clone())).await;
        assert_eq!(report.status, "ok");
        assert_eq!(report.open_alerts, 0);

        store.insert(pricewatch_core::Alert::new(
            -1,
            pricewatch_core::InstrumentSpec::new(
                "BTCUSD",
                pricewatch_core::MarketCategory::Crypto,
                "BINANCE",
            ),
            50000.0,
            1,
            -1,
        ));
        let Json(report) = healthz(State(state)).await;
        assert_eq!(report.open_alerts, 1);
    }
}
