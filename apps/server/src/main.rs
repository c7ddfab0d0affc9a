//! Pricewatch - Headless Alert Server
//!
//! Watches market prices through the scanner API and fires Telegram
//! alerts when targets are hit.

mod config;
mod health;

use clap::Parser;
use config::AppConfig;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use pricewatch_engine::{
    import_restored, AlertLifecycle, AlertStore, InstrumentResolver, PollingScheduler,
};
use pricewatch_feeds::{RangeProvider, ScannerClient};
use pricewatch_telegram::{
    restored_from_history, AlertBot, Bot, HistoryMessage, MembershipGate, TelegramNotifier,
};

/// Pricewatch CLI
#[derive(Parser, Debug)]
#[command(name = "pricewatch-bot")]
#[command(about = "Telegram price alert bot", long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "config.json")]
    config: String,

    /// Chat history export (JSON) to restore alerts from
    #[arg(short, long)]
    restore: Option<String>,

    /// Log level: trace, debug, info, warn, error
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Health endpoint port
    #[arg(long, default_value_t = 9102)]
    health_port: u16,
}

fn init_logging(level: &str) {
    let level = match level {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set tracing subscriber");
}

fn load_restore_records(path: &str) -> Vec<HistoryMessage> {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(err) => {
            warn!("Restore file {} not readable: {}", path, err);
            return Vec::new();
        }
    };
    match serde_json::from_str(&raw) {
        Ok(messages) => messages,
        Err(err) => {
            warn!("Restore file {} is not a valid history export: {}", path, err);
            Vec::new()
        }
    }
}

#[tokio::main]
async fn main() {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let args = Args::parse();

    init_logging(&args.log_level);

    info!("🚀 Pricewatch starting...");
    info!("  Config: {}", args.config);
    info!("  Health Port: {}", args.health_port);

    let mut config = AppConfig::load(&args.config);
    config.log_level = args.log_level.clone();

    let token = match std::env::var("TELEGRAM_BOT_TOKEN") {
        Ok(token) => token,
        Err(_) => {
            tracing::error!("TELEGRAM_BOT_TOKEN is not set");
            return;
        }
    };

    let scanner = match &config.scanner.base_url {
        Some(base) => ScannerClient::with_base_url(base.clone()),
        None => ScannerClient::new(),
    };
    let provider: Arc<dyn RangeProvider> = Arc::new(scanner);

    let store = Arc::new(AlertStore::new());
    let resolver =
        InstrumentResolver::with_config(Arc::clone(&provider), (&config.resolver).into());

    let api = Bot::new(&token);
    let notifier = Arc::new(TelegramNotifier::new(api.clone()));
    let lifecycle = Arc::new(AlertLifecycle::new(Arc::clone(&store), resolver, notifier));

    // Rebuild open alerts from an exported chat history, if one was given.
    if let Some(path) = &args.restore {
        let messages = load_restore_records(path);
        let stats = import_restored(&store, restored_from_history(&messages));
        info!(
            "  Restore: {} alerts imported, {} duplicates skipped",
            stats.imported, stats.skipped
        );
    }

    let gate = MembershipGate::new(config.telegram.required_channel.clone());
    match gate.channel() {
        Some(channel) => info!("  Membership gate: {}", channel),
        None => info!("  Membership gate: disabled"),
    }

    if let Err(err) = health::start_health_server(Arc::clone(&store), args.health_port).await {
        tracing::error!("Failed to start health server: {}", err);
        return;
    }

    let scheduler = Arc::new(PollingScheduler::new(
        Arc::clone(&store),
        provider,
        Arc::clone(&lifecycle),
        (&config.scheduler).into(),
    ));
    let scheduler_handle = tokio::spawn(Arc::clone(&scheduler).run());

    let bot = Arc::new(AlertBot::new(api, lifecycle, gate));
    let bot_handle = tokio::spawn(bot.run());

    // Handle shutdown
    info!("Press Ctrl+C to stop...");

    tokio::signal::ctrl_c()
        .await
        .expect("Failed to listen for Ctrl+C");

    warn!("Shutdown signal received");
    scheduler.shutdown();

    // The dispatcher reacts to ctrl-c on its own; give both a moment
    let _ = tokio::time::timeout(Duration::from_secs(2), bot_handle).await;
    let _ = tokio::time::timeout(Duration::from_secs(2), scheduler_handle).await;

    // Final stats
    info!("📈 Final Stats:");
    info!("  Open alerts: {}", store.total_open());
    info!("  Active chats: {}", store.scopes().len());

    info!("👋 Pricewatch stopped");
}
