//! Guided alert creation.
//!
//! One draft per (chat, user). Every reply advances an explicit state
//! machine, and all fields collected so far ride inside the state itself,
//! so dropping a draft can never leak a half-built alert into the store.

use crate::format::confirmation_message;
use dashmap::DashMap;
use pricewatch_core::{InstrumentSpec, MarketCategory, ScopeId, UserId, VENUE_CATALOG};
use pricewatch_engine::{AlertLifecycle, LifecycleError, Resolution};
use std::sync::Arc;
use tracing::debug;

/// Where one draft currently stands.
#[derive(Debug, Clone)]
enum DraftState {
    SelectCategory,
    SelectVenue {
        category: MarketCategory,
    },
    EnterSymbol {
        category: MarketCategory,
        venue: String,
    },
    SelectCandidate {
        candidates: Vec<InstrumentSpec>,
    },
    EnterTarget {
        spec: InstrumentSpec,
    },
}

/// What the bot should send back after feeding one reply in.
#[derive(Debug, Clone, PartialEq)]
pub enum StepReply {
    /// Prompt for the next step, or a re-prompt after invalid input.
    Prompt(String),
    /// Draft finished and an alert is open. Carries the confirmation text.
    Finished(String),
    /// Draft ended without an alert (symbol unresolvable anywhere).
    Aborted(String),
    /// No draft is active for this user in this chat.
    Inactive,
}

type DraftKey = (ScopeId, UserId);

/// All in-flight drafts plus the lifecycle used to resolve and open.
pub struct AlertConversations {
    lifecycle: Arc<AlertLifecycle>,
    drafts: DashMap<DraftKey, DraftState>,
}

impl AlertConversations {
    pub fn new(lifecycle: Arc<AlertLifecycle>) -> Self {
        Self {
            lifecycle,
            drafts: DashMap::new(),
        }
    }

    /// Start (or restart) a draft. Returns the category menu.
    pub fn begin(&self, chat: ScopeId, user: UserId) -> String {
        self.drafts.insert((chat, user), DraftState::SelectCategory);
        debug!(chat_id = chat, user_id = user, "alert draft started");
        category_menu()
    }

    /// Drop the user's draft. False when nothing was active.
    pub fn abort(&self, chat: ScopeId, user: UserId) -> bool {
        self.drafts.remove(&(chat, user)).is_some()
    }

    pub fn is_active(&self, chat: ScopeId, user: UserId) -> bool {
        self.drafts.contains_key(&(chat, user))
    }

    /// Feed one text reply into the user's draft.
    pub async fn handle_reply(&self, chat: ScopeId, user: UserId, text: &str) -> StepReply {
        let key = (chat, user);
        // Clone the state out so no map guard is held across the resolve await.
        let Some(state) = self.drafts.get(&key).map(|entry| entry.value().clone()) else {
            return StepReply::Inactive;
        };

        match state {
            DraftState::SelectCategory => {
                let categories = MarketCategory::all();
                match parse_menu_choice(text, categories.len()) {
                    Some(choice) => {
                        let category = categories[choice - 1];
                        self.drafts.insert(key, DraftState::SelectVenue { category });
                        StepReply::Prompt(venue_menu(category))
                    }
                    None => StepReply::Prompt(retry_menu(categories.len(), &category_menu())),
                }
            }

            DraftState::SelectVenue { category } => {
                match parse_menu_choice(text, VENUE_CATALOG.len()) {
                    Some(choice) => {
                        let venue = VENUE_CATALOG[choice - 1].to_string();
                        self.drafts
                            .insert(key, DraftState::EnterSymbol { category, venue });
                        StepReply::Prompt(
                            "Enter the symbol to watch (e.g. BTCUSDT or XAUUSD):".to_string(),
                        )
                    }
                    None => StepReply::Prompt(retry_menu(VENUE_CATALOG.len(), &venue_menu(category))),
                }
            }

            DraftState::EnterSymbol { category, venue } => {
                let symbol = text.trim();
                if symbol.is_empty() {
                    return StepReply::Prompt(
                        "Symbol cannot be empty. Enter the symbol to watch:".to_string(),
                    );
                }
                match self.lifecycle.resolve(symbol, category, &venue).await {
                    Ok(Resolution::Verified(spec)) => {
                        let prompt = target_prompt(&spec);
                        self.drafts.insert(key, DraftState::EnterTarget { spec });
                        StepReply::Prompt(prompt)
                    }
                    Ok(Resolution::Candidates(candidates)) => {
                        let menu = candidate_menu(&candidates);
                        self.drafts
                            .insert(key, DraftState::SelectCandidate { candidates });
                        StepReply::Prompt(menu)
                    }
                    Err(err) => {
                        self.drafts.remove(&key);
                        StepReply::Aborted(format!("❌ {err}. Use /alert to try again."))
                    }
                }
            }

            DraftState::SelectCandidate { candidates } => {
                match parse_menu_choice(text, candidates.len()) {
                    Some(choice) => {
                        let spec = candidates[choice - 1].clone();
                        let prompt = target_prompt(&spec);
                        self.drafts.insert(key, DraftState::EnterTarget { spec });
                        StepReply::Prompt(prompt)
                    }
                    None => StepReply::Prompt(retry_menu(
                        candidates.len(),
                        &candidate_menu(&candidates),
                    )),
                }
            }

            DraftState::EnterTarget { spec } => match text.trim().parse::<f64>() {
                Ok(target) if target.is_finite() => {
                    self.drafts.remove(&key);
                    let alert = self
                        .lifecycle
                        .create_resolved(chat, user, chat, spec, target, None);
                    StepReply::Finished(confirmation_message(&alert))
                }
                _ => StepReply::Prompt(
                    "❌ That is not a valid price. Enter the target price (e.g. 64250.5):"
                        .to_string(),
                ),
            },
        }
    }
}

fn category_menu() -> String {
    let mut menu = String::from("Pick a market category:\n");
    for (idx, category) in MarketCategory::all().iter().enumerate() {
        menu.push_str(&format!("{}. {}\n", idx + 1, category));
    }
    menu.push_str("\nReply with the number.");
    menu
}

fn venue_menu(category: MarketCategory) -> String {
    let mut menu = format!("Category: {category}. Now pick an exchange:\n");
    for (idx, venue) in VENUE_CATALOG.iter().enumerate() {
        menu.push_str(&format!("{}. {}\n", idx + 1, venue));
    }
    menu.push_str("\nReply with the number.");
    menu
}

fn candidate_menu(candidates: &[InstrumentSpec]) -> String {
    let mut menu =
        String::from("That exact symbol is not listed there, but these matches exist:\n");
    for (idx, spec) in candidates.iter().enumerate() {
        menu.push_str(&format!("{}. {}\n", idx + 1, spec));
    }
    menu.push_str("\nReply with the number of the one you meant.");
    menu
}

fn target_prompt(spec: &InstrumentSpec) -> String {
    format!("Watching {spec}. Enter the target price:")
}

fn retry_menu(max: usize, menu: &str) -> String {
    format!("❌ Reply with a number between 1 and {max}.\n\n{menu}")
}

fn parse_menu_choice(text: &str, max: usize) -> Option<usize> {
    let choice: usize = text.trim().parse().ok()?;
    (1..=max).contains(&choice).then_some(choice)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use pricewatch_core::CandleRange;
    use pricewatch_engine::{AlertStore, InstrumentResolver, Notifier, NotifyError, ResolverConfig};
    use pricewatch_feeds::{ProviderError, ProviderResult, RangeProvider};
    use std::collections::HashSet;
    use std::time::Duration;

    struct FakeProvider {
        known: HashSet<(&'static str, String)>,
    }

    #[async_trait]
    impl RangeProvider for FakeProvider {
        async fn fetch_range(&self, spec: &InstrumentSpec) -> ProviderResult<CandleRange> {
            if self
                .known
                .contains(&(spec.category.screener_id(), spec.ticker()))
            {
                Ok(CandleRange::new(100_000.0, 1.0))
            } else {
                Err(ProviderError::UnknownInstrument(spec.ticker()))
            }
        }
    }

    struct NullNotifier;

    #[async_trait]
    impl Notifier for NullNotifier {
        async fn deliver(
            &self,
            _target: i64,
            _text: &str,
            _watchers: &[UserId],
        ) -> Result<(), NotifyError> {
            Ok(())
        }
    }

    fn rig(known: &[(&'static str, &str)]) -> (Arc<AlertStore>, AlertConversations) {
        let provider = Arc::new(FakeProvider {
            known: known
                .iter()
                .map(|(screener, ticker)| (*screener, ticker.to_string()))
                .collect(),
        });
        let store = Arc::new(AlertStore::new());
        let config = ResolverConfig {
            venues: vec!["OANDA".to_string(), "BINANCE".to_string()],
            categories: vec![MarketCategory::Crypto, MarketCategory::Forex],
            probe_timeout: Duration::from_secs(2),
            fan_out: 4,
        };
        let resolver = InstrumentResolver::with_config(provider, config);
        let lifecycle = Arc::new(AlertLifecycle::new(
            store.clone(),
            resolver,
            Arc::new(NullNotifier),
        ));
        (store, AlertConversations::new(lifecycle))
    }

    fn prompt_text(reply: StepReply) -> String {
        match reply {
            StepReply::Prompt(text) => text,
            other => panic!("expected a prompt, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_full_draft_with_verified_symbol() {
        let (store, convos) = rig(&[("crypto", "BINANCE:BTCUSDT")]);
        let (chat, user) = (-500, 9);

        let menu = convos.begin(chat, user);
        assert!(menu.contains("1. forex"));
        assert!(menu.contains("2. crypto"));

        let venue = prompt_text(convos.handle_reply(chat, user, "2").await);
        assert!(venue.contains("2. BINANCE"));

        let symbol = prompt_text(convos.handle_reply(chat, user, "2").await);
        assert!(symbol.contains("Enter the symbol"));

        let target = prompt_text(convos.handle_reply(chat, user, "btcusdt").await);
        assert!(target.contains("BINANCE:BTCUSDT"));

        match convos.handle_reply(chat, user, "65000.5").await {
            StepReply::Finished(confirmation) => {
                assert!(confirmation.contains("BTCUSDT"));
                assert!(confirmation.contains("65000.5"));
                assert!(confirmation.contains("exchange: BINANCE"));
            }
            other => panic!("expected a finished draft, got {other:?}"),
        }

        assert!(!convos.is_active(chat, user));
        assert_eq!(store.total_open(), 1);
        let alert = &store.open_alerts(chat)[0];
        assert_eq!(alert.owner, user);
        assert_eq!(alert.notify_target, chat);
    }

    #[tokio::test]
    async fn test_invalid_menu_input_reprompts_without_losing_the_draft() {
        let (_, convos) = rig(&[]);
        let (chat, user) = (-1, 2);
        convos.begin(chat, user);

        for bad in ["abc", "0", "6", ""] {
            let prompt = prompt_text(convos.handle_reply(chat, user, bad).await);
            assert!(prompt.contains("between 1 and 5"), "input {bad:?}");
        }

        // A valid pick still works after the failures.
        let venue = prompt_text(convos.handle_reply(chat, user, "1").await);
        assert!(venue.contains("Category: forex"));
    }

    #[tokio::test]
    async fn test_candidate_pick_path() {
        let (store, convos) = rig(&[("crypto", "BINANCE:ETHUSD")]);
        let (chat, user) = (-42, 5);
        convos.begin(chat, user);
        convos.handle_reply(chat, user, "2").await; // crypto
        convos.handle_reply(chat, user, "1").await; // OANDA, where ETH is not listed

        let menu = prompt_text(convos.handle_reply(chat, user, "eth").await);
        assert!(menu.contains("1. BINANCE:ETHUSD (crypto)"));

        let target = prompt_text(convos.handle_reply(chat, user, "1").await);
        assert!(target.contains("BINANCE:ETHUSD"));

        match convos.handle_reply(chat, user, "3000").await {
            StepReply::Finished(_) => {}
            other => panic!("expected a finished draft, got {other:?}"),
        }
        let alert = &store.open_alerts(chat)[0];
        assert_eq!(alert.instrument.venue, "BINANCE");
        assert_eq!(alert.instrument.symbol, "ETHUSD");
    }

    #[tokio::test]
    async fn test_unresolvable_symbol_aborts_the_draft() {
        let (store, convos) = rig(&[]);
        let (chat, user) = (-3, 4);
        convos.begin(chat, user);
        convos.handle_reply(chat, user, "2").await;
        convos.handle_reply(chat, user, "1").await;

        match convos.handle_reply(chat, user, "zzz").await {
            StepReply::Aborted(text) => assert!(text.contains("no listing found")),
            other => panic!("expected an abort, got {other:?}"),
        }
        assert!(!convos.is_active(chat, user));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_bad_target_price_reprompts() {
        let (store, convos) = rig(&[("crypto", "BINANCE:BTCUSDT")]);
        let (chat, user) = (-8, 1);
        convos.begin(chat, user);
        convos.handle_reply(chat, user, "2").await;
        convos.handle_reply(chat, user, "2").await;
        convos.handle_reply(chat, user, "BTCUSDT").await;

        for bad in ["abc", "nan", "inf", ""] {
            let prompt = prompt_text(convos.handle_reply(chat, user, bad).await);
            assert!(prompt.contains("not a valid price"), "input {bad:?}");
        }

        match convos.handle_reply(chat, user, "60000").await {
            StepReply::Finished(_) => {}
            other => panic!("expected a finished draft, got {other:?}"),
        }
        assert_eq!(store.total_open(), 1);
    }

    #[tokio::test]
    async fn test_abort_and_inactive_replies() {
        let (_, convos) = rig(&[]);
        let (chat, user) = (-9, 7);

        assert_eq!(convos.handle_reply(chat, user, "hello").await, StepReply::Inactive);
        assert!(!convos.abort(chat, user));

        convos.begin(chat, user);
        assert!(convos.is_active(chat, user));
        assert!(convos.abort(chat, user));
        assert_eq!(convos.handle_reply(chat, user, "1").await, StepReply::Inactive);
    }

    #[tokio::test]
    async fn test_drafts_are_scoped_per_chat_and_user() {
        let (_, convos) = rig(&[]);
        convos.begin(-1, 10);

        // Same user in another chat, and another user in the same chat,
        // are both untouched.
        assert_eq!(convos.handle_reply(-2, 10, "1").await, StepReply::Inactive);
        assert_eq!(convos.handle_reply(-1, 11, "1").await, StepReply::Inactive);
        assert!(convos.is_active(-1, 10));
    }
}
