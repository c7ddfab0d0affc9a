//! Telegram front end for the price alert service.

pub mod bot;
pub mod conversation;
pub mod format;
pub mod gate;
pub mod history;
pub mod notifier;

pub use bot::{AlertBot, Command, TelegramError};
pub use teloxide::Bot;
pub use conversation::{AlertConversations, StepReply};
pub use format::{confirmation_message, list_message, parse_confirmation, ParsedConfirmation};
pub use gate::MembershipGate;
pub use history::{restored_from_history, HistoryMessage};
pub use notifier::TelegramNotifier;
