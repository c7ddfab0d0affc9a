//! Telegram front end: commands, dispatcher, draft replies.

use crate::conversation::{AlertConversations, StepReply};
use crate::format::list_message;
use crate::gate::MembershipGate;
use pricewatch_engine::{AlertLifecycle, LifecycleError};
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::utils::command::BotCommands;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum TelegramError {
    #[error("Telegram API error: {0}")]
    Api(#[from] teloxide::RequestError),
}

/// Bot commands.
#[derive(BotCommands, Clone)]
#[command(rename_rule = "lowercase", description = "Available commands:")]
pub enum Command {
    #[command(description = "Check your access and get started")]
    Start,
    #[command(description = "How price alerts work")]
    Info,
    #[command(description = "Create a price alert step by step")]
    Alert,
    #[command(description = "Cancel an alert by id (/cancel 23), or abort the current setup")]
    Cancel(String),
    #[command(description = "List open alerts in this chat")]
    List,
    #[command(description = "Show this help")]
    Help,
}

/// Telegram bot wrapper around the alert lifecycle.
pub struct AlertBot {
    bot: Bot,
    lifecycle: Arc<AlertLifecycle>,
    conversations: AlertConversations,
    gate: MembershipGate,
}

impl AlertBot {
    pub fn new(bot: Bot, lifecycle: Arc<AlertLifecycle>, gate: MembershipGate) -> Self {
        Self {
            bot,
            conversations: AlertConversations::new(Arc::clone(&lifecycle)),
            lifecycle,
            gate,
        }
    }

    /// Run the dispatcher until shutdown.
    pub async fn run(self: Arc<Self>) {
        info!("Starting Telegram bot");
        let bot = self.bot.clone();

        let command_branch = {
            let this = Arc::clone(&self);
            dptree::entry().filter_command::<Command>().endpoint(
                move |bot: Bot, msg: Message, cmd: Command| {
                    let this = Arc::clone(&this);
                    async move { this.handle_command(bot, msg, cmd).await }
                },
            )
        };

        let reply_branch = {
            let this = Arc::clone(&self);
            dptree::endpoint(move |bot: Bot, msg: Message| {
                let this = Arc::clone(&this);
                async move { this.handle_reply(bot, msg).await }
            })
        };

        let handler = Update::filter_message()
            .branch(command_branch)
            .branch(reply_branch);

        Dispatcher::builder(bot, handler)
            .enable_ctrlc_handler()
            .build()
            .dispatch()
            .await;
    }

    async fn handle_command(
        &self,
        bot: Bot,
        msg: Message,
        cmd: Command,
    ) -> Result<(), TelegramError> {
        let chat = msg.chat.id;
        // Channel posts and service messages carry no sender.
        let Some(user) = msg.from.as_ref().map(|u| u.id) else {
            return Ok(());
        };

        match cmd {
            Command::Start => {
                let text = if self.gate.permits(&bot, user).await {
                    "✅ You're in. Use /alert to set up your first price alert, \
                     /info for how it works."
                        .to_string()
                } else {
                    denied_message(&self.gate)
                };
                bot.send_message(chat, text).await?;
            }

            Command::Info => {
                let text = "I watch market prices and ping this chat when they arrive.\n\n\
                            /alert walks you through category, exchange, symbol and \
                            target price. Once the instrument trades through your \
                            target, I announce it here and the alert closes itself.\n\
                            /list shows what is open, /cancel <id> removes yours.";
                bot.send_message(chat, text).await?;
            }

            Command::Help => {
                bot.send_message(chat, Command::descriptions().to_string())
                    .await?;
            }

            Command::Alert => {
                if !self.gate.permits(&bot, user).await {
                    bot.send_message(chat, denied_message(&self.gate)).await?;
                    return Ok(());
                }
                let menu = self.conversations.begin(chat.0, user.0);
                bot.send_message(chat, menu).await?;
            }

            Command::Cancel(arg) => {
                if !self.gate.permits(&bot, user).await {
                    bot.send_message(chat, denied_message(&self.gate)).await?;
                    return Ok(());
                }
                let text = self.cancel_reply(chat.0, user.0, arg.trim());
                bot.send_message(chat, text).await?;
            }

            Command::List => {
                if !self.gate.permits(&bot, user).await {
                    bot.send_message(chat, denied_message(&self.gate)).await?;
                    return Ok(());
                }
                let alerts = self.lifecycle.store().open_alerts(chat.0);
                bot.send_message(chat, list_message(&alerts)).await?;
            }
        }
        Ok(())
    }

    /// Bare `/cancel` aborts a draft in progress; `/cancel <id>` closes an
    /// open alert, creator only.
    fn cancel_reply(&self, chat: i64, user: u64, arg: &str) -> String {
        if arg.is_empty() {
            return if self.conversations.abort(chat, user) {
                "Alert setup cancelled.".to_string()
            } else {
                "Nothing to cancel. Use /cancel <id> to close an open alert \
                 (ids are in /list)."
                    .to_string()
            };
        }
        match arg.parse::<u64>() {
            Ok(id) => match self.lifecycle.cancel(chat, id, user) {
                Ok(alert) => format!(
                    "🗑 Alert #{} for {} cancelled.",
                    alert.id, alert.instrument.symbol
                ),
                Err(err @ LifecycleError::NotFound(_)) => format!("❌ {err}."),
                Err(err @ LifecycleError::Forbidden(_)) => {
                    format!("❌ {err}; only its creator can cancel it.")
                }
                Err(err) => format!("❌ {err}."),
            },
            Err(_) => "Usage: /cancel <id>, e.g. /cancel 23".to_string(),
        }
    }

    /// Plain-text messages only matter while the sender has a draft open.
    async fn handle_reply(&self, bot: Bot, msg: Message) -> Result<(), TelegramError> {
        let chat = msg.chat.id;
        let Some(user) = msg.from.as_ref().map(|u| u.id) else {
            return Ok(());
        };
        let Some(text) = msg.text() else {
            return Ok(());
        };

        match self.conversations.handle_reply(chat.0, user.0, text).await {
            StepReply::Prompt(reply) | StepReply::Aborted(reply) => {
                bot.send_message(chat, reply).await?;
            }
            // Sent verbatim; the history restorer parses this wording back.
            StepReply::Finished(confirmation) => {
                bot.send_message(chat, confirmation).await?;
            }
            StepReply::Inactive => {
                debug!(chat_id = chat.0, "ignoring chatter outside a draft");
            }
        }
        Ok(())
    }
}

fn denied_message(gate: &MembershipGate) -> String {
    match gate.channel() {
        Some(channel) => format!(
            "🔒 Alerts are for members of {channel}. Join the channel and try again."
        ),
        None => "🔒 You are not allowed to use alerts here.".to_string(),
    }
}
