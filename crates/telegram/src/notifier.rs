//! Engine-facing notifier backed by the Telegram API.

use async_trait::async_trait;
use pricewatch_core::UserId;
use pricewatch_engine::{Notifier, NotifyError};
use teloxide::prelude::*;
use teloxide::types::ParseMode;
use teloxide::utils::html;
use tracing::debug;

/// Delivers firing messages to a chat, pinging watchers with `tg://user`
/// mention links so they get a notification even without a username.
pub struct TelegramNotifier {
    bot: Bot,
}

impl TelegramNotifier {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

fn render_body(text: &str, watchers: &[UserId]) -> String {
    let mut body = html::escape(text);
    if !watchers.is_empty() {
        let mentions: Vec<String> = watchers
            .iter()
            .map(|id| format!(r#"<a href="tg://user?id={id}">@{id}</a>"#))
            .collect();
        body.push_str(&format!("\ncc {}", mentions.join(" ")));
    }
    body
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn deliver(
        &self,
        target: i64,
        text: &str,
        watchers: &[UserId],
    ) -> Result<(), NotifyError> {
        let body = render_body(text, watchers);
        self.bot
            .send_message(ChatId(target), body)
            .parse_mode(ParseMode::Html)
            .await
            .map_err(|err| NotifyError(err.to_string()))?;
        debug!(chat_id = target, "firing message delivered");
        Ok(())
    }
}
