//! Channel-membership capability check.

use teloxide::prelude::*;
use teloxide::types::{ChatMemberStatus, Recipient, UserId};
use tracing::{debug, warn};

/// Requires membership in a configured channel before a user may touch
/// alerts. Checked per request and never cached, so revoking membership
/// takes effect on the next command.
#[derive(Debug, Clone, Default)]
pub struct MembershipGate {
    channel: Option<String>,
}

impl MembershipGate {
    /// `channel` is the @username or numeric id of the required channel.
    /// `None` (or an empty string) disables the gate entirely.
    pub fn new(channel: Option<String>) -> Self {
        let channel = channel
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .map(|c| {
                if c.starts_with('@') || c.parse::<i64>().is_ok() {
                    c
                } else {
                    format!("@{c}")
                }
            });
        Self { channel }
    }

    pub fn is_enabled(&self) -> bool {
        self.channel.is_some()
    }

    pub fn channel(&self) -> Option<&str> {
        self.channel.as_deref()
    }

    /// True when the user may use alert commands. Lookup failures deny:
    /// a user the API cannot place in the channel is not in the channel.
    pub async fn permits(&self, bot: &Bot, user: UserId) -> bool {
        let Some(channel) = &self.channel else {
            return true;
        };
        let recipient = match channel.parse::<i64>() {
            Ok(id) => Recipient::Id(ChatId(id)),
            Err(_) => Recipient::ChannelUsername(channel.clone()),
        };
        match bot.get_chat_member(recipient, user).await {
            Ok(member) => {
                let present = matches!(
                    member.status(),
                    ChatMemberStatus::Owner
                        | ChatMemberStatus::Administrator
                        | ChatMemberStatus::Member
                );
                if !present {
                    debug!(user_id = user.0, channel = %channel, "membership check failed");
                }
                present
            }
            Err(err) => {
                warn!(
                    user_id = user.0,
                    channel = %channel,
                    error = %err,
                    "membership lookup failed, denying access"
                );
                false
            }
        }
    }
}
