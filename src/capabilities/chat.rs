use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serenity::all::{
    ChannelId, CreateAllowedMentions, CreateMessage, EditChannel, EditMember, GuildId, Http,
    MessageId, UserId,
};
use serenity::http::HttpError;
use thiserror::Error;
use tracing::debug;

/// Discord JSON error code returned when removing a ban that does not exist
const UNKNOWN_BAN_CODE: isize = 10026;

/// Errors returned by the chat platform
#[derive(Debug, Error)]
pub enum ChatError {
    /// The ban being removed is already gone
    #[error("Unknown ban")]
    UnknownBan,

    #[error("Discord API error: {0}")]
    Api(Box<serenity::Error>),

    #[error("{0}")]
    Other(String),
}

impl From<serenity::Error> for ChatError {
    fn from(error: serenity::Error) -> Self {
        if is_unknown_ban(&error) {
            Self::UnknownBan
        } else {
            Self::Api(Box::new(error))
        }
    }
}

fn is_unknown_ban(error: &serenity::Error) -> bool {
    match error {
        serenity::Error::Http(HttpError::UnsuccessfulRequest(response)) => {
            response.error.code == UNKNOWN_BAN_CODE
        }
        _ => false,
    }
}

/// Every chat-platform side effect the moderation core performs
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChatCapability: Send + Sync {
    /// Set the per-user slow-mode interval of a channel in seconds
    async fn set_channel_cooldown(&self, channel_id: ChannelId, seconds: u16)
        -> Result<(), ChatError>;

    /// Disable communication for a member until the given instant
    async fn timeout_member(
        &self,
        guild_id: GuildId,
        user_id: UserId,
        until: DateTime<Utc>,
        reason: &str,
    ) -> Result<(), ChatError>;

    async fn delete_message(&self, channel_id: ChannelId, message_id: MessageId)
        -> Result<(), ChatError>;

    async fn remove_ban(&self, guild_id: GuildId, user_id: UserId, reason: &str)
        -> Result<(), ChatError>;

    async fn send_message(&self, channel_id: ChannelId, content: &str) -> Result<(), ChatError>;

    /// Open (or reuse) the direct-message channel with a user
    async fn dm_channel_for(&self, user_id: UserId) -> Result<ChannelId, ChatError>;

    async fn guild_owner(&self, guild_id: GuildId) -> Result<UserId, ChatError>;
}

/// Shared handle to the chat capability
pub type ChatHandle = Arc<dyn ChatCapability>;

/// `ChatCapability` backed by serenity's REST client
pub struct SerenityChat {
    http: Arc<Http>,
}

impl SerenityChat {
    pub fn new(http: Arc<Http>) -> Self {
        Self { http }
    }
}

#[async_trait]
impl ChatCapability for SerenityChat {
    async fn set_channel_cooldown(
        &self,
        channel_id: ChannelId,
        seconds: u16,
    ) -> Result<(), ChatError> {
        channel_id
            .edit(&*self.http, EditChannel::new().rate_limit_per_user(seconds))
            .await?;

        debug!("Set slow mode of channel {} to {}s", channel_id, seconds);
        Ok(())
    }

    async fn timeout_member(
        &self,
        guild_id: GuildId,
        user_id: UserId,
        until: DateTime<Utc>,
        reason: &str,
    ) -> Result<(), ChatError> {
        // Discord expects an ISO 8601 timestamp string
        let edit = EditMember::new()
            .disable_communication_until(until.to_rfc3339())
            .audit_log_reason(reason);

        guild_id.edit_member(&*self.http, user_id, edit).await?;
        Ok(())
    }

    async fn delete_message(
        &self,
        channel_id: ChannelId,
        message_id: MessageId,
    ) -> Result<(), ChatError> {
        channel_id.delete_message(&*self.http, message_id).await?;
        Ok(())
    }

    async fn remove_ban(
        &self,
        guild_id: GuildId,
        user_id: UserId,
        reason: &str,
    ) -> Result<(), ChatError> {
        self.http.remove_ban(guild_id, user_id, Some(reason)).await?;
        Ok(())
    }

    async fn send_message(&self, channel_id: ChannelId, content: &str) -> Result<(), ChatError> {
        let message = CreateMessage::new()
            .content(content)
            .allowed_mentions(CreateAllowedMentions::new());

        channel_id.send_message(&*self.http, message).await?;
        Ok(())
    }

    async fn dm_channel_for(&self, user_id: UserId) -> Result<ChannelId, ChatError> {
        let channel = user_id.create_dm_channel(&*self.http).await?;
        Ok(channel.id)
    }

    async fn guild_owner(&self, guild_id: GuildId) -> Result<UserId, ChatError> {
        let guild = guild_id.to_partial_guild(&*self.http).await?;
        Ok(guild.owner_id)
    }
}
