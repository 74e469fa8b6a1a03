use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serenity::all::{ChannelId, GuildId, MessageId, UserId};
use tracing::{debug, info, warn};

use crate::bot::error::Error;
use crate::capabilities::ChatCapability;
use crate::constants::defaults::{SPAM_TIMEOUT, SPAM_TIMEOUT_REASON};
use crate::db::models::GuildSettings;
use crate::db::repository::{GuildSettingsRepository, Store};
use crate::services::spam::window::{SpamTracker, TrackedMessage};
use crate::utils::formatting::{mention_channel, mention_user, truncate};

/// Longest excerpt of the triggering message quoted to moderators
const QUOTE_MAX_CHARS: usize = 1500;

/// A guild message as seen by the detector
#[derive(Debug, Clone)]
pub struct IncomingMessage {
    pub guild_id: GuildId,
    pub channel_id: ChannelId,
    pub message_id: MessageId,
    pub author_id: UserId,
    pub content: String,
}

/// What was done when a user crossed the strike threshold
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpamAction {
    pub user_id: UserId,
    pub deleted: usize,
    pub failed_deletes: usize,
    pub notified: bool,
}

/// Score a message and, the first time the guild's strike threshold is
/// reached, time the author out and clean up their recent messages.
pub async fn check_message(
    tracker: &SpamTracker,
    store: &dyn Store,
    chat: &dyn ChatCapability,
    message: &IncomingMessage,
    now: Instant,
    now_utc: DateTime<Utc>,
) -> Result<Option<SpamAction>, Error> {
    let settings = store.guild_settings(message.guild_id).await?;
    if !settings.anti_spam_enabled {
        return Ok(None);
    }

    let cooldown = Duration::from_secs(settings.anti_spam_cooldown_seconds.max(1) as u64);
    let threshold = settings.anti_spam_count.max(1) as u32;

    let observation = tracker.observe(
        message.guild_id,
        message.author_id,
        TrackedMessage::new(message.channel_id, message.message_id, &message.content),
        threshold,
        cooldown,
        now,
    );

    let Some(retained) = observation.triggered else {
        if observation.score > 0 {
            debug!(
                guild_id = %message.guild_id,
                user_id = %message.author_id,
                "Spam score {}/{}",
                observation.score,
                threshold
            );
        }
        return Ok(None);
    };

    match take_action(chat, &settings, message, &retained, cooldown, now_utc).await {
        Ok(action) => Ok(Some(action)),
        Err(e) => {
            tracker.release(message.guild_id, message.author_id);
            Err(e)
        }
    }
}

async fn take_action(
    chat: &dyn ChatCapability,
    settings: &GuildSettings,
    trigger: &IncomingMessage,
    retained: &[TrackedMessage],
    cooldown: Duration,
    now_utc: DateTime<Utc>,
) -> Result<SpamAction, Error> {
    let (guild_id, user_id) = (trigger.guild_id, trigger.author_id);

    let until = now_utc + chrono::Duration::seconds(SPAM_TIMEOUT.as_secs() as i64);
    chat.timeout_member(guild_id, user_id, until, SPAM_TIMEOUT_REASON)
        .await?;

    info!(guild_id = %guild_id, user_id = %user_id, "Timed out user for cross-channel spam");

    // Only messages created within the cooldown are removed
    let cutoff = now_utc - chrono::Duration::seconds(cooldown.as_secs() as i64);
    let mut deleted = 0;
    let mut failed_deletes = 0;
    for m in retained {
        if *m.message_id.created_at() < cutoff {
            continue;
        }

        match chat.delete_message(m.channel_id, m.message_id).await {
            Ok(()) => deleted += 1,
            Err(e) => {
                failed_deletes += 1;
                warn!(
                    guild_id = %guild_id,
                    channel_id = %m.channel_id,
                    "Failed to delete spam message {}: {}",
                    m.message_id,
                    e
                );
            }
        }
    }

    let mut notified = false;
    if let Some(channel_id) = settings.moderator_channel() {
        let report = format!(
            "User {} has been timed out for spamming in {}. Deleted {} messages.\n\nTriggering message:\n>>> {}",
            mention_user(user_id),
            mention_channel(trigger.channel_id),
            deleted,
            truncate(&trigger.content, QUOTE_MAX_CHARS)
        );

        match chat.send_message(channel_id, &report).await {
            Ok(()) => notified = true,
            Err(e) => warn!(
                guild_id = %guild_id,
                channel_id = %channel_id,
                "Failed to report spam timeout: {}",
                e
            ),
        }
    }

    Ok(SpamAction {
        user_id,
        deleted,
        failed_deletes,
        notified,
    })
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use chrono::TimeZone;

    use super::*;
    use crate::capabilities::chat::MockChatCapability;
    use crate::capabilities::ChatError;
    use crate::db::MemoryStore;

    const GUILD: GuildId = GuildId::new(1);
    const USER: UserId = UserId::new(2);
    const MOD_CHANNEL: ChannelId = ChannelId::new(999);
    /// Thirty characters
    const SPAM: &str = "join my server: discord.gg/xyz";

    async fn store_with_anti_spam(count: i32, cooldown: i32, mod_channel: bool) -> MemoryStore {
        let store = MemoryStore::new();
        let mut settings = GuildSettings::new(GUILD, Utc::now());
        settings
            .set_anti_spam(Some(true), Some(count), Some(cooldown))
            .unwrap();
        if mod_channel {
            settings.moderator_channel_id = Some(MOD_CHANNEL.get() as i64);
        }
        store.save_guild_settings(&settings).await.unwrap();
        store
    }

    /// Milliseconds between the Unix epoch and the start of 2015
    const DISCORD_EPOCH_MS: i64 = 1_420_070_400_000;

    /// Smallest message ID created at `at`
    fn message_id_at(at: DateTime<Utc>) -> MessageId {
        let millis = (at.timestamp_millis() - DISCORD_EPOCH_MS) as u64;
        MessageId::new((millis << 22).max(1))
    }

    fn incoming(channel: u64, created: DateTime<Utc>, content: &str) -> IncomingMessage {
        IncomingMessage {
            guild_id: GUILD,
            channel_id: ChannelId::new(channel),
            message_id: message_id_at(created),
            author_id: USER,
            content: content.to_string(),
        }
    }

    #[test]
    fn test_cutoff_uses_message_id_timestamps() {
        let at = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        assert_eq!(*message_id_at(at).created_at(), at);

        let known = MessageId::new(175_928_847_299_117_063);
        let expected = Utc.with_ymd_and_hms(2016, 4, 30, 11, 18, 25).unwrap()
            + chrono::Duration::milliseconds(796);
        assert_eq!(*known.created_at(), expected);
    }

    #[tokio::test]
    async fn test_disabled_guild_is_ignored() {
        let store = MemoryStore::new();
        let chat = MockChatCapability::new();
        let tracker = SpamTracker::new();
        let now = Utc::now();

        for channel in 1..=5 {
            let result = check_message(
                &tracker,
                &store,
                &chat,
                &incoming(channel, now, SPAM),
                Instant::now(),
                now,
            )
            .await
            .unwrap();
            assert!(result.is_none());
        }
        assert!(tracker.is_empty());
    }

    #[tokio::test]
    async fn test_cross_channel_spam_times_out_and_cleans_up() {
        let store = store_with_anti_spam(3, 20, true).await;
        let tracker = SpamTracker::new();
        let start = Instant::now();
        let t0 = Utc::now();

        let mut chat = MockChatCapability::new();
        chat.expect_timeout_member()
            .withf(move |guild_id, user_id, until, _| {
                *guild_id == GUILD && *user_id == USER && *until > t0 + chrono::Duration::hours(23)
            })
            .times(1)
            .returning(|_, _, _, _| Ok(()));
        chat.expect_delete_message()
            .times(4)
            .returning(|_, _| Ok(()));
        chat.expect_send_message()
            .withf(|channel_id, content| {
                *channel_id == MOD_CHANNEL
                    && content.contains("spamming in <#13>")
                    && content.contains("Deleted 4 messages")
            })
            .times(1)
            .returning(|_, _| Ok(()));

        // An unrelated message from half a minute ago opens the window
        let old = incoming(50, t0 - chrono::Duration::seconds(30), "what time does the stream start?");
        check_message(&tracker, &store, &chat, &old, start, t0).await.unwrap();

        let mut actions = Vec::new();
        for (i, channel) in [10, 11, 12, 13, 14].into_iter().enumerate() {
            let at = t0 + chrono::Duration::seconds(i as i64);
            let result = check_message(
                &tracker,
                &store,
                &chat,
                &incoming(channel, at, SPAM),
                start + Duration::from_secs(i as u64),
                at,
            )
            .await
            .unwrap();
            actions.push(result);
        }

        // Scores 0, 1, 2, 3: the fourth post crosses the threshold, the fifth does not repeat it
        assert!(actions[..3].iter().all(Option::is_none));
        assert_eq!(
            actions[3],
            Some(SpamAction {
                user_id: USER,
                deleted: 4,
                failed_deletes: 0,
                notified: true,
            })
        );
        assert!(actions[4].is_none());
    }

    #[tokio::test]
    async fn test_delete_failures_are_skipped() {
        let store = store_with_anti_spam(2, 20, false).await;
        let tracker = SpamTracker::new();
        let now = Utc::now();

        let deletes = Arc::new(AtomicUsize::new(0));
        let counter = deletes.clone();
        let mut chat = MockChatCapability::new();
        chat.expect_timeout_member()
            .times(1)
            .returning(|_, _, _, _| Ok(()));
        chat.expect_delete_message()
            .times(3)
            .returning(move |_, _| {
                if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err(ChatError::Other("unknown message".to_string()))
                } else {
                    Ok(())
                }
            });

        let mut last = None;
        for channel in 1..=3 {
            last = check_message(
                &tracker,
                &store,
                &chat,
                &incoming(channel, now, SPAM),
                Instant::now(),
                now,
            )
            .await
            .unwrap();
        }

        assert_eq!(
            last,
            Some(SpamAction {
                user_id: USER,
                deleted: 2,
                failed_deletes: 1,
                notified: false,
            })
        );
    }

    #[tokio::test]
    async fn test_failed_timeout_is_retried_on_next_message() {
        let store = store_with_anti_spam(2, 20, false).await;
        let tracker = SpamTracker::new();
        let now = Utc::now();

        let attempts = Arc::new(AtomicUsize::new(0));
        let counter = attempts.clone();
        let mut chat = MockChatCapability::new();
        chat.expect_timeout_member()
            .times(2)
            .returning(move |_, _, _, _| {
                if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err(ChatError::Other("missing permissions".to_string()))
                } else {
                    Ok(())
                }
            });
        chat.expect_delete_message().returning(|_, _| Ok(()));

        let check = |channel| {
            let message = incoming(channel, now, SPAM);
            let (tracker, store, chat) = (&tracker, &store, &chat);
            async move { check_message(tracker, store, chat, &message, Instant::now(), now).await }
        };

        assert!(check(1).await.unwrap().is_none());
        assert!(check(2).await.unwrap().is_none());
        assert!(matches!(check(3).await, Err(Error::Chat(_))));
        let action = check(4).await.unwrap().unwrap();
        assert_eq!(action.deleted, 4);
    }
}
