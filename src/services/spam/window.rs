use std::collections::VecDeque;
use std::time::{Duration, Instant};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serenity::all::{ChannelId, GuildId, MessageId, UserId};

use crate::constants::defaults::{SPAM_MAX_EDIT_DISTANCE, SPAM_MAX_MESSAGES, SPAM_MIN_MESSAGE_LENGTH};
use crate::services::spam::normalize::strip_whitespace;

/// A message remembered for comparison
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackedMessage {
    pub channel_id: ChannelId,
    pub message_id: MessageId,
    pub content: String,
    normalized: String,
}

impl TrackedMessage {
    pub fn new(channel_id: ChannelId, message_id: MessageId, content: &str) -> Self {
        Self {
            channel_id,
            message_id,
            content: content.to_string(),
            normalized: strip_whitespace(content),
        }
    }

    /// Long enough, close enough and posted somewhere else
    fn is_cross_channel_repeat_of(&self, earlier: &TrackedMessage) -> bool {
        self.normalized.chars().count() >= SPAM_MIN_MESSAGE_LENGTH
            && self.channel_id != earlier.channel_id
            && strsim::levenshtein(&self.normalized, &earlier.normalized) < SPAM_MAX_EDIT_DISTANCE
    }
}

#[derive(Debug)]
struct SpamWindow {
    score: u32,
    messages: VecDeque<TrackedMessage>,
    expires_at: Instant,
    /// Set once the strike threshold has been acted on
    actioned: bool,
}

impl SpamWindow {
    fn new(message: TrackedMessage, expires_at: Instant) -> Self {
        let mut messages = VecDeque::with_capacity(SPAM_MAX_MESSAGES);
        messages.push_back(message);
        Self {
            score: 0,
            messages,
            expires_at,
            actioned: false,
        }
    }
}

/// Result of adding a message to a user's window
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Observation {
    pub score: u32,
    /// Present the first time the score reaches the threshold; holds the
    /// retained messages for cleanup
    pub triggered: Option<Vec<TrackedMessage>>,
}

/// Recent messages per (guild, user), dropped after a period of inactivity
#[derive(Default)]
pub struct SpamTracker {
    windows: DashMap<(GuildId, UserId), SpamWindow>,
}

impl SpamTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a message and score it against the user's earlier ones.
    ///
    /// The window's lifetime is reset to `cooldown` on every message.
    pub fn observe(
        &self,
        guild_id: GuildId,
        user_id: UserId,
        message: TrackedMessage,
        strike_threshold: u32,
        cooldown: Duration,
        now: Instant,
    ) -> Observation {
        let expires_at = now + cooldown;

        let mut window = match self.windows.entry((guild_id, user_id)) {
            Entry::Vacant(vacant) => {
                vacant.insert(SpamWindow::new(message, expires_at));
                return Observation {
                    score: 0,
                    triggered: None,
                };
            }
            Entry::Occupied(mut occupied) => {
                if occupied.get().expires_at <= now {
                    occupied.insert(SpamWindow::new(message, expires_at));
                    return Observation {
                        score: 0,
                        triggered: None,
                    };
                }
                occupied.into_ref()
            }
        };

        let repeated = window
            .messages
            .iter()
            .any(|earlier| message.is_cross_channel_repeat_of(earlier));

        if window.messages.len() >= SPAM_MAX_MESSAGES {
            window.messages.pop_front();
        }
        window.messages.push_back(message);

        if repeated {
            window.score += 1;
        }
        window.expires_at = expires_at;

        let triggered = if window.score >= strike_threshold && !window.actioned {
            window.actioned = true;
            Some(window.messages.iter().cloned().collect())
        } else {
            None
        };

        Observation {
            score: window.score,
            triggered,
        }
    }

    /// Let the threshold fire again after a failed action
    pub fn release(&self, guild_id: GuildId, user_id: UserId) {
        if let Some(mut window) = self.windows.get_mut(&(guild_id, user_id)) {
            window.actioned = false;
        }
    }

    /// Drop windows whose lifetime has passed; returns how many
    pub fn purge_expired(&self, now: Instant) -> usize {
        let before = self.windows.len();
        self.windows.retain(|_, window| window.expires_at > now);
        before.saturating_sub(self.windows.len())
    }

    pub fn score(&self, guild_id: GuildId, user_id: UserId, now: Instant) -> u32 {
        self.windows
            .get(&(guild_id, user_id))
            .filter(|window| window.expires_at > now)
            .map(|window| window.score)
            .unwrap_or(0)
    }

    pub fn message_count(&self, guild_id: GuildId, user_id: UserId) -> usize {
        self.windows
            .get(&(guild_id, user_id))
            .map(|window| window.messages.len())
            .unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }
}
