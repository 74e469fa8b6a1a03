use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use parking_lot::Mutex;
use serenity::all::{ChannelId, GuildId, UserId};
use tracing::debug;

use crate::bot::error::Error;
use crate::constants::defaults::PACE_MAX_RETENTION;

/// Identifies one channel's buffer, displayed as `guild_id:channel_id`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PaceKey {
    pub guild_id: GuildId,
    pub channel_id: ChannelId,
}

impl PaceKey {
    pub fn new(guild_id: GuildId, channel_id: ChannelId) -> Self {
        Self {
            guild_id,
            channel_id,
        }
    }
}

impl fmt::Display for PaceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.guild_id, self.channel_id)
    }
}

impl FromStr for PaceKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || Error::invalid_input(format!("malformed pace key {:?}", s));

        let (guild, channel) = s.split_once(':').ok_or_else(malformed)?;
        let guild: u64 = guild.parse().map_err(|_| malformed())?;
        let channel: u64 = channel.parse().map_err(|_| malformed())?;
        if guild == 0 || channel == 0 {
            return Err(malformed());
        }

        Ok(Self::new(GuildId::new(guild), ChannelId::new(channel)))
    }
}

#[derive(Debug, Clone, Copy)]
struct PaceEntry {
    timestamp: Instant,
    word_count: usize,
    author_id: UserId,
}

/// Aggregates over a channel's recent messages
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PaceStats {
    pub words: usize,
    pub unique_authors: usize,
}

/// Rolling per-channel record of message activity.
///
/// Entries are kept in arrival order and anything older than the retention
/// period is pruned on every write and read. Nothing survives a restart.
pub struct PaceTracker {
    buffers: DashMap<PaceKey, Arc<Mutex<Vec<PaceEntry>>>>,
    retention: Duration,
}

impl Default for PaceTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl PaceTracker {
    pub fn new() -> Self {
        Self::with_retention(PACE_MAX_RETENTION)
    }

    pub fn with_retention(retention: Duration) -> Self {
        Self {
            buffers: DashMap::new(),
            retention,
        }
    }

    pub fn retention(&self) -> Duration {
        self.retention
    }

    /// Record a message; returns its word count (0 means it was ignored)
    pub fn record(&self, key: PaceKey, content: &str, author_id: UserId, now: Instant) -> usize {
        let word_count = content.split_whitespace().count();
        if word_count == 0 {
            return 0;
        }

        // Holding the map entry while appending keeps a concurrent idle sweep
        // from dropping the buffer under us
        let buffer = self.buffers.entry(key).or_insert_with(|| {
            debug!("Tracking pace of channel {}", key);
            Arc::new(Mutex::new(Vec::new()))
        });
        let mut entries = buffer.lock();
        entries.push(PaceEntry {
            timestamp: now,
            word_count,
            author_id,
        });
        prune(&mut entries, now, self.retention);

        word_count
    }

    /// Words within `wpm_window` and distinct authors within `user_window` of `now`
    pub fn stats(
        &self,
        key: PaceKey,
        wpm_window: Duration,
        user_window: Duration,
        now: Instant,
    ) -> PaceStats {
        let Some(buffer) = self.buffers.get(&key).map(|b| b.value().clone()) else {
            return PaceStats::default();
        };

        let mut entries = buffer.lock();
        prune(&mut entries, now, self.retention);

        let mut words = 0;
        let mut authors = HashSet::new();
        for entry in entries.iter() {
            let age = now.saturating_duration_since(entry.timestamp);
            if age <= wpm_window {
                words += entry.word_count;
            }
            if age <= user_window {
                authors.insert(entry.author_id);
            }
        }

        PaceStats {
            words,
            unique_authors: authors.len(),
        }
    }

    pub fn active_keys(&self) -> Vec<PaceKey> {
        self.buffers.iter().map(|entry| *entry.key()).collect()
    }

    /// Number of retained entries for a channel
    pub fn len(&self, key: PaceKey) -> usize {
        self.buffers
            .get(&key)
            .map(|buffer| buffer.lock().len())
            .unwrap_or(0)
    }

    /// Drop buffers left empty after pruning, if `may_forget` agrees.
    /// Returns the keys removed.
    pub fn forget_idle<F>(&self, now: Instant, may_forget: F) -> Vec<PaceKey>
    where
        F: Fn(&PaceKey) -> bool,
    {
        let mut removed = Vec::new();
        for key in self.active_keys() {
            let gone = self.buffers.remove_if(&key, |key, buffer| {
                let mut entries = buffer.lock();
                prune(&mut entries, now, self.retention);
                entries.is_empty() && may_forget(key)
            });
            if gone.is_some() {
                removed.push(key);
            }
        }
        removed
    }
}

/// Drop entries older than `retention`; entries are ordered by arrival
fn prune(entries: &mut Vec<PaceEntry>, now: Instant, retention: Duration) {
    let expired =
        entries.partition_point(|e| now.saturating_duration_since(e.timestamp) > retention);
    if expired > 0 {
        entries.drain(..expired);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key() -> PaceKey {
        PaceKey::new(GuildId::new(1), ChannelId::new(2))
    }

    #[test]
    fn test_key_display_and_parse() {
        assert_eq!(key().to_string(), "1:2");
        assert_eq!("1:2".parse::<PaceKey>().unwrap(), key());
        assert!("12".parse::<PaceKey>().is_err());
        assert!("a:2".parse::<PaceKey>().is_err());
        assert!("0:2".parse::<PaceKey>().is_err());
        assert!("1:2:3".parse::<PaceKey>().is_err());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_writers_share_one_buffer() {
        let tracker = Arc::new(PaceTracker::new());

        let writers: Vec<_> = (1..=8u64)
            .map(|author| {
                let tracker = tracker.clone();
                tokio::spawn(async move {
                    for _ in 0..25 {
                        tracker.record(key(), "two words", UserId::new(author), Instant::now());
                        tokio::task::yield_now().await;
                    }
                })
            })
            .collect();
        for writer in writers {
            writer.await.unwrap();
        }

        assert_eq!(tracker.active_keys(), vec![key()]);
        assert_eq!(tracker.len(key()), 200);

        let window = Duration::from_secs(60);
        let stats = tracker.stats(key(), window, window, Instant::now());
        assert_eq!(stats, PaceStats { words: 400, unique_authors: 8 });
    }

    #[test]
    fn test_blank_messages_are_ignored() {
        let tracker = PaceTracker::new();
        let now = Instant::now();
        assert_eq!(tracker.record(key(), "", UserId::new(1), now), 0);
        assert_eq!(tracker.record(key(), " \t\n ", UserId::new(1), now), 0);
        assert!(tracker.active_keys().is_empty());

        assert_eq!(tracker.record(key(), "three  word\tmessage", UserId::new(1), now), 3);
        assert_eq!(tracker.active_keys(), vec![key()]);
    }

    #[test]
    fn test_buffer_is_bounded_by_retention() {
        let tracker = PaceTracker::with_retention(Duration::from_secs(60));
        let start = Instant::now();

        // One message every 10 seconds for 10 minutes
        for i in 0..60 {
            let now = start + Duration::from_secs(i * 10);
            tracker.record(key(), "hello there", UserId::new(1), now);
        }

        // Messages at 530s..=590s are within 60s of 590s
        assert_eq!(tracker.len(key()), 7);
    }

    #[test]
    fn test_windowed_stats() {
        let tracker = PaceTracker::new();
        let start = Instant::now();

        tracker.record(key(), "one two three four", UserId::new(1), start);
        tracker.record(key(), "five six", UserId::new(2), start + Duration::from_secs(70));
        tracker.record(key(), "seven", UserId::new(3), start + Duration::from_secs(100));

        let now = start + Duration::from_secs(110);
        let stats = tracker.stats(key(), Duration::from_secs(60), Duration::from_secs(120), now);
        assert_eq!(
            stats,
            PaceStats {
                words: 3,
                unique_authors: 3
            }
        );

        let stats = tracker.stats(key(), Duration::from_secs(60), Duration::from_secs(30), now);
        assert_eq!(stats.unique_authors, 1);

        // Everything has aged out
        let later = start + Duration::from_secs(1000);
        let stats = tracker.stats(key(), Duration::from_secs(60), Duration::from_secs(120), later);
        assert_eq!(stats, PaceStats::default());
        assert_eq!(tracker.len(key()), 0);
    }

    #[test]
    fn test_unknown_key_has_no_stats() {
        let tracker = PaceTracker::new();
        let stats = tracker.stats(
            key(),
            Duration::from_secs(60),
            Duration::from_secs(120),
            Instant::now(),
        );
        assert_eq!(stats, PaceStats::default());
    }

    #[test]
    fn test_forget_idle() {
        let tracker = PaceTracker::with_retention(Duration::from_secs(60));
        let start = Instant::now();
        let other = PaceKey::new(GuildId::new(1), ChannelId::new(3));

        tracker.record(key(), "old news", UserId::new(1), start);
        tracker.record(other, "fresh news", UserId::new(1), start + Duration::from_secs(100));

        let now = start + Duration::from_secs(120);
        assert!(tracker.forget_idle(now, |_| false).is_empty());
        assert_eq!(tracker.forget_idle(now, |_| true), vec![key()]);
        assert_eq!(tracker.active_keys(), vec![other]);
    }
}
