use std::time::Instant;

use dashmap::DashMap;
use tracing::{debug, error, warn};

use crate::capabilities::ChatCapability;
use crate::db::models::PaceControlPolicy;
use crate::db::repository::Store;
use crate::services::pace::tracker::{PaceKey, PaceStats, PaceTracker};

/// Cooldown a channel should move toward given its measured activity
pub fn compute_ideal(
    measured_wpm: i32,
    active_users: usize,
    policy: &PaceControlPolicy,
    prev: i32,
) -> i32 {
    let (min, max) = (policy.min_cooldown_seconds, policy.max_cooldown_seconds);

    if policy.target_wpm <= 0 {
        return prev;
    }
    // Dormant below the activation rate
    if policy.activation_wpm > 0 && measured_wpm < policy.activation_wpm {
        return min;
    }
    if measured_wpm <= policy.target_wpm {
        return min;
    }

    let users = active_users.max(1) as f64;
    let avg_words_per_message = f64::from(measured_wpm) / users;
    let ideal = (users * 60.0) / (f64::from(policy.target_wpm) / avg_words_per_message);

    (ideal as i32).max(min).min(max)
}

/// Move half way from `prev` to `ideal`, always by at least one second
pub fn next_cooldown(prev: i32, ideal: i32, policy: &PaceControlPolicy) -> i32 {
    let diff = ideal - prev;
    let step = (diff + diff.signum()) / 2;

    (prev + step)
        .max(policy.min_cooldown_seconds)
        .min(policy.max_cooldown_seconds)
}

/// Periodically turns each channel's activity into a slow-mode interval.
///
/// Remembers the last interval applied per channel so unchanged values are
/// never re-sent. A failed update is retried on the next tick.
#[derive(Default)]
pub struct PaceEvaluator {
    last_applied: DashMap<PaceKey, i32>,
}

impl PaceEvaluator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_applied(&self, key: PaceKey) -> Option<i32> {
        self.last_applied.get(&key).map(|v| *v)
    }

    /// The cooldown to apply for one channel, or `None` if it should stay as is
    pub fn plan(&self, key: PaceKey, policy: &PaceControlPolicy, stats: PaceStats) -> Option<i32> {
        let wpm_window = policy.wpm_window();
        // Whole words per minute; a fractional excess never counts as above target
        let measured_wpm = (stats.words as f64 * 60.0 / wpm_window.as_secs_f64()) as i32;

        let prev = self.last_applied(key).unwrap_or(0);
        let ideal = compute_ideal(measured_wpm, stats.unique_authors, policy, prev);
        let next = next_cooldown(prev, ideal, policy);

        debug!(
            guild_id = %key.guild_id,
            channel_id = %key.channel_id,
            "Pace: {} wpm from {} users, cooldown {}s -> {}s (ideal {}s)",
            measured_wpm,
            stats.unique_authors,
            prev,
            next,
            ideal
        );

        (next != prev).then_some(next)
    }

    /// Evaluate every tracked channel once. Returns how many cooldowns changed.
    pub async fn tick(
        &self,
        tracker: &PaceTracker,
        store: &dyn Store,
        chat: &dyn ChatCapability,
        now: Instant,
    ) -> usize {
        let keys = tracker.active_keys();
        debug!("Pace: evaluating {} channels", keys.len());

        let mut changed = 0;
        for key in keys {
            let policy = match store.pace_control(key.guild_id, key.channel_id).await {
                Ok(Some(policy)) if policy.enabled => policy,
                Ok(_) => continue,
                Err(e) => {
                    error!(
                        guild_id = %key.guild_id,
                        channel_id = %key.channel_id,
                        "Failed to load pace control policy: {}",
                        e
                    );
                    continue;
                }
            };

            let stats = tracker.stats(key, policy.wpm_window(), policy.user_window(), now);
            let Some(next) = self.plan(key, &policy, stats) else {
                continue;
            };

            let Ok(seconds) = u16::try_from(next) else {
                warn!(channel_id = %key.channel_id, "Cooldown {}s is out of range", next);
                continue;
            };

            match chat.set_channel_cooldown(key.channel_id, seconds).await {
                Ok(()) => {
                    self.last_applied.insert(key, next);
                    changed += 1;
                }
                Err(e) => {
                    warn!(
                        guild_id = %key.guild_id,
                        channel_id = %key.channel_id,
                        "Failed to set slow mode: {}",
                        e
                    );
                }
            }
        }

        changed
    }

    /// Forget channels with no recent activity whose cooldown is already back
    /// at zero. Returns how many were dropped.
    pub fn forget_settled(&self, tracker: &PaceTracker, now: Instant) -> usize {
        let removed = tracker.forget_idle(now, |key| {
            self.last_applied.get(key).map_or(true, |applied| *applied == 0)
        });

        for key in &removed {
            self.last_applied.remove(key);
        }
        removed.len()
    }
}
