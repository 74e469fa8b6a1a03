use chrono::{DateTime, Utc};
use serenity::all::{ChannelId, GuildId};

use crate::bot::error::Error;
use crate::constants::defaults::{
    DEFAULT_NOTIFY_SEVERITY_THRESHOLD, DEFAULT_SPAM_COOLDOWN_SECONDS,
    DEFAULT_SPAM_STRIKE_THRESHOLD, SPAM_COOLDOWN_SECONDS_RANGE, SPAM_STRIKE_THRESHOLD_RANGE,
};

#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct GuildSettings {
    pub guild_id: i64,
    /// Where moderator notifications go
    pub moderator_channel_id: Option<i64>,
    /// 0 disables decay
    pub infraction_half_life_days: f64,
    pub notify_on_warned_user_join: bool,
    pub notify_warn_severity_threshold: f64,
    pub anti_spam_enabled: bool,
    pub anti_spam_count: i32,
    pub anti_spam_cooldown_seconds: i32,
    pub updated_at: DateTime<Utc>,
}

impl GuildSettings {
    pub fn new(guild_id: GuildId, now: DateTime<Utc>) -> Self {
        Self {
            guild_id: guild_id.get() as i64,
            moderator_channel_id: None,
            infraction_half_life_days: 0.0,
            notify_on_warned_user_join: false,
            notify_warn_severity_threshold: DEFAULT_NOTIFY_SEVERITY_THRESHOLD,
            anti_spam_enabled: false,
            anti_spam_count: DEFAULT_SPAM_STRIKE_THRESHOLD,
            anti_spam_cooldown_seconds: DEFAULT_SPAM_COOLDOWN_SECONDS,
            updated_at: now,
        }
    }

    pub fn moderator_channel(&self) -> Option<ChannelId> {
        self.moderator_channel_id
            .filter(|id| *id != 0)
            .map(|id| ChannelId::new(id as u64))
    }

    pub fn set_half_life_days(&mut self, days: f64) -> Result<(), Error> {
        if !days.is_finite() || days < 0.0 {
            return Err(Error::invalid_input("half-life must be zero or a positive number of days"));
        }
        self.infraction_half_life_days = days;
        Ok(())
    }

    /// Update anti-spam tuning; `None` leaves a value unchanged
    pub fn set_anti_spam(
        &mut self,
        enabled: Option<bool>,
        count: Option<i32>,
        cooldown_seconds: Option<i32>,
    ) -> Result<(), Error> {
        if let Some(count) = count {
            let (lo, hi) = SPAM_STRIKE_THRESHOLD_RANGE;
            if !(lo..=hi).contains(&count) {
                return Err(Error::invalid_input(format!(
                    "anti-spam count must be between {} and {}",
                    lo, hi
                )));
            }
        }
        if let Some(cooldown) = cooldown_seconds {
            let (lo, hi) = SPAM_COOLDOWN_SECONDS_RANGE;
            if !(lo..=hi).contains(&cooldown) {
                return Err(Error::invalid_input(format!(
                    "anti-spam cooldown must be between {} and {} seconds",
                    lo, hi
                )));
            }
        }

        if let Some(enabled) = enabled {
            self.anti_spam_enabled = enabled;
        }
        if let Some(count) = count {
            self.anti_spam_count = count;
        }
        if let Some(cooldown) = cooldown_seconds {
            self.anti_spam_cooldown_seconds = cooldown;
        }
        Ok(())
    }
}
