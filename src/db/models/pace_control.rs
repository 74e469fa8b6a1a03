use std::time::Duration;

use serenity::all::{ChannelId, GuildId};

use crate::bot::error::Error;
use crate::constants::defaults::{
    DEFAULT_ACTIVATION_WPM, DEFAULT_MAX_COOLDOWN_SECONDS, DEFAULT_MIN_COOLDOWN_SECONDS,
    DEFAULT_TARGET_WPM, DEFAULT_USER_WINDOW_SECONDS, DEFAULT_WPM_WINDOW_SECONDS,
    MAX_CHANNEL_COOLDOWN_SECONDS, PACE_MAX_RETENTION,
};

/// Per-channel pace control settings
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct PaceControlPolicy {
    pub guild_id: i64,
    pub channel_id: i64,
    pub enabled: bool,
    pub target_wpm: i32,
    pub min_cooldown_seconds: i32,
    pub max_cooldown_seconds: i32,
    /// 0 means always active
    pub activation_wpm: i32,
    pub wpm_window_seconds: i32,
    pub user_window_seconds: i32,
}

impl PaceControlPolicy {
    /// A disabled policy carrying the default tuning
    pub fn new(guild_id: GuildId, channel_id: ChannelId) -> Self {
        Self {
            guild_id: guild_id.get() as i64,
            channel_id: channel_id.get() as i64,
            enabled: false,
            target_wpm: DEFAULT_TARGET_WPM,
            min_cooldown_seconds: DEFAULT_MIN_COOLDOWN_SECONDS,
            max_cooldown_seconds: DEFAULT_MAX_COOLDOWN_SECONDS,
            activation_wpm: DEFAULT_ACTIVATION_WPM,
            wpm_window_seconds: DEFAULT_WPM_WINDOW_SECONDS,
            user_window_seconds: DEFAULT_USER_WINDOW_SECONDS,
        }
    }

    pub fn channel(&self) -> ChannelId {
        ChannelId::new(self.channel_id as u64)
    }

    /// Word-rate window; non-positive values fall back to the default
    pub fn wpm_window(&self) -> Duration {
        window_or_default(self.wpm_window_seconds, DEFAULT_WPM_WINDOW_SECONDS)
    }

    /// Active-author window; non-positive values fall back to the default
    pub fn user_window(&self) -> Duration {
        window_or_default(self.user_window_seconds, DEFAULT_USER_WINDOW_SECONDS)
    }

    pub fn validate(&self) -> Result<(), Error> {
        if self.target_wpm <= 0 {
            return Err(Error::invalid_input("target WPM must be greater than 0"));
        }
        if self.min_cooldown_seconds < 0 {
            return Err(Error::invalid_input("minimum cooldown cannot be negative"));
        }
        if self.max_cooldown_seconds < self.min_cooldown_seconds {
            return Err(Error::invalid_input(
                "maximum cooldown must be at least the minimum cooldown",
            ));
        }
        if self.max_cooldown_seconds > MAX_CHANNEL_COOLDOWN_SECONDS {
            return Err(Error::invalid_input(format!(
                "maximum cooldown cannot exceed {} seconds",
                MAX_CHANNEL_COOLDOWN_SECONDS
            )));
        }
        if self.activation_wpm < 0 {
            return Err(Error::invalid_input("activation WPM cannot be negative"));
        }

        let retention = PACE_MAX_RETENTION.as_secs() as i32;
        for (name, value) in [
            ("WPM window", self.wpm_window_seconds),
            ("user window", self.user_window_seconds),
        ] {
            if value <= 0 || value > retention {
                return Err(Error::invalid_input(format!(
                    "{} must be between 1 and {} seconds",
                    name, retention
                )));
            }
        }

        Ok(())
    }
}

fn window_or_default(seconds: i32, default: i32) -> Duration {
    let seconds = if seconds <= 0 { default } else { seconds };
    Duration::from_secs(seconds as u64)
}
