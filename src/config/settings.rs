use std::env;
use std::time::Duration;

use crate::bot::error::Error;
use crate::constants::defaults::{PACE_CONTROL_TICK, TEMP_BAN_SWEEP_INTERVAL};

#[derive(Debug, Clone)]
pub struct Settings {
    pub discord_token: String,
    /// Absent means the volatile in-memory store is used
    pub database_url: Option<String>,
    pub dev_guild_id: Option<u64>,
    /// Temp ban reaper interval
    pub temp_ban_sweep_interval: Duration,
    /// Pace control evaluation interval
    pub pace_control_tick: Duration,
}

impl Settings {
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build settings from any key lookup (the process environment in production)
    pub fn from_lookup<F>(lookup: F) -> Result<Self, Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let discord_token = lookup("DISCORD_TOKEN")
            .filter(|s| !s.is_empty())
            .ok_or_else(|| Error::Config("DISCORD_TOKEN environment variable not set".to_string()))?;

        let database_url = lookup("DATABASE_URL").filter(|s| !s.is_empty());

        let dev_guild_id = match lookup("DEV_GUILD_ID").filter(|s| !s.is_empty()) {
            Some(raw) => Some(
                raw.parse::<u64>()
                    .map_err(|_| Error::Config(format!("DEV_GUILD_ID is not a valid ID: {}", raw)))?,
            ),
            None => None,
        };

        let temp_ban_sweep_interval = seconds_or(
            &lookup,
            "TEMP_BAN_SWEEP_SECONDS",
            TEMP_BAN_SWEEP_INTERVAL,
        )?;
        let pace_control_tick = seconds_or(&lookup, "PACE_CONTROL_TICK_SECONDS", PACE_CONTROL_TICK)?;

        Ok(Self {
            discord_token,
            database_url,
            dev_guild_id,
            temp_ban_sweep_interval,
            pace_control_tick,
        })
    }
}

fn seconds_or<F>(lookup: &F, key: &str, default: Duration) -> Result<Duration, Error>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key).filter(|s| !s.is_empty()) {
        Some(raw) => match raw.parse::<u64>() {
            Ok(secs) if secs > 0 => Ok(Duration::from_secs(secs)),
            _ => Err(Error::Config(format!(
                "{} must be a positive number of seconds, got {}",
                key, raw
            ))),
        },
        None => Ok(default),
    }
}
