use chrono::{DateTime, Utc};
use serenity::all::{GuildId, UserId};

use crate::bot::error::Error;
use crate::services::infractions::{half_life, short_id};

#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct Infraction {
    pub id: i64,
    pub guild_id: i64,
    pub user_id: i64,
    pub moderator_id: i64,
    pub reason: String,
    pub weight: f64,
    pub timestamp: DateTime<Utc>,
    pub silent: bool,
}

impl Infraction {
    pub fn guild(&self) -> GuildId {
        GuildId::new(self.guild_id as u64)
    }

    pub fn user(&self) -> UserId {
        UserId::new(self.user_id as u64)
    }

    /// The public short ID used to reference this record in commands
    pub fn short_id(&self) -> Result<String, Error> {
        short_id::encode(self.id as u64)
    }

    /// Weight after decay at `now`
    pub fn effective_weight(&self, now: DateTime<Utc>, half_life_days: f64) -> f64 {
        half_life::decay(now - self.timestamp, half_life_days, self.weight)
    }
}

/// Fields supplied when recording an infraction; the store assigns `id`
#[derive(Debug, Clone)]
pub struct NewInfraction {
    pub guild_id: i64,
    pub user_id: i64,
    pub moderator_id: i64,
    pub reason: String,
    pub weight: f64,
    pub timestamp: DateTime<Utc>,
    pub silent: bool,
}
