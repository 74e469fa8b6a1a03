use chrono::{DateTime, Utc};
use serenity::all::{GuildId, UserId};

#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct TempBan {
    pub guild_id: i64,
    pub user_id: i64,
    pub until: DateTime<Utc>,
    pub reason: String,
    pub actor_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TempBan {
    pub fn guild(&self) -> GuildId {
        GuildId::new(self.guild_id as u64)
    }

    pub fn user(&self) -> UserId {
        UserId::new(self.user_id as u64)
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.until < now
    }
}
