use chrono::{DateTime, Utc};
use serenity::all::{GuildId, UserId};
use tracing::info;

use crate::bot::error::Error;
use crate::capabilities::ClockHandle;
use crate::db::models::TempBan;
use crate::db::repository::TempBanRepository;
use crate::db::StoreHandle;

/// Durable record of time-limited bans
#[derive(Clone)]
pub struct TempBanService {
    store: StoreHandle,
    clock: ClockHandle,
}

impl TempBanService {
    pub fn new(store: StoreHandle, clock: ClockHandle) -> Self {
        Self { store, clock }
    }

    /// Record (or overwrite) the ban of `user_id` until `until`
    pub async fn upsert(
        &self,
        guild_id: GuildId,
        user_id: UserId,
        actor_id: UserId,
        reason: &str,
        until: DateTime<Utc>,
    ) -> Result<TempBan, Error> {
        let ban = self
            .store
            .upsert_temp_ban(guild_id, user_id, actor_id, reason, until, self.clock.now())
            .await?;

        info!(
            guild_id = %guild_id,
            user_id = %user_id,
            "Temporary ban recorded until {}",
            until
        );
        Ok(ban)
    }

    pub async fn get(&self, guild_id: GuildId, user_id: UserId) -> Result<TempBan, Error> {
        self.store
            .temp_ban(guild_id, user_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("temp ban for user {}", user_id)))
    }

    /// Every temporary ban of a guild, soonest expiry first
    pub async fn for_guild(&self, guild_id: GuildId) -> Result<Vec<TempBan>, Error> {
        self.store.temp_bans_for_guild(guild_id).await
    }

    /// Bans whose expiry has passed
    pub async fn expired(&self) -> Result<Vec<TempBan>, Error> {
        self.store.expired_temp_bans(self.clock.now()).await
    }

    /// Returns whether the record still existed
    pub async fn delete(&self, ban: &TempBan) -> Result<bool, Error> {
        self.store.delete_temp_ban(ban.guild(), ban.user()).await
    }
}
