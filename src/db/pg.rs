use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serenity::all::{ChannelId, GuildId, UserId};
use sqlx::PgPool;
use uuid::Uuid;

use crate::bot::error::Error;
use crate::db::models::{
    GuildSettings, Infraction, NewInfraction, PaceControlPolicy, PendingPrune, TempBan,
};
use crate::db::queries::{guild_settings, infraction, pace_control, pending_prune, temp_ban};
use crate::db::repository::{
    GuildSettingsRepository, InfractionRepository, PaceControlRepository, PendingPruneRepository,
    TempBanRepository,
};

/// PostgreSQL-backed store
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl InfractionRepository for PgStore {
    async fn insert_infraction(&self, new: NewInfraction) -> Result<Infraction, Error> {
        Ok(infraction::create(&self.pool, &new).await?)
    }

    async fn infraction_page(
        &self,
        guild_id: GuildId,
        user_id: UserId,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Infraction>, i64), Error> {
        Ok(infraction::get_page(
            &self.pool,
            guild_id.get() as i64,
            user_id.get() as i64,
            limit,
            offset,
        )
        .await?)
    }

    async fn all_infractions(
        &self,
        guild_id: GuildId,
        user_id: UserId,
    ) -> Result<Vec<Infraction>, Error> {
        Ok(infraction::get_all(&self.pool, guild_id.get() as i64, user_id.get() as i64).await?)
    }

    async fn delete_infraction(&self, id: i64, guild_id: GuildId) -> Result<bool, Error> {
        Ok(infraction::delete(&self.pool, id, guild_id.get() as i64).await?)
    }
}

#[async_trait]
impl TempBanRepository for PgStore {
    async fn upsert_temp_ban(
        &self,
        guild_id: GuildId,
        user_id: UserId,
        actor_id: UserId,
        reason: &str,
        until: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<TempBan, Error> {
        Ok(temp_ban::upsert(
            &self.pool,
            guild_id.get() as i64,
            user_id.get() as i64,
            actor_id.get() as i64,
            reason,
            until,
            now,
        )
        .await?)
    }

    async fn temp_ban(
        &self,
        guild_id: GuildId,
        user_id: UserId,
    ) -> Result<Option<TempBan>, Error> {
        Ok(temp_ban::get(&self.pool, guild_id.get() as i64, user_id.get() as i64).await?)
    }

    async fn temp_bans_for_guild(&self, guild_id: GuildId) -> Result<Vec<TempBan>, Error> {
        Ok(temp_ban::get_for_guild(&self.pool, guild_id.get() as i64).await?)
    }

    async fn expired_temp_bans(&self, now: DateTime<Utc>) -> Result<Vec<TempBan>, Error> {
        Ok(temp_ban::get_expired(&self.pool, now).await?)
    }

    async fn delete_temp_ban(&self, guild_id: GuildId, user_id: UserId) -> Result<bool, Error> {
        Ok(temp_ban::delete(&self.pool, guild_id.get() as i64, user_id.get() as i64).await?)
    }
}

#[async_trait]
impl PaceControlRepository for PgStore {
    async fn pace_control(
        &self,
        guild_id: GuildId,
        channel_id: ChannelId,
    ) -> Result<Option<PaceControlPolicy>, Error> {
        Ok(pace_control::get(&self.pool, guild_id.get() as i64, channel_id.get() as i64).await?)
    }

    async fn enabled_pace_controls(
        &self,
        guild_id: GuildId,
    ) -> Result<Vec<PaceControlPolicy>, Error> {
        Ok(pace_control::get_enabled_for_guild(&self.pool, guild_id.get() as i64).await?)
    }

    async fn upsert_pace_control(&self, policy: &PaceControlPolicy) -> Result<(), Error> {
        Ok(pace_control::upsert(&self.pool, policy).await?)
    }

    async fn delete_pace_control(
        &self,
        guild_id: GuildId,
        channel_id: ChannelId,
    ) -> Result<bool, Error> {
        Ok(pace_control::delete(&self.pool, guild_id.get() as i64, channel_id.get() as i64).await?)
    }
}

#[async_trait]
impl GuildSettingsRepository for PgStore {
    async fn guild_settings(&self, guild_id: GuildId) -> Result<GuildSettings, Error> {
        Ok(guild_settings::get_or_create(&self.pool, guild_id.get() as i64).await?)
    }

    async fn save_guild_settings(&self, settings: &GuildSettings) -> Result<(), Error> {
        Ok(guild_settings::save(&self.pool, settings).await?)
    }
}

#[async_trait]
impl PendingPruneRepository for PgStore {
    async fn add_pending_prunes(
        &self,
        guild_id: GuildId,
        prune_id: Uuid,
        user_ids: &[UserId],
        now: DateTime<Utc>,
    ) -> Result<(), Error> {
        let user_ids: Vec<i64> = user_ids.iter().map(|id| id.get() as i64).collect();
        Ok(pending_prune::add_members(&self.pool, guild_id.get() as i64, prune_id, &user_ids, now).await?)
    }

    async fn members_to_prune(
        &self,
        guild_id: GuildId,
        prune_id: Uuid,
    ) -> Result<Vec<PendingPrune>, Error> {
        Ok(pending_prune::get_unpruned(&self.pool, guild_id.get() as i64, prune_id).await?)
    }

    async fn set_member_pruned(
        &self,
        guild_id: GuildId,
        user_id: UserId,
        pruned: bool,
    ) -> Result<(), Error> {
        Ok(pending_prune::set_pruned(
            &self.pool,
            guild_id.get() as i64,
            user_id.get() as i64,
            pruned,
        )
        .await?)
    }

    async fn delete_pending_prunes_before(&self, cutoff: DateTime<Utc>) -> Result<u64, Error> {
        Ok(pending_prune::delete_before(&self.pool, cutoff).await?)
    }
}
