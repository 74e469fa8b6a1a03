//! Persistence traits the services are written against.
//!
//! `PgStore` implements them on PostgreSQL and `MemoryStore` keeps everything
//! in process memory.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serenity::all::{ChannelId, GuildId, UserId};
use uuid::Uuid;

use crate::bot::error::Error;
use crate::db::models::{
    GuildSettings, Infraction, NewInfraction, PaceControlPolicy, PendingPrune, TempBan,
};

#[async_trait]
pub trait InfractionRepository: Send + Sync {
    /// Insert and return the stored record with its assigned id
    async fn insert_infraction(&self, new: NewInfraction) -> Result<Infraction, Error>;

    /// One page ordered newest first, plus the total count for the pair
    async fn infraction_page(
        &self,
        guild_id: GuildId,
        user_id: UserId,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Infraction>, i64), Error>;

    async fn all_infractions(
        &self,
        guild_id: GuildId,
        user_id: UserId,
    ) -> Result<Vec<Infraction>, Error>;

    /// Delete only if the record belongs to `guild_id`; returns whether a row was removed
    async fn delete_infraction(&self, id: i64, guild_id: GuildId) -> Result<bool, Error>;
}

#[async_trait]
pub trait TempBanRepository: Send + Sync {
    async fn upsert_temp_ban(
        &self,
        guild_id: GuildId,
        user_id: UserId,
        actor_id: UserId,
        reason: &str,
        until: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<TempBan, Error>;

    async fn temp_ban(&self, guild_id: GuildId, user_id: UserId)
        -> Result<Option<TempBan>, Error>;

    async fn temp_bans_for_guild(&self, guild_id: GuildId) -> Result<Vec<TempBan>, Error>;

    /// Bans whose `until` lies strictly before `now`
    async fn expired_temp_bans(&self, now: DateTime<Utc>) -> Result<Vec<TempBan>, Error>;

    /// Returns whether a row was removed
    async fn delete_temp_ban(&self, guild_id: GuildId, user_id: UserId) -> Result<bool, Error>;
}

#[async_trait]
pub trait PaceControlRepository: Send + Sync {
    async fn pace_control(
        &self,
        guild_id: GuildId,
        channel_id: ChannelId,
    ) -> Result<Option<PaceControlPolicy>, Error>;

    async fn enabled_pace_controls(&self, guild_id: GuildId)
        -> Result<Vec<PaceControlPolicy>, Error>;

    async fn upsert_pace_control(&self, policy: &PaceControlPolicy) -> Result<(), Error>;

    async fn delete_pace_control(
        &self,
        guild_id: GuildId,
        channel_id: ChannelId,
    ) -> Result<bool, Error>;
}

#[async_trait]
pub trait GuildSettingsRepository: Send + Sync {
    /// Stored settings, or defaults if the guild has none yet
    async fn guild_settings(&self, guild_id: GuildId) -> Result<GuildSettings, Error>;

    async fn save_guild_settings(&self, settings: &GuildSettings) -> Result<(), Error>;
}

#[async_trait]
pub trait PendingPruneRepository: Send + Sync {
    async fn add_pending_prunes(
        &self,
        guild_id: GuildId,
        prune_id: Uuid,
        user_ids: &[UserId],
        now: DateTime<Utc>,
    ) -> Result<(), Error>;

    /// Members of a batch not yet pruned
    async fn members_to_prune(
        &self,
        guild_id: GuildId,
        prune_id: Uuid,
    ) -> Result<Vec<PendingPrune>, Error>;

    async fn set_member_pruned(
        &self,
        guild_id: GuildId,
        user_id: UserId,
        pruned: bool,
    ) -> Result<(), Error>;

    /// Returns the number of rows removed
    async fn delete_pending_prunes_before(&self, cutoff: DateTime<Utc>) -> Result<u64, Error>;
}

/// Everything the bot persists
pub trait Store:
    InfractionRepository
    + TempBanRepository
    + PaceControlRepository
    + GuildSettingsRepository
    + PendingPruneRepository
{
}

impl<T> Store for T where
    T: InfractionRepository
        + TempBanRepository
        + PaceControlRepository
        + GuildSettingsRepository
        + PendingPruneRepository
{
}

pub type StoreHandle = Arc<dyn Store>;
