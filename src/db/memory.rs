//! Volatile store used when no database is configured, and by the tests.

use std::cmp::Reverse;
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serenity::all::{ChannelId, GuildId, UserId};
use uuid::Uuid;

use crate::bot::error::Error;
use crate::db::models::{
    GuildSettings, Infraction, NewInfraction, PaceControlPolicy, PendingPrune, TempBan,
};
use crate::db::repository::{
    GuildSettingsRepository, InfractionRepository, PaceControlRepository, PendingPruneRepository,
    TempBanRepository,
};

pub struct MemoryStore {
    next_infraction_id: AtomicI64,
    infractions: DashMap<i64, Infraction>,
    /// (guild_id, user_id) -> ban
    temp_bans: DashMap<(i64, i64), TempBan>,
    /// (guild_id, channel_id) -> policy
    pace_controls: DashMap<(i64, i64), PaceControlPolicy>,
    guild_settings: DashMap<i64, GuildSettings>,
    /// (guild_id, prune_id, user_id) -> entry
    pending_prunes: DashMap<(i64, Uuid, i64), PendingPrune>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            next_infraction_id: AtomicI64::new(1),
            infractions: DashMap::new(),
            temp_bans: DashMap::new(),
            pace_controls: DashMap::new(),
            guild_settings: DashMap::new(),
            pending_prunes: DashMap::new(),
        }
    }

    fn sorted_infractions(&self, guild_id: i64, user_id: i64) -> Vec<Infraction> {
        let mut infractions: Vec<Infraction> = self
            .infractions
            .iter()
            .filter(|entry| entry.guild_id == guild_id && entry.user_id == user_id)
            .map(|entry| entry.value().clone())
            .collect();

        infractions.sort_by_key(|inf| Reverse((inf.timestamp, inf.id)));
        infractions
    }
}

#[async_trait]
impl InfractionRepository for MemoryStore {
    async fn insert_infraction(&self, new: NewInfraction) -> Result<Infraction, Error> {
        let id = self.next_infraction_id.fetch_add(1, Ordering::SeqCst);
        let infraction = Infraction {
            id,
            guild_id: new.guild_id,
            user_id: new.user_id,
            moderator_id: new.moderator_id,
            reason: new.reason,
            weight: new.weight,
            timestamp: new.timestamp,
            silent: new.silent,
        };

        self.infractions.insert(id, infraction.clone());
        Ok(infraction)
    }

    async fn infraction_page(
        &self,
        guild_id: GuildId,
        user_id: UserId,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Infraction>, i64), Error> {
        let all = self.sorted_infractions(guild_id.get() as i64, user_id.get() as i64);
        let total = all.len() as i64;
        let page = all
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect();

        Ok((page, total))
    }

    async fn all_infractions(
        &self,
        guild_id: GuildId,
        user_id: UserId,
    ) -> Result<Vec<Infraction>, Error> {
        Ok(self.sorted_infractions(guild_id.get() as i64, user_id.get() as i64))
    }

    async fn delete_infraction(&self, id: i64, guild_id: GuildId) -> Result<bool, Error> {
        let guild_id = guild_id.get() as i64;
        Ok(self
            .infractions
            .remove_if(&id, |_, inf| inf.guild_id == guild_id)
            .is_some())
    }
}

#[async_trait]
impl TempBanRepository for MemoryStore {
    async fn upsert_temp_ban(
        &self,
        guild_id: GuildId,
        user_id: UserId,
        actor_id: UserId,
        reason: &str,
        until: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<TempBan, Error> {
        let key = (guild_id.get() as i64, user_id.get() as i64);
        let mut entry = self.temp_bans.entry(key).or_insert_with(|| TempBan {
            guild_id: key.0,
            user_id: key.1,
            until,
            reason: String::new(),
            actor_id: 0,
            created_at: now,
            updated_at: now,
        });

        entry.until = until;
        entry.reason = reason.to_string();
        entry.actor_id = actor_id.get() as i64;
        entry.updated_at = now;

        Ok(entry.clone())
    }

    async fn temp_ban(
        &self,
        guild_id: GuildId,
        user_id: UserId,
    ) -> Result<Option<TempBan>, Error> {
        Ok(self
            .temp_bans
            .get(&(guild_id.get() as i64, user_id.get() as i64))
            .map(|entry| entry.value().clone()))
    }

    async fn temp_bans_for_guild(&self, guild_id: GuildId) -> Result<Vec<TempBan>, Error> {
        let guild_id = guild_id.get() as i64;
        let mut bans: Vec<TempBan> = self
            .temp_bans
            .iter()
            .filter(|entry| entry.guild_id == guild_id)
            .map(|entry| entry.value().clone())
            .collect();
        bans.sort_by_key(|ban| ban.until);
        Ok(bans)
    }

    async fn expired_temp_bans(&self, now: DateTime<Utc>) -> Result<Vec<TempBan>, Error> {
        let mut bans: Vec<TempBan> = self
            .temp_bans
            .iter()
            .filter(|entry| entry.is_expired(now))
            .map(|entry| entry.value().clone())
            .collect();
        bans.sort_by_key(|ban| ban.until);
        Ok(bans)
    }

    async fn delete_temp_ban(&self, guild_id: GuildId, user_id: UserId) -> Result<bool, Error> {
        Ok(self
            .temp_bans
            .remove(&(guild_id.get() as i64, user_id.get() as i64))
            .is_some())
    }
}

#[async_trait]
impl PaceControlRepository for MemoryStore {
    async fn pace_control(
        &self,
        guild_id: GuildId,
        channel_id: ChannelId,
    ) -> Result<Option<PaceControlPolicy>, Error> {
        Ok(self
            .pace_controls
            .get(&(guild_id.get() as i64, channel_id.get() as i64))
            .map(|entry| entry.value().clone()))
    }

    async fn enabled_pace_controls(
        &self,
        guild_id: GuildId,
    ) -> Result<Vec<PaceControlPolicy>, Error> {
        let guild_id = guild_id.get() as i64;
        let mut policies: Vec<PaceControlPolicy> = self
            .pace_controls
            .iter()
            .filter(|entry| entry.guild_id == guild_id && entry.enabled)
            .map(|entry| entry.value().clone())
            .collect();
        policies.sort_by_key(|pc| pc.channel_id);
        Ok(policies)
    }

    async fn upsert_pace_control(&self, policy: &PaceControlPolicy) -> Result<(), Error> {
        self.pace_controls
            .insert((policy.guild_id, policy.channel_id), policy.clone());
        Ok(())
    }

    async fn delete_pace_control(
        &self,
        guild_id: GuildId,
        channel_id: ChannelId,
    ) -> Result<bool, Error> {
        Ok(self
            .pace_controls
            .remove(&(guild_id.get() as i64, channel_id.get() as i64))
            .is_some())
    }
}

#[async_trait]
impl GuildSettingsRepository for MemoryStore {
    async fn guild_settings(&self, guild_id: GuildId) -> Result<GuildSettings, Error> {
        Ok(self
            .guild_settings
            .entry(guild_id.get() as i64)
            .or_insert_with(|| GuildSettings::new(guild_id, Utc::now()))
            .clone())
    }

    async fn save_guild_settings(&self, settings: &GuildSettings) -> Result<(), Error> {
        let mut settings = settings.clone();
        settings.updated_at = Utc::now();
        self.guild_settings.insert(settings.guild_id, settings);
        Ok(())
    }
}

#[async_trait]
impl PendingPruneRepository for MemoryStore {
    async fn add_pending_prunes(
        &self,
        guild_id: GuildId,
        prune_id: Uuid,
        user_ids: &[UserId],
        now: DateTime<Utc>,
    ) -> Result<(), Error> {
        let guild_id = guild_id.get() as i64;
        for user_id in user_ids {
            let user_id = user_id.get() as i64;
            self.pending_prunes
                .entry((guild_id, prune_id, user_id))
                .or_insert_with(|| PendingPrune {
                    guild_id,
                    prune_id,
                    user_id,
                    timestamp: now,
                    pruned: false,
                });
        }
        Ok(())
    }

    async fn members_to_prune(
        &self,
        guild_id: GuildId,
        prune_id: Uuid,
    ) -> Result<Vec<PendingPrune>, Error> {
        let guild_id = guild_id.get() as i64;
        Ok(self
            .pending_prunes
            .iter()
            .filter(|entry| {
                entry.guild_id == guild_id && entry.prune_id == prune_id && !entry.pruned
            })
            .map(|entry| entry.value().clone())
            .collect())
    }

    async fn set_member_pruned(
        &self,
        guild_id: GuildId,
        user_id: UserId,
        pruned: bool,
    ) -> Result<(), Error> {
        let (guild_id, user_id) = (guild_id.get() as i64, user_id.get() as i64);
        for mut entry in self.pending_prunes.iter_mut() {
            if entry.guild_id == guild_id && entry.user_id == user_id {
                entry.pruned = pruned;
            }
        }
        Ok(())
    }

    async fn delete_pending_prunes_before(&self, cutoff: DateTime<Utc>) -> Result<u64, Error> {
        let before = self.pending_prunes.len();
        self.pending_prunes.retain(|_, entry| entry.timestamp >= cutoff);
        Ok((before - self.pending_prunes.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn new_infraction(guild: u64, user: u64, timestamp: DateTime<Utc>) -> NewInfraction {
        NewInfraction {
            guild_id: guild as i64,
            user_id: user as i64,
            moderator_id: 99,
            reason: "spamming".to_string(),
            weight: 1.0,
            timestamp,
            silent: false,
        }
    }

    #[tokio::test]
    async fn test_infraction_ids_are_distinct() {
        let store = MemoryStore::new();
        let now = Utc::now();
        let a = store.insert_infraction(new_infraction(1, 2, now)).await.unwrap();
        let b = store.insert_infraction(new_infraction(1, 2, now)).await.unwrap();
        assert!(b.id > a.id);
    }

    #[tokio::test]
    async fn test_page_order_and_ties() {
        let store = MemoryStore::new();
        let now = Utc::now();
        let older = store
            .insert_infraction(new_infraction(1, 2, now - Duration::hours(1)))
            .await
            .unwrap();
        let first_tie = store.insert_infraction(new_infraction(1, 2, now)).await.unwrap();
        let second_tie = store.insert_infraction(new_infraction(1, 2, now)).await.unwrap();
        // Another user's record never shows up
        store.insert_infraction(new_infraction(1, 3, now)).await.unwrap();

        let (page, total) = store
            .infraction_page(GuildId::new(1), UserId::new(2), 2, 0)
            .await
            .unwrap();
        assert_eq!(total, 3);
        assert_eq!(
            page.iter().map(|i| i.id).collect::<Vec<_>>(),
            vec![second_tie.id, first_tie.id]
        );

        let (page, _) = store
            .infraction_page(GuildId::new(1), UserId::new(2), 2, 2)
            .await
            .unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].id, older.id);
    }

    #[tokio::test]
    async fn test_delete_is_guild_scoped() {
        let store = MemoryStore::new();
        let inf = store
            .insert_infraction(new_infraction(1, 2, Utc::now()))
            .await
            .unwrap();

        assert!(!store.delete_infraction(inf.id, GuildId::new(7)).await.unwrap());
        assert_eq!(store.all_infractions(GuildId::new(1), UserId::new(2)).await.unwrap().len(), 1);

        assert!(store.delete_infraction(inf.id, GuildId::new(1)).await.unwrap());
        assert!(!store.delete_infraction(inf.id, GuildId::new(1)).await.unwrap());
    }

    #[tokio::test]
    async fn test_temp_ban_upsert_overwrites() {
        let store = MemoryStore::new();
        let now = Utc::now();
        let (guild, user) = (GuildId::new(1), UserId::new(2));

        let first = store
            .upsert_temp_ban(guild, user, UserId::new(3), "first", now + Duration::hours(1), now)
            .await
            .unwrap();
        let later = now + Duration::minutes(5);
        let second = store
            .upsert_temp_ban(guild, user, UserId::new(4), "second", now + Duration::days(1), later)
            .await
            .unwrap();

        assert_eq!(second.created_at, first.created_at);
        assert_eq!(second.updated_at, later);
        assert_eq!(second.reason, "second");
        assert_eq!(second.actor_id, 4);
        assert_eq!(store.temp_bans_for_guild(guild).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_expired_is_strict() {
        let store = MemoryStore::new();
        let now = Utc::now();
        store
            .upsert_temp_ban(GuildId::new(1), UserId::new(2), UserId::new(3), "", now, now)
            .await
            .unwrap();

        assert!(store.expired_temp_bans(now).await.unwrap().is_empty());
        assert_eq!(
            store
                .expired_temp_bans(now + Duration::seconds(1))
                .await
                .unwrap()
                .len(),
            1
        );
    }

    #[tokio::test]
    async fn test_pending_prunes_lifecycle() {
        let store = MemoryStore::new();
        let now = Utc::now();
        let guild = GuildId::new(1);
        let prune_id = Uuid::new_v4();

        store
            .add_pending_prunes(guild, prune_id, &[UserId::new(5), UserId::new(6)], now)
            .await
            .unwrap();
        store.set_member_pruned(guild, UserId::new(5), true).await.unwrap();

        let remaining = store.members_to_prune(guild, prune_id).await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].user_id, 6);

        let removed = store
            .delete_pending_prunes_before(now + Duration::seconds(1))
            .await
            .unwrap();
        assert_eq!(removed, 2);
    }
}
