use serenity::all::{GuildId, UserId};
use tracing::{debug, info};

use crate::bot::error::Error;
use crate::capabilities::ClockHandle;
use crate::constants::defaults::MAX_INFRACTION_WEIGHT;
use crate::db::models::{Infraction, NewInfraction};
use crate::db::repository::InfractionRepository;
use crate::db::StoreHandle;
use crate::services::infractions::short_id;

/// Durable log of weighted infractions per (guild, user)
#[derive(Clone)]
pub struct InfractionService {
    store: StoreHandle,
    clock: ClockHandle,
}

impl InfractionService {
    pub fn new(store: StoreHandle, clock: ClockHandle) -> Self {
        Self { store, clock }
    }

    pub fn store(&self) -> &StoreHandle {
        &self.store
    }

    pub fn clock(&self) -> &ClockHandle {
        &self.clock
    }

    /// Record an infraction stamped with the current time
    pub async fn create(
        &self,
        guild_id: GuildId,
        user_id: UserId,
        moderator_id: UserId,
        reason: &str,
        weight: f64,
        silent: bool,
    ) -> Result<Infraction, Error> {
        if !weight.is_finite() || !(0.0..=MAX_INFRACTION_WEIGHT).contains(&weight) {
            return Err(Error::invalid_input(format!(
                "weight must be between 0 and {}",
                MAX_INFRACTION_WEIGHT
            )));
        }

        let infraction = self
            .store
            .insert_infraction(NewInfraction {
                guild_id: guild_id.get() as i64,
                user_id: user_id.get() as i64,
                moderator_id: moderator_id.get() as i64,
                reason: reason.to_string(),
                weight,
                timestamp: self.clock.now(),
                silent,
            })
            .await?;

        info!(
            guild_id = %guild_id,
            user_id = %user_id,
            "Recorded infraction {} with weight {}",
            infraction.id,
            weight
        );

        Ok(infraction)
    }

    /// Newest first, ties broken by id
    pub async fn list(
        &self,
        guild_id: GuildId,
        user_id: UserId,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Infraction>, i64), Error> {
        if limit < 1 {
            return Err(Error::invalid_input("limit must be at least 1"));
        }
        if offset < 0 {
            return Err(Error::invalid_input("offset must not be negative"));
        }

        self.store
            .infraction_page(guild_id, user_id, limit, offset)
            .await
    }

    /// Delete the infraction a short ID refers to, only within `guild_id`
    pub async fn delete_by_short_id(&self, short_id: &str, guild_id: GuildId) -> Result<(), Error> {
        let id = short_id::decode_record_id(short_id)
            .ok_or_else(|| Error::InvalidShortId(short_id.to_string()))?;

        if !self.store.delete_infraction(id, guild_id).await? {
            return Err(Error::NotFound(format!("infraction {}", short_id)));
        }

        debug!(guild_id = %guild_id, "Deleted infraction {}", short_id);
        Ok(())
    }

    /// Sum of every infraction's decayed weight at the current time
    pub async fn total_decayed_severity(
        &self,
        guild_id: GuildId,
        user_id: UserId,
        half_life_days: f64,
    ) -> Result<f64, Error> {
        let now = self.clock.now();
        let infractions = self.store.all_infractions(guild_id, user_id).await?;

        Ok(infractions
            .iter()
            .map(|inf| inf.effective_weight(now, half_life_days))
            .sum())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Arc;

    use chrono::{Duration, Utc};
    use tokio_test::{assert_err, assert_ok};

    use super::*;
    use crate::capabilities::clock::FixedClock;
    use crate::db::MemoryStore;

    fn service() -> (InfractionService, Arc<FixedClock>) {
        let clock = Arc::new(FixedClock::new(Utc::now()));
        let service = InfractionService::new(Arc::new(MemoryStore::new()), clock.clone());
        (service, clock)
    }

    const GUILD_A: GuildId = GuildId::new(100);
    const GUILD_B: GuildId = GuildId::new(200);
    const USER: UserId = UserId::new(5);
    const MOD: UserId = UserId::new(9);

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_creates_get_distinct_ids() {
        let (service, _) = service();

        let creators: Vec<_> = (0..32)
            .map(|i| {
                let service = service.clone();
                tokio::spawn(async move {
                    service
                        .create(GUILD_A, USER, MOD, &format!("warn {}", i), 1.0, false)
                        .await
                        .unwrap()
                        .id
                })
            })
            .collect();

        let mut ids = HashSet::new();
        for creator in creators {
            assert!(ids.insert(creator.await.unwrap()));
        }
        assert_eq!(ids.len(), 32);
        assert_eq!(service.list(GUILD_A, USER, 50, 0).await.unwrap().1, 32);
    }

    #[tokio::test]
    async fn test_create_validates_weight() {
        let (service, _) = service();
        for weight in [-0.1, 10.5, f64::NAN, f64::INFINITY] {
            let err = service
                .create(GUILD_A, USER, MOD, "bad", weight, false)
                .await
                .unwrap_err();
            assert!(matches!(err, Error::InvalidInput(_)));
        }

        let inf = service.create(GUILD_A, USER, MOD, "ok", 10.0, true).await.unwrap();
        assert_eq!(inf.weight, 10.0);
        assert!(inf.silent);
    }

    #[tokio::test]
    async fn test_list_validates_bounds() {
        let (service, _) = service();
        assert_err!(service.list(GUILD_A, USER, 0, 0).await);
        assert_err!(service.list(GUILD_A, USER, 5, -1).await);

        let (page, total) = assert_ok!(service.list(GUILD_A, USER, 5, 0).await);
        assert!(page.is_empty());
        assert_eq!(total, 0);
    }

    #[tokio::test]
    async fn test_list_newest_first() {
        let (service, clock) = service();
        let first = service.create(GUILD_A, USER, MOD, "first", 1.0, false).await.unwrap();
        clock.advance(Duration::minutes(1));
        let second = service.create(GUILD_A, USER, MOD, "second", 1.0, false).await.unwrap();

        let (page, total) = service.list(GUILD_A, USER, 5, 0).await.unwrap();
        assert_eq!(total, 2);
        assert_eq!(page[0].id, second.id);
        assert_eq!(page[1].id, first.id);
    }

    #[tokio::test]
    async fn test_delete_is_guild_scoped() {
        let (service, _) = service();
        let inf = service.create(GUILD_A, USER, MOD, "spam", 1.0, false).await.unwrap();
        let short = inf.short_id().unwrap();

        let err = service.delete_by_short_id(&short, GUILD_B).await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
        assert_eq!(service.list(GUILD_A, USER, 5, 0).await.unwrap().1, 1);

        service.delete_by_short_id(&short, GUILD_A).await.unwrap();
        assert_eq!(service.list(GUILD_A, USER, 5, 0).await.unwrap().1, 0);

        let err = service.delete_by_short_id(&short, GUILD_A).await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn test_delete_rejects_bad_short_id() {
        let (service, _) = service();
        let err = service.delete_by_short_id("jjjjj", GUILD_A).await.unwrap_err();
        assert!(matches!(err, Error::InvalidShortId(_)));
        assert!(err.is_expected());
    }

    #[tokio::test]
    async fn test_total_decayed_severity() {
        let (service, clock) = service();
        service.create(GUILD_A, USER, MOD, "old", 0.5, false).await.unwrap();
        clock.advance(Duration::hours(48));
        service.create(GUILD_A, USER, MOD, "new", 1.0, false).await.unwrap();

        let total = service.total_decayed_severity(GUILD_A, USER, 2.0).await.unwrap();
        assert!((total - 1.25).abs() < 1e-9);

        let undecayed = service.total_decayed_severity(GUILD_A, USER, 0.0).await.unwrap();
        assert!((undecayed - 1.5).abs() < 1e-9);
    }
}
