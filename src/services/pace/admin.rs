use serenity::all::{ChannelId, GuildId};
use tracing::info;

use crate::bot::error::Error;
use crate::db::models::PaceControlPolicy;
use crate::db::repository::PaceControlRepository;
use crate::db::StoreHandle;

/// Administration of the persisted per-channel pace policies
#[derive(Clone)]
pub struct PacePolicies {
    store: StoreHandle,
}

impl PacePolicies {
    pub fn new(store: StoreHandle) -> Self {
        Self { store }
    }

    /// Validate and store a policy, replacing any existing one for the channel
    pub async fn configure(&self, policy: PaceControlPolicy) -> Result<PaceControlPolicy, Error> {
        policy.validate()?;
        self.store.upsert_pace_control(&policy).await?;

        info!(
            guild_id = policy.guild_id,
            channel_id = policy.channel_id,
            "Pace control {} with target {} wpm, cooldown {}..={}s",
            if policy.enabled { "enabled" } else { "disabled" },
            policy.target_wpm,
            policy.min_cooldown_seconds,
            policy.max_cooldown_seconds
        );
        Ok(policy)
    }

    pub async fn get(
        &self,
        guild_id: GuildId,
        channel_id: ChannelId,
    ) -> Result<PaceControlPolicy, Error> {
        self.store
            .pace_control(guild_id, channel_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("pace control for channel {}", channel_id)))
    }

    pub async fn remove(&self, guild_id: GuildId, channel_id: ChannelId) -> Result<(), Error> {
        if !self.store.delete_pace_control(guild_id, channel_id).await? {
            return Err(Error::NotFound(format!(
                "pace control for channel {}",
                channel_id
            )));
        }
        Ok(())
    }

    pub async fn enabled_for_guild(&self, guild_id: GuildId) -> Result<Vec<PaceControlPolicy>, Error> {
        self.store.enabled_pace_controls(guild_id).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tokio_test::{assert_err, assert_ok};

    use super::*;
    use crate::db::MemoryStore;

    const GUILD: GuildId = GuildId::new(1);
    const CHANNEL: ChannelId = ChannelId::new(2);

    #[tokio::test]
    async fn test_configure_rejects_invalid_policy() {
        let policies = PacePolicies::new(Arc::new(MemoryStore::new()));
        let mut policy = PaceControlPolicy::new(GUILD, CHANNEL);
        policy.min_cooldown_seconds = 40;

        let err = policies.configure(policy).await.unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
        assert!(matches!(
            policies.get(GUILD, CHANNEL).await.unwrap_err(),
            Error::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn test_configure_list_and_remove() {
        let policies = PacePolicies::new(Arc::new(MemoryStore::new()));

        let mut enabled = PaceControlPolicy::new(GUILD, CHANNEL);
        enabled.enabled = true;
        enabled.target_wpm = 80;
        policies.configure(enabled.clone()).await.unwrap();
        policies
            .configure(PaceControlPolicy::new(GUILD, ChannelId::new(3)))
            .await
            .unwrap();

        assert_eq!(policies.get(GUILD, CHANNEL).await.unwrap(), enabled);
        assert_eq!(policies.enabled_for_guild(GUILD).await.unwrap(), vec![enabled]);

        assert_ok!(policies.remove(GUILD, CHANNEL).await);
        assert_err!(policies.remove(GUILD, CHANNEL).await);
        assert!(policies.enabled_for_guild(GUILD).await.unwrap().is_empty());
    }
}
