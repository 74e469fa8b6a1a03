use chrono::Duration;
use serenity::all::{GuildId, UserId};
use tracing::{debug, info};
use uuid::Uuid;

use crate::bot::error::Error;
use crate::capabilities::ClockHandle;
use crate::constants::defaults::PENDING_PRUNE_MAX_AGE;
use crate::db::repository::PendingPruneRepository;
use crate::db::StoreHandle;

/// Batches of members selected for pruning, awaiting confirmation
#[derive(Clone)]
pub struct PruneService {
    store: StoreHandle,
    clock: ClockHandle,
}

impl PruneService {
    pub fn new(store: StoreHandle, clock: ClockHandle) -> Self {
        Self { store, clock }
    }

    /// Store a new batch and return its id
    pub async fn create_batch(&self, guild_id: GuildId, members: &[UserId]) -> Result<Uuid, Error> {
        if members.is_empty() {
            return Err(Error::invalid_input("a prune batch needs at least one member"));
        }

        let prune_id = Uuid::new_v4();
        self.store
            .add_pending_prunes(guild_id, prune_id, members, self.clock.now())
            .await?;

        debug!(guild_id = %guild_id, "Prune batch {} holds {} members", prune_id, members.len());
        Ok(prune_id)
    }

    /// Members of a batch not yet pruned
    pub async fn members_to_prune(
        &self,
        guild_id: GuildId,
        prune_id: Uuid,
    ) -> Result<Vec<UserId>, Error> {
        let pending = self.store.members_to_prune(guild_id, prune_id).await?;
        Ok(pending
            .into_iter()
            .map(|p| UserId::new(p.user_id as u64))
            .collect())
    }

    pub async fn mark_pruned(&self, guild_id: GuildId, user_id: UserId) -> Result<(), Error> {
        self.store.set_member_pruned(guild_id, user_id, true).await
    }

    /// Discard batches older than the confirmation window
    pub async fn remove_stale(&self) -> Result<u64, Error> {
        let max_age = Duration::seconds(PENDING_PRUNE_MAX_AGE.as_secs() as i64);
        let removed = self
            .store
            .delete_pending_prunes_before(self.clock.now() - max_age)
            .await?;

        if removed > 0 {
            info!("Removed {} stale pending prune entries", removed);
        }
        Ok(removed)
    }
}
