use tracing::{debug, error, info, warn};

use crate::bot::error::Error;
use crate::capabilities::{ChatCapability, ChatError};
use crate::constants::defaults::TEMP_BAN_EXPIRED_REASON;
use crate::services::temp_ban::TempBanService;

/// Outcome of one reaper pass
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReapSummary {
    /// Records reversed (or already gone) and deleted
    pub lifted: usize,
    /// Records left in place for the next pass
    pub retained: usize,
}

/// Lift every expired temporary ban.
///
/// A record is deleted once the platform confirms the unban or reports the ban
/// no longer exists. Any other failure keeps the record for the next pass and
/// does not stop the remaining ones.
pub async fn reap_expired(
    bans: &TempBanService,
    chat: &dyn ChatCapability,
) -> Result<ReapSummary, Error> {
    let expired = bans.expired().await?;
    let mut summary = ReapSummary::default();

    for ban in expired {
        let (guild_id, user_id) = (ban.guild(), ban.user());

        match chat.remove_ban(guild_id, user_id, TEMP_BAN_EXPIRED_REASON).await {
            Ok(()) => {
                info!(guild_id = %guild_id, user_id = %user_id, "Lifted expired ban");
            }
            Err(ChatError::UnknownBan) => {
                debug!(guild_id = %guild_id, user_id = %user_id, "Expired ban was already lifted");
            }
            Err(e) => {
                warn!(
                    guild_id = %guild_id,
                    user_id = %user_id,
                    "Failed to lift expired ban: {}",
                    e
                );
                summary.retained += 1;
                continue;
            }
        }

        match bans.delete(&ban).await {
            Ok(_) => summary.lifted += 1,
            Err(e) => {
                error!(
                    guild_id = %guild_id,
                    user_id = %user_id,
                    "Failed to delete temp ban record: {}",
                    e
                );
                summary.retained += 1;
            }
        }
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{Duration, Utc};
    use serenity::all::{GuildId, UserId};

    use super::*;
    use crate::capabilities::chat::MockChatCapability;
    use crate::capabilities::clock::FixedClock;
    use crate::db::MemoryStore;

    const GUILD: GuildId = GuildId::new(1);
    const ACTOR: UserId = UserId::new(99);
    const USER_A: UserId = UserId::new(10);
    const USER_B: UserId = UserId::new(11);

    async fn bans_with_one_expired() -> TempBanService {
        let now = Utc::now();
        let bans = TempBanService::new(
            Arc::new(MemoryStore::new()),
            Arc::new(FixedClock::new(now)),
        );
        bans.upsert(GUILD, USER_A, ACTOR, "a", now - Duration::hours(1))
            .await
            .unwrap();
        bans.upsert(GUILD, USER_B, ACTOR, "b", now + Duration::hours(1))
            .await
            .unwrap();
        bans
    }

    #[tokio::test]
    async fn test_lifts_only_expired() {
        let bans = bans_with_one_expired().await;

        let mut chat = MockChatCapability::new();
        chat.expect_remove_ban()
            .withf(|guild_id, user_id, _| *guild_id == GUILD && *user_id == USER_A)
            .times(1)
            .returning(|_, _, _| Ok(()));

        let summary = reap_expired(&bans, &chat).await.unwrap();
        assert_eq!(summary, ReapSummary { lifted: 1, retained: 0 });

        assert!(matches!(
            bans.get(GUILD, USER_A).await.unwrap_err(),
            Error::NotFound(_)
        ));
        assert!(bans.get(GUILD, USER_B).await.is_ok());
    }

    #[tokio::test]
    async fn test_second_pass_is_a_no_op() {
        let bans = bans_with_one_expired().await;

        let mut chat = MockChatCapability::new();
        chat.expect_remove_ban()
            .times(1)
            .returning(|_, _, _| Ok(()));

        reap_expired(&bans, &chat).await.unwrap();
        let summary = reap_expired(&bans, &chat).await.unwrap();
        assert_eq!(summary, ReapSummary::default());
        assert!(bans.expired().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_ban_counts_as_lifted() {
        let bans = bans_with_one_expired().await;

        let mut chat = MockChatCapability::new();
        chat.expect_remove_ban()
            .times(1)
            .returning(|_, _, _| Err(ChatError::UnknownBan));

        let summary = reap_expired(&bans, &chat).await.unwrap();
        assert_eq!(summary.lifted, 1);
        assert!(bans.expired().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_other_failures_keep_the_record() {
        let bans = bans_with_one_expired().await;

        let mut chat = MockChatCapability::new();
        chat.expect_remove_ban()
            .times(1)
            .returning(|_, _, _| Err(ChatError::Other("missing permissions".to_string())));

        let summary = reap_expired(&bans, &chat).await.unwrap();
        assert_eq!(summary, ReapSummary { lifted: 0, retained: 1 });
        assert_eq!(bans.expired().await.unwrap().len(), 1);
    }
}
