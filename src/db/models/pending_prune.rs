use chrono::{DateTime, Utc};
use uuid::Uuid;

/// A member selected for a prune batch awaiting confirmation
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct PendingPrune {
    pub guild_id: i64,
    pub prune_id: Uuid,
    pub user_id: i64,
    pub timestamp: DateTime<Utc>,
    pub pruned: bool,
}
