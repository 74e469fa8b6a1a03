use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::models::PendingPrune;

/// Insert a whole batch or nothing
pub async fn add_members(
    pool: &PgPool,
    guild_id: i64,
    prune_id: Uuid,
    user_ids: &[i64],
    now: DateTime<Utc>,
) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;

    for user_id in user_ids {
        sqlx::query(
            r#"
            INSERT INTO pending_prunes (guild_id, prune_id, user_id, timestamp)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT DO NOTHING
            "#
        )
        .bind(guild_id)
        .bind(prune_id)
        .bind(user_id)
        .bind(now)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await
}

pub async fn get_unpruned(
    pool: &PgPool,
    guild_id: i64,
    prune_id: Uuid,
) -> Result<Vec<PendingPrune>, sqlx::Error> {
    sqlx::query_as::<_, PendingPrune>(
        "SELECT * FROM pending_prunes WHERE guild_id = $1 AND prune_id = $2 AND pruned = FALSE"
    )
    .bind(guild_id)
    .bind(prune_id)
    .fetch_all(pool)
    .await
}

pub async fn set_pruned(
    pool: &PgPool,
    guild_id: i64,
    user_id: i64,
    pruned: bool,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE pending_prunes SET pruned = $3 WHERE guild_id = $1 AND user_id = $2")
        .bind(guild_id)
        .bind(user_id)
        .bind(pruned)
        .execute(pool)
        .await?;

    Ok(())
}

pub async fn delete_before(pool: &PgPool, cutoff: DateTime<Utc>) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM pending_prunes WHERE timestamp < $1")
        .bind(cutoff)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}
