use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::db::models::TempBan;

#[allow(clippy::too_many_arguments)]
pub async fn upsert(
    pool: &PgPool,
    guild_id: i64,
    user_id: i64,
    actor_id: i64,
    reason: &str,
    until: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Result<TempBan, sqlx::Error> {
    sqlx::query_as::<_, TempBan>(
        r#"
        INSERT INTO temp_bans (guild_id, user_id, until, reason, actor_id, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $6)
        ON CONFLICT (guild_id, user_id) DO UPDATE
        SET until = EXCLUDED.until,
            reason = EXCLUDED.reason,
            actor_id = EXCLUDED.actor_id,
            updated_at = EXCLUDED.updated_at
        RETURNING *
        "#
    )
    .bind(guild_id)
    .bind(user_id)
    .bind(until)
    .bind(reason)
    .bind(actor_id)
    .bind(now)
    .fetch_one(pool)
    .await
}

pub async fn get(
    pool: &PgPool,
    guild_id: i64,
    user_id: i64,
) -> Result<Option<TempBan>, sqlx::Error> {
    sqlx::query_as::<_, TempBan>(
        "SELECT * FROM temp_bans WHERE guild_id = $1 AND user_id = $2"
    )
    .bind(guild_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await
}

pub async fn get_for_guild(pool: &PgPool, guild_id: i64) -> Result<Vec<TempBan>, sqlx::Error> {
    sqlx::query_as::<_, TempBan>(
        "SELECT * FROM temp_bans WHERE guild_id = $1 ORDER BY until ASC"
    )
    .bind(guild_id)
    .fetch_all(pool)
    .await
}

pub async fn get_expired(pool: &PgPool, now: DateTime<Utc>) -> Result<Vec<TempBan>, sqlx::Error> {
    sqlx::query_as::<_, TempBan>(
        "SELECT * FROM temp_bans WHERE until < $1 ORDER BY until ASC"
    )
    .bind(now)
    .fetch_all(pool)
    .await
}

pub async fn delete(pool: &PgPool, guild_id: i64, user_id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM temp_bans WHERE guild_id = $1 AND user_id = $2")
        .bind(guild_id)
        .bind(user_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}
