use sqlx::PgPool;

use crate::db::models::{Infraction, NewInfraction};

pub async fn create(pool: &PgPool, new: &NewInfraction) -> Result<Infraction, sqlx::Error> {
    sqlx::query_as::<_, Infraction>(
        r#"
        INSERT INTO infractions (guild_id, user_id, moderator_id, reason, weight, timestamp, silent)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING id, guild_id, user_id, moderator_id, reason, weight, timestamp, silent
        "#
    )
    .bind(new.guild_id)
    .bind(new.user_id)
    .bind(new.moderator_id)
    .bind(&new.reason)
    .bind(new.weight)
    .bind(new.timestamp)
    .bind(new.silent)
    .fetch_one(pool)
    .await
}

/// Both statements of a listing must see the same snapshot; the default
/// READ COMMITTED level takes a fresh one per statement
const SNAPSHOT_ISOLATION: &str = "SET TRANSACTION ISOLATION LEVEL REPEATABLE READ";

/// A page of a user's infractions (newest first) and the total count, read
/// from a single snapshot
pub async fn get_page(
    pool: &PgPool,
    guild_id: i64,
    user_id: i64,
    limit: i64,
    offset: i64,
) -> Result<(Vec<Infraction>, i64), sqlx::Error> {
    let mut tx = pool.begin().await?;
    sqlx::query(SNAPSHOT_ISOLATION).execute(&mut *tx).await?;

    let page = sqlx::query_as::<_, Infraction>(
        r#"
        SELECT id, guild_id, user_id, moderator_id, reason, weight, timestamp, silent
        FROM infractions
        WHERE guild_id = $1 AND user_id = $2
        ORDER BY timestamp DESC, id DESC
        LIMIT $3 OFFSET $4
        "#
    )
    .bind(guild_id)
    .bind(user_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(&mut *tx)
    .await?;

    let row: (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM infractions WHERE guild_id = $1 AND user_id = $2"
    )
    .bind(guild_id)
    .bind(user_id)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok((page, row.0))
}

pub async fn get_all(
    pool: &PgPool,
    guild_id: i64,
    user_id: i64,
) -> Result<Vec<Infraction>, sqlx::Error> {
    sqlx::query_as::<_, Infraction>(
        r#"
        SELECT id, guild_id, user_id, moderator_id, reason, weight, timestamp, silent
        FROM infractions
        WHERE guild_id = $1 AND user_id = $2
        ORDER BY timestamp DESC, id DESC
        "#
    )
    .bind(guild_id)
    .bind(user_id)
    .fetch_all(pool)
    .await
}

/// Guild-scoped delete in a single statement
pub async fn delete(pool: &PgPool, id: i64, guild_id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM infractions WHERE id = $1 AND guild_id = $2")
        .bind(id)
        .bind(guild_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}
