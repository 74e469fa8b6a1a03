use sqlx::PgPool;

use crate::db::models::PaceControlPolicy;

pub async fn get(
    pool: &PgPool,
    guild_id: i64,
    channel_id: i64,
) -> Result<Option<PaceControlPolicy>, sqlx::Error> {
    sqlx::query_as::<_, PaceControlPolicy>(
        "SELECT * FROM pace_controls WHERE guild_id = $1 AND channel_id = $2"
    )
    .bind(guild_id)
    .bind(channel_id)
    .fetch_optional(pool)
    .await
}

pub async fn get_enabled_for_guild(
    pool: &PgPool,
    guild_id: i64,
) -> Result<Vec<PaceControlPolicy>, sqlx::Error> {
    sqlx::query_as::<_, PaceControlPolicy>(
        "SELECT * FROM pace_controls WHERE guild_id = $1 AND enabled = TRUE ORDER BY channel_id"
    )
    .bind(guild_id)
    .fetch_all(pool)
    .await
}

pub async fn upsert(pool: &PgPool, pc: &PaceControlPolicy) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO pace_controls (
            guild_id, channel_id, enabled, target_wpm, min_cooldown_seconds,
            max_cooldown_seconds, activation_wpm, wpm_window_seconds, user_window_seconds
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        ON CONFLICT (guild_id, channel_id) DO UPDATE
        SET enabled = EXCLUDED.enabled,
            target_wpm = EXCLUDED.target_wpm,
            min_cooldown_seconds = EXCLUDED.min_cooldown_seconds,
            max_cooldown_seconds = EXCLUDED.max_cooldown_seconds,
            activation_wpm = EXCLUDED.activation_wpm,
            wpm_window_seconds = EXCLUDED.wpm_window_seconds,
            user_window_seconds = EXCLUDED.user_window_seconds
        "#
    )
    .bind(pc.guild_id)
    .bind(pc.channel_id)
    .bind(pc.enabled)
    .bind(pc.target_wpm)
    .bind(pc.min_cooldown_seconds)
    .bind(pc.max_cooldown_seconds)
    .bind(pc.activation_wpm)
    .bind(pc.wpm_window_seconds)
    .bind(pc.user_window_seconds)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn delete(pool: &PgPool, guild_id: i64, channel_id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM pace_controls WHERE guild_id = $1 AND channel_id = $2")
        .bind(guild_id)
        .bind(channel_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}
