use sqlx::PgPool;

use crate::db::models::GuildSettings;

pub async fn get_or_create(pool: &PgPool, guild_id: i64) -> Result<GuildSettings, sqlx::Error> {
    // Try to get existing settings
    let existing = sqlx::query_as::<_, GuildSettings>(
        "SELECT * FROM guild_settings WHERE guild_id = $1"
    )
    .bind(guild_id)
    .fetch_optional(pool)
    .await?;

    if let Some(settings) = existing {
        return Ok(settings);
    }

    // Concurrent handlers may race here, so the insert tolerates an existing row
    sqlx::query("INSERT INTO guild_settings (guild_id) VALUES ($1) ON CONFLICT (guild_id) DO NOTHING")
        .bind(guild_id)
        .execute(pool)
        .await?;

    sqlx::query_as::<_, GuildSettings>("SELECT * FROM guild_settings WHERE guild_id = $1")
        .bind(guild_id)
        .fetch_one(pool)
        .await
}

pub async fn save(pool: &PgPool, settings: &GuildSettings) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO guild_settings (
            guild_id, moderator_channel_id, infraction_half_life_days,
            notify_on_warned_user_join, notify_warn_severity_threshold,
            anti_spam_enabled, anti_spam_count, anti_spam_cooldown_seconds, updated_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, NOW())
        ON CONFLICT (guild_id) DO UPDATE
        SET moderator_channel_id = EXCLUDED.moderator_channel_id,
            infraction_half_life_days = EXCLUDED.infraction_half_life_days,
            notify_on_warned_user_join = EXCLUDED.notify_on_warned_user_join,
            notify_warn_severity_threshold = EXCLUDED.notify_warn_severity_threshold,
            anti_spam_enabled = EXCLUDED.anti_spam_enabled,
            anti_spam_count = EXCLUDED.anti_spam_count,
            anti_spam_cooldown_seconds = EXCLUDED.anti_spam_cooldown_seconds,
            updated_at = NOW()
        "#
    )
    .bind(settings.guild_id)
    .bind(settings.moderator_channel_id)
    .bind(settings.infraction_half_life_days)
    .bind(settings.notify_on_warned_user_join)
    .bind(settings.notify_warn_severity_threshold)
    .bind(settings.anti_spam_enabled)
    .bind(settings.anti_spam_count)
    .bind(settings.anti_spam_cooldown_seconds)
    .execute(pool)
    .await?;

    Ok(())
}
