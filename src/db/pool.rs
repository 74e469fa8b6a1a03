use std::time::Duration;

use sqlx::{postgres::PgPoolOptions, PgPool};
use tracing::{debug, info};

const MAX_CONNECTIONS: u32 = 10;
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(10);

/// Schema files applied in order at start-up
const MIGRATIONS: [(&str, &str); 5] = [
    ("001_infractions", include_str!("../../migrations/001_infractions.sql")),
    ("002_temp_bans", include_str!("../../migrations/002_temp_bans.sql")),
    ("003_pace_controls", include_str!("../../migrations/003_pace_controls.sql")),
    ("004_guild_settings", include_str!("../../migrations/004_guild_settings.sql")),
    ("005_pending_prunes", include_str!("../../migrations/005_pending_prunes.sql")),
];

pub async fn create_pool(database_url: &str) -> Result<PgPool, sqlx::Error> {
    info!("Connecting to database...");

    let pool = PgPoolOptions::new()
        .max_connections(MAX_CONNECTIONS)
        .acquire_timeout(ACQUIRE_TIMEOUT)
        .connect(database_url)
        .await?;

    info!("Database connection established");
    Ok(pool)
}

/// Apply every migration. Statements are `IF NOT EXISTS` guarded, so
/// re-running against an existing schema is harmless.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::Error> {
    for (name, migration) in MIGRATIONS {
        debug!("Applying migration {}", name);
        for statement in statements(migration) {
            if let Err(e) = sqlx::query(statement).execute(pool).await {
                if !is_already_applied(&e) {
                    return Err(e);
                }
            }
        }
    }

    info!("Applied {} migrations", MIGRATIONS.len());
    Ok(())
}

fn statements(migration: &str) -> impl Iterator<Item = &str> {
    migration
        .split(';')
        .map(str::trim)
        .filter(|statement| !statement.is_empty())
}

fn is_already_applied(error: &sqlx::Error) -> bool {
    let message = error.to_string();
    message.contains("already exists") || message.contains("duplicate key")
}
