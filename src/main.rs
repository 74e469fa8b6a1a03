use std::sync::Arc;

use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use warden::{
    bot,
    config::Settings,
    db::{self, MemoryStore, PgStore, StoreHandle},
};

#[tokio::main]
async fn main() {
    // Load .env file if present
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,serenity=warn")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Warden");

    let settings = match Settings::from_env() {
        Ok(s) => s,
        Err(e) => {
            error!("Failed to load settings: {}", e);
            std::process::exit(1);
        }
    };

    let store: StoreHandle = match &settings.database_url {
        Some(url) => {
            let pool = match db::pool::create_pool(url).await {
                Ok(p) => p,
                Err(e) => {
                    error!("Failed to create database pool: {}", e);
                    std::process::exit(1);
                }
            };

            if let Err(e) = db::pool::run_migrations(&pool).await {
                error!("Failed to run migrations: {}", e);
                std::process::exit(1);
            }

            info!("Database initialized successfully");
            Arc::new(PgStore::new(pool))
        }
        None => {
            warn!("DATABASE_URL not set, using the in-memory store; nothing will persist");
            Arc::new(MemoryStore::new())
        }
    };

    if let Err(e) = bot::framework::run(settings, store).await {
        error!("Bot error: {}", e);
        std::process::exit(1);
    }
}
