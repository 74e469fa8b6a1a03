use std::sync::Arc;

use poise::serenity_prelude::{self as serenity, GatewayIntents, GuildId};
use tracing::{error, info, warn};

use crate::bot::data::Data;
use crate::bot::error::Error;
use crate::capabilities::{ChatHandle, SerenityChat, SystemClock};
use crate::config::Settings;
use crate::db::StoreHandle;
use crate::handlers::event_handler::event_handler;
use crate::services::scheduled::{self, ScheduledTasks};

/// Start every background job and hand it to the registry
pub async fn start_tasks(data: &Data, registry: &ScheduledTasks) {
    let reaper = Arc::new(scheduled::temp_ban_reaper(
        data.temp_bans.clone(),
        data.chat.clone(),
        data.settings.temp_ban_sweep_interval,
    ));
    reaper.start_now().await;
    registry.add(reaper);

    let pace = Arc::new(scheduled::pace_control(
        data.pace_tracker.clone(),
        data.pace_evaluator.clone(),
        data.store.clone(),
        data.chat.clone(),
        data.settings.pace_control_tick,
    ));
    pace.start();
    registry.add(pace);

    let prunes = Arc::new(scheduled::stale_prunes(data.prunes.clone()));
    prunes.start_now().await;
    registry.add(prunes);

    let sweep = Arc::new(scheduled::memory_sweep(
        data.spam_tracker.clone(),
        data.pace_tracker.clone(),
        data.pace_evaluator.clone(),
    ));
    sweep.start();
    registry.add(sweep);

    info!("Started background tasks: {}", registry.names().join(", "));
}

pub async fn run(settings: Settings, store: StoreHandle) -> Result<(), Error> {
    let tasks = Arc::new(ScheduledTasks::new());
    let setup_tasks = tasks.clone();
    let setup_settings = settings.clone();

    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: vec![],
            prefix_options: poise::PrefixFrameworkOptions {
                prefix: None,
                ..Default::default()
            },
            event_handler: |ctx, event, framework, data| {
                Box::pin(event_handler(ctx, event, framework, data))
            },
            on_error: |error| {
                Box::pin(async move {
                    match error {
                        poise::FrameworkError::EventHandler { error, event, .. } => {
                            error!("Event handler error on {}: {}", event.snake_case_name(), error);
                        }
                        poise::FrameworkError::UnknownCommand { .. } => {}
                        err => {
                            error!("Framework error: {:?}", err);
                        }
                    }
                })
            },
            ..Default::default()
        })
        .setup(move |ctx, ready, _framework| {
            Box::pin(async move {
                info!("Bot connected as {}", ready.user.name);

                if let Some(guild_id) = setup_settings.dev_guild_id {
                    let guild_id = GuildId::new(guild_id);
                    if ready.guilds.iter().any(|g| g.id == guild_id) {
                        info!("Development guild {} is available", guild_id);
                    } else {
                        warn!("Development guild {} is not among the bot's guilds", guild_id);
                    }
                }

                let chat: ChatHandle = Arc::new(SerenityChat::new(ctx.http.clone()));
                let data = Arc::new(Data::new(
                    setup_settings,
                    store,
                    Arc::new(SystemClock),
                    chat,
                ));

                start_tasks(&data, &setup_tasks).await;
                Ok(data)
            })
        })
        .build();

    let intents = GatewayIntents::GUILDS
        | GatewayIntents::GUILD_MEMBERS
        | GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::MESSAGE_CONTENT;

    let mut client = serenity::ClientBuilder::new(&settings.discord_token, intents)
        .framework(framework)
        .await
        .map_err(Error::Serenity)?;

    let shard_manager = client.shard_manager.clone();
    let shutdown_tasks = tasks.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for shutdown signal: {}", e);
            return;
        }
        info!("Shutting down");
        shutdown_tasks.stop_all();
        shard_manager.shutdown_all().await;
    });

    info!("Starting Discord client...");
    let result = client.start().await.map_err(Error::Serenity);

    tasks.stop_all();
    tasks.join_all().await;
    result
}
