use serenity::all::{ChannelId, GuildId};
use tracing::info;

use crate::bot::error::Error;
use crate::db::models::GuildSettings;
use crate::db::repository::GuildSettingsRepository;
use crate::db::StoreHandle;

/// Per-guild moderation settings
#[derive(Clone)]
pub struct GuildSettingsService {
    store: StoreHandle,
}

impl GuildSettingsService {
    pub fn new(store: StoreHandle) -> Self {
        Self { store }
    }

    /// Stored settings, or the defaults for a guild that has none
    pub async fn get(&self, guild_id: GuildId) -> Result<GuildSettings, Error> {
        self.store.guild_settings(guild_id).await
    }

    pub async fn set_moderator_channel(
        &self,
        guild_id: GuildId,
        channel_id: Option<ChannelId>,
    ) -> Result<GuildSettings, Error> {
        self.update(guild_id, |settings| {
            settings.moderator_channel_id = channel_id.map(|c| c.get() as i64);
            Ok(())
        })
        .await
    }

    pub async fn set_half_life_days(&self, guild_id: GuildId, days: f64) -> Result<GuildSettings, Error> {
        self.update(guild_id, |settings| settings.set_half_life_days(days))
            .await
    }

    /// `threshold` defaults to the current value when `None`
    pub async fn set_join_notification(
        &self,
        guild_id: GuildId,
        enabled: bool,
        threshold: Option<f64>,
    ) -> Result<GuildSettings, Error> {
        if let Some(threshold) = threshold {
            if !threshold.is_finite() || threshold < 0.0 {
                return Err(Error::invalid_input("severity threshold must not be negative"));
            }
        }

        self.update(guild_id, |settings| {
            settings.notify_on_warned_user_join = enabled;
            if let Some(threshold) = threshold {
                settings.notify_warn_severity_threshold = threshold;
            }
            Ok(())
        })
        .await
    }

    pub async fn set_anti_spam(
        &self,
        guild_id: GuildId,
        enabled: Option<bool>,
        count: Option<i32>,
        cooldown_seconds: Option<i32>,
    ) -> Result<GuildSettings, Error> {
        self.update(guild_id, |settings| {
            settings.set_anti_spam(enabled, count, cooldown_seconds)
        })
        .await
    }

    async fn update<F>(&self, guild_id: GuildId, apply: F) -> Result<GuildSettings, Error>
    where
        F: FnOnce(&mut GuildSettings) -> Result<(), Error>,
    {
        let mut settings = self.store.guild_settings(guild_id).await?;
        apply(&mut settings)?;
        self.store.save_guild_settings(&settings).await?;

        info!(guild_id = %guild_id, "Guild settings updated");
        Ok(settings)
    }
}
