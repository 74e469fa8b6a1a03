use serenity::all::{GuildId, UserId};
use tracing::debug;

use crate::bot::error::Error;
use crate::capabilities::ChatCapability;
use crate::db::repository::GuildSettingsRepository;
use crate::services::infractions::InfractionService;
use crate::utils::formatting::{format_float_up_to_prec, mention_user};

const OWNER_FALLBACK_SUFFIX: &str = "\n(as the moderator channel has not been set, this message was sent to you as the owner of the server)";

/// Tell moderators when a member with a high decayed severity joins.
///
/// Returns whether a notification was sent.
pub async fn notify_warned_user_join(
    infractions: &InfractionService,
    chat: &dyn ChatCapability,
    guild_id: GuildId,
    user_id: UserId,
) -> Result<bool, Error> {
    let settings = infractions.store().guild_settings(guild_id).await?;
    if !settings.notify_on_warned_user_join {
        return Ok(false);
    }

    let total = infractions
        .total_decayed_severity(guild_id, user_id, settings.infraction_half_life_days)
        .await?;
    let threshold = settings.notify_warn_severity_threshold;
    if total < threshold {
        debug!(guild_id = %guild_id, user_id = %user_id, "Joined with severity {:.2}", total);
        return Ok(false);
    }

    let (channel_id, suffix) = match settings.moderator_channel() {
        Some(channel_id) => (channel_id, ""),
        None => {
            let owner = chat.guild_owner(guild_id).await?;
            (chat.dm_channel_for(owner).await?, OWNER_FALLBACK_SUFFIX)
        }
    };

    let content = format!(
        "{} has joined with a total infraction severity score of {:.2}, at or above the threshold of {}{}",
        mention_user(user_id),
        total,
        format_float_up_to_prec(threshold, 2),
        suffix
    );
    chat.send_message(channel_id, &content).await?;

    Ok(true)
}
