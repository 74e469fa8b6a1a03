use std::sync::Arc;
use std::time::Instant;

use poise::serenity_prelude::{self as serenity, FullEvent, Member, Message};
use tracing::{debug, error, info, warn};

use crate::bot::data::Data;
use crate::bot::error::Error;
use crate::services::infractions::join_notify::notify_warned_user_join;
use crate::services::pace::PaceKey;
use crate::services::spam::{check_message, IncomingMessage};

pub async fn event_handler(
    _ctx: &serenity::Context,
    event: &FullEvent,
    _framework: poise::FrameworkContext<'_, Arc<Data>, Error>,
    data: &Arc<Data>,
) -> Result<(), Error> {
    match event {
        FullEvent::Ready { data_about_bot, .. } => {
            info!(
                "Bot ready as {} in {} guilds",
                data_about_bot.user.name,
                data_about_bot.guilds.len()
            );
        }

        FullEvent::Message { new_message } => {
            handle_message(data, new_message).await;
        }

        FullEvent::GuildMemberAddition { new_member } => {
            handle_member_join(data, new_member).await;
        }

        FullEvent::GuildDelete { incomplete, .. } => {
            debug!("Guild {} removed", incomplete.id);
        }

        _ => {}
    }

    Ok(())
}

async fn handle_message(data: &Data, message: &Message) {
    if message.author.bot {
        return;
    }
    let Some(guild_id) = message.guild_id else {
        return;
    };

    data.pace_tracker.record(
        PaceKey::new(guild_id, message.channel_id),
        &message.content,
        message.author.id,
        Instant::now(),
    );

    let incoming = IncomingMessage {
        guild_id,
        channel_id: message.channel_id,
        message_id: message.id,
        author_id: message.author.id,
        content: message.content.clone(),
    };

    let result = check_message(
        &data.spam_tracker,
        data.store.as_ref(),
        data.chat.as_ref(),
        &incoming,
        Instant::now(),
        data.clock.now(),
    )
    .await;

    match result {
        Ok(Some(action)) => {
            info!(
                guild_id = %guild_id,
                user_id = %action.user_id,
                "Anti-spam timed out member, deleted {} messages",
                action.deleted
            );
        }
        Ok(None) => {}
        Err(e) if e.is_expected() => {
            debug!(guild_id = %guild_id, "Spam check skipped: {}", e);
        }
        Err(e) => {
            error!(guild_id = %guild_id, "Spam check failed: {}", e);
        }
    }
}

async fn handle_member_join(data: &Data, member: &Member) {
    if member.user.bot {
        return;
    }

    match notify_warned_user_join(
        &data.infractions,
        data.chat.as_ref(),
        member.guild_id,
        member.user.id,
    )
    .await
    {
        Ok(true) => {
            debug!(
                guild_id = %member.guild_id,
                user_id = %member.user.id,
                "Moderators notified of returning member"
            );
        }
        Ok(false) => {}
        Err(e) => {
            warn!(
                guild_id = %member.guild_id,
                user_id = %member.user.id,
                "Failed to send join notification: {}",
                e
            );
        }
    }
}
