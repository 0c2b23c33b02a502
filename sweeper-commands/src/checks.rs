use std::time::Duration;

use tokio::time::sleep;
use twilight_http::Client;
use twilight_model::{
    channel::{Channel, ChannelType},
    gateway::payload::incoming::MessageCreate,
    id::{
        Id,
        marker::{ChannelMarker, GuildMarker},
    },
};

use sweeper_core::Context;
use sweeper_utils::ModerationError;
use sweeper_utils::permissions::{Capability, has_capability};

use crate::moderation::embeds::{error_message, guild_only_message};

const GENERIC_FAILURE: &str = "An error occurred while running that command.";

/// Reply with a denial and return `false` unless the author holds `capability`.
///
/// Every capability-gated command is guild-only, so a DM is denied with the
/// guild-only message instead.
pub(crate) async fn ensure_capability(
    ctx: &Context,
    msg: &MessageCreate,
    capability: Capability,
) -> anyhow::Result<bool> {
    let http = &ctx.http;
    if msg.guild_id.is_none() {
        http.create_message(msg.channel_id)
            .content(guild_only_message())
            .await?;
        return Ok(false);
    }

    if !has_capability(http, msg, capability).await? {
        http.create_message(msg.channel_id)
            .content(&capability.denied_message())
            .await?;
        return Ok(false);
    }

    Ok(true)
}

/// Why a channel can't be the target of a command sent from `invoking_guild`.
pub(crate) fn channel_rejection(
    kind: ChannelType,
    channel_guild: Option<Id<GuildMarker>>,
    invoking_guild: Option<Id<GuildMarker>>,
) -> Option<&'static str> {
    if invoking_guild.is_none() || channel_guild != invoking_guild {
        return Some("That channel is not in this server.");
    }
    if !matches!(kind, ChannelType::GuildText | ChannelType::GuildAnnouncement) {
        return Some("This command only works with text channels.");
    }

    None
}

/// Fetch `channel_id` and make sure it is a text channel of the invoking guild.
///
/// Replies and returns `None` when it is not.
pub(crate) async fn fetch_guild_text_channel(
    ctx: &Context,
    msg: &MessageCreate,
    channel_id: Id<ChannelMarker>,
) -> anyhow::Result<Option<Channel>> {
    let http = &ctx.http;
    let channel = match http.channel(channel_id).await {
        Ok(response) => response.model().await?,
        Err(source) => {
            let out = error_message(&ModerationError::from(source));
            http.create_message(msg.channel_id).content(&out).await?;
            return Ok(None);
        }
    };

    if let Some(reason) = channel_rejection(channel.kind, channel.guild_id, msg.guild_id) {
        http.create_message(msg.channel_id).content(reason).await?;
        return Ok(None);
    }

    Ok(Some(channel))
}

/// Reply text for a command that failed without answering the user itself.
pub(crate) fn failure_reply(source: &anyhow::Error) -> String {
    if let Some(source) = source.downcast_ref::<ModerationError>() {
        return source.user_message();
    }
    if let Some(source) = source.downcast_ref::<twilight_http::Error>() {
        return ModerationError::from_http(source).user_message();
    }

    GENERIC_FAILURE.to_owned()
}

/// Send a reply that removes itself after `ttl`.
pub(crate) async fn reply_ephemeral(
    http: &Client,
    channel_id: Id<ChannelMarker>,
    content: &str,
    ttl: Duration,
) -> anyhow::Result<()> {
    let confirmation_message = http
        .create_message(channel_id)
        .content(content)
        .await?
        .model()
        .await?;

    sleep(ttl).await;
    let _ = http.delete_message(channel_id, confirmation_message.id).await;

    Ok(())
}
