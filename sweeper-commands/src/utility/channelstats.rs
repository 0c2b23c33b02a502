use std::pin::pin;

use futures_util::TryStreamExt;
use twilight_model::{
    gateway::payload::incoming::MessageCreate,
    id::{Id, marker::ChannelMarker},
    util::Timestamp,
};

use crate::CommandMeta;
use crate::checks::fetch_guild_text_channel;
use crate::moderation::embeds::{error_message, guild_only_message};
use crate::utility::embeds::channel_stats_embed;
use sweeper_core::Context;
use sweeper_utils::ModerationError;
use sweeper_utils::history::{ScanBounds, scan};
use sweeper_utils::parse::parse_channel_id;
use sweeper_utils::time::{SECS_PER_DAY, now_unix_secs, snowflake_secs};

pub const META: CommandMeta = CommandMeta {
    name: "channelstats",
    desc: "Message counts for the last day, week and all time.",
    category: "utility",
    usage: "!channelstats [#channel]",
};

const HISTORY_DENIED: &str = "I don't have permission to read message history in that channel.";

/// Message counts bucketed by age.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct ChannelActivity {
    pub last_day: u64,
    pub last_week: u64,
    pub total: u64,
}

impl ChannelActivity {
    /// Count one message created at `timestamp`; the windows exclude their boundary.
    pub fn record(&mut self, timestamp: i64, now_secs: i64) {
        self.total += 1;
        if timestamp > now_secs - SECS_PER_DAY {
            self.last_day += 1;
        }
        if timestamp > now_secs - 7 * SECS_PER_DAY {
            self.last_week += 1;
        }
    }
}

/// Walk a channel's full history and report how active it has been.
pub async fn run(ctx: Context, msg: Box<MessageCreate>, arg1: Option<&str>) -> anyhow::Result<()> {
    let http = &ctx.http;
    if msg.guild_id.is_none() {
        http.create_message(msg.channel_id)
            .content(guild_only_message())
            .await?;
        return Ok(());
    }

    let channel_id = match arg1 {
        Some(raw) => match parse_channel_id(raw) {
            Some(channel_id) => channel_id,
            None => {
                let usage = format!("Usage: `{}`", META.usage);
                http.create_message(msg.channel_id).content(&usage).await?;
                return Ok(());
            }
        },
        None => msg.channel_id,
    };

    let Some(channel) = fetch_guild_text_channel(&ctx, &msg, channel_id).await? else {
        return Ok(());
    };

    let now_secs = now_unix_secs();
    let activity = match tally(&ctx, channel_id, now_secs).await {
        Ok(activity) => activity,
        Err(ModerationError::Permission(_)) => {
            http.create_message(msg.channel_id)
                .content(HISTORY_DENIED)
                .await?;
            return Ok(());
        }
        Err(source) => {
            http.create_message(msg.channel_id)
                .content(&error_message(&source))
                .await?;
            return Ok(());
        }
    };

    let created = Timestamp::from_secs(snowflake_secs(channel.id.cast()))?
        .iso_8601()
        .to_string();
    let channel_name = channel.name.as_deref().unwrap_or("unknown");
    let embed = channel_stats_embed(
        channel_name,
        &activity,
        created.get(..10).unwrap_or(&created),
        channel.topic.as_deref().filter(|topic| !topic.is_empty()),
    )?;

    http.create_message(msg.channel_id).embeds(&[embed]).await?;

    Ok(())
}

async fn tally(
    ctx: &Context,
    channel_id: Id<ChannelMarker>,
    now_secs: i64,
) -> Result<ChannelActivity, ModerationError> {
    let mut history = pin!(scan(ctx.http.as_ref(), channel_id, ScanBounds::unbounded()));
    let mut activity = ChannelActivity::default();

    while let Some(message) = history.try_next().await? {
        activity.record(message.timestamp, now_secs);
    }

    Ok(activity)
}
