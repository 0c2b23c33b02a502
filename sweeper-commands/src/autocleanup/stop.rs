use tracing::info;
use twilight_model::gateway::payload::incoming::MessageCreate;

use crate::CommandMeta;
use crate::checks::ensure_capability;
use crate::moderation::embeds::{error_message, usage_message};
use sweeper_core::Context;
use sweeper_utils::ModerationError;
use sweeper_utils::parse::parse_channel_id;
use sweeper_utils::permissions::Capability;

pub const META: CommandMeta = CommandMeta {
    name: "stopauto",
    desc: "Stop auto cleanup for one channel, or for every channel in this server.",
    category: "autocleanup",
    usage: "!stopauto [#channel]",
};

/// Remove one of this guild's entries, or all of them, and stop the scheduler
/// once no guild has any left.
pub async fn run(ctx: Context, msg: Box<MessageCreate>, arg1: Option<&str>) -> anyhow::Result<()> {
    let http = &ctx.http;
    if !ensure_capability(&ctx, &msg, Capability::Administrator).await? {
        return Ok(());
    }
    let Some(guild_id) = msg.guild_id else {
        return Ok(());
    };

    let out = match arg1 {
        Some(raw) => {
            let Some(channel_id) = parse_channel_id(raw) else {
                let usage = usage_message(META.usage);
                http.create_message(msg.channel_id).content(&usage).await?;
                return Ok(());
            };

            match ctx.store.disable_channel(guild_id.get(), channel_id.get()).await {
                Ok(Some(_)) => {
                    info!(channel_id = channel_id.get(), "auto cleanup disabled");
                    format!("Auto cleanup disabled for <#{}>.", channel_id.get())
                }
                Ok(None) => format!("Auto cleanup was not enabled for <#{}>.", channel_id.get()),
                Err(source) => error_message(&ModerationError::from(source)),
            }
        }
        None => match ctx.store.disable_guild(guild_id.get()).await {
            Ok(removed) => {
                info!(
                    guild_id = guild_id.get(),
                    removed,
                    "auto cleanup disabled for all channels in guild"
                );
                "Auto cleanup disabled for all channels in this server.".to_owned()
            }
            Err(source) => error_message(&ModerationError::from(source)),
        },
    };

    ctx.scheduler.sync_with(&ctx.store.snapshot().await);
    http.create_message(msg.channel_id).content(&out).await?;

    Ok(())
}
