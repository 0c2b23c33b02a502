use tracing::info;
use twilight_model::gateway::payload::incoming::MessageCreate;

use crate::CommandMeta;
use crate::autocleanup::embeds::sweep_summary_embed;
use crate::checks::ensure_capability;
use sweeper_core::Context;
use sweeper_utils::permissions::Capability;

pub const META: CommandMeta = CommandMeta {
    name: "runcleanup",
    desc: "Run one auto cleanup sweep over this server's configured channels now.",
    category: "autocleanup",
    usage: "!runcleanup",
};

/// Sweep this guild's channels immediately without touching the timer.
pub async fn run(ctx: Context, msg: Box<MessageCreate>) -> anyhow::Result<()> {
    let http = &ctx.http;
    if !ensure_capability(&ctx, &msg, Capability::Administrator).await? {
        return Ok(());
    }
    let Some(guild_id) = msg.guild_id else {
        return Ok(());
    };

    let configured = ctx
        .store
        .snapshot()
        .await
        .entries
        .values()
        .any(|entry| entry.guild_id == guild_id.get());
    if !configured {
        http.create_message(msg.channel_id)
            .content("No channels in this server have auto cleanup enabled.")
            .await?;
        return Ok(());
    }

    http.create_message(msg.channel_id)
        .content("Running auto cleanup now... This may take a while.")
        .await?;

    let summary = ctx.scheduler.sweep_guild(guild_id.get()).await;
    info!(
        guild_id = guild_id.get(),
        moderator_id = msg.author.id.get(),
        deleted = summary.total_deleted(),
        failures = summary.failures(),
        "manual auto cleanup sweep finished"
    );

    let embed = sweep_summary_embed(&summary)?;
    http.create_message(msg.channel_id).embeds(&[embed]).await?;

    Ok(())
}
