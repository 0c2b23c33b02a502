use tracing::info;
use twilight_model::gateway::payload::incoming::MessageCreate;

use crate::CommandMeta;
use crate::checks::{ensure_capability, fetch_guild_text_channel};
use crate::moderation::embeds::{error_message, usage_message};
use sweeper_core::Context;
use sweeper_store::CleanupEntry;
use sweeper_utils::ModerationError;
use sweeper_utils::parse::{parse_channel_id, parse_count, split_args};
use sweeper_utils::permissions::Capability;

pub const META: CommandMeta = CommandMeta {
    name: "autocleanup",
    desc: "Automatically delete messages older than N days in a channel.",
    category: "autocleanup",
    usage: "!autocleanup <#channel> [days]",
};

/// Add or overwrite a channel's cleanup entry and make sure the scheduler runs.
pub async fn run(
    ctx: Context,
    msg: Box<MessageCreate>,
    arg1: Option<&str>,
    arg_tail: Option<&str>,
) -> anyhow::Result<()> {
    let http = &ctx.http;
    if !ensure_capability(&ctx, &msg, Capability::Administrator).await? {
        return Ok(());
    }
    let Some(guild_id) = msg.guild_id else {
        return Ok(());
    };

    let Some(channel_id) = arg1.and_then(parse_channel_id) else {
        let usage = usage_message(META.usage);
        http.create_message(msg.channel_id).content(&usage).await?;
        return Ok(());
    };

    let default_days = i64::from(ctx.store.snapshot().await.default_age_days);
    let days_arg = split_args(arg_tail).first().copied();
    let Some(days) = parse_count(days_arg, default_days) else {
        let usage = usage_message(META.usage);
        http.create_message(msg.channel_id).content(&usage).await?;
        return Ok(());
    };

    let Some(age_days) = u32::try_from(days).ok().filter(|days| *days > 0) else {
        http.create_message(msg.channel_id)
            .content("Please specify a positive number of days.")
            .await?;
        return Ok(());
    };

    let Some(channel) = fetch_guild_text_channel(&ctx, &msg, channel_id).await? else {
        return Ok(());
    };

    let entry = CleanupEntry {
        channel_name: channel
            .name
            .unwrap_or_else(|| channel_id.get().to_string()),
        age_days,
        guild_id: guild_id.get(),
    };

    if let Err(source) = ctx.store.enable_channel(channel_id.get(), entry).await {
        let source = ModerationError::from(source);
        http.create_message(msg.channel_id)
            .content(&error_message(&source))
            .await?;
        return Ok(());
    }

    ctx.scheduler.start();
    info!(
        channel_id = channel_id.get(),
        guild_id = guild_id.get(),
        age_days,
        "auto cleanup enabled"
    );

    let out = format!(
        "Auto cleanup enabled for <#{}>. Messages older than {} days will be automatically deleted.",
        channel_id.get(),
        age_days
    );
    http.create_message(msg.channel_id).content(&out).await?;

    Ok(())
}
