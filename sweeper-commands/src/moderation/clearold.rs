use std::time::Duration;

use tracing::info;
use twilight_model::gateway::payload::incoming::MessageCreate;

use crate::CommandMeta;
use crate::checks::{ensure_capability, reply_ephemeral};
use crate::moderation::embeds::{
    CONFIRMATION_TTL_SECS, error_message, purge_summary_message, usage_message,
};
use sweeper_core::Context;
use sweeper_utils::cleanup::{PurgeRequest, created_before, purge};
use sweeper_utils::parse::parse_count;
use sweeper_utils::permissions::Capability;
use sweeper_utils::time::{SECS_PER_DAY, now_unix_secs};

pub const META: CommandMeta = CommandMeta {
    name: "clearold",
    desc: "Delete every message older than a number of days.",
    category: "moderation",
    usage: "!clearold [days=7]",
};

const DEFAULT_DAYS: i64 = 7;

/// Delete all messages in this channel created before `now - days`.
pub async fn run(ctx: Context, msg: Box<MessageCreate>, arg1: Option<&str>) -> anyhow::Result<()> {
    let http = &ctx.http;
    if !ensure_capability(&ctx, &msg, Capability::ManageMessages).await? {
        return Ok(());
    }

    let Some(days) = parse_count(arg1, DEFAULT_DAYS) else {
        let usage = usage_message(META.usage);
        http.create_message(msg.channel_id).content(&usage).await?;
        return Ok(());
    };

    if days <= 0 {
        http.create_message(msg.channel_id)
            .content("Please specify a positive number of days.")
            .await?;
        return Ok(());
    }

    let cutoff_secs = now_unix_secs().saturating_sub(days.saturating_mul(SECS_PER_DAY));
    let outcome = match purge(
        http.as_ref(),
        msg.channel_id,
        created_before(cutoff_secs),
        PurgeRequest::older_than(cutoff_secs),
    )
    .await
    {
        Ok(outcome) => outcome,
        Err(source) => {
            http.create_message(msg.channel_id)
                .content(&error_message(&source))
                .await?;
            return Ok(());
        }
    };

    info!(
        channel_id = msg.channel_id.get(),
        moderator_id = msg.author.id.get(),
        days,
        deleted = outcome.deleted,
        "cleared old messages"
    );

    let what = format!("messages older than {days} days");
    let summary = purge_summary_message(&outcome, &what);
    reply_ephemeral(
        http,
        msg.channel_id,
        &summary,
        Duration::from_secs(CONFIRMATION_TTL_SECS),
    )
    .await
}
