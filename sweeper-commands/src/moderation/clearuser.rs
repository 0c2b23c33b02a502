use std::time::Duration;

use tracing::info;
use twilight_model::gateway::payload::incoming::MessageCreate;

use crate::CommandMeta;
use crate::checks::{ensure_capability, reply_ephemeral};
use crate::moderation::embeds::{
    CONFIRMATION_TTL_SECS, error_message, purge_summary_message, usage_message,
};
use sweeper_core::Context;
use sweeper_utils::cleanup::{PurgeRequest, authored_by, purge};
use sweeper_utils::parse::{parse_count, parse_target_user_id};
use sweeper_utils::permissions::Capability;

pub const META: CommandMeta = CommandMeta {
    name: "clearuser",
    desc: "Delete recent messages from one user in this channel.",
    category: "moderation",
    usage: "!clearuser <user> [amount=10]",
};

const DEFAULT_AMOUNT: i64 = 10;

/// How many history messages are examined per requested deletion.
const SCAN_FACTOR: i64 = 2;

/// Delete up to `amount` of the target's messages among the latest `2 * amount`.
pub async fn run(
    ctx: Context,
    msg: Box<MessageCreate>,
    arg1: Option<&str>,
    arg_tail: Option<&str>,
) -> anyhow::Result<()> {
    let http = &ctx.http;
    if !ensure_capability(&ctx, &msg, Capability::ManageMessages).await? {
        return Ok(());
    }

    let Some(target_user_id) = arg1.and_then(parse_target_user_id) else {
        let usage = usage_message(META.usage);
        http.create_message(msg.channel_id).content(&usage).await?;
        return Ok(());
    };

    let Some(amount) = parse_count(arg_tail, DEFAULT_AMOUNT) else {
        let usage = usage_message(META.usage);
        http.create_message(msg.channel_id).content(&usage).await?;
        return Ok(());
    };

    let scan_limit = usize::try_from(amount.saturating_mul(SCAN_FACTOR)).unwrap_or(0);
    let request = PurgeRequest::manual(amount)
        .scanning(scan_limit)
        .excluding(msg.id);

    let outcome = match purge(
        http.as_ref(),
        msg.channel_id,
        authored_by(target_user_id),
        request,
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
        target_user_id = target_user_id.get(),
        deleted = outcome.deleted,
        "cleared user messages"
    );

    let what = format!("messages from <@{}>", target_user_id.get());
    let summary = purge_summary_message(&outcome, &what);
    reply_ephemeral(
        http,
        msg.channel_id,
        &summary,
        Duration::from_secs(CONFIRMATION_TTL_SECS),
    )
    .await
}
