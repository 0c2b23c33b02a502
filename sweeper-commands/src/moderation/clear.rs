use std::time::Duration;

use tracing::info;
use twilight_model::gateway::payload::incoming::MessageCreate;

use crate::CommandMeta;
use crate::checks::{ensure_capability, reply_ephemeral};
use crate::moderation::embeds::{
    CONFIRMATION_TTL_SECS, error_message, purge_summary_message, usage_message,
};
use sweeper_core::Context;
use sweeper_utils::cleanup::{PurgeRequest, any_message, purge};
use sweeper_utils::parse::parse_count;
use sweeper_utils::permissions::Capability;

pub const META: CommandMeta = CommandMeta {
    name: "clear",
    desc: "Delete the latest messages in this channel (up to 100).",
    category: "moderation",
    usage: "!clear [amount=10]",
};

const DEFAULT_AMOUNT: i64 = 10;

/// Delete a bounded number of recent channel messages.
///
/// The invoking message is not counted towards `amount` and is removed
/// separately afterwards.
pub async fn run(ctx: Context, msg: Box<MessageCreate>, arg1: Option<&str>) -> anyhow::Result<()> {
    let http = &ctx.http;
    if !ensure_capability(&ctx, &msg, Capability::ManageMessages).await? {
        return Ok(());
    }

    let Some(amount) = parse_count(arg1, DEFAULT_AMOUNT) else {
        let usage = usage_message(META.usage);
        http.create_message(msg.channel_id).content(&usage).await?;
        return Ok(());
    };

    let request = PurgeRequest::manual(amount).excluding(msg.id);
    let outcome = match purge(http.as_ref(), msg.channel_id, any_message, request).await {
        Ok(outcome) => outcome,
        Err(source) => {
            http.create_message(msg.channel_id)
                .content(&error_message(&source))
                .await?;
            return Ok(());
        }
    };

    let _ = http.delete_message(msg.channel_id, msg.id).await;

    info!(
        channel_id = msg.channel_id.get(),
        moderator_id = msg.author.id.get(),
        deleted = outcome.deleted,
        "cleared messages"
    );

    let summary = purge_summary_message(&outcome, "messages");
    reply_ephemeral(
        http,
        msg.channel_id,
        &summary,
        Duration::from_secs(CONFIRMATION_TTL_SECS),
    )
    .await
}
