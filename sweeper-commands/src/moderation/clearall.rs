use tracing::info;
use twilight_model::gateway::payload::incoming::MessageCreate;

use crate::CommandMeta;
use crate::checks::ensure_capability;
use crate::moderation::embeds::{error_message, purge_summary_message};
use sweeper_core::Context;
use sweeper_utils::cleanup::{PurgeRequest, any_message, purge};
use sweeper_utils::confirm::{CONFIRM_TIMEOUT, CONFIRM_WORD};
use sweeper_utils::permissions::Capability;

pub const META: CommandMeta = CommandMeta {
    name: "clearall",
    desc: "Delete every message in this channel after confirmation.",
    category: "moderation",
    usage: "!clearall",
};

/// Wipe the channel once the invoking administrator types the confirm word.
///
/// Nothing is deleted when the confirmation window lapses.
pub async fn run(ctx: Context, msg: Box<MessageCreate>) -> anyhow::Result<()> {
    let http = &ctx.http;
    if !ensure_capability(&ctx, &msg, Capability::Administrator).await? {
        return Ok(());
    }

    let prompt = format!(
        "This will delete ALL messages in this channel. Type `{}` within {} seconds to proceed.",
        CONFIRM_WORD,
        CONFIRM_TIMEOUT.as_secs()
    );
    http.create_message(msg.channel_id).content(&prompt).await?;

    let confirmed = ctx
        .confirmations
        .wait_for(msg.channel_id, msg.author.id, CONFIRM_TIMEOUT)
        .await;

    if !confirmed {
        http.create_message(msg.channel_id)
            .content("Command cancelled - no confirmation received.")
            .await?;
        return Ok(());
    }

    let outcome = match purge(
        http.as_ref(),
        msg.channel_id,
        any_message,
        PurgeRequest::everything(),
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
        deleted = outcome.deleted,
        "cleared all messages"
    );

    let summary = if outcome.is_complete() {
        format!("Deleted all {} messages from this channel.", outcome.deleted)
    } else {
        purge_summary_message(&outcome, "messages")
    };
    http.create_message(msg.channel_id).content(&summary).await?;

    Ok(())
}
