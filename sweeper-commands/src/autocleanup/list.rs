use twilight_model::gateway::payload::incoming::MessageCreate;

use crate::CommandMeta;
use crate::autocleanup::embeds::auto_cleanup_list_embed;
use crate::checks::ensure_capability;
use sweeper_core::Context;
use sweeper_utils::permissions::Capability;

pub const META: CommandMeta = CommandMeta {
    name: "listauto",
    desc: "List channels in this server with auto cleanup enabled.",
    category: "autocleanup",
    usage: "!listauto",
};

pub async fn run(ctx: Context, msg: Box<MessageCreate>) -> anyhow::Result<()> {
    let http = &ctx.http;
    if !ensure_capability(&ctx, &msg, Capability::ManageMessages).await? {
        return Ok(());
    }
    let Some(guild_id) = msg.guild_id else {
        return Ok(());
    };

    let entries: Vec<_> = ctx
        .store
        .snapshot()
        .await
        .entries
        .into_iter()
        .filter(|(_, entry)| entry.guild_id == guild_id.get())
        .collect();

    if entries.is_empty() {
        http.create_message(msg.channel_id)
            .content("No channels have auto cleanup enabled.")
            .await?;
        return Ok(());
    }

    let embed = auto_cleanup_list_embed(&entries, ctx.scheduler.is_running())?;
    http.create_message(msg.channel_id).embeds(&[embed]).await?;

    Ok(())
}
