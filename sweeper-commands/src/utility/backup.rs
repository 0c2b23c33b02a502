use std::fmt::Write as _;

use tracing::info;
use twilight_model::{
    gateway::payload::incoming::MessageCreate, http::attachment::Attachment, util::Timestamp,
};

use crate::CommandMeta;
use crate::checks::{ensure_capability, fetch_guild_text_channel};
use crate::moderation::embeds::error_message;
use crate::utility::embeds::backup_started_embed;
use sweeper_core::Context;
use sweeper_utils::history::{ScanBounds, collect};
use sweeper_utils::parse::{parse_channel_id, parse_count};
use sweeper_utils::permissions::Capability;
use sweeper_utils::time::now_unix_secs;
use sweeper_utils::{MessageRecord, ModerationError};

pub const META: CommandMeta = CommandMeta {
    name: "backup",
    desc: "Upload a text transcript of recent channel messages.",
    category: "utility",
    usage: "!backup [#channel] [limit=1000]",
};

const DEFAULT_LIMIT: i64 = 1000;
const MAX_LIMIT: i64 = 5000;

/// Collect up to `limit` recent messages and upload them as a text file.
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

    let (channel_id, raw_limit) = match arg1.and_then(parse_channel_id) {
        Some(channel_id) => (channel_id, arg_tail),
        None => (msg.channel_id, arg1),
    };

    let Some(limit) = parse_count(raw_limit, DEFAULT_LIMIT) else {
        let usage = format!("Usage: `{}`", META.usage);
        http.create_message(msg.channel_id).content(&usage).await?;
        return Ok(());
    };

    if limit <= 0 {
        http.create_message(msg.channel_id)
            .content("Please specify a positive number of messages to back up.")
            .await?;
        return Ok(());
    }
    if limit > MAX_LIMIT {
        http.create_message(msg.channel_id)
            .content(&format!(
                "Limit cannot exceed {MAX_LIMIT} messages for performance reasons."
            ))
            .await?;
        return Ok(());
    }
    let limit = limit as usize;

    let Some(channel) = fetch_guild_text_channel(&ctx, &msg, channel_id).await? else {
        return Ok(());
    };
    let channel_name = channel
        .name
        .unwrap_or_else(|| channel_id.get().to_string());

    let started = backup_started_embed(channel_id.get(), limit)?;
    http.create_message(msg.channel_id)
        .embeds(&[started])
        .await?;

    let messages = match collect(http.as_ref(), channel_id, ScanBounds::latest(limit)).await {
        Ok(messages) => messages,
        Err(ModerationError::Permission(_)) => {
            http.create_message(msg.channel_id)
                .content("I don't have permission to read message history in that channel.")
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

    let generated_secs = now_unix_secs();
    let transcript = render_transcript(&channel_name, generated_secs, &messages)?;
    let filename = backup_filename(&channel_name, generated_secs)?;

    info!(
        channel_id = channel_id.get(),
        moderator_id = msg.author.id.get(),
        messages = messages.len(),
        %filename,
        "channel backup created"
    );

    let attachment = Attachment::from_bytes(filename, transcript.into_bytes(), 1);
    let out = format!(
        "Backup created successfully! {} messages backed up.",
        messages.len()
    );
    http.create_message(msg.channel_id)
        .content(&out)
        .attachments(&[attachment])
        .await?;

    Ok(())
}

/// Plain-text transcript, oldest message first.
///
/// `messages` is expected newest first, as the history scan yields them.
pub fn render_transcript(
    channel_name: &str,
    generated_secs: i64,
    messages: &[MessageRecord],
) -> anyhow::Result<String> {
    let mut out = String::new();
    writeln!(out, "Channel Backup: #{channel_name}")?;
    writeln!(out, "Generated: {}", Timestamp::from_secs(generated_secs)?.iso_8601())?;
    writeln!(out, "Total Messages: {}", messages.len())?;
    writeln!(out, "{}\n", "=".repeat(50))?;

    for message in messages.iter().rev() {
        writeln!(
            out,
            "[{}] {}: {}",
            Timestamp::from_secs(message.timestamp)?.iso_8601(),
            message.author,
            message.content
        )?;
        if !message.attachment_urls.is_empty() {
            writeln!(out, "  Attachments: {}", message.attachment_urls.join(", "))?;
        }
        out.push('\n');
    }

    Ok(out)
}

/// `backup_<channel>_<YYYYmmdd_HHMMSS>.txt` in UTC.
pub fn backup_filename(channel_name: &str, generated_secs: i64) -> anyhow::Result<String> {
    let iso = Timestamp::from_secs(generated_secs)?.iso_8601().to_string();
    let stamp: String = iso
        .chars()
        .take(19)
        .filter_map(|c| match c {
            '-' | ':' => None,
            'T' => Some('_'),
            other => Some(other),
        })
        .collect();

    Ok(format!("backup_{channel_name}_{stamp}.txt"))
}

#[cfg(test)]
mod tests {
    use twilight_model::id::Id;

    use super::*;

    // 2023-11-14T22:13:20Z
    const GENERATED: i64 = 1_700_000_000;

    fn record(id: u64, author: &str, content: &str, timestamp: i64) -> MessageRecord {
        MessageRecord {
            id: Id::new(id),
            author_id: Id::new(7),
            author: author.to_owned(),
            content: content.to_owned(),
            timestamp,
            attachment_urls: Vec::new(),
            embed_count: 0,
        }
    }

    #[test]
    fn filename_uses_compact_utc_stamp() {
        assert_eq!(
            backup_filename("general", GENERATED).unwrap(),
            "backup_general_20231114_221320.txt"
        );
    }

    #[test]
    fn transcript_is_oldest_first() {
        let newest = record(2, "bob", "second", GENERATED - 10);
        let oldest = record(1, "alice", "first", GENERATED - 20);

        let transcript = render_transcript("general", GENERATED, &[newest, oldest]).unwrap();

        assert!(transcript.starts_with("Channel Backup: #general\n"));
        assert!(transcript.contains("Total Messages: 2\n"));
        let first = transcript.find("alice: first").unwrap();
        let second = transcript.find("bob: second").unwrap();
        assert!(first < second);
    }

    #[test]
    fn attachments_get_their_own_line() {
        let mut message = record(1, "alice", "look", GENERATED - 5);
        message.attachment_urls = vec!["https://cdn.example/a.png".to_owned()];

        let transcript = render_transcript("general", GENERATED, &[message]).unwrap();

        assert!(transcript.contains("alice: look\n  Attachments: https://cdn.example/a.png\n"));
    }

    #[test]
    fn empty_channel_still_has_a_header() {
        let transcript = render_transcript("quiet", GENERATED, &[]).unwrap();
        assert!(transcript.contains("Total Messages: 0"));
    }
}
