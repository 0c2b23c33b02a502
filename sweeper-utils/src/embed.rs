use twilight_model::{
    channel::message::embed::Embed,
    id::{Id, marker::ChannelMarker},
    util::Timestamp,
};
use twilight_util::builder::embed::{EmbedBuilder, EmbedFooterBuilder};

/// Default embed color used across the bot UI.
pub const DEFAULT_EMBED_COLOR: u32 = 0x90_54_30;
/// Color for scheduled cleanup reports.
pub const REPORT_EMBED_COLOR: u32 = 0x34_98_db;

/// Log-channel report for one channel of a scheduled sweep.
pub fn cleanup_report_embed(
    channel_id: Id<ChannelMarker>,
    deleted: u64,
    age_days: u32,
    now_secs: i64,
) -> anyhow::Result<Embed> {
    let description = format!(
        "Deleted {} messages older than {} days from <#{}>",
        deleted,
        age_days,
        channel_id.get()
    );

    let builder = EmbedBuilder::new()
        .title("Auto Cleanup Report")
        .color(REPORT_EMBED_COLOR)
        .description(description)
        .timestamp(Timestamp::from_secs(now_secs)?);

    Ok(builder.validate()?.build())
}

/// Build a titled embed with the default color and an optional footer.
pub fn build_titled_embed(
    title: &str,
    description: impl Into<String>,
    footer_note: Option<&str>,
) -> anyhow::Result<Embed> {
    let builder = EmbedBuilder::new()
        .title(title)
        .color(DEFAULT_EMBED_COLOR)
        .description(description);

    let embed = match footer_note {
        Some(note) if !note.is_empty() => {
            let footer = EmbedFooterBuilder::new(note).build();
            builder.footer(footer).validate()?.build()
        }
        _ => builder.validate()?.build(),
    };

    Ok(embed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_names_channel_count_and_threshold() {
        let embed = cleanup_report_embed(Id::new(123), 42, 7, 1_700_000_000).unwrap();
        let description = embed.description.unwrap();
        assert!(description.contains("42 messages"));
        assert!(description.contains("7 days"));
        assert!(description.contains("<#123>"));
        assert_eq!(embed.title.as_deref(), Some("Auto Cleanup Report"));
    }

    #[test]
    fn empty_footer_is_omitted() {
        let embed = build_titled_embed("Title", "body", Some("")).unwrap();
        assert!(embed.footer.is_none());
        let embed = build_titled_embed("Title", "body", Some("note")).unwrap();
        assert_eq!(embed.footer.unwrap().text, "note");
    }
}
