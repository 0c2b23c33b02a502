use twilight_model::channel::message::embed::Embed;
use twilight_util::builder::embed::{EmbedBuilder, EmbedFieldBuilder, EmbedFooterBuilder};

use crate::CommandMeta;
use crate::utility::channelstats::ChannelActivity;
use sweeper_utils::embed::{DEFAULT_EMBED_COLOR, build_titled_embed};

const STATS_EMBED_COLOR: u32 = 0x2e_cc_71;

pub fn unknown_category_message(wanted: &str, categories: &[&str]) -> String {
    format!(
        "Unknown category `{}`. Available: {}",
        wanted,
        categories
            .iter()
            .map(|category| format!("`{category}`"))
            .collect::<Vec<_>>()
            .join(", ")
    )
}

/// One heading per category followed by its commands.
///
/// Expects `commands` sorted by category.
pub fn grouped_help_description(commands: &[&CommandMeta]) -> String {
    let mut description = String::new();
    let mut current_category: Option<&str> = None;

    for command in commands {
        if current_category != Some(command.category) {
            if current_category.is_some() {
                description.push('\n');
            }
            description.push_str(&format!("**{}**\n", command.category));
            current_category = Some(command.category);
        }
        description.push_str(&format!("`{}` - {}\n", command.usage, command.desc));
    }

    description
}

pub fn help_embed(description: String) -> anyhow::Result<Embed> {
    build_titled_embed(
        "Commands",
        description,
        Some("Arguments in <> are required, [] are optional."),
    )
}

pub fn channel_stats_embed(
    channel_name: &str,
    activity: &ChannelActivity,
    created: &str,
    topic: Option<&str>,
) -> anyhow::Result<Embed> {
    let counts = EmbedFieldBuilder::new(
        "Message Count",
        format!(
            "Last 24 hours: {}\nLast 7 days: {}\nTotal: {}",
            activity.last_day, activity.last_week, activity.total
        ),
    )
    .inline();

    let info = EmbedFieldBuilder::new(
        "Channel Info",
        format!("Created: {}\nTopic: {}", created, topic.unwrap_or("None")),
    )
    .inline();

    let builder = EmbedBuilder::new()
        .title(format!("Channel Statistics for #{channel_name}"))
        .color(STATS_EMBED_COLOR)
        .field(counts)
        .field(info);

    Ok(builder.validate()?.build())
}

pub fn backup_started_embed(channel_id: u64, limit: usize) -> anyhow::Result<Embed> {
    let builder = EmbedBuilder::new()
        .title("Channel Backup")
        .color(DEFAULT_EMBED_COLOR)
        .description(format!(
            "Creating backup of <#{channel_id}>... This may take a while."
        ))
        .footer(EmbedFooterBuilder::new(format!("Up to {limit} messages")).build());

    Ok(builder.validate()?.build())
}
