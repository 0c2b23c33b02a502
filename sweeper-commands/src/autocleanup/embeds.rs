use twilight_model::channel::message::embed::Embed;
use twilight_util::builder::embed::{EmbedBuilder, EmbedFieldBuilder, EmbedFooterBuilder};

use sweeper_core::scheduler::SweepSummary;
use sweeper_store::CleanupEntry;
use sweeper_utils::embed::{DEFAULT_EMBED_COLOR, REPORT_EMBED_COLOR};

/// Discord rejects embeds with more fields than this.
const MAX_EMBED_FIELDS: usize = 25;

/// Configured channels for one guild, one field per channel.
pub fn auto_cleanup_list_embed(
    entries: &[(u64, CleanupEntry)],
    scheduler_running: bool,
) -> anyhow::Result<Embed> {
    let status = if scheduler_running {
        "Scheduler running"
    } else {
        "Scheduler stopped"
    };

    let mut builder = EmbedBuilder::new()
        .title("Auto Cleanup Channels")
        .color(DEFAULT_EMBED_COLOR)
        .footer(EmbedFooterBuilder::new(status).build());

    for (channel_id, entry) in entries.iter().take(MAX_EMBED_FIELDS) {
        let field = EmbedFieldBuilder::new(
            format!("#{}", entry.channel_name),
            format!("<#{}> - cleanup after {} days", channel_id, entry.age_days),
        );
        builder = builder.field(field.build());
    }

    Ok(builder.validate()?.build())
}

/// Per-channel results of a manually triggered sweep.
pub fn sweep_summary_embed(summary: &SweepSummary) -> anyhow::Result<Embed> {
    let mut description = format!(
        "Swept {} channel(s), deleted **{}** message(s).\n\n",
        summary.channels.len(),
        summary.total_deleted()
    );

    for sweep in &summary.channels {
        let line = match &sweep.result {
            Ok(outcome) if outcome.is_complete() => format!(
                "<#{}>: {} deleted (older than {} days)\n",
                sweep.channel_id, outcome.deleted, sweep.age_days
            ),
            Ok(outcome) => format!(
                "<#{}>: {} deleted, then stopped\n",
                sweep.channel_id, outcome.deleted
            ),
            Err(source) => format!("<#{}>: failed ({})\n", sweep.channel_id, source),
        };
        description.push_str(&line);
    }

    let builder = EmbedBuilder::new()
        .title("Auto Cleanup Run")
        .color(REPORT_EMBED_COLOR)
        .description(description);

    Ok(builder.validate()?.build())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sweeper_core::scheduler::ChannelSweep;
    use sweeper_utils::{ModerationError, cleanup::PurgeOutcome};

    #[test]
    fn list_embed_has_a_field_per_channel() {
        let entries = vec![
            (
                1,
                CleanupEntry {
                    channel_name: "general".to_owned(),
                    age_days: 7,
                    guild_id: 9,
                },
            ),
            (
                2,
                CleanupEntry {
                    channel_name: "logs".to_owned(),
                    age_days: 30,
                    guild_id: 9,
                },
            ),
        ];

        let embed = auto_cleanup_list_embed(&entries, true).unwrap();
        assert_eq!(embed.fields.len(), 2);
        assert_eq!(embed.fields[0].name, "#general");
        assert!(embed.fields[1].value.contains("30 days"));
        assert_eq!(embed.footer.unwrap().text, "Scheduler running");
    }

    #[test]
    fn sweep_summary_lists_failures() {
        let summary = SweepSummary {
            channels: vec![
                ChannelSweep {
                    channel_id: 1,
                    age_days: 7,
                    cutoff_secs: 0,
                    result: Ok(PurgeOutcome {
                        deleted: 4,
                        matched: 4,
                        ..PurgeOutcome::default()
                    }),
                },
                ChannelSweep {
                    channel_id: 2,
                    age_days: 7,
                    cutoff_secs: 0,
                    result: Err(ModerationError::NotFound("Unknown Channel".to_owned())),
                },
            ],
        };

        let description = sweep_summary_embed(&summary).unwrap().description.unwrap();
        assert!(description.contains("deleted **4**"));
        assert!(description.contains("<#1>: 4 deleted"));
        assert!(description.contains("<#2>: failed"));
    }
}
