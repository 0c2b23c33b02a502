use sweeper_utils::{ModerationError, cleanup::PurgeOutcome};

/// How long purge confirmations stay in the channel.
pub const CONFIRMATION_TTL_SECS: u64 = 5;

pub fn usage_message(usage: &str) -> String {
    format!("Usage: `{usage}`")
}

pub fn guild_only_message() -> &'static str {
    "This command only works in servers."
}

pub fn error_message(source: &ModerationError) -> String {
    source.user_message()
}

/// Summarize a purge for the invoking channel.
///
/// `what` completes "Deleted N ..." e.g. `"messages older than 7 days"`.
pub fn purge_summary_message(outcome: &PurgeOutcome, what: &str) -> String {
    match &outcome.interrupted {
        None => format!("Deleted {} {}.", outcome.deleted, what),
        Some(source) => format!(
            "Deleted {} of {} {} before stopping: {}",
            outcome.deleted,
            outcome.matched,
            what,
            source.user_message()
        ),
    }
}
