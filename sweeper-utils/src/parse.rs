use twilight_model::id::{
    Id,
    marker::{ChannelMarker, UserMarker},
};

/// Parse a target user from a raw argument (`<@id>`, `<@!id>`, or raw ID).
pub fn parse_target_user_id(raw: &str) -> Option<Id<UserMarker>> {
    let trimmed = raw.trim();

    let numeric = if trimmed.starts_with("<@") && trimmed.ends_with('>') {
        let without_wrappers = trimmed.strip_prefix("<@")?.strip_suffix('>')?;
        without_wrappers
            .strip_prefix('!')
            .unwrap_or(without_wrappers)
    } else {
        trimmed
    };

    Id::new_checked(numeric.parse::<u64>().ok()?)
}

/// Parse a channel from a raw argument (`<#id>` or raw ID).
pub fn parse_channel_id(raw: &str) -> Option<Id<ChannelMarker>> {
    let trimmed = raw.trim();

    let numeric = match trimmed.strip_prefix("<#") {
        Some(rest) => rest.strip_suffix('>')?,
        None => trimmed,
    };

    Id::new_checked(numeric.parse::<u64>().ok()?)
}

/// Parse a signed count argument, falling back to `default` when absent.
///
/// Range checks are left to the caller so that zero and negative values can be
/// reported with a specific message.
pub fn parse_count(raw: Option<&str>, default: i64) -> Option<i64> {
    match raw {
        Some(value) => value.trim().parse::<i64>().ok(),
        None => Some(default),
    }
}

/// Split the remaining arguments on whitespace.
pub fn split_args(tail: Option<&str>) -> Vec<&str> {
    tail.map(|value| value.split_whitespace().collect())
        .unwrap_or_default()
}
