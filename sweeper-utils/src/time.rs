use std::time::{SystemTime, UNIX_EPOCH};

use twilight_model::id::{Id, marker::MessageMarker};

/// Milliseconds between the unix epoch and the first second of 2015.
pub const DISCORD_EPOCH_MS: i64 = 1_420_070_400_000;

pub const SECS_PER_DAY: i64 = 24 * 60 * 60;

pub fn now_unix_secs() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |duration| duration.as_secs() as i64)
}

/// Lowest message id that could have been created at `secs`.
///
/// Paging with `before` this id yields only messages created strictly earlier.
/// Returns `None` for instants at or before the platform epoch.
pub fn snowflake_at(secs: i64) -> Option<Id<MessageMarker>> {
    let offset_ms = secs.checked_mul(1000)?.checked_sub(DISCORD_EPOCH_MS)?;
    if offset_ms <= 0 {
        return None;
    }

    Id::new_checked((offset_ms as u64) << 22)
}

/// Creation time encoded in a snowflake, in unix seconds.
pub fn snowflake_secs(id: Id<MessageMarker>) -> i64 {
    ((id.get() >> 22) as i64 + DISCORD_EPOCH_MS) / 1000
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snowflake_round_trips_whole_seconds() {
        let secs = 1_700_000_000;
        let id = snowflake_at(secs).unwrap();
        assert_eq!(snowflake_secs(id), secs);
    }

    #[test]
    fn earlier_instants_have_smaller_ids() {
        let a = snowflake_at(1_700_000_000).unwrap();
        let b = snowflake_at(1_700_000_001).unwrap();
        assert!(a < b);
    }

    #[test]
    fn pre_epoch_has_no_snowflake() {
        assert_eq!(snowflake_at(0), None);
        assert_eq!(snowflake_at(DISCORD_EPOCH_MS / 1000), None);
    }
}
