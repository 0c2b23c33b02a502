use std::pin::pin;

use futures_util::TryStreamExt;
use tracing::{debug, error, warn};
use twilight_model::id::{
    Id,
    marker::{ChannelMarker, MessageMarker, UserMarker},
};

use crate::{
    error::ModerationError,
    history::{ScanBounds, scan},
    platform::{MessagePlatform, MessageRecord},
    time::now_unix_secs,
};

/// Messages older than this cannot be bulk deleted.
pub const BULK_DELETE_MAX_AGE_SECS: i64 = 14 * 24 * 60 * 60;
const BULK_DELETE_SAFETY_BUFFER_SECS: i64 = 60 * 60;
/// Most ids accepted by one bulk delete request.
pub const BULK_DELETE_BATCH: usize = 100;
/// Per-invocation ceiling for manually requested purges.
pub const MANUAL_PURGE_CEILING: i64 = 100;

/// How one purge call removes its candidates.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DeleteStrategy {
    /// Batched deletes; only valid when every candidate is inside the bulk age window.
    Bulk,
    /// One request per message.
    Sequential,
}

impl DeleteStrategy {
    /// Pick the strategy from the oldest candidate's creation time.
    pub fn for_oldest(oldest_secs: i64, now_secs: i64) -> Self {
        let bulk_cutoff = now_secs
            .saturating_sub(BULK_DELETE_MAX_AGE_SECS.saturating_sub(BULK_DELETE_SAFETY_BUFFER_SECS));

        if oldest_secs >= bulk_cutoff {
            Self::Bulk
        } else {
            Self::Sequential
        }
    }
}

/// Bounds and exclusions for one purge call.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct PurgeRequest {
    /// Only consider messages created strictly before this unix second.
    pub older_than: Option<i64>,
    /// Maximum number of matching messages to delete.
    pub limit: Option<i64>,
    /// Maximum number of history messages to examine.
    pub scan_limit: Option<usize>,
    /// Upper bound `limit` is checked against, if any.
    pub ceiling: Option<i64>,
    /// Never delete or count this message (the invoking command).
    pub exclude: Option<Id<MessageMarker>>,
}

impl PurgeRequest {
    /// A user-requested purge of `limit` messages, capped at [`MANUAL_PURGE_CEILING`].
    pub fn manual(limit: i64) -> Self {
        Self {
            limit: Some(limit),
            ceiling: Some(MANUAL_PURGE_CEILING),
            ..Self::default()
        }
    }

    /// Everything created before `cutoff_secs`, without a count bound.
    pub fn older_than(cutoff_secs: i64) -> Self {
        Self {
            older_than: Some(cutoff_secs),
            ..Self::default()
        }
    }

    /// The whole channel history.
    pub fn everything() -> Self {
        Self::default()
    }

    pub fn excluding(mut self, message_id: Id<MessageMarker>) -> Self {
        self.exclude = Some(message_id);
        self
    }

    pub fn scanning(mut self, scan_limit: usize) -> Self {
        self.scan_limit = Some(scan_limit);
        self
    }

    /// Reject non-positive limits and limits above the ceiling.
    pub fn validate(&self) -> Result<(), ModerationError> {
        match (self.limit, self.ceiling) {
            (Some(limit), _) if limit <= 0 => Err(ModerationError::validation(
                "Please specify a positive number of messages to delete.",
            )),
            (Some(limit), Some(ceiling)) if limit > ceiling => Err(ModerationError::validation(
                format!("Cannot delete more than {ceiling} messages at once."),
            )),
            _ => Ok(()),
        }
    }
}

/// Result of a purge that got as far as deleting.
#[derive(Debug, Default)]
pub struct PurgeOutcome {
    pub deleted: u64,
    /// Candidates selected before deletion started.
    pub matched: usize,
    /// `None` when nothing matched.
    pub strategy: Option<DeleteStrategy>,
    /// The error that stopped deletion early, if any.
    pub interrupted: Option<ModerationError>,
}

impl PurgeOutcome {
    pub fn is_complete(&self) -> bool {
        self.interrupted.is_none()
    }
}

/// Messages created strictly before `cutoff_secs`.
pub fn created_before(cutoff_secs: i64) -> impl Fn(&MessageRecord) -> bool + Send + Sync {
    move |message| message.timestamp < cutoff_secs
}

pub fn authored_by(user_id: Id<UserMarker>) -> impl Fn(&MessageRecord) -> bool + Send + Sync {
    move |message| message.author_id == user_id
}

pub fn any_message(_message: &MessageRecord) -> bool {
    true
}

/// Delete messages in `channel_id` matching `predicate`.
///
/// Validation happens before any platform call. Scan failures are returned as
/// errors; failures while deleting end the run and are reported through
/// [`PurgeOutcome::interrupted`] alongside the count deleted so far.
pub async fn purge<P, F>(
    platform: &P,
    channel_id: Id<ChannelMarker>,
    predicate: F,
    request: PurgeRequest,
) -> Result<PurgeOutcome, ModerationError>
where
    P: MessagePlatform + ?Sized,
    F: Fn(&MessageRecord) -> bool + Send + Sync,
{
    purge_at(platform, channel_id, predicate, request, now_unix_secs()).await
}

/// [`purge`] with an explicit notion of "now" for strategy selection.
pub async fn purge_at<P, F>(
    platform: &P,
    channel_id: Id<ChannelMarker>,
    predicate: F,
    request: PurgeRequest,
    now_secs: i64,
) -> Result<PurgeOutcome, ModerationError>
where
    P: MessagePlatform + ?Sized,
    F: Fn(&MessageRecord) -> bool + Send + Sync,
{
    request.validate()?;

    let candidates = collect_candidates(platform, channel_id, &predicate, &request).await?;
    let Some(oldest) = candidates.iter().map(|(_, timestamp)| *timestamp).min() else {
        return Ok(PurgeOutcome::default());
    };

    let strategy = DeleteStrategy::for_oldest(oldest, now_secs);
    let ids: Vec<Id<MessageMarker>> = candidates.iter().map(|(id, _)| *id).collect();
    debug!(
        channel_id = channel_id.get(),
        candidates = ids.len(),
        ?strategy,
        "purge candidates selected"
    );

    let mut outcome = PurgeOutcome {
        matched: ids.len(),
        strategy: Some(strategy),
        ..PurgeOutcome::default()
    };

    let single_delete_ids = match strategy {
        DeleteStrategy::Bulk => bulk_delete(platform, channel_id, &ids, &mut outcome).await,
        DeleteStrategy::Sequential => ids,
    };

    outcome.interrupted =
        delete_one_by_one(platform, channel_id, &single_delete_ids, &mut outcome.deleted).await;

    Ok(outcome)
}

async fn collect_candidates<P, F>(
    platform: &P,
    channel_id: Id<ChannelMarker>,
    predicate: &F,
    request: &PurgeRequest,
) -> Result<Vec<(Id<MessageMarker>, i64)>, ModerationError>
where
    P: MessagePlatform + ?Sized,
    F: Fn(&MessageRecord) -> bool + Send + Sync,
{
    let wanted = request
        .limit
        .map(|limit| usize::try_from(limit).unwrap_or(usize::MAX));
    let bounds = ScanBounds {
        older_than: request.older_than,
        limit: request.scan_limit,
    };

    let mut history = pin!(scan(platform, channel_id, bounds));
    let mut candidates = Vec::new();

    while let Some(message) = history.try_next().await? {
        if request.exclude == Some(message.id) || !predicate(&message) {
            continue;
        }
        candidates.push((message.id, message.timestamp));

        if wanted.is_some_and(|wanted| candidates.len() >= wanted) {
            break;
        }
    }

    Ok(candidates)
}

/// Bulk delete in batches, returning ids that still need a single delete.
async fn bulk_delete<P>(
    platform: &P,
    channel_id: Id<ChannelMarker>,
    ids: &[Id<MessageMarker>],
    outcome: &mut PurgeOutcome,
) -> Vec<Id<MessageMarker>>
where
    P: MessagePlatform + ?Sized,
{
    let mut single_delete_ids = Vec::new();

    for chunk in ids.chunks(BULK_DELETE_BATCH) {
        if chunk.len() < 2 {
            single_delete_ids.extend_from_slice(chunk);
            continue;
        }

        match platform.delete_messages(channel_id, chunk).await {
            Ok(()) => {
                outcome.deleted = outcome.deleted.saturating_add(chunk.len() as u64);
            }
            Err(source) => {
                error!(
                    ?source,
                    channel_id = channel_id.get(),
                    count = chunk.len(),
                    "bulk delete failed, falling back to single delete"
                );
                single_delete_ids.extend_from_slice(chunk);
            }
        }
    }

    single_delete_ids
}

/// Delete each id in turn, stopping at the first real failure.
///
/// A message that is already gone counts as deleted.
async fn delete_one_by_one<P>(
    platform: &P,
    channel_id: Id<ChannelMarker>,
    ids: &[Id<MessageMarker>],
    deleted: &mut u64,
) -> Option<ModerationError>
where
    P: MessagePlatform + ?Sized,
{
    for &message_id in ids {
        match platform.delete_message(channel_id, message_id).await {
            Ok(()) | Err(ModerationError::NotFound(_)) => {
                *deleted = deleted.saturating_add(1);
            }
            Err(source) => {
                warn!(
                    ?source,
                    channel_id = channel_id.get(),
                    message_id = message_id.get(),
                    deleted = *deleted,
                    "single delete failed, stopping purge"
                );
                return Some(source);
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Call, DAY, FakePlatform};

    const NOW: i64 = 1_700_000_000;

    #[test]
    fn fresh_candidates_use_bulk() {
        assert_eq!(DeleteStrategy::for_oldest(NOW - 60, NOW), DeleteStrategy::Bulk);
        assert_eq!(
            DeleteStrategy::for_oldest(NOW - 13 * 24 * 60 * 60, NOW),
            DeleteStrategy::Bulk
        );
    }

    #[test]
    fn candidates_near_the_age_limit_use_sequential() {
        let inside_buffer = NOW - BULK_DELETE_MAX_AGE_SECS + 60;
        assert_eq!(
            DeleteStrategy::for_oldest(inside_buffer, NOW),
            DeleteStrategy::Sequential
        );
        assert_eq!(
            DeleteStrategy::for_oldest(NOW - 30 * 24 * 60 * 60, NOW),
            DeleteStrategy::Sequential
        );
    }

    #[test]
    fn manual_requests_reject_out_of_range_limits() {
        assert!(matches!(
            PurgeRequest::manual(0).validate(),
            Err(ModerationError::Validation(_))
        ));
        assert!(matches!(
            PurgeRequest::manual(-5).validate(),
            Err(ModerationError::Validation(_))
        ));
        assert!(matches!(
            PurgeRequest::manual(150).validate(),
            Err(ModerationError::Validation(_))
        ));
        assert!(PurgeRequest::manual(100).validate().is_ok());
        assert!(PurgeRequest::manual(1).validate().is_ok());
    }

    #[test]
    fn age_based_requests_have_no_ceiling() {
        let request = PurgeRequest {
            limit: Some(10_000),
            ..PurgeRequest::older_than(NOW)
        };
        assert!(request.validate().is_ok());
        assert!(PurgeRequest::everything().validate().is_ok());
    }

    #[tokio::test]
    async fn non_positive_limit_never_reaches_the_platform() {
        let platform = FakePlatform::new();
        platform.post(1, 7, 60);

        for limit in [0, -1, -100] {
            let result = purge_at(
                &platform,
                Id::new(1),
                any_message,
                PurgeRequest::manual(limit),
                NOW,
            )
            .await;
            assert!(matches!(result, Err(ModerationError::Validation(_))));
        }

        assert!(platform.calls().is_empty());
    }

    #[tokio::test]
    async fn manual_limit_above_ceiling_is_rejected() {
        let platform = FakePlatform::new();
        platform.post(1, 7, 60);

        let result = purge_at(
            &platform,
            Id::new(1),
            any_message,
            PurgeRequest::manual(150),
            NOW,
        )
        .await;

        assert!(matches!(result, Err(ModerationError::Validation(_))));
        assert!(platform.calls().is_empty());
        assert_eq!(platform.remaining(1).len(), 1);
    }

    #[tokio::test]
    async fn manual_purge_skips_the_command_message() {
        let platform = FakePlatform::new();
        for age in 1..=120 {
            platform.post(1, 7, age * 60);
        }
        let command = platform.post(1, 8, 0);

        let outcome = purge_at(
            &platform,
            Id::new(1),
            any_message,
            PurgeRequest::manual(50).excluding(command),
            NOW,
        )
        .await
        .unwrap();

        assert_eq!(outcome.deleted, 50);
        assert_eq!(outcome.strategy, Some(DeleteStrategy::Bulk));
        assert!(outcome.is_complete());
        assert!(platform.contains(1, command));
        assert_eq!(platform.remaining(1).len(), 71);
        assert!(platform.calls().contains(&Call::BulkDelete(Id::new(1), 50)));
    }

    #[tokio::test]
    async fn single_recent_candidate_uses_a_single_delete() {
        let platform = FakePlatform::new();
        let only = platform.post(1, 7, 60);

        let outcome = purge_at(&platform, Id::new(1), any_message, PurgeRequest::manual(10), NOW)
            .await
            .unwrap();

        assert_eq!(outcome.deleted, 1);
        assert_eq!(platform.calls().last(), Some(&Call::Delete(Id::new(1), only)));
    }

    #[tokio::test]
    async fn old_candidates_switch_to_sequential() {
        let platform = FakePlatform::new();
        platform.post(1, 7, DAY);
        platform.post(1, 7, 20 * DAY);
        platform.post(1, 7, 30 * DAY);

        let outcome = purge_at(
            &platform,
            Id::new(1),
            any_message,
            PurgeRequest::everything(),
            NOW,
        )
        .await
        .unwrap();

        assert_eq!(outcome.strategy, Some(DeleteStrategy::Sequential));
        assert_eq!(outcome.deleted, 3);
        assert!(
            !platform
                .calls()
                .iter()
                .any(|call| matches!(call, Call::BulkDelete(..)))
        );
    }

    #[tokio::test]
    async fn age_cutoff_deletes_strictly_older_messages() {
        let platform = FakePlatform::new();
        let cutoff = NOW - 7 * DAY;
        let newer = platform.post_at(1, 7, cutoff + 3600);
        let boundary = platform.post_at(1, 7, cutoff);
        platform.post_at(1, 7, cutoff - 1);
        platform.post_at(1, 7, cutoff - 3 * DAY);

        let outcome = purge_at(
            &platform,
            Id::new(1),
            created_before(cutoff),
            PurgeRequest::older_than(cutoff),
            NOW,
        )
        .await
        .unwrap();

        assert_eq!(outcome.deleted, 2);
        assert!(platform.contains(1, newer));
        assert!(platform.contains(1, boundary));
        assert_eq!(platform.remaining(1).len(), 2);
    }

    #[tokio::test]
    async fn failure_partway_keeps_progress() {
        let platform = FakePlatform::new();
        for age in 0..5 {
            platform.post(1, 7, 30 * DAY + age);
        }
        *platform.delete_budget.lock().unwrap() = Some(3);

        let outcome = purge_at(
            &platform,
            Id::new(1),
            any_message,
            PurgeRequest::everything(),
            NOW,
        )
        .await
        .unwrap();

        assert_eq!(outcome.deleted, 3);
        assert_eq!(outcome.matched, 5);
        assert!(matches!(
            outcome.interrupted,
            Some(ModerationError::Permission(_))
        ));
        assert_eq!(platform.remaining(1).len(), 2);
    }

    #[tokio::test]
    async fn already_deleted_counts_as_success() {
        let platform = FakePlatform::new();
        platform.post(1, 7, 20 * DAY);
        let ghost = platform.post(1, 7, 21 * DAY);
        platform.vanished.lock().unwrap().insert(ghost);

        let outcome = purge_at(
            &platform,
            Id::new(1),
            any_message,
            PurgeRequest::everything(),
            NOW,
        )
        .await
        .unwrap();

        assert_eq!(outcome.deleted, 2);
        assert!(outcome.is_complete());
    }

    #[tokio::test]
    async fn failed_bulk_batch_falls_back_to_single_deletes() {
        let platform = FakePlatform::new();
        for age in 1..=5 {
            platform.post(1, 7, age * 60);
        }
        *platform.fail_bulk.lock().unwrap() = true;

        let outcome = purge_at(&platform, Id::new(1), any_message, PurgeRequest::manual(5), NOW)
            .await
            .unwrap();

        assert_eq!(outcome.deleted, 5);
        assert!(platform.remaining(1).is_empty());
    }

    #[tokio::test]
    async fn author_filter_within_scan_window() {
        let platform = FakePlatform::new();
        for age in 1..=20 {
            let author = if age % 2 == 0 { 7 } else { 8 };
            platform.post(1, author, age * 60);
        }
        platform.post(1, 7, 3600);

        let request = PurgeRequest::manual(10).scanning(20);
        let outcome = purge_at(&platform, Id::new(1), authored_by(Id::new(7)), request, NOW)
            .await
            .unwrap();

        assert_eq!(outcome.deleted, 10);
        let remaining = platform.remaining(1);
        assert_eq!(remaining.len(), 11);
        assert_eq!(
            remaining
                .iter()
                .filter(|message| message.author_id == Id::new(7))
                .count(),
            1
        );
    }

    #[tokio::test]
    async fn disjoint_channels_do_not_interfere() {
        let platform = FakePlatform::new();
        for age in 1..=10 {
            platform.post(1, 7, 30 * DAY + age);
            platform.post(2, 7, 30 * DAY + age);
        }

        let (first, second) = tokio::join!(
            purge_at(&platform, Id::new(1), any_message, PurgeRequest::everything(), NOW),
            purge_at(&platform, Id::new(2), any_message, PurgeRequest::manual(4), NOW),
        );

        assert_eq!(first.unwrap().deleted, 10);
        assert_eq!(second.unwrap().deleted, 4);
        assert!(platform.remaining(1).is_empty());
        assert_eq!(platform.remaining(2).len(), 6);
    }

    #[tokio::test]
    async fn nothing_matching_reports_zero() {
        let platform = FakePlatform::new();
        platform.post(1, 7, 60);

        let outcome = purge_at(
            &platform,
            Id::new(1),
            created_before(NOW - DAY),
            PurgeRequest::everything(),
            NOW,
        )
        .await
        .unwrap();

        assert_eq!(outcome.deleted, 0);
        assert_eq!(outcome.strategy, None);
        assert_eq!(platform.deletion_calls(), 0);
    }
}
