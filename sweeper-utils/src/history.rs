use futures_util::{Stream, TryStreamExt, stream};
use twilight_model::id::{
    Id,
    marker::{ChannelMarker, MessageMarker},
};

use crate::{
    error::ModerationError,
    platform::{MessagePlatform, MessageRecord},
    time::snowflake_at,
};

/// Largest page the history endpoint returns.
pub const HISTORY_PAGE_SIZE: u16 = 100;

/// Optional bounds on a history scan.
///
/// With neither bound set the scan walks the entire channel; callers opt into
/// that explicitly through [`ScanBounds::unbounded`].
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct ScanBounds {
    /// Only yield messages created strictly before this unix second.
    pub older_than: Option<i64>,
    /// Stop after yielding this many messages.
    pub limit: Option<usize>,
}

impl ScanBounds {
    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn latest(limit: usize) -> Self {
        Self {
            older_than: None,
            limit: Some(limit),
        }
    }

    pub fn older_than(cutoff_secs: i64) -> Self {
        Self {
            older_than: Some(cutoff_secs),
            limit: None,
        }
    }
}

struct Cursor {
    before: Option<Id<MessageMarker>>,
    remaining: Option<usize>,
    exhausted: bool,
}

/// Lazily walk a channel's history, newest first.
///
/// Pages are only requested as the stream is polled. A platform error ends the
/// stream after being yielded.
pub fn scan<P>(
    platform: &P,
    channel_id: Id<ChannelMarker>,
    bounds: ScanBounds,
) -> impl Stream<Item = Result<MessageRecord, ModerationError>> + Send + '_
where
    P: MessagePlatform + ?Sized,
{
    let cursor = Cursor {
        before: bounds.older_than.and_then(snowflake_at),
        remaining: bounds.limit,
        exhausted: false,
    };

    let pages = stream::try_unfold(cursor, move |mut cursor| async move {
        if cursor.exhausted || cursor.remaining == Some(0) {
            return Ok(None);
        }

        let page_size = cursor.remaining.map_or(HISTORY_PAGE_SIZE, |remaining| {
            remaining.min(usize::from(HISTORY_PAGE_SIZE)) as u16
        });

        let page = platform
            .message_page(channel_id, cursor.before, page_size)
            .await?;

        if page.is_empty() {
            return Ok(None);
        }

        cursor.exhausted = page.len() < usize::from(page_size);
        cursor.before = page.last().map(|message| message.id);

        let mut kept: Vec<MessageRecord> = page
            .into_iter()
            .filter(|message| {
                bounds
                    .older_than
                    .is_none_or(|cutoff| message.timestamp < cutoff)
            })
            .collect();

        if let Some(remaining) = cursor.remaining.as_mut() {
            kept.truncate(*remaining);
            *remaining -= kept.len();
        }

        Ok::<_, ModerationError>(Some((kept, cursor)))
    });

    pages
        .map_ok(|page| stream::iter(page.into_iter().map(Ok::<_, ModerationError>)))
        .try_flatten()
}

/// Drain a scan into memory.
pub async fn collect<P>(
    platform: &P,
    channel_id: Id<ChannelMarker>,
    bounds: ScanBounds,
) -> Result<Vec<MessageRecord>, ModerationError>
where
    P: MessagePlatform + ?Sized,
{
    scan(platform, channel_id, bounds).try_collect().await
}
