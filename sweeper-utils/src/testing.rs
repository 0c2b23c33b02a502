//! An in-memory [`MessagePlatform`] for tests of the scanner, purge executor and scheduler.

use std::{
    collections::{HashMap, HashSet},
    sync::Mutex,
};

use async_trait::async_trait;
use twilight_model::{
    channel::message::embed::Embed,
    id::{
        Id,
        marker::{ChannelMarker, MessageMarker, UserMarker},
    },
};

use crate::{
    error::ModerationError,
    platform::{MessagePlatform, MessageRecord},
    time::snowflake_at,
};

pub const NOW: i64 = 1_700_000_000;
pub const DAY: i64 = 24 * 60 * 60;

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Call {
    Page(Id<ChannelMarker>),
    Delete(Id<ChannelMarker>, Id<MessageMarker>),
    BulkDelete(Id<ChannelMarker>, usize),
    Embed(Id<ChannelMarker>),
}

/// In-memory channels with real snowflake ordering.
#[derive(Default)]
pub struct FakePlatform {
    channels: Mutex<HashMap<Id<ChannelMarker>, Vec<MessageRecord>>>,
    calls: Mutex<Vec<Call>>,
    sequence: Mutex<u64>,
    /// Channels whose history read answers 403.
    pub forbidden: Mutex<HashSet<Id<ChannelMarker>>>,
    /// Ids still listed in history but already gone on delete.
    pub vanished: Mutex<HashSet<Id<MessageMarker>>>,
    /// Single deletes allowed before every further one fails with 403.
    pub delete_budget: Mutex<Option<usize>>,
    pub fail_bulk: Mutex<bool>,
    pub fail_embeds: Mutex<bool>,
    pub embeds: Mutex<Vec<(Id<ChannelMarker>, Embed)>>,
}

impl FakePlatform {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a message posted `age_secs` before [`NOW`].
    pub fn post(
        &self,
        channel_id: u64,
        author_id: u64,
        age_secs: i64,
    ) -> Id<MessageMarker> {
        self.post_at(channel_id, author_id, NOW - age_secs)
    }

    pub fn post_at(&self, channel_id: u64, author_id: u64, timestamp: i64) -> Id<MessageMarker> {
        let mut sequence = self.sequence.lock().unwrap();
        *sequence += 1;
        let base = snowflake_at(timestamp).expect("timestamp after platform epoch");
        let id = Id::new(base.get() | (*sequence & 0x3f_ffff));

        let record = MessageRecord {
            id,
            author_id: Id::<UserMarker>::new(author_id),
            author: format!("user{author_id}"),
            content: format!("message {}", *sequence),
            timestamp,
            attachment_urls: Vec::new(),
            embed_count: 0,
        };

        let mut channels = self.channels.lock().unwrap();
        let messages = channels.entry(Id::new(channel_id)).or_default();
        messages.push(record);
        messages.sort_by(|a, b| b.id.cmp(&a.id));
        id
    }

    pub fn remaining(&self, channel_id: u64) -> Vec<MessageRecord> {
        self.channels
            .lock()
            .unwrap()
            .get(&Id::new(channel_id))
            .cloned()
            .unwrap_or_default()
    }

    pub fn contains(&self, channel_id: u64, message_id: Id<MessageMarker>) -> bool {
        self.remaining(channel_id)
            .iter()
            .any(|message| message.id == message_id)
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn deletion_calls(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, Call::Delete(..) | Call::BulkDelete(..)))
            .count()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl MessagePlatform for FakePlatform {
    async fn message_page(
        &self,
        channel_id: Id<ChannelMarker>,
        before: Option<Id<MessageMarker>>,
        limit: u16,
    ) -> Result<Vec<MessageRecord>, ModerationError> {
        self.record(Call::Page(channel_id));
        if self.forbidden.lock().unwrap().contains(&channel_id) {
            return Err(ModerationError::Permission("Missing Access".to_owned()));
        }

        let channels = self.channels.lock().unwrap();
        let page = channels
            .get(&channel_id)
            .map(|messages| {
                messages
                    .iter()
                    .filter(|message| before.is_none_or(|before| message.id < before))
                    .take(usize::from(limit))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        Ok(page)
    }

    async fn delete_message(
        &self,
        channel_id: Id<ChannelMarker>,
        message_id: Id<MessageMarker>,
    ) -> Result<(), ModerationError> {
        self.record(Call::Delete(channel_id, message_id));

        {
            let mut budget = self.delete_budget.lock().unwrap();
            if let Some(remaining) = budget.as_mut() {
                if *remaining == 0 {
                    return Err(ModerationError::Permission("Missing Permissions".to_owned()));
                }
                *remaining -= 1;
            }
        }

        let mut channels = self.channels.lock().unwrap();
        let messages = channels.entry(channel_id).or_default();

        if self.vanished.lock().unwrap().contains(&message_id) {
            messages.retain(|message| message.id != message_id);
            return Err(ModerationError::NotFound("Unknown Message".to_owned()));
        }

        let before = messages.len();
        messages.retain(|message| message.id != message_id);
        if messages.len() == before {
            return Err(ModerationError::NotFound("Unknown Message".to_owned()));
        }

        Ok(())
    }

    async fn delete_messages(
        &self,
        channel_id: Id<ChannelMarker>,
        message_ids: &[Id<MessageMarker>],
    ) -> Result<(), ModerationError> {
        self.record(Call::BulkDelete(channel_id, message_ids.len()));
        assert!(
            (2..=100).contains(&message_ids.len()),
            "bulk delete accepts 2..=100 ids"
        );

        if *self.fail_bulk.lock().unwrap() {
            return Err(ModerationError::Platform("bulk delete unavailable".to_owned()));
        }

        let mut channels = self.channels.lock().unwrap();
        let messages = channels.entry(channel_id).or_default();
        messages.retain(|message| !message_ids.contains(&message.id));
        Ok(())
    }

    async fn send_embed(
        &self,
        channel_id: Id<ChannelMarker>,
        embed: Embed,
    ) -> Result<(), ModerationError> {
        self.record(Call::Embed(channel_id));
        if *self.fail_embeds.lock().unwrap() {
            return Err(ModerationError::Permission("Missing Access".to_owned()));
        }

        self.embeds.lock().unwrap().push((channel_id, embed));
        Ok(())
    }
}
