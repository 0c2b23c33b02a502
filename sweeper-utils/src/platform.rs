use async_trait::async_trait;
use twilight_http::Client;
use twilight_model::{
    channel::{Message, message::embed::Embed},
    id::{
        Id,
        marker::{ChannelMarker, MessageMarker, UserMarker},
    },
};

use crate::error::ModerationError;

/// A channel message as seen by the scanner, purge predicates and backups.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MessageRecord {
    pub id: Id<MessageMarker>,
    pub author_id: Id<UserMarker>,
    pub author: String,
    pub content: String,
    /// Creation time in unix seconds.
    pub timestamp: i64,
    pub attachment_urls: Vec<String>,
    pub embed_count: usize,
}

impl From<Message> for MessageRecord {
    fn from(message: Message) -> Self {
        let author = if message.author.discriminator == 0 {
            message.author.name
        } else {
            format!(
                "{}#{:04}",
                message.author.name, message.author.discriminator
            )
        };

        Self {
            id: message.id,
            author_id: message.author.id,
            author,
            content: message.content,
            timestamp: message.timestamp.as_secs(),
            attachment_urls: message
                .attachments
                .into_iter()
                .map(|attachment| attachment.url)
                .collect(),
            embed_count: message.embeds.len(),
        }
    }
}

/// The slice of the chat platform the cleanup core depends on.
#[async_trait]
pub trait MessagePlatform: Send + Sync {
    /// One page of channel history, newest first, strictly older than `before`.
    async fn message_page(
        &self,
        channel_id: Id<ChannelMarker>,
        before: Option<Id<MessageMarker>>,
        limit: u16,
    ) -> Result<Vec<MessageRecord>, ModerationError>;

    async fn delete_message(
        &self,
        channel_id: Id<ChannelMarker>,
        message_id: Id<MessageMarker>,
    ) -> Result<(), ModerationError>;

    /// Bulk delete between 2 and 100 messages, all younger than the bulk age limit.
    async fn delete_messages(
        &self,
        channel_id: Id<ChannelMarker>,
        message_ids: &[Id<MessageMarker>],
    ) -> Result<(), ModerationError>;

    async fn send_embed(
        &self,
        channel_id: Id<ChannelMarker>,
        embed: Embed,
    ) -> Result<(), ModerationError>;
}

#[async_trait]
impl MessagePlatform for Client {
    async fn message_page(
        &self,
        channel_id: Id<ChannelMarker>,
        before: Option<Id<MessageMarker>>,
        limit: u16,
    ) -> Result<Vec<MessageRecord>, ModerationError> {
        let response = match before {
            Some(before_id) => {
                self.channel_messages(channel_id)
                    .before(before_id)
                    .limit(limit)
                    .await?
            }
            None => self.channel_messages(channel_id).limit(limit).await?,
        };

        let messages = response.model().await?;
        Ok(messages.into_iter().map(MessageRecord::from).collect())
    }

    async fn delete_message(
        &self,
        channel_id: Id<ChannelMarker>,
        message_id: Id<MessageMarker>,
    ) -> Result<(), ModerationError> {
        Client::delete_message(self, channel_id, message_id).await?;
        Ok(())
    }

    async fn delete_messages(
        &self,
        channel_id: Id<ChannelMarker>,
        message_ids: &[Id<MessageMarker>],
    ) -> Result<(), ModerationError> {
        Client::delete_messages(self, channel_id, message_ids).await?;
        Ok(())
    }

    async fn send_embed(
        &self,
        channel_id: Id<ChannelMarker>,
        embed: Embed,
    ) -> Result<(), ModerationError> {
        self.create_message(channel_id).embeds(&[embed]).await?;
        Ok(())
    }
}
