use std::{
    collections::HashMap,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use tokio::sync::{Mutex, oneshot};
use twilight_model::id::{
    Id,
    marker::{ChannelMarker, UserMarker},
};

/// Word a user must type to confirm a pending destructive command.
pub const CONFIRM_WORD: &str = "confirm";
/// How long a pending confirmation stays open.
pub const CONFIRM_TIMEOUT: Duration = Duration::from_secs(10);

type WaiterKey = (Id<ChannelMarker>, Id<UserMarker>);

/// Pending "type confirm to proceed" prompts, keyed by channel and author.
///
/// Message handlers offer every incoming message to the gate before command
/// dispatch; the waiting command resumes when a matching one arrives.
#[derive(Clone, Default)]
pub struct ConfirmationGate {
    pending: Arc<Mutex<HashMap<WaiterKey, (u64, oneshot::Sender<()>)>>>,
    next_ticket: Arc<AtomicU64>,
}

impl ConfirmationGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait until `author_id` types the confirm word in `channel_id`.
    ///
    /// Returns `false` on timeout or when a newer prompt for the same user and
    /// channel replaces this one.
    pub async fn wait_for(
        &self,
        channel_id: Id<ChannelMarker>,
        author_id: Id<UserMarker>,
        timeout: Duration,
    ) -> bool {
        let key = (channel_id, author_id);
        let ticket = self.next_ticket.fetch_add(1, Ordering::Relaxed);
        let (sender, receiver) = oneshot::channel();
        self.pending.lock().await.insert(key, (ticket, sender));

        let confirmed = matches!(tokio::time::timeout(timeout, receiver).await, Ok(Ok(())));

        if !confirmed {
            let mut pending = self.pending.lock().await;
            if pending.get(&key).is_some_and(|(owner, _)| *owner == ticket) {
                pending.remove(&key);
            }
        }

        confirmed
    }

    /// Hand a message to the gate. Returns `true` when it completed a prompt.
    pub async fn offer(
        &self,
        channel_id: Id<ChannelMarker>,
        author_id: Id<UserMarker>,
        content: &str,
    ) -> bool {
        if !content.trim().eq_ignore_ascii_case(CONFIRM_WORD) {
            return false;
        }

        let Some((_, sender)) = self.pending.lock().await.remove(&(channel_id, author_id)) else {
            return false;
        };

        sender.send(()).is_ok()
    }

    pub async fn pending_count(&self) -> usize {
        self.pending.lock().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids() -> (Id<ChannelMarker>, Id<UserMarker>) {
        (Id::new(10), Id::new(20))
    }

    #[tokio::test]
    async fn matching_confirm_resumes_the_waiter() {
        let gate = ConfirmationGate::new();
        let (channel, author) = ids();

        let waiter = {
            let gate = gate.clone();
            tokio::spawn(async move { gate.wait_for(channel, author, Duration::from_secs(5)).await })
        };

        while gate.pending_count().await == 0 {
            tokio::task::yield_now().await;
        }

        assert!(gate.offer(channel, author, "  CONFIRM ").await);
        assert!(waiter.await.unwrap());
    }

    #[tokio::test]
    async fn other_authors_and_words_are_ignored() {
        let gate = ConfirmationGate::new();
        let (channel, author) = ids();

        let waiter = {
            let gate = gate.clone();
            tokio::spawn(
                async move { gate.wait_for(channel, author, Duration::from_millis(100)).await },
            )
        };

        while gate.pending_count().await == 0 {
            tokio::task::yield_now().await;
        }

        assert!(!gate.offer(channel, Id::new(99), "confirm").await);
        assert!(!gate.offer(channel, author, "yes").await);
        assert!(!waiter.await.unwrap());
        assert_eq!(gate.pending_count().await, 0);
    }

    #[tokio::test]
    async fn confirm_without_prompt_is_not_consumed() {
        let gate = ConfirmationGate::new();
        let (channel, author) = ids();
        assert!(!gate.offer(channel, author, "confirm").await);
    }
}
