use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use tokio::{
    task::JoinHandle,
    time::{MissedTickBehavior, interval},
};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use twilight_model::id::{Id, marker::ChannelMarker};

use sweeper_store::{CleanupConfig, CleanupEntry, ConfigStore};
use sweeper_utils::{
    MessagePlatform, ModerationError,
    cleanup::{PurgeOutcome, PurgeRequest, created_before, purge_at},
    embed::cleanup_report_embed,
    time::{SECS_PER_DAY, now_unix_secs},
};

/// Interval between sweeps unless configured otherwise.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

/// Result of sweeping one configured channel.
#[derive(Debug)]
pub struct ChannelSweep {
    pub channel_id: u64,
    pub age_days: u32,
    pub cutoff_secs: i64,
    pub result: Result<PurgeOutcome, ModerationError>,
}

impl ChannelSweep {
    pub fn deleted(&self) -> u64 {
        self.result.as_ref().map_or(0, |outcome| outcome.deleted)
    }
}

/// Everything one sweep did, in config order.
#[derive(Debug, Default)]
pub struct SweepSummary {
    pub channels: Vec<ChannelSweep>,
}

impl SweepSummary {
    pub fn total_deleted(&self) -> u64 {
        self.channels.iter().map(ChannelSweep::deleted).sum()
    }

    /// Channels whose purge failed outright or stopped early.
    pub fn failures(&self) -> usize {
        self.channels
            .iter()
            .filter(|sweep| {
                sweep
                    .result
                    .as_ref()
                    .map_or(true, |outcome| !outcome.is_complete())
            })
            .count()
    }
}

enum State {
    Stopped,
    Running {
        cancel: CancellationToken,
        handle: JoinHandle<()>,
    },
}

struct Inner {
    platform: Arc<dyn MessagePlatform>,
    store: ConfigStore,
    log_channel_id: Option<Id<ChannelMarker>>,
    interval: Duration,
    state: Mutex<State>,
}

/// Recurring auto-cleanup task with explicit Stopped and Running states.
///
/// Stopping only prevents the next sweep; a sweep already in progress runs to
/// completion.
#[derive(Clone)]
pub struct CleanupScheduler {
    inner: Arc<Inner>,
}

impl CleanupScheduler {
    pub fn new(
        platform: Arc<dyn MessagePlatform>,
        store: ConfigStore,
        log_channel_id: Option<Id<ChannelMarker>>,
        interval: Duration,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                platform,
                store,
                log_channel_id,
                interval,
                state: Mutex::new(State::Stopped),
            }),
        }
    }

    pub fn is_running(&self) -> bool {
        match &*self.lock_state() {
            State::Stopped => false,
            State::Running { handle, .. } => !handle.is_finished(),
        }
    }

    /// Start the timer. Returns `false` when it was already running.
    ///
    /// The first sweep happens immediately.
    pub fn start(&self) -> bool {
        let mut state = self.lock_state();
        if let State::Running { handle, .. } = &*state
            && !handle.is_finished()
        {
            return false;
        }

        let cancel = CancellationToken::new();
        let handle = tokio::spawn(run_timer(Arc::clone(&self.inner), cancel.clone()));
        *state = State::Running { cancel, handle };

        info!(interval_secs = self.inner.interval.as_secs(), "auto cleanup started");
        true
    }

    /// Stop the timer. Returns `false` when it was already stopped.
    pub fn stop(&self) -> bool {
        let mut state = self.lock_state();
        match std::mem::replace(&mut *state, State::Stopped) {
            State::Stopped => false,
            State::Running { cancel, handle } => {
                cancel.cancel();
                drop(handle);
                info!("auto cleanup stopped");
                true
            }
        }
    }

    /// Start or stop so the timer runs only while cleanup is enabled with entries.
    pub fn sync_with(&self, config: &CleanupConfig) {
        if config.enabled && !config.entries.is_empty() {
            self.start();
        } else {
            self.stop();
        }
    }

    /// Run one sweep at `now_secs` against the current config snapshot.
    pub async fn sweep_at(&self, now_secs: i64) -> SweepSummary {
        self.inner.sweep_at(now_secs, |_| true).await
    }

    /// Sweep only the channels configured by `guild_id`.
    pub async fn sweep_guild(&self, guild_id: u64) -> SweepSummary {
        self.sweep_guild_at(guild_id, now_unix_secs()).await
    }

    pub async fn sweep_guild_at(&self, guild_id: u64, now_secs: i64) -> SweepSummary {
        self.inner
            .sweep_at(now_secs, |entry| entry.guild_id == guild_id)
            .await
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, State> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

async fn run_timer(inner: Arc<Inner>, cancel: CancellationToken) {
    let mut ticker = interval(inner.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }

        let summary = inner.sweep_at(now_unix_secs(), |_| true).await;
        info!(
            channels = summary.channels.len(),
            deleted = summary.total_deleted(),
            failures = summary.failures(),
            "auto cleanup sweep finished"
        );
    }
}

impl Inner {
    async fn sweep_at<F>(&self, now_secs: i64, include: F) -> SweepSummary
    where
        F: Fn(&CleanupEntry) -> bool,
    {
        let config = self.store.snapshot().await;
        let mut summary = SweepSummary::default();

        for (&channel_id, entry) in config.entries.iter().filter(|(_, entry)| include(entry)) {
            let cutoff_secs = now_secs.saturating_sub(i64::from(entry.age_days) * SECS_PER_DAY);
            let result = self.sweep_channel(channel_id, entry.age_days, cutoff_secs, now_secs).await;

            match &result {
                Ok(outcome) => {
                    if let Some(source) = &outcome.interrupted {
                        warn!(
                            ?source,
                            channel_id,
                            deleted = outcome.deleted,
                            "auto cleanup stopped early"
                        );
                    } else if outcome.deleted > 0 {
                        info!(
                            channel_id,
                            channel_name = %entry.channel_name,
                            deleted = outcome.deleted,
                            age_days = entry.age_days,
                            "auto cleanup deleted messages"
                        );
                    }

                    if outcome.deleted > 0 {
                        self.report(channel_id, outcome.deleted, entry.age_days, now_secs)
                            .await;
                    }
                }
                Err(source) => {
                    error!(?source, channel_id, "error in auto cleanup for channel");
                }
            }

            summary.channels.push(ChannelSweep {
                channel_id,
                age_days: entry.age_days,
                cutoff_secs,
                result,
            });
        }

        summary
    }

    async fn sweep_channel(
        &self,
        channel_id: u64,
        age_days: u32,
        cutoff_secs: i64,
        now_secs: i64,
    ) -> Result<PurgeOutcome, ModerationError> {
        if age_days == 0 {
            return Err(ModerationError::validation("cleanup age must be at least one day"));
        }
        let Some(channel_id) = Id::<ChannelMarker>::new_checked(channel_id) else {
            return Err(ModerationError::NotFound(format!("channel {channel_id}")));
        };

        purge_at(
            self.platform.as_ref(),
            channel_id,
            created_before(cutoff_secs),
            PurgeRequest::older_than(cutoff_secs),
            now_secs,
        )
        .await
    }

    /// Best effort; the deletion already happened regardless of the outcome.
    async fn report(&self, channel_id: u64, deleted: u64, age_days: u32, now_secs: i64) {
        let Some(log_channel_id) = self.log_channel_id else {
            return;
        };
        let Some(channel_id) = Id::<ChannelMarker>::new_checked(channel_id) else {
            return;
        };

        let embed = match cleanup_report_embed(channel_id, deleted, age_days, now_secs) {
            Ok(embed) => embed,
            Err(source) => {
                warn!(?source, "failed to build cleanup report");
                return;
            }
        };

        if let Err(source) = self.platform.send_embed(log_channel_id, embed).await {
            warn!(
                ?source,
                log_channel_id = log_channel_id.get(),
                "failed to deliver cleanup report"
            );
        }
    }
}
