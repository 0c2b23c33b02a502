use std::{
    io,
    path::{Path, PathBuf},
    sync::Arc,
};

use tokio::sync::RwLock;
use tracing::info;

/// Persisted cleanup schedule document and its JSON encoding.
pub mod cleanup;

pub use cleanup::{CleanupConfig, CleanupEntry, DEFAULT_AGE_DAYS};

use cleanup::{encode_config, read_config};

/// Shared handle to the cleanup schedule file passed across crates.
///
/// Holds the cached document; every mutation rewrites the whole file before the
/// cache is updated. Writers inside this process are serialized by the lock, but
/// another process editing the same file is not coordinated with (last write wins).
#[derive(Clone)]
pub struct ConfigStore {
    path: Arc<PathBuf>,
    cached: Arc<RwLock<CleanupConfig>>,
}

impl ConfigStore {
    /// Load the document at `path` (defaults when absent or malformed).
    pub async fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let config = read_config(&path).await;
        info!(
            path = %path.display(),
            channels = config.entries.len(),
            enabled = config.enabled,
            "cleanup config loaded"
        );

        Self {
            path: Arc::new(path),
            cached: Arc::new(RwLock::new(config)),
        }
    }

    /// Copy of the cached document.
    pub async fn snapshot(&self) -> CleanupConfig {
        self.cached.read().await.clone()
    }

    /// Replace the cache with whatever is on disk now.
    pub async fn reload(&self) -> CleanupConfig {
        let fresh = read_config(&self.path).await;
        *self.cached.write().await = fresh.clone();
        fresh
    }

    /// Rewrite the file from the cache.
    pub async fn persist(&self) -> io::Result<()> {
        let guard = self.cached.read().await;
        write_document(&self.path, &guard).await
    }

    /// Add or overwrite a channel entry and mark cleanup enabled.
    pub async fn enable_channel(&self, channel_id: u64, entry: CleanupEntry) -> io::Result<()> {
        self.mutate(|config| {
            config.entries.insert(channel_id, entry);
            config.enabled = true;
        })
        .await
    }

    /// Remove a channel entry owned by `guild_id`, returning it if it existed.
    ///
    /// An entry belonging to another guild is left alone and reported as absent.
    /// Removing the last entry also clears `enabled`.
    pub async fn disable_channel(
        &self,
        guild_id: u64,
        channel_id: u64,
    ) -> io::Result<Option<CleanupEntry>> {
        self.mutate(|config| {
            let owned = config
                .entries
                .get(&channel_id)
                .is_some_and(|entry| entry.guild_id == guild_id);
            let removed = if owned {
                config.entries.remove(&channel_id)
            } else {
                None
            };
            clear_enabled_when_empty(config);
            removed
        })
        .await
    }

    /// Remove every entry owned by `guild_id`, returning how many were removed.
    pub async fn disable_guild(&self, guild_id: u64) -> io::Result<usize> {
        self.mutate(|config| {
            let before = config.entries.len();
            config.entries.retain(|_, entry| entry.guild_id != guild_id);
            clear_enabled_when_empty(config);
            before - config.entries.len()
        })
        .await
    }

    /// Remove every entry of every guild and clear `enabled`.
    pub async fn disable_all(&self) -> io::Result<usize> {
        self.mutate(|config| {
            let removed = config.entries.len();
            config.entries.clear();
            config.enabled = false;
            removed
        })
        .await
    }

    async fn mutate<T>(&self, apply: impl FnOnce(&mut CleanupConfig) -> T) -> io::Result<T> {
        let mut guard = self.cached.write().await;
        let mut next = guard.clone();
        let out = apply(&mut next);

        write_document(&self.path, &next).await?;
        *guard = next;

        Ok(out)
    }
}

fn clear_enabled_when_empty(config: &mut CleanupConfig) {
    if config.entries.is_empty() {
        config.enabled = false;
    }
}

async fn write_document(path: &Path, config: &CleanupConfig) -> io::Result<()> {
    let bytes = encode_config(config)?;
    tokio::fs::write(path, bytes).await
}
