//! Expiring file store.
//!
//! Files that are too large to push through the chat channel are parked
//! here under an opaque handle and served over HTTP instead. Entries are
//! single-use: a retrieved file is reclaimed by the next sweep, and an
//! unretrieved one is reclaimed once its retention window lapses.

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::types::{FileStoreError, RetrievedFile, StoredFile};
use crate::config::StoreConfig;

pub struct ExpiringFileStore {
    config: StoreConfig,
    entries: RwLock<HashMap<String, StoredFile>>,
}

impl ExpiringFileStore {
    pub fn new(config: StoreConfig) -> Self {
        Self {
            config,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Moves a file into the store and returns its retrieval handle.
    ///
    /// The source file is copied, not renamed, so it may live on a
    /// different filesystem than the store directory.
    pub async fn register(
        &self,
        src: &Path,
        original_name: &str,
    ) -> Result<String, FileStoreError> {
        tokio::fs::create_dir_all(&self.config.dir).await?;

        let handle = Uuid::new_v4().simple().to_string();
        let dest = self.config.dir.join(&handle);
        tokio::fs::copy(src, &dest).await?;

        let entry = StoredFile {
            handle: handle.clone(),
            path: dest,
            original_name: original_name.to_string(),
            created_at: Utc::now(),
            retrieved: false,
        };

        let mut entries = self.entries.write().await;
        entries.insert(handle.clone(), entry);
        info!("Stored '{}' under handle {}", original_name, handle);

        Ok(handle)
    }

    /// Opens a stored file for streaming and marks it retrieved.
    ///
    /// Marking happens up front: once a client has started reading, the
    /// entry counts as consumed even if the transfer is cut short.
    pub async fn retrieve(&self, handle: &str) -> Result<RetrievedFile, FileStoreError> {
        let mut entries = self.entries.write().await;

        let entry = entries.get_mut(handle).ok_or(FileStoreError::NotFound {
            handle: handle.to_string(),
        })?;

        let file = match tokio::fs::File::open(&entry.path).await {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                // Backing file vanished out from under the entry
                warn!("Backing file missing for handle {}, dropping entry", handle);
                entries.remove(handle);
                return Err(FileStoreError::NotFound {
                    handle: handle.to_string(),
                });
            }
            Err(e) => return Err(FileStoreError::Io(e)),
        };

        let size_bytes = file.metadata().await?.len();
        entry.retrieved = true;
        debug!("Handle {} retrieved ({} bytes)", handle, size_bytes);

        Ok(RetrievedFile {
            file,
            original_name: entry.original_name.clone(),
            size_bytes,
        })
    }

    /// Reclaims retrieved and expired entries. Returns how many were removed.
    pub async fn sweep(&self) -> usize {
        self.sweep_at(Utc::now()).await
    }

    async fn sweep_at(&self, now: DateTime<Utc>) -> usize {
        let retention = Duration::hours(self.config.retention_hours as i64);
        let mut entries = self.entries.write().await;

        let doomed: Vec<String> = entries
            .values()
            .filter(|e| e.retrieved || now - e.created_at > retention)
            .map(|e| e.handle.clone())
            .collect();

        let mut removed = 0;
        for handle in doomed {
            let path = entries[&handle].path.clone();
            match tokio::fs::remove_file(&path).await {
                Ok(()) => {
                    entries.remove(&handle);
                    removed += 1;
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    entries.remove(&handle);
                    removed += 1;
                }
                Err(e) => {
                    // Keep the entry so the next sweep retries the delete
                    warn!("Failed to remove stored file {:?}: {}", path, e);
                }
            }
        }

        if removed > 0 {
            info!("Sweep reclaimed {} stored file(s)", removed);
        }
        removed
    }

    /// Spawns the periodic sweep loop.
    pub fn spawn_sweeper(
        self: Arc<Self>,
        mut shutdown_rx: broadcast::Receiver<()>,
    ) -> JoinHandle<()> {
        let store = self;
        tokio::spawn(async move {
            info!(
                "Store sweeper started (interval: {}s)",
                store.config.sweep_interval_secs
            );
            loop {
                tokio::select! {
                    _ = shutdown_rx.recv() => {
                        info!("Store sweeper received shutdown signal");
                        break;
                    }
                    _ = tokio::time::sleep(std::time::Duration::from_secs(
                        store.config.sweep_interval_secs,
                    )) => {
                        store.sweep().await;
                    }
                }
            }
        })
    }
}
