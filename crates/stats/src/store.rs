//! Persistent usage counters
//!
//! Counters live in memory behind a single mutex and are written to a JSON
//! file with a write-temp-then-rename so a crash never leaves a truncated
//! file behind.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;

/// On-disk record of the aggregate counters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Counters {
    /// Videos delivered since tracking began
    pub total_downloads: u64,
    /// Every user id that ever used the bot
    pub total_users: BTreeSet<u64>,
    /// Unix timestamp (seconds) when tracking began
    pub start_time: f64,
}

impl Default for Counters {
    fn default() -> Self {
        Self {
            total_downloads: 0,
            total_users: BTreeSet::new(),
            start_time: unix_now(),
        }
    }
}

/// Read-only view of the counters for reporting
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub total_downloads: u64,
    pub total_users: usize,
    pub tracking_since: f64,
    /// Seconds since this process started
    pub uptime_seconds: i64,
}

/// Errors from loading or saving the counters file
#[derive(Debug, thiserror::Error)]
pub enum StatsError {
    #[error("failed to access stats file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file exists but doesn't hold a valid counters record
    #[error("stats file {} is corrupt: {source}", path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode stats: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Shared handle to the usage counters
///
/// Cloning is cheap; all clones see the same counters.
#[derive(Clone)]
pub struct StatsStore {
    inner: Arc<Inner>,
}

struct Inner {
    path: PathBuf,
    counters: Mutex<Counters>,
    /// Set when the in-memory counters differ from the file
    dirty: AtomicBool,
    /// Serializes file writes so temp files never interleave
    write_lock: tokio::sync::Mutex<()>,
    started_at: DateTime<Utc>,
}

impl StatsStore {
    /// Create a store with zeroed counters that will be saved at `path`
    pub fn fresh(path: impl Into<PathBuf>) -> Self {
        Self::with_counters(path.into(), Counters::default())
    }

    fn with_counters(path: PathBuf, counters: Counters) -> Self {
        Self {
            inner: Arc::new(Inner {
                path,
                counters: Mutex::new(counters),
                dirty: AtomicBool::new(false),
                write_lock: tokio::sync::Mutex::new(()),
                started_at: Utc::now(),
            }),
        }
    }

    /// Load counters from `path`
    ///
    /// A missing file yields fresh counters.
    ///
    /// # Errors
    /// * [`StatsError::Corrupt`] if the file can't be parsed
    /// * [`StatsError::Io`] if the file exists but can't be read
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StatsError> {
        let path = path.into();

        match tokio::fs::read(&path).await {
            Ok(bytes) => {
                let counters: Counters =
                    serde_json::from_slice(&bytes).map_err(|source| StatsError::Corrupt {
                        path: path.clone(),
                        source,
                    })?;
                tracing::info!(
                    "Loaded stats from {}: {} downloads, {} users",
                    path.display(),
                    counters.total_downloads,
                    counters.total_users.len()
                );
                Ok(Self::with_counters(path, counters))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("No stats file at {}, starting fresh", path.display());
                Ok(Self::fresh(path))
            }
            Err(source) => Err(StatsError::Io { path, source }),
        }
    }

    /// Move an unreadable counters file out of the way
    ///
    /// Returns the path the file was moved to (`<name>.corrupt`).
    pub async fn quarantine(path: &Path) -> Result<PathBuf, StatsError> {
        let target = sibling_with_suffix(path, "corrupt");
        tokio::fs::rename(path, &target)
            .await
            .map_err(|source| StatsError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        tracing::warn!("Moved corrupt stats file to {}", target.display());
        Ok(target)
    }

    /// Location of the counters file
    pub fn path(&self) -> &Path {
        &self.inner.path
    }

    /// Add a user to the seen-users set
    ///
    /// Returns `true` if the user was not seen before.
    pub fn record_user(&self, user_id: u64) -> bool {
        let mut counters = self.lock();
        let added = counters.total_users.insert(user_id);
        if added {
            self.inner.dirty.store(true, Ordering::Release);
        }
        added
    }

    /// Count one delivered video and remember who asked for it
    pub fn record_download(&self, user_id: u64) -> Snapshot {
        let mut counters = self.lock();
        counters.total_downloads += 1;
        counters.total_users.insert(user_id);
        self.inner.dirty.store(true, Ordering::Release);
        self.snapshot_of(&counters)
    }

    /// Current counters for reporting
    pub fn snapshot(&self) -> Snapshot {
        let counters = self.lock();
        self.snapshot_of(&counters)
    }

    /// Copy of the raw counters
    pub fn counters(&self) -> Counters {
        self.lock().clone()
    }

    /// Whether there are changes not yet written to disk
    pub fn is_dirty(&self) -> bool {
        self.inner.dirty.load(Ordering::Acquire)
    }

    /// Time since this process started
    pub fn uptime(&self) -> chrono::Duration {
        Utc::now().signed_duration_since(self.inner.started_at)
    }

    /// Write the counters to disk
    ///
    /// The record is written to `<name>.tmp` and renamed over the target.
    pub async fn persist(&self) -> Result<(), StatsError> {
        let _guard = self.inner.write_lock.lock().await;

        let json = {
            let counters = self.lock();
            self.inner.dirty.store(false, Ordering::Release);
            serde_json::to_vec(&*counters)
        };
        let json = match json {
            Ok(json) => json,
            Err(e) => {
                self.inner.dirty.store(true, Ordering::Release);
                return Err(e.into());
            }
        };

        if let Err(e) = self.write_atomically(&json).await {
            self.inner.dirty.store(true, Ordering::Release);
            return Err(e);
        }

        tracing::debug!("Saved stats to {}", self.inner.path.display());
        Ok(())
    }

    /// Persist only if something changed since the last write
    ///
    /// Returns whether a write happened.
    pub async fn flush_if_dirty(&self) -> Result<bool, StatsError> {
        if !self.is_dirty() {
            return Ok(false);
        }
        self.persist().await?;
        Ok(true)
    }

    /// Spawn a background task flushing dirty counters every `period`
    pub fn spawn_flush_task(&self, period: Duration) -> JoinHandle<()> {
        let store = self.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                if let Err(e) = store.flush_if_dirty().await {
                    tracing::error!("Periodic stats flush failed: {}", e);
                }
            }
        })
    }

    async fn write_atomically(&self, json: &[u8]) -> Result<(), StatsError> {
        let path = &self.inner.path;
        let tmp = sibling_with_suffix(path, "tmp");
        let io_err = |source| StatsError::Io {
            path: path.clone(),
            source,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(io_err)?;
        }
        tokio::fs::write(&tmp, json).await.map_err(io_err)?;
        tokio::fs::rename(&tmp, path).await.map_err(io_err)?;
        Ok(())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Counters> {
        self.inner.counters.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn snapshot_of(&self, counters: &Counters) -> Snapshot {
        Snapshot {
            total_downloads: counters.total_downloads,
            total_users: counters.total_users.len(),
            tracking_since: counters.start_time,
            uptime_seconds: self.uptime().num_seconds(),
        }
    }
}

fn unix_now() -> f64 {
    Utc::now().timestamp_millis() as f64 / 1000.0
}

/// `dir/name.json` -> `dir/name.json.<suffix>`
fn sibling_with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".");
    name.push(suffix);
    path.with_file_name(name)
}
