//! Persistence for items the user chose to keep

use crate::domain::MediaItem;
use crate::error::{MswpError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

/// Records keep decisions.
///
/// `record` is fire-and-forget: callers must not assume it has completed
/// before their next operation, and nothing it returns is consulted.
pub trait KeepStore: Send + Sync {
    fn record(&self, item: &MediaItem);

    /// Whether `item` was kept in this or an earlier session
    fn is_kept(&self, item: &MediaItem) -> bool;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct KeptRecord {
    id: u64,
    path: PathBuf,
    /// Seconds since the Unix epoch
    added_at: i64,
}

impl KeptRecord {
    fn from_item(item: &MediaItem) -> Self {
        Self {
            id: item.id.0,
            path: item.locator.as_path().to_path_buf(),
            added_at: item.added_at.timestamp(),
        }
    }
}

enum KeepCommand {
    Record(KeptRecord),
    Flush(oneshot::Sender<()>),
}

/// Keep store backed by a JSON file, written by a background task
pub struct JsonKeepStore {
    path: PathBuf,
    known: Mutex<HashMap<PathBuf, KeptRecord>>,
    command_tx: mpsc::UnboundedSender<KeepCommand>,
}

impl JsonKeepStore {
    /// Default location (~/.local/share/mswp/kept.json)
    pub fn default_path() -> Option<PathBuf> {
        dirs::data_dir().map(|dir| dir.join("mswp").join("kept.json"))
    }

    /// Loads `path` (if present) and starts the writer on `runtime`
    pub fn open(path: impl Into<PathBuf>, runtime: &tokio::runtime::Handle) -> Result<Self> {
        let path = path.into();
        let records = Self::load(&path)?;
        debug!(path = %path.display(), count = records.len(), "Loaded keep store");

        let known: HashMap<PathBuf, KeptRecord> = records
            .iter()
            .map(|r| (r.path.clone(), r.clone()))
            .collect();

        let (command_tx, command_rx) = mpsc::unbounded_channel();
        runtime.spawn(Self::writer(path.clone(), known.clone(), command_rx));

        Ok(Self {
            path,
            known: Mutex::new(known),
            command_tx,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Waits until every record sent so far is on disk
    pub async fn flush(&self) {
        let (tx, rx) = oneshot::channel();
        if self.command_tx.send(KeepCommand::Flush(tx)).is_ok() {
            let _ = rx.await;
        }
    }

    /// Blocking [`Self::flush`] for callers outside the runtime, such as
    /// shutdown. Records still queued are lost if the runtime is dropped first.
    pub fn flush_blocking(&self, runtime: &tokio::runtime::Handle) {
        runtime.block_on(self.flush());
    }

    fn load(path: &Path) -> Result<Vec<KeptRecord>> {
        if !path.exists() {
            return Ok(Vec::new());
        }

        let contents = fs::read_to_string(path).map_err(|e| {
            MswpError::ConfigError(format!("Failed to read keep store: {}", e))
        })?;

        serde_json::from_str(&contents).map_err(|e| {
            MswpError::ConfigError(format!("Failed to parse keep store: {}", e))
        })
    }

    fn save(path: &Path, records: &HashMap<PathBuf, KeptRecord>) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut sorted: Vec<&KeptRecord> = records.values().collect();
        sorted.sort_by(|a, b| a.path.cmp(&b.path));
        let contents = serde_json::to_string_pretty(&sorted)?;
        fs::write(path, contents)?;
        Ok(())
    }

    async fn writer(
        path: PathBuf,
        mut records: HashMap<PathBuf, KeptRecord>,
        mut command_rx: mpsc::UnboundedReceiver<KeepCommand>,
    ) {
        while let Some(command) = command_rx.recv().await {
            match command {
                KeepCommand::Record(record) => {
                    records.insert(record.path.clone(), record);
                    let snapshot = records.clone();
                    let target = path.clone();
                    let result =
                        tokio::task::spawn_blocking(move || Self::save(&target, &snapshot)).await;
                    match result {
                        Ok(Ok(())) => {}
                        Ok(Err(e)) => warn!(error = %e, "Failed to save keep store"),
                        Err(e) => warn!(error = %e, "Keep store writer panicked"),
                    }
                }
                KeepCommand::Flush(done) => {
                    let _ = done.send(());
                }
            }
        }
    }
}

impl KeepStore for JsonKeepStore {
    fn record(&self, item: &MediaItem) {
        let record = KeptRecord::from_item(item);
        self.known
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .insert(record.path.clone(), record.clone());

        if self.command_tx.send(KeepCommand::Record(record)).is_err() {
            warn!(item = %item.id, "Keep store writer has stopped; keep not persisted");
        }
    }

    fn is_kept(&self, item: &MediaItem) -> bool {
        self.known
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .contains_key(item.locator.as_path())
    }
}

/// Keep store that forgets everything when dropped
#[derive(Debug, Default)]
pub struct MemoryKeepStore {
    kept: Mutex<Vec<MediaItem>>,
}

impl MemoryKeepStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn kept(&self) -> Vec<MediaItem> {
        self.kept.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }
}

impl KeepStore for MemoryKeepStore {
    fn record(&self, item: &MediaItem) {
        self.kept
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .push(item.clone());
    }

    fn is_kept(&self, item: &MediaItem) -> bool {
        self.kept
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .iter()
            .any(|kept| kept.locator == item.locator)
    }
}
