use std::collections::HashMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, anyhow};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::store::TaskStore;
use crate::task::Task;

/// Named key-value slots that survive a restart.
pub trait SlotStorage {
    fn read(&self, key: &str) -> anyhow::Result<Option<String>>;
    fn write(&mut self, key: &str, value: &str) -> anyhow::Result<()>;
}

/// One JSON file per key inside the data directory.
#[derive(Debug)]
pub struct FileSlots {
    pub data_dir: PathBuf,
}

impl FileSlots {
    #[tracing::instrument(skip(data_dir))]
    pub fn open(data_dir: &Path) -> anyhow::Result<Self> {
        let data_dir = data_dir.to_path_buf();
        fs::create_dir_all(&data_dir)
            .with_context(|| format!("failed to create {}", data_dir.display()))?;
        info!(data_dir = %data_dir.display(), "opened slot storage");
        Ok(Self { data_dir })
    }

    pub fn slot_path(&self, key: &str) -> PathBuf {
        self.data_dir.join(format!("{key}.json"))
    }
}

impl SlotStorage for FileSlots {
    #[tracing::instrument(skip(self))]
    fn read(&self, key: &str) -> anyhow::Result<Option<String>> {
        let path = self.slot_path(key);
        match fs::read_to_string(&path) {
            Ok(raw) => {
                debug!(file = %path.display(), bytes = raw.len(), "read slot");
                Ok(Some(raw))
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                debug!(file = %path.display(), "slot file absent");
                Ok(None)
            }
            Err(err) => Err(err).with_context(|| format!("failed reading {}", path.display())),
        }
    }

    #[tracing::instrument(skip(self, value))]
    fn write(&mut self, key: &str, value: &str) -> anyhow::Result<()> {
        let path = self.slot_path(key);
        debug!(file = %path.display(), bytes = value.len(), "writing slot atomically");

        let mut temp = NamedTempFile::new_in(&self.data_dir)?;
        temp.write_all(value.as_bytes())?;
        temp.flush()?;

        temp.persist(&path)
            .map_err(|err| anyhow!("failed to persist {}: {}", path.display(), err))?;
        Ok(())
    }
}

/// In-process slots, lost when dropped.
#[derive(Debug, Default)]
pub struct MemorySlots {
    slots: HashMap<String, String>,
}

impl MemorySlots {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_slot(key: &str, value: &str) -> Self {
        let mut slots = HashMap::new();
        slots.insert(key.to_string(), value.to_string());
        Self { slots }
    }
}

impl SlotStorage for MemorySlots {
    fn read(&self, key: &str) -> anyhow::Result<Option<String>> {
        Ok(self.slots.get(key).cloned())
    }

    fn write(&mut self, key: &str, value: &str) -> anyhow::Result<()> {
        self.slots.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Mirrors the task list into a single storage slot.
pub struct PersistenceBridge {
    storage: Box<dyn SlotStorage>,
    key: String,
}

impl PersistenceBridge {
    pub fn new(storage: Box<dyn SlotStorage>, key: impl Into<String>) -> Self {
        Self {
            storage,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Reads the slot. Anything that cannot be read or parsed yields an
    /// empty list; the failure is only logged.
    #[tracing::instrument(skip(self), fields(key = %self.key))]
    pub fn load(&self) -> TaskStore {
        let raw = match self.storage.read(&self.key) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                info!("no stored task list, starting empty");
                return TaskStore::new();
            }
            Err(err) => {
                warn!(error = %format!("{err:#}"), "failed reading stored task list, starting empty");
                return TaskStore::new();
            }
        };

        match decode(&raw) {
            Ok(tasks) => {
                info!(count = tasks.len(), "loaded task list");
                TaskStore::from_tasks(tasks)
            }
            Err(err) => {
                warn!(error = %err, "stored task list is malformed, discarding it");
                TaskStore::new()
            }
        }
    }

    /// Overwrites the slot with the full list.
    #[tracing::instrument(skip(self, store), fields(key = %self.key, count = store.len()))]
    pub fn save(&mut self, store: &TaskStore) -> anyhow::Result<()> {
        let payload = encode(store.tasks())?;
        self.storage
            .write(&self.key, &payload)
            .with_context(|| format!("failed to save task list to slot {}", self.key))?;
        debug!("task list saved");
        Ok(())
    }
}

pub fn encode(tasks: &[Task]) -> anyhow::Result<String> {
    serde_json::to_string(tasks).context("failed to serialize task list")
}

/// Parses a stored list, trimming text and dropping blank entries.
pub fn decode(raw: &str) -> Result<Vec<Task>, serde_json::Error> {
    let parsed: Vec<Task> = serde_json::from_str(raw)?;
    let before = parsed.len();
    let tasks: Vec<Task> = parsed
        .into_iter()
        .filter_map(|mut task| {
            let trimmed = task.text.trim().to_string();
            if trimmed.is_empty() {
                return None;
            }
            task.text = trimmed;
            Some(task)
        })
        .collect();
    if tasks.len() != before {
        warn!(dropped = before - tasks.len(), "dropped stored tasks with blank text");
    }
    Ok(tasks)
}
