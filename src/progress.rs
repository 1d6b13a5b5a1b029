//! Playback progress persistence for nextup.
//!
//! The engine talks to a [`ProgressStore`]; this module ships an in-memory
//! store for tests and embedding, and a JSON file store that lives in the
//! platform data directory.

use crate::error::{AppError, Result};
use crate::types::{ProgressKey, ProgressRecord};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

/// Read/write contract for resume positions and watched flags.
pub trait ProgressStore {
    /// Fetch the record stored under `key`.
    fn get(&self, key: &ProgressKey) -> Option<ProgressRecord>;

    /// Upsert position and duration, refreshing `updated_at`.
    fn set(
        &mut self,
        key: &ProgressKey,
        position_seconds: f64,
        duration_seconds: f64,
    ) -> Result<()>;

    fn is_watched(&self, key: &ProgressKey) -> bool {
        self.get(key).is_some_and(|record| record.watched)
    }

    fn set_watched(&mut self, key: &ProgressKey, watched: bool) -> Result<()>;

    /// Record for a standalone title.
    fn get_title(&self, content_id: &str) -> Option<ProgressRecord> {
        self.get(&ProgressKey::title(content_id))
    }

    /// Record for an episode (1-based season and episode).
    fn get_episode(&self, content_id: &str, season: u32, episode: u32) -> Option<ProgressRecord> {
        self.get(&ProgressKey::episode(content_id, season, episode))
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

fn upsert(
    records: &mut HashMap<ProgressKey, ProgressRecord>,
    key: &ProgressKey,
    position_seconds: f64,
    duration_seconds: f64,
) {
    let updated_at = unix_now();
    records
        .entry(key.clone())
        .and_modify(|record| {
            record.position_seconds = position_seconds;
            record.duration_seconds = duration_seconds;
            record.updated_at = updated_at;
        })
        .or_insert(ProgressRecord {
            position_seconds,
            duration_seconds,
            watched: false,
            updated_at,
        });
}

fn mark_watched(records: &mut HashMap<ProgressKey, ProgressRecord>, key: &ProgressKey, watched: bool) {
    let updated_at = unix_now();
    records
        .entry(key.clone())
        .and_modify(|record| {
            record.watched = watched;
            record.updated_at = updated_at;
        })
        .or_insert(ProgressRecord {
            position_seconds: 0.0,
            duration_seconds: 0.0,
            watched,
            updated_at,
        });
}

/// Progress kept in memory only.
#[derive(Debug, Clone, Default)]
pub struct MemoryProgressStore {
    records: HashMap<ProgressKey, ProgressRecord>,
}

impl MemoryProgressStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Insert a record as-is, including its timestamp.
    pub fn insert(&mut self, key: ProgressKey, record: ProgressRecord) {
        self.records.insert(key, record);
    }
}

impl ProgressStore for MemoryProgressStore {
    fn get(&self, key: &ProgressKey) -> Option<ProgressRecord> {
        self.records.get(key).cloned()
    }

    fn set(&mut self, key: &ProgressKey, position_seconds: f64, duration_seconds: f64) -> Result<()> {
        upsert(&mut self.records, key, position_seconds, duration_seconds);
        Ok(())
    }

    fn set_watched(&mut self, key: &ProgressKey, watched: bool) -> Result<()> {
        mark_watched(&mut self.records, key, watched);
        Ok(())
    }
}

#[derive(Serialize, Deserialize)]
struct StoredProgress {
    key: ProgressKey,
    #[serde(flatten)]
    record: ProgressRecord,
}

/// Progress persisted as a JSON file, rewritten on every change.
#[derive(Debug)]
pub struct JsonProgressStore {
    path: PathBuf,
    records: HashMap<ProgressKey, ProgressRecord>,
}

impl JsonProgressStore {
    /// Get the default path of the progress file.
    ///
    /// Returns ~/.local/share/nextup/progress.json on Linux,
    /// or a platform-appropriate location on other systems.
    pub fn default_path() -> std::result::Result<PathBuf, io::Error> {
        let data_dir = dirs::data_local_dir()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "Could not find data directory"))?
            .join("nextup");

        Ok(data_dir.join("progress.json"))
    }

    /// Open the store at the default location.
    pub fn open_default() -> Result<Self> {
        Self::open(Self::default_path()?)
    }

    /// Open the store at `path`.
    ///
    /// A missing file yields an empty store; the file is created on the
    /// first write.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        if !path.exists() {
            return Ok(Self {
                path,
                records: HashMap::new(),
            });
        }

        let content = fs::read_to_string(&path)?;
        let stored: Vec<StoredProgress> = serde_json::from_str(&content)?;
        debug!("Loaded {} progress records from {}", stored.len(), path.display());

        Ok(Self {
            path,
            records: stored
                .into_iter()
                .map(|entry| (entry.key, entry.record))
                .collect(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut stored: Vec<StoredProgress> = self
            .records
            .iter()
            .map(|(key, record)| StoredProgress {
                key: key.clone(),
                record: record.clone(),
            })
            .collect();
        stored.sort_by(|a, b| a.key.cmp(&b.key));

        let content = serde_json::to_string_pretty(&stored)?;
        fs::write(&self.path, content).map_err(|e| {
            AppError::Store(format!("failed to write {}: {}", self.path.display(), e))
        })
    }
}

impl ProgressStore for JsonProgressStore {
    fn get(&self, key: &ProgressKey) -> Option<ProgressRecord> {
        self.records.get(key).cloned()
    }

    fn set(&mut self, key: &ProgressKey, position_seconds: f64, duration_seconds: f64) -> Result<()> {
        upsert(&mut self.records, key, position_seconds, duration_seconds);
        self.save()
    }

    fn set_watched(&mut self, key: &ProgressKey, watched: bool) -> Result<()> {
        mark_watched(&mut self.records, key, watched);
        self.save()
    }
}
