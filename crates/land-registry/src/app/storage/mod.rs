//! Record persistence.
//!
//! `StorageBackend` loads and saves the whole record table. `FileStorage`
//! keeps it as one JSON file holding the row array; `MemoryStorage` keeps it
//! in memory for tests and dry runs.

use land_track_lib::{LandRecord, RecordTable};
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(String),

    #[error("JSON error: {0}")]
    Json(String),

    #[error("Platform storage error: {0}")]
    Platform(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Where the record table lives between runs
pub trait StorageBackend: Send + Sync {
    /// Read all rows. A store that was never written reads as an empty table.
    fn load(&self) -> StorageResult<RecordTable>;

    /// Replace the stored rows with the table's
    fn save(&self, table: &RecordTable) -> StorageResult<()>;
}

/// Single JSON file holding the row array
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl StorageBackend for FileStorage {
    fn load(&self) -> StorageResult<RecordTable> {
        if !self.path.exists() {
            tracing::debug!(
                "Records file {} does not exist yet; starting empty",
                self.path.display()
            );
            return Ok(RecordTable::new());
        }

        let s = fs::read_to_string(&self.path)
            .map_err(|e| StorageError::Io(format!("Failed to read records file: {}", e)))?;
        if s.trim().is_empty() {
            return Ok(RecordTable::new());
        }

        let rows = serde_json::from_str::<Vec<LandRecord>>(&s)
            .map_err(|e| StorageError::Json(format!("Failed to parse records JSON: {}", e)))?;
        tracing::debug!("Loaded {} records from {}", rows.len(), self.path.display());
        Ok(RecordTable::from_rows(rows))
    }

    fn save(&self, table: &RecordTable) -> StorageResult<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
            && let Err(e) = fs::create_dir_all(parent)
        {
            return Err(StorageError::Io(format!(
                "Failed to create records parent directory: {}",
                e
            )));
        }

        let s = serde_json::to_string_pretty(table.rows())
            .map_err(|e| StorageError::Json(e.to_string()))?;
        fs::write(&self.path, s).map_err(|e| StorageError::Io(format!("write failed: {}", e)))?;
        tracing::debug!("Saved {} records to {}", table.len(), self.path.display());
        Ok(())
    }
}

/// In-memory store
#[derive(Default)]
pub struct MemoryStorage {
    rows: Mutex<Vec<LandRecord>>,
}

impl StorageBackend for MemoryStorage {
    fn load(&self) -> StorageResult<RecordTable> {
        let guard = self
            .rows
            .lock()
            .map_err(|e| StorageError::Platform(format!("mutex poisoned: {:?}", e)))?;
        Ok(RecordTable::from_rows(guard.clone()))
    }

    fn save(&self, table: &RecordTable) -> StorageResult<()> {
        let mut guard = self
            .rows
            .lock()
            .map_err(|e| StorageError::Platform(format!("mutex poisoned: {:?}", e)))?;
        *guard = table.rows().to_vec();
        Ok(())
    }
}
