//! JSON file backend.
//!
//! The whole record map lives in one document:
//!
//! ```json
//! { "version": 1, "records": { "<tokenId>": { "tokenId": "...", ... } } }
//! ```
//!
//! Older deployments wrote a bare `{ "<tokenId>": record }` object with no
//! version. That shape is still read and gets rewritten in the versioned
//! format on the next save.
//!
//! Several processes may share one file. Updates take an exclusive lock on a
//! sibling `<file>.lock`, re-read the document under it, and replace the file
//! by rename before releasing. Plain reads take no lock.

use super::atomic::{atomic_write, parent_dir};
use super::{ProgressBackend, RecordMap, UpdateFn};
use crate::error::{ProgressError, Result};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Current on-disk schema version
pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Serialize)]
struct ProgressDocument<'a> {
    version: u32,
    records: &'a RecordMap,
}

#[derive(Debug, Deserialize)]
struct VersionedDocument {
    version: u32,
    #[serde(default)]
    records: RecordMap,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum StoredDocument {
    Versioned(VersionedDocument),
    Legacy(RecordMap),
}

/// Backend that keeps all records in a single JSON file
#[derive(Debug, Clone)]
pub struct JsonFileBackend {
    path: PathBuf,
}

impl JsonFileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Lock file next to the progress file
    pub fn lock_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".lock");
        self.path.with_file_name(name)
    }

    /// Block until this process holds the update lock. Released when the
    /// returned handle is dropped.
    fn lock(&self) -> Result<File> {
        let storage_err = |e: std::io::Error| {
            ProgressError::Storage(format!(
                "failed to lock {}: {}",
                self.lock_path().display(),
                e
            ))
        };
        fs::create_dir_all(parent_dir(&self.path)).map_err(storage_err)?;
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(self.lock_path())
            .map_err(storage_err)?;
        file.lock_exclusive().map_err(storage_err)?;
        Ok(file)
    }

    fn write(&self, records: &RecordMap) -> Result<()> {
        let doc = ProgressDocument {
            version: SCHEMA_VERSION,
            records,
        };
        let data = serde_json::to_string_pretty(&doc)?;
        atomic_write(&self.path, data.as_bytes()).map_err(|e| {
            ProgressError::Storage(format!("failed to write {}: {}", self.path.display(), e))
        })
    }

    fn parse(&self, data: &str) -> Result<RecordMap> {
        if data.trim().is_empty() {
            return Ok(RecordMap::new());
        }

        let doc: StoredDocument = serde_json::from_str(data).map_err(|e| {
            ProgressError::Storage(format!("failed to parse {}: {}", self.path.display(), e))
        })?;

        let records = match doc {
            StoredDocument::Versioned(doc) if doc.version == SCHEMA_VERSION => doc.records,
            StoredDocument::Versioned(doc) => {
                return Err(ProgressError::Storage(format!(
                    "{} has schema version {}, expected {}",
                    self.path.display(),
                    doc.version,
                    SCHEMA_VERSION
                )));
            }
            StoredDocument::Legacy(records) => {
                debug!(
                    "Reading unversioned progress file {} ({} records)",
                    self.path.display(),
                    records.len()
                );
                records
            }
        };

        // Key is authoritative; repair records whose body disagrees
        Ok(records
            .into_iter()
            .map(|(key, mut record)| {
                record.token_id = key.clone();
                record.normalize();
                (key, record)
            })
            .collect())
    }
}

impl ProgressBackend for JsonFileBackend {
    fn load(&self) -> Result<RecordMap> {
        match fs::read_to_string(&self.path) {
            Ok(data) => self.parse(&data),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(RecordMap::new()),
            Err(e) => Err(ProgressError::Storage(format!(
                "failed to read {}: {}",
                self.path.display(),
                e
            ))),
        }
    }

    fn update(&self, apply: UpdateFn<'_>) -> Result<()> {
        let _lock = self.lock()?;
        // Never rewrite a file that could not be read
        let mut records = self.load()?;
        if apply(&mut records)? {
            self.write(&records)?;
        }
        Ok(())
    }

    fn describe(&self) -> String {
        format!("file:{}", self.path.display())
    }
}
