//! In-memory backend for tests and throwaway runs.

use super::{ProgressBackend, RecordMap, UpdateFn};
use crate::error::{ProgressError, Result};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;

/// Backend holding records in process memory
#[derive(Debug, Default)]
pub struct MemoryBackend {
    records: Mutex<RecordMap>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    writes: AtomicU64,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing set of records
    pub fn with_records(records: RecordMap) -> Self {
        Self {
            records: Mutex::new(records),
            ..Self::default()
        }
    }

    /// Make subsequent loads fail, simulating an unreadable store
    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Make subsequent writes fail, simulating an unwritable store
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of successful writes so far
    pub fn write_count(&self) -> u64 {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn snapshot(&self) -> RecordMap {
        self.records
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

impl ProgressBackend for MemoryBackend {
    fn load(&self) -> Result<RecordMap> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(ProgressError::Storage("memory backend read disabled".into()));
        }
        Ok(self.snapshot())
    }

    fn update(&self, apply: UpdateFn<'_>) -> Result<()> {
        let mut stored = self.records.lock().unwrap_or_else(|e| e.into_inner());
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(ProgressError::Storage("memory backend read disabled".into()));
        }
        let mut records = stored.clone();
        if !apply(&mut records)? {
            return Ok(());
        }
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(ProgressError::Storage("memory backend write disabled".into()));
        }
        *stored = records;
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}
