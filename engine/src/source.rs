//! Data sources the engine reads from and writes to.
//!
//! The engine performs no I/O of its own beyond these seams. Callers
//! construct the concrete source or remote client and pass it in.

use crate::snapshot::parse_document;
use crate::{error::Result, BuyerRecord, Error, LoadOptions, RecordId};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// A local snapshot of buyer rows.
pub trait LocalSource {
    /// Read every row of the snapshot.
    ///
    /// Fails with `SourceUnavailable` if the snapshot cannot be read or
    /// parsed, and `MalformedRecord` if a row fails validation.
    fn read_snapshot(&self) -> Result<Vec<BuyerRecord>>;
}

/// The remote canonical store.
pub trait RemoteStore {
    /// Fetch every record currently held remotely.
    fn fetch_all(&self) -> Result<Vec<BuyerRecord>>;

    /// Insert the record, or replace the stored copy with the same id.
    ///
    /// Failures should be reported as [`Error::WriteError`].
    fn upsert(&mut self, record: &BuyerRecord) -> Result<()>;
}

impl<T: LocalSource + ?Sized> LocalSource for &T {
    fn read_snapshot(&self) -> Result<Vec<BuyerRecord>> {
        (**self).read_snapshot()
    }
}

impl<T: RemoteStore + ?Sized> RemoteStore for &mut T {
    fn fetch_all(&self) -> Result<Vec<BuyerRecord>> {
        (**self).fetch_all()
    }

    fn upsert(&mut self, record: &BuyerRecord) -> Result<()> {
        (**self).upsert(record)
    }
}

/// A snapshot document on disk.
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    path: PathBuf,
    options: LoadOptions,
}

impl JsonFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            options: LoadOptions::default(),
        }
    }

    pub fn with_options(mut self, options: LoadOptions) -> Self {
        self.options = options;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LocalSource for JsonFileSource {
    fn read_snapshot(&self) -> Result<Vec<BuyerRecord>> {
        let json = std::fs::read_to_string(&self.path)
            .map_err(|e| Error::SourceUnavailable(format!("{}: {}", self.path.display(), e)))?;
        parse_document(&json, self.options)
    }
}

/// An in-memory remote store.
///
/// Keeps records in insertion order; upserting an existing id replaces the
/// stored copy in place.
#[derive(Debug, Clone, Default)]
pub struct MemoryRemote {
    records: Vec<BuyerRecord>,
    positions: HashMap<RecordId, usize>,
}

impl MemoryRemote {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: impl IntoIterator<Item = BuyerRecord>) -> Self {
        let mut remote = Self::new();
        for record in records {
            remote.put(record);
        }
        remote
    }

    pub fn get(&self, id: &str) -> Option<&BuyerRecord> {
        self.positions.get(id).map(|&i| &self.records[i])
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn put(&mut self, record: BuyerRecord) {
        match self.positions.get(record.id()) {
            Some(&i) => self.records[i] = record,
            None => {
                self.positions.insert(record.id().to_string(), self.records.len());
                self.records.push(record);
            }
        }
    }
}

impl RemoteStore for MemoryRemote {
    fn fetch_all(&self) -> Result<Vec<BuyerRecord>> {
        Ok(self.records.clone())
    }

    fn upsert(&mut self, record: &BuyerRecord) -> Result<()> {
        self.put(record.clone());
        Ok(())
    }
}
