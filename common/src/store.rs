//! Persistence collaborator: named collections of JSON values.
//!
//! The ledger only ever reads a whole collection, replaces a whole collection,
//! or appends one item. Implementations must make each write durable before
//! returning.

use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::StoreError;

/// The two collections the ledger persists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Collection {
    Fortunes,
    Participants,
}

impl Collection {
    pub fn name(self) -> &'static str {
        match self {
            Collection::Fortunes => "fortunes",
            Collection::Participants => "participants",
        }
    }
}

pub trait LedgerStore {
    /// Whole collection, or `None` if it has never been written.
    fn get(&self, collection: Collection) -> Result<Option<Vec<Value>>, StoreError>;

    /// Replace the whole collection.
    fn set(&mut self, collection: Collection, items: Vec<Value>) -> Result<(), StoreError>;

    /// Append one item, creating the collection if needed.
    fn append(&mut self, collection: Collection, item: Value) -> Result<(), StoreError>;
}

/// Read a collection and decode every item as `T`.
pub fn load<T: DeserializeOwned>(
    store: &dyn LedgerStore,
    collection: Collection,
) -> Result<Option<Vec<T>>, StoreError> {
    let Some(items) = store.get(collection)? else {
        return Ok(None);
    };
    let decoded = items
        .into_iter()
        .map(serde_json::from_value)
        .collect::<Result<Vec<T>, _>>()?;
    Ok(Some(decoded))
}

/// Encode items for `LedgerStore::set`.
pub fn encode<'a, T, I>(items: I) -> Result<Vec<Value>, StoreError>
where
    T: Serialize + 'a,
    I: IntoIterator<Item = &'a T>,
{
    items
        .into_iter()
        .map(|item| serde_json::to_value(item).map_err(StoreError::from))
        .collect()
}

/// In-process store. Nothing survives the process.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    collections: BTreeMap<Collection, Vec<Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LedgerStore for MemoryStore {
    fn get(&self, collection: Collection) -> Result<Option<Vec<Value>>, StoreError> {
        Ok(self.collections.get(&collection).cloned())
    }

    fn set(&mut self, collection: Collection, items: Vec<Value>) -> Result<(), StoreError> {
        self.collections.insert(collection, items);
        Ok(())
    }

    fn append(&mut self, collection: Collection, item: Value) -> Result<(), StoreError> {
        self.collections.entry(collection).or_default().push(item);
        Ok(())
    }
}

/// One pretty-printed JSON array per collection inside a data directory.
///
/// Writes land in a temporary sibling that is synced and then renamed over the
/// target, so readers see either the old or the new file.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_of(&self, collection: Collection) -> PathBuf {
        self.dir.join(format!("{}.json", collection.name()))
    }

    fn write_atomic(&self, collection: Collection, items: &[Value]) -> Result<(), StoreError> {
        let target = self.path_of(collection);
        let tmp = self.dir.join(format!(".{}.json.tmp", collection.name()));
        let data = serde_json::to_vec_pretty(items)?;
        {
            let mut file = fs::File::create(&tmp)?;
            file.write_all(&data)?;
            file.sync_all()?;
        }
        fs::rename(&tmp, &target)?;
        sync_dir(&self.dir)?;
        Ok(())
    }
}

/// Flush the directory entry so the rename itself survives a crash.
#[cfg(unix)]
fn sync_dir(dir: &Path) -> io::Result<()> {
    fs::File::open(dir)?.sync_all()
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) -> io::Result<()> {
    Ok(())
}

impl LedgerStore for JsonFileStore {
    fn get(&self, collection: Collection) -> Result<Option<Vec<Value>>, StoreError> {
        let data = match fs::read(self.path_of(collection)) {
            Ok(data) => data,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(serde_json::from_slice(&data)?))
    }

    fn set(&mut self, collection: Collection, items: Vec<Value>) -> Result<(), StoreError> {
        self.write_atomic(collection, &items)
    }

    fn append(&mut self, collection: Collection, item: Value) -> Result<(), StoreError> {
        let mut items = self.get(collection)?.unwrap_or_default();
        items.push(item);
        self.write_atomic(collection, &items)
    }
}
