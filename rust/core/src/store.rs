// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Small key-value stores for process-wide state.
//!
//! [`JsonFileStore`] is read once when opened and rewritten on every change;
//! [`MemoryStore`] lives only as long as the process (session caches).

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use rustc_hash::FxHashMap;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::{Error, Result};

/// Minimal key-value store interface.
pub trait KeyValueStore {
    /// Returns a copy of the value stored under `key`.
    fn get(&self, key: &str) -> Option<Value>;

    /// Stores `value` under `key`.
    fn set(&mut self, key: &str, value: Value) -> Result<()>;

    /// Removes `key`, returning the previous value.
    fn remove(&mut self, key: &str) -> Result<Option<Value>>;

    /// Stored keys, sorted.
    fn keys(&self) -> Vec<String>;

    /// Decodes the value under `key`. A value of the wrong shape is an error.
    fn get_as<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>>
    where
        Self: Sized,
    {
        match self.get(key) {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    /// Encodes and stores `value` under `key`.
    fn set_as<T: Serialize>(&mut self, key: &str, value: &T) -> Result<()>
    where
        Self: Sized,
    {
        self.set(key, serde_json::to_value(value)?)
    }
}

/// In-memory store, dropped with the process.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: FxHashMap<String, Value>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<Value> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: Value) -> Result<()> {
        self.entries.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<Option<Value>> {
        Ok(self.entries.remove(key))
    }

    fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.entries.keys().cloned().collect();
        keys.sort();
        keys
    }
}

/// Store persisted as a single JSON object on disk.
///
/// The file is read once by [`JsonFileStore::open`]. Every mutation rewrites
/// the whole file through a temporary sibling and an atomic rename, so a
/// crash mid-write leaves the previous contents intact.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    entries: BTreeMap<String, Value>,
}

impl JsonFileStore {
    /// Opens the store at `path`. A missing file opens as an empty store.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let entries = match std::fs::read(&path) {
            Ok(bytes) => parse_entries(&path, &bytes)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "Store file missing, starting empty");
                BTreeMap::new()
            }
            Err(source) => {
                return Err(Error::StoreIo {
                    path: path.display().to_string(),
                    source,
                })
            }
        };

        tracing::info!(path = %path.display(), keys = entries.len(), "Opened store");
        Ok(Self { path, entries })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self) -> Result<()> {
        let io_err = |source| Error::StoreIo {
            path: self.path.display().to_string(),
            source,
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        let data = serde_json::to_vec_pretty(&self.entries)?;
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        std::fs::write(&tmp, &data).map_err(io_err)?;
        std::fs::rename(&tmp, &self.path).map_err(io_err)?;

        tracing::debug!(path = %self.path.display(), size = data.len(), "Flushed store");
        Ok(())
    }
}

fn parse_entries(path: &Path, bytes: &[u8]) -> Result<BTreeMap<String, Value>> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(BTreeMap::new());
    }
    match serde_json::from_slice::<Value>(bytes) {
        Ok(Value::Object(map)) => Ok(map.into_iter().collect()),
        Ok(other) => Err(Error::StoreFormat {
            path: path.display().to_string(),
            reason: format!("expected a JSON object, found {}", json_type(&other)),
        }),
        Err(e) => Err(Error::StoreFormat {
            path: path.display().to_string(),
            reason: e.to_string(),
        }),
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Option<Value> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: Value) -> Result<()> {
        let previous = self.entries.insert(key.to_string(), value);
        if let Err(e) = self.flush() {
            // Keep memory and disk in agreement: a failed write is not applied.
            match previous {
                Some(old) => self.entries.insert(key.to_string(), old),
                None => self.entries.remove(key),
            };
            return Err(e);
        }
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<Option<Value>> {
        let Some(previous) = self.entries.remove(key) else {
            return Ok(None);
        };
        if let Err(e) = self.flush() {
            self.entries.insert(key.to_string(), previous);
            return Err(e);
        }
        Ok(Some(previous))
    }

    fn keys(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn memory_store_round_trip() {
        let mut store = MemoryStore::new();
        store.set("31.5_34.9", json!("Ashdod")).unwrap();
        assert_eq!(store.get("31.5_34.9"), Some(json!("Ashdod")));
        assert_eq!(store.remove("31.5_34.9").unwrap(), Some(json!("Ashdod")));
        assert!(store.is_empty());
    }

    #[test]
    fn missing_file_opens_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::open(dir.path().join("notes.json")).unwrap();
        assert!(store.keys().is_empty());
    }

    #[test]
    fn every_write_is_persisted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("notes.json");

        let mut store = JsonFileStore::open(&path).unwrap();
        store.set_as("counter", &3).unwrap();
        store.set("label", json!("draft")).unwrap();
        store.remove("label").unwrap();

        let reopened = JsonFileStore::open(&path).unwrap();
        assert_eq!(reopened.get_as::<i32>("counter").unwrap(), Some(3));
        assert_eq!(reopened.get("label"), None);
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.json");
        std::fs::write(&path, "[1, 2]").unwrap();

        let err = JsonFileStore::open(&path).unwrap_err();
        assert!(matches!(err, Error::StoreFormat { .. }));
    }

    #[test]
    fn wrong_shape_value_is_reported() {
        let mut store = MemoryStore::new();
        store.set("n", json!("not a number")).unwrap();
        assert!(store.get_as::<u32>("n").is_err());
    }
}
