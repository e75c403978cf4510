//! Persistent key-value storage.
//!
//! # Storage Layout
//!
//! [`JsonFileKv`] keeps every key in one JSON object:
//!
//! ```text
//! {data_dir}/canonical.json
//! {
//!   "canonical_pins": { "origin:https://mail.example.com": "https://mail.example.com/u/0/" }
//! }
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

use super::types::StoreError;

/// Minimal storage interface the canonical store needs.
pub trait KvStore: Send {
  fn get(&self, key: &str) -> Result<Option<Value>, StoreError>;
  fn set(&mut self, key: &str, value: Value) -> Result<(), StoreError>;
}

/// Key-value store held in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryKv {
  entries: BTreeMap<String, Value>,
}

impl MemoryKv {
  pub fn new() -> Self {
    Self::default()
  }

  /// Pre-populates a key. Builder-style, for fixtures.
  pub fn with(mut self, key: &str, value: Value) -> Self {
    self.entries.insert(key.to_string(), value);
    self
  }
}

impl KvStore for MemoryKv {
  fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
    Ok(self.entries.get(key).cloned())
  }

  fn set(&mut self, key: &str, value: Value) -> Result<(), StoreError> {
    self.entries.insert(key.to_string(), value);
    Ok(())
  }
}

/// Key-value store persisted as a single JSON object on disk.
///
/// The file is re-read on every access and rewritten atomically on every
/// `set`. There is no locking: two writers racing on the same file can lose
/// an update.
#[derive(Debug, Clone)]
pub struct JsonFileKv {
  path: PathBuf,
}

impl JsonFileKv {
  pub fn new(path: PathBuf) -> Self {
    Self { path }
  }

  pub fn path(&self) -> &Path {
    &self.path
  }

  /// Returns an empty object if the file doesn't exist.
  fn read_object(&self) -> Result<Map<String, Value>, StoreError> {
    let content = match fs::read_to_string(&self.path) {
      Ok(content) => content,
      Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Map::new()),
      Err(source) => {
        return Err(StoreError::Read {
          path: self.path.clone(),
          source,
        });
      }
    };

    if content.trim().is_empty() {
      return Ok(Map::new());
    }

    match serde_json::from_str(&content) {
      Ok(Value::Object(object)) => Ok(object),
      Ok(_) => Err(StoreError::NotAnObject(self.path.clone())),
      Err(source) => Err(StoreError::Parse {
        path: self.path.clone(),
        source,
      }),
    }
  }

  /// Uses atomic write (write to temp, then rename) to prevent corruption.
  fn write_object(&self, object: &Map<String, Value>) -> Result<(), StoreError> {
    if let Some(parent) = self.path.parent()
      && !parent.as_os_str().is_empty()
    {
      fs::create_dir_all(parent).map_err(StoreError::CreateDir)?;
    }

    let temp_path = self.path.with_extension("json.tmp");
    let content = serde_json::to_string_pretty(object).map_err(StoreError::Serialize)?;
    let write_err = |source| StoreError::Write {
      path: self.path.clone(),
      source,
    };
    fs::write(&temp_path, &content).map_err(write_err)?;
    fs::rename(&temp_path, &self.path).map_err(write_err)?;

    Ok(())
  }
}

impl KvStore for JsonFileKv {
  fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
    Ok(self.read_object()?.remove(key))
  }

  fn set(&mut self, key: &str, value: Value) -> Result<(), StoreError> {
    let mut object = self.read_object()?;
    object.insert(key.to_string(), value);
    self.write_object(&object)
  }
}
