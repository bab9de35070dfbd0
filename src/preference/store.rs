//! Key-value storage backends.

use log::warn;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::error::StoreError;

/// String key-value storage, as offered by the host environment.
pub trait KeyValueStore {
    fn load(&self, key: &str) -> Result<Option<String>, StoreError>;

    fn save(&mut self, key: &str, value: &str) -> Result<(), StoreError>;

    fn remove(&mut self, key: &str) -> Result<(), StoreError>;
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for Box<S> {
    fn load(&self, key: &str) -> Result<Option<String>, StoreError> {
        (**self).load(key)
    }

    fn save(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        (**self).save(key, value)
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        (**self).remove(key)
    }
}

/// In-memory storage.
///
/// [`MemoryStore::unavailable`] builds a store that refuses every call,
/// which is how blocked browser storage behaves.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
    available: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            available: true,
        }
    }

    pub fn unavailable() -> Self {
        Self {
            entries: HashMap::new(),
            available: false,
        }
    }

    /// Seeds an entry, returning the updated store for chaining.
    pub fn with_entry(mut self, key: &str, value: &str) -> Self {
        self.entries.insert(key.to_string(), value.to_string());
        self
    }

    /// Reads an entry directly, bypassing availability.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.available {
            Ok(())
        } else {
            Err(StoreError::Unavailable)
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyValueStore for MemoryStore {
    fn load(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.check()?;
        Ok(self.entries.get(key).cloned())
    }

    fn save(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.check()?;
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        self.check()?;
        self.entries.remove(key);
        Ok(())
    }
}

/// Storage kept in a JSON file holding an object of string values.
///
/// Writes go to a sibling temporary file that is then renamed over the
/// original, so a crash never leaves a half-written document. A document
/// that does not parse fails [`KeyValueStore::load`] but is replaced by the
/// next write.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>, StoreError> {
        match fs::read_to_string(&self.path) {
            Ok(text) if text.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(text) => Ok(serde_json::from_str(&text)?),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    /// Entries to write back, and whether the document was corrupt and must
    /// be rewritten regardless.
    fn read_for_write(&self) -> Result<(BTreeMap<String, String>, bool), StoreError> {
        match self.read_all() {
            Ok(entries) => Ok((entries, false)),
            Err(StoreError::Format(e)) => {
                warn!(
                    "theme-toggle: {} is not a JSON object ({e}), replacing it",
                    self.path.display()
                );
                Ok((BTreeMap::new(), true))
            }
            Err(e) => Err(e),
        }
    }

    fn write_all(&self, entries: &BTreeMap<String, String>) -> Result<(), StoreError> {
        if let Some(dir) = self.path.parent() {
            if !dir.as_os_str().is_empty() {
                fs::create_dir_all(dir)?;
            }
        }
        let tmp = self.path.with_extension("json.tmp");
        let json = serde_json::to_string_pretty(entries)?;
        {
            let mut f = fs::File::create(&tmp)?;
            f.write_all(json.as_bytes())?;
            f.sync_all()?;
        }
        fs::rename(tmp, &self.path)?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn load(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.read_all()?.remove(key))
    }

    fn save(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        let (mut entries, _) = self.read_for_write()?;
        entries.insert(key.to_string(), value.to_string());
        self.write_all(&entries)
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        let (mut entries, corrupt) = self.read_for_write()?;
        if entries.remove(key).is_some() || corrupt {
            self.write_all(&entries)?;
        }
        Ok(())
    }
}
