use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::error::{ExplorerError, Result};

/// Small string key/value persistence for client state (last address, locale).
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, BTreeMap<String, String>>> {
        self.entries
            .lock()
            .map_err(|_| ExplorerError::Storage("memory store lock poisoned".to_string()))
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.lock()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.lock()?.remove(key);
        Ok(())
    }
}

/// Persists entries as one JSON object on disk.
///
/// Every call does blocking file I/O; async callers run it on the blocking pool.
pub struct JsonFileStore {
    path: PathBuf,
    guard: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            guard: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>> {
        match std::fs::read(&self.path) {
            Ok(bytes) if bytes.is_empty() => Ok(BTreeMap::new()),
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn write_all(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let body = serde_json::to_vec_pretty(entries)?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, body)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    fn update<F>(&self, apply: F) -> Result<()>
    where
        F: FnOnce(&mut BTreeMap<String, String>),
    {
        let _guard = self
            .guard
            .lock()
            .map_err(|_| ExplorerError::Storage("file store lock poisoned".to_string()))?;
        let mut entries = self.read_all()?;
        apply(&mut entries);
        self.write_all(&entries)
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.read_all()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.update(|entries| {
            entries.insert(key.to_string(), value.to_string());
        })
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.update(|entries| {
            entries.remove(key);
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{STORE_KEY_ADDRESS, STORE_KEY_LOCALE};

    fn temp_state_file(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("tokenscope-store-{}-{}", name, std::process::id()))
            .join("state.json")
    }

    #[test]
    fn memory_store_round_trip() {
        let store = MemoryStore::new();
        assert_eq!(store.get(STORE_KEY_ADDRESS).unwrap(), None);
        store.set(STORE_KEY_ADDRESS, "0xabc").unwrap();
        assert_eq!(store.get(STORE_KEY_ADDRESS).unwrap().as_deref(), Some("0xabc"));
        store.remove(STORE_KEY_ADDRESS).unwrap();
        assert_eq!(store.get(STORE_KEY_ADDRESS).unwrap(), None);
    }

    #[test]
    fn file_store_keeps_keys_independent() {
        let path = temp_state_file("independent");
        let _ = std::fs::remove_file(&path);
        let store = JsonFileStore::new(&path);

        store.set(STORE_KEY_LOCALE, "en").unwrap();
        store.set(STORE_KEY_ADDRESS, "0xabc").unwrap();
        store.remove(STORE_KEY_ADDRESS).unwrap();

        let reopened = JsonFileStore::new(&path);
        assert_eq!(reopened.get(STORE_KEY_ADDRESS).unwrap(), None);
        assert_eq!(reopened.get(STORE_KEY_LOCALE).unwrap().as_deref(), Some("en"));

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn file_store_missing_file_reads_empty() {
        let store = JsonFileStore::new(temp_state_file("missing"));
        assert_eq!(store.get(STORE_KEY_ADDRESS).unwrap(), None);
    }
}
