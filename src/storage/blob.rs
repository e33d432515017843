//! Key-value blob storage
//!
//! The persistence gateway talks to a generic string key-value store.
//! [`FileBlobStore`] keeps one file per key under the data directory with
//! locked, atomic writes (temp file + rename). [`MemoryBlobStore`] backs
//! unit tests.

use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use fs2::FileExt;

/// A generic string key-value store.
///
/// Keys are short identifiers (`todos`, `globalFontSize`, ...); values are
/// arbitrary strings, typically JSON documents or scalar settings.
pub trait BlobStore {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn put(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

/// Filesystem-backed store: one file per key
pub struct FileBlobStore {
    dir: PathBuf,
}

impl FileBlobStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn key_path(&self, key: &str) -> PathBuf {
        self.dir.join(key)
    }
}

impl BlobStore for FileBlobStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.key_path(key);
        if !path.exists() {
            return Ok(None);
        }

        let mut file = File::open(&path)
            .with_context(|| format!("Failed to open {}", path.display()))?;
        file.lock_shared()
            .with_context(|| format!("Failed to acquire read lock on {}", path.display()))?;

        let mut value = String::new();
        file.read_to_string(&mut value)
            .with_context(|| format!("Failed to read {}", path.display()))?;

        // Lock is released when the file is dropped
        Ok(Some(value))
    }

    fn put(&self, key: &str, value: &str) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create directory: {}", self.dir.display()))?;

        let path = self.key_path(key);
        let temp_path = self.dir.join(format!("{}.tmp", key));

        {
            let file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(&temp_path)
                .with_context(|| format!("Failed to create temp file: {}", temp_path.display()))?;

            file.lock_exclusive()
                .with_context(|| format!("Failed to acquire write lock on {}", temp_path.display()))?;

            let mut writer = &file;
            writer
                .write_all(value.as_bytes())
                .with_context(|| format!("Failed to write {}", temp_path.display()))?;
            writer
                .flush()
                .with_context(|| format!("Failed to flush {}", temp_path.display()))?;
        }

        fs::rename(&temp_path, &path).with_context(|| {
            format!(
                "Failed to rename {} to {}",
                temp_path.display(),
                path.display()
            )
        })?;

        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let path = self.key_path(key);
        if path.exists() {
            fs::remove_file(&path)
                .with_context(|| format!("Failed to remove {}", path.display()))?;
        }
        Ok(())
    }
}

/// In-memory store for tests
#[derive(Default)]
pub struct MemoryBlobStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn values(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.values.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl BlobStore for MemoryBlobStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values().get(key).cloned())
    }

    fn put(&self, key: &str, value: &str) -> Result<()> {
        self.values().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.values().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn file_store_roundtrip() {
        let dir = TempDir::new().unwrap();
        let store = FileBlobStore::new(dir.path());

        assert!(store.get("todos").unwrap().is_none());

        store.put("todos", "[]").unwrap();
        assert_eq!(store.get("todos").unwrap().as_deref(), Some("[]"));

        store.put("todos", "[{\"id\":\"1\"}]").unwrap();
        assert_eq!(store.get("todos").unwrap().as_deref(), Some("[{\"id\":\"1\"}]"));
    }

    #[test]
    fn file_store_creates_directory() {
        let dir = TempDir::new().unwrap();
        let store = FileBlobStore::new(dir.path().join("nested").join("store"));

        store.put("key", "value").unwrap();
        assert_eq!(store.get("key").unwrap().as_deref(), Some("value"));
    }

    #[test]
    fn file_store_write_is_atomic() {
        let dir = TempDir::new().unwrap();
        let store = FileBlobStore::new(dir.path());

        store.put("todos", "[]").unwrap();

        assert!(!dir.path().join("todos.tmp").exists());
        assert!(dir.path().join("todos").exists());
    }

    #[test]
    fn file_store_remove() {
        let dir = TempDir::new().unwrap();
        let store = FileBlobStore::new(dir.path());

        store.put("key", "value").unwrap();
        store.remove("key").unwrap();

        assert!(store.get("key").unwrap().is_none());
        // Removing an absent key is fine
        store.remove("key").unwrap();
    }

    #[test]
    fn memory_store_roundtrip() {
        let store = MemoryBlobStore::new();

        assert!(store.get("key").unwrap().is_none());
        store.put("key", "value").unwrap();
        assert_eq!(store.get("key").unwrap().as_deref(), Some("value"));
        store.remove("key").unwrap();
        assert!(store.get("key").unwrap().is_none());
    }
}
