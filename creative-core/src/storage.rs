//! Creative Storage - Write-Once PNG Store
//!
//! Each artifact is keyed by a fresh random identifier, so concurrent writers
//! never target the same key and no locking is needed on the filesystem.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Creative not found: {0}")]
    NotFound(String),

    #[error("Creative already stored: {0}")]
    AlreadyExists(String),

    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage lock poisoned")]
    Poisoned,
}

/// Opaque artifact identifier (32 lowercase hex chars of a v4 UUID).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CreativeId(String);

impl CreativeId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    /// Accepts any UUID spelling; anything else is rejected so it can never
    /// escape the storage directory.
    pub fn parse(raw: &str) -> Option<Self> {
        Uuid::parse_str(raw.trim())
            .ok()
            .map(|u| Self(u.simple().to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CreativeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub trait CreativeStore: Send + Sync {
    /// Store encoded PNG bytes. Fails if the identifier is already taken.
    fn put(&self, id: &CreativeId, png: &[u8]) -> Result<(), StorageError>;

    fn get(&self, id: &CreativeId) -> Result<Vec<u8>, StorageError>;

    /// Lookup by raw identifier text. Malformed identifiers are simply not found.
    fn get_raw(&self, raw: &str) -> Result<Vec<u8>, StorageError> {
        let id = CreativeId::parse(raw).ok_or_else(|| StorageError::NotFound(raw.to_string()))?;
        self.get(&id)
    }
}

/// Files named `creative_<id>.png` under one directory.
#[derive(Debug, Clone)]
pub struct FsStore {
    root: PathBuf,
}

impl FsStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, id: &CreativeId) -> PathBuf {
        self.root.join(format!("creative_{}.png", id))
    }
}

impl CreativeStore for FsStore {
    /// Bytes are staged in a temp file beside the target and linked into place
    /// only once fully written, so a failed write never leaves a partial PNG.
    fn put(&self, id: &CreativeId, png: &[u8]) -> Result<(), StorageError> {
        fs::create_dir_all(&self.root)?;
        let path = self.path_for(id);

        let mut staged = tempfile::Builder::new()
            .prefix(".creative_")
            .suffix(".part")
            .tempfile_in(&self.root)?;
        staged.write_all(png)?;
        staged.as_file().sync_all()?;
        staged.persist_noclobber(&path).map_err(|e| {
            if e.error.kind() == ErrorKind::AlreadyExists {
                StorageError::AlreadyExists(id.to_string())
            } else {
                StorageError::Io(e.error)
            }
        })?;
        Ok(())
    }

    fn get(&self, id: &CreativeId) -> Result<Vec<u8>, StorageError> {
        match fs::read(self.path_for(id)) {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(StorageError::NotFound(id.to_string())),
            Err(e) => Err(e.into()),
        }
    }
}

/// In-process store, used by tests and embedders without a disk.
#[derive(Debug, Default)]
pub struct MemoryStore {
    items: Mutex<HashMap<CreativeId, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CreativeStore for MemoryStore {
    fn put(&self, id: &CreativeId, png: &[u8]) -> Result<(), StorageError> {
        let mut items = self.items.lock().map_err(|_| StorageError::Poisoned)?;
        if items.contains_key(id) {
            return Err(StorageError::AlreadyExists(id.to_string()));
        }
        items.insert(id.clone(), png.to_vec());
        Ok(())
    }

    fn get(&self, id: &CreativeId) -> Result<Vec<u8>, StorageError> {
        let items = self.items.lock().map_err(|_| StorageError::Poisoned)?;
        items
            .get(id)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_unique_and_parse() {
        let a = CreativeId::generate();
        let b = CreativeId::generate();
        assert_ne!(a, b);
        assert_eq!(a.as_str().len(), 32);
        assert_eq!(CreativeId::parse(a.as_str()), Some(a.clone()));

        let hyphenated = Uuid::parse_str(a.as_str()).unwrap().hyphenated().to_string();
        assert_eq!(CreativeId::parse(&hyphenated), Some(a));
    }

    #[test]
    fn test_fs_store_write_once() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsStore::new(dir.path().join("out"));
        let id = CreativeId::generate();

        store.put(&id, b"png-bytes").unwrap();
        assert_eq!(store.get(&id).unwrap(), b"png-bytes");
        assert!(store.path_for(&id).ends_with(format!("creative_{}.png", id)));
        assert!(matches!(store.put(&id, b"other"), Err(StorageError::AlreadyExists(_))));
    }

    #[test]
    fn test_fs_store_leaves_no_staging_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsStore::new(dir.path());
        let id = CreativeId::generate();
        store.put(&id, b"complete").unwrap();

        let names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(names, vec![format!("creative_{}.png", id)]);
    }

    #[test]
    fn test_failed_put_keeps_nothing_partial() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsStore::new(dir.path());
        let id = CreativeId::generate();
        fs::write(store.path_for(&id), b"original").unwrap();

        let err = store.put(&id, b"replacement bytes").unwrap_err();
        assert!(matches!(err, StorageError::AlreadyExists(_)));
        assert_eq!(store.get(&id).unwrap(), b"original");
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_put_under_file_root_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        // a regular file where the store directory should be
        let blocker = dir.path().join("blocked");
        fs::write(&blocker, b"").unwrap();
        let store = FsStore::new(&blocker);
        let id = CreativeId::generate();

        assert!(matches!(store.put(&id, b"png"), Err(StorageError::Io(_))));
        assert!(matches!(store.get(&id), Err(StorageError::NotFound(_)) | Err(StorageError::Io(_))));
    }

    #[test]
    fn test_memory_store_len_survives_poison() {
        let store = std::sync::Arc::new(MemoryStore::new());
        store.put(&CreativeId::generate(), &[1]).unwrap();

        let poisoner = std::sync::Arc::clone(&store);
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.items.lock().unwrap();
            panic!("poison the lock");
        })
        .join();

        assert!(store.items.is_poisoned());
        assert_eq!(store.len(), 1);
        assert!(!store.is_empty());
    }

    #[test]
    fn test_missing_and_malformed_ids_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsStore::new(dir.path());

        let missing = CreativeId::generate();
        assert!(matches!(store.get(&missing), Err(StorageError::NotFound(_))));
        assert!(matches!(store.get_raw("../../etc/passwd"), Err(StorageError::NotFound(_))));
    }

    #[test]
    fn test_memory_store() {
        let store = MemoryStore::new();
        let id = CreativeId::generate();
        assert!(store.is_empty());
        store.put(&id, &[1, 2, 3]).unwrap();
        assert_eq!(store.get_raw(id.as_str()).unwrap(), vec![1, 2, 3]);
        assert!(matches!(store.put(&id, &[4]), Err(StorageError::AlreadyExists(_))));
        assert_eq!(store.len(), 1);
    }
}
