//! File-backed store
//!
//! Keeps every item in one JSON object on disk. Each mutation rewrites the
//! whole document through a temp file and a rename, so a crash leaves either
//! the old or the new document in place.
//!
//! Every handle keeps its own copy of the document, so handles opened
//! separately on one path overwrite each other. Within a process, use
//! `FileStorage::open_shared` to get one handle per file.

use std::collections::HashMap;
use std::ffi::OsString;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock, Weak};

use parking_lot::{Mutex, RwLock};
use tracing::{debug, info};

use super::{check_quota, Storage, StorageResult};
use crate::error::StorageError;

/// Live shared handles, keyed by canonical path
static SHARED_STORES: OnceLock<Mutex<HashMap<PathBuf, Weak<FileStorage>>>> = OnceLock::new();

// == File Storage ==
/// Persistent store backed by a JSON document.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    items: RwLock<HashMap<String, String>>,
    quota: Option<usize>,
}

impl FileStorage {
    // == Constructor ==
    /// Opens the store at `path`, loading existing items.
    ///
    /// A missing file opens as an empty store. A file that is not a JSON
    /// object of strings fails with `StorageError::Corrupted`.
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let path = path.as_ref().to_path_buf();

        let items = match fs::read_to_string(&path) {
            Ok(raw) if raw.trim().is_empty() => HashMap::new(),
            Ok(raw) => serde_json::from_str::<HashMap<String, String>>(&raw)
                .map_err(|e| StorageError::Corrupted(format!("{}: {}", path.display(), e)))?,
            Err(e) if e.kind() == ErrorKind::NotFound => HashMap::new(),
            Err(e) => return Err(e.into()),
        };

        info!("Opened file storage at {} with {} items", path.display(), items.len());

        Ok(Self {
            path,
            items: RwLock::new(items),
            quota: None,
        })
    }

    /// Returns the process-wide handle for the document at `path`, opening
    /// it if no handle is alive.
    ///
    /// `quota_bytes` only applies when the handle is first opened; later
    /// callers get the existing handle with its original quota.
    pub fn open_shared(
        path: impl AsRef<Path>,
        quota_bytes: Option<usize>,
    ) -> StorageResult<Arc<Self>> {
        let key = canonical_path(path.as_ref())?;
        let mut stores = SHARED_STORES.get_or_init(Mutex::default).lock();

        if let Some(existing) = stores.get(&key).and_then(Weak::upgrade) {
            debug!("Reusing shared file storage at {}", key.display());
            return Ok(existing);
        }

        let mut storage = Self::open(&key)?;
        storage.quota = quota_bytes;
        let storage = Arc::new(storage);

        stores.retain(|_, handle| handle.strong_count() > 0);
        stores.insert(key, Arc::downgrade(&storage));
        Ok(storage)
    }

    /// Sets a byte quota for keys and values combined.
    pub fn with_quota(mut self, quota_bytes: usize) -> Self {
        self.quota = Some(quota_bytes);
        self
    }

    /// Path of the backing document.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of stored items.
    pub fn len(&self) -> usize {
        self.items.read().len()
    }

    /// Returns true if the store holds no items.
    pub fn is_empty(&self) -> bool {
        self.items.read().is_empty()
    }

    /// Sibling file the document is written to before the rename.
    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(OsString::from)
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    // == Persist ==
    fn persist(&self, items: &HashMap<String, String>) -> StorageResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let document = serde_json::to_string(items)
            .map_err(|e| StorageError::Unavailable(format!("encode failed: {}", e)))?;

        let tmp = self.temp_path();
        fs::write(&tmp, document)?;
        fs::rename(&tmp, &self.path)?;

        debug!("Persisted {} items to {}", items.len(), self.path.display());
        Ok(())
    }
}

/// Absolute, symlink-free form of `path`, creating its parent directory.
fn canonical_path(path: &Path) -> StorageResult<PathBuf> {
    if let Ok(existing) = fs::canonicalize(path) {
        return Ok(existing);
    }

    let file_name = path
        .file_name()
        .ok_or_else(|| StorageError::Unavailable(format!("{} has no file name", path.display())))?;
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    fs::create_dir_all(parent)?;
    Ok(fs::canonicalize(parent)?.join(file_name))
}

impl Storage for FileStorage {
    fn get_item(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.items.read().get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> StorageResult<()> {
        let mut items = self.items.write();
        check_quota(&items, self.quota, key, value)?;

        let previous = items.insert(key.to_string(), value.to_string());
        if let Err(e) = self.persist(&items) {
            // Memory must not run ahead of disk
            match previous {
                Some(old) => items.insert(key.to_string(), old),
                None => items.remove(key),
            };
            return Err(e);
        }
        Ok(())
    }

    fn remove_item(&self, key: &str) -> StorageResult<()> {
        let mut items = self.items.write();
        let Some(previous) = items.remove(key) else {
            return Ok(());
        };

        if let Err(e) = self.persist(&items) {
            items.insert(key.to_string(), previous);
            return Err(e);
        }
        Ok(())
    }
}
