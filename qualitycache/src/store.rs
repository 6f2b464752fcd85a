use std::fs;
use std::io::{ErrorKind, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tempfile::NamedTempFile;

use crate::error::CacheError;
use crate::learning::LearningState;
use crate::types::{CachedQualitySnapshot, CACHE_VERSION};

/// Persists the quality snapshot.
///
/// `load` never fails: a missing, unreadable or malformed document is a
/// cache miss. Implementations must be safe for concurrent use.
pub trait QualityStore: Send + Sync {
    fn load(&self) -> Option<CachedQualitySnapshot>;

    /// Replaces the stored snapshot atomically.
    fn save(&self, snapshot: &CachedQualitySnapshot) -> Result<(), CacheError>;

    /// Removes the stored snapshot. No-op if absent.
    fn clear(&self) -> Result<(), CacheError>;
}

/// Persists the learning document. Same loading contract as [`QualityStore`].
pub trait LearningStore: Send + Sync {
    fn load(&self) -> Option<LearningState>;

    fn save(&self, state: &LearningState) -> Result<(), CacheError>;
}

// ---------------------------------------------------------------------------
// JsonFile
// ---------------------------------------------------------------------------

/// A single JSON document on disk.
///
/// Writes go to a uniquely named sibling temp file which is synced and
/// renamed over the target, so readers see either the old or the new
/// document, even with several writer processes.
#[derive(Debug)]
pub struct JsonFile<T> {
    path: PathBuf,
    _doc: PhantomData<fn() -> T>,
}

impl<T: Serialize + DeserializeOwned> JsonFile<T> {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            _doc: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the document. Missing and malformed files both yield None.
    pub fn load(&self) -> Option<T> {
        let content = match fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == ErrorKind::NotFound => return None,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), "qualitycache: read failed: {e}");
                return None;
            }
        };
        match serde_json::from_str(&content) {
            Ok(doc) => Some(doc),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), "qualitycache: malformed document: {e}");
                None
            }
        }
    }

    pub fn save(&self, doc: &T) -> Result<(), CacheError> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => {
                fs::create_dir_all(parent)?;
                parent
            }
            _ => Path::new("."),
        };

        let content = serde_json::to_string_pretty(doc)?;
        let mut temp = NamedTempFile::new_in(dir)?;
        temp.write_all(content.as_bytes())?;
        temp.as_file().sync_all()?;

        // On failure the temp file is removed when the error is dropped.
        temp.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }

    pub fn remove(&self) -> Result<(), CacheError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

// ---------------------------------------------------------------------------
// File stores
// ---------------------------------------------------------------------------

/// [`QualityStore`] backed by a JSON file.
#[derive(Debug)]
pub struct FileQualityStore {
    file: JsonFile<CachedQualitySnapshot>,
}

impl FileQualityStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            file: JsonFile::new(path),
        }
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }
}

impl QualityStore for FileQualityStore {
    fn load(&self) -> Option<CachedQualitySnapshot> {
        let snapshot = self.file.load()?;
        if snapshot.cache_version != CACHE_VERSION {
            tracing::warn!(
                found = snapshot.cache_version,
                expected = CACHE_VERSION,
                "qualitycache: snapshot version mismatch"
            );
            return None;
        }
        Some(snapshot)
    }

    fn save(&self, snapshot: &CachedQualitySnapshot) -> Result<(), CacheError> {
        self.file.save(snapshot)
    }

    fn clear(&self) -> Result<(), CacheError> {
        self.file.remove()
    }
}

/// [`LearningStore`] backed by a JSON file.
#[derive(Debug)]
pub struct FileLearningStore {
    file: JsonFile<LearningState>,
}

impl FileLearningStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            file: JsonFile::new(path),
        }
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }
}

impl LearningStore for FileLearningStore {
    fn load(&self) -> Option<LearningState> {
        self.file.load()
    }

    fn save(&self, state: &LearningState) -> Result<(), CacheError> {
        self.file.save(state)
    }
}

// ---------------------------------------------------------------------------
// Memory stores
// ---------------------------------------------------------------------------

/// In-memory [`QualityStore`]. Data is lost on restart.
#[derive(Debug, Default)]
pub struct MemoryQualityStore {
    inner: Mutex<Option<CachedQualitySnapshot>>,
}

impl MemoryQualityStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl QualityStore for MemoryQualityStore {
    fn load(&self) -> Option<CachedQualitySnapshot> {
        self.inner.lock().clone()
    }

    fn save(&self, snapshot: &CachedQualitySnapshot) -> Result<(), CacheError> {
        *self.inner.lock() = Some(snapshot.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), CacheError> {
        *self.inner.lock() = None;
        Ok(())
    }
}

/// In-memory [`LearningStore`]. Data is lost on restart.
#[derive(Debug, Default)]
pub struct MemoryLearningStore {
    inner: Mutex<Option<LearningState>>,
}

impl MemoryLearningStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-loaded with `state`.
    pub fn with_state(state: LearningState) -> Self {
        Self {
            inner: Mutex::new(Some(state)),
        }
    }
}

impl LearningStore for MemoryLearningStore {
    fn load(&self) -> Option<LearningState> {
        self.inner.lock().clone()
    }

    fn save(&self, state: &LearningState) -> Result<(), CacheError> {
        *self.inner.lock() = Some(state.clone());
        Ok(())
    }
}
