//! Durable storage for the Configuration Document.
//!
//! # Responsibilities
//! - Load the full document (`load`) and write it back whole (`save`)
//! - Report missing, unreadable and malformed documents as `StorageError`
//!
//! # Design Decisions
//! - Storage is injected behind `ConfigStorage` so the routing layer never
//!   touches a global file path
//! - File writes go to a sibling temp file and are renamed into place, so a
//!   reader sees either the old or the new document, never a torn one

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;

use crate::routing::document::RoutingDocument;

/// Errors raised while reading or writing the Configuration Document.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The backing document does not exist.
    #[error("configuration document not found at {0}")]
    Missing(String),

    /// The document exists but could not be read or written.
    #[error("I/O error on {location}: {source}")]
    Io {
        location: String,
        #[source]
        source: io::Error,
    },

    /// The document is not well-formed JSON of the expected shape.
    #[error("malformed configuration document at {location}: {source}")]
    Malformed {
        location: String,
        #[source]
        source: serde_json::Error,
    },

    /// The in-memory document could not be serialized.
    #[error("failed to encode configuration document: {0}")]
    Encode(#[source] serde_json::Error),
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Backing store for the Configuration Document.
pub trait ConfigStorage: Send + Sync {
    /// Read the full document.
    fn load(&self) -> StorageResult<RoutingDocument>;

    /// Replace the full document.
    fn save(&self, document: &RoutingDocument) -> StorageResult<()>;

    /// Human-readable location, for logs.
    fn location(&self) -> String;
}

/// JSON file on local disk.
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl ConfigStorage for FileStorage {
    fn load(&self) -> StorageResult<RoutingDocument> {
        let content = fs::read_to_string(&self.path).map_err(|e| {
            if e.kind() == io::ErrorKind::NotFound {
                StorageError::Missing(self.location())
            } else {
                StorageError::Io {
                    location: self.location(),
                    source: e,
                }
            }
        })?;

        serde_json::from_str(&content).map_err(|e| StorageError::Malformed {
            location: self.location(),
            source: e,
        })
    }

    fn save(&self, document: &RoutingDocument) -> StorageResult<()> {
        let mut content = serde_json::to_string_pretty(document).map_err(StorageError::Encode)?;
        content.push('\n');

        let tmp = self.temp_path();
        let io_err = |source| StorageError::Io {
            location: self.location(),
            source,
        };
        fs::write(&tmp, content).map_err(io_err)?;
        fs::rename(&tmp, &self.path).map_err(io_err)?;
        Ok(())
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}

/// In-process storage, used by tests and embedders.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    document: Mutex<Option<RoutingDocument>>,
}

impl MemoryStorage {
    /// Storage already holding `document`.
    pub fn new(document: RoutingDocument) -> Self {
        Self {
            document: Mutex::new(Some(document)),
        }
    }

    /// Storage with nothing in it; `load` fails with `Missing`.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Current stored document, if any.
    pub fn current(&self) -> Option<RoutingDocument> {
        self.document
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl ConfigStorage for MemoryStorage {
    fn load(&self) -> StorageResult<RoutingDocument> {
        self.current().ok_or_else(|| StorageError::Missing(self.location()))
    }

    fn save(&self, document: &RoutingDocument) -> StorageResult<()> {
        *self
            .document
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(document.clone());
        Ok(())
    }

    fn location(&self) -> String {
        "memory".to_string()
    }
}
