//! Persistence seam for shared configuration strings
//!
//! The session persists through this trait so hosts can choose the
//! location: a file next to the binary, an in-memory slot for tests, or a
//! URL fragment in an embedding application.

use crate::error::{EstimarError, Result};
use std::fs;
use std::path::PathBuf;

/// A persistent, user-shareable location for the encoded configuration.
pub trait ShareStore {
    /// Read the stored payload, if any.
    fn load(&self) -> Option<String>;
    /// Replace the stored payload.
    fn save(&mut self, payload: &str) -> Result<()>;
    /// Remove the stored payload.
    fn clear(&mut self);
}

/// In-memory store for tests and embedding hosts.
#[derive(Debug, Default, Clone)]
pub struct MemoryShareStore {
    payload: Option<String>,
}

impl MemoryShareStore {
    /// Store pre-seeded with a payload.
    pub fn with_payload(payload: impl Into<String>) -> Self {
        Self { payload: Some(payload.into()) }
    }
}

impl ShareStore for MemoryShareStore {
    fn load(&self) -> Option<String> {
        self.payload.clone()
    }

    fn save(&mut self, payload: &str) -> Result<()> {
        self.payload = Some(payload.to_string());
        Ok(())
    }

    fn clear(&mut self) {
        self.payload = None;
    }
}

/// File-backed store used by the CLI.
#[derive(Debug, Clone)]
pub struct FileShareStore {
    path: PathBuf,
}

impl FileShareStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the stored payload.
    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}

impl ShareStore for FileShareStore {
    fn load(&self) -> Option<String> {
        let text = fs::read_to_string(&self.path).ok()?;
        let trimmed = text.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    }

    fn save(&mut self, payload: &str) -> Result<()> {
        fs::write(&self.path, payload)
            .map_err(|e| EstimarError::io(format!("writing {}", self.path.display()), e))
    }

    fn clear(&mut self) {
        // A missing file already means "nothing stored"
        let _ = fs::remove_file(&self.path);
    }
}
