//! Disposable per-session temp folders.

use std::path::{Path, PathBuf};

use cairn_types::error::Result;
use tempfile::TempDir;

/// Temp folders created on behalf of commands. All of them are deleted at
/// shutdown, or when the set is dropped.
#[derive(Debug, Default)]
pub struct TempFolders {
    root: Option<PathBuf>,
    folders: Vec<TempDir>,
}

impl TempFolders {
    /// Folders are created under `root`, or the system temp directory.
    pub fn new(root: Option<PathBuf>) -> Self {
        Self {
            root,
            folders: Vec::new(),
        }
    }

    /// Create a fresh uniquely-named folder and return its path.
    pub fn create(&mut self) -> Result<PathBuf> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("cairn-");
        let dir = match &self.root {
            Some(root) => builder.tempdir_in(root)?,
            None => builder.tempdir()?,
        };
        let path = dir.path().to_path_buf();
        log::debug!("created temp folder {}", path.display());
        self.folders.push(dir);
        Ok(path)
    }

    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.folders.iter().map(TempDir::path)
    }

    pub fn len(&self) -> usize {
        self.folders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.folders.is_empty()
    }

    /// Delete every folder. Failures are logged and skipped.
    pub fn release_all(&mut self) {
        for dir in self.folders.drain(..) {
            let path = dir.path().to_path_buf();
            if let Err(e) = dir.close() {
                log::warn!("could not delete temp folder {}: {e}", path.display());
            }
        }
    }
}
