//! Reference dataset subsystem.
//!
//! # Data Flow
//! ```text
//! reference file
//!     → load() (read, decode UTF-8, split lines, deduplicate)
//!     → Dataset (immutable set of lines + generation)
//!     → store.rs (atomic publish via ArcSwap)
//!     → readers clone an Arc<Dataset> and never see a partial reload
//! ```
//!
//! # Design Decisions
//! - A dataset is never published empty
//! - Failed reloads leave the previously published dataset serving
//! - Readers share one copy; nothing is cloned per request

pub mod store;

use std::collections::HashSet;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub use store::ContentStore;

/// Why a reference file could not become a dataset.
#[derive(Debug, Error)]
pub enum FileError {
    #[error("File does not exist: {0}")]
    NotFound(PathBuf),
    #[error("File is empty: {0}")]
    IsEmpty(PathBuf),
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),
    #[error("File is not valid UTF-8: {path}")]
    DecodeError {
        path: PathBuf,
        #[source]
        source: std::string::FromUtf8Error,
    },
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// An immutable set of distinct reference lines.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    lines: HashSet<String>,
    generation: u64,
}

impl Dataset {
    /// Build a dataset from raw text. `\n`, `\r\n` and a lone `\r` all end
    /// a line; blank lines are skipped.
    pub fn from_text(text: &str) -> Self {
        let lines = text
            .split(['\n', '\r'])
            .filter(|line| !line.is_empty())
            .map(str::to_owned)
            .collect();
        Self { lines, generation: 0 }
    }

    /// Exact whole-line membership.
    pub fn contains(&self, query: &str) -> bool {
        self.lines.contains(query)
    }

    /// Number of distinct lines.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Publication counter assigned by the [`ContentStore`]; 0 until published.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub(crate) fn with_generation(mut self, generation: u64) -> Self {
        self.generation = generation;
        self
    }
}

/// Read and decode the reference file at `path`.
pub async fn load(path: &Path) -> Result<Dataset, FileError> {
    let bytes = tokio::fs::read(path).await.map_err(|e| match e.kind() {
        ErrorKind::NotFound => FileError::NotFound(path.to_path_buf()),
        ErrorKind::PermissionDenied => FileError::PermissionDenied(path.to_path_buf()),
        _ => FileError::Io {
            path: path.to_path_buf(),
            source: e,
        },
    })?;

    let text = String::from_utf8(bytes).map_err(|source| FileError::DecodeError {
        path: path.to_path_buf(),
        source,
    })?;

    let dataset = Dataset::from_text(&text);
    if dataset.is_empty() {
        return Err(FileError::IsEmpty(path.to_path_buf()));
    }
    Ok(dataset)
}
