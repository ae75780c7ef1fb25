//! Atomic publication of the active dataset.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use arc_swap::ArcSwapOption;

use crate::dataset::{load, Dataset, FileError};
use crate::observability::metrics;

/// Owns the reference file path and the currently published dataset.
///
/// Readers take a snapshot with [`ContentStore::current`]; a concurrent
/// [`ContentStore::reload`] swaps the pointer, so every reader holds either
/// the old or the new dataset in full. Concurrent reloads are not coalesced:
/// each performs its own read and the last one to publish wins.
#[derive(Debug)]
pub struct ContentStore {
    path: PathBuf,
    active: ArcSwapOption<Dataset>,
    generation: AtomicU64,
}

impl ContentStore {
    /// Create a store with nothing published yet.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            active: ArcSwapOption::empty(),
            generation: AtomicU64::new(0),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Snapshot of the published dataset, if any.
    pub fn current(&self) -> Option<Arc<Dataset>> {
        self.active.load_full()
    }

    /// Read the reference file and publish it on success.
    ///
    /// On failure the previously published dataset is left untouched.
    pub async fn reload(&self) -> Result<Arc<Dataset>, FileError> {
        let dataset = match load(&self.path).await {
            Ok(dataset) => dataset,
            Err(e) => {
                metrics::record_dataset_reload("error");
                return Err(e);
            }
        };

        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        let dataset = Arc::new(dataset.with_generation(generation));
        self.active.store(Some(Arc::clone(&dataset)));

        metrics::record_dataset_reload("ok");
        metrics::record_dataset_lines(dataset.len());
        tracing::debug!(
            path = %self.path.display(),
            generation,
            lines = dataset.len(),
            "Dataset published"
        );
        Ok(dataset)
    }

    /// Drop the published dataset. Readers holding a snapshot keep it alive.
    pub fn release(&self) {
        if self.active.swap(None).is_some() {
            tracing::info!(path = %self.path.display(), "Dataset released");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn reference_file(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[tokio::test]
    async fn test_nothing_published_initially() {
        let store = ContentStore::new("/unused");
        assert!(store.current().is_none());
    }

    #[tokio::test]
    async fn test_reload_publishes_new_generation() {
        let file = reference_file("alpha\n");
        let store = ContentStore::new(file.path());

        let first = store.reload().await.unwrap();
        assert_eq!(first.generation(), 1);
        assert!(first.contains("alpha"));

        std::fs::write(file.path(), "alpha\nbeta\n").unwrap();
        let second = store.reload().await.unwrap();
        assert_eq!(second.generation(), 2);
        assert!(store.current().unwrap().contains("beta"));

        // An older snapshot is unaffected by the swap.
        assert!(!first.contains("beta"));
    }

    #[tokio::test]
    async fn test_failed_reload_keeps_previous_dataset() {
        let file = reference_file("alpha\n");
        let store = ContentStore::new(file.path());
        store.reload().await.unwrap();

        std::fs::write(file.path(), "").unwrap();
        let err = store.reload().await.unwrap_err();
        assert!(matches!(err, FileError::IsEmpty(_)));

        let current = store.current().unwrap();
        assert_eq!(current.generation(), 1);
        assert!(current.contains("alpha"));
    }

    #[tokio::test]
    async fn test_failed_initial_reload_publishes_nothing() {
        let store = ContentStore::new("/no/such/reference.txt");
        assert!(matches!(store.reload().await, Err(FileError::NotFound(_))));
        assert!(store.current().is_none());
    }

    #[tokio::test]
    async fn test_release() {
        let file = reference_file("alpha\n");
        let store = ContentStore::new(file.path());
        let snapshot = store.reload().await.unwrap();

        store.release();
        assert!(store.current().is_none());
        assert!(snapshot.contains("alpha"));

        // Releasing twice is harmless.
        store.release();
    }

    #[tokio::test]
    async fn test_concurrent_reloads_never_tear() {
        let file = reference_file("alpha\nbeta\n");
        let store = Arc::new(ContentStore::new(file.path()));
        store.reload().await.unwrap();

        let mut tasks = Vec::new();
        for _ in 0..8 {
            let store = Arc::clone(&store);
            tasks.push(tokio::spawn(async move {
                for _ in 0..10 {
                    store.reload().await.unwrap();
                    let snapshot = store.current().unwrap();
                    assert_eq!(snapshot.len(), 2);
                }
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }
        assert!(store.current().unwrap().generation() > 1);
    }
}
