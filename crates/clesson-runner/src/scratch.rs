//! Disposable working directories for a single compile-and-run cycle.

use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tracing::{debug, warn};

use crate::{Result, RunnerError};

/// Prefix for scratch directory names under the system temp dir.
const SCRATCH_PREFIX: &str = "clesson-";

/// An exclusively owned temporary directory.
///
/// The directory and everything in it is removed when the value is dropped,
/// so every exit path of a grading call cleans up after itself. Inside a tokio
/// runtime the removal runs on the blocking pool.
#[derive(Debug)]
pub struct ScratchArea {
    path: PathBuf,
    dir: Option<TempDir>,
}

impl ScratchArea {
    /// Creates a fresh scratch directory under the system temp dir.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError::ScratchCreate`] if the directory cannot be created.
    pub fn create() -> Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix(SCRATCH_PREFIX)
            .tempdir()
            .map_err(RunnerError::ScratchCreate)?;
        debug!(path = %dir.path().display(), "Created scratch area");
        Ok(Self {
            path: dir.path().to_path_buf(),
            dir: Some(dir),
        })
    }

    /// Returns the directory path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Resolves a file name inside the scratch area.
    #[must_use]
    pub fn join(&self, name: &str) -> PathBuf {
        self.path.join(name)
    }

    /// Writes `contents` to `name` inside the scratch area and returns its path.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError::WriteFailed`] if the file cannot be written.
    pub async fn write_file(&self, name: &str, contents: &str) -> Result<PathBuf> {
        let path = self.join(name);
        tokio::fs::write(&path, contents)
            .await
            .map_err(|e| RunnerError::write_failed(&path, e))?;
        Ok(path)
    }
}

impl Drop for ScratchArea {
    fn drop(&mut self) {
        let Some(dir) = self.dir.take() else {
            return;
        };
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            drop(dir);
            return;
        };
        handle.spawn_blocking(move || {
            let path = dir.path().to_path_buf();
            if let Err(e) = dir.close() {
                warn!(path = %path.display(), error = %e, "Failed to remove scratch area");
            }
        });
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn write_file_lands_inside_area() {
        let scratch = ScratchArea::create().unwrap();
        let path = scratch.write_file("solution.c", "int main(){}").await.unwrap();

        assert!(path.starts_with(scratch.path()));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "int main(){}");
    }

    #[test]
    fn directory_removed_on_drop() {
        let scratch = ScratchArea::create().unwrap();
        let path = scratch.path().to_path_buf();
        assert!(path.exists());
        assert!(path
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with(SCRATCH_PREFIX));

        drop(scratch);
        assert!(!path.exists());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn directory_removed_off_runtime_thread() {
        let scratch = ScratchArea::create().unwrap();
        scratch.write_file("solution.c", "int main(){}").await.unwrap();
        let path = scratch.path().to_path_buf();

        drop(scratch);

        for _ in 0..100 {
            if !path.exists() {
                return;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        assert!(!path.exists(), "scratch area still present: {}", path.display());
    }

    #[test]
    fn areas_are_distinct() {
        let a = ScratchArea::create().unwrap();
        let b = ScratchArea::create().unwrap();
        assert_ne!(a.path(), b.path());
    }
}
