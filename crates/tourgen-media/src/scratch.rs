//! Scoped scratch directories.

use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::MediaResult;

/// A uniquely named working directory removed when the guard drops.
///
/// Removal runs on every exit path; failures are logged and swallowed.
#[derive(Debug)]
pub struct ScratchDir {
    path: PathBuf,
}

impl ScratchDir {
    /// Create `<root>/<prefix>-<uuid>`.
    pub async fn create(root: impl AsRef<Path>, prefix: &str) -> MediaResult<Self> {
        let path = root
            .as_ref()
            .join(format!("{}-{}", prefix, Uuid::new_v4().simple()));
        tokio::fs::create_dir_all(&path).await?;
        debug!(path = %path.display(), "Created scratch directory");
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn join(&self, name: impl AsRef<Path>) -> PathBuf {
        self.path.join(name)
    }
}

impl Drop for ScratchDir {
    fn drop(&mut self) {
        match std::fs::remove_dir_all(&self.path) {
            Ok(()) => debug!(path = %self.path.display(), "Removed scratch directory"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(
                path = %self.path.display(),
                error = %e,
                "Failed to remove scratch directory"
            ),
        }
    }
}
