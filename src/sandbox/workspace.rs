use crate::error::ProvisionError;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const WORKSPACE_PREFIX: &str = "tf-run-";

/// Ephemeral directory owned by exactly one request.
///
/// The directory is removed when the guard is dropped, so every exit path
/// of the owning handler cleans up. Removal failures are logged only.
#[derive(Debug)]
pub struct Workspace {
    dir: Option<TempDir>,
    path: PathBuf,
}

impl Workspace {
    pub fn acquire(root: &Path) -> Result<Self, ProvisionError> {
        let dir = tempfile::Builder::new()
            .prefix(WORKSPACE_PREFIX)
            .tempdir_in(root)
            .map_err(|e| {
                tracing::error!(root = %root.display(), error = %e, "workspace creation failed");
                ProvisionError::WorkspaceCreate(e)
            })?;
        let path = dir.path().to_path_buf();
        tracing::debug!(path = %path.display(), "workspace created");

        Ok(Self {
            dir: Some(dir),
            path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Remove the directory now instead of at drop.
    pub fn release(mut self) -> std::io::Result<()> {
        match self.dir.take() {
            Some(dir) => dir.close(),
            None => Ok(()),
        }
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        // Already gone if `release` ran.
        let Some(dir) = self.dir.take() else {
            return;
        };
        match dir.close() {
            Ok(()) => tracing::debug!(path = %self.path.display(), "workspace removed"),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "failed to remove workspace")
            }
        }
    }
}
