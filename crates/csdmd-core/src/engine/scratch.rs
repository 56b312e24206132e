use std::io;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, info};

const SCRATCH_PREFIX: &str = "md_input-";

/// Directory holding the transient inputs of one run.
///
/// Each run gets its own uniquely named directory, so concurrent runs in the
/// same working directory never collide. The directory is removed when the
/// value is dropped unless [`ScratchDir::persist`] was called.
#[derive(Debug)]
pub struct ScratchDir {
    inner: Inner,
}

#[derive(Debug)]
enum Inner {
    Temporary(TempDir),
    Kept(PathBuf),
}

impl ScratchDir {
    pub fn create_in(parent: &Path) -> io::Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix(SCRATCH_PREFIX)
            .tempdir_in(parent)?;
        debug!("Created scratch directory {:?}", dir.path());
        Ok(Self {
            inner: Inner::Temporary(dir),
        })
    }

    /// Wraps a directory the run does not own; it is never deleted.
    pub fn existing(path: impl Into<PathBuf>) -> Self {
        Self {
            inner: Inner::Kept(path.into()),
        }
    }

    pub fn path(&self) -> &Path {
        match &self.inner {
            Inner::Temporary(dir) => dir.path(),
            Inner::Kept(path) => path,
        }
    }

    /// Stops the directory from being removed on drop and returns its path.
    pub fn persist(self) -> PathBuf {
        match self.inner {
            Inner::Temporary(dir) => {
                let path = dir.keep();
                info!("Keeping input directory {:?}", path);
                path
            }
            Inner::Kept(path) => path,
        }
    }
}
