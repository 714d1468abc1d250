//! Per-build working directories
//!
//! Each build gets a fresh directory under the system temp root. Directories are
//! never removed automatically; a failed build stays inspectable until
//! [`cleanup`] is called.

use crate::error::Result;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Default name prefix for working directories
pub const DEFAULT_PREFIX: &str = "cv_build_";

/// Create a new, uniquely named working directory in the system temp root
pub fn create_workdir(prefix: &str) -> Result<PathBuf> {
    let dir = tempfile::Builder::new().prefix(prefix).tempdir()?;
    let path = dir.keep();
    debug!(workdir = %path.display(), "created working directory");
    Ok(path)
}

/// Create a new working directory under `parent` instead of the system temp root
pub fn create_workdir_in(parent: &Path, prefix: &str) -> Result<PathBuf> {
    std::fs::create_dir_all(parent)?;
    let dir = tempfile::Builder::new().prefix(prefix).tempdir_in(parent)?;
    Ok(dir.keep())
}

/// Recursively delete `path`, best-effort
///
/// A missing path is fine. Any other failure is logged and swallowed.
pub fn cleanup(path: &Path) {
    match std::fs::remove_dir_all(path) {
        Ok(()) => debug!(workdir = %path.display(), "removed working directory"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!(workdir = %path.display(), error = %e, "failed to remove working directory"),
    }
}

/// Remembers the working directories of the most recent build
///
/// Recording new directories removes the previously tracked ones, so at most one
/// build's worth of directories accumulates per tracker. Only directories whose
/// name carries the tracker's prefix are ever deleted; anything else found in
/// the list (a hand-edited state.json, say) is dropped with a warning.
#[derive(Debug)]
pub struct WorkdirTracker {
    prefix: String,
    last: Vec<PathBuf>,
}

impl Default for WorkdirTracker {
    fn default() -> Self {
        Self {
            prefix: DEFAULT_PREFIX.to_string(),
            last: Vec::new(),
        }
    }
}

impl WorkdirTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tracker that already knows about directories from an earlier session
    pub fn with_last(last: Vec<PathBuf>) -> Self {
        Self {
            last,
            ..Self::default()
        }
    }

    /// Name prefix a directory must have to be deleted
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn last(&self) -> &[PathBuf] {
        &self.last
    }

    /// Track `workdir` alone, cleaning up everything tracked before
    pub fn record(&mut self, workdir: PathBuf) {
        self.record_all(vec![workdir]);
    }

    /// Track a batch of directories, cleaning up everything tracked before
    pub fn record_all(&mut self, workdirs: Vec<PathBuf>) {
        let previous = std::mem::replace(&mut self.last, workdirs);
        for dir in previous.iter().filter(|dir| !self.last.contains(dir)) {
            self.remove(dir);
        }
    }

    /// Clean up the tracked directories and forget them
    ///
    /// Returns the directories that were eligible for removal.
    pub fn cleanup_last(&mut self) -> Vec<PathBuf> {
        std::mem::take(&mut self.last)
            .into_iter()
            .filter(|dir| self.remove(dir))
            .collect()
    }

    fn remove(&self, dir: &Path) -> bool {
        if !has_prefix(dir, &self.prefix) {
            warn!(
                workdir = %dir.display(),
                prefix = %self.prefix,
                "refusing to remove directory without the working directory prefix"
            );
            return false;
        }
        cleanup(dir);
        true
    }
}

/// True when the final component of `dir` starts with `prefix`
pub fn has_prefix(dir: &Path, prefix: &str) -> bool {
    !prefix.is_empty()
        && dir
            .file_name()
            .is_some_and(|name| name.to_string_lossy().starts_with(prefix))
}
