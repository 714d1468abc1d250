//! Persisted record of the last build
//!
//! `.cvtex/state.json` is a cache: losing it only means the previous build's
//! working directories are no longer cleaned up automatically.

use crate::error::{CvtexError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const SCHEMA_VERSION: &str = "1.0";

/// Contents of state.json
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct State {
    pub schema_version: String,
    pub machine: MachineInfo,
    #[serde(default)]
    pub build: Option<BuildState>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MachineInfo {
    pub os: String,
    pub arch: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BuildState {
    pub last: Option<LastBuild>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LastBuild {
    pub template: String,
    pub success: bool,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub duration_ms: u64,
    /// Working directories of this run, kept until the next build or `clean`
    #[serde(default)]
    pub workdirs: Vec<PathBuf>,
    #[serde(default)]
    pub outputs: Vec<PathBuf>,
    pub error: Option<String>,
}

impl State {
    pub fn empty() -> Self {
        Self {
            schema_version: SCHEMA_VERSION.to_string(),
            machine: MachineInfo::detect(),
            build: None,
        }
    }

    /// Read state.json, rejecting unknown schema versions
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| CvtexError::StateReadError(format!("Failed to read: {}", e)))?;

        let state: Self = serde_json::from_str(&content)
            .map_err(|e| CvtexError::StateReadError(format!("Failed to parse: {}", e)))?;

        match state.schema_version.as_str() {
            SCHEMA_VERSION => Ok(state),
            version => Err(CvtexError::StateInvalidSchema(version.to_string())),
        }
    }

    /// Write state.json atomically, creating its directory
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let parent = ensure_parent_dir(path)?;
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| CvtexError::StateWriteError(format!("Failed to serialize: {}", e)))?;
        atomic_write(&content, path, parent)
    }

    /// Missing or unreadable state is treated as empty
    pub fn load_or_empty(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|_| Self::empty())
    }

    pub fn last_build(&self) -> Option<&LastBuild> {
        self.build.as_ref().and_then(|b| b.last.as_ref())
    }

    pub fn set_last_build(&mut self, last: LastBuild) {
        self.build.get_or_insert_with(BuildState::default).last = Some(last);
    }

    /// Working directories recorded by the last build
    pub fn last_workdirs(&self) -> &[PathBuf] {
        self.last_build().map(|b| b.workdirs.as_slice()).unwrap_or(&[])
    }

    /// Forget the last build's working directories
    pub fn clear_workdirs(&mut self) -> Vec<PathBuf> {
        match self.build.as_mut().and_then(|b| b.last.as_mut()) {
            Some(last) => std::mem::take(&mut last.workdirs),
            None => Vec::new(),
        }
    }
}

/// Ensure parent directory exists and return it
fn ensure_parent_dir(path: &Path) -> Result<&Path> {
    let parent = path.parent().ok_or_else(|| {
        CvtexError::StateWriteError("State path has no parent directory".to_string())
    })?;
    std::fs::create_dir_all(parent).map_err(|e| {
        CvtexError::StateWriteError(format!("Failed to create parent dir: {}", e))
    })?;
    Ok(parent)
}

/// Sibling temp file, synced, then renamed over `path`
fn atomic_write(content: &str, path: &Path, parent: &Path) -> Result<()> {
    use std::io::Write;

    let write_error = |step: &str, e: &dyn std::fmt::Display| {
        CvtexError::StateWriteError(format!("{} failed: {}", step, e))
    };

    let mut file = tempfile::NamedTempFile::new_in(parent).map_err(|e| write_error("create", &e))?;
    file.write_all(content.as_bytes())
        .map_err(|e| write_error("write", &e))?;
    file.as_file().sync_all().map_err(|e| write_error("sync", &e))?;
    file.persist(path).map_err(|e| write_error("persist", &e))?;
    Ok(())
}

impl MachineInfo {
    pub fn detect() -> Self {
        Self {
            os: std::env::consts::OS.to_string(),
            arch: std::env::consts::ARCH.to_string(),
        }
    }
}
