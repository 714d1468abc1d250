//! Project detection

use crate::config::CONFIG_FILE;
use std::path::{Path, PathBuf};

/// Represents a cvtex project
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    pub root: PathBuf,
}

impl Project {
    /// Find project root by searching upward for cvtex.toml
    pub fn find_root(start: &Path) -> Option<Self> {
        start
            .ancestors()
            .find(|dir| dir.join(CONFIG_FILE).is_file())
            .map(|root| Self {
                root: root.to_path_buf(),
            })
    }

    /// Project rooted at the nearest cvtex.toml, or at `start` itself
    pub fn discover(start: &Path) -> Self {
        Self::find_root(start).unwrap_or_else(|| Self {
            root: start.to_path_buf(),
        })
    }

    pub fn config_path(&self) -> PathBuf {
        self.root.join(CONFIG_FILE)
    }

    pub fn state_path(&self) -> PathBuf {
        self.root.join(".cvtex").join("state.json")
    }
}
