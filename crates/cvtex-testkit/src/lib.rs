//! Shared helpers for the cvtex test suites
//!
//! Scratch directories live under `.tmp/` of the crate running the tests, so a
//! crashed test leaves its files somewhere predictable (and gitignored).

pub mod env;
#[cfg(unix)]
pub mod fake;

pub use env::{path_with, which_latexmk};
#[cfg(unix)]
pub use fake::{FakeBehavior, FakeCompiler};

use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Scratch directory under `.tmp/`, removed on drop
///
/// # Panics
///
/// Panics if `.tmp/` or the directory inside it cannot be created.
///
/// ```rust
/// use cvtex_testkit::temp_dir_in_workspace;
///
/// let temp = temp_dir_in_workspace();
/// std::fs::write(temp.path().join("cv.json"), "{}").unwrap();
/// ```
pub fn temp_dir_in_workspace() -> TempDir {
    try_temp_dir_in_workspace().expect("could not create scratch directory under .tmp/")
}

pub fn try_temp_dir_in_workspace() -> std::io::Result<TempDir> {
    let base = std::env::current_dir()?.join(".tmp");
    std::fs::create_dir_all(&base)?;
    tempfile::Builder::new().prefix("cvtex-test-").tempdir_in(&base)
}

/// Write `contents` to `dir/relative`, creating parent directories
///
/// # Panics
///
/// Panics on any I/O error.
pub fn write_file(dir: &Path, relative: &str, contents: impl AsRef<[u8]>) -> PathBuf {
    let path = dir.join(relative);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("could not create parent directory");
    }
    std::fs::write(&path, contents).expect("could not write test file");
    path
}
