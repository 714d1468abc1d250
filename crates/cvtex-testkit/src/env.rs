//! Environment helpers for tests that spawn the CLI or a real TeX toolchain

use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// `PATH` value with `dir` in front of the current search path
///
/// Pass it to a child process (`Command::env("PATH", ..)`) rather than
/// mutating the test process environment.
pub fn path_with(dir: &Path) -> OsString {
    let mut paths = vec![dir.to_path_buf()];
    if let Some(current) = std::env::var_os("PATH") {
        paths.extend(std::env::split_paths(&current));
    }
    std::env::join_paths(paths).unwrap_or_else(|_| dir.as_os_str().to_os_string())
}

/// Real latexmk on `PATH`, if installed together with lualatex
///
/// Tests that need an actual TeX installation return early when this is `None`.
pub fn which_latexmk() -> Option<PathBuf> {
    which::which("lualatex").ok()?;
    which::which("latexmk").ok()
}
