use colored::Colorize;
use cvtex_core::CvtexError;
use std::io::{self, Write};

pub fn print_json(s: &str) -> io::Result<()> {
    let mut out = io::stdout().lock();
    writeln!(out, "{s}")
}

pub fn print_text(s: &str) -> io::Result<()> {
    let mut out = io::stdout().lock();
    writeln!(out, "{s}")
}

/// Report a failed build on stderr
///
/// Compiler errors already carry the raw log and the working directory in
/// their message; other errors get the working directory appended when one
/// was created.
pub fn print_failure(label: &str, err: &CvtexError) {
    let mut out = io::stderr().lock();
    let _ = writeln!(out, "{} Build failed for '{}'", "✗".red().bold(), label);
    let _ = writeln!(out, "{err}");
    if let (false, Some(dir)) = (matches!(err, CvtexError::Build(_)), err.workdir()) {
        let _ = writeln!(out, "\nTemp build folder: {}", dir.display());
    }
}
