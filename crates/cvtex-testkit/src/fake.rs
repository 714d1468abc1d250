//! Scripted stand-in for latexmk
//!
//! The script is run as `/bin/sh <script> [args...] main.tex` so that tests
//! never exec a file that was just written (which can fail with ETXTBSY when
//! another test thread forks at the same moment).

use std::path::{Path, PathBuf};

/// What the fake compiler does when invoked
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FakeBehavior {
    /// Writes `<source stem>.pdf` starting with `%PDF-1.5`, followed by the
    /// source text; fails like TeX if the source contains `\undefined`
    Succeed,
    /// Always exits 1 with a TeX-style error on stderr
    Fail,
    /// Exits 0 without producing a PDF
    NoOutput,
    /// Prints one line, then sleeps for a minute
    Hang,
}

const PRELUDE: &str = r#"#!/bin/sh
for arg in "$@"; do src="$arg"; done
echo "Latexmk: fake run on $src in $(pwd)"
"#;

impl FakeBehavior {
    fn body(self) -> &'static str {
        match self {
            FakeBehavior::Succeed => {
                r#"if grep -q '\\undefined' "$src"; then
  echo "! Undefined control sequence." 1>&2
  echo "l.1 \\undefined" 1>&2
  exit 12
fi
printf '%%PDF-1.5\n' > "${src%.tex}.pdf"
cat "$src" >> "${src%.tex}.pdf"
echo "Output written on ${src%.tex}.pdf"
"#
            }
            FakeBehavior::Fail => {
                r#"echo "! LaTeX Error: File \`missing.sty' not found." 1>&2
exit 1
"#
            }
            FakeBehavior::NoOutput => "echo \"Latexmk: All targets are up-to-date\"\n",
            FakeBehavior::Hang => "exec sleep 60\n",
        }
    }
}

/// A fake latexmk script installed in a test directory
#[derive(Debug, Clone)]
pub struct FakeCompiler {
    script: PathBuf,
}

impl FakeCompiler {
    /// Write the script for `behavior` into `dir` as `latexmk`
    pub fn install(dir: &Path, behavior: FakeBehavior) -> Self {
        std::fs::create_dir_all(dir).expect("Failed to create fake compiler directory");
        let script = dir.join("latexmk");
        let content = format!("{}{}", PRELUDE, behavior.body());
        std::fs::write(&script, content).expect("Failed to write fake compiler");
        Self { script }
    }

    pub fn script(&self) -> &Path {
        &self.script
    }

    /// Program to configure as the compiler
    pub fn program(&self) -> String {
        "/bin/sh".to_string()
    }

    /// Arguments to configure; the source file name is appended by the caller
    pub fn args(&self) -> Vec<String> {
        vec![self.script.to_string_lossy().into_owned()]
    }

    /// `[compiler]` section for a cvtex.toml using this fake
    pub fn toml_section(&self, timeout_secs: u64) -> String {
        format!(
            "[compiler]\nprogram = {:?}\nargs = [{:?}]\ntimeout_secs = {}\n",
            self.program(),
            self.script.to_string_lossy(),
            timeout_secs
        )
    }
}
