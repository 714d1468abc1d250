//! Build orchestration: write rendered source into a working directory and run
//! the TeX driver on it

pub mod exec;

use crate::error::{BuildError, BuildErrorKind, CvtexError, Result};
use crate::workdir::{self, DEFAULT_PREFIX};
use exec::{resolve_compiler, ExecOptions, ExecOutcome};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// External compiler invocation
///
/// The command line is `program args... source_name`, run inside the working
/// directory. The driver is expected to run as many passes as it needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompilerConfig {
    pub program: String,
    pub args: Vec<String>,
    /// `None` disables the timeout
    pub timeout: Option<Duration>,
    pub source_name: String,
    pub output_name: String,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            program: "latexmk".to_string(),
            args: default_args(),
            timeout: Some(Duration::from_secs(300)),
            source_name: "main.tex".to_string(),
            output_name: "main.pdf".to_string(),
        }
    }
}

/// LuaLaTeX, no interaction, stop at the first error
pub fn default_args() -> Vec<String> {
    ["-lualatex", "-interaction=nonstopmode", "-halt-on-error"]
        .into_iter()
        .map(String::from)
        .collect()
}

/// Outcome of a successful build
///
/// The working directory is left in place; cleaning it is the caller's call.
#[derive(Debug, Clone)]
pub struct BuildResult {
    pub compiled_bytes: Vec<u8>,
    pub source_text: String,
    pub workdir: PathBuf,
}

impl BuildResult {
    pub fn source_path(&self, compiler: &CompilerConfig) -> PathBuf {
        self.workdir.join(&compiler.source_name)
    }
}

#[derive(Debug, Clone)]
pub struct BuildOrchestrator {
    compiler: CompilerConfig,
    workdir_prefix: String,
    workdir_root: Option<PathBuf>,
}

impl Default for BuildOrchestrator {
    fn default() -> Self {
        Self::new(CompilerConfig::default())
    }
}

impl BuildOrchestrator {
    pub fn new(compiler: CompilerConfig) -> Self {
        Self {
            compiler,
            workdir_prefix: DEFAULT_PREFIX.to_string(),
            workdir_root: None,
        }
    }

    pub fn with_workdir_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.workdir_prefix = prefix.into();
        self
    }

    /// Create working directories under `root` instead of the system temp root
    pub fn with_workdir_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.workdir_root = Some(root.into());
        self
    }

    pub fn compiler(&self) -> &CompilerConfig {
        &self.compiler
    }

    /// Fresh, uniquely named working directory for one build
    pub fn create_workdir(&self) -> Result<PathBuf> {
        match &self.workdir_root {
            Some(root) => workdir::create_workdir_in(root, &self.workdir_prefix),
            None => workdir::create_workdir(&self.workdir_prefix),
        }
    }

    /// Compile `source` in a new working directory
    pub fn build_document(&self, source: &str) -> Result<BuildResult> {
        let dir = self.create_workdir()?;
        self.build_in(&dir, source, None)
    }

    /// Compile `source` in a new working directory, stopping when `cancel` fires
    pub fn build_document_cancellable(
        &self,
        source: &str,
        cancel: &CancellationToken,
    ) -> Result<BuildResult> {
        let dir = self.create_workdir()?;
        self.build_in(&dir, source, Some(cancel))
    }

    /// Write the source file into an existing working directory
    pub fn write_source(&self, dir: &Path, source: &str) -> Result<PathBuf> {
        let path = dir.join(&self.compiler.source_name);
        match std::fs::write(&path, source) {
            Ok(()) => Ok(path),
            Err(source) => Err(CvtexError::BuildIo {
                path,
                workdir: dir.to_path_buf(),
                source,
            }),
        }
    }

    /// The command line as run inside the working directory
    pub fn command_line(&self) -> String {
        std::iter::once(self.compiler.program.as_str())
            .chain(self.compiler.args.iter().map(String::as_str))
            .chain(std::iter::once(self.compiler.source_name.as_str()))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Compile `source` inside `dir`, which must already exist
    ///
    /// On cancellation the directory is removed; on every other failure it is
    /// kept and its path is carried by the error.
    pub fn build_in(
        &self,
        dir: &Path,
        source: &str,
        cancel: Option<&CancellationToken>,
    ) -> Result<BuildResult> {
        self.write_source(dir, source)?;

        let program = resolve_compiler(&self.compiler.program).map_err(|e| match e {
            CvtexError::CompilerSpawn {
                program, reason, ..
            } => CvtexError::CompilerSpawn {
                program,
                reason,
                workdir: Some(dir.to_path_buf()),
            },
            other => other,
        })?;

        let mut options = ExecOptions::new(program, dir)
            .args(self.compiler.args.iter().cloned())
            .args([self.compiler.source_name.clone()])
            .timeout(self.compiler.timeout);
        if let Some(token) = cancel {
            options = options.cancel(token.clone());
        }

        info!(workdir = %dir.display(), program = %self.compiler.program, "starting build");
        let result = exec::run(&options).map_err(|e| CvtexError::CompilerSpawn {
            program: self.compiler.program.clone(),
            reason: e.to_string(),
            workdir: Some(dir.to_path_buf()),
        })?;

        let failure = |kind: BuildErrorKind, log: String| {
            CvtexError::Build(BuildError {
                kind,
                command: self.command_line(),
                log,
                workdir: dir.to_path_buf(),
            })
        };

        match result.outcome {
            ExecOutcome::Exited { success: true, .. } => {}
            ExecOutcome::Exited { code, .. } => {
                warn!(workdir = %dir.display(), exit_code = ?code, "build failed");
                return Err(failure(BuildErrorKind::Failed { exit_code: code }, result.output));
            }
            ExecOutcome::TimedOut => {
                let timeout = self.compiler.timeout.unwrap_or_default();
                return Err(failure(BuildErrorKind::TimedOut { timeout }, result.output));
            }
            ExecOutcome::Cancelled => {
                workdir::cleanup(dir);
                return Err(failure(BuildErrorKind::Cancelled, result.output));
            }
        }

        let output_path = dir.join(&self.compiler.output_name);
        let compiled_bytes = match std::fs::read(&output_path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(CvtexError::MissingOutput {
                    expected: output_path,
                    workdir: dir.to_path_buf(),
                });
            }
            Err(source) => {
                return Err(CvtexError::BuildIo {
                    path: output_path,
                    workdir: dir.to_path_buf(),
                    source,
                });
            }
        };

        info!(
            workdir = %dir.display(),
            duration_ms = result.duration_ms,
            bytes = compiled_bytes.len(),
            "build finished"
        );

        Ok(BuildResult {
            compiled_bytes,
            source_text: source.to_string(),
            workdir: dir.to_path_buf(),
        })
    }
}
