use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::template::TemplateError;

#[derive(Error, Debug)]
pub enum CvtexError {
    // Template errors
    #[error("TEMPLATE_NOT_FOUND: template '{name}' not found in '{}'", .dir.display())]
    TemplateNotFound { name: String, dir: PathBuf },

    #[error("RENDER_FAILED: template '{template}': {source}")]
    Render {
        template: String,
        #[source]
        source: TemplateError,
        workdir: Option<PathBuf>,
    },

    // Asset errors
    #[error("ASSET_COPY_FAILED: could not copy asset '{}' into '{}': {source}", .path.display(), .workdir.display())]
    AssetCopy {
        path: PathBuf,
        workdir: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Build errors
    #[error("BUILD_FAILED: {0}")]
    Build(#[from] BuildError),

    #[error("COMPILER_NOT_FOUND: could not start '{program}': {reason}")]
    CompilerSpawn {
        program: String,
        reason: String,
        workdir: Option<PathBuf>,
    },

    #[error(
        "BUILD_INVARIANT: compiler reported success but '{}' was not created (toolchain or config mismatch)",
        .expected.display()
    )]
    MissingOutput { expected: PathBuf, workdir: PathBuf },

    #[error("BUILD_IO_ERROR: '{}': {source}", .path.display())]
    BuildIo {
        path: PathBuf,
        workdir: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Config errors
    #[error("CONFIG_PARSE_ERROR: {0}")]
    ConfigParseError(String),

    #[error("CONFIG_INVALID_VALUE: {field}: {reason}")]
    ConfigInvalidValue { field: String, reason: String },

    // Data errors
    #[error("DATA_INVALID: {0}")]
    DataInvalid(String),

    // State errors
    #[error("STATE_READ_ERROR: failed to read state.json: {0}")]
    StateReadError(String),

    #[error("STATE_WRITE_ERROR: failed to write state.json: {0}")]
    StateWriteError(String),

    #[error("STATE_INVALID_SCHEMA: unknown schema version '{0}'")]
    StateInvalidSchema(String),

    // IO errors
    #[error("IO_ERROR: {0}")]
    IoError(#[from] std::io::Error),
}

impl CvtexError {
    /// Working directory the failing build left behind, if one was created
    pub fn workdir(&self) -> Option<&Path> {
        match self {
            CvtexError::Render { workdir, .. } | CvtexError::CompilerSpawn { workdir, .. } => {
                workdir.as_deref()
            }
            CvtexError::AssetCopy { workdir, .. }
            | CvtexError::MissingOutput { workdir, .. }
            | CvtexError::BuildIo { workdir, .. } => Some(workdir),
            CvtexError::Build(err) => Some(&err.workdir),
            _ => None,
        }
    }

    /// Raw compiler log, present only for compiler failures
    pub fn build_log(&self) -> Option<&str> {
        match self {
            CvtexError::Build(err) => Some(&err.log),
            _ => None,
        }
    }

    /// True for the render-time failures (missing template, syntax, undefined field)
    pub fn is_render_error(&self) -> bool {
        matches!(
            self,
            CvtexError::TemplateNotFound { .. } | CvtexError::Render { .. }
        )
    }
}

/// How a compiler run went wrong
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildErrorKind {
    /// Compiler exited with a non-zero status (`None` when killed by a signal)
    Failed { exit_code: Option<i32> },
    /// Compiler was killed after exceeding the configured timeout
    TimedOut { timeout: Duration },
    /// Build was cancelled through its cancellation token
    Cancelled,
}

/// Compiler failure carrying the full captured output
///
/// The log is the combined stdout/stderr of the compiler, verbatim.
#[derive(Error, Debug, Clone)]
#[error(
    "{}\n\nCommand failed:\n{command}\n\n---- Build output ----\n{log}\n\nTemp build folder: {}",
    describe(.kind),
    .workdir.display()
)]
pub struct BuildError {
    pub kind: BuildErrorKind,
    /// The invoked command line, space-joined
    pub command: String,
    pub log: String,
    pub workdir: PathBuf,
}

fn describe(kind: &BuildErrorKind) -> String {
    match kind {
        BuildErrorKind::Failed {
            exit_code: Some(code),
        } => format!("compiler exited with status {}", code),
        BuildErrorKind::Failed { exit_code: None } => {
            "compiler terminated by signal".to_string()
        }
        BuildErrorKind::TimedOut { timeout } => {
            format!("compiler timed out after {}s", timeout.as_secs())
        }
        BuildErrorKind::Cancelled => "build cancelled".to_string(),
    }
}

impl From<serde_json::Error> for CvtexError {
    fn from(err: serde_json::Error) -> Self {
        CvtexError::DataInvalid(format!("JSON error: {}", err))
    }
}

pub type Result<T> = std::result::Result<T, CvtexError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_message_names_duration() {
        let err = BuildError {
            kind: BuildErrorKind::TimedOut {
                timeout: Duration::from_secs(7),
            },
            command: "latexmk -lualatex main.tex".to_string(),
            log: "partial".to_string(),
            workdir: PathBuf::from("/tmp/cv_build_x"),
        };
        let msg = CvtexError::from(err).to_string();
        assert!(msg.starts_with("BUILD_FAILED: compiler timed out after 7s"));
        assert!(msg.contains("Command failed:\nlatexmk -lualatex main.tex\n"));
        assert!(msg.contains("partial"));
        assert!(msg.contains("/tmp/cv_build_x"));
    }

    #[test]
    fn test_workdir_reported_for_build_failures() {
        let err = CvtexError::from(BuildError {
            kind: BuildErrorKind::Failed { exit_code: Some(12) },
            command: "latexmk main.tex".to_string(),
            log: "! Undefined control sequence.".to_string(),
            workdir: PathBuf::from("/tmp/cv_build_y"),
        });
        assert_eq!(err.workdir(), Some(Path::new("/tmp/cv_build_y")));
        assert_eq!(err.build_log(), Some("! Undefined control sequence."));
        assert!(!err.is_render_error());
    }

    #[test]
    fn test_build_io_error_reports_workdir() {
        let err = CvtexError::BuildIo {
            path: PathBuf::from("/tmp/cv_build_z/main.tex"),
            workdir: PathBuf::from("/tmp/cv_build_z"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert_eq!(err.workdir(), Some(Path::new("/tmp/cv_build_z")));
        assert!(err.to_string().starts_with("BUILD_IO_ERROR: '/tmp/cv_build_z/main.tex'"));
    }

    #[test]
    fn test_template_not_found_is_render_error() {
        let err = CvtexError::TemplateNotFound {
            name: "missing.tex.tmpl".to_string(),
            dir: PathBuf::from("templates"),
        };
        assert!(err.is_render_error());
        assert!(err.workdir().is_none());
        assert!(err.to_string().starts_with("TEMPLATE_NOT_FOUND"));
    }
}
