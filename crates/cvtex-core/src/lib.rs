// Core modules
pub mod asset;
pub mod build;
pub mod config;
pub mod data;
pub mod error;
pub mod escape;
pub mod pipeline;
pub mod project;
pub mod state;
pub mod template;
pub mod workdir;

// Re-export commonly used types
pub use build::{BuildOrchestrator, BuildResult, CompilerConfig};
pub use data::DocumentData;
pub use error::{BuildError, BuildErrorKind, CvtexError, Result};
pub use escape::escape_latex;
pub use pipeline::Pipeline;
