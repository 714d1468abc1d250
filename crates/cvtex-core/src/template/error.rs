//! Errors raised while compiling or rendering a template

use std::fmt;

/// Every failure is reported before any output is returned
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    /// Placeholder or each source names a key the data lacks
    UndefinedKey {
        key: String,
        line: usize,
    },

    /// Unclosed tag or unbalanced block
    MalformedSyntax {
        message: String,
        /// 1-based line of the offending tag
        line: usize,
    },

    /// Delimiter set rejected when configuring an engine
    InvalidSyntax {
        message: String,
    },

    /// Filter name not registered with the engine
    UnknownFilter {
        name: String,
        line: usize,
    },

    /// List value in a placeholder
    ArrayInNonEachContext {
        key: String,
    },

    /// Mapping value in a placeholder
    TableInPlaceholder {
        key: String,
    },

    /// Rendering exceeded the engine's wall-clock guard
    Timeout {
        max_duration: std::time::Duration,
        elapsed: std::time::Duration,
    },
}

impl fmt::Display for TemplateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TemplateError::UndefinedKey { key, line } => {
                write!(f, "Undefined key '{}' at line {}", key, line)
            }
            TemplateError::MalformedSyntax { message, line } => {
                write!(f, "Malformed syntax at line {}: {}", line, message)
            }
            TemplateError::InvalidSyntax { message } => {
                write!(f, "Invalid delimiters: {}", message)
            }
            TemplateError::UnknownFilter { name, line } => {
                write!(f, "Unknown filter '{}' at line {}", name, line)
            }
            TemplateError::ArrayInNonEachContext { key } => {
                write!(
                    f,
                    "Array '{}' used outside of an each block. Use ((* each {} |item| *)) ... ((* /each *))",
                    key, key
                )
            }
            TemplateError::TableInPlaceholder { key } => {
                write!(
                    f,
                    "Table '{}' cannot be used directly in placeholder. Use nested keys like {}.field",
                    key, key
                )
            }
            TemplateError::Timeout {
                max_duration,
                elapsed,
            } => {
                write!(
                    f,
                    "Template rendering timed out after {:.2}s (max: {:.2}s)",
                    elapsed.as_secs_f64(),
                    max_duration.as_secs_f64()
                )
            }
        }
    }
}

impl std::error::Error for TemplateError {}
