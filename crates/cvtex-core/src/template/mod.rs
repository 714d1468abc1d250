//! Template module - text substitution engine for TeX document templates
//!
//! Templates are plain `.tex` skeletons with tags whose delimiters cannot collide
//! with TeX control sequences.
//!
//! ## Philosophy
//!
//! - **Pure text substitution**: no TeX evaluation, the output is only as valid as the template
//! - **Template author responsibility**: in manual mode each free-text field must be
//!   escaped explicitly with `| latex`
//! - **Explicit configuration**: delimiters, filters and escaping mode belong to one
//!   engine instance
//!
//! ## Syntax
//!
//! - Placeholders: `(( key ))`, `(( nested.key ))`, `(( key | latex | newlines ))`
//! - List iteration: `((* each items |item| *))` ... `((* /each *))`, with
//!   `loop.index`, `loop.first`, `loop.last`
//! - Conditionals: `((* if key *))` ... `((* else *))` ... `((* /if *))`, `((* if not key *))`
//! - Comments: `((# ignored #))`

pub mod engine;
pub mod error;
pub mod filters;
pub mod renderer;
pub mod syntax;

pub use engine::{render, Escaping, TemplateContext, TemplateEngine};
pub use error::TemplateError;
pub use filters::FilterSet;
pub use renderer::TemplateRenderer;
pub use syntax::Syntax;
