//! Project configuration (`cvtex.toml`)

mod model;

pub use model::{
    BuildConfig, CompilerSection, Config, ProjectConfig, TemplatesConfig, CONFIG_FILE,
};
