use crate::asset::{default_asset_fields, AssetField};
use crate::build::{BuildOrchestrator, CompilerConfig};
use crate::error::{CvtexError, Result};
use crate::pipeline::Pipeline;
use crate::template::{Escaping, TemplateEngine, TemplateRenderer};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// File name looked up at the project root
pub const CONFIG_FILE: &str = "cvtex.toml";

/// cvtex.toml schema; every section is optional
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub project: ProjectConfig,
    #[serde(default)]
    pub templates: TemplatesConfig,
    #[serde(default)]
    pub compiler: CompilerSection,
    #[serde(default)]
    pub build: BuildConfig,
    #[serde(default = "default_asset_fields")]
    pub assets: Vec<AssetField>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            project: ProjectConfig::default(),
            templates: TemplatesConfig::default(),
            compiler: CompilerSection::default(),
            build: BuildConfig::default(),
            assets: default_asset_fields(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplatesConfig {
    /// Relative to the project root
    #[serde(default = "default_template_dir")]
    pub dir: PathBuf,
    #[serde(default = "default_template")]
    pub default: String,
    #[serde(default)]
    pub escaping: Escaping,
}

impl Default for TemplatesConfig {
    fn default() -> Self {
        Self {
            dir: default_template_dir(),
            default: default_template(),
            escaping: Escaping::default(),
        }
    }
}

fn default_template_dir() -> PathBuf {
    PathBuf::from("templates")
}

fn default_template() -> String {
    "main.tex.tmpl".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompilerSection {
    #[serde(default = "default_program")]
    pub program: String,
    #[serde(default = "crate::build::default_args")]
    pub args: Vec<String>,
    /// Seconds; 0 disables the timeout
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_source_name")]
    pub source_name: String,
    #[serde(default = "default_output_name")]
    pub output_name: String,
}

impl Default for CompilerSection {
    fn default() -> Self {
        Self {
            program: default_program(),
            args: crate::build::default_args(),
            timeout_secs: default_timeout_secs(),
            source_name: default_source_name(),
            output_name: default_output_name(),
        }
    }
}

impl CompilerSection {
    pub fn to_compiler_config(&self) -> CompilerConfig {
        CompilerConfig {
            program: self.program.clone(),
            args: self.args.clone(),
            timeout: (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs)),
            source_name: self.source_name.clone(),
            output_name: self.output_name.clone(),
        }
    }
}

fn default_program() -> String {
    "latexmk".to_string()
}

fn default_timeout_secs() -> u64 {
    300
}

fn default_source_name() -> String {
    "main.tex".to_string()
}

fn default_output_name() -> String {
    "main.pdf".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildConfig {
    #[serde(default = "default_workdir_prefix")]
    pub workdir_prefix: String,
    #[serde(default = "default_parallel")]
    pub parallel: bool,
    /// Relative to the project root
    #[serde(default = "default_out_dir")]
    pub out_dir: PathBuf,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            workdir_prefix: default_workdir_prefix(),
            parallel: true,
            out_dir: default_out_dir(),
        }
    }
}

fn default_workdir_prefix() -> String {
    crate::workdir::DEFAULT_PREFIX.to_string()
}

fn default_parallel() -> bool {
    true
}

fn default_out_dir() -> PathBuf {
    PathBuf::from("out")
}

impl Config {
    /// Read and validate a config file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| CvtexError::ConfigParseError(e.to_string()))?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(content).map_err(|e| CvtexError::ConfigParseError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load `<root>/cvtex.toml`, or the defaults when the file does not exist
    pub fn load_or_default(root: &Path) -> Result<Self> {
        let path = root.join(CONFIG_FILE);
        if path.is_file() {
            Self::from_file(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Serialize to TOML, overwriting `path`
    pub fn to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| CvtexError::ConfigParseError(e.to_string()))?;
        std::fs::write(path.as_ref(), content)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        let invalid = |field: &str, reason: &str| {
            Err(CvtexError::ConfigInvalidValue {
                field: field.to_string(),
                reason: reason.to_string(),
            })
        };

        if self.compiler.program.trim().is_empty() {
            return invalid("compiler.program", "must not be empty");
        }
        for (field, name) in [
            ("compiler.source_name", &self.compiler.source_name),
            ("compiler.output_name", &self.compiler.output_name),
        ] {
            if !is_plain_file_name(name) {
                return invalid(field, "must be a plain file name");
            }
        }
        if self.build.workdir_prefix.is_empty() {
            return invalid("build.workdir_prefix", "must not be empty");
        }
        if self.build.workdir_prefix.contains(['/', '\\']) {
            return invalid("build.workdir_prefix", "must not contain path separators");
        }
        if self.templates.default.trim().is_empty() {
            return invalid("templates.default", "must not be empty");
        }
        for asset in &self.assets {
            if asset.field.trim().is_empty() {
                return invalid("assets.field", "must not be empty");
            }
            if !is_plain_file_name(&asset.default) {
                return invalid("assets.default", "must be a plain file name");
            }
        }
        Ok(())
    }

    pub fn template_dir(&self, root: &Path) -> PathBuf {
        root.join(&self.templates.dir)
    }

    pub fn out_dir(&self, root: &Path) -> PathBuf {
        root.join(&self.build.out_dir)
    }

    pub fn renderer(&self, root: &Path) -> TemplateRenderer {
        let engine = TemplateEngine::new().with_escaping(self.templates.escaping);
        TemplateRenderer::new(self.template_dir(root), root)
            .with_assets(self.assets.clone())
            .with_engine(engine)
    }

    pub fn orchestrator(&self) -> BuildOrchestrator {
        BuildOrchestrator::new(self.compiler.to_compiler_config())
            .with_workdir_prefix(self.build.workdir_prefix.clone())
    }

    pub fn pipeline(&self, root: &Path) -> Pipeline {
        Pipeline::new(self.renderer(root), self.orchestrator())
    }
}

fn is_plain_file_name(name: &str) -> bool {
    !name.is_empty() && !name.contains(['/', '\\']) && name != "." && name != ".."
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = Config::from_toml_str("").unwrap();
        assert_eq!(config.templates.dir, PathBuf::from("templates"));
        assert_eq!(config.templates.default, "main.tex.tmpl");
        assert_eq!(config.templates.escaping, Escaping::Manual);
        assert_eq!(config.compiler.program, "latexmk");
        assert_eq!(config.compiler.timeout_secs, 300);
        assert_eq!(config.build.workdir_prefix, "cv_build_");
        assert!(config.build.parallel);
        assert_eq!(config.assets.len(), 2);
        assert_eq!(config.assets[0].field, "photo_banner_path");
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
[project]
name = "consultancy"

[templates]
dir = "tex"
default = "consultancy.tex.tmpl"
escaping = "auto"

[compiler]
program = "/opt/texlive/bin/latexmk"
args = ["-pdf"]
timeout_secs = 0

[build]
parallel = false
out_dir = "pdf"

[[assets]]
field = "logo_path"
default = "logo.png"
"#;
        let config = Config::from_toml_str(toml).unwrap();
        assert_eq!(config.project.name.as_deref(), Some("consultancy"));
        assert_eq!(config.templates.escaping, Escaping::Auto);
        assert!(!config.build.parallel);
        assert_eq!(config.assets, vec![AssetField::new("logo_path", "logo.png")]);

        let compiler = config.compiler.to_compiler_config();
        assert_eq!(compiler.args, vec!["-pdf"]);
        assert_eq!(compiler.timeout, None);
        assert_eq!(compiler.source_name, "main.tex");
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = Config::from_toml_str("[compiler]\nsource_name = \"../main.tex\"\n").unwrap_err();
        assert!(err.to_string().contains("compiler.source_name"));

        let err = Config::from_toml_str("[build]\nworkdir_prefix = \"a/b\"\n").unwrap_err();
        assert!(err.to_string().starts_with("CONFIG_INVALID_VALUE"));

        let err = Config::from_toml_str("[build]\nworkdir_prefix = \"\"\n").unwrap_err();
        assert!(err.to_string().contains("build.workdir_prefix"));

        let err = Config::from_toml_str("[templates]\nescaping = \"sometimes\"\n").unwrap_err();
        assert!(err.to_string().starts_with("CONFIG_PARSE_ERROR"));
    }

    #[test]
    fn test_round_trip_through_file() {
        let temp = cvtex_testkit::temp_dir_in_workspace();
        let path = temp.path().join(CONFIG_FILE);
        let mut config = Config::default();
        config.build.out_dir = PathBuf::from("dist");
        config.to_file(&path).unwrap();

        let loaded = Config::load_or_default(temp.path()).unwrap();
        assert_eq!(loaded.build.out_dir, PathBuf::from("dist"));
        assert_eq!(loaded.assets, config.assets);
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let temp = cvtex_testkit::temp_dir_in_workspace();
        let config = Config::load_or_default(temp.path()).unwrap();
        assert_eq!(config.out_dir(temp.path()), temp.path().join("out"));
    }
}
