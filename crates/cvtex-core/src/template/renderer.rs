//! Template renderer: loads named templates from a directory and binds document data
//!
//! Asset-bearing fields are resolved and copied into the build's working
//! directory before rendering, on a copy of the caller's data.

use crate::asset::{copy_into_workdir, default_asset_fields, resolve_asset, AssetField};
use crate::data::DocumentData;
use crate::error::{CvtexError, Result};
use crate::template::engine::{TemplateContext, TemplateEngine};
use serde_json::Value;
use std::path::{Component, Path, PathBuf};
use tracing::debug;

/// Template text together with the name it was loaded under
#[derive(Debug, Clone)]
pub struct LoadedTemplate {
    pub name: String,
    pub source: String,
}

#[derive(Debug, Clone)]
pub struct TemplateRenderer {
    template_dir: PathBuf,
    project_root: PathBuf,
    assets: Vec<AssetField>,
    engine: TemplateEngine,
}

impl TemplateRenderer {
    /// Renderer reading templates from `template_dir`, resolving relative asset
    /// paths against `project_root`
    pub fn new(template_dir: impl Into<PathBuf>, project_root: impl Into<PathBuf>) -> Self {
        Self {
            template_dir: template_dir.into(),
            project_root: project_root.into(),
            assets: default_asset_fields(),
            engine: TemplateEngine::new(),
        }
    }

    pub fn with_assets(mut self, assets: Vec<AssetField>) -> Self {
        self.assets = assets;
        self
    }

    pub fn with_engine(mut self, engine: TemplateEngine) -> Self {
        self.engine = engine;
        self
    }

    pub fn template_dir(&self) -> &Path {
        &self.template_dir
    }

    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    pub fn engine(&self) -> &TemplateEngine {
        &self.engine
    }

    /// Read a template by name; nothing is written
    pub fn load(&self, name: &str) -> Result<LoadedTemplate> {
        let not_found = || CvtexError::TemplateNotFound {
            name: name.to_string(),
            dir: self.template_dir.clone(),
        };

        if !is_plain_relative(name) {
            return Err(not_found());
        }

        let path = self.template_dir.join(name);
        let source = match std::fs::read_to_string(&path) {
            Ok(source) => source,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Err(not_found()),
            Err(e) => return Err(CvtexError::IoError(e)),
        };

        debug!(template = %path.display(), "loaded template");
        Ok(LoadedTemplate {
            name: name.to_string(),
            source,
        })
    }

    /// Resolve and copy every asset field into `workdir`
    ///
    /// Returns a copy of `data` where each resolved field holds the copied
    /// file's base name and each unresolved field is `null`, so that templates can
    /// omit the reference with `((* if field *))`.
    pub fn prepare_data(&self, data: &DocumentData, workdir: &Path) -> Result<DocumentData> {
        let mut prepared = data.clone();

        for asset in &self.assets {
            let explicit = data.get_str(&asset.field);
            match resolve_asset(explicit, &self.template_dir, &self.project_root, &asset.default) {
                Some(path) => {
                    let name = copy_into_workdir(&path, workdir)?;
                    prepared.insert(asset.field.clone(), name);
                }
                None => {
                    debug!(field = %asset.field, "asset not found, omitting reference");
                    prepared.insert(asset.field.clone(), Value::Null);
                }
            }
        }

        Ok(prepared)
    }

    /// Render a loaded template, copying assets into `workdir` first
    pub fn render_loaded(
        &self,
        template: &LoadedTemplate,
        data: &DocumentData,
        workdir: &Path,
    ) -> Result<String> {
        let prepared = self.prepare_data(data, workdir)?;
        self.render_prepared(template, prepared, Some(workdir))
    }

    /// Render a template by name, copying assets into `workdir` first
    pub fn render(&self, name: &str, data: &DocumentData, workdir: &Path) -> Result<String> {
        let template = self.load(name)?;
        self.render_loaded(&template, data, workdir)
    }

    /// Render without any asset handling; asset fields are passed through as given
    pub fn render_data(&self, name: &str, data: &DocumentData) -> Result<String> {
        let template = self.load(name)?;
        self.render_prepared(&template, data.clone(), None)
    }

    fn render_prepared(
        &self,
        template: &LoadedTemplate,
        data: DocumentData,
        workdir: Option<&Path>,
    ) -> Result<String> {
        let context = TemplateContext::new(data.into_value());
        self.engine
            .render(&template.source, &context)
            .map_err(|source| CvtexError::Render {
                template: template.name.clone(),
                source,
                workdir: workdir.map(Path::to_path_buf),
            })
    }
}

/// Template names must stay inside the template directory
fn is_plain_relative(name: &str) -> bool {
    let path = Path::new(name);
    !name.is_empty()
        && path
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}
