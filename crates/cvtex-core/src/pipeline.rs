//! Render-then-build pipeline

use crate::build::{BuildOrchestrator, BuildResult};
use crate::data::DocumentData;
use crate::error::Result;
use crate::template::TemplateRenderer;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Rendered source written into a working directory, not compiled
#[derive(Debug, Clone)]
pub struct PreparedSource {
    pub workdir: PathBuf,
    pub source_path: PathBuf,
    pub source_text: String,
}

/// Renderer and orchestrator wired together
///
/// The template is loaded before any working directory exists, so a missing
/// template leaves nothing behind. Every later failure carries the directory's
/// path.
#[derive(Debug, Clone)]
pub struct Pipeline {
    renderer: TemplateRenderer,
    orchestrator: BuildOrchestrator,
}

impl Pipeline {
    pub fn new(renderer: TemplateRenderer, orchestrator: BuildOrchestrator) -> Self {
        Self {
            renderer,
            orchestrator,
        }
    }

    pub fn renderer(&self) -> &TemplateRenderer {
        &self.renderer
    }

    pub fn orchestrator(&self) -> &BuildOrchestrator {
        &self.orchestrator
    }

    pub fn render_and_build(&self, template: &str, data: &DocumentData) -> Result<BuildResult> {
        self.run(template, data, None)
    }

    pub fn render_and_build_cancellable(
        &self,
        template: &str,
        data: &DocumentData,
        cancel: &CancellationToken,
    ) -> Result<BuildResult> {
        self.run(template, data, Some(cancel))
    }

    /// Render into a fresh working directory and write the source file only
    pub fn prepare(&self, template: &str, data: &DocumentData) -> Result<PreparedSource> {
        let loaded = self.renderer.load(template)?;
        let workdir = self.orchestrator.create_workdir()?;
        let source_text = self.renderer.render_loaded(&loaded, data, &workdir)?;
        let source_path = self.orchestrator.write_source(&workdir, &source_text)?;
        Ok(PreparedSource {
            workdir,
            source_path,
            source_text,
        })
    }

    fn run(
        &self,
        template: &str,
        data: &DocumentData,
        cancel: Option<&CancellationToken>,
    ) -> Result<BuildResult> {
        let loaded = self.renderer.load(template)?;
        let workdir = self.orchestrator.create_workdir()?;
        debug!(template, workdir = %workdir.display(), "rendering");
        let source = self.renderer.render_loaded(&loaded, data, &workdir)?;
        self.orchestrator.build_in(&workdir, &source, cancel)
    }
}
