//! Render command - prepare the TeX source without compiling it

use crate::context::Context;
use anyhow::{Context as _, Result};
use chrono::Utc;
use colored::Colorize;
use cvtex_core::DocumentData;
use cvtex_core::state::LastBuild;
use cvtex_core::workdir::WorkdirTracker;
use std::path::PathBuf;
use std::time::Instant;

/// Render `data` into a fresh working directory and print the source path
///
/// The working directory replaces the previous build's in state.json, so the
/// next build or `clean` removes it.
pub fn run(data: PathBuf, template: Option<String>, verbose: bool) -> Result<()> {
    let mut ctx = Context::new(verbose)?;

    let document = DocumentData::load(&data)
        .with_context(|| format!("Failed to load data file '{}'", data.display()))?;
    let template = template.unwrap_or_else(|| ctx.config.templates.default.clone());
    let pipeline = ctx.config.pipeline(&ctx.project.root);

    let started_at = Utc::now();
    let start = Instant::now();
    let result = pipeline.prepare(&template, &document);

    let workdir = match &result {
        Ok(prepared) => Some(prepared.workdir.clone()),
        Err(err) => err.workdir().map(|dir| dir.to_path_buf()),
    };
    let mut tracker = WorkdirTracker::with_last(ctx.state.clear_workdirs())
        .with_prefix(ctx.config.build.workdir_prefix.as_str());
    if let Some(dir) = workdir {
        tracker.record(dir);
    }

    ctx.state.set_last_build(LastBuild {
        template,
        success: result.is_ok(),
        started_at,
        finished_at: Utc::now(),
        duration_ms: start.elapsed().as_millis() as u64,
        workdirs: tracker.last().to_vec(),
        outputs: result
            .as_ref()
            .map(|prepared| vec![prepared.source_path.clone()])
            .unwrap_or_default(),
        error: result.as_ref().err().map(|e| e.to_string()),
    });
    ctx.save_state()?;
    let prepared = result?;

    if verbose {
        println!("{} Rendered '{}'", "✓".green().bold(), data.display());
    }
    println!("{}", prepared.source_path.display());
    Ok(())
}
