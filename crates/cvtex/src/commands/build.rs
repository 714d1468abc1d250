//! Build command - render data files into the template and compile them to PDF

use crate::context::Context;
use crate::output::print_failure;
use anyhow::{Context as _, Result, bail};
use chrono::Utc;
use colored::Colorize;
use cvtex_core::data::slugify_profile;
use cvtex_core::state::LastBuild;
use cvtex_core::workdir::WorkdirTracker;
use cvtex_core::{BuildResult, CvtexError, DocumentData, Pipeline};
use rayon::prelude::*;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

pub struct BuildArgs {
    pub data: Vec<PathBuf>,
    pub template: Option<String>,
    pub out_dir: Option<PathBuf>,
    pub keep_previous: bool,
    pub name_from_data: bool,
}

/// One data file to build
struct Job {
    source: PathBuf,
    name: String,
    data: DocumentData,
}

struct Outcome {
    name: String,
    result: std::result::Result<BuildResult, CvtexError>,
}

/// Build every data file
///
/// All builds run even if some fail; the command fails if any did.
pub fn run(args: BuildArgs, verbose: bool) -> Result<()> {
    let mut ctx = Context::new(verbose)?;

    // Step 1: Clean up the previous build's working directories
    let prefix = ctx.config.build.workdir_prefix.clone();
    let mut tracker =
        WorkdirTracker::with_last(ctx.state.clear_workdirs()).with_prefix(prefix.as_str());
    if args.keep_previous {
        tracker = WorkdirTracker::new().with_prefix(prefix);
    } else {
        let removed = tracker.cleanup_last();
        if verbose && !removed.is_empty() {
            println!(
                "{} Removed {} previous working director{}",
                "→".cyan(),
                removed.len(),
                if removed.len() == 1 { "y" } else { "ies" }
            );
        }
    }

    // Step 2: Load data files before anything is rendered
    let jobs = load_jobs(&args.data, args.name_from_data)?;

    let template = args
        .template
        .unwrap_or_else(|| ctx.config.templates.default.clone());
    let out_dir = args
        .out_dir
        .unwrap_or_else(|| ctx.config.out_dir(&ctx.project.root));
    fs::create_dir_all(&out_dir)
        .with_context(|| format!("Failed to create output directory '{}'", out_dir.display()))?;

    // Step 3: Render and compile
    let pipeline = ctx.config.pipeline(&ctx.project.root);
    if verbose {
        println!(
            "{} Building {} file(s) with template '{}'",
            "→".cyan(),
            jobs.len(),
            template
        );
    }

    let started_at = Utc::now();
    let start = Instant::now();
    let outcomes: Vec<Outcome> = if ctx.config.build.parallel && jobs.len() > 1 {
        jobs.par_iter()
            .map(|job| build_one(&pipeline, &template, job))
            .collect()
    } else {
        jobs.iter()
            .map(|job| build_one(&pipeline, &template, job))
            .collect()
    };
    let duration_ms = start.elapsed().as_millis() as u64;

    // Step 4: Write outputs and report
    let mut outputs = Vec::new();
    let mut workdirs = Vec::new();
    let mut first_error = None;
    let mut failed = 0;

    for outcome in &outcomes {
        match &outcome.result {
            Ok(result) => {
                workdirs.push(result.workdir.clone());
                let pdf = write_outputs(&out_dir, &outcome.name, result)?;
                println!(
                    "{} Built '{}' to {}",
                    "✓".green().bold(),
                    outcome.name,
                    pdf.display()
                );
                if verbose {
                    println!("  Working directory: {}", result.workdir.display());
                }
                outputs.push(pdf);
            }
            Err(err) => {
                failed += 1;
                if let Some(dir) = err.workdir() {
                    workdirs.push(dir.to_path_buf());
                }
                print_failure(&outcome.name, err);
                first_error.get_or_insert_with(|| summary(err));
            }
        }
    }

    // Step 5: Remember the working directories for the next build or `clean`
    tracker.record_all(workdirs);
    ctx.state.set_last_build(LastBuild {
        template: template.clone(),
        success: failed == 0,
        started_at,
        finished_at: Utc::now(),
        duration_ms,
        workdirs: tracker.last().to_vec(),
        outputs,
        error: first_error,
    });
    ctx.save_state()?;

    if failed > 0 {
        bail!("{} of {} build(s) failed", failed, outcomes.len());
    }
    Ok(())
}

fn load_jobs(paths: &[PathBuf], name_from_data: bool) -> Result<Vec<Job>> {
    let mut jobs = Vec::with_capacity(paths.len());
    let mut names = HashSet::new();

    for source in paths {
        let data = DocumentData::load(source)
            .with_context(|| format!("Failed to load data file '{}'", source.display()))?;
        let name = output_name(source, &data, name_from_data);
        if !names.insert(name.clone()) {
            bail!(
                "Output name '{}' is produced by more than one data file",
                name
            );
        }
        jobs.push(Job {
            source: source.clone(),
            name,
            data,
        });
    }
    Ok(jobs)
}

fn output_name(source: &Path, data: &DocumentData, name_from_data: bool) -> String {
    if name_from_data {
        return slugify_profile(
            data.get_str("first_name").unwrap_or_default(),
            data.get_str("last_name").unwrap_or_default(),
        );
    }
    source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "cv".to_string())
}

fn build_one(pipeline: &Pipeline, template: &str, job: &Job) -> Outcome {
    tracing::info!(data = %job.source.display(), "building");
    Outcome {
        name: job.name.clone(),
        result: pipeline.render_and_build(template, &job.data),
    }
}

/// Copy the PDF and the rendered source next to each other in `out_dir`
fn write_outputs(out_dir: &Path, name: &str, result: &BuildResult) -> Result<PathBuf> {
    let pdf = out_dir.join(format!("{}.pdf", name));
    fs::write(&pdf, &result.compiled_bytes)
        .with_context(|| format!("Failed to write '{}'", pdf.display()))?;
    let tex = out_dir.join(format!("{}.tex", name));
    fs::write(&tex, &result.source_text)
        .with_context(|| format!("Failed to write '{}'", tex.display()))?;
    Ok(pdf)
}

/// First line of an error, for state.json
fn summary(err: &CvtexError) -> String {
    err.to_string().lines().next().unwrap_or_default().to_string()
}
