//! Clean command - remove the last build's working directories

use crate::context::Context;
use anyhow::Result;
use colored::Colorize;
use cvtex_core::workdir::WorkdirTracker;

/// Best-effort: directories that are already gone or cannot be removed are
/// not an error
pub fn run(verbose: bool) -> Result<()> {
    let mut ctx = Context::new(verbose)?;

    let recorded = ctx.state.clear_workdirs();
    if !recorded.is_empty() {
        ctx.save_state()?;
    }
    let mut tracker =
        WorkdirTracker::with_last(recorded).with_prefix(ctx.config.build.workdir_prefix.as_str());
    let removed = tracker.cleanup_last();

    if removed.is_empty() {
        println!("Nothing to clean");
        return Ok(());
    }

    for dir in &removed {
        if verbose {
            println!("{} Removed {}", "→".cyan(), dir.display());
        }
    }
    println!(
        "{} Removed {} working director{}",
        "✓".green().bold(),
        removed.len(),
        if removed.len() == 1 { "y" } else { "ies" }
    );
    Ok(())
}
