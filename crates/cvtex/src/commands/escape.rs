//! Escape command - print text with LaTeX special characters encoded

use crate::output::print_text;
use anyhow::Result;
use cvtex_core::escape_latex;

pub fn run(text: &str) -> Result<()> {
    print_text(&escape_latex(text))?;
    Ok(())
}
