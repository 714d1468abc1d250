//! CLI command structure using clap

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "cvtex")]
#[command(version, about = "Render CV data into LaTeX templates and build PDFs", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Render and compile data files to PDF
    Build {
        /// Data files (.json, .txt or .toml)
        #[arg(required = true)]
        data: Vec<PathBuf>,

        /// Template name inside the template directory
        #[arg(short, long)]
        template: Option<String>,

        /// Output directory (defaults to build.out_dir)
        #[arg(short, long)]
        out_dir: Option<PathBuf>,

        /// Leave the previous build's working directories on disk
        #[arg(long)]
        keep_previous: bool,

        /// Name outputs after first_name/last_name instead of the data file
        #[arg(long)]
        name_from_data: bool,
    },

    /// Render a data file into a working directory without compiling
    Render {
        data: PathBuf,

        #[arg(short, long)]
        template: Option<String>,
    },

    /// Remove the last build's working directories
    Clean,

    /// Print TEXT escaped for LaTeX
    Escape { text: String },

    /// Check environment health
    Doctor {
        #[arg(long)]
        json: bool,
    },
}
