//! Global context for CLI commands

use anyhow::Result;
use cvtex_core::{config::Config, project::Project, state::State};
use std::env;

/// Global context containing project, config, and state
#[allow(dead_code)]
pub struct Context {
    pub project: Project,
    pub config: Config,
    pub state: State,
    pub verbose: bool,
}

impl Context {
    /// Create a new context by loading project, config, and state
    ///
    /// The project root is the nearest directory holding cvtex.toml, or the
    /// current directory when there is none.
    ///
    /// # Errors
    ///
    /// Returns an error if cvtex.toml exists but cannot be read or parsed
    pub fn new(verbose: bool) -> Result<Self> {
        let current_dir = env::current_dir()?;
        let project = Project::discover(&current_dir);
        let config = Config::load_or_default(&project.root)?;
        let state = State::load_or_empty(project.state_path());

        Ok(Self {
            project,
            config,
            state,
            verbose,
        })
    }

    /// Save the current state to disk
    pub fn save_state(&self) -> Result<()> {
        self.state.save(self.project.state_path())?;
        Ok(())
    }
}
