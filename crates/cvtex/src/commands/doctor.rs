//! Doctor command - environment health check

use crate::context::Context;
use crate::output::{print_json, print_text};
use anyhow::Result;
use chrono::Utc;
use colored::Colorize;
use cvtex_core::build::exec::resolve_compiler;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::env;

/// Doctor command JSON output schema
#[derive(Debug, Serialize, Deserialize)]
struct DoctorOutput {
    schema_version: String,
    project: ProjectInfo,
    timestamp: String,
    checks: Vec<Check>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ProjectInfo {
    name: String,
    root: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct Check {
    id: String,
    name: String,
    status: CheckStatus,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<BTreeMap<String, serde_json::Value>>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
enum CheckStatus {
    Ok,
    Warning,
    Error,
}

impl Check {
    fn new(id: &str, name: &str, status: CheckStatus, message: String) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            status,
            message,
            details: None,
        }
    }

    fn detail(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.details
            .get_or_insert_with(BTreeMap::new)
            .insert(key.to_string(), value.into());
        self
    }
}

/// Run environment health check
///
/// # Returns
///
/// Always returns Ok(()) - doctor command always exits 0
pub fn run(json: bool, verbose: bool) -> Result<()> {
    // Try to load context, but continue even if it fails
    let ctx_result = Context::new(verbose);

    let mut checks = Vec::new();

    // Check 1: Config validity
    let project_info = match &ctx_result {
        Ok(ctx) => {
            let message = if ctx.project.config_path().is_file() {
                "cvtex.toml is valid".to_string()
            } else {
                "cvtex.toml not found, using defaults".to_string()
            };
            checks.push(Check::new(
                "config_valid",
                "Configuration file",
                CheckStatus::Ok,
                message,
            ));
            ProjectInfo {
                name: ctx
                    .config
                    .project
                    .name
                    .clone()
                    .unwrap_or_else(|| "unnamed".to_string()),
                root: ctx.project.root.display().to_string(),
            }
        }
        Err(e) => {
            checks.push(Check::new(
                "config_valid",
                "Configuration file",
                CheckStatus::Error,
                format!("Failed to load config: {}", e),
            ));
            let current_dir = env::current_dir().unwrap_or_else(|_| ".".into());
            ProjectInfo {
                name: "unknown".to_string(),
                root: current_dir.display().to_string(),
            }
        }
    };

    // Checks 2-4 need a loaded configuration
    if let Ok(ctx) = &ctx_result {
        let program = &ctx.config.compiler.program;
        checks.push(match resolve_compiler(program) {
            Ok(path) => Check::new(
                "compiler_available",
                "TeX compiler",
                CheckStatus::Ok,
                format!("{} available", program),
            )
            .detail("path", path.display().to_string()),
            Err(e) => Check::new(
                "compiler_available",
                "TeX compiler",
                CheckStatus::Error,
                e.to_string(),
            )
            .detail("program", program.as_str()),
        });

        let template_dir = ctx.config.template_dir(&ctx.project.root);
        let dir_ok = template_dir.is_dir();
        checks.push(
            Check::new(
                "template_dir",
                "Template directory",
                if dir_ok {
                    CheckStatus::Ok
                } else {
                    CheckStatus::Error
                },
                if dir_ok {
                    "Template directory exists".to_string()
                } else {
                    "Template directory not found".to_string()
                },
            )
            .detail("path", template_dir.display().to_string()),
        );

        let default_template = template_dir.join(&ctx.config.templates.default);
        let template_ok = default_template.is_file();
        checks.push(
            Check::new(
                "default_template",
                "Default template",
                if template_ok {
                    CheckStatus::Ok
                } else {
                    CheckStatus::Warning
                },
                if template_ok {
                    format!("'{}' found", ctx.config.templates.default)
                } else {
                    format!(
                        "'{}' not found; pass --template to build",
                        ctx.config.templates.default
                    )
                },
            )
            .detail("path", default_template.display().to_string()),
        );
    }

    let output = DoctorOutput {
        schema_version: "1.0".to_string(),
        project: project_info,
        timestamp: Utc::now().to_rfc3339(),
        checks,
    };

    if json {
        print_json(&serde_json::to_string_pretty(&output)?)?;
    } else {
        print_human_readable(&output)?;
    }

    Ok(())
}

/// Print human-readable output
fn print_human_readable(output: &DoctorOutput) -> std::io::Result<()> {
    print_text(&format!("{}", "Environment Health Check".bold()))?;
    print_text("")?;

    print_text(&format!("{}", "Project:".bold()))?;
    print_text(&format!("  Name: {}", output.project.name))?;
    print_text(&format!("  Root: {}", output.project.root))?;
    print_text("")?;

    print_text(&format!("{}", "Checks:".bold()))?;
    for check in &output.checks {
        let status_str = match check.status {
            CheckStatus::Ok => "✓".green(),
            CheckStatus::Warning => "⚠".yellow(),
            CheckStatus::Error => "✗".red(),
        };

        print_text(&format!(
            "  {} {}: {}",
            status_str,
            check.name.bold(),
            check.message
        ))?;

        if let Some(details) = &check.details {
            for (key, value) in details {
                print_text(&format!("      {}: {}", key, value))?;
            }
        }
    }

    print_text("")?;
    print_text(&format!("Timestamp: {}", output.timestamp))
}
