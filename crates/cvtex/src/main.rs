mod cli;
mod commands;
mod context;
mod output;

use clap::Parser;
use cli::{Cli, Commands};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "info" } else { "warn" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .try_init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Build {
            data,
            template,
            out_dir,
            keep_previous,
            name_from_data,
        } => commands::build::run(
            commands::build::BuildArgs {
                data,
                template,
                out_dir,
                keep_previous,
                name_from_data,
            },
            cli.verbose,
        ),
        Commands::Render { data, template } => commands::render::run(data, template, cli.verbose),
        Commands::Clean => commands::clean::run(cli.verbose),
        Commands::Escape { text } => commands::escape::run(&text),
        Commands::Doctor { json } => commands::doctor::run(json, cli.verbose),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
