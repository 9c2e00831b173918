mod cli;
mod logging;
mod report;

use anyhow::Context;
use camera_linker::{LinkEngine, LinkerConfig};
use clap::Parser;
use cli::{Cli, Commands};
use dotenv::dotenv;
use report::CliReporter;
use std::process::ExitCode;
use tracing::{debug, error};

fn main() -> ExitCode {
    dotenv().ok();

    let _guard = logging::init_logger();

    let args = Cli::parse();

    let config = match camera_linker::config::load_configuration(&args.config) {
        Ok(config) => config,
        Err(err) => {
            error!("Error loading configuration: {}", err);
            return ExitCode::FAILURE;
        }
    };
    debug!("config: {:?}", config);

    let result = match args.command {
        Some(Commands::PrintConfig) => {
            println!("Configuration: {:#?}", config);
            Ok(())
        }
        Some(Commands::Link) | None => run_link(config),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("Error: {:#}", err);
            ExitCode::FAILURE
        }
    }
}

fn run_link(config: LinkerConfig) -> anyhow::Result<()> {
    let root = config.root_path.clone();
    let engine = LinkEngine::new(config);
    let reporter = CliReporter::stdout();
    engine
        .run(&reporter)
        .with_context(|| format!("Linking under {} failed", root.display()))?;
    Ok(())
}
