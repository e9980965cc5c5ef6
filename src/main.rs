use askdb::cli::dispatcher::{Dispatcher, Overrides};
use askdb::cli::main_types::Cli;
use askdb::storage::config::Config;
use askdb::utils::logging::VerboseLogger;
use clap::Parser;
use std::path::PathBuf;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(err) = VerboseLogger::init(cli.verbose) {
        eprintln!("Warning: logging unavailable: {}", err);
    }

    let config_path = cli
        .config_dir
        .as_ref()
        .map(|dir| Config::file_in(&PathBuf::from(dir)));
    if let Some(path) = &config_path {
        log::debug!("Using config file: {}", path.display());
    }

    let config = match Config::load(config_path.clone()) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Error loading config: {}", err);
            std::process::exit(1);
        }
    };

    let overrides = Overrides {
        profile: cli.profile,
        server_url: cli.server_url,
        no_color: cli.no_color,
    };

    let result = match Dispatcher::new(config, config_path, overrides) {
        Ok(mut dispatcher) => dispatcher.dispatch(cli.command).await,
        Err(err) => Err(err),
    };

    if let Err(err) = result {
        eprintln!("{} {}", err.severity().emoji(), err.display_friendly());
        if let Some(hint) = err.troubleshooting_hint() {
            eprintln!("💡 {}", hint);
        }
        std::process::exit(1);
    }
}
