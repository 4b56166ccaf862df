use clap::Parser;
use std::path::PathBuf;
use stockroom::cli::dispatcher::{DispatchOptions, Dispatcher};
use stockroom::cli::main_types::Cli;
use stockroom::storage::config::Config;
use stockroom::utils::logging::init_logging;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    // Load Config
    let config_path = cli
        .config_dir
        .as_ref()
        .map(|dir| PathBuf::from(dir).join("config.toml"));

    let config = match Config::load(config_path.clone()) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Error loading config: {}", err);
            std::process::exit(1);
        }
    };

    if let Some(config_dir) = &cli.config_dir {
        log::debug!("using config directory: {}", config_dir);
    }

    let dispatcher = Dispatcher::new(
        config,
        DispatchOptions {
            profile: cli.profile,
            config_path,
            api_url: cli.api_url,
            token: cli.token,
            assume_yes: cli.yes,
        },
    );

    if let Err(e) = dispatcher.dispatch(cli.command).await {
        eprintln!("{} {}", e.severity().emoji(), e.display_friendly());
        if let Some(hint) = e.troubleshooting_hint() {
            eprintln!("💡 {}", hint);
        }
        std::process::exit(1);
    }
}
