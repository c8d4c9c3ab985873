//! homeauto - Entry Point
//!
//! Reference host for the FRITZ!Box polling engine. Ticks every configured action,
//! logs what the actions would display and reads simulated key presses from stdin.

use std::collections::HashMap;
use std::env;
use std::path::PathBuf;

use homeauto::app::options::AppOptions;
use homeauto::app::run::run;
use homeauto::logs::{init_logging, LogOptions};
use homeauto::storage::file::JsonFile;
use homeauto::storage::layout::StorageLayout;
use homeauto::storage::settings::HostConfig;
use homeauto::utils::version_info;

use tracing::{error, info};

#[tokio::main]
async fn main() {
    // Parse command line arguments
    let args: Vec<String> = env::args().collect();
    let mut cli_args: HashMap<String, String> = HashMap::new();

    for arg in args.iter().skip(1) {
        if let Some((key, value)) = arg.split_once('=') {
            // Handle --key=value format
            let clean_key = key.trim_start_matches('-');
            cli_args.insert(clean_key.to_string(), value.to_string());
        } else if arg.starts_with("--") {
            // Handle standalone flags like --version
            let clean_key = arg.trim_start_matches('-');
            cli_args.insert(clean_key.to_string(), "true".to_string());
        }
    }

    // Print version and exit
    let version = version_info();
    if cli_args.contains_key("version") {
        match serde_json::to_string_pretty(&version) {
            Ok(text) => println!("{}", text),
            Err(e) => eprintln!("Failed to print version: {}", e),
        }
        return;
    }

    // Retrieve the config file
    let config_path = cli_args
        .get("config")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("homeauto.json"));
    let config = match JsonFile::new(&config_path).read::<HostConfig>().await {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Unable to read config file {}: {}", config_path.display(), e);
            std::process::exit(2);
        }
    };

    // Initialize logging
    let log_options = LogOptions {
        log_level: config.log_level,
        log_dir: config.log_dir.clone(),
        json_format: config.json_logs,
        ..Default::default()
    };
    if let Err(e) = init_logging(log_options) {
        println!("Failed to initialize logging: {e}");
    }

    let mut options = AppOptions::from_config(&config);
    if let Some(state_dir) = cli_args.get("state-dir") {
        options.layout = StorageLayout::new(state_dir);
    }

    info!(
        "Running homeauto {} ({}) with {} action(s), state in {}",
        version.version,
        version.git_hash,
        options.actions.len(),
        options.layout.base_dir.display()
    );
    let result = run(options, await_shutdown_signal()).await;
    if let Err(e) = result {
        error!("Failed to run the host: {e}");
        std::process::exit(1);
    }

    // The stdin reader may still be blocked on a read
    std::process::exit(0);
}

async fn await_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = signal(SignalKind::terminate()).expect("Failed to listen for SIGTERM");
        let mut sigint = signal(SignalKind::interrupt()).expect("Failed to listen for SIGINT");

        tokio::select! {
            _ = sigterm.recv() => {
                info!("SIGTERM received, shutting down...");
            }
            _ = sigint.recv() => {
                info!("SIGINT received, shutting down...");
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Ctrl+C received, shutting down...");
            }
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await.expect("Failed to listen for Ctrl+C");
        info!("Ctrl+C received, shutting down...");
    }
}
