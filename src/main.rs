//! webhost - embeddable HTTP host
//!
//! Standalone binary serving the bundled `web/` tree. Applications embed the
//! library instead and register their own endpoint classes.

#![allow(missing_docs)]

use clap::Parser;
use std::process::ExitCode;
use tracing::Level;
use webhost_rs::server::builder::{self, load_config_or_default, run_server_with};

#[derive(Parser)]
#[command(name = "webhost", version, about = "Embeddable HTTP host")]
struct Cli {
    /// Path to the YAML configuration file
    #[arg(short, long, env = "WEBHOST_CONFIG", default_value = builder::DEFAULT_CONFIG_PATH)]
    config: String,

    /// Override the configured listen port
    #[arg(short, long, env = "WEBHOST_PORT")]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize logging system
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .with_target(false)
        .with_thread_ids(false)
        .init();

    let cli = Cli::parse();
    let mut config = load_config_or_default(&cli.config).await;
    if let Some(port) = cli.port {
        config.server.port = port;
    }

    match run_server_with(config, Vec::new()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            // Print error using Display (not Debug) to preserve newlines
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
