//! Server builder and run_server function
//!
//! This module provides the ServerBuilder for easier server configuration
//! and the run_server function for automatic configuration loading.

use crate::config::Config;
use crate::registry::class::EndpointClass;
use crate::registry::resolver::{InstanceResolver, NullResolver};
use crate::server::server::HttpServer;
use crate::utils::error::Result;
use std::sync::Arc;
use tracing::{info, warn};

/// Default configuration file consulted by [`run_server`]
pub const DEFAULT_CONFIG_PATH: &str = "config/host.yaml";

/// Server builder for easier configuration
pub struct ServerBuilder {
    config: Option<Config>,
    classes: Vec<Arc<EndpointClass>>,
    resolver: Arc<dyn InstanceResolver>,
}

impl ServerBuilder {
    /// Create a new server builder
    pub fn new() -> Self {
        Self {
            config: None,
            classes: Vec::new(),
            resolver: Arc::new(NullResolver),
        }
    }

    /// Set configuration
    pub fn with_config(mut self, config: Config) -> Self {
        self.config = Some(config);
        self
    }

    /// Supply the discovered-class pool
    pub fn with_classes(mut self, classes: Vec<Arc<EndpointClass>>) -> Self {
        self.classes = classes;
        self
    }

    /// Add a single discovered class
    pub fn with_class(mut self, class: Arc<EndpointClass>) -> Self {
        self.classes.push(class);
        self
    }

    /// Set the container instance resolver
    pub fn with_resolver(mut self, resolver: Arc<dyn InstanceResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    /// Build the HTTP server
    pub fn build(self) -> HttpServer {
        let config = self.config.unwrap_or_default();
        HttpServer::new(config, self.classes, self.resolver)
    }
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Run the server with automatic configuration loading
///
/// Loads `config/host.yaml` when present, falls back to defaults otherwise,
/// then starts the server and serves until the process is interrupted.
pub async fn run_server(classes: Vec<Arc<EndpointClass>>) -> Result<()> {
    let config = load_config_or_default(DEFAULT_CONFIG_PATH).await;
    run_server_with(config, classes).await
}

/// Load a configuration file, falling back to defaults when it is absent
pub async fn load_config_or_default(path: &str) -> Config {
    match Config::from_file(path).await {
        Ok(config) => config,
        Err(e) => {
            warn!("Configuration file not loaded, using defaults: {}", e);
            Config::default()
        }
    }
}

/// Run the server with an explicit configuration
pub async fn run_server_with(config: Config, classes: Vec<Arc<EndpointClass>>) -> Result<()> {
    let mut server = ServerBuilder::new()
        .with_config(config)
        .with_classes(classes)
        .build();

    server.start().await?;
    info!("Serving on port {}, press Ctrl-C to stop", server.port());

    tokio::signal::ctrl_c()
        .await
        .map_err(crate::utils::error::HostError::Io)?;

    server.stop().await
}
