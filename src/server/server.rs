//! HTTP server core implementation
//!
//! Owns the composed handler chain and connector set, and exposes the
//! two-stage start/stop lifecycle.

use crate::config::Config;
use crate::registry::class::EndpointClass;
use crate::registry::classifier::classify;
use crate::registry::resolver::InstanceResolver;
use crate::server::chain::{HandlerChain, serve_request};
use crate::server::connector::{Connector, build_connectors};
use crate::server::middleware::HeaderLimits;
use crate::server::sockets::register_endpoints;
use crate::utils::error::{HostError, Result};
use actix_web::{App, HttpServer as ActixHttpServer, middleware::Logger, web};
use std::sync::Arc;
use tracing::{error, info};

/// Lifecycle state of the server assembly
///
/// Owned exclusively by the server; no other component reads or writes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerState {
    /// Not running; the only state `start()` accepts
    Stopped,
    /// Composition and binding in progress
    Starting,
    /// Listening
    Running,
    /// Graceful shutdown in progress
    Stopping,
    /// A start or stop transition failed; terminal
    Failed,
}

struct RunningServer {
    handle: actix_web::dev::ServerHandle,
    task: tokio::task::JoinHandle<std::io::Result<()>>,
}

/// HTTP server
pub struct HttpServer {
    config: Config,
    classes: Vec<Arc<EndpointClass>>,
    resolver: Arc<dyn InstanceResolver>,
    state: ServerState,
    running: Option<RunningServer>,
}

impl HttpServer {
    /// Create a new HTTP server from a configuration, a discovered-class
    /// pool, and the container's instance resolver
    pub fn new(
        config: Config,
        classes: Vec<Arc<EndpointClass>>,
        resolver: Arc<dyn InstanceResolver>,
    ) -> Self {
        Self {
            config,
            classes,
            resolver,
            state: ServerState::Stopped,
            running: None,
        }
    }

    /// Current lifecycle state
    pub fn state(&self) -> ServerState {
        self.state
    }

    /// Configured port
    pub fn port(&self) -> u16 {
        self.config.server.port
    }

    /// Override the port; only meaningful before `start()`
    pub fn set_port(&mut self, port: u16) {
        self.config.server.port = port;
    }

    /// Start the server
    ///
    /// Runs the full composition pipeline — connectors, classification,
    /// chain assembly, socket registration — then binds and activates
    /// listening. Only valid from `Stopped`; a second `start()` without an
    /// intervening `stop()` fails rather than silently re-binding the port.
    /// Any failure moves the server to `Failed` and is re-raised.
    pub async fn start(&mut self) -> Result<()> {
        if self.state != ServerState::Stopped {
            return Err(HostError::Lifecycle(format!(
                "start() requires the Stopped state, server is {:?}",
                self.state
            )));
        }
        self.state = ServerState::Starting;
        info!("Starting server on {}", self.config.server.address());

        match self.compose_and_bind().await {
            Ok(running) => {
                self.running = Some(running);
                self.state = ServerState::Running;
                info!("Server started on {}", self.config.server.address());
                Ok(())
            }
            Err(e) => {
                self.state = ServerState::Failed;
                error!(error = %e, "server start failed");
                Err(e)
            }
        }
    }

    async fn compose_and_bind(&self) -> Result<RunningServer> {
        let mut connectors = build_connectors(self.config.server())?;
        // The builder produces exactly one connector today.
        let connector = connectors
            .pop()
            .ok_or_else(|| HostError::Config("no connector was built".into()))?;

        let classification = classify(&self.classes);
        info!(
            resources = classification.resources.len(),
            raw_handlers = classification.raw_handlers.len(),
            sockets = classification.sockets.len(),
            "classified discovered endpoint classes"
        );

        let tuning = connector.tuning;
        let mut chain = HandlerChain::assemble(&classification, tuning)?;

        let registrations = register_endpoints(&classification.sockets, self.resolver.clone())?;
        chain.mount_sockets(registrations);

        let chain = web::Data::new(chain);
        let workers = self.config.server.worker_count();

        let factory = move || {
            App::new()
                .app_data(chain.clone())
                .wrap(HeaderLimits::new(tuning))
                .wrap(Logger::default())
                .default_service(web::route().to(serve_request))
        };

        let Connector { addr, tls, .. } = connector;
        let server = ActixHttpServer::new(factory).workers(workers);
        let server = match tls {
            Some(tls_config) => server
                .bind_rustls_0_23(addr, tls_config)
                .map_err(|e| HostError::Server(format!("cannot bind TLS connector {addr}: {e}")))?,
            None => server
                .bind(addr)
                .map_err(|e| HostError::Server(format!("cannot bind connector {addr}: {e}")))?,
        };

        let server = server.run();
        let handle = server.handle();
        let task = tokio::spawn(server);

        Ok(RunningServer { handle, task })
    }

    /// Stop the server
    ///
    /// Requests graceful shutdown of the underlying server: the listener
    /// stops accepting and in-flight connections drain under the engine's
    /// own policy. Valid from `Running`.
    pub async fn stop(&mut self) -> Result<()> {
        if self.state != ServerState::Running {
            return Err(HostError::Lifecycle(format!(
                "stop() requires the Running state, server is {:?}",
                self.state
            )));
        }
        self.state = ServerState::Stopping;
        info!("Stopping server");

        let running = self.running.take().ok_or_else(|| {
            HostError::Lifecycle("server is Running but holds no server handle".into())
        })?;

        running.handle.stop(true).await;

        match running.task.await {
            Ok(Ok(())) => {
                self.state = ServerState::Stopped;
                info!("Server stopped");
                Ok(())
            }
            Ok(Err(e)) => {
                self.state = ServerState::Failed;
                error!(error = %e, "server shut down with an error");
                Err(HostError::Server(format!("server error during shutdown: {e}")))
            }
            Err(e) => {
                self.state = ServerState::Failed;
                error!(error = %e, "server task panicked during shutdown");
                Err(HostError::Server(format!("server task failed: {e}")))
            }
        }
    }

    /// Get server configuration
    pub fn config(&self) -> &Config {
        &self.config
    }
}
