//! HTTP server implementation
//!
//! This module composes the handler chain, builds connectors, and owns the
//! server lifecycle.

pub mod middleware;

pub mod builder;
pub mod chain;
pub mod connector;
pub mod server;
pub mod sockets;

pub use builder::{ServerBuilder, load_config_or_default, run_server, run_server_with};
pub use chain::{HandlerChain, PathPattern};
pub use connector::{Connector, HttpTuning, build_connectors};
pub use server::{HttpServer, ServerState};
pub use sockets::{SocketRegistration, register_endpoints};

#[cfg(test)]
mod tests;
