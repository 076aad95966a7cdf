//! # webhost-rs
//!
//! An embeddable HTTP host that composes an application out of discovered
//! endpoint classes: REST resources, cross-cutting providers, raw handlers,
//! and WebSocket endpoints, served behind a plain or TLS connector next to a
//! bundled static content tree.
//!
//! ## Features
//!
//! - **Declarative endpoints**: register classes with path markers and let
//!   the classifier partition them into resources, raw handlers, and sockets
//! - **Static-first dispatch**: bundled files under `web/` shadow application
//!   handlers; misses fall through to the application branch
//! - **TLS connectors**: PEM key stores, cipher-suite and protocol filtering,
//!   optional mutual TLS via a trust store
//! - **WebSocket endpoints**: lazily instantiated per upgrade, resolved from
//!   an application container with a bare-construction fallback
//! - **Two-stage lifecycle**: explicit start/stop with graceful shutdown
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use webhost_rs::{EndpointClass, Resource, Result, run_server};
//! use actix_web::{HttpRequest, HttpResponse, web::Bytes};
//! use async_trait::async_trait;
//!
//! struct Status;
//!
//! #[async_trait(?Send)]
//! impl Resource for Status {
//!     async fn handle(&self, _req: HttpRequest, _body: Bytes) -> Result<HttpResponse> {
//!         Ok(HttpResponse::Ok().body("up"))
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let classes = vec![
//!         EndpointClass::builder("Status")
//!             .resource_path("/status")
//!             .resource_factory(|| Ok(Arc::new(Status)))
//!             .build(),
//!     ];
//!     run_server(classes).await
//! }
//! ```

#![allow(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_inception)]

pub mod config;
pub mod registry;
pub mod server;
pub mod utils;

// Re-export main types
pub use config::Config;
pub use utils::error::{HostError, Result};

// Export the registry surface
pub use registry::class::{EndpointClass, EndpointClassBuilder, EndpointFactory, MarkerKind};
pub use registry::classifier::{Classification, classify};
pub use registry::handler::{Provider, RawHandler, Resource, SocketEndpoint};
pub use registry::resolver::{InstanceResolver, NullResolver};

// Export the server surface
pub use server::builder::{ServerBuilder, run_server};
pub use server::server::{HttpServer, ServerState};

// Version information
/// Current version of the crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
/// Name of the crate
pub const NAME: &str = env!("CARGO_PKG_NAME");
