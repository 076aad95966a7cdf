//! Configuration data models

pub mod server;

pub use server::{NameFilter, ServerConfig, SslConfig, StoreConfig};

/// Default server host
pub(crate) fn default_host() -> String {
    "0.0.0.0".to_string()
}

/// Default server port
pub(crate) fn default_port() -> u16 {
    9090
}
