//! Server and connector configuration

use super::*;
use crate::server::connector::HttpTuning;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Server configuration
///
/// Describes how the server is reachable: bind address, optional header and
/// buffer size caps, and an optional TLS section. All optional values are
/// first-class `Option`s; an unset value means "inherit the engine default",
/// never zero or another sentinel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server host
    #[serde(default = "default_host")]
    pub host: String,
    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,
    /// Number of worker threads (defaults to CPU count)
    pub workers: Option<usize>,
    /// Cap on total request header bytes
    pub request_header_size: Option<usize>,
    /// Cap on total response header bytes
    pub response_header_size: Option<usize>,
    /// Buffer capacity hint for request body aggregation
    pub output_buffer_size: Option<usize>,
    /// TLS configuration
    #[serde(default)]
    pub ssl: SslConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            workers: None,
            request_header_size: None,
            response_header_size: None,
            output_buffer_size: None,
            ssl: SslConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Get the server address
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Get the number of workers (defaults to CPU count)
    pub fn worker_count(&self) -> usize {
        self.workers.unwrap_or_else(num_cpus::get)
    }

    /// Collect the optional HTTP tuning overrides
    pub fn tuning(&self) -> HttpTuning {
        HttpTuning {
            request_header_size: self.request_header_size,
            response_header_size: self.response_header_size,
            output_buffer_size: self.output_buffer_size,
        }
    }

    /// Merge server configurations (other takes precedence)
    ///
    /// `host` and `port` deserialize with defaults filled in, so an overlay
    /// value equal to the default is indistinguishable from an unset one and
    /// keeps the base value. Overlays that need to pin the default port must
    /// set it on the base configuration instead.
    pub fn merge(mut self, other: Self) -> Self {
        if other.host != default_host() {
            self.host = other.host;
        }
        if other.port != default_port() {
            self.port = other.port;
        }
        if other.workers.is_some() {
            self.workers = other.workers;
        }
        if other.request_header_size.is_some() {
            self.request_header_size = other.request_header_size;
        }
        if other.response_header_size.is_some() {
            self.response_header_size = other.response_header_size;
        }
        if other.output_buffer_size.is_some() {
            self.output_buffer_size = other.output_buffer_size;
        }
        if other.ssl.enabled {
            self.ssl = other.ssl;
        }
        self
    }

    /// Validate server configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.port == 0 {
            return Err("Port cannot be 0".to_string());
        }

        if self.workers == Some(0) {
            return Err("Worker count cannot be 0".to_string());
        }

        self.ssl.validate()?;

        Ok(())
    }
}

/// TLS configuration
///
/// Every field except `enabled` and `client_auth` is optional; an unset field
/// means the underlying TLS engine's default is used.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SslConfig {
    /// Enable TLS on the connector
    #[serde(default)]
    pub enabled: bool,
    /// Key store: PEM bundle holding the certificate chain and private key
    pub key_store: Option<StoreConfig>,
    /// Key manager password
    pub key_manager_password: Option<String>,
    /// Trust store: PEM bundle of trusted root certificates
    pub trust_store: Option<StoreConfig>,
    /// Cipher suite include/exclude name filters
    #[serde(default)]
    pub cipher_suites: NameFilter,
    /// Protocol version include/exclude name filters
    #[serde(default)]
    pub protocols: NameFilter,
    /// Require client certificate authentication
    #[serde(default)]
    pub client_auth: bool,
    /// Certificate alias selecting `<alias>.pem` within a key store directory
    pub cert_alias: Option<String>,
}

impl SslConfig {
    /// Validate TLS configuration
    pub fn validate(&self) -> Result<(), String> {
        if !self.enabled {
            return Ok(());
        }

        let key_store = self
            .key_store
            .as_ref()
            .ok_or_else(|| "TLS is enabled but ssl.key_store.path is not set".to_string())?;
        key_store.validate("ssl.key_store")?;

        if let Some(trust_store) = &self.trust_store {
            trust_store.validate("ssl.trust_store")?;
        }

        if self.client_auth && self.trust_store.is_none() {
            return Err(
                "ssl.client_auth requires ssl.trust_store.path to verify client certificates"
                    .to_string(),
            );
        }

        if let Some(password) = &self.key_manager_password {
            if password.is_empty() {
                return Err("ssl.key_manager.password cannot be empty when set".to_string());
            }
        }

        Ok(())
    }
}

/// A key or trust store location with an optional password
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Path to the PEM file (or directory when a certificate alias is used)
    pub path: PathBuf,
    /// Store password
    pub password: Option<String>,
}

impl StoreConfig {
    fn validate(&self, context: &str) -> Result<(), String> {
        if self.path.as_os_str().is_empty() {
            return Err(format!("{context}.path cannot be empty"));
        }
        if let Some(password) = &self.password {
            if password.is_empty() {
                return Err(format!("{context}.password cannot be empty when set"));
            }
        }
        Ok(())
    }
}

/// Include/exclude name filters over cipher suites or protocol versions
///
/// `None` means "no filtering"; the engine's defaults pass through untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NameFilter {
    /// Names to keep (when set, everything else is dropped)
    pub include: Option<Vec<String>>,
    /// Names to drop
    pub exclude: Option<Vec<String>>,
}

impl NameFilter {
    /// Apply the filters to a candidate list, keying each candidate by name
    pub fn apply<T, F>(&self, candidates: &mut Vec<T>, name_of: F)
    where
        F: Fn(&T) -> String,
    {
        if let Some(include) = &self.include {
            candidates.retain(|c| {
                let name = name_of(c);
                include.iter().any(|n| n.eq_ignore_ascii_case(&name))
            });
        }
        if let Some(exclude) = &self.exclude {
            candidates.retain(|c| {
                let name = name_of(c);
                !exclude.iter().any(|n| n.eq_ignore_ascii_case(&name))
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 9090);
        assert!(!config.ssl.enabled);
        assert!(config.request_header_size.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_ssl_requires_key_store() {
        let config = ServerConfig {
            ssl: SslConfig {
                enabled: true,
                ..SslConfig::default()
            },
            ..ServerConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_client_auth_requires_trust_store() {
        let ssl = SslConfig {
            enabled: true,
            key_store: Some(StoreConfig {
                path: PathBuf::from("certs/server.pem"),
                password: None,
            }),
            client_auth: true,
            ..SslConfig::default()
        };
        assert!(ssl.validate().is_err());
    }

    #[test]
    fn test_name_filter_include_exclude() {
        let filter = NameFilter {
            include: Some(vec!["a".to_string(), "b".to_string()]),
            exclude: Some(vec!["B".to_string()]),
        };
        let mut items = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        filter.apply(&mut items, |s| s.clone());
        assert_eq!(items, vec!["a".to_string()]);
    }

    #[test]
    fn test_merge_prefers_explicit_values() {
        let base = ServerConfig::default();
        let overlay = ServerConfig {
            port: 8443,
            request_header_size: Some(16384),
            ..ServerConfig::default()
        };
        let merged = base.merge(overlay);
        assert_eq!(merged.port, 8443);
        assert_eq!(merged.request_header_size, Some(16384));
        assert_eq!(merged.host, "0.0.0.0");
    }

    #[test]
    fn test_merge_overlay_at_default_port_keeps_base() {
        // A default-valued port in the overlay cannot be told apart from an
        // unset one, so the base value survives.
        let base = ServerConfig {
            port: 8080,
            ..ServerConfig::default()
        };
        let merged = base.merge(ServerConfig::default());
        assert_eq!(merged.port, 8080);
    }
}
