//! Connector construction
//!
//! Turns a [`ServerConfig`] into ready-to-bind connectors. Construction is
//! pure: nothing touches the network until the lifecycle starts the server,
//! but malformed TLS material surfaces here, at build time, not on the first
//! connection.

use crate::config::{NameFilter, ServerConfig, SslConfig, StoreConfig};
use crate::utils::error::{HostError, Result};
use rustls::crypto::CryptoProvider;
use rustls::pki_types::{CertificateDer, PrivateKeyDer};
use rustls::server::WebPkiClientVerifier;
use rustls::{RootCertStore, SupportedCipherSuite, SupportedProtocolVersion};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Optional HTTP tuning overrides carried by a connector
///
/// An unset field means the engine default applies; it is never encoded as
/// zero or another sentinel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HttpTuning {
    /// Cap on total request header bytes
    pub request_header_size: Option<usize>,
    /// Cap on total response header bytes
    pub response_header_size: Option<usize>,
    /// Buffer capacity hint for request body aggregation
    pub output_buffer_size: Option<usize>,
}

/// A ready-to-bind network connector
///
/// Holds everything the lifecycle needs to attach a listener: the bind
/// address, the tuning overrides, and the negotiated-TLS configuration when
/// the connector is secure.
#[derive(Debug)]
pub struct Connector {
    /// Address the connector binds to
    pub addr: SocketAddr,
    /// HTTP tuning overrides
    pub tuning: HttpTuning,
    /// TLS configuration; `None` for a plaintext connector
    pub tls: Option<rustls::ServerConfig>,
}

impl Connector {
    /// Is this a TLS connector?
    pub fn is_tls(&self) -> bool {
        self.tls.is_some()
    }
}

/// Build the connector set for a server configuration
///
/// Today exactly one connector is produced: plaintext when TLS is disabled,
/// TLS on the same port otherwise.
pub fn build_connectors(config: &ServerConfig) -> Result<Vec<Connector>> {
    let addr: SocketAddr = config
        .address()
        .parse()
        .map_err(|e| HostError::Config(format!("invalid bind address {}: {}", config.address(), e)))?;

    let tls = if config.ssl.enabled {
        info!("Building TLS connector on port {}", config.port);
        Some(build_tls_config(&config.ssl)?)
    } else {
        debug!("Building plaintext connector on port {}", config.port);
        None
    };

    Ok(vec![Connector {
        addr,
        tuning: config.tuning(),
        tls,
    }])
}

/// Assemble a rustls server configuration from the TLS section
///
/// Each optional field is applied only when explicitly set; unset fields fall
/// through to the engine defaults.
fn build_tls_config(ssl: &SslConfig) -> Result<rustls::ServerConfig> {
    let key_store = ssl
        .key_store
        .as_ref()
        .ok_or_else(|| HostError::Config("TLS is enabled but ssl.key_store.path is not set".into()))?;
    check_password(&key_store.password, "ssl.key_store.password")?;
    check_password(&ssl.key_manager_password, "ssl.key_manager.password")?;

    let bundle = resolve_key_store_path(key_store, ssl.cert_alias.as_deref())?;
    let (cert_chain, key) = load_key_bundle(&bundle)?;

    let provider = filtered_provider(&ssl.cipher_suites)?;
    let versions = filtered_versions(&ssl.protocols)?;

    let builder =
        rustls::ServerConfig::builder_with_provider(provider.clone()).with_protocol_versions(&versions)?;

    let config = if ssl.client_auth {
        let trust_store = ssl.trust_store.as_ref().ok_or_else(|| {
            HostError::Config(
                "ssl.client_auth requires ssl.trust_store.path to verify client certificates".into(),
            )
        })?;
        check_password(&trust_store.password, "ssl.trust_store.password")?;

        let roots = load_trust_roots(&trust_store.path)?;
        let verifier = WebPkiClientVerifier::builder_with_provider(Arc::new(roots), provider)
            .build()
            .map_err(|e| HostError::Config(format!("cannot build client verifier: {}", e)))?;

        builder
            .with_client_cert_verifier(verifier)
            .with_single_cert(cert_chain, key)?
    } else {
        builder.with_no_client_auth().with_single_cert(cert_chain, key)?
    };

    Ok(config)
}

fn check_password(password: &Option<String>, context: &str) -> Result<()> {
    if let Some(password) = password {
        if password.is_empty() {
            return Err(HostError::Config(format!(
                "{context} cannot be empty when set"
            )));
        }
    }
    Ok(())
}

/// Resolve the key store bundle path, honoring the certificate alias
///
/// Without an alias the path must be the PEM file itself; with an alias the
/// path must be a directory containing `<alias>.pem`.
fn resolve_key_store_path(store: &StoreConfig, alias: Option<&str>) -> Result<PathBuf> {
    match alias {
        Some(alias) => {
            if !store.path.is_dir() {
                return Err(HostError::Config(format!(
                    "ssl.cert_alias is set but key store {} is not a directory",
                    store.path.display()
                )));
            }
            let candidate = store.path.join(format!("{alias}.pem"));
            if candidate.is_file() {
                Ok(candidate)
            } else {
                Err(HostError::Config(format!(
                    "key store has no certificate for alias {alias:?}: {} not found",
                    candidate.display()
                )))
            }
        }
        None => {
            if store.path.is_file() {
                Ok(store.path.clone())
            } else {
                Err(HostError::Config(format!(
                    "key store not found: {}",
                    store.path.display()
                )))
            }
        }
    }
}

/// Load the certificate chain and private key from a PEM bundle
fn load_key_bundle(path: &Path) -> Result<(Vec<CertificateDer<'static>>, PrivateKeyDer<'static>)> {
    let data = std::fs::read(path)
        .map_err(|e| HostError::Config(format!("cannot read key store {}: {}", path.display(), e)))?;

    if data.windows(b"ENCRYPTED".len()).any(|w| w == b"ENCRYPTED") {
        return Err(HostError::Config(format!(
            "key store {} holds encrypted key material; provide an unencrypted PKCS#8 key",
            path.display()
        )));
    }

    let mut certs = Vec::new();
    let mut key = None;
    for item in rustls_pemfile::read_all(&mut &data[..]) {
        let item = item.map_err(|e| {
            HostError::Config(format!("malformed PEM in key store {}: {}", path.display(), e))
        })?;
        match item {
            rustls_pemfile::Item::X509Certificate(cert) => certs.push(cert),
            rustls_pemfile::Item::Pkcs8Key(k) => key = Some(PrivateKeyDer::from(k)),
            rustls_pemfile::Item::Pkcs1Key(k) => key = Some(PrivateKeyDer::from(k)),
            rustls_pemfile::Item::Sec1Key(k) => key = Some(PrivateKeyDer::from(k)),
            _ => {}
        }
    }

    if certs.is_empty() {
        return Err(HostError::Config(format!(
            "key store {} holds no certificates",
            path.display()
        )));
    }
    let key = key.ok_or_else(|| {
        HostError::Config(format!(
            "key store {} holds no private key",
            path.display()
        ))
    })?;

    Ok((certs, key))
}

/// Load trusted roots from a PEM bundle
fn load_trust_roots(path: &Path) -> Result<RootCertStore> {
    let data = std::fs::read(path).map_err(|e| {
        HostError::Config(format!("cannot read trust store {}: {}", path.display(), e))
    })?;

    let mut roots = RootCertStore::empty();
    for item in rustls_pemfile::read_all(&mut &data[..]) {
        let item = item.map_err(|e| {
            HostError::Config(format!(
                "malformed PEM in trust store {}: {}",
                path.display(),
                e
            ))
        })?;
        if let rustls_pemfile::Item::X509Certificate(cert) = item {
            roots.add(cert).map_err(|e| {
                HostError::Config(format!(
                    "rejected certificate in trust store {}: {}",
                    path.display(),
                    e
                ))
            })?;
        }
    }

    if roots.is_empty() {
        return Err(HostError::Config(format!(
            "trust store {} holds no certificates",
            path.display()
        )));
    }

    Ok(roots)
}

/// Build a crypto provider with the cipher-suite filters applied
fn filtered_provider(filter: &NameFilter) -> Result<Arc<CryptoProvider>> {
    let base = rustls::crypto::ring::default_provider();
    let mut suites = base.cipher_suites.clone();
    filter.apply(&mut suites, suite_name);

    if suites.is_empty() {
        return Err(HostError::Config(
            "cipher suite filters left no usable suites".into(),
        ));
    }

    Ok(Arc::new(CryptoProvider {
        cipher_suites: suites,
        ..base
    }))
}

/// Select the protocol versions after the include/exclude filters
fn filtered_versions(filter: &NameFilter) -> Result<Vec<&'static SupportedProtocolVersion>> {
    let mut versions = rustls::ALL_VERSIONS.to_vec();
    filter.apply(&mut versions, |v| protocol_name(v).to_string());

    if versions.is_empty() {
        return Err(HostError::Config(
            "protocol filters left no negotiable TLS versions".into(),
        ));
    }

    Ok(versions)
}

fn suite_name(suite: &SupportedCipherSuite) -> String {
    format!("{:?}", suite.suite())
}

fn protocol_name(version: &SupportedProtocolVersion) -> &'static str {
    match version.version {
        rustls::ProtocolVersion::TLSv1_2 => "TLSv1.2",
        rustls::ProtocolVersion::TLSv1_3 => "TLSv1.3",
        _ => "unknown",
    }
}
