//! Endpoint class handles
//!
//! An [`EndpointClass`] is the opaque handle to a discovered type: its name,
//! the markers it declares, and how a no-argument instance is constructed.
//! Handles are immutable once built; the host only queries them.

use crate::registry::handler::{Provider, RawHandler, Resource, SocketEndpoint};
use crate::utils::error::{HostError, Result};
use std::fmt;
use std::sync::Arc;

/// Marker kinds an endpoint class may declare
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarkerKind {
    /// REST resource path marker (carries a path pattern)
    ResourcePath,
    /// Provider marker (cross-cutting request processing)
    Provider,
    /// Socket endpoint marker (carries a mount path)
    SocketEndpoint,
}

type ResourceFactory = Arc<dyn Fn() -> Result<Arc<dyn Resource>> + Send + Sync>;
type ProviderFactory = Arc<dyn Fn() -> Result<Arc<dyn Provider>> + Send + Sync>;
type RawFactory = Arc<dyn Fn() -> Result<Arc<dyn RawHandler>> + Send + Sync>;
type SocketFactory = Arc<dyn Fn() -> Result<Arc<dyn SocketEndpoint>> + Send + Sync>;

/// How a no-argument instance of the class is constructed
#[derive(Clone)]
pub enum EndpointFactory {
    /// Constructs a REST resource
    Resource(ResourceFactory),
    /// Constructs a provider
    Provider(ProviderFactory),
    /// Constructs a raw handler (this is the raw-handler capability)
    Raw(RawFactory),
    /// Constructs a socket endpoint
    Socket(SocketFactory),
    /// The class cannot be default-constructed
    Unavailable,
}

impl fmt::Debug for EndpointFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self {
            EndpointFactory::Resource(_) => "Resource",
            EndpointFactory::Provider(_) => "Provider",
            EndpointFactory::Raw(_) => "Raw",
            EndpointFactory::Socket(_) => "Socket",
            EndpointFactory::Unavailable => "Unavailable",
        };
        f.write_str(kind)
    }
}

/// Opaque handle to a discovered endpoint class
#[derive(Debug, Clone)]
pub struct EndpointClass {
    name: String,
    resource_path: Option<String>,
    provider: bool,
    socket_path: Option<String>,
    factory: EndpointFactory,
}

impl EndpointClass {
    /// Start building an endpoint class handle
    pub fn builder(name: impl Into<String>) -> EndpointClassBuilder {
        EndpointClassBuilder {
            name: name.into(),
            resource_path: None,
            provider: false,
            socket_path: None,
            factory: EndpointFactory::Unavailable,
        }
    }

    /// Class name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Does the class declare the given marker?
    pub fn has_marker(&self, kind: MarkerKind) -> bool {
        match kind {
            MarkerKind::ResourcePath => self.resource_path.is_some(),
            MarkerKind::Provider => self.provider,
            MarkerKind::SocketEndpoint => self.socket_path.is_some(),
        }
    }

    /// The value carried by the given marker, if any
    pub fn marker_value(&self, kind: MarkerKind) -> Option<&str> {
        match kind {
            MarkerKind::ResourcePath => self.resource_path.as_deref(),
            MarkerKind::Provider => None,
            MarkerKind::SocketEndpoint => self.socket_path.as_deref(),
        }
    }

    /// Does the class implement the raw-handler capability?
    pub fn is_raw_handler(&self) -> bool {
        matches!(self.factory, EndpointFactory::Raw(_))
    }

    /// The class's instance factory
    pub fn factory(&self) -> &EndpointFactory {
        &self.factory
    }

    /// Construct a raw handler instance
    pub fn construct_raw(&self) -> Result<Arc<dyn RawHandler>> {
        match &self.factory {
            EndpointFactory::Raw(f) => f().map_err(|e| {
                HostError::Assembly(format!("failed to construct raw handler {}: {}", self.name, e))
            }),
            _ => Err(HostError::Assembly(format!(
                "{} has no raw handler constructor",
                self.name
            ))),
        }
    }

    /// Construct a socket endpoint instance via bare no-argument construction
    pub fn construct_socket(&self) -> Result<Arc<dyn SocketEndpoint>> {
        match &self.factory {
            EndpointFactory::Socket(f) => f().map_err(|e| {
                HostError::Assembly(format!(
                    "failed to construct socket endpoint {}: {}",
                    self.name, e
                ))
            }),
            _ => Err(HostError::Assembly(format!(
                "{} has no socket endpoint constructor",
                self.name
            ))),
        }
    }
}

/// Builder for [`EndpointClass`]
#[derive(Debug)]
pub struct EndpointClassBuilder {
    name: String,
    resource_path: Option<String>,
    provider: bool,
    socket_path: Option<String>,
    factory: EndpointFactory,
}

impl EndpointClassBuilder {
    /// Declare a resource path marker with the given path pattern
    pub fn resource_path(mut self, path: impl Into<String>) -> Self {
        self.resource_path = Some(path.into());
        self
    }

    /// Declare the provider marker
    pub fn provider(mut self) -> Self {
        self.provider = true;
        self
    }

    /// Declare a socket endpoint marker with the given mount path
    pub fn socket_endpoint(mut self, path: impl Into<String>) -> Self {
        self.socket_path = Some(path.into());
        self
    }

    /// Set a resource constructor
    pub fn resource_factory<F>(mut self, f: F) -> Self
    where
        F: Fn() -> Result<Arc<dyn Resource>> + Send + Sync + 'static,
    {
        self.factory = EndpointFactory::Resource(Arc::new(f));
        self
    }

    /// Set a provider constructor
    pub fn provider_factory<F>(mut self, f: F) -> Self
    where
        F: Fn() -> Result<Arc<dyn Provider>> + Send + Sync + 'static,
    {
        self.factory = EndpointFactory::Provider(Arc::new(f));
        self
    }

    /// Set a raw handler constructor (grants the raw-handler capability)
    pub fn raw_factory<F>(mut self, f: F) -> Self
    where
        F: Fn() -> Result<Arc<dyn RawHandler>> + Send + Sync + 'static,
    {
        self.factory = EndpointFactory::Raw(Arc::new(f));
        self
    }

    /// Set a socket endpoint constructor
    pub fn socket_factory<F>(mut self, f: F) -> Self
    where
        F: Fn() -> Result<Arc<dyn SocketEndpoint>> + Send + Sync + 'static,
    {
        self.factory = EndpointFactory::Socket(Arc::new(f));
        self
    }

    /// Finish building the handle
    pub fn build(self) -> Arc<EndpointClass> {
        Arc::new(EndpointClass {
            name: self.name,
            resource_path: self.resource_path,
            provider: self.provider,
            socket_path: self.socket_path,
            factory: self.factory,
        })
    }
}
