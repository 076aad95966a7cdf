//! Container instance resolution
//!
//! The embedding application's DI container supplies managed instances through
//! [`InstanceResolver`]. The host only consults it; it never constructs
//! container state itself.

use crate::registry::class::EndpointClass;
use crate::registry::handler::SocketEndpoint;
use std::sync::Arc;

/// External instance lookup supplied by the container collaborator
pub trait InstanceResolver: Send + Sync {
    /// Return an existing managed socket-endpoint instance for the class, or
    /// `None` when the container has none.
    fn resolve_socket(&self, class: &EndpointClass) -> Option<Arc<dyn SocketEndpoint>>;
}

/// A resolver that never supplies instances
///
/// Embedders without a container use this; every endpoint then falls back to
/// bare no-argument construction.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullResolver;

impl InstanceResolver for NullResolver {
    fn resolve_socket(&self, _class: &EndpointClass) -> Option<Arc<dyn SocketEndpoint>> {
        None
    }
}
