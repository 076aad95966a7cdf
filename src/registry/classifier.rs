//! Endpoint classification
//!
//! Partitions the discovered-class pool into serving roles. Classification is
//! a pure function of the pool: one pass, order independent, no side effects.

use crate::registry::class::{EndpointClass, MarkerKind};
use std::sync::Arc;
use tracing::debug;

/// The partition of a discovered-class pool into serving roles
#[derive(Debug, Default)]
pub struct Classification {
    /// Classes served through resource dispatch (resources and providers)
    ///
    /// Raw-handler classes with a resource path appear here too so they
    /// participate in resource discovery.
    pub resources: Vec<Arc<EndpointClass>>,
    /// Classes bound directly to the HTTP engine at their declared paths
    pub raw_handlers: Vec<Arc<EndpointClass>>,
    /// Classes registered with the socket upgrade layer
    pub sockets: Vec<Arc<EndpointClass>>,
}

/// Classify a pool of discovered classes into serving roles
///
/// Marker precedence: the socket-endpoint marker wins outright; a class that
/// carries it lands only in the socket set, whatever else it declares. Classes
/// matching no rule are ignored, which is not an error.
pub fn classify(pool: &[Arc<EndpointClass>]) -> Classification {
    let mut result = Classification::default();

    for class in pool {
        if class.has_marker(MarkerKind::SocketEndpoint) {
            result.sockets.push(class.clone());
            continue;
        }

        let has_path = class.has_marker(MarkerKind::ResourcePath);
        let is_provider = class.has_marker(MarkerKind::Provider);

        if (has_path || is_provider) && !class.is_raw_handler() {
            result.resources.push(class.clone());
        } else if has_path && class.is_raw_handler() {
            // Registered as a path-bound handler, and also into the resource
            // set for discovery.
            result.raw_handlers.push(class.clone());
            result.resources.push(class.clone());
        } else {
            debug!(class = class.name(), "class matched no serving role, ignoring");
        }
    }

    result
}
