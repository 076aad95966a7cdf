//! Socket endpoint registration and connection driving
//!
//! Registration only captures configuration: the class, its declared mount
//! path, and a lazy instance provider. No endpoint instance is constructed
//! until the first connection upgrade, so singleton-lifetime endpoints are
//! never built before the rest of the container's state is ready.

use crate::registry::class::{EndpointClass, MarkerKind};
use crate::registry::handler::SocketEndpoint;
use crate::registry::resolver::InstanceResolver;
use crate::utils::error::{HostError, Result};
use actix_web::{HttpRequest, HttpResponse, web};
use actix_ws::{Message, MessageStream, Session};
use futures_util::StreamExt;
use std::sync::Arc;
use tracing::{debug, error, info};

/// A configured socket endpoint awaiting its first connection
pub struct SocketRegistration {
    class: Arc<EndpointClass>,
    path: String,
    resolver: Arc<dyn InstanceResolver>,
}

impl SocketRegistration {
    /// Mount path declared by the socket-endpoint marker
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Name of the registered class
    pub fn class_name(&self) -> &str {
        self.class.name()
    }

    /// Produce an endpoint instance for a connection upgrade
    ///
    /// Asks the container resolver first and falls back to bare no-argument
    /// construction. Any failure of both is wrapped into the single uniform
    /// [`HostError::EndpointResolution`] kind.
    pub fn resolve_instance(&self) -> Result<Arc<dyn SocketEndpoint>> {
        if let Some(instance) = self.resolver.resolve_socket(&self.class) {
            debug!(class = self.class.name(), "resolved endpoint from container");
            return Ok(instance);
        }

        self.class.construct_socket().map_err(|e| {
            HostError::EndpointResolution(format!(
                "cannot produce instance of socket endpoint {}: {}",
                self.class.name(),
                e
            ))
        })
    }

    /// Handle a connection upgrade for this endpoint
    ///
    /// Instance resolution happens here, lazily; a resolution failure fails
    /// this one upgrade attempt and is never silently dropped.
    pub fn handle_upgrade(
        &self,
        req: HttpRequest,
        payload: web::Payload,
    ) -> actix_web::Result<HttpResponse> {
        let endpoint = self.resolve_instance().map_err(|e| {
            error!(
                class = self.class.name(),
                path = %self.path,
                error = %e,
                "socket endpoint upgrade failed"
            );
            actix_web::Error::from(e)
        })?;

        let (response, session, stream) = actix_ws::handle(&req, payload)?;
        debug!(class = self.class.name(), path = %self.path, "connection upgraded");
        actix_web::rt::spawn(drive_endpoint(endpoint, session, stream));

        Ok(response)
    }
}

/// Register every socket-endpoint class with the upgrade layer
///
/// Pure configuration: each registration binds (class, path) to a lazy
/// instance provider. A class whose marker carries no mount path is a fatal
/// assembly error.
pub fn register_endpoints(
    classes: &[Arc<EndpointClass>],
    resolver: Arc<dyn InstanceResolver>,
) -> Result<Vec<SocketRegistration>> {
    classes
        .iter()
        .map(|class| {
            let path = class
                .marker_value(MarkerKind::SocketEndpoint)
                .ok_or_else(|| {
                    HostError::Assembly(format!(
                        "socket endpoint {} declares no mount path",
                        class.name()
                    ))
                })?
                .to_owned();

            info!(class = class.name(), %path, "registering socket endpoint");
            Ok(SocketRegistration {
                class: class.clone(),
                path,
                resolver: resolver.clone(),
            })
        })
        .collect()
}

/// Drive a connected endpoint until the peer leaves or the stream ends
async fn drive_endpoint(
    endpoint: Arc<dyn SocketEndpoint>,
    mut session: Session,
    mut stream: MessageStream,
) {
    endpoint.on_open(&mut session).await;

    let mut close_reason = None;
    while let Some(Ok(msg)) = stream.next().await {
        match msg {
            Message::Ping(bytes) => {
                if session.pong(&bytes).await.is_err() {
                    break;
                }
            }
            Message::Close(reason) => {
                close_reason = reason;
                break;
            }
            other => endpoint.on_message(&mut session, other).await,
        }
    }

    endpoint.on_close(close_reason.clone()).await;
    let _ = session.close(close_reason).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::resolver::NullResolver;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    static CONSTRUCTED: AtomicUsize = AtomicUsize::new(0);

    impl std::fmt::Debug for dyn SocketEndpoint {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_str("dyn SocketEndpoint")
        }
    }

    impl std::fmt::Debug for SocketRegistration {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.debug_struct("SocketRegistration")
                .field("path", &self.path)
                .finish_non_exhaustive()
        }
    }

    struct Counting;

    #[async_trait]
    impl SocketEndpoint for Counting {
        async fn on_message(&self, _session: &mut Session, _msg: Message) {}
    }

    struct Managed;

    #[async_trait]
    impl SocketEndpoint for Managed {
        async fn on_message(&self, _session: &mut Session, _msg: Message) {}
    }

    struct ManagedResolver;

    impl InstanceResolver for ManagedResolver {
        fn resolve_socket(&self, class: &EndpointClass) -> Option<Arc<dyn SocketEndpoint>> {
            (class.name() == "Managed").then(|| Arc::new(Managed) as Arc<dyn SocketEndpoint>)
        }
    }

    fn counting_class() -> Arc<EndpointClass> {
        EndpointClass::builder("Counting")
            .socket_endpoint("/ws/counting")
            .socket_factory(|| {
                CONSTRUCTED.fetch_add(1, Ordering::SeqCst);
                Ok(Arc::new(Counting))
            })
            .build()
    }

    #[test]
    fn test_registration_is_lazy() {
        CONSTRUCTED.store(0, Ordering::SeqCst);
        let registrations =
            register_endpoints(&[counting_class()], Arc::new(NullResolver)).unwrap();

        assert_eq!(registrations.len(), 1);
        assert_eq!(registrations[0].path(), "/ws/counting");
        // Nothing constructed at registration time.
        assert_eq!(CONSTRUCTED.load(Ordering::SeqCst), 0);

        registrations[0].resolve_instance().unwrap();
        assert_eq!(CONSTRUCTED.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_resolver_takes_precedence_over_construction() {
        CONSTRUCTED.store(0, Ordering::SeqCst);
        let managed = EndpointClass::builder("Managed")
            .socket_endpoint("/ws/managed")
            .socket_factory(|| {
                CONSTRUCTED.fetch_add(1, Ordering::SeqCst);
                Ok(Arc::new(Counting))
            })
            .build();

        let registrations = register_endpoints(&[managed], Arc::new(ManagedResolver)).unwrap();
        registrations[0].resolve_instance().unwrap();
        // The container supplied the instance; bare construction never ran.
        assert_eq!(CONSTRUCTED.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_unresolvable_endpoint_fails_with_uniform_error() {
        // No managed instance and no usable constructor.
        let class = EndpointClass::builder("NoCtor")
            .socket_endpoint("/ws/noctor")
            .build();

        let registrations = register_endpoints(&[class], Arc::new(NullResolver)).unwrap();
        let err = registrations[0].resolve_instance().unwrap_err();
        assert!(matches!(err, HostError::EndpointResolution(_)));
    }

    #[test]
    fn test_missing_mount_path_is_fatal() {
        // A socket factory without the socket marker cannot be registered.
        let class = EndpointClass::builder("Pathless")
            .socket_factory(|| Ok(Arc::new(Counting)))
            .build();

        let err = register_endpoints(&[class], Arc::new(NullResolver)).unwrap_err();
        assert!(matches!(err, HostError::Assembly(_)));
    }
}
