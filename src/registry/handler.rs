//! Application-facing handler traits
//!
//! These are the seams between the host and the embedding application: REST
//! resources and providers, raw handlers bound straight to the HTTP engine,
//! and full-duplex socket endpoints.

use crate::utils::error::Result;
use actix_web::{HttpRequest, HttpResponse, web::Bytes};
use actix_ws::{CloseReason, Message, Session};
use async_trait::async_trait;

/// A REST-style resource serving requests under its declared path
#[async_trait(?Send)]
pub trait Resource: Send + Sync {
    /// Handle a request dispatched to this resource
    async fn handle(&self, req: HttpRequest, body: Bytes) -> Result<HttpResponse>;
}

/// A cross-cutting request filter participating in resource dispatch
///
/// Providers run before any resource is matched. Returning a response
/// short-circuits dispatch; returning `None` lets the request continue.
#[async_trait(?Send)]
pub trait Provider: Send + Sync {
    /// Inspect a request before resource dispatch
    async fn filter(&self, req: &HttpRequest) -> Option<HttpResponse>;
}

/// A handler bound directly to the HTTP engine at its declared path
///
/// Raw handlers bypass resource dispatch entirely; they receive the request
/// and aggregated body and must produce a response themselves.
#[async_trait(?Send)]
pub trait RawHandler: Send + Sync {
    /// Handle a request mounted at this handler's literal path
    async fn handle(&self, req: HttpRequest, body: Bytes) -> HttpResponse;
}

/// A full-duplex socket endpoint mounted at its declared path
///
/// Instances are created lazily at connection-upgrade time and owned by the
/// socket layer's connection-scoped lifecycle afterwards.
#[async_trait]
pub trait SocketEndpoint: Send + Sync {
    /// Called once after the connection upgrade completes
    async fn on_open(&self, _session: &mut Session) {}

    /// Called for every incoming frame (pings are answered by the host)
    async fn on_message(&self, session: &mut Session, msg: Message);

    /// Called when the peer closes the connection or the stream ends
    async fn on_close(&self, _reason: Option<CloseReason>) {}
}
