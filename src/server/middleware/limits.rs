//! Header size limit middleware
//!
//! Enforces the optional request/response header caps carried by a connector.
//! A cap that was never set costs nothing: the check is skipped entirely and
//! the engine defaults apply.

use crate::server::connector::HttpTuning;
use crate::utils::error::HostError;
use actix_web::dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready};
use actix_web::http::header::HeaderMap;
use futures::future::{Ready, ready};
use std::future::Future;
use std::pin::Pin;
use tracing::{error, warn};

/// Header size limit middleware for Actix-web
pub struct HeaderLimits {
    tuning: HttpTuning,
}

impl HeaderLimits {
    /// Create the middleware from a connector's tuning overrides
    pub fn new(tuning: HttpTuning) -> Self {
        Self { tuning }
    }
}

impl<S, B> Transform<S, ServiceRequest> for HeaderLimits
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = actix_web::Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = actix_web::Error;
    type InitError = ();
    type Transform = HeaderLimitsService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(HeaderLimitsService {
            service,
            tuning: self.tuning,
        }))
    }
}

/// Service implementation for header size limits
pub struct HeaderLimitsService<S> {
    service: S,
    tuning: HttpTuning,
}

impl<S, B> Service<ServiceRequest> for HeaderLimitsService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = actix_web::Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = actix_web::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        if let Some(limit) = self.tuning.request_header_size {
            let size = header_bytes(req.headers());
            if size > limit {
                warn!(size, limit, path = req.path(), "rejecting oversized request headers");
                return Box::pin(ready(Err(
                    HostError::RequestHeadersTooLarge { size, limit }.into()
                )));
            }
        }

        let response_limit = self.tuning.response_header_size;
        let fut = self.service.call(req);
        Box::pin(async move {
            let res = fut.await?;

            if let Some(limit) = response_limit {
                let size = header_bytes(res.headers());
                if size > limit {
                    error!(size, limit, "response headers exceed configured limit");
                    return Err(HostError::ResponseHeadersTooLarge { size, limit }.into());
                }
            }

            Ok(res)
        })
    }
}

fn header_bytes(headers: &HeaderMap) -> usize {
    headers
        .iter()
        .map(|(name, value)| name.as_str().len() + value.len() + 4)
        .sum()
}
