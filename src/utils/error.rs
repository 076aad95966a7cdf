//! Error handling for the host
//!
//! This module defines all error types used throughout the crate.

use actix_web::{HttpResponse, ResponseError};
use thiserror::Error;

/// Result type alias for the host
pub type Result<T> = std::result::Result<T, HostError>;

/// Main error type for the host
#[derive(Error, Debug)]
pub enum HostError {
    /// Configuration errors (bad connector options, malformed TLS material)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Assembly errors (a discovered class could not be turned into a bound
    /// handler or endpoint)
    #[error("Assembly error: {0}")]
    Assembly(String),

    /// Lifecycle errors (start/stop called from the wrong state)
    #[error("Lifecycle error: {0}")]
    Lifecycle(String),

    /// Endpoint instance resolution errors
    ///
    /// Uniform wrapper for any failure to produce a socket-endpoint instance,
    /// whether the container resolver or bare construction failed.
    #[error("Endpoint resolution error: {0}")]
    EndpointResolution(String),

    /// Underlying server start/stop errors
    #[error("Server error: {0}")]
    Server(String),

    /// TLS errors from the underlying engine
    #[error("TLS error: {0}")]
    Tls(#[from] rustls::Error),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Request headers exceeded the configured cap
    #[error("Request headers too large: {size} bytes exceeds limit of {limit}")]
    RequestHeadersTooLarge {
        /// Observed header size in bytes
        size: usize,
        /// Configured cap in bytes
        limit: usize,
    },

    /// Response headers exceeded the configured cap
    #[error("Response headers too large: {size} bytes exceeds limit of {limit}")]
    ResponseHeadersTooLarge {
        /// Observed header size in bytes
        size: usize,
        /// Configured cap in bytes
        limit: usize,
    },
}

impl ResponseError for HostError {
    fn status_code(&self) -> actix_web::http::StatusCode {
        match self {
            HostError::RequestHeadersTooLarge { .. } => {
                actix_web::http::StatusCode::REQUEST_HEADER_FIELDS_TOO_LARGE
            }
            _ => actix_web::http::StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let error_code = match self {
            HostError::Config(_) => "CONFIG_ERROR",
            HostError::Assembly(_) => "ASSEMBLY_ERROR",
            HostError::Lifecycle(_) => "LIFECYCLE_ERROR",
            HostError::EndpointResolution(_) => "ENDPOINT_RESOLUTION_ERROR",
            HostError::RequestHeadersTooLarge { .. } => "REQUEST_HEADERS_TOO_LARGE",
            HostError::ResponseHeadersTooLarge { .. } => "RESPONSE_HEADERS_TOO_LARGE",
            _ => "INTERNAL_ERROR",
        };

        HttpResponse::build(self.status_code()).json(serde_json::json!({
            "error": {
                "code": error_code,
                "message": self.to_string(),
            }
        }))
    }
}
