//! Handler chain assembly and dispatch
//!
//! The chain is an ordered composite of two branches under the server's
//! single context: the static-resource branch first, the application branch
//! second. Dispatch is first-match: a bundled static file shadows an
//! application handler mounted at the same path, and requests the static
//! branch cannot serve fall through to the application branch.

use crate::registry::classifier::Classification;
use crate::registry::class::{EndpointFactory, MarkerKind};
use crate::registry::handler::{Provider, RawHandler, Resource};
use crate::server::connector::HttpTuning;
use crate::server::sockets::SocketRegistration;
use crate::utils::error::{HostError, Result};
use actix_web::{
    HttpRequest, HttpResponse, http::Method,
    web::{self, Bytes, BytesMut},
};
use futures_util::StreamExt;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Root of the bundled static content tree, relative to the working directory
pub const STATIC_ROOT: &str = "web";

/// Welcome file served for directory requests
pub const WELCOME_FILE: &str = "index.html";

/// A servlet-style path pattern: exact, or a `/prefix/*` wildcard
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathPattern {
    /// Matches the path exactly
    Exact(String),
    /// Matches every path under the prefix
    Prefix(String),
}

impl PathPattern {
    /// Parse a declared path pattern, taken literally with no rewriting
    pub fn parse(pattern: &str) -> Self {
        match pattern.strip_suffix("/*") {
            Some(prefix) => PathPattern::Prefix(format!("{prefix}/")),
            None => PathPattern::Exact(pattern.to_string()),
        }
    }

    /// Does the pattern match a request path?
    pub fn matches(&self, path: &str) -> bool {
        match self {
            PathPattern::Exact(p) => path == p,
            PathPattern::Prefix(p) => path.starts_with(p.as_str()) || path == &p[..p.len() - 1],
        }
    }
}

/// The static-resource branch: a fixed content root with directory listing
#[derive(Debug, Clone)]
pub struct StaticBranch {
    root: PathBuf,
    welcome_file: &'static str,
    directory_listing: bool,
}

impl StaticBranch {
    fn new(root: PathBuf) -> Self {
        Self {
            root,
            welcome_file: WELCOME_FILE,
            directory_listing: true,
        }
    }

    /// Try to serve a request from the static tree
    ///
    /// Returns `Ok(None)` when the branch has nothing for the path, letting
    /// dispatch fall through to the application branch.
    async fn try_serve(&self, req: &HttpRequest) -> actix_web::Result<Option<HttpResponse>> {
        if req.method() != Method::GET && req.method() != Method::HEAD {
            return Ok(None);
        }

        let Some(rel) = sanitize_path(req.path()) else {
            return Ok(None);
        };
        let full = self.root.join(rel);

        let meta = match tokio::fs::metadata(&full).await {
            Ok(meta) => meta,
            Err(_) => return Ok(None),
        };

        if meta.is_dir() {
            let welcome = full.join(self.welcome_file);
            if tokio::fs::metadata(&welcome).await.is_ok() {
                return serve_file(req, &welcome).await.map(Some);
            }
            if self.directory_listing {
                return render_listing(req.path(), &full).await.map(Some);
            }
            return Ok(None);
        }

        serve_file(req, &full).await.map(Some)
    }
}

async fn serve_file(req: &HttpRequest, path: &Path) -> actix_web::Result<HttpResponse> {
    let file = actix_files::NamedFile::open_async(path).await?;
    Ok(file.into_response(req))
}

/// Strip a request path down to a safe relative filesystem path
fn sanitize_path(path: &str) -> Option<PathBuf> {
    let mut buf = PathBuf::new();
    for segment in path.split('/') {
        if segment.is_empty() || segment == "." {
            continue;
        }
        if segment == ".." || segment.contains('\\') || segment.contains('\0') {
            return None;
        }
        buf.push(segment);
    }
    Some(buf)
}

/// Render a directory listing for the static branch
async fn render_listing(request_path: &str, dir: &Path) -> actix_web::Result<HttpResponse> {
    let mut entries = Vec::new();
    let mut read_dir = tokio::fs::read_dir(dir).await.map_err(actix_web::Error::from)?;
    while let Some(entry) = read_dir.next_entry().await.map_err(actix_web::Error::from)? {
        let mut name = entry.file_name().to_string_lossy().into_owned();
        if entry.file_type().await.map(|t| t.is_dir()).unwrap_or(false) {
            name.push('/');
        }
        entries.push(name);
    }
    entries.sort_unstable();

    let base = request_path.trim_end_matches('/');
    let mut body = format!(
        "<!DOCTYPE html><html><head><title>Index of {0}/</title></head>\
         <body><h1>Index of {0}/</h1><ul>",
        base
    );
    for name in &entries {
        body.push_str(&format!("<li><a href=\"{base}/{name}\">{name}</a></li>"));
    }
    body.push_str("</ul></body></html>");

    Ok(HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(body))
}

struct RawMount {
    pattern: PathPattern,
    class_name: String,
    handler: std::sync::Arc<dyn RawHandler>,
}

struct ResourceMount {
    pattern: PathPattern,
    class_name: String,
    resource: std::sync::Arc<dyn Resource>,
}

/// The application branch: raw handlers, socket endpoints, and the umbrella
/// resource dispatcher, in fixed order
pub struct AppBranch {
    raw: Vec<RawMount>,
    sockets: Vec<SocketRegistration>,
    providers: Vec<(String, std::sync::Arc<dyn Provider>)>,
    resources: Vec<ResourceMount>,
    registered: Vec<String>,
    tuning: HttpTuning,
}

impl AppBranch {
    /// Class names registered into the resource set, including raw-handler
    /// dual members
    pub fn registered_classes(&self) -> &[String] {
        &self.registered
    }

    async fn dispatch(
        &self,
        req: HttpRequest,
        payload: web::Payload,
    ) -> actix_web::Result<HttpResponse> {
        let path = req.path().to_owned();

        // Socket upgrades are path-bound and need the raw payload.
        for registration in &self.sockets {
            if registration.path() == path {
                return registration.handle_upgrade(req, payload);
            }
        }

        for mount in &self.raw {
            if mount.pattern.matches(&path) {
                debug!(class = %mount.class_name, %path, "dispatching to raw handler");
                let body = collect_body(payload, self.tuning.output_buffer_size).await?;
                return Ok(mount.handler.handle(req, body).await);
            }
        }

        // Umbrella resource dispatch: providers filter first, then the first
        // resource whose declared pattern matches handles the request.
        for (name, provider) in &self.providers {
            if let Some(response) = provider.filter(&req).await {
                debug!(class = %name, %path, "provider short-circuited dispatch");
                return Ok(response);
            }
        }

        for mount in &self.resources {
            if mount.pattern.matches(&path) {
                debug!(class = %mount.class_name, %path, "dispatching to resource");
                let body = collect_body(payload, self.tuning.output_buffer_size).await?;
                return mount.resource.handle(req, body).await.map_err(Into::into);
            }
        }

        Ok(HttpResponse::NotFound().finish())
    }
}

async fn collect_body(
    mut payload: web::Payload,
    capacity_hint: Option<usize>,
) -> actix_web::Result<Bytes> {
    let mut buf = BytesMut::with_capacity(capacity_hint.unwrap_or(8192));
    while let Some(chunk) = payload.next().await {
        buf.extend_from_slice(&chunk?);
    }
    Ok(buf.freeze())
}

/// The ordered composite the server dispatches every request through
pub struct HandlerChain {
    static_branch: StaticBranch,
    app_branch: AppBranch,
}

impl HandlerChain {
    /// Assemble the chain from a classification result
    ///
    /// Raw handlers and resources are instantiated eagerly; a class that
    /// cannot be constructed is a fatal assembly error. Composite order is
    /// fixed here and never reordered at runtime.
    pub fn assemble(classification: &Classification, tuning: HttpTuning) -> Result<Self> {
        Self::assemble_with_root(classification, tuning, PathBuf::from(STATIC_ROOT))
    }

    pub(crate) fn assemble_with_root(
        classification: &Classification,
        tuning: HttpTuning,
        static_root: PathBuf,
    ) -> Result<Self> {
        let mut raw = Vec::new();
        for class in &classification.raw_handlers {
            let pattern = class
                .marker_value(MarkerKind::ResourcePath)
                .ok_or_else(|| {
                    HostError::Assembly(format!(
                        "raw handler {} declares no resource path",
                        class.name()
                    ))
                })?;
            let handler = class.construct_raw()?;
            info!(class = class.name(), path = pattern, "mounting raw handler");
            raw.push(RawMount {
                pattern: PathPattern::parse(pattern),
                class_name: class.name().to_string(),
                handler,
            });
        }

        let mut providers = Vec::new();
        let mut resources = Vec::new();
        let mut registered = Vec::new();
        for class in &classification.resources {
            registered.push(class.name().to_string());
            match class.factory() {
                EndpointFactory::Resource(factory) => {
                    let Some(pattern) = class.marker_value(MarkerKind::ResourcePath) else {
                        debug!(
                            class = class.name(),
                            "resource has no path marker, registered for discovery only"
                        );
                        continue;
                    };
                    let resource = factory().map_err(|e| {
                        HostError::Assembly(format!(
                            "failed to construct resource {}: {}",
                            class.name(),
                            e
                        ))
                    })?;
                    info!(class = class.name(), path = pattern, "mounting resource");
                    resources.push(ResourceMount {
                        pattern: PathPattern::parse(pattern),
                        class_name: class.name().to_string(),
                        resource,
                    });
                }
                EndpointFactory::Provider(factory) => {
                    let provider = factory().map_err(|e| {
                        HostError::Assembly(format!(
                            "failed to construct provider {}: {}",
                            class.name(),
                            e
                        ))
                    })?;
                    info!(class = class.name(), "registering provider");
                    providers.push((class.name().to_string(), provider));
                }
                // Raw-handler dual members are mounted by the raw branch;
                // here they only count as registered.
                _ => {}
            }
        }

        Ok(Self {
            static_branch: StaticBranch::new(static_root),
            app_branch: AppBranch {
                raw,
                sockets: Vec::new(),
                providers,
                resources,
                registered,
                tuning,
            },
        })
    }

    /// Mount the socket registrations produced by the registrar
    ///
    /// Called once during assembly, before the server starts serving.
    pub fn mount_sockets(&mut self, registrations: Vec<SocketRegistration>) {
        for registration in &registrations {
            info!(
                class = registration.class_name(),
                path = registration.path(),
                "mounting socket endpoint"
            );
        }
        self.app_branch.sockets = registrations;
    }

    /// The application branch
    pub fn app_branch(&self) -> &AppBranch {
        &self.app_branch
    }

    /// Dispatch a request through the chain: static branch first, then the
    /// application branch
    pub async fn dispatch(
        &self,
        req: HttpRequest,
        payload: web::Payload,
    ) -> actix_web::Result<HttpResponse> {
        if let Some(response) = self.static_branch.try_serve(&req).await? {
            return Ok(response);
        }
        self.app_branch.dispatch(req, payload).await
    }
}

/// Request entry point wiring the chain into the HTTP engine
pub async fn serve_request(
    chain: web::Data<HandlerChain>,
    req: HttpRequest,
    payload: web::Payload,
) -> actix_web::Result<HttpResponse> {
    chain.dispatch(req, payload).await
}
