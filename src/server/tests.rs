//! Tests for server module
//!
//! Dispatch-level tests for the assembled handler chain.

use crate::registry::class::EndpointClass;
use crate::registry::classifier::classify;
use crate::registry::handler::{Provider, RawHandler, Resource};
use crate::registry::resolver::NullResolver;
use crate::server::chain::{HandlerChain, serve_request};
use crate::server::connector::HttpTuning;
use crate::server::sockets::register_endpoints;
use crate::utils::error::Result;
use actix_web::dev::ServiceResponse;
use actix_web::{App, HttpRequest, HttpResponse, test, web, web::Bytes};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;

struct GreetingResource;

#[async_trait(?Send)]
impl Resource for GreetingResource {
    async fn handle(&self, _req: HttpRequest, _body: Bytes) -> Result<HttpResponse> {
        Ok(HttpResponse::Ok().body("greeting resource"))
    }
}

struct EchoServlet;

#[async_trait(?Send)]
impl RawHandler for EchoServlet {
    async fn handle(&self, _req: HttpRequest, body: Bytes) -> HttpResponse {
        HttpResponse::Ok().body(body)
    }
}

struct DenyFilter;

#[async_trait(?Send)]
impl Provider for DenyFilter {
    async fn filter(&self, req: &HttpRequest) -> Option<HttpResponse> {
        req.headers()
            .contains_key("x-deny")
            .then(|| HttpResponse::Forbidden().finish())
    }
}

fn pool() -> Vec<Arc<EndpointClass>> {
    vec![
        EndpointClass::builder("GreetingResource")
            .resource_path("/greet/*")
            .resource_factory(|| Ok(Arc::new(GreetingResource)))
            .build(),
        EndpointClass::builder("ShadowedResource")
            .resource_path("/index.html")
            .resource_factory(|| Ok(Arc::new(GreetingResource)))
            .build(),
        EndpointClass::builder("EchoServlet")
            .resource_path("/legacy/*")
            .raw_factory(|| Ok(Arc::new(EchoServlet)))
            .build(),
        EndpointClass::builder("DenyFilter")
            .provider()
            .provider_factory(|| Ok(Arc::new(DenyFilter)))
            .build(),
    ]
}

fn chain_with_root(static_root: PathBuf) -> HandlerChain {
    let classification = classify(&pool());
    let mut chain =
        HandlerChain::assemble_with_root(&classification, HttpTuning::default(), static_root)
            .unwrap();
    let registrations =
        register_endpoints(&classification.sockets, Arc::new(NullResolver)).unwrap();
    chain.mount_sockets(registrations);
    chain
}

async fn dispatch(static_root: &Path, req: test::TestRequest) -> ServiceResponse {
    let chain = web::Data::new(chain_with_root(static_root.to_path_buf()));
    let app = test::init_service(
        App::new()
            .app_data(chain)
            .default_service(web::route().to(serve_request)),
    )
    .await;
    test::call_service(&app, req.to_request()).await
}

fn static_fixture() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("index.html"), "<h1>bundled</h1>").unwrap();
    std::fs::create_dir(dir.path().join("assets")).unwrap();
    std::fs::write(dir.path().join("assets/app.css"), "body {}").unwrap();
    dir
}

#[actix_web::test]
async fn test_static_branch_shadows_application_paths() {
    let fixture = static_fixture();

    // /index.html exists in the static tree and as an application resource;
    // the static branch wins.
    let req = test::TestRequest::get().uri("/index.html");
    let res = dispatch(fixture.path(), req).await;
    assert!(res.status().is_success());
    let body = test::read_body(res).await;
    assert_eq!(&body[..], b"<h1>bundled</h1>");
}

#[actix_web::test]
async fn test_welcome_file_served_for_directory() {
    let fixture = static_fixture();

    let req = test::TestRequest::get().uri("/");
    let res = dispatch(fixture.path(), req).await;
    let body = test::read_body(res).await;
    assert_eq!(&body[..], b"<h1>bundled</h1>");
}

#[actix_web::test]
async fn test_directory_listing_enabled() {
    let fixture = static_fixture();

    let req = test::TestRequest::get().uri("/assets");
    let res = dispatch(fixture.path(), req).await;
    assert!(res.status().is_success());
    let body = test::read_body(res).await;
    let body = String::from_utf8(body.to_vec()).unwrap();
    assert!(body.contains("app.css"));
}

#[actix_web::test]
async fn test_unmatched_static_path_falls_through_to_resources() {
    let fixture = static_fixture();

    let req = test::TestRequest::get().uri("/greet/anyone");
    let res = dispatch(fixture.path(), req).await;
    let body = test::read_body(res).await;
    assert_eq!(&body[..], b"greeting resource");
}

#[actix_web::test]
async fn test_raw_handler_mounted_under_prefix() {
    let fixture = static_fixture();

    let req = test::TestRequest::post()
        .uri("/legacy/echo")
        .set_payload("ping");
    let res = dispatch(fixture.path(), req).await;
    let body = test::read_body(res).await;
    assert_eq!(&body[..], b"ping");
}

#[actix_web::test]
async fn test_provider_short_circuits_resource_dispatch() {
    let fixture = static_fixture();

    let req = test::TestRequest::get()
        .uri("/greet/anyone")
        .insert_header(("x-deny", "1"));
    let res = dispatch(fixture.path(), req).await;
    assert_eq!(res.status().as_u16(), 403);
}

#[actix_web::test]
async fn test_unmatched_path_is_not_found() {
    let fixture = static_fixture();

    let req = test::TestRequest::get().uri("/nothing/here");
    let res = dispatch(fixture.path(), req).await;
    assert_eq!(res.status().as_u16(), 404);
}

#[actix_web::test]
async fn test_registered_classes_include_raw_dual_members() {
    let fixture = static_fixture();
    let chain = chain_with_root(fixture.path().to_path_buf());

    let registered = chain.app_branch().registered_classes();
    assert!(registered.iter().any(|n| n == "EchoServlet"));
    assert!(registered.iter().any(|n| n == "GreetingResource"));
    assert!(registered.iter().any(|n| n == "DenyFilter"));
}

#[actix_web::test]
async fn test_server_builder_defaults() {
    let server = crate::server::builder::ServerBuilder::new().build();
    assert_eq!(server.state(), crate::server::server::ServerState::Stopped);
    assert_eq!(server.port(), 9090);
}
