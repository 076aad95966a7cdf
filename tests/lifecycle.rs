//! Lifecycle tests
//!
//! Exercises the start/stop state machine against real sockets.

use std::net::TcpListener;
use webhost_rs::{Config, HostError, ServerBuilder, ServerState};

fn free_port() -> u16 {
    TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port()
}

fn test_config(port: u16) -> Config {
    let mut config = Config::default();
    config.server.host = "127.0.0.1".to_string();
    config.server.port = port;
    config.server.workers = Some(1);
    config
}

#[tokio::test]
async fn start_then_stop_returns_to_stopped() {
    let mut server = ServerBuilder::new()
        .with_config(test_config(free_port()))
        .build();
    assert_eq!(server.state(), ServerState::Stopped);

    server.start().await.unwrap();
    assert_eq!(server.state(), ServerState::Running);

    // The connector is actually listening.
    let addr = format!("127.0.0.1:{}", server.port());
    tokio::net::TcpStream::connect(&addr).await.unwrap();

    server.stop().await.unwrap();
    assert_eq!(server.state(), ServerState::Stopped);
}

#[tokio::test]
async fn restart_after_stop_is_allowed() {
    let mut server = ServerBuilder::new()
        .with_config(test_config(free_port()))
        .build();

    server.start().await.unwrap();
    server.stop().await.unwrap();

    server.start().await.unwrap();
    assert_eq!(server.state(), ServerState::Running);
    server.stop().await.unwrap();
}

#[tokio::test]
async fn port_override_applies_before_start() {
    let mut server = ServerBuilder::new()
        .with_config(test_config(free_port()))
        .build();

    let port = free_port();
    server.set_port(port);
    server.start().await.unwrap();

    assert_eq!(server.port(), port);
    tokio::net::TcpStream::connect(format!("127.0.0.1:{port}"))
        .await
        .unwrap();

    server.stop().await.unwrap();
}

#[tokio::test]
async fn double_start_is_rejected() {
    let mut server = ServerBuilder::new()
        .with_config(test_config(free_port()))
        .build();

    server.start().await.unwrap();

    let err = server.start().await.unwrap_err();
    assert!(matches!(err, HostError::Lifecycle(_)));
    // The first activation is untouched.
    assert_eq!(server.state(), ServerState::Running);

    server.stop().await.unwrap();
}

#[tokio::test]
async fn stop_without_start_is_rejected() {
    let mut server = ServerBuilder::new()
        .with_config(test_config(free_port()))
        .build();

    let err = server.stop().await.unwrap_err();
    assert!(matches!(err, HostError::Lifecycle(_)));
    assert_eq!(server.state(), ServerState::Stopped);
}

#[tokio::test]
async fn bind_conflict_moves_server_to_failed() {
    // Hold the port so binding fails.
    let occupied = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = occupied.local_addr().unwrap().port();

    let mut server = ServerBuilder::new().with_config(test_config(port)).build();

    assert!(server.start().await.is_err());
    assert_eq!(server.state(), ServerState::Failed);

    // Failed is terminal; a retry is rejected up front.
    let err = server.start().await.unwrap_err();
    assert!(matches!(err, HostError::Lifecycle(_)));
}
