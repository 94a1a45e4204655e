//! End-to-end test over a real TCP listener.

use std::time::Duration;

use tokio::net::TcpListener;

use site_server::lifecycle::Shutdown;
use site_server::models::ModelCatalog;

mod common;

use common::SiteFixture;

#[tokio::test]
async fn test_serves_pages_over_tcp_and_shuts_down() {
    let site = SiteFixture::new();
    site.module("shop", "/shop/").view("/index", "welcome");
    let built = site.build(ModelCatalog::with_builtins()).await;

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let handle = tokio::spawn(built.server.run(listener, shutdown.subscribe()));

    let client = reqwest::Client::new();
    let response = client
        .get(format!("http://{}/shop/", addr))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), reqwest::StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));
    assert_eq!(response.text().await.unwrap(), "welcome");

    drop(client);
    shutdown.trigger();
    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("server did not stop")
        .unwrap()
        .unwrap();
}
