// Test helpers are intentionally partially used
#![allow(dead_code)]

use reqwest::Client;
use std::path::PathBuf;
use std::time::Duration;
use todo_server::{create_app, App, AppConfig, MetricsConfig, SamplerHandle, ServerConfig};
use tokio::net::TcpListener;
use tokio::time::sleep;

// ============================================================================
// Test Setup
// ============================================================================

/// Configuration pointing at the repository's `public/` directory, with a
/// fast sampling interval so default metrics are populated quickly.
pub fn test_config() -> AppConfig {
    // ---
    AppConfig {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            static_dir: PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("public"),
        },
        metrics: MetricsConfig {
            prefix: "todo_".to_string(),
            sampling_timeout: Duration::from_secs(1),
            sampling_interval: Duration::from_millis(200),
        },
    }
}

pub struct TestServer {
    pub addr: std::net::SocketAddr,
    pub client: Client,
    sampler: Option<SamplerHandle>,
}

impl TestServer {
    // ---
    pub async fn new() -> Self {
        // --
        if std::env::var("TEST_DEBUG").is_ok() {
            std::env::set_var("RUST_LOG", "debug");
        }
        todo_server::init_tracing();

        let App { router, sampler } =
            create_app(&test_config()).expect("Should be able to create app");
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        // Spawn the server in the background
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        // Give the server a moment to start
        sleep(Duration::from_millis(100)).await;

        let client = Client::new();

        Self {
            addr,
            client,
            sampler: Some(sampler),
        }
    }

    pub fn url(&self, path: &str) -> String {
        // ---
        format!("http://{}{}", self.addr, path)
    }

    /// Fetches `/metrics` after giving in-flight observations a moment to land.
    ///
    /// Observations are recorded when the server finishes the response body,
    /// which can trail the client reading the last byte.
    pub async fn scrape(&self) -> String {
        // ---
        sleep(Duration::from_millis(50)).await;

        let res = self.client.get(self.url("/metrics")).send().await.unwrap();
        assert!(res.status().is_success(), "scrape failed: {}", res.status());
        res.text().await.unwrap()
    }

    pub async fn shutdown(mut self) {
        // ---
        if let Some(sampler) = self.sampler.take() {
            sampler.stop().await;
        }
    }
}

/// Value of the sample line for `series` (name plus label set), if present.
pub fn sample_value(metrics: &str, series: &str) -> Option<f64> {
    // ---
    metrics
        .lines()
        .filter(|line| !line.starts_with('#'))
        .find_map(|line| line.strip_prefix(series))
        .and_then(|rest| rest.strip_prefix(' '))
        .and_then(|value| value.parse().ok())
}
