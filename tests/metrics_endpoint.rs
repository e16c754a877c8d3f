use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

mod common;

use common::sample_value;

// Every server gets its own registry, so these tests run in parallel.

const ROOT_OK: &str = r#"todo_http_requests_total{method="GET",path="/",status="200"}"#;
const MISSING: &str = r#"todo_http_requests_total{method="GET",path="/missing",status="404"}"#;

#[tokio::test]
async fn root_request_appears_in_scrape() {
    // ---
    let server = common::TestServer::new().await;

    let res = server.client.get(server.url("/")).send().await.unwrap();
    assert_eq!(res.status(), 200);
    res.text().await.unwrap();

    let body = server.scrape().await;
    assert_eq!(sample_value(&body, ROOT_OK), Some(1.0), "metrics:\n{body}");

    server.shutdown().await;
}

#[tokio::test]
async fn static_assets_are_counted() {
    // ---
    let server = common::TestServer::new().await;

    for asset in ["/style.css", "/app.js"] {
        let res = server.client.get(server.url(asset)).send().await.unwrap();
        assert_eq!(res.status(), 200);
        res.bytes().await.unwrap();
    }

    let body = server.scrape().await;
    for asset in ["/style.css", "/app.js"] {
        let series = format!(r#"todo_http_requests_total{{method="GET",path="{asset}",status="200"}}"#);
        assert_eq!(sample_value(&body, &series), Some(1.0), "metrics:\n{body}");
    }

    server.shutdown().await;
}

#[tokio::test]
async fn head_requests_are_counted() {
    // ---
    let server = common::TestServer::new().await;

    let res = server.client.head(server.url("/health")).send().await.unwrap();
    assert_eq!(res.status(), 200);

    let body = server.scrape().await;
    let series = r#"todo_http_requests_total{method="HEAD",path="/health",status="200"}"#;
    assert_eq!(sample_value(&body, series), Some(1.0), "metrics:\n{body}");

    server.shutdown().await;
}

#[tokio::test]
async fn missing_pages_are_counted_by_status() {
    // ---
    let server = common::TestServer::new().await;

    for _ in 0..3 {
        let res = server.client.get(server.url("/missing")).send().await.unwrap();
        assert_eq!(res.status(), 404);
        res.bytes().await.unwrap();
    }

    let body = server.scrape().await;
    assert_eq!(sample_value(&body, MISSING), Some(3.0), "metrics:\n{body}");

    let count = r#"todo_http_request_duration_seconds_count{method="GET",path="/missing",status="404"}"#;
    let inf = r#"todo_http_request_duration_seconds_bucket{method="GET",path="/missing",status="404",le="+Inf"}"#;
    assert_eq!(sample_value(&body, count), Some(3.0));
    assert_eq!(sample_value(&body, inf), Some(3.0));

    server.shutdown().await;
}

#[tokio::test]
async fn query_string_does_not_split_series() {
    // ---
    let server = common::TestServer::new().await;

    for query in ["", "?a=1", "?b=2"] {
        let res = server
            .client
            .get(server.url(&format!("/{query}")))
            .send()
            .await
            .unwrap();
        res.bytes().await.unwrap();
    }

    let body = server.scrape().await;
    assert_eq!(sample_value(&body, ROOT_OK), Some(3.0), "metrics:\n{body}");

    server.shutdown().await;
}

#[tokio::test]
async fn concurrent_requests_are_all_counted() {
    // ---
    const CALLERS: usize = 25;
    let server = Arc::new(common::TestServer::new().await);

    let futures = (0..CALLERS).map(|_| {
        let server = Arc::clone(&server);
        async move {
            let res = server.client.get(server.url("/")).send().await?;
            res.bytes().await
        }
    });

    for result in futures::future::join_all(futures).await {
        result.expect("request should succeed");
    }

    let body = server.scrape().await;
    assert_eq!(sample_value(&body, ROOT_OK), Some(CALLERS as f64), "metrics:\n{body}");
}

#[tokio::test]
async fn metrics_content_type_is_correct() {
    // ---
    let server = common::TestServer::new().await;

    let res = server
        .client
        .get(server.url("/metrics"))
        .send()
        .await
        .unwrap();
    assert!(res.status().is_success());

    let content_type = res.headers()["content-type"].to_str().unwrap().to_string();
    assert_eq!(content_type, "text/plain; version=0.0.4");

    server.shutdown().await;
}

#[tokio::test]
async fn default_process_metrics_are_exposed() {
    // ---
    let server = common::TestServer::new().await;

    // Let the sampler run at least one tick past the initial one.
    sleep(Duration::from_millis(300)).await;

    let body = server.scrape().await;
    for name in [
        "todo_process_start_time_seconds",
        "todo_process_uptime_seconds",
        "todo_process_resident_memory_bytes",
        "todo_process_open_fds",
    ] {
        assert!(body.contains(&format!("# TYPE {name} gauge")), "missing {name}");
    }
    for name in [
        "todo_process_cpu_user_seconds_total",
        "todo_process_cpu_system_seconds_total",
        "todo_process_cpu_seconds_total",
    ] {
        assert!(body.contains(&format!("# TYPE {name} counter")), "missing {name}");
    }
    assert!(sample_value(&body, "todo_process_uptime_seconds").unwrap() > 0.0);

    server.shutdown().await;
}

#[tokio::test]
async fn repeated_scrapes_differ_only_in_scrape_count_and_gauges() {
    // ---
    let server = common::TestServer::new().await;
    let res = server.client.get(server.url("/")).send().await.unwrap();
    res.bytes().await.unwrap();

    let first = server.scrape().await;
    let second = server.scrape().await;

    let stable = |body: &str| -> Vec<String> {
        body.lines()
            .filter(|line| !line.contains("todo_process_"))
            .filter(|line| !line.contains(r#"path="/metrics""#))
            .map(str::to_string)
            .collect()
    };
    assert_eq!(stable(&first), stable(&second));

    server.shutdown().await;
}
