use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode};
use speedtest_exporter::application::exporter::Exporter;
use speedtest_exporter::config::SpeedtestEnvConfig;
use speedtest_exporter::domain::target::TargetSet;
use speedtest_exporter::infrastructure::{MockResponse, MockSpeedtestRunner};
use speedtest_exporter::interfaces::http;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};
use tower::ServiceExt;

fn exporter(runner: &MockSpeedtestRunner, ttl: u64, targets: TargetSet) -> Arc<Exporter> {
    let config = SpeedtestEnvConfig {
        cache_ttl: Duration::from_secs(ttl),
        targets,
        ..SpeedtestEnvConfig::default()
    };
    Arc::new(Exporter::build(&config, Arc::new(runner.clone())).unwrap())
}

async fn get(exporter: &Arc<Exporter>, uri: &str) -> (StatusCode, String) {
    let response = http::router(exporter.clone())
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, String::from_utf8(body.to_vec()).unwrap())
}

#[tokio::test]
async fn test_scrape_publishes_each_target_independently() {
    let runner = MockSpeedtestRunner::new();
    runner.respond(Some(1), MockResponse::TimedOut);
    runner.respond(Some(2), MockResponse::result(2, 18.5, 12_500_000, 2_500_000));
    let exporter = exporter(&runner, 0, TargetSet::Servers(vec![1, 2]));

    let (status, body) = get(&exporter, "/metrics").await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains(r#"speedtest_up{server_id="1"} 0"#));
    assert!(body.contains(r#"speedtest_download_bits_per_second{server_id="1"} 0"#));
    assert!(body.contains(r#"speedtest_up{server_id="2"} 1"#));
    assert!(body.contains(r#"speedtest_ping_latency_milliseconds{server_id="2"} 18.5"#));
    assert!(body.contains(r#"speedtest_download_bits_per_second{server_id="2"} 100000000"#));
    assert!(body.contains(r#"speedtest_upload_bits_per_second{server_id="2"} 20000000"#));
}

#[tokio::test]
async fn test_zero_ttl_measures_on_every_scrape() {
    let runner = MockSpeedtestRunner::new();
    let exporter = exporter(&runner, 0, TargetSet::Auto);

    get(&exporter, "/metrics").await;
    get(&exporter, "/metrics").await;

    assert_eq!(runner.calls(), 2);
}

#[tokio::test]
async fn test_cache_reuses_snapshot() {
    let runner = MockSpeedtestRunner::new();
    runner.respond(Some(9), MockResponse::result(9, 4.0, 1_000_000, 1_000_000));
    let exporter = exporter(&runner, 3600, TargetSet::Servers(vec![9]));

    let (_, first) = get(&exporter, "/metrics").await;
    runner.respond(Some(9), MockResponse::TimedOut);
    let (_, second) = get(&exporter, "/metrics").await;

    assert_eq!(runner.calls(), 1);
    assert_eq!(first, second);
    assert!(second.contains(r#"speedtest_up{server_id="9"} 1"#));
}

#[tokio::test]
async fn test_concurrent_scrapes_run_tool_once() {
    let runner = MockSpeedtestRunner::new().with_delay(Duration::from_millis(200));
    let exporter = exporter(&runner, 0, TargetSet::Servers(vec![3]));

    let (a, b, c) = tokio::join!(
        get(&exporter, "/metrics"),
        get(&exporter, "/metrics"),
        get(&exporter, "/metrics")
    );

    assert_eq!(runner.max_overlap(), 1);
    assert_eq!(runner.calls(), 1);
    for (status, _) in [a, b, c] {
        assert_eq!(status, StatusCode::OK);
    }
}

#[tokio::test]
async fn test_index_page_links_metrics() {
    let runner = MockSpeedtestRunner::new();
    let exporter = exporter(&runner, 0, TargetSet::Auto);

    let (status, body) = get(&exporter, "/").await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("/metrics"));
    assert_eq!(runner.calls(), 0);
}

#[tokio::test]
async fn test_client_disconnect_does_not_cancel_measurement() {
    let runner = MockSpeedtestRunner::new().with_delay(Duration::from_millis(300));
    runner.respond(Some(1), MockResponse::result(1, 7.0, 1_000_000, 250_000));
    runner.respond(Some(2), MockResponse::result(2, 9.0, 3_000_000, 750_000));
    let exporter = exporter(&runner, 3600, TargetSet::Servers(vec![1, 2]));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let router = http::router(exporter.clone());
    let server = tokio::spawn(async move { axum::serve(listener, router).await });

    let mut client = TcpStream::connect(addr).await.unwrap();
    client
        .write_all(b"GET /metrics HTTP/1.1\r\nHost: localhost\r\n\r\n")
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;
    drop(client);

    tokio::time::sleep(Duration::from_millis(1500)).await;

    assert_eq!(runner.calls(), 2);
    let body = exporter.render();
    assert!(body.contains(r#"speedtest_up{server_id="1"} 1"#));
    assert!(body.contains(r#"speedtest_up{server_id="2"} 1"#));

    server.abort();
}
