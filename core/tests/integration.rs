//! Full pipeline against real sockets.
//!
//! # Design
//! Starts the mock weather server (or a raw canned responder) on a random
//! port in a background tokio runtime, then drives the blocking core client
//! over real TCP. Covers the happy path plus every failure kind that a live
//! server can produce.

use std::net::SocketAddr;
use std::time::Duration;

use weather_core::{
    ClientConfig, ConnectError, DecodeError, ErrorKind, JsonLinesReporter, Orchestrator,
    RequestError, TcpConnector, TransportConfig, WeatherRecord,
};

/// Bind a random port and serve it with `serve` on a background thread.
fn spawn_server<F, Fut>(serve: F) -> SocketAddr
where
    F: FnOnce(tokio::net::TcpListener) -> Fut + Send + 'static,
    Fut: std::future::Future<Output = Result<(), std::io::Error>>,
{
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            serve(listener).await
        })
        .unwrap();
    });

    addr
}

fn mock_server() -> SocketAddr {
    spawn_server(mock_server::run)
}

fn raw_server(response: &[u8]) -> SocketAddr {
    let response = response.to_vec();
    spawn_server(move |listener| mock_server::serve_raw(listener, response))
}

fn config(addr: SocketAddr, locations: &[&str]) -> ClientConfig {
    ClientConfig {
        host: addr.ip().to_string(),
        port: addr.port(),
        api_key: "TEST_KEY".to_string(),
        locations: locations.iter().map(|l| l.to_string()).collect(),
        interval: Duration::ZERO,
        transport: TransportConfig {
            connect_timeout: Duration::from_secs(2),
            read_timeout: Some(Duration::from_secs(2)),
            write_timeout: Some(Duration::from_secs(2)),
        },
        ..ClientConfig::default()
    }
}

fn orchestrator(config: ClientConfig) -> Orchestrator<TcpConnector, JsonLinesReporter<Vec<u8>>> {
    let connector = TcpConnector::new(config.transport.clone());
    Orchestrator::new(config, connector, JsonLinesReporter::new(Vec::new()))
}

#[test]
fn chongqing_end_to_end() {
    let addr = mock_server();
    let client = orchestrator(config(addr, &["chongqing"]));

    let record = client.fetch("chongqing").unwrap();
    assert_eq!(
        record,
        WeatherRecord {
            location_id: "C23NB62W20TF".to_string(),
            condition_text: "多云".to_string(),
            condition_code: 4,
            last_update: "2015-09-25T22:45:00-07:00".to_string(),
        }
    );
}

#[test]
fn polling_cycle_reports_each_location() {
    let addr = mock_server();
    let mut client = orchestrator(config(addr, &["chongqing", "chengdu", "atlantis"]));

    client.run(Some(1));

    let (_, reporter) = client.into_parts();
    let out = String::from_utf8(reporter.into_inner()).unwrap();
    let lines: Vec<serde_json::Value> = out.lines().map(|l| serde_json::from_str(l).unwrap()).collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0]["record"]["locationId"], "C23NB62W20TF");
    assert_eq!(lines[1]["record"]["locationId"], "WM6N2PM3WY2K");
    assert_eq!(lines[1]["record"]["conditionCode"], 9);
    // 404 bodies are decoded like any other and fail on the missing results array.
    assert_eq!(lines[2]["location"], "atlantis");
    assert_eq!(lines[2]["error"]["kind"], "schema_mismatch");
}

#[test]
fn missing_key_body_is_schema_mismatch() {
    let addr = mock_server();
    let mut config = config(addr, &["chongqing"]);
    config.api_key = String::new();
    let client = orchestrator(config);

    let err = client.fetch("chongqing").unwrap_err();
    assert!(matches!(err, RequestError::Decode(DecodeError::SchemaMismatch("results"))));
}

#[test]
fn response_without_separator_is_framing_error() {
    let addr = raw_server(b"HTTP/1.1 200 OK\r\nContent-Type: application/json\r\n");
    let client = orchestrator(config(addr, &["chongqing"]));

    let err = client.fetch("chongqing").unwrap_err();
    assert!(matches!(err, RequestError::Framing));
}

#[test]
fn oversized_body_is_capacity_exceeded() {
    let long_id = "Z".repeat(1024);
    let response = format!(
        "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\n\r\n\
         {{\"results\":[{{\"location\":{{\"id\":\"{long_id}\"}},\"now\":{{\"text\":\"x\",\"code\":\"1\"}},\"last_update\":\"t\"}}]}}"
    );
    let addr = raw_server(response.as_bytes());
    let client = orchestrator(config(addr, &["chongqing"]));

    let err = client.fetch("chongqing").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::CapacityExceeded);
}

#[test]
fn non_json_body_is_malformed() {
    let addr = raw_server(b"HTTP/1.1 502 Bad Gateway\r\nContent-Type: text/html\r\n\r\n<html>bad gateway</html>");
    let client = orchestrator(config(addr, &["chongqing"]));

    let err = client.fetch("chongqing").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Malformed);
}

#[test]
fn refused_connection_is_connect_error() {
    // Bind then drop to get a port that is very likely closed.
    let addr = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap()
    };
    let client = orchestrator(config(addr, &["chongqing"]));

    let err = client.fetch("chongqing").unwrap_err();
    assert!(matches!(err, RequestError::Connect(ConnectError::Connect { .. })));
}

#[test]
fn consecutive_requests_use_fresh_connections() {
    let addr = mock_server();
    let client = orchestrator(config(addr, &["chongqing"]));

    // Each request sends `Connection: close`; a reused socket would fail the second decode.
    for _ in 0..3 {
        assert_eq!(client.fetch("chengdu").unwrap().location_id, "WM6N2PM3WY2K");
    }
}
