use std::sync::Arc;

use pager_cache::{PageEvent, PageFetcher, PagedDataSource};
use pager_core::{FetchFailure, PagerConfig};
use pager_http::{HttpConfig, HttpFetcher, JsonPageDelegate};
use serde::Deserialize;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// Serve one canned HTTP response per accepted connection, returning the
/// request heads the server saw.
async fn serve(responses: Vec<String>) -> (String, tokio::task::JoinHandle<Vec<String>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        let mut seen = Vec::new();
        for response in responses {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 4096];
            let n = socket.read(&mut buf).await.unwrap();
            seen.push(String::from_utf8_lossy(&buf[..n]).into_owned());
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
        }
        seen
    });
    (format!("http://{}", addr), handle)
}

fn http_response(status: &str, extra_headers: &str, body: &str) -> String {
    format!(
        "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n{}\r\n{}",
        status,
        body.len(),
        extra_headers,
        body
    )
}

#[tokio::test]
async fn fetch_returns_status_headers_and_body() {
    let (base, server) = serve(vec![http_response(
        "200 OK",
        "X-Total-Count: 12\r\n",
        r#"[1,2,3]"#,
    )])
    .await;
    let fetcher =
        HttpFetcher::new(&HttpConfig::default().with_header("authorization", "Bearer abc")).unwrap();

    let response = fetcher.fetch(&format!("{}/items?page=0", base)).await.unwrap();
    assert_eq!(response.status, 200);
    assert_eq!(response.header("x-total-count"), Some("12"));
    assert_eq!(response.body, b"[1,2,3]".to_vec());

    let seen = server.await.unwrap();
    assert!(seen[0].starts_with("GET /items?page=0 "));
    assert!(seen[0].to_ascii_lowercase().contains("authorization: bearer abc"));
}

#[tokio::test]
async fn error_status_is_a_response_not_a_transport_failure() {
    let (base, _server) = serve(vec![http_response("500 Internal Server Error", "", "{}")]).await;
    let fetcher = HttpFetcher::new(&HttpConfig::default()).unwrap();

    let response = fetcher.fetch(&base).await.unwrap();
    assert_eq!(response.status, 500);
    assert!(!response.is_success());
}

#[tokio::test]
async fn unreachable_host_is_a_transport_failure() {
    // Bind then drop to get a port nothing listens on.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let fetcher = HttpFetcher::new(&HttpConfig::default().with_timeout_ms(2_000)).unwrap();
    let result = fetcher.fetch(&format!("http://{}/", addr)).await;
    assert!(matches!(result, Err(FetchFailure::Transport { .. })));
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
struct Row {
    id: u32,
}

#[tokio::test]
async fn data_source_over_http_merges_short_final_page() {
    let (base, server) = serve(vec![http_response(
        "200 OK",
        "",
        r#"{"items":[{"id":0},{"id":1},{"id":2}]}"#,
    )])
    .await;

    let config = PagerConfig::new(5, 0);
    let delegate: JsonPageDelegate<Row> =
        JsonPageDelegate::new(format!("{}/rows?offset={{offset}}&limit={{limit}}", base), &config);
    let fetcher = Arc::new(HttpFetcher::new(&HttpConfig::default()).unwrap());
    let mut source: PagedDataSource<_, _, String> = PagedDataSource::new(
        config,
        delegate,
        fetcher,
        Box::new(|cell: &mut String, row: &Row| *cell = format!("row {}", row.id)),
    )
    .unwrap();

    assert_eq!(source.on_visible_range_changed(0, 4).unwrap(), 1);
    let events = source.next_completion().await.unwrap();
    assert!(events.contains(&PageEvent::TotalCountChanged { total: Some(3) }));
    assert_eq!(source.total_item_count(), Some(3));

    let mut cell = String::new();
    assert!(source.configure_cell(&mut cell, 2).unwrap());
    assert_eq!(cell, "row 2");

    let seen = server.await.unwrap();
    assert!(seen[0].starts_with("GET /rows?offset=0&limit=5 "));
}
