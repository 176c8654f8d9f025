//! Unit tests for the SCB client.

use std::time::Duration;

use rstest::rstest;
use serde_json::json;
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpListener,
    task::JoinHandle,
};

use super::source::decode_response;
use super::*;

/// Serve one canned HTTP response and hand back the raw request.
async fn serve_once(status_line: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind listener");
    let addr = listener.local_addr().expect("local address");
    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.expect("accept connection");
        let request = read_request(&mut socket).await;
        let response = format!(
            "HTTP/1.1 {status_line}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
            body.len()
        );
        socket
            .write_all(response.as_bytes())
            .await
            .expect("write response");
        request
    });
    (format!("http://{addr}/table"), handle)
}

async fn read_request(socket: &mut tokio::net::TcpStream) -> String {
    let mut buffer = Vec::new();
    let mut chunk = [0_u8; 4096];
    loop {
        let read = socket.read(&mut chunk).await.expect("read request");
        if read == 0 {
            break;
        }
        buffer.extend_from_slice(&chunk[..read]);
        let text = String::from_utf8_lossy(&buffer);
        if let Some(header_end) = text.find("\r\n\r\n") {
            let content_length = text[..header_end]
                .lines()
                .find_map(|line| {
                    let (name, value) = line.split_once(':')?;
                    name.eq_ignore_ascii_case("content-length")
                        .then(|| value.trim().parse::<usize>().ok())
                        .flatten()
                })
                .unwrap_or(0);
            if buffer.len() >= header_end + 4 + content_length {
                break;
            }
        }
    }
    String::from_utf8_lossy(&buffer).into_owned()
}

fn source_for(url: String) -> HttpStatisticsSource {
    HttpStatisticsSource::new(
        HttpSourceConfig::default()
            .with_endpoint(url)
            .with_timeout(Duration::from_secs(5)),
    )
    .expect("build source")
}

#[rstest]
fn default_document_matches_table_dimensions() {
    let document = QuerySelection::default().to_document();
    let json = serde_json::to_value(&document).expect("serialise document");

    assert_eq!(json["query"][0]["code"], "Region");
    assert_eq!(json["query"][0]["selection"]["filter"], "vs:RegionKommun07");
    assert_eq!(json["query"][0]["selection"]["values"][0], "0114");
    assert_eq!(json["query"][1], json!({"code": "Kon", "selection": {"filter": "item", "values": ["1", "2"]}}));
    assert_eq!(
        json["query"][2]["selection"]["values"],
        json!(["2016", "2017", "2018", "2019", "2020"])
    );
    assert_eq!(json["response"], json!({"format": "json"}));
}

#[rstest]
fn decodes_body_with_byte_order_mark() {
    let body = "\u{feff}{\"columns\":[],\"comments\":[],\"data\":[{\"key\":[\"0114\",\"1\",\"2020\"],\"values\":[\"123\"]}]}";

    let response = decode_response(body, "https://example.org").expect("decode");

    assert_eq!(response.data.len(), 1);
    assert_eq!(response.data[0].key, ["0114", "1", "2020"]);
    assert_eq!(response.data[0].values, [json!("123")]);
}

#[rstest]
fn rejects_body_that_is_not_json() {
    let err = decode_response("<html>", "https://example.org").expect_err("decode fails");

    assert!(matches!(err, FetchError::Decode { .. }));
}

#[rstest]
#[case(r#"{"error":"Table not found"}"#)]
#[case(r#"{"columns":[],"comments":[]}"#)]
#[case(r#"{"data":null}"#)]
fn rejects_body_without_data(#[case] body: &str) {
    let err = decode_response(body, "https://example.org").expect_err("decode fails");

    assert!(matches!(err, FetchError::Decode { .. }));
}

#[rstest]
fn accepts_empty_data_array() {
    let response = decode_response(r#"{"data":[]}"#, "https://example.org").expect("decode");

    assert!(response.data.is_empty());
}

#[rstest]
fn rejects_invalid_endpoint() {
    let err = HttpStatisticsSource::new(HttpSourceConfig::default().with_endpoint("not a url"))
        .expect_err("invalid endpoint");

    assert!(matches!(err, FetchError::InvalidEndpoint { .. }));
}

#[tokio::test]
async fn posts_query_document_and_decodes_entries() {
    let (url, server) = serve_once(
        "200 OK",
        r#"{"data":[{"key":["0114","2","2019"],"values":["98"]}]}"#,
    )
    .await;
    let source = source_for(url);

    let response = source.fetch().await.expect("fetch");
    let request = server.await.expect("server task");

    assert_eq!(response.data.len(), 1);
    assert!(request.starts_with("POST /table"), "unexpected request: {request}");
    assert!(request.to_ascii_lowercase().contains("accept: application/json"));
    assert!(request.contains("vs:RegionKommun07"));
}

#[tokio::test]
async fn sends_configured_user_agent_and_selection() {
    let (url, server) = serve_once("200 OK", r#"{"data":[]}"#).await;
    let selection = QuerySelection {
        regions: vec!["0114".to_owned()],
        genders: vec!["2".to_owned()],
        years: vec!["2019".to_owned()],
    };
    let source = HttpStatisticsSource::new(
        HttpSourceConfig::default()
            .with_endpoint(url)
            .with_user_agent("birthstats-test/1")
            .with_selection(selection.clone()),
    )
    .expect("build source");
    let expected_body = serde_json::to_string(source.document()).expect("serialise document");

    source.fetch().await.expect("fetch");
    let request = server.await.expect("server task");

    assert_eq!(source.document(), &selection.to_document());
    assert!(
        request.to_ascii_lowercase().contains("user-agent: birthstats-test/1"),
        "unexpected request: {request}"
    );
    assert!(request.contains(&expected_body), "unexpected request: {request}");
}

#[tokio::test]
async fn non_success_status_is_a_fetch_failure() {
    let (url, server) = serve_once("503 Service Unavailable", r#"{"error":"busy"}"#).await;
    let source = source_for(url);

    let err = source.fetch().await.expect_err("fetch fails");
    server.await.expect("server task");

    match err {
        FetchError::Http {
            status, message, ..
        } => {
            assert_eq!(status, 503);
            assert!(message.contains("busy"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn unreachable_endpoint_is_a_network_failure() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind listener");
    let addr = listener.local_addr().expect("local address");
    drop(listener);

    let err = source_for(format!("http://{addr}/table"))
        .fetch()
        .await
        .expect_err("connection refused");

    assert!(matches!(err, FetchError::Network { .. } | FetchError::Timeout { .. }));
}
