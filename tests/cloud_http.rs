//! Cloud tier against an in-process HTTP responder.
//!
//! Each test answers exactly one request with a canned response and
//! points a CloudClient at it.

mod http_helpers;

use hanzi_ink::{CloudClient, RecognitionError, RemoteRecognizer};
use http_helpers::serve_once;
use std::time::Duration;

fn png() -> Vec<u8> {
    let raster = hanzi_ink::ink::blank(8, 8);
    hanzi_ink::preprocess::encode_png(&raster).unwrap()
}

#[tokio::test]
async fn ranked_words_are_returned() {
    let (url, server) = serve_once(
        "200 OK",
        r#"{"words":[{"text":"林","rate":0.41},{"text":"森","rate":0.82}]}"#,
        Duration::ZERO,
    )
    .await;
    let client = CloudClient::new(Some(url), Some("secret".into()), Duration::from_secs(5)).unwrap();

    let words = client.recognize(png()).await.unwrap();
    assert_eq!(words.len(), 2);
    assert_eq!(words[0].text, "林");

    let request = server.await.unwrap();
    eprintln!("[TEST] request head: {}", request.lines().next().unwrap_or(""));
    assert!(request.starts_with("POST /recognize"));
    assert!(request.to_ascii_lowercase().contains("authorization: bearer secret"));
    assert!(request.contains("name=\"image\""));
    assert!(request.contains("image/png"));
}

#[tokio::test]
async fn non_success_status_is_transport_failure() {
    let (url, _server) = serve_once("503 Service Unavailable", r#"{"error":"busy"}"#, Duration::ZERO).await;
    let client = CloudClient::new(Some(url), None, Duration::from_secs(5)).unwrap();

    match client.recognize(png()).await {
        Err(RecognitionError::RemoteTransportFailure(msg)) => assert!(msg.contains("503"), "{msg}"),
        other => panic!("unexpected {other:?}"),
    }
}

#[tokio::test]
async fn malformed_body_is_transport_failure() {
    let (url, _server) = serve_once("200 OK", "<html>oops</html>", Duration::ZERO).await;
    let client = CloudClient::new(Some(url), None, Duration::from_secs(5)).unwrap();

    assert!(matches!(
        client.recognize(png()).await,
        Err(RecognitionError::RemoteTransportFailure(_))
    ));
}

#[tokio::test]
async fn slow_service_times_out() {
    let (url, _server) = serve_once("200 OK", r#"{"words":[]}"#, Duration::from_secs(3)).await;
    let client = CloudClient::new(Some(url), None, Duration::from_millis(200)).unwrap();

    let start = std::time::Instant::now();
    let outcome = client.recognize(png()).await;
    assert!(start.elapsed() < Duration::from_secs(2));
    match outcome {
        Err(RecognitionError::RemoteTransportFailure(msg)) => assert!(msg.contains("timed out"), "{msg}"),
        other => panic!("unexpected {other:?}"),
    }
}

#[tokio::test]
async fn missing_endpoint_fails_without_network() {
    let client = CloudClient::new(None, None, Duration::from_secs(5)).unwrap();
    assert_eq!(
        client.recognize(png()).await,
        Err(RecognitionError::RemoteTransportFailure(
            "cloud endpoint not configured".into()
        ))
    );
}
