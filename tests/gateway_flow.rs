//! End-to-end request flows through the gateway.

use reqwest::StatusCode;
use serde_json::{json, Value};
use std::time::{Duration, Instant};

mod common;

#[tokio::test]
async fn test_inline_cnic_is_forwarded_and_relayed() {
    let upstream = common::start_mock_upstream(200, r#"{"valid":true,"name":"ALI"}"#).await;
    let (gateway, shutdown) =
        common::spawn_gateway(common::gateway_config(upstream.addr), reqwest::Client::new()).await;

    let res = common::client()
        .post(format!("http://{}/verify-cnic", gateway))
        .json(&json!({ "image": "iVBORw0KGgo=" }))
        .send()
        .await
        .expect("Gateway unreachable");

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.json::<Value>().await.unwrap(), json!({ "valid": true, "name": "ALI" }));

    let received = upstream.received();
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].0, "/verify-cnic");
    assert_eq!(
        received[0].1,
        json!({
            "image": "iVBORw0KGgo=",
            "imageDataUri": "data:image/jpeg;base64,iVBORw0KGgo=",
        })
    );

    shutdown.trigger();
}

#[tokio::test]
async fn test_upstream_error_status_is_relayed_verbatim() {
    let upstream = common::start_mock_upstream(422, r#"{"error":"document blurry"}"#).await;
    let (gateway, shutdown) =
        common::spawn_gateway(common::gateway_config(upstream.addr), reqwest::Client::new()).await;

    let res = common::client()
        .post(format!("http://{}/shop-verify", gateway))
        .json(&json!({ "shopImage": "data:image/png;base64,AAAA" }))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(res.json::<Value>().await.unwrap(), json!({ "error": "document blurry" }));
    assert_eq!(upstream.received()[0].1["image"], "AAAA");

    shutdown.trigger();
}

#[tokio::test]
async fn test_non_json_upstream_body_is_wrapped() {
    let upstream = common::start_mock_upstream(200, "not json").await;
    let (gateway, shutdown) =
        common::spawn_gateway(common::gateway_config(upstream.addr), reqwest::Client::new()).await;

    let res = common::client()
        .post(format!("http://{}/verify-cnic", gateway))
        .json(&json!({ "cnicImage": "AAAA" }))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.json::<Value>().await.unwrap(), json!({ "raw": "not json" }));

    shutdown.trigger();
}

#[tokio::test]
async fn test_face_verify_sends_both_images() {
    let upstream = common::start_mock_upstream(200, r#"{"match":true,"score":0.93}"#).await;
    let (gateway, shutdown) =
        common::spawn_gateway(common::gateway_config(upstream.addr), reqwest::Client::new()).await;

    let res = common::client()
        .post(format!("http://{}/face-verify", gateway))
        .json(&json!({ "image1": "AAAA", "selfieImage": "data:image/jpeg;base64,BBBB" }))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let received = upstream.received();
    assert_eq!(received[0].0, "/face-verify");
    assert_eq!(
        received[0].1,
        json!({
            "cnicImage": "AAAA",
            "cnicImageDataUri": "data:image/jpeg;base64,AAAA",
            "selfieImage": "BBBB",
            "selfieImageDataUri": "data:image/jpeg;base64,BBBB",
        })
    );

    shutdown.trigger();
}

#[tokio::test]
async fn test_missing_shop_image_is_400() {
    let upstream = common::start_mock_upstream(200, "{}").await;
    let (gateway, shutdown) =
        common::spawn_gateway(common::gateway_config(upstream.addr), reqwest::Client::new()).await;

    let res = common::client()
        .post(format!("http://{}/shop-verify", gateway))
        .json(&json!({}))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    let message = body["error"].as_str().unwrap();
    assert!(message.contains("Missing shop image"), "got: {message}");
    assert!(upstream.received().is_empty(), "upstream must not be called");

    shutdown.trigger();
}

#[tokio::test]
async fn test_http_image_url_is_rejected_without_network() {
    let upstream = common::start_mock_upstream(200, "{}").await;
    let image_host = common::start_stalled_server().await;
    let (gateway, shutdown) = common::spawn_gateway(
        common::gateway_config(upstream.addr),
        common::pinned_remote_client(image_host.addr),
    )
    .await;

    let res = common::client()
        .post(format!("http://{}/verify-cnic", gateway))
        .json(&json!({ "cnicFrontUrl": "http://res.cloudinary.com/x.jpg" }))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = res.json().await.unwrap();
    let message = body["error"].as_str().unwrap().to_lowercase();
    assert!(message.contains("disallowed scheme"), "got: {message}");

    assert_eq!(image_host.accepted(), 0, "no connection may be opened");
    assert!(upstream.received().is_empty());

    shutdown.trigger();
}

#[tokio::test]
async fn test_remote_fetch_timeout_is_500() {
    let upstream = common::start_mock_upstream(200, "{}").await;
    let mut image_host = common::start_stalled_server().await;

    let mut config = common::gateway_config(upstream.addr);
    config.remote.download_timeout_ms = 300;
    let (gateway, shutdown) =
        common::spawn_gateway(config, common::pinned_remote_client(image_host.addr)).await;

    let started = Instant::now();
    let res = common::client()
        .post(format!("http://{}/verify-cnic", gateway))
        .json(&json!({ "imageUrl": common::image_url(image_host.addr, "/demo/cnic.jpg") }))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = res.json().await.unwrap();
    let message = body["error"].as_str().unwrap();
    assert!(message.contains("Timed out"), "got: {message}");
    assert!(started.elapsed() < Duration::from_secs(2));

    assert_eq!(image_host.accepted(), 1);
    tokio::time::timeout(Duration::from_secs(5), image_host.wait_closed())
        .await
        .expect("timed-out download must release its connection");
    assert!(upstream.received().is_empty());

    shutdown.trigger();
}

#[tokio::test]
async fn test_remote_image_is_downloaded_and_encoded() {
    let upstream = common::start_mock_upstream(200, r#"{"valid":true}"#).await;
    let image_host = common::start_image_host(b"\x89PNG\r\n\x1a\n").await;
    let (gateway, shutdown) = common::spawn_gateway(
        common::gateway_config(upstream.addr),
        common::pinned_remote_client(image_host.addr),
    )
    .await;

    let res = common::client()
        .post(format!("http://{}/verify-cnic", gateway))
        .json(&json!({ "cnicFrontUrl": format!(" {} ", image_host.url("/demo/cnic.png")) }))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.json::<Value>().await.unwrap(), json!({ "valid": true }));
    assert_eq!(image_host.hits(), 1);
    assert_eq!(
        upstream.received()[0].1,
        json!({
            "image": "iVBORw0KGgo=",
            "imageDataUri": "data:image/jpeg;base64,iVBORw0KGgo=",
        })
    );

    shutdown.trigger();
}

#[tokio::test]
async fn test_empty_remote_image_is_500() {
    let upstream = common::start_mock_upstream(200, "{}").await;
    let image_host = common::start_image_host(b"").await;
    let (gateway, shutdown) = common::spawn_gateway(
        common::gateway_config(upstream.addr),
        common::pinned_remote_client(image_host.addr),
    )
    .await;

    let res = common::client()
        .post(format!("http://{}/shop-verify", gateway))
        .json(&json!({ "shopImageUrl": image_host.url("/blank.jpg") }))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = res.json().await.unwrap();
    let message = body["error"].as_str().unwrap();
    assert!(message.contains("response body was empty"), "got: {message}");
    assert_eq!(image_host.hits(), 1);
    assert!(upstream.received().is_empty());

    shutdown.trigger();
}

#[tokio::test]
async fn test_disallowed_host_is_500() {
    let upstream = common::start_mock_upstream(200, "{}").await;
    let (gateway, shutdown) =
        common::spawn_gateway(common::gateway_config(upstream.addr), reqwest::Client::new()).await;

    let res = common::client()
        .post(format!("http://{}/face-verify", gateway))
        .json(&json!({
            "cnicImage": "AAAA",
            "selfieUrl": "https://cloudinary.com.evil.com/me.jpg",
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = res.json().await.unwrap();
    let message = body["error"].as_str().unwrap();
    assert!(message.contains("selfie image"), "got: {message}");
    assert!(message.contains("disallowed host"), "got: {message}");

    shutdown.trigger();
}

#[tokio::test]
async fn test_health_version_and_request_id() {
    let upstream = common::start_mock_upstream(200, "{}").await;
    let (gateway, shutdown) =
        common::spawn_gateway(common::gateway_config(upstream.addr), reqwest::Client::new()).await;
    let client = common::client();

    let res = client.get(format!("http://{}/health", gateway)).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert!(res.headers().contains_key("x-request-id"));
    assert_eq!(res.json::<Value>().await.unwrap(), json!({ "status": "ok" }));

    let res = client
        .get(format!("http://{}/version", gateway))
        .header("x-request-id", "trace-me-42")
        .send()
        .await
        .unwrap();
    assert_eq!(res.headers()["x-request-id"], "trace-me-42");
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["name"], "verify-gateway");
    assert_eq!(body["upstreamBaseUrl"], format!("http://{}", upstream.addr));
    assert_eq!(body["remoteDownloadTimeoutMs"], 2_000);
    assert_eq!(body["trustedImageDomain"], "cloudinary.com");

    shutdown.trigger();
}
