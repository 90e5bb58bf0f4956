//! Client-side scenarios: a 402 gets exactly one retry, and the max-value
//! guard refuses to sign a payment above the caller's configured ceiling.

use alloy_signer_local::PrivateKeySigner;
use reqwest::Client;
use reqwest_middleware::ClientBuilder;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};
use x402_reqwest::X402Payments;

fn payment_required_body() -> serde_json::Value {
    json!({
        "x402Version": 1,
        "accepts": [{
            "scheme": "exact",
            "network": "bsc-mainnet",
            "maxAmountRequired": "1000",
            "resource": "http://example.com/protected",
            "description": "",
            "mimeType": "",
            "payTo": "0x0000000000000000000000000000000000000001",
            "maxTimeoutSeconds": 60,
            "asset": "0x55d398326f99059fF775485246999027B3197955",
            "extra": { "name": "USDT", "version": "1" }
        }],
        "error": "payment required"
    })
}

#[tokio::test]
async fn retries_once_and_succeeds_with_signed_payment() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/protected"))
        .and(wiremock::matchers::header_exists("x-payment"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/protected"))
        .respond_with(ResponseTemplate::new(402).set_body_json(payment_required_body()))
        .mount(&server)
        .await;

    let signer = PrivateKeySigner::random();
    let payments = X402Payments::with_signer(signer);
    let client = ClientBuilder::new(Client::new()).with(payments).build();

    let response = client
        .get(format!("{}/protected", server.uri()))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
}

#[tokio::test]
async fn does_not_loop_when_retry_is_also_rejected() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/protected"))
        .respond_with(ResponseTemplate::new(402).set_body_json(payment_required_body()))
        .mount(&server)
        .await;

    let signer = PrivateKeySigner::random();
    let payments = X402Payments::with_signer(signer);
    let client = ClientBuilder::new(Client::new()).with(payments).build();

    let response = client
        .get(format!("{}/protected", server.uri()))
        .send()
        .await
        .unwrap();

    // The server always answers 402: the middleware must not loop forever,
    // it retries exactly once and surfaces that response.
    assert_eq!(response.status(), 402);
}

#[tokio::test]
async fn max_value_guard_rejects_an_expensive_requirement() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/protected"))
        .respond_with(ResponseTemplate::new(402).set_body_json(payment_required_body()))
        .mount(&server)
        .await;

    let signer = PrivateKeySigner::random();
    let payments = X402Payments::with_signer(signer).with_max_value(10);
    let client = ClientBuilder::new(Client::new()).with(payments).build();

    let err = client
        .get(format!("{}/protected", server.uri()))
        .send()
        .await
        .unwrap_err();

    assert!(err.to_string().to_lowercase().contains("exceeds"));
}
