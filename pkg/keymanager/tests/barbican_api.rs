//! Exercises `BarbicanClient` against a wiremock server standing in for Barbican.

use std::time::Duration;

use pkg_keymanager::{ApiError, BarbicanClient, ClientConfig, KeyManager};
use pkg_types::secret::{CreateSecretRequest, ListSecretsQuery, SecretType};
use serde_json::json;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> BarbicanClient {
    BarbicanClient::new(ClientConfig {
        endpoint: server.uri(),
        token: Some("test-token".to_string()),
        timeout: Duration::from_secs(5),
        insecure: false,
    })
    .unwrap()
}

fn secret_json(server: &MockServer, name: &str, id: &str) -> serde_json::Value {
    json!({
        "name": name,
        "secret_ref": format!("{}/v1/secrets/{}", server.uri(), id),
        "secret_type": "opaque",
        "content_types": {"default": "application/octet-stream"},
        "algorithm": "aes",
        "bit_length": 256,
        "mode": "cbc",
        "status": "ACTIVE",
        "created": "2024-05-14T09:12:45"
    })
}

#[tokio::test]
async fn list_filters_by_name_and_sends_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/secrets"))
        .and(query_param("name", "lb-cert"))
        .and(header("X-Auth-Token", "test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "secrets": [secret_json(&server, "lb-cert", "abc123")],
            "total": 1
        })))
        .expect(1)
        .mount(&server)
        .await;

    let secrets = client_for(&server)
        .list_secrets(&ListSecretsQuery::by_name("lb-cert"), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(secrets.len(), 1);
    assert_eq!(secrets[0].name, "lb-cert");
    assert!(secrets[0].secret_ref.ends_with("/v1/secrets/abc123"));
}

#[tokio::test]
async fn list_follows_next_links() {
    let server = MockServer::start().await;
    let next = format!("{}/v1/secrets?secret_type=opaque&limit=1&offset=1", server.uri());

    // The first page answers once; the second only matches the offset link.
    Mock::given(method("GET"))
        .and(path("/v1/secrets"))
        .and(query_param("secret_type", "opaque"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "secrets": [secret_json(&server, "first", "id-1")],
            "total": 2,
            "next": next
        })))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/secrets"))
        .and(query_param("offset", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "secrets": [secret_json(&server, "second", "id-2")],
            "total": 2
        })))
        .expect(1)
        .mount(&server)
        .await;

    let secrets = client_for(&server)
        .list_secrets(
            &ListSecretsQuery::by_type(SecretType::Opaque),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    let names: Vec<&str> = secrets.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["first", "second"]);
}

#[tokio::test]
async fn create_posts_opaque_secret() {
    let server = MockServer::start().await;
    let request = CreateSecretRequest::opaque("lb-cert", "application/octet-stream", "Zm9vYmFy");
    let secret_ref = format!("{}/v1/secrets/new-id", server.uri());

    Mock::given(method("POST"))
        .and(path("/v1/secrets"))
        .and(body_json(json!({
            "name": "lb-cert",
            "algorithm": "aes",
            "mode": "cbc",
            "bit_length": 256,
            "payload": "Zm9vYmFy",
            "payload_content_type": "application/octet-stream",
            "payload_content_encoding": "base64",
            "secret_type": "opaque"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "secret_ref": secret_ref })))
        .expect(1)
        .mount(&server)
        .await;

    let got = client_for(&server)
        .create_secret(&request, &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(got, secret_ref);
}

#[tokio::test]
async fn create_surfaces_service_errors() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/secrets"))
        .respond_with(ResponseTemplate::new(400).set_body_string("Provided object does not match schema"))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .create_secret(
            &CreateSecretRequest::opaque("x", "text/plain", "eA=="),
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();

    match err {
        ApiError::Status { status, body } => {
            assert_eq!(status.as_u16(), 400);
            assert!(body.contains("does not match schema"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn delete_maps_404_to_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/v1/secrets/gone"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/v1/secrets/present"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let cancel = CancellationToken::new();

    client.delete_secret("present", &cancel).await.unwrap();
    let err = client.delete_secret("gone", &cancel).await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn cancelled_request_returns_cancelled() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/secrets"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "secrets": [] }))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });

    let err = client_for(&server)
        .list_secrets(&ListSecretsQuery::default(), &cancel)
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Cancelled));
}
