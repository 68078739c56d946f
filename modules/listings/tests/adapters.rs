//! Outgoing HTTP adapters against a local mock server.

use bytes::Bytes;
use chrono::Utc;
use httpmock::prelude::*;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde_json::json;
use url::Url;

use listings::contract::model::ImageUpload;
use listings::domain::error::DomainError;
use listings::domain::ports::{IdentityVerifier, ImageStore};
use listings::infra::auth::GoogleIdentityVerifier;
use listings::infra::images::{CloudinaryImageStore, CloudinarySettings};

const TEST_KEY_PEM: &str = include_str!("fixtures/google_test_key.pem");
const TEST_KEY_N: &str = "2F208gloFodm_UXf1b1HQMN-Ay1vKgj9hZMLcWeRQ4jlg4dxpT4CTFIigwdo-I9qU0lgexWSwERMoQHxQlfsnIvuCnilZ53F6r1OEB7eVaVu0vXltfOAy7k38ULy_L2bdkcFGWTAp4gulNVsZNKnTv95vtwcMe2aTZYVNAUp7QMZaPRW_bml78qYufNbrbQYbba8fQFfxFIbvMMXIjlyD9QtwqGcK-juVwemxd0EZ-wVLWYimCyYX6YAabHJin7Ymi-BTAyectZgqHEcz4V0e-boSVYskj2EfdQjHi50wUBh5-OcpALImqEuonJQZaMSTgq-Y1Vcinf1Y8_WuGfyPw";
const CLIENT_ID: &str = "roost-web.apps.googleusercontent.com";

fn jwks() -> serde_json::Value {
    json!({
        "keys": [{
            "kty": "RSA",
            "use": "sig",
            "alg": "RS256",
            "kid": "test-key",
            "n": TEST_KEY_N,
            "e": "AQAB"
        }]
    })
}

fn id_token(kid: &str, aud: &str, iss: &str, exp_offset_secs: i64) -> String {
    let now = Utc::now().timestamp();
    let mut header = Header::new(Algorithm::RS256);
    header.kid = Some(kid.to_string());
    let claims = json!({
        "iss": iss,
        "aud": aud,
        "sub": "10769150350006150715113082367",
        "email": "gina@gmail.com",
        "name": "Gina",
        "picture": "https://lh3.googleusercontent.com/a/gina",
        "iat": now,
        "exp": now + exp_offset_secs,
    });
    let key = EncodingKey::from_rsa_pem(TEST_KEY_PEM.as_bytes()).expect("test key");
    encode(&header, &claims, &key).expect("sign")
}

fn verifier(server: &MockServer, client_id: Option<&str>) -> GoogleIdentityVerifier {
    let url = Url::parse(&server.url("/oauth2/v3/certs")).expect("url");
    GoogleIdentityVerifier::new(reqwest::Client::new(), url, client_id.map(str::to_string))
}

#[tokio::test]
async fn google_token_verifies_against_jwks() {
    let server = MockServer::start_async().await;
    let certs = server
        .mock_async(|when, then| {
            when.method(GET).path("/oauth2/v3/certs");
            then.status(200).json_body(jwks());
        })
        .await;

    let verifier = verifier(&server, Some(CLIENT_ID));
    let token = id_token("test-key", CLIENT_ID, "https://accounts.google.com", 600);

    let identity = verifier.verify(&token).await.expect("verified");
    assert_eq!(identity.subject, "10769150350006150715113082367");
    assert_eq!(identity.email.as_deref(), Some("gina@gmail.com"));
    assert_eq!(identity.name.as_deref(), Some("Gina"));

    // Keys are cached between verifications.
    let token = id_token("test-key", CLIENT_ID, "accounts.google.com", 600);
    verifier.verify(&token).await.expect("verified again");
    certs.assert_hits_async(1).await;
}

#[tokio::test]
async fn google_token_with_wrong_audience_or_issuer_is_rejected() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/oauth2/v3/certs");
            then.status(200).json_body(jwks());
        })
        .await;
    let verifier = verifier(&server, Some(CLIENT_ID));

    for token in [
        id_token("test-key", "someone-else", "https://accounts.google.com", 600),
        id_token("test-key", CLIENT_ID, "https://evil.example.com", 600),
        id_token("test-key", CLIENT_ID, "https://accounts.google.com", -3600),
        id_token("rotated-away", CLIENT_ID, "https://accounts.google.com", 600),
    ] {
        let err = verifier.verify(&token).await.unwrap_err();
        assert!(matches!(err, DomainError::IdentityRejected { .. }), "{err:?}");
    }

    let err = verifier.verify("not-a-jwt").await.unwrap_err();
    assert!(matches!(err, DomainError::IdentityRejected { .. }));
}

#[tokio::test]
async fn google_sign_in_without_client_id_is_refused() {
    let server = MockServer::start_async().await;
    let certs = server
        .mock_async(|when, then| {
            when.method(GET).path("/oauth2/v3/certs");
            then.status(200).json_body(jwks());
        })
        .await;

    let verifier = verifier(&server, None);
    let token = id_token("test-key", CLIENT_ID, "https://accounts.google.com", 600);
    let err = verifier.verify(&token).await.unwrap_err();
    assert!(matches!(err, DomainError::IdentityRejected { .. }));
    certs.assert_hits_async(0).await;
}

#[tokio::test]
async fn jwks_outage_is_an_upstream_error() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/oauth2/v3/certs");
            then.status(503);
        })
        .await;

    let verifier = verifier(&server, Some(CLIENT_ID));
    let token = id_token("test-key", CLIENT_ID, "https://accounts.google.com", 600);
    let err = verifier.verify(&token).await.unwrap_err();
    assert!(matches!(err, DomainError::Upstream { .. }));
}

fn cloudinary(server: &MockServer, configured: bool) -> CloudinaryImageStore {
    CloudinaryImageStore::new(
        reqwest::Client::new(),
        CloudinarySettings {
            api_base: Url::parse(&server.base_url()).expect("url"),
            cloud_name: configured.then(|| "roost-demo".to_string()),
            upload_preset: configured.then(|| "unsigned-listings".to_string()),
            folder: Some("roost".to_string()),
        },
    )
}

fn png() -> ImageUpload {
    ImageUpload {
        file_name: "porch.png".to_string(),
        content_type: Some("image/png".to_string()),
        bytes: Bytes::from_static(b"\x89PNG\r\n\x1a\n fake"),
    }
}

#[tokio::test]
async fn cloudinary_upload_returns_secure_url() {
    let server = MockServer::start_async().await;
    let upload = server
        .mock_async(|when, then| {
            when.method(POST).path("/v1_1/roost-demo/image/upload");
            then.status(200).json_body(json!({
                "public_id": "roost/porch",
                "secure_url": "https://res.cloudinary.com/roost-demo/image/upload/v1/roost/porch.png"
            }));
        })
        .await;

    let url = cloudinary(&server, true).upload(png()).await.expect("uploaded");
    assert_eq!(
        url,
        "https://res.cloudinary.com/roost-demo/image/upload/v1/roost/porch.png"
    );
    upload.assert_async().await;
}

#[tokio::test]
async fn cloudinary_rejection_is_an_upstream_error() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/v1_1/roost-demo/image/upload");
            then.status(400).json_body(json!({"error": {"message": "Upload preset not found"}}));
        })
        .await;

    let err = cloudinary(&server, true).upload(png()).await.unwrap_err();
    assert!(matches!(err, DomainError::Upstream { .. }));
}

#[tokio::test]
async fn unconfigured_cloudinary_never_calls_out() {
    let server = MockServer::start_async().await;
    let upload = server
        .mock_async(|when, then| {
            when.method(POST);
            then.status(200);
        })
        .await;

    let err = cloudinary(&server, false).upload(png()).await.unwrap_err();
    assert!(matches!(err, DomainError::Upstream { .. }));
    upload.assert_hits_async(0).await;
}
