//! Negotiation Integration Tests
//!
//! Construction from raw credential material, scheme preference and request
//! enrichment across styles, including concurrent replacement.

use kagi_auth::auth::{
    AuthCollection, AuthError, AuthKind, BasicHeaderAuth, CredentialMaterial, QueryParamsAuth,
    SignatureAuth,
};
use kagi_auth::request::{ApiRequest, AuthStyle, EndpointAuth, RequestAuthenticator};
use kagi_auth::signing::digest::HashType;
use std::sync::Arc;
use std::thread;

const PRIVATE_KEY: &str = include_str!("fixtures/app_private_key.pem");

// ========================================================================
// Helpers
// ========================================================================

fn full_material() -> CredentialMaterial {
    CredentialMaterial::new()
        .with_api_key("key")
        .with_api_secret("secret")
        .with_application("aaaaaaaa-bbbb-cccc-dddd-0123456789ab", PRIVATE_KEY.as_bytes())
}

// ========================================================================
// TEST: Construction validation
// ========================================================================

#[test]
fn test_secret_without_key_is_configuration_error() {
    let result = CredentialMaterial::new().with_api_secret("secret").build();
    match result {
        Err(AuthError::InvalidCredentials(message)) => assert!(message.contains("api_key")),
        other => panic!("expected configuration error, got {other:?}"),
    }
}

#[test]
fn test_full_material_holds_header_query_and_token() {
    let auth = full_material().build().unwrap();

    assert!(auth.has_kind(AuthKind::BasicHeader));
    assert!(auth.has_kind(AuthKind::QueryParams));
    assert!(auth.has_kind(AuthKind::SignedToken));
    assert!(!auth.has_kind(AuthKind::Signature));
}

#[test]
fn test_try_from_material() {
    let material = CredentialMaterial::new()
        .with_api_key("key")
        .with_signature_secret("shh", HashType::HmacSha1);
    let auth = AuthCollection::try_from(&material).unwrap();
    assert_eq!(auth.kinds(), vec![AuthKind::Signature]);
}

#[test]
fn test_empty_material_builds_empty_collection() {
    let auth = CredentialMaterial::new().build().unwrap();
    assert!(auth.is_empty());
    assert!(auth.api_key().is_err());
}

// ========================================================================
// TEST: Priority selection
// ========================================================================

#[test]
fn test_token_preferred_over_basic_header() {
    let auth = full_material().build().unwrap();

    let chosen = auth
        .select_acceptable(&[AuthKind::BasicHeader, AuthKind::SignedToken])
        .unwrap();
    assert_eq!(chosen.kind(), AuthKind::SignedToken);
}

#[test]
fn test_falls_back_when_preferred_not_acceptable() {
    let auth = full_material().build().unwrap();

    let chosen = auth.select_acceptable(&[AuthKind::QueryParams]).unwrap();
    assert_eq!(chosen.kind(), AuthKind::QueryParams);

    let chosen = auth.select_acceptable(&[AuthKind::KeySecret]).unwrap();
    assert_eq!(chosen.kind(), AuthKind::BasicHeader);
}

#[test]
fn test_negotiation_failure_describes_both_sides() {
    let auth = CredentialMaterial::new()
        .with_api_key("key")
        .with_api_secret("secret")
        .build()
        .unwrap();

    let message = auth
        .select_acceptable(&[AuthKind::SignedToken])
        .unwrap_err()
        .to_string();
    assert!(message.contains(AuthKind::BasicHeader.description()));
    assert!(message.contains(AuthKind::QueryParams.description()));
    assert!(message.contains(AuthKind::SignedToken.description()));
}

// ========================================================================
// TEST: Request enrichment
// ========================================================================

#[test]
fn test_enrich_header_with_token() {
    let auth = full_material().build().unwrap();
    let endpoint = EndpointAuth::new(
        AuthStyle::Header,
        [AuthKind::SignedToken, AuthKind::BasicHeader],
    );

    let request = auth
        .enrich(&endpoint, ApiRequest::new("POST", "/v1/calls"))
        .unwrap();
    assert!(request
        .header("Authorization")
        .unwrap()
        .starts_with("Bearer "));
}

#[test]
fn test_enrich_params_with_key_and_secret() {
    let auth = full_material().build().unwrap();

    let request = auth
        .enrich_for_one_of(
            &[AuthKind::QueryParams],
            AuthStyle::Params,
            ApiRequest::new("GET", "/account/get-balance"),
        )
        .unwrap();
    assert_eq!(request.param("api_key"), Some("key"));
    assert_eq!(request.param("api_secret"), Some("secret"));
    assert!(request.header("authorization").is_none());
}

#[test]
fn test_enrich_body_with_signature_verifies() {
    let auth = AuthCollection::with_methods([SignatureAuth::new("key", "shh", HashType::HmacSha256)]);

    let request = auth
        .enrich_for_one_of(
            &[AuthKind::ApiKey],
            AuthStyle::Body,
            ApiRequest::new("POST", "/sms/json")
                .with_json_field("to", "447700900000".into())
                .with_json_field("ttl", 3600.into())
                .with_json_field("callback", serde_json::Value::Null),
        )
        .unwrap();

    let body = request.body.unwrap();
    assert_eq!(body.get("api_key").and_then(|v| v.as_str()), Some("key"));
    assert!(body.get("timestamp").is_some());
    assert!(body.get("signature").is_some());
}

#[test]
fn test_enrich_with_nothing_held_fails() {
    let auth = AuthCollection::new();
    let result = auth.enrich_for_one_of(
        &[AuthKind::BasicHeader],
        AuthStyle::Header,
        ApiRequest::new("GET", "/"),
    );
    assert!(matches!(result, Err(AuthError::NoAcceptableMethod { .. })));
}

// ========================================================================
// TEST: Concurrent replacement
// ========================================================================

#[test]
fn test_concurrent_add_and_select() {
    let auth = Arc::new(AuthCollection::with_methods([BasicHeaderAuth::new(
        "key-0", "secret",
    )]));

    let writer = {
        let auth = Arc::clone(&auth);
        thread::spawn(move || {
            for i in 1..200 {
                auth.add(BasicHeaderAuth::new(format!("key-{i}"), "secret"));
                auth.add(QueryParamsAuth::new(format!("key-{i}"), "secret"));
            }
        })
    };

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let auth = Arc::clone(&auth);
            thread::spawn(move || {
                for _ in 0..500 {
                    let chosen = auth.select_acceptable(&[AuthKind::BasicHeader]).unwrap();
                    assert_eq!(chosen.kind(), AuthKind::BasicHeader);
                    assert!(chosen.api_key().unwrap().starts_with("key-"));
                }
            })
        })
        .collect();

    writer.join().unwrap();
    for reader in readers {
        reader.join().unwrap();
    }

    assert_eq!(auth.len(), 2);
    assert_eq!(auth.api_key().unwrap(), "key-199");
}
