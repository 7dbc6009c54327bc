//! Inbound signed-token verification
//!
//! Validates bearer tokens on requests the client receives, such as signed
//! webhooks (HS256 with the account's signature secret) or tokens minted by
//! [`SignedTokenAuth`](super::SignedTokenAuth) (RS256 with the application's
//! public key).
//!
//! # Example
//!
//! ```
//! use kagi_auth::auth::verifier::TokenVerifier;
//! use kagi_auth::request::ApiRequest;
//!
//! let verifier = TokenVerifier::new_hs256("signature-secret");
//! let request = ApiRequest::new("POST", "/webhooks/inbound");
//! assert!(verifier.verify_request(&request).is_err());
//! ```

use super::{AuthError, AuthResult};
use crate::request::{ApiRequest, AUTHORIZATION};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use tracing::{debug, info};

/// Claims read from an inbound token
#[derive(Debug, Serialize, Deserialize)]
pub struct InboundClaims {
    #[serde(default)]
    pub sub: Option<String>,
    #[serde(default)]
    pub application_id: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
    pub exp: i64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl InboundClaims {
    /// Best identity for the token: `sub`, then `application_id`, then `api_key`
    fn subject(&self) -> String {
        self.sub
            .as_ref()
            .or(self.application_id.as_ref())
            .or(self.api_key.as_ref())
            .cloned()
            .unwrap_or_default()
    }
}

pub struct TokenVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    /// Verify HS256 tokens signed with a shared secret
    pub fn new_hs256(secret: &str) -> Self {
        Self::with_key(
            DecodingKey::from_secret(secret.as_bytes()),
            Algorithm::HS256,
        )
    }

    /// Verify RS256 tokens against an RSA public key (PEM)
    pub fn new_rs256(public_key_pem: &str) -> Result<Self, AuthError> {
        let decoding_key = DecodingKey::from_rsa_pem(public_key_pem.as_bytes())
            .map_err(|e| AuthError::InvalidKey(e.to_string()))?;
        Ok(Self::with_key(decoding_key, Algorithm::RS256))
    }

    fn with_key(decoding_key: DecodingKey, algorithm: Algorithm) -> Self {
        let mut validation = Validation::new(algorithm);
        validation.validate_exp = true;
        validation.validate_aud = false;
        Self {
            decoding_key,
            validation,
        }
    }

    /// Allowed clock skew for `exp`/`nbf`, in seconds
    #[must_use]
    pub fn with_leeway(mut self, seconds: u64) -> Self {
        self.validation.leeway = seconds;
        self
    }

    /// Extract token from request
    fn extract_token(request: &ApiRequest) -> Option<&str> {
        if let Some(token) = request
            .header(AUTHORIZATION)
            .and_then(|auth| auth.strip_prefix("Bearer "))
        {
            return Some(token);
        }
        request.param("token")
    }

    /// Verify the bearer token carried by `request`
    pub fn verify_request(&self, request: &ApiRequest) -> Result<AuthResult, AuthError> {
        let token = Self::extract_token(request).ok_or(AuthError::MissingAuth)?;
        debug!(auth.method = "jwt", auth.token_present = true, "Verifying inbound token");
        self.verify_token(token)
    }

    /// Verify a raw token
    pub fn verify_token(&self, token: &str) -> Result<AuthResult, AuthError> {
        let token_data = decode::<InboundClaims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                ErrorKind::InvalidSignature => AuthError::InvalidSignature,
                _ => AuthError::InvalidToken(e.to_string()),
            })?;

        let claims = token_data.claims;
        let subject = claims.subject();

        let mut claims_map: HashMap<String, Value> = claims.extra.into_iter().collect();
        if let Some(app_id) = claims.application_id {
            claims_map.insert("application_id".into(), Value::String(app_id));
        }
        if let Some(api_key) = claims.api_key {
            claims_map.insert("api_key".into(), Value::String(api_key));
        }
        claims_map.insert("exp".into(), Value::from(claims.exp));

        info!(subject = %subject, "Inbound token verified");

        Ok(AuthResult {
            subject,
            claims: claims_map,
        })
    }
}
