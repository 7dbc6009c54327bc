//! Raw credential material and the checks run before any scheme is built
//!
//! | Supplied | Schemes built |
//! |---|---|
//! | `api_key` + `api_secret` | [`BasicHeaderAuth`], [`QueryParamsAuth`] |
//! | `api_key` + `signature_secret` | [`SignatureAuth`] |
//! | `application_id` + `private_key` | [`SignedTokenAuth`] |
//!
//! Blank strings and empty key bytes count as absent.

use super::{
    AuthCollection, AuthError, BasicHeaderAuth, QueryParamsAuth, SignatureAuth, SignedTokenAuth,
};
use crate::signing::digest::HashType;
use serde_json::{Map, Value};
use std::fmt;
use std::time::Duration;
use tracing::{info, warn};

use super::token::DEFAULT_TOKEN_TTL;
use super::REDACTED;

#[derive(Clone)]
pub struct CredentialMaterial {
    pub api_key: Option<String>,
    pub api_secret: Option<String>,
    pub signature_secret: Option<String>,
    pub hash_type: HashType,
    pub application_id: Option<String>,
    pub private_key: Option<Vec<u8>>,
    pub token_ttl: Duration,
    pub token_claims: Map<String, Value>,
}

impl Default for CredentialMaterial {
    fn default() -> Self {
        Self {
            api_key: None,
            api_secret: None,
            signature_secret: None,
            hash_type: HashType::default(),
            application_id: None,
            private_key: None,
            token_ttl: DEFAULT_TOKEN_TTL,
            token_claims: Map::new(),
        }
    }
}

impl CredentialMaterial {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    #[must_use]
    pub fn with_api_secret(mut self, api_secret: impl Into<String>) -> Self {
        self.api_secret = Some(api_secret.into());
        self
    }

    #[must_use]
    pub fn with_signature_secret(
        mut self,
        signature_secret: impl Into<String>,
        hash_type: HashType,
    ) -> Self {
        self.signature_secret = Some(signature_secret.into());
        self.hash_type = hash_type;
        self
    }

    #[must_use]
    pub fn with_application(
        mut self,
        application_id: impl Into<String>,
        private_key: impl Into<Vec<u8>>,
    ) -> Self {
        self.application_id = Some(application_id.into());
        self.private_key = Some(private_key.into());
        self
    }

    #[must_use]
    pub fn with_token_ttl(mut self, ttl: Duration) -> Self {
        self.token_ttl = ttl;
        self
    }

    #[must_use]
    pub fn with_token_claim(mut self, name: impl Into<String>, value: Value) -> Self {
        self.token_claims.insert(name.into(), value);
        self
    }

    fn api_key(&self) -> Option<&str> {
        present(&self.api_key)
    }

    fn api_secret(&self) -> Option<&str> {
        present(&self.api_secret)
    }

    fn signature_secret(&self) -> Option<&str> {
        present(&self.signature_secret)
    }

    fn application_id(&self) -> Option<&str> {
        present(&self.application_id)
    }

    fn private_key(&self) -> Option<&[u8]> {
        self.private_key.as_deref().filter(|key| !key.is_empty())
    }

    /// Check that every supplied field has its companion
    pub fn validate(&self) -> Result<(), AuthError> {
        let has_key = self.api_key().is_some();
        let has_secret = self.api_secret().is_some();
        let has_signature_secret = self.signature_secret().is_some();

        if has_key && !has_secret && !has_signature_secret {
            return Err(AuthError::InvalidCredentials(
                "api_secret or signature_secret is required with api_key".into(),
            ));
        }
        if has_secret && !has_key {
            return Err(AuthError::InvalidCredentials(
                "api_key is required with api_secret".into(),
            ));
        }
        if has_signature_secret && !has_key {
            return Err(AuthError::InvalidCredentials(
                "api_key is required with signature_secret".into(),
            ));
        }

        match (self.application_id().is_some(), self.private_key().is_some()) {
            (true, false) => Err(AuthError::InvalidCredentials(
                "private_key is required with application_id".into(),
            )),
            (false, true) => Err(AuthError::InvalidCredentials(
                "application_id is required with private_key".into(),
            )),
            _ => Ok(()),
        }
    }

    /// Validate the material and build every applicable scheme
    pub fn build(&self) -> Result<AuthCollection, AuthError> {
        self.validate()?;
        let collection = AuthCollection::new();

        if let (Some(key), Some(secret)) = (self.api_key(), self.api_secret()) {
            collection.add(BasicHeaderAuth::new(key, secret));
            collection.add(QueryParamsAuth::new(key, secret));
        }

        if let (Some(key), Some(secret)) = (self.api_key(), self.signature_secret()) {
            collection.add(SignatureAuth::new(key, secret, self.hash_type));
        }

        if let (Some(app_id), Some(private_key)) = (self.application_id(), self.private_key()) {
            let mut token = SignedTokenAuth::new(app_id, private_key)?.with_ttl(self.token_ttl);
            for (name, value) in &self.token_claims {
                token = token.with_claim(name.clone(), value.clone());
            }
            collection.add(token);
        }

        if collection.is_empty() {
            warn!("No credentials supplied; every authenticated call will fail");
        } else {
            info!(methods = ?collection.kinds(), "Built authentication methods");
        }

        Ok(collection)
    }
}

impl TryFrom<&CredentialMaterial> for AuthCollection {
    type Error = AuthError;

    fn try_from(material: &CredentialMaterial) -> Result<Self, Self::Error> {
        material.build()
    }
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

fn redact<T>(value: &Option<T>) -> Option<&'static str> {
    value.as_ref().map(|_| REDACTED)
}

impl fmt::Debug for CredentialMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialMaterial")
            .field("api_key", &self.api_key)
            .field("api_secret", &redact(&self.api_secret))
            .field("signature_secret", &redact(&self.signature_secret))
            .field("hash_type", &self.hash_type)
            .field("application_id", &self.application_id)
            .field("private_key", &redact(&self.private_key))
            .field("token_ttl", &self.token_ttl)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AuthKind;

    const PRIVATE_KEY: &str = include_str!("../../tests/fixtures/app_private_key.pem");

    fn assert_invalid(material: CredentialMaterial, field: &str) {
        match material.build() {
            Err(AuthError::InvalidCredentials(message)) => {
                assert!(message.contains(field), "{message} should mention {field}")
            }
            other => panic!("expected invalid credentials, got {other:?}"),
        }
    }

    #[test]
    fn test_key_without_any_secret() {
        assert_invalid(CredentialMaterial::new().with_api_key("key"), "api_secret");
    }

    #[test]
    fn test_secret_without_key() {
        assert_invalid(CredentialMaterial::new().with_api_secret("secret"), "api_key");
    }

    #[test]
    fn test_signature_secret_without_key() {
        assert_invalid(
            CredentialMaterial::new().with_signature_secret("shh", HashType::Md5),
            "api_key",
        );
    }

    #[test]
    fn test_application_without_key_bytes() {
        let mut material = CredentialMaterial::new();
        material.application_id = Some("app-id".into());
        assert_invalid(material, "private_key");
    }

    #[test]
    fn test_key_bytes_without_application() {
        let mut material = CredentialMaterial::new();
        material.private_key = Some(PRIVATE_KEY.as_bytes().to_vec());
        assert_invalid(material, "application_id");
    }

    #[test]
    fn test_blank_values_count_as_absent() {
        assert_invalid(
            CredentialMaterial::new()
                .with_api_key("key")
                .with_api_secret("  "),
            "api_secret",
        );
    }

    #[test]
    fn test_key_and_secret_build_header_and_query() {
        let auth = CredentialMaterial::new()
            .with_api_key("key")
            .with_api_secret("secret")
            .build()
            .unwrap();
        assert_eq!(auth.kinds(), vec![AuthKind::BasicHeader, AuthKind::QueryParams]);
    }

    #[test]
    fn test_everything_builds_all_methods() {
        let auth = CredentialMaterial::new()
            .with_api_key("key")
            .with_api_secret("secret")
            .with_signature_secret("shh", HashType::HmacSha256)
            .with_application("app-id", PRIVATE_KEY.as_bytes())
            .build()
            .unwrap();

        assert_eq!(
            auth.kinds(),
            vec![
                AuthKind::SignedToken,
                AuthKind::Signature,
                AuthKind::BasicHeader,
                AuthKind::QueryParams,
            ]
        );
        let signature = auth.get_by_kind(AuthKind::Signature).unwrap();
        assert_eq!(
            signature.as_signature().unwrap().hash_type(),
            HashType::HmacSha256
        );
    }

    #[test]
    fn test_bad_private_key_is_reported() {
        let result = CredentialMaterial::new()
            .with_application("app-id", b"garbage".to_vec())
            .build();
        assert!(matches!(result, Err(AuthError::InvalidKey(_))));
    }

    #[test]
    fn test_token_settings_carried_over() {
        let auth = CredentialMaterial::new()
            .with_application("app-id", PRIVATE_KEY.as_bytes())
            .with_token_ttl(Duration::from_secs(60))
            .build()
            .unwrap();
        let token = auth.get_by_kind(AuthKind::SignedToken).unwrap();
        assert_eq!(token.as_signed_token().unwrap().ttl(), Duration::from_secs(60));
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let material = CredentialMaterial::new()
            .with_api_key("key")
            .with_api_secret("top-secret")
            .with_signature_secret("signing-secret", HashType::Md5);
        let debug = format!("{material:?}");
        assert!(!debug.contains("top-secret"));
        assert!(!debug.contains("signing-secret"));
    }
}
