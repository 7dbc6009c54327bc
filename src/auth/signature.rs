//! API key plus signed parameters
//!
//! The signing secret never leaves the client. Each request carries the API
//! key and a `signature` digest over its other parameters, `timestamp`
//! included.

use super::query::API_KEY_PARAM;
use super::{AuthError, AuthKind, AuthScheme, REDACTED};
use crate::request::ApiRequest;
use crate::signing::{self, digest::HashType};
use serde_json::Value;
use std::fmt;

#[derive(Clone, PartialEq, Eq)]
pub struct SignatureAuth {
    api_key: String,
    signature_secret: String,
    hash_type: HashType,
}

impl SignatureAuth {
    pub const PRIORITY: u32 = 20;

    pub fn new(
        api_key: impl Into<String>,
        signature_secret: impl Into<String>,
        hash_type: HashType,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            signature_secret: signature_secret.into(),
            hash_type,
        }
    }

    pub fn hash_type(&self) -> HashType {
        self.hash_type
    }

    /// Check an inbound parameter set signed with this scheme's secret
    pub fn verify(&self, params: &signing::digest::Params) -> bool {
        signing::verify(params, &self.signature_secret, self.hash_type)
    }
}

impl fmt::Debug for SignatureAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignatureAuth")
            .field("api_key", &self.api_key)
            .field("signature_secret", &REDACTED)
            .field("hash_type", &self.hash_type)
            .finish()
    }
}

impl AuthScheme for SignatureAuth {
    fn kind(&self) -> AuthKind {
        AuthKind::Signature
    }

    fn priority(&self) -> u32 {
        Self::PRIORITY
    }

    fn satisfies(&self) -> &'static [AuthKind] {
        &[AuthKind::Signature, AuthKind::ApiKey]
    }

    fn api_key(&self) -> Option<&str> {
        Some(&self.api_key)
    }

    fn apply_as_params(&self, request: &mut ApiRequest) -> Result<(), AuthError> {
        request.set_param(API_KEY_PARAM, &self.api_key);
        signing::sign(&mut request.params, &self.signature_secret, self.hash_type)
    }

    fn apply_as_body(&self, request: &mut ApiRequest) -> Result<(), AuthError> {
        let body = request.body_mut();
        body.insert(API_KEY_PARAM.into(), Value::String(self.api_key.clone()));
        signing::sign_body(body, &self.signature_secret, self.hash_type)
    }
}
