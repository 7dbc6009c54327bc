//! API key and secret as a `Basic` authorization header

use super::query::QueryParamsAuth;
use super::{AuthError, AuthKind, AuthScheme, REDACTED};
use crate::request::{ApiRequest, AUTHORIZATION};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::fmt;

/// Sends `Authorization: Basic base64(api_key:api_secret)`
#[derive(Clone, PartialEq, Eq)]
pub struct BasicHeaderAuth {
    api_key: String,
    api_secret: String,
}

impl BasicHeaderAuth {
    pub const PRIORITY: u32 = 30;

    pub fn new(api_key: impl Into<String>, api_secret: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_secret: api_secret.into(),
        }
    }

    /// Value of the `Authorization` header
    pub fn header_value(&self) -> String {
        let encoded = STANDARD.encode(format!("{}:{}", self.api_key, self.api_secret));
        format!("Basic {encoded}")
    }

    /// Same credentials sent as `api_key` / `api_secret` parameters
    pub fn to_query_params(&self) -> QueryParamsAuth {
        QueryParamsAuth::new(self.api_key.clone(), self.api_secret.clone())
    }
}

impl fmt::Debug for BasicHeaderAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BasicHeaderAuth")
            .field("api_key", &self.api_key)
            .field("api_secret", &REDACTED)
            .finish()
    }
}

impl AuthScheme for BasicHeaderAuth {
    fn kind(&self) -> AuthKind {
        AuthKind::BasicHeader
    }

    fn priority(&self) -> u32 {
        Self::PRIORITY
    }

    fn satisfies(&self) -> &'static [AuthKind] {
        &[AuthKind::BasicHeader, AuthKind::KeySecret, AuthKind::ApiKey]
    }

    fn api_key(&self) -> Option<&str> {
        Some(&self.api_key)
    }

    fn apply_as_header(&self, request: &mut ApiRequest) -> Result<(), AuthError> {
        request.set_header(AUTHORIZATION, self.header_value());
        Ok(())
    }

    fn apply_as_params(&self, request: &mut ApiRequest) -> Result<(), AuthError> {
        self.to_query_params().apply_as_params(request)
    }

    fn apply_as_body(&self, request: &mut ApiRequest) -> Result<(), AuthError> {
        self.to_query_params().apply_as_body(request)
    }
}
