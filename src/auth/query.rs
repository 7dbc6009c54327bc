//! API key and secret as plain request parameters

use super::basic::BasicHeaderAuth;
use super::{AuthError, AuthKind, AuthScheme, REDACTED};
use crate::request::ApiRequest;
use serde_json::Value;
use std::fmt;

/// Parameter carrying the API key
pub const API_KEY_PARAM: &str = "api_key";

/// Parameter carrying the API secret
pub const API_SECRET_PARAM: &str = "api_secret";

/// Sends `api_key` and `api_secret` as two plain parameters
#[derive(Clone, PartialEq, Eq)]
pub struct QueryParamsAuth {
    api_key: String,
    api_secret: String,
}

impl QueryParamsAuth {
    pub const PRIORITY: u32 = 30;

    pub fn new(api_key: impl Into<String>, api_secret: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_secret: api_secret.into(),
        }
    }

    pub fn api_secret(&self) -> &str {
        &self.api_secret
    }

    /// Same credentials sent as a `Basic` authorization header
    pub fn to_basic_header(&self) -> BasicHeaderAuth {
        BasicHeaderAuth::new(self.api_key.clone(), self.api_secret.clone())
    }
}

impl fmt::Debug for QueryParamsAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryParamsAuth")
            .field("api_key", &self.api_key)
            .field("api_secret", &REDACTED)
            .finish()
    }
}

impl AuthScheme for QueryParamsAuth {
    fn kind(&self) -> AuthKind {
        AuthKind::QueryParams
    }

    fn priority(&self) -> u32 {
        Self::PRIORITY
    }

    fn satisfies(&self) -> &'static [AuthKind] {
        &[AuthKind::QueryParams, AuthKind::KeySecret, AuthKind::ApiKey]
    }

    fn api_key(&self) -> Option<&str> {
        Some(&self.api_key)
    }

    fn apply_as_header(&self, request: &mut ApiRequest) -> Result<(), AuthError> {
        self.to_basic_header().apply_as_header(request)
    }

    fn apply_as_params(&self, request: &mut ApiRequest) -> Result<(), AuthError> {
        request.set_param(API_KEY_PARAM, &self.api_key);
        request.set_param(API_SECRET_PARAM, &self.api_secret);
        Ok(())
    }

    fn apply_as_body(&self, request: &mut ApiRequest) -> Result<(), AuthError> {
        let body = request.body_mut();
        body.insert(API_KEY_PARAM.into(), Value::String(self.api_key.clone()));
        body.insert(
            API_SECRET_PARAM.into(),
            Value::String(self.api_secret.clone()),
        );
        Ok(())
    }
}
