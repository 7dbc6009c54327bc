//! Request enrichment
//!
//! Endpoint code describes the request it is about to send as an
//! [`ApiRequest`], declares which credential kinds the remote operation
//! accepts and how credentials travel ([`AuthStyle`]), and gets the request
//! back with authentication applied.
//!
//! # Example
//!
//! ```
//! use kagi_auth::auth::{AuthKind, CredentialMaterial};
//! use kagi_auth::request::{ApiRequest, AuthStyle, EndpointAuth, RequestAuthenticator};
//!
//! let auth = CredentialMaterial::new()
//!     .with_api_key("key")
//!     .with_api_secret("secret")
//!     .build()
//!     .unwrap();
//!
//! let endpoint = EndpointAuth::new(AuthStyle::Header, [AuthKind::SignedToken, AuthKind::BasicHeader]);
//! let request = auth
//!     .enrich(&endpoint, ApiRequest::new("GET", "/v2/applications"))
//!     .unwrap();
//! assert!(request.header("authorization").unwrap().starts_with("Basic "));
//! ```

use crate::auth::{AuthCollection, AuthError, AuthKind};
use crate::signing::digest::Params;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;
use tracing::{debug, info_span, warn};

/// Authorization header name, stored lowercase
pub const AUTHORIZATION: &str = "authorization";

/// Where credentials are placed on the request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthStyle {
    /// `Authorization` header
    Header,
    /// Query or form parameters
    Params,
    /// Properties of a JSON body
    Body,
}

impl AuthStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthStyle::Header => "header",
            AuthStyle::Params => "params",
            AuthStyle::Body => "body",
        }
    }
}

impl fmt::Display for AuthStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outgoing (or inbound) request descriptor
///
/// Header names are stored lowercase.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ApiRequest {
    pub method: String,
    pub path: String,
    pub headers: HashMap<String, String>,
    pub params: Params,
    pub body: Option<Map<String, Value>>,
}

impl ApiRequest {
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.set_header(name, value);
        self
    }

    #[must_use]
    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_json_field(mut self, name: impl Into<String>, value: Value) -> Self {
        self.body_mut().insert(name.into(), value);
        self
    }

    /// Header value by name (case-insensitive)
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn set_header(&mut self, name: &str, value: impl Into<String>) {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    pub fn set_param(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.params.insert(name.into(), value.into());
    }

    /// JSON body, created empty if the request has none yet
    pub fn body_mut(&mut self) -> &mut Map<String, Value> {
        self.body.get_or_insert_with(Map::new)
    }
}

/// What a remote operation accepts and how credentials are sent to it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointAuth {
    pub style: AuthStyle,
    pub acceptable: Vec<AuthKind>,
}

impl EndpointAuth {
    pub fn new(style: AuthStyle, acceptable: impl IntoIterator<Item = AuthKind>) -> Self {
        Self {
            style,
            acceptable: acceptable.into_iter().collect(),
        }
    }
}

/// Authenticates outgoing requests for endpoint code
pub trait RequestAuthenticator {
    /// Pick a scheme acceptable to the endpoint and apply it in `style`
    fn enrich_for_one_of(
        &self,
        acceptable: &[AuthKind],
        style: AuthStyle,
        request: ApiRequest,
    ) -> Result<ApiRequest, AuthError>;

    /// Same as [`enrich_for_one_of`](Self::enrich_for_one_of) driven by an
    /// endpoint declaration
    fn enrich(&self, endpoint: &EndpointAuth, request: ApiRequest) -> Result<ApiRequest, AuthError> {
        self.enrich_for_one_of(&endpoint.acceptable, endpoint.style, request)
    }
}

impl RequestAuthenticator for AuthCollection {
    fn enrich_for_one_of(
        &self,
        acceptable: &[AuthKind],
        style: AuthStyle,
        mut request: ApiRequest,
    ) -> Result<ApiRequest, AuthError> {
        let span = info_span!(
            "auth.enrich",
            auth.style = %style,
            auth.method = tracing::field::Empty,
            http.method = %request.method,
            http.path = %request.path,
        );
        let _enter = span.enter();

        let method = match self.select_acceptable(acceptable) {
            Ok(method) => method,
            Err(e) => {
                warn!(error = %e, "Authentication negotiation failed");
                #[cfg(feature = "metrics")]
                crate::metrics::record_negotiation("none", false);
                return Err(e);
            }
        };

        span.record("auth.method", method.kind().as_str());

        let applied = method.apply(style, &mut request);

        #[cfg(feature = "metrics")]
        crate::metrics::record_negotiation(method.kind().as_str(), applied.is_ok());

        if let Err(e) = applied {
            warn!(error = %e, "Could not apply authentication method");
            return Err(e);
        }

        debug!("Request authenticated");
        Ok(request)
    }
}
