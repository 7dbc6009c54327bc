//! Authentication module
//!
//! Provides the credential schemes an API client can hold and the collection
//! that picks one of them for each outbound call.
//!
//! Schemes, most preferred first:
//! - [`token::SignedTokenAuth`]: freshly minted RS256 bearer token
//! - [`signature::SignatureAuth`]: API key plus signed parameters
//! - [`basic::BasicHeaderAuth`]: API key and secret as a `Basic` header
//! - [`query::QueryParamsAuth`]: API key and secret as plain parameters

use crate::request::{ApiRequest, AuthStyle};
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

pub mod basic;
pub mod collection;
pub mod material;
pub mod query;
pub mod signature;
pub mod token;
pub mod verifier;

pub use basic::BasicHeaderAuth;
pub use collection::AuthCollection;
pub use material::CredentialMaterial;
pub use query::QueryParamsAuth;
pub use signature::SignatureAuth;
pub use token::SignedTokenAuth;

/// Authentication errors
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),

    #[error("Invalid key material: {0}")]
    InvalidKey(String),

    #[error(
        "No acceptable authentication method: held [{}], acceptable [{}]",
        held.join(", "),
        acceptable.join(", ")
    )]
    NoAcceptableMethod {
        held: Vec<String>,
        acceptable: Vec<String>,
    },

    #[error("{method} cannot authenticate a request as {style}")]
    UnsupportedStyle { method: AuthKind, style: AuthStyle },

    #[error("Token generation failed: {0}")]
    TokenGeneration(String),

    #[error("Digest computation failed: {0}")]
    Digest(String),

    #[error("Missing authentication")]
    MissingAuth,

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Token expired")]
    TokenExpired,

    #[error("Invalid signature")]
    InvalidSignature,
}

impl AuthError {
    pub(crate) fn no_acceptable(held: &[AuthKind], acceptable: &[AuthKind]) -> Self {
        AuthError::NoAcceptableMethod {
            held: held.iter().map(|k| k.description().to_string()).collect(),
            acceptable: acceptable
                .iter()
                .map(|k| k.description().to_string())
                .collect(),
        }
    }
}

/// Capability a scheme provides, as declared by an endpoint.
///
/// The first four kinds are concrete schemes. `ApiKey` and `KeySecret` are
/// broader capabilities several concrete schemes satisfy. Declaration order
/// breaks priority ties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AuthKind {
    SignedToken,
    Signature,
    BasicHeader,
    QueryParams,
    /// Any scheme that carries an API key
    ApiKey,
    /// API key and secret sent in the clear
    KeySecret,
}

impl AuthKind {
    /// Human-readable name used in error messages
    pub fn description(&self) -> &'static str {
        match self {
            AuthKind::SignedToken => "Signed token (JWT)",
            AuthKind::Signature => "Signed parameters",
            AuthKind::BasicHeader => "API key and secret (Basic header)",
            AuthKind::QueryParams => "API key and secret (query parameters)",
            AuthKind::ApiKey => "Any API key method",
            AuthKind::KeySecret => "Any API key and secret method",
        }
    }

    /// Short label used in logs and metrics
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthKind::SignedToken => "signed_token",
            AuthKind::Signature => "signature",
            AuthKind::BasicHeader => "basic_header",
            AuthKind::QueryParams => "query_params",
            AuthKind::ApiKey => "api_key",
            AuthKind::KeySecret => "key_secret",
        }
    }

    pub fn is_concrete(&self) -> bool {
        !matches!(self, AuthKind::ApiKey | AuthKind::KeySecret)
    }
}

impl fmt::Display for AuthKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// Result of verifying an inbound credential
#[derive(Debug, Clone)]
pub struct AuthResult {
    pub subject: String,
    pub claims: HashMap<String, serde_json::Value>,
}

/// A credential scheme
///
/// Implementations are immutable once built. Styles a scheme cannot produce
/// keep the default implementation, which reports
/// [`AuthError::UnsupportedStyle`].
pub trait AuthScheme: fmt::Debug + Send + Sync {
    /// Concrete kind of this scheme
    fn kind(&self) -> AuthKind;

    /// Lower is preferred
    fn priority(&self) -> u32;

    /// Every kind this scheme can stand in for, its own kind included
    fn satisfies(&self) -> &'static [AuthKind];

    /// API key carried by the scheme, if any
    fn api_key(&self) -> Option<&str> {
        None
    }

    fn apply_as_header(&self, _request: &mut ApiRequest) -> Result<(), AuthError> {
        Err(AuthError::UnsupportedStyle {
            method: self.kind(),
            style: AuthStyle::Header,
        })
    }

    fn apply_as_params(&self, _request: &mut ApiRequest) -> Result<(), AuthError> {
        Err(AuthError::UnsupportedStyle {
            method: self.kind(),
            style: AuthStyle::Params,
        })
    }

    fn apply_as_body(&self, _request: &mut ApiRequest) -> Result<(), AuthError> {
        Err(AuthError::UnsupportedStyle {
            method: self.kind(),
            style: AuthStyle::Body,
        })
    }
}

/// The closed set of schemes an [`AuthCollection`] holds
#[derive(Debug, Clone)]
pub enum AuthMethod {
    SignedToken(SignedTokenAuth),
    Signature(SignatureAuth),
    BasicHeader(BasicHeaderAuth),
    QueryParams(QueryParamsAuth),
}

impl AuthMethod {
    pub fn scheme(&self) -> &dyn AuthScheme {
        match self {
            AuthMethod::SignedToken(m) => m,
            AuthMethod::Signature(m) => m,
            AuthMethod::BasicHeader(m) => m,
            AuthMethod::QueryParams(m) => m,
        }
    }

    pub fn kind(&self) -> AuthKind {
        self.scheme().kind()
    }

    pub fn priority(&self) -> u32 {
        self.scheme().priority()
    }

    pub fn description(&self) -> &'static str {
        self.kind().description()
    }

    /// Whether this scheme is acceptable where `kind` is declared
    pub fn is_compatible_with(&self, kind: AuthKind) -> bool {
        self.scheme().satisfies().contains(&kind)
    }

    pub fn api_key(&self) -> Option<&str> {
        self.scheme().api_key()
    }

    /// Authenticate `request` in the given style
    pub fn apply(&self, style: AuthStyle, request: &mut ApiRequest) -> Result<(), AuthError> {
        let scheme = self.scheme();
        match style {
            AuthStyle::Header => scheme.apply_as_header(request),
            AuthStyle::Params => scheme.apply_as_params(request),
            AuthStyle::Body => scheme.apply_as_body(request),
        }
    }

    pub fn as_signed_token(&self) -> Option<&SignedTokenAuth> {
        match self {
            AuthMethod::SignedToken(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_signature(&self) -> Option<&SignatureAuth> {
        match self {
            AuthMethod::Signature(m) => Some(m),
            _ => None,
        }
    }
}

impl From<SignedTokenAuth> for AuthMethod {
    fn from(method: SignedTokenAuth) -> Self {
        AuthMethod::SignedToken(method)
    }
}

impl From<SignatureAuth> for AuthMethod {
    fn from(method: SignatureAuth) -> Self {
        AuthMethod::Signature(method)
    }
}

impl From<BasicHeaderAuth> for AuthMethod {
    fn from(method: BasicHeaderAuth) -> Self {
        AuthMethod::BasicHeader(method)
    }
}

impl From<QueryParamsAuth> for AuthMethod {
    fn from(method: QueryParamsAuth) -> Self {
        AuthMethod::QueryParams(method)
    }
}

/// Placeholder printed instead of secret material
pub(crate) const REDACTED: &str = "<redacted>";
