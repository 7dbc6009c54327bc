//! Signed-token authentication
//!
//! Mints an RS256 JWT for the configured application on every call and sends
//! it as `Authorization: Bearer <token>`. Tokens are never cached: each
//! request carries a token whose `iat` is the time of the call.
//!
//! # Example
//!
//! ```no_run
//! use kagi_auth::auth::token::SignedTokenAuth;
//! use std::time::Duration;
//!
//! # fn example() -> Result<(), kagi_auth::auth::AuthError> {
//! let pem = std::fs::read("private.key").expect("key file");
//! let auth = SignedTokenAuth::new("aaaaaaaa-bbbb-cccc-dddd-0123456789ab", &pem)?
//!     .with_ttl(Duration::from_secs(300));
//!
//! let token = auth.generate()?;
//! # Ok(())
//! # }
//! ```

use super::{AuthError, AuthKind, AuthScheme, REDACTED};
use crate::request::{ApiRequest, AUTHORIZATION};
use chrono::{DateTime, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::time::Duration;
use tracing::{debug, warn};

/// Default token lifetime (15 minutes)
pub const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(15 * 60);

/// Claims the scheme always sets itself
pub const RESERVED_CLAIMS: [&str; 4] = ["application_id", "iat", "exp", "jti"];

/// Claims carried by every minted token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenClaims {
    pub application_id: String,
    pub iat: i64,
    pub exp: i64,
    pub jti: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Clone)]
pub struct SignedTokenAuth {
    application_id: String,
    key: EncodingKey,
    ttl: Duration,
    extra_claims: Map<String, Value>,
}

impl SignedTokenAuth {
    pub const PRIORITY: u32 = 10;

    /// Build the scheme from an application id and an RSA private key (PEM)
    pub fn new(application_id: impl Into<String>, private_key: &[u8]) -> Result<Self, AuthError> {
        let key = EncodingKey::from_rsa_pem(private_key)
            .map_err(|e| AuthError::InvalidKey(e.to_string()))?;
        Ok(Self {
            application_id: application_id.into(),
            key,
            ttl: DEFAULT_TOKEN_TTL,
            extra_claims: Map::new(),
        })
    }

    /// Set the token lifetime
    #[must_use]
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Add a claim to every minted token
    ///
    /// Reserved claims (`application_id`, `iat`, `exp`, `jti`) are ignored.
    #[must_use]
    pub fn with_claim(mut self, name: impl Into<String>, value: Value) -> Self {
        let name = name.into();
        if RESERVED_CLAIMS.contains(&name.as_str()) {
            warn!(claim = %name, "Ignoring reserved token claim");
        } else {
            self.extra_claims.insert(name, value);
        }
        self
    }

    pub fn application_id(&self) -> &str {
        &self.application_id
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Mint a token issued now
    pub fn generate(&self) -> Result<String, AuthError> {
        self.generate_at(Utc::now())
    }

    /// Mint a token issued at `now`
    pub fn generate_at(&self, now: DateTime<Utc>) -> Result<String, AuthError> {
        let iat = now.timestamp();
        let ttl = i64::try_from(self.ttl.as_secs()).unwrap_or(i64::MAX);
        let claims = TokenClaims {
            application_id: self.application_id.clone(),
            iat,
            exp: iat.saturating_add(ttl),
            jti: uuid::Uuid::new_v4().to_string(),
            extra: self.extra_claims.clone(),
        };

        let token = encode(&Header::new(Algorithm::RS256), &claims, &self.key)
            .map_err(|e| AuthError::TokenGeneration(e.to_string()))?;

        debug!(
            auth.method = "jwt",
            iat = claims.iat,
            exp = claims.exp,
            "Minted signed token"
        );

        #[cfg(feature = "metrics")]
        crate::metrics::record_token_minted();

        Ok(token)
    }
}

impl fmt::Debug for SignedTokenAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignedTokenAuth")
            .field("application_id", &self.application_id)
            .field("private_key", &REDACTED)
            .field("ttl", &self.ttl)
            .field("extra_claims", &self.extra_claims.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl AuthScheme for SignedTokenAuth {
    fn kind(&self) -> AuthKind {
        AuthKind::SignedToken
    }

    fn priority(&self) -> u32 {
        Self::PRIORITY
    }

    fn satisfies(&self) -> &'static [AuthKind] {
        &[AuthKind::SignedToken]
    }

    fn apply_as_header(&self, request: &mut ApiRequest) -> Result<(), AuthError> {
        let token = self.generate()?;
        request.set_header(AUTHORIZATION, format!("Bearer {token}"));
        Ok(())
    }

    // Bearer tokens always travel in the header, whatever the endpoint style
    fn apply_as_params(&self, request: &mut ApiRequest) -> Result<(), AuthError> {
        self.apply_as_header(request)
    }

    fn apply_as_body(&self, request: &mut ApiRequest) -> Result<(), AuthError> {
        self.apply_as_header(request)
    }
}
