//! Kagi Auth Library
//!
//! Credential negotiation and request signing for API clients.
//!
//! # Features
//!
//! - **Multiple Schemes**: signed tokens (RS256), signed parameters, API key
//!   and secret as a `Basic` header or plain parameters
//! - **Negotiation**: each call picks the most preferred held scheme the
//!   endpoint accepts
//! - **Request Signing**: digest-signed parameters with a replay window and
//!   constant-time verification
//! - **Inbound Verification**: HS256/RS256 bearer tokens on webhooks
//!
//! # Example
//!
//! ```
//! use kagi_auth::auth::{AuthKind, CredentialMaterial};
//! use kagi_auth::signing::digest::HashType;
//! use kagi_auth::{ApiRequest, AuthStyle, RequestAuthenticator};
//!
//! let auth = CredentialMaterial::new()
//!     .with_api_key("key")
//!     .with_signature_secret("signing-secret", HashType::HmacSha256)
//!     .build()
//!     .unwrap();
//!
//! let request = auth
//!     .enrich_for_one_of(
//!         &[AuthKind::Signature],
//!         AuthStyle::Params,
//!         ApiRequest::new("GET", "/sms/json").with_param("to", "447700900000"),
//!     )
//!     .unwrap();
//! assert!(request.param("signature").is_some());
//! ```

pub mod auth;
pub mod config;
#[cfg(feature = "metrics")]
pub mod metrics;
pub mod request;
pub mod signing;
pub mod telemetry;

// Re-export commonly used types
pub use auth::{AuthCollection, AuthError, AuthKind, CredentialMaterial};
pub use config::Config;
pub use request::{ApiRequest, AuthStyle, RequestAuthenticator};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
