//! Request signing protocol
//!
//! Signs outbound parameter sets and verifies inbound ones.
//!
//! # Signing
//!
//! [`sign`] adds a `timestamp` parameter (unix seconds) and then a
//! `signature` parameter computed over every other parameter, `timestamp`
//! included.
//!
//! # Verification
//!
//! [`verify`] rejects a parameter set when:
//! - `signature` is missing,
//! - `timestamp` is missing, not an integer, or more than
//!   [`MAX_ALLOWABLE_TIME_DELTA_MS`] away from the verifier's clock,
//! - the recomputed digest differs from the supplied one (constant time).
//!
//! Verification returns a boolean. Callers reject the request themselves.
//!
//! # Example
//!
//! ```
//! use kagi_auth::signing::{self, digest::{HashType, Params}};
//!
//! let mut params = Params::new();
//! params.insert("to".into(), "447700900000".into());
//! signing::sign(&mut params, "shh", HashType::Md5).unwrap();
//!
//! assert!(params.contains_key("timestamp"));
//! assert!(signing::verify(&params, "shh", HashType::Md5));
//! ```

pub mod digest;

use crate::auth::AuthError;
use chrono::{DateTime, Utc};
use self::digest::{HashType, Params, SignatureMaterial, SIGNATURE_PARAM, TIMESTAMP_PARAM};
use serde_json::{Map, Value};
use subtle::ConstantTimeEq;
use tracing::debug;

/// Maximum allowed clock drift between signer and verifier (5 minutes)
pub const MAX_ALLOWABLE_TIME_DELTA_MS: u64 = 5 * 60 * 1000;

/// Result of checking an inbound signed parameter set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verification {
    Valid,
    MissingSignature,
    MissingTimestamp,
    InvalidTimestamp,
    StaleTimestamp,
    Mismatch,
}

impl Verification {
    pub fn is_valid(&self) -> bool {
        matches!(self, Verification::Valid)
    }

    /// Label used in logs and metrics
    pub fn as_str(&self) -> &'static str {
        match self {
            Verification::Valid => "valid",
            Verification::MissingSignature => "missing_signature",
            Verification::MissingTimestamp => "missing_timestamp",
            Verification::InvalidTimestamp => "invalid_timestamp",
            Verification::StaleTimestamp => "stale_timestamp",
            Verification::Mismatch => "mismatch",
        }
    }
}

/// Sign `params` in place using the current time
pub fn sign(params: &mut Params, secret: &str, hash_type: HashType) -> Result<(), AuthError> {
    sign_at(params, secret, hash_type, Utc::now().timestamp())
}

/// Sign `params` in place with an explicit `timestamp` (unix seconds)
pub fn sign_at(
    params: &mut Params,
    secret: &str,
    hash_type: HashType,
    timestamp: i64,
) -> Result<(), AuthError> {
    params.insert(TIMESTAMP_PARAM.to_string(), timestamp.to_string());
    let material = SignatureMaterial::compute(params, secret, hash_type)?;
    debug!(
        hash_type = %hash_type,
        canonical_len = material.canonical().len(),
        "Signed request parameters"
    );
    params.insert(SIGNATURE_PARAM.to_string(), material.into_digest());
    Ok(())
}

/// Sign the scalar properties of a JSON body in place using the current time
pub fn sign_body(
    body: &mut Map<String, Value>,
    secret: &str,
    hash_type: HashType,
) -> Result<(), AuthError> {
    sign_body_at(body, secret, hash_type, Utc::now().timestamp())
}

/// Sign a JSON body in place with an explicit `timestamp` (unix seconds).
///
/// `null` properties are left out of the digest. Strings are used verbatim,
/// every other value by its JSON text.
pub fn sign_body_at(
    body: &mut Map<String, Value>,
    secret: &str,
    hash_type: HashType,
    timestamp: i64,
) -> Result<(), AuthError> {
    body.insert(
        TIMESTAMP_PARAM.to_string(),
        Value::String(timestamp.to_string()),
    );
    let pairs = body_pairs(body);
    let material = SignatureMaterial::from_pairs(
        pairs.iter().map(|(k, v)| (k.as_str(), v.as_deref())),
        secret,
        hash_type,
    )?;
    body.insert(
        SIGNATURE_PARAM.to_string(),
        Value::String(material.into_digest()),
    );
    Ok(())
}

fn body_pairs(body: &Map<String, Value>) -> Vec<(String, Option<String>)> {
    body.iter()
        .map(|(name, value)| {
            let value = match value {
                Value::Null => None,
                Value::String(s) => Some(s.clone()),
                other => Some(other.to_string()),
            };
            (name.clone(), value)
        })
        .collect()
}

/// Verify `params` against the current time
pub fn verify(params: &Params, secret: &str, hash_type: HashType) -> bool {
    verify_at(params, secret, hash_type, Utc::now())
}

/// Verify `params` against an explicit clock reading
pub fn verify_at(params: &Params, secret: &str, hash_type: HashType, now: DateTime<Utc>) -> bool {
    check_at(params, secret, hash_type, now).is_valid()
}

/// Verify `params` and report why a rejection happened
pub fn check_at(
    params: &Params,
    secret: &str,
    hash_type: HashType,
    now: DateTime<Utc>,
) -> Verification {
    let outcome = evaluate(params, secret, hash_type, now);
    debug!(result = outcome.as_str(), "Checked signed request parameters");

    #[cfg(feature = "metrics")]
    crate::metrics::record_signature_verification(outcome.as_str());

    outcome
}

fn evaluate(params: &Params, secret: &str, hash_type: HashType, now: DateTime<Utc>) -> Verification {
    let Some(supplied) = params.get(SIGNATURE_PARAM) else {
        return Verification::MissingSignature;
    };
    let Some(timestamp) = params.get(TIMESTAMP_PARAM) else {
        return Verification::MissingTimestamp;
    };
    let Some(timestamp_ms) = timestamp
        .parse::<i64>()
        .ok()
        .and_then(|secs| secs.checked_mul(1000))
    else {
        return Verification::InvalidTimestamp;
    };

    if now.timestamp_millis().abs_diff(timestamp_ms) > MAX_ALLOWABLE_TIME_DELTA_MS {
        return Verification::StaleTimestamp;
    }

    let expected = match SignatureMaterial::compute(params, secret, hash_type) {
        Ok(material) => material,
        Err(e) => {
            debug!(error = %e, "Could not recompute request signature");
            return Verification::Mismatch;
        }
    };

    if bool::from(expected.digest().as_bytes().ct_eq(supplied.as_bytes())) {
        Verification::Valid
    } else {
        Verification::Mismatch
    }
}
