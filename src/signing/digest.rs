//! Canonical parameter strings and keyed digests
//!
//! The canonical form of a parameter set is built by:
//! - dropping the `signature` parameter and any parameter whose value is
//!   null or blank,
//! - sorting the remainder by name (byte order),
//! - replacing every `=` and `&` in names and values with `_`,
//! - emitting `&name=value` for each pair, the first pair included.
//!
//! ```
//! use kagi_auth::signing::digest::{canonical_string, HashType};
//! use std::collections::BTreeMap;
//!
//! let mut params = BTreeMap::new();
//! params.insert("to".to_string(), "123".to_string());
//! params.insert("from".to_string(), "456".to_string());
//!
//! let canonical = canonical_string(&params);
//! assert_eq!(canonical, "&from=456&to=123");
//!
//! let digest = HashType::Md5.digest(&canonical, "shh").unwrap();
//! assert_eq!(digest.len(), 32);
//! ```

use crate::auth::AuthError;
use hmac::digest::KeyInit;
use hmac::{Hmac, Mac};
use md5::{Digest, Md5};
use serde::{Deserialize, Serialize};
use sha1::Sha1;
use sha2::{Sha256, Sha512};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Name of the parameter carrying the digest
pub const SIGNATURE_PARAM: &str = "signature";

/// Name of the parameter carrying the signing time (unix seconds)
pub const TIMESTAMP_PARAM: &str = "timestamp";

/// Parameter set used for query strings and form bodies
pub type Params = BTreeMap<String, String>;

/// Digest algorithm used for signed parameters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HashType {
    /// Plain MD5 over the canonical string with the secret appended
    #[default]
    Md5,
    HmacMd5,
    HmacSha1,
    HmacSha256,
    HmacSha512,
}

impl HashType {
    /// Configuration name of the algorithm
    pub fn as_str(&self) -> &'static str {
        match self {
            HashType::Md5 => "md5",
            HashType::HmacMd5 => "hmac-md5",
            HashType::HmacSha1 => "hmac-sha1",
            HashType::HmacSha256 => "hmac-sha256",
            HashType::HmacSha512 => "hmac-sha512",
        }
    }

    /// Compute the lowercase hex digest of `canonical` keyed by `secret`.
    ///
    /// `Md5` hashes `canonical` followed by the raw secret. The HMAC variants
    /// use the secret as the MAC key and hash `canonical` alone.
    pub fn digest(&self, canonical: &str, secret: &str) -> Result<String, AuthError> {
        match self {
            HashType::Md5 => {
                let mut hasher = Md5::new();
                hasher.update(canonical.as_bytes());
                hasher.update(secret.as_bytes());
                Ok(hex::encode(hasher.finalize()))
            }
            HashType::HmacMd5 => hmac_hex::<Hmac<Md5>>(canonical, secret),
            HashType::HmacSha1 => hmac_hex::<Hmac<Sha1>>(canonical, secret),
            HashType::HmacSha256 => hmac_hex::<Hmac<Sha256>>(canonical, secret),
            HashType::HmacSha512 => hmac_hex::<Hmac<Sha512>>(canonical, secret),
        }
    }
}

impl fmt::Display for HashType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HashType {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "md5" => Ok(HashType::Md5),
            "hmac-md5" | "hmacmd5" => Ok(HashType::HmacMd5),
            "hmac-sha1" | "hmacsha1" => Ok(HashType::HmacSha1),
            "hmac-sha256" | "hmacsha256" => Ok(HashType::HmacSha256),
            "hmac-sha512" | "hmacsha512" => Ok(HashType::HmacSha512),
            other => Err(AuthError::InvalidCredentials(format!(
                "Unknown signature method '{other}'"
            ))),
        }
    }
}

fn hmac_hex<M: Mac + KeyInit>(canonical: &str, secret: &str) -> Result<String, AuthError> {
    let mut mac = <M as Mac>::new_from_slice(secret.as_bytes())
        .map_err(|e| AuthError::Digest(e.to_string()))?;
    mac.update(canonical.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Replace the characters that would make pair boundaries ambiguous
fn clean(s: &str) -> String {
    s.replace(|c: char| c == '=' || c == '&', "_")
}

/// Blank means empty after trimming ASCII control characters and spaces
/// (everything up to U+0020). Other Unicode whitespace is kept.
fn is_blank(value: &str) -> bool {
    value.trim_matches(|c: char| c <= ' ').is_empty()
}

/// Build the canonical string from `(name, value)` pairs.
///
/// `None` stands for a null value. If a name appears more than once the last
/// value wins.
pub fn canonicalize<'a, I>(pairs: I) -> String
where
    I: IntoIterator<Item = (&'a str, Option<&'a str>)>,
{
    let sorted: BTreeMap<&str, &str> = pairs
        .into_iter()
        .filter(|(name, _)| *name != SIGNATURE_PARAM)
        .filter_map(|(name, value)| match value {
            Some(v) if !is_blank(v) => Some((name, v)),
            _ => None,
        })
        .collect();

    let mut canonical = String::new();
    for (name, value) in sorted {
        canonical.push('&');
        canonical.push_str(&clean(name));
        canonical.push('=');
        canonical.push_str(&clean(value));
    }
    canonical
}

/// Canonical string of a plain parameter map
pub fn canonical_string(params: &Params) -> String {
    canonicalize(params.iter().map(|(k, v)| (k.as_str(), Some(v.as_str()))))
}

/// Canonical input and digest for one signing or verification call.
///
/// The canonical string never contains the secret, so the value is safe to
/// log at debug level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureMaterial {
    canonical: String,
    digest: String,
}

impl SignatureMaterial {
    /// Canonicalize `pairs` and digest them with `secret`
    pub fn from_pairs<'a, I>(pairs: I, secret: &str, hash_type: HashType) -> Result<Self, AuthError>
    where
        I: IntoIterator<Item = (&'a str, Option<&'a str>)>,
    {
        let canonical = canonicalize(pairs);
        let digest = hash_type.digest(&canonical, secret)?;
        Ok(Self { canonical, digest })
    }

    /// Canonicalize a parameter map and digest it with `secret`
    pub fn compute(params: &Params, secret: &str, hash_type: HashType) -> Result<Self, AuthError> {
        Self::from_pairs(
            params.iter().map(|(k, v)| (k.as_str(), Some(v.as_str()))),
            secret,
            hash_type,
        )
    }

    pub fn canonical(&self) -> &str {
        &self.canonical
    }

    pub fn digest(&self) -> &str {
        &self.digest
    }

    pub fn into_digest(self) -> String {
        self.digest
    }
}
