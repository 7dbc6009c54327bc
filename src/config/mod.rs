//! Configuration module
//!
//! Handles loading and parsing of YAML client configuration with support for
//! environment variable expansion and validation.
//!
//! ```yaml
//! credentials:
//!   api_key: ${KAGI_API_KEY}
//!   api_secret: ${KAGI_API_SECRET}
//!   signature_secret: ${KAGI_SIGNATURE_SECRET:-}
//!   signature_method: hmac-sha256
//!   application_id: ${KAGI_APPLICATION_ID}
//!   private_key_path: /etc/kagi/private.key
//! token:
//!   ttl_seconds: 900
//! logging:
//!   level: info
//!   json: true
//! ```

use crate::auth::CredentialMaterial;
use crate::signing::digest::HashType;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::Duration;
use thiserror::Error;

mod loader;

pub use loader::ConfigLoader;

// ============================================================================
// Environment Variable Expansion
// ============================================================================

fn env_var_pattern() -> &'static regex_lite::Regex {
    static PATTERN: OnceLock<regex_lite::Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        regex_lite::Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)(?::-([^}]*))?\}")
            .expect("environment variable pattern compiles")
    })
}

/// Expand environment variables in a string.
///
/// Supports two syntaxes:
/// - `${VAR_NAME}` keeps the placeholder if the variable is not set
/// - `${VAR_NAME:-default}` falls back to `default` (which may be empty)
pub(crate) fn expand_env_vars(s: &str) -> String {
    let mut last_match = 0;
    let mut result = String::with_capacity(s.len());

    for cap in env_var_pattern().captures_iter(s) {
        let (Some(full_match), Some(var_name)) = (cap.get(0), cap.get(1)) else {
            continue;
        };

        result.push_str(&s[last_match..full_match.start()]);

        let value = match std::env::var(var_name.as_str()) {
            Ok(val) => val,
            Err(_) => match cap.get(2) {
                Some(default) => default.as_str().to_string(),
                None => full_match.as_str().to_string(),
            },
        };
        result.push_str(&value);

        last_match = full_match.end();
    }

    result.push_str(&s[last_match..]);
    result
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub credentials: CredentialsConfig,
    #[serde(default)]
    pub token: TokenConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        ConfigLoader::load(path)
    }

    /// Parse configuration from a YAML string, expanding environment variables
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_yaml::from_str(&expand_env_vars(content))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        let credentials = &self.credentials;

        if credentials.private_key.is_some() && credentials.private_key_path.is_some() {
            return Err(ConfigError::ValidationError(
                "credentials.private_key and credentials.private_key_path are mutually exclusive"
                    .into(),
            ));
        }

        if self.token.ttl_seconds == 0 {
            return Err(ConfigError::ValidationError(
                "token.ttl_seconds must be greater than 0".into(),
            ));
        }

        if !matches!(
            self.logging.level.to_ascii_lowercase().as_str(),
            "trace" | "debug" | "info" | "warn" | "error"
        ) {
            return Err(ConfigError::ValidationError(format!(
                "Invalid logging.level '{}': expected trace, debug, info, warn or error",
                self.logging.level
            )));
        }

        Ok(())
    }

    /// Convert the credentials section into material for building schemes
    ///
    /// Reads `private_key_path` when set. Companion-field checks are left to
    /// [`CredentialMaterial::validate`].
    pub fn credential_material(&self) -> Result<CredentialMaterial, ConfigError> {
        let credentials = &self.credentials;

        let private_key = match (&credentials.private_key, &credentials.private_key_path) {
            (Some(pem), _) => Some(pem.clone().into_bytes()),
            (None, Some(path)) => Some(std::fs::read(path)?),
            (None, None) => None,
        };

        Ok(CredentialMaterial {
            api_key: credentials.api_key.clone(),
            api_secret: credentials.api_secret.clone(),
            signature_secret: credentials.signature_secret.clone(),
            hash_type: credentials.signature_method,
            application_id: credentials.application_id.clone(),
            private_key,
            token_ttl: Duration::from_secs(self.token.ttl_seconds),
            token_claims: self.token.claims.clone(),
        })
    }
}

/// Credential material as written in the config file
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct CredentialsConfig {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub api_secret: Option<String>,
    #[serde(default)]
    pub signature_secret: Option<String>,
    /// Digest used for signed parameters. Default: md5
    #[serde(default)]
    pub signature_method: HashType,
    #[serde(default)]
    pub application_id: Option<String>,
    /// Inline PEM private key
    #[serde(default)]
    pub private_key: Option<String>,
    /// Path to a PEM private key
    #[serde(default)]
    pub private_key_path: Option<PathBuf>,
}

impl fmt::Debug for CredentialsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redacted = |value: &Option<String>| value.as_ref().map(|_| crate::auth::REDACTED);
        f.debug_struct("CredentialsConfig")
            .field("api_key", &self.api_key)
            .field("api_secret", &redacted(&self.api_secret))
            .field("signature_secret", &redacted(&self.signature_secret))
            .field("signature_method", &self.signature_method)
            .field("application_id", &self.application_id)
            .field("private_key", &redacted(&self.private_key))
            .field("private_key_path", &self.private_key_path)
            .finish()
    }
}

/// Signed token settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenConfig {
    /// Lifetime of each minted token. Default: 900
    #[serde(default = "default_token_ttl")]
    pub ttl_seconds: u64,

    /// Extra claims added to every minted token
    #[serde(default)]
    pub claims: Map<String, Value>,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            ttl_seconds: default_token_ttl(),
            claims: Map::new(),
        }
    }
}

fn default_token_ttl() -> u64 {
    crate::auth::token::DEFAULT_TOKEN_TTL.as_secs()
}

/// Log output settings
///
/// `RUST_LOG` takes precedence over `level` when set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default: "info"
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of plain text. Default: true
    #[serde(default = "default_log_json")]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: default_log_json(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_json() -> bool {
    true
}
