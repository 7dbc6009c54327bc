//! Configuration loader with environment variable expansion

use super::{Config, ConfigError};
use std::path::Path;
use tracing::debug;

/// Configuration loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let config = Config::from_yaml(&content)?;
        debug!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }
}
