/*
 *  Copyright 2025-2026 Colliery Software
 *
 *  Licensed under the Apache License, Version 2.0 (the "License");
 *  you may not use this file except in compliance with the License.
 *  You may obtain a copy of the License at
 *
 *      http://www.apache.org/licenses/LICENSE-2.0
 *
 *  Unless required by applicable law or agreed to in writing, software
 *  distributed under the License is distributed on an "AS IS" BASIS,
 *  WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 *  See the License for the specific language governing permissions and
 *  limitations under the License.
 */

//! Registry and storage configuration.
//!
//! [`RegistryConfig`] is built once at startup and handed to the key manager
//! and signer; nothing reads storage locations from global state.
//!
//! # Construction
//!
//! ```rust,ignore
//! let config = RegistryConfig::builder()
//!     .data_dir("/var/lib/veritag")
//!     .default_rsa_bits(4096)
//!     .build()?;
//! ```
//!
//! Or from a TOML file:
//!
//! ```toml
//! data_dir = "/var/lib/veritag"
//! # Individual paths override the data_dir defaults
//! transaction_path = "/srv/outbox/transaction.json"
//! default_rsa_bits = 3072
//! ```

use crate::crypto::{DEFAULT_RSA_BITS, MAX_RSA_BITS, MIN_RSA_BITS};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default directory holding registries and the transaction file.
pub const DEFAULT_DATA_DIR: &str = "data";

/// File name of the public key registry.
pub const PUBLIC_REGISTRY_FILE: &str = "public_keys.json";

/// File name of the private key registry.
pub const PRIVATE_REGISTRY_FILE: &str = "private_keys.json";

/// File name of the published payload.
pub const TRANSACTION_FILE: &str = "transaction.json";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read configuration file {path}: {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse TOML configuration: {0}")]
    TomlParseError(#[from] toml::de::Error),

    #[error("Invalid RSA key size: {bits} (must be at least {minimum})")]
    InvalidRsaBits { bits: usize, minimum: usize },

    #[error("Invalid RSA key size: {bits} (must be at most {maximum})")]
    RsaBitsTooLarge { bits: usize, maximum: usize },

    #[error("Invalid file path for {field}: path must not be empty")]
    EmptyPath { field: &'static str },
}

/// Storage locations and key generation defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryConfig {
    public_registry_path: PathBuf,
    private_registry_path: PathBuf,
    transaction_path: PathBuf,
    default_rsa_bits: usize,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self::in_dir(DEFAULT_DATA_DIR)
    }
}

impl RegistryConfig {
    /// Creates a new configuration builder with default values.
    pub fn builder() -> RegistryConfigBuilder {
        RegistryConfigBuilder::default()
    }

    /// All files under a single directory, with default file names.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            public_registry_path: dir.join(PUBLIC_REGISTRY_FILE),
            private_registry_path: dir.join(PRIVATE_REGISTRY_FILE),
            transaction_path: dir.join(TRANSACTION_FILE),
            default_rsa_bits: DEFAULT_RSA_BITS,
        }
    }

    /// Load and validate configuration from a TOML file.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadError {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate configuration from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile = toml::from_str(content)?;

        let mut builder = Self::builder();
        if let Some(dir) = file.data_dir {
            builder = builder.data_dir(dir);
        }
        if let Some(path) = file.public_registry_path {
            builder = builder.public_registry_path(path);
        }
        if let Some(path) = file.private_registry_path {
            builder = builder.private_registry_path(path);
        }
        if let Some(path) = file.transaction_path {
            builder = builder.transaction_path(path);
        }
        if let Some(bits) = file.default_rsa_bits {
            builder = builder.default_rsa_bits(bits);
        }

        builder.build()
    }

    /// Path of the author → public key registry.
    pub fn public_registry_path(&self) -> &Path {
        &self.public_registry_path
    }

    /// Path of the author → private key registry.
    pub fn private_registry_path(&self) -> &Path {
        &self.private_registry_path
    }

    /// Path the signer publishes payloads to and the recipient loads from.
    pub fn transaction_path(&self) -> &Path {
        &self.transaction_path
    }

    /// RSA modulus size used when none is requested explicitly.
    pub fn default_rsa_bits(&self) -> usize {
        self.default_rsa_bits
    }

    /// Check the configuration for values the engine cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_rsa_bits < MIN_RSA_BITS {
            return Err(ConfigError::InvalidRsaBits {
                bits: self.default_rsa_bits,
                minimum: MIN_RSA_BITS,
            });
        }
        if self.default_rsa_bits > MAX_RSA_BITS {
            return Err(ConfigError::RsaBitsTooLarge {
                bits: self.default_rsa_bits,
                maximum: MAX_RSA_BITS,
            });
        }

        for (field, path) in [
            ("public_registry_path", &self.public_registry_path),
            ("private_registry_path", &self.private_registry_path),
            ("transaction_path", &self.transaction_path),
        ] {
            if path.as_os_str().is_empty() {
                return Err(ConfigError::EmptyPath { field });
            }
        }

        Ok(())
    }
}

/// On-disk shape of the configuration file.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    data_dir: Option<PathBuf>,
    public_registry_path: Option<PathBuf>,
    private_registry_path: Option<PathBuf>,
    transaction_path: Option<PathBuf>,
    default_rsa_bits: Option<usize>,
}

/// Builder for [`RegistryConfig`].
///
/// Explicit paths win over paths derived from `data_dir`, regardless of the
/// order the builder methods are called in.
#[derive(Debug, Default)]
pub struct RegistryConfigBuilder {
    data_dir: Option<PathBuf>,
    public_registry_path: Option<PathBuf>,
    private_registry_path: Option<PathBuf>,
    transaction_path: Option<PathBuf>,
    default_rsa_bits: Option<usize>,
}

impl RegistryConfigBuilder {
    pub fn data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = Some(dir.into());
        self
    }

    pub fn public_registry_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.public_registry_path = Some(path.into());
        self
    }

    pub fn private_registry_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.private_registry_path = Some(path.into());
        self
    }

    pub fn transaction_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.transaction_path = Some(path.into());
        self
    }

    pub fn default_rsa_bits(mut self, bits: usize) -> Self {
        self.default_rsa_bits = Some(bits);
        self
    }

    /// Build and validate the configuration.
    pub fn build(self) -> Result<RegistryConfig, ConfigError> {
        let base = RegistryConfig::in_dir(
            self.data_dir
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR)),
        );

        let config = RegistryConfig {
            public_registry_path: self
                .public_registry_path
                .unwrap_or(base.public_registry_path),
            private_registry_path: self
                .private_registry_path
                .unwrap_or(base.private_registry_path),
            transaction_path: self.transaction_path.unwrap_or(base.transaction_path),
            default_rsa_bits: self.default_rsa_bits.unwrap_or(base.default_rsa_bits),
        };

        config.validate()?;
        Ok(config)
    }
}
