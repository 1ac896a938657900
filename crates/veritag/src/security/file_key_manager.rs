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

//! File-backed key manager implementation.
//!
//! Two JSON registries keyed by author:
//!
//! ```json
//! // public registry
//! { "ACME FOOD JSC": { "public_key": "<base64 PEM>", "fingerprint": "<sha256 hex>" } }
//! // private registry
//! { "ACME FOOD JSC": { "private_key": "<base64 PEM>" } }
//! ```
//!
//! Each registry is loaded fully on every read and rewritten fully on every
//! write. Writes go through a temporary file in the registry's directory that
//! is atomically persisted over the old file, and an in-process lock
//! serializes writers.

use super::audit;
use super::key_manager::{
    fingerprint_of, validate_author, KeyError, KeyManager, PrivateKeyEntry, PublicKeyEntry,
    RegisteredKey,
};
use crate::config::RegistryConfig;
use crate::crypto::{validate_public_key, KeyPair, SigningError};
use crate::json;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use parking_lot::Mutex;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::io::{ErrorKind, Write};
use std::path::Path;
use tempfile::NamedTempFile;

const PUBLIC_KEY_FIELD: &str = "public_key";
const FINGERPRINT_FIELD: &str = "fingerprint";
const PRIVATE_KEY_FIELD: &str = "private_key";

/// Registry contents: author → entry object.
type Registry = Map<String, Value>;

#[derive(Deserialize)]
struct StoredPublicKey {
    public_key: String,
    fingerprint: String,
}

#[derive(Deserialize)]
struct StoredPrivateKey {
    private_key: String,
}

/// File-backed implementation of the [`KeyManager`] trait.
///
/// Does not cache registry contents; every lookup sees the latest file.
pub struct FileKeyManager {
    config: RegistryConfig,
    write_lock: Mutex<()>,
}

impl FileKeyManager {
    /// Creates a key manager over the registries named in `config`.
    pub fn new(config: RegistryConfig) -> Self {
        Self {
            config,
            write_lock: Mutex::new(()),
        }
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Read a registry for writing. A missing or blank file is an empty
    /// registry; anything unparseable is an error.
    fn read_registry(path: &Path) -> Result<Registry, KeyError> {
        let bytes = match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Registry::new()),
            Err(e) => return Err(unavailable(path, e)),
        };

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Registry::new());
        }

        serde_json::from_slice(&bytes).map_err(|e| unavailable(path, e))
    }

    /// Read a registry for lookup, treating any failure as an empty registry.
    fn load_for_lookup(path: &Path) -> Registry {
        Self::read_registry(path).unwrap_or_else(|e| {
            audit::log_registry_unavailable(path, &e.to_string());
            Registry::new()
        })
    }

    fn write_registry(path: &Path, registry: &Registry) -> Result<(), KeyError> {
        let bytes =
            json::to_vec_indented(registry).map_err(|e| KeyError::Serialization(e.to_string()))?;

        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(dir).map_err(|e| unavailable(path, e))?;

        let mut file = NamedTempFile::new_in(dir).map_err(|e| unavailable(path, e))?;
        file.write_all(&bytes).map_err(|e| unavailable(path, e))?;
        file.as_file().sync_all().map_err(|e| unavailable(path, e))?;
        file.persist(path).map_err(|e| unavailable(path, e.error))?;

        tracing::debug!(registry_path = %path.display(), "Key registry written");
        Ok(())
    }

    /// Put a registry back after a failed paired write: rewrite the previous
    /// contents, or remove the file if there was none.
    fn restore_registry(path: &Path, previous: Option<&Registry>) {
        let restored = match previous {
            Some(registry) => Self::write_registry(path, registry),
            None => std::fs::remove_file(path).map_err(|e| unavailable(path, e)),
        };

        match restored {
            Ok(()) => tracing::warn!(registry_path = %path.display(), "Key registry rolled back"),
            Err(e) => audit::log_registry_unavailable(path, &format!("rollback failed: {}", e)),
        }
    }
}

impl KeyManager for FileKeyManager {
    fn register(&self, author: &str, key_pair: &KeyPair) -> Result<RegisteredKey, KeyError> {
        validate_author(author)?;
        let algorithm =
            validate_public_key(&key_pair.public_key_pem).map_err(KeyError::InvalidKey)?;
        if algorithm != key_pair.algorithm {
            return Err(KeyError::InvalidKey(SigningError::KeyDecode(format!(
                "{} key pair carries a {} public key",
                key_pair.algorithm, algorithm
            ))));
        }

        let fingerprint = fingerprint_of(&key_pair.public_key_pem);
        let public_path = self.config.public_registry_path();
        let private_path = self.config.private_registry_path();

        let _guard = self.write_lock.lock();

        // Both registries must be readable before either is touched.
        let mut public = Self::read_registry(public_path)?;
        let mut private = Self::read_registry(private_path)?;
        let private_existed = private_path.exists();
        let previous_private = private.clone();

        let replaced = upsert(
            &mut public,
            author,
            &[
                (PUBLIC_KEY_FIELD, BASE64.encode(&key_pair.public_key_pem)),
                (FINGERPRINT_FIELD, fingerprint.clone()),
            ],
        );
        upsert(
            &mut private,
            author,
            &[(PRIVATE_KEY_FIELD, BASE64.encode(&key_pair.private_key_pem))],
        );

        Self::write_registry(private_path, &private)?;
        if let Err(e) = Self::write_registry(public_path, &public) {
            Self::restore_registry(private_path, private_existed.then_some(&previous_private));
            return Err(e);
        }

        audit::log_key_registered(author, &fingerprint, replaced);

        Ok(RegisteredKey {
            author: author.to_string(),
            algorithm: key_pair.algorithm,
            fingerprint,
            replaced,
        })
    }

    fn lookup_public(&self, author: &str) -> Option<PublicKeyEntry> {
        let path = self.config.public_registry_path();
        let value = Self::load_for_lookup(path).remove(author)?;

        let stored: StoredPublicKey = match serde_json::from_value(value) {
            Ok(stored) => stored,
            Err(e) => {
                tracing::debug!(author = %author, error = %e, "Malformed public registry entry");
                return None;
            }
        };

        let public_key_pem = decode_pem_field(author, &stored.public_key)?;
        let fingerprint = fingerprint_of(&public_key_pem);

        if fingerprint != stored.fingerprint {
            audit::log_registry_unavailable(
                path,
                &format!("fingerprint mismatch for author '{}'", author),
            );
            return None;
        }

        Some(PublicKeyEntry {
            author: author.to_string(),
            public_key_pem,
            fingerprint,
        })
    }

    fn lookup_private(&self, author: &str) -> Option<PrivateKeyEntry> {
        let path = self.config.private_registry_path();
        let value = Self::load_for_lookup(path).remove(author)?;

        let stored: StoredPrivateKey = match serde_json::from_value(value) {
            Ok(stored) => stored,
            Err(e) => {
                tracing::debug!(author = %author, error = %e, "Malformed private registry entry");
                return None;
            }
        };

        let private_key_pem = decode_pem_field(author, &stored.private_key)?;

        Some(PrivateKeyEntry {
            author: author.to_string(),
            private_key_pem,
        })
    }

    fn list_authors(&self) -> Vec<String> {
        let mut authors: Vec<String> = Self::load_for_lookup(self.config.public_registry_path())
            .into_iter()
            .map(|(author, _)| author)
            .collect();
        authors.sort();
        authors
    }
}

/// Insert or merge `fields` into the entry for `author`.
///
/// Returns whether an entry already existed.
fn upsert(registry: &mut Registry, author: &str, fields: &[(&str, String)]) -> bool {
    let replaced = registry.contains_key(author);

    let entry = registry
        .entry(author)
        .or_insert_with(|| Value::Object(Map::new()));
    if !entry.is_object() {
        *entry = Value::Object(Map::new());
    }
    if let Value::Object(map) = entry {
        for (name, value) in fields {
            map.insert((*name).to_string(), Value::String(value.clone()));
        }
    }

    replaced
}

fn decode_pem_field(author: &str, encoded: &str) -> Option<String> {
    let bytes = match BASE64.decode(encoded) {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::debug!(author = %author, error = %e, "Registry key is not valid base64");
            return None;
        }
    };

    match String::from_utf8(bytes) {
        Ok(pem) => Some(pem),
        Err(e) => {
            tracing::debug!(author = %author, error = %e, "Registry key is not UTF-8 text");
            None
        }
    }
}

fn unavailable(path: &Path, reason: impl std::fmt::Display) -> KeyError {
    KeyError::RegistryUnavailable {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    }
}
