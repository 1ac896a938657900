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

//! Key manager trait and associated types.
//!
//! The [`KeyManager`] trait is the trust anchor: it maps author identities to
//! the key pair registered for them. Verification only ever trusts a public
//! key whose fingerprint matches the entry registered for the declared author.

use super::audit;
use crate::crypto::{
    compute_key_fingerprint, detect_algorithm, generate_keypair, KeyPair, KeyParams,
    SignatureAlgorithm, SigningError,
};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during key management operations.
#[derive(Debug, Error)]
pub enum KeyError {
    #[error("Author must not be empty")]
    EmptyAuthor,

    #[error("Key registry unavailable at {path}: {reason}")]
    RegistryUnavailable { path: PathBuf, reason: String },

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Key generation failed: {0}")]
    KeyGeneration(#[from] SigningError),

    #[error("Key cannot be registered: {0}")]
    InvalidKey(SigningError),
}

/// Public registry entry for an author.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicKeyEntry {
    pub author: String,
    /// SubjectPublicKeyInfo PEM text
    pub public_key_pem: String,
    /// SHA256 hex fingerprint of the PEM text
    pub fingerprint: String,
}

impl PublicKeyEntry {
    /// Algorithm of the stored key, if it decodes as a supported key type.
    pub fn algorithm(&self) -> Option<SignatureAlgorithm> {
        detect_algorithm(&self.public_key_pem)
    }
}

/// Private registry entry for an author.
#[derive(Clone)]
pub struct PrivateKeyEntry {
    pub author: String,
    /// PKCS#8 PEM text
    pub private_key_pem: String,
}

impl fmt::Debug for PrivateKeyEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrivateKeyEntry")
            .field("author", &self.author)
            .field("private_key_pem", &"<redacted>")
            .finish()
    }
}

/// Summary of a successful registration (excludes key material).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisteredKey {
    pub author: String,
    pub algorithm: SignatureAlgorithm,
    pub fingerprint: String,
    /// Whether an existing entry for the author was overwritten
    pub replaced: bool,
}

/// Trait for registering and looking up author key pairs.
///
/// Lookups are total: a missing or unreadable registry, an unknown author,
/// or an inconsistent entry all yield `None`. Only the write path reports
/// storage problems as errors.
pub trait KeyManager: Send + Sync {
    /// Store a key pair under `author` in both the public and private registry.
    ///
    /// An existing entry for `author` is overwritten, never duplicated.
    ///
    /// # Errors
    ///
    /// `KeyError::EmptyAuthor` for an empty or whitespace-only author, and
    /// `KeyError::RegistryUnavailable` if the existing registry cannot be read
    /// or the new one cannot be written.
    fn register(&self, author: &str, key_pair: &KeyPair) -> Result<RegisteredKey, KeyError>;

    /// Public key and fingerprint registered for `author`.
    fn lookup_public(&self, author: &str) -> Option<PublicKeyEntry>;

    /// Private key registered for `author`.
    fn lookup_private(&self, author: &str) -> Option<PrivateKeyEntry>;

    /// Authors present in the public registry, sorted.
    fn list_authors(&self) -> Vec<String>;

    /// Generate a fresh key pair and register it under `author`.
    ///
    /// The author is checked before generation so a bad request never pays
    /// for RSA key generation.
    fn generate_and_register(
        &self,
        author: &str,
        params: KeyParams,
    ) -> Result<RegisteredKey, KeyError> {
        validate_author(author)?;

        let key_pair = generate_keypair(params)?;
        audit::log_key_generated(key_pair.algorithm.as_str(), &key_pair.fingerprint());

        self.register(author, &key_pair)
    }
}

impl<K: KeyManager + ?Sized> KeyManager for &K {
    fn register(&self, author: &str, key_pair: &KeyPair) -> Result<RegisteredKey, KeyError> {
        (**self).register(author, key_pair)
    }

    fn lookup_public(&self, author: &str) -> Option<PublicKeyEntry> {
        (**self).lookup_public(author)
    }

    fn lookup_private(&self, author: &str) -> Option<PrivateKeyEntry> {
        (**self).lookup_private(author)
    }

    fn list_authors(&self) -> Vec<String> {
        (**self).list_authors()
    }
}

/// Reject empty or whitespace-only author identities.
pub(crate) fn validate_author(author: &str) -> Result<(), KeyError> {
    if author.trim().is_empty() {
        return Err(KeyError::EmptyAuthor);
    }
    Ok(())
}

/// Fingerprint of a public key PEM as stored in the registry.
pub(crate) fn fingerprint_of(public_key_pem: &str) -> String {
    compute_key_fingerprint(public_key_pem.as_bytes())
}
