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

//! Payload signing.
//!
//! This module provides:
//! - [`sign_product`], the signing primitive over explicit key material
//! - [`PayloadSigner`] trait for signing with registered keys
//! - [`RegistryPayloadSigner`], backed by any [`KeyManager`]

use super::audit;
use super::key_manager::KeyManager;
use super::payload::{encode_public_key, PayloadError, SignedPayload};
use crate::crypto::{
    canonicalize_metadata, compute_key_fingerprint, sha256_hex, sign_message, verify_message,
    ProductMetadata, SignatureAlgorithm, SigningError,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Timestamp format of `SignedPayload::signed_at`.
pub const SIGNED_AT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Errors that can occur while signing a payload.
#[derive(Debug, Error)]
pub enum PayloadSignError {
    #[error("No key registered for author: {0}")]
    KeyNotFound(String),

    #[error("Key type of author '{0}' could not be determined")]
    UnknownKeyType(String),

    #[error("Public key does not match the private key used for signing")]
    KeyMismatch,

    #[error("Signing failed: {0}")]
    Signing(#[from] SigningError),

    #[error("Failed to read metadata file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid metadata file: {0}")]
    InvalidMetadataFile(String),

    #[error(transparent)]
    Payload(#[from] PayloadError),
}

/// Sign product metadata with explicit key material.
///
/// Canonicalizes the metadata, digests the canonical bytes, signs them and
/// assembles the payload. The signature is checked against `public_key_pem`
/// before returning, so a payload never names a key that did not sign it.
///
/// # Errors
///
/// `PayloadSignError::Signing` if the key material cannot be used with
/// `algorithm`, `PayloadSignError::KeyMismatch` if the public key does not
/// belong to the private key.
pub fn sign_product(
    metadata: &ProductMetadata,
    private_key_pem: &str,
    public_key_pem: &str,
    algorithm: SignatureAlgorithm,
) -> Result<SignedPayload, PayloadSignError> {
    let message = canonicalize_metadata(metadata)?;
    let digest = sha256_hex(&message);

    let signature = sign_message(algorithm, private_key_pem, &message)?;

    match verify_message(algorithm, public_key_pem, &message, &signature) {
        Ok(()) => {}
        Err(SigningError::VerificationFailed) => return Err(PayloadSignError::KeyMismatch),
        Err(e) => return Err(e.into()),
    }

    Ok(SignedPayload {
        metadata: metadata.clone(),
        digest,
        signature: BASE64.encode(&signature),
        pubkey: encode_public_key(public_key_pem),
        pubkey_fingerprint: compute_key_fingerprint(public_key_pem.as_bytes()),
        algorithm,
        signed_at: chrono::Local::now().format(SIGNED_AT_FORMAT).to_string(),
    })
}

/// Trait for producing and publishing signed payloads.
pub trait PayloadSigner: Send + Sync {
    /// Sign metadata with the key pair registered for `author`.
    ///
    /// # Arguments
    ///
    /// * `author` - Registry identity whose keys sign the payload
    /// * `metadata` - Product record to sign
    /// * `algorithm` - Algorithm to use; `None` uses the registered key's type
    fn sign_with_registry_key(
        &self,
        author: &str,
        metadata: &ProductMetadata,
        algorithm: Option<SignatureAlgorithm>,
    ) -> Result<SignedPayload, PayloadSignError>;

    /// Sign metadata with key material supplied by the caller.
    fn sign_with_raw_key(
        &self,
        metadata: &ProductMetadata,
        private_key_pem: &str,
        public_key_pem: &str,
        algorithm: SignatureAlgorithm,
    ) -> Result<SignedPayload, PayloadSignError>;

    /// Write a payload to the transaction file and return its path.
    fn publish(&self, payload: &SignedPayload) -> Result<PathBuf, PayloadSignError>;
}

/// Signer using keys from a [`KeyManager`] registry.
pub struct RegistryPayloadSigner<K> {
    key_manager: K,
    transaction_path: PathBuf,
}

impl<K: KeyManager> RegistryPayloadSigner<K> {
    /// Create a signer publishing to `transaction_path`.
    pub fn new(key_manager: K, transaction_path: impl Into<PathBuf>) -> Self {
        Self {
            key_manager,
            transaction_path: transaction_path.into(),
        }
    }

    pub fn key_manager(&self) -> &K {
        &self.key_manager
    }

    pub fn transaction_path(&self) -> &Path {
        &self.transaction_path
    }

    /// Sign the JSON metadata object stored at `path`.
    pub fn sign_metadata_file(
        &self,
        author: &str,
        path: &Path,
        algorithm: Option<SignatureAlgorithm>,
    ) -> Result<SignedPayload, PayloadSignError> {
        let json = std::fs::read_to_string(path)?;
        let metadata = ProductMetadata::from_json_str(&json).map_err(|e| {
            PayloadSignError::InvalidMetadataFile(format!("{}: {}", path.display(), e))
        })?;
        self.sign_with_registry_key(author, &metadata, algorithm)
    }

    fn sign_registered(
        &self,
        author: &str,
        metadata: &ProductMetadata,
        algorithm: Option<SignatureAlgorithm>,
    ) -> Result<SignedPayload, PayloadSignError> {
        let public = self
            .key_manager
            .lookup_public(author)
            .ok_or_else(|| PayloadSignError::KeyNotFound(author.to_string()))?;
        let private = self
            .key_manager
            .lookup_private(author)
            .ok_or_else(|| PayloadSignError::KeyNotFound(author.to_string()))?;

        let algorithm = match algorithm {
            Some(algorithm) => algorithm,
            None => public
                .algorithm()
                .ok_or_else(|| PayloadSignError::UnknownKeyType(author.to_string()))?,
        };

        if metadata.manufacturer() != Some(author) {
            tracing::warn!(
                author = %author,
                manufacturer = metadata.manufacturer().unwrap_or("<missing>"),
                "Signing author differs from metadata manufacturer; authentication will fail"
            );
        }

        sign_product(
            metadata,
            &private.private_key_pem,
            &public.public_key_pem,
            algorithm,
        )
    }
}

impl<K: KeyManager> PayloadSigner for RegistryPayloadSigner<K> {
    fn sign_with_registry_key(
        &self,
        author: &str,
        metadata: &ProductMetadata,
        algorithm: Option<SignatureAlgorithm>,
    ) -> Result<SignedPayload, PayloadSignError> {
        match self.sign_registered(author, metadata, algorithm) {
            Ok(payload) => {
                audit::log_payload_signed(
                    author,
                    &payload.digest,
                    &payload.pubkey_fingerprint,
                    payload.algorithm.as_str(),
                );
                Ok(payload)
            }
            Err(e) => {
                audit::log_payload_sign_failed(author, &e.to_string());
                Err(e)
            }
        }
    }

    fn sign_with_raw_key(
        &self,
        metadata: &ProductMetadata,
        private_key_pem: &str,
        public_key_pem: &str,
        algorithm: SignatureAlgorithm,
    ) -> Result<SignedPayload, PayloadSignError> {
        let author = metadata.manufacturer().unwrap_or("<unknown>");

        match sign_product(metadata, private_key_pem, public_key_pem, algorithm) {
            Ok(payload) => {
                audit::log_payload_signed(
                    author,
                    &payload.digest,
                    &payload.pubkey_fingerprint,
                    payload.algorithm.as_str(),
                );
                Ok(payload)
            }
            Err(e) => {
                audit::log_payload_sign_failed(author, &e.to_string());
                Err(e)
            }
        }
    }

    fn publish(&self, payload: &SignedPayload) -> Result<PathBuf, PayloadSignError> {
        payload.write_to_file(&self.transaction_path)?;

        tracing::info!(
            transaction_path = %self.transaction_path.display(),
            digest = %payload.digest,
            "Payload published"
        );

        Ok(self.transaction_path.clone())
    }
}
