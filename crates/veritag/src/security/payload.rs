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

//! Signed payload model shared by the signer and the verifier.
//!
//! A [`SignedPayload`] is created once by the signer and never mutated
//! afterwards. It travels in two textual forms:
//! - the transaction file: 4-space indented JSON
//! - the wire/QR form: compact canonical JSON ([`SignedPayload::to_wire`])
//!
//! Decoding is strict. Every field must be present and the algorithm tag must
//! be one this crate can verify, so a decoded payload is always fully typed.

use crate::crypto::{
    canonicalize_metadata, canonicalize_value, ProductMetadata, SignatureAlgorithm, SigningError,
};
use crate::json;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors decoding, encoding, or storing a payload.
#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("Malformed payload: {0}")]
    Malformed(String),

    #[error("Unsupported algorithm in payload: {0}")]
    UnsupportedAlgorithm(String),

    #[error("Payload file error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A signed product record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignedPayload {
    /// The product record that was signed
    pub metadata: ProductMetadata,
    /// SHA256 hex digest of the canonical metadata bytes
    pub digest: String,
    /// Base64-encoded signature over the canonical metadata bytes
    pub signature: String,
    /// Base64-encoded public key PEM of the signer
    pub pubkey: String,
    /// SHA256 hex fingerprint of the public key PEM
    pub pubkey_fingerprint: String,
    /// Signature algorithm, `"RSA"` or `"ECDSA"`
    pub algorithm: SignatureAlgorithm,
    /// Human-readable local signing time
    pub signed_at: String,
}

impl SignedPayload {
    /// Parse a payload from JSON text (transaction file or decoded QR text).
    ///
    /// # Errors
    ///
    /// `PayloadError::UnsupportedAlgorithm` for an algorithm tag outside
    /// RSA/ECDSA, `PayloadError::Malformed` for anything else that does not
    /// match the payload shape.
    pub fn from_json(json: &str) -> Result<Self, PayloadError> {
        let value: Value =
            serde_json::from_str(json).map_err(|e| PayloadError::Malformed(e.to_string()))?;

        if let Some(tag) = value.get("algorithm").and_then(Value::as_str) {
            if tag.parse::<SignatureAlgorithm>().is_err() {
                return Err(PayloadError::UnsupportedAlgorithm(tag.to_string()));
            }
        }

        serde_json::from_value(value).map_err(|e| PayloadError::Malformed(e.to_string()))
    }

    /// 4-space indented JSON, as written to the transaction file.
    pub fn to_json_pretty(&self) -> Result<String, PayloadError> {
        let bytes =
            json::to_vec_indented(self).map_err(|e| PayloadError::Malformed(e.to_string()))?;
        String::from_utf8(bytes).map_err(|e| PayloadError::Malformed(e.to_string()))
    }

    /// Compact canonical JSON, the text embedded in a QR code.
    pub fn to_wire(&self) -> Result<String, PayloadError> {
        let value =
            serde_json::to_value(self).map_err(|e| PayloadError::Malformed(e.to_string()))?;
        let bytes =
            canonicalize_value(&value).map_err(|e| PayloadError::Malformed(e.to_string()))?;
        String::from_utf8(bytes).map_err(|e| PayloadError::Malformed(e.to_string()))
    }

    /// Write the payload to `path`, creating parent directories as needed.
    pub fn write_to_file(&self, path: &Path) -> Result<(), PayloadError> {
        let json = self.to_json_pretty()?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| PayloadError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        }

        std::fs::write(path, json).map_err(|source| PayloadError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Read a payload from a file.
    pub fn read_from_file(path: &Path) -> Result<Self, PayloadError> {
        let json = std::fs::read_to_string(path).map_err(|source| PayloadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }

    /// The declared author (`metadata.manufacturer`).
    pub fn author(&self) -> Option<&str> {
        self.metadata.manufacturer()
    }

    /// Get the raw signature bytes.
    pub fn signature_bytes(&self) -> Result<Vec<u8>, PayloadError> {
        BASE64
            .decode(&self.signature)
            .map_err(|e| PayloadError::Malformed(format!("signature is not valid base64: {}", e)))
    }

    /// Decode the embedded public key to PEM text.
    pub fn public_key_pem(&self) -> Result<String, PayloadError> {
        decode_public_key(&self.pubkey)
    }

    /// Canonical bytes of the metadata, the message that was signed.
    pub fn canonical_message(&self) -> Result<Vec<u8>, SigningError> {
        canonicalize_metadata(&self.metadata)
    }
}

/// Decode a base64-encoded public key PEM.
pub(crate) fn decode_public_key(encoded: &str) -> Result<String, PayloadError> {
    let bytes = BASE64
        .decode(encoded.trim())
        .map_err(|e| PayloadError::Malformed(format!("public key is not valid base64: {}", e)))?;
    String::from_utf8(bytes)
        .map_err(|e| PayloadError::Malformed(format!("public key is not UTF-8 text: {}", e)))
}

/// Base64-encode a public key PEM for embedding in a payload.
pub(crate) fn encode_public_key(public_key_pem: &str) -> String {
    BASE64.encode(public_key_pem)
}
