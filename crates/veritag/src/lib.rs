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

//! # Veritag
//!
//! Signed product records with author-key authentication.
//!
//! A sender (manufacturer) canonicalizes a product record, signs it with a key
//! registered under its name, and publishes the resulting [`SignedPayload`].
//! A recipient checks three things independently: that the declared public key
//! is the one registered for the declared author, that the record still hashes
//! to the declared digest, and that the signature verifies over the record.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use veritag::{FileKeyManager, KeyManager, KeyParams, ProductMetadata, RegistryConfig};
//! use veritag::{RegistryPayloadSigner, PayloadSigner, SignatureAlgorithm};
//!
//! let config = RegistryConfig::in_dir("data");
//! let keys = FileKeyManager::new(config.clone());
//! keys.generate_and_register("ACME FOOD JSC", KeyParams::default_for(SignatureAlgorithm::Rsa))?;
//!
//! let signer = RegistryPayloadSigner::new(&keys, config.transaction_path());
//! let payload = signer.sign_with_registry_key("ACME FOOD JSC", &ProductMetadata::template(), None)?;
//! signer.publish(&payload)?;
//!
//! let report = veritag::verify_payload(&keys, &payload);
//! assert!(report.is_verified());
//! ```
//!
//! ## Modules
//!
//! - [`crypto`]: canonical encoding, SHA-256 digests, RSA-PSS and ECDSA primitives
//! - [`security`]: key registry, payload model, signer, verifier, recipient session
//! - [`config`]: storage locations and key generation defaults

pub mod config;
pub mod crypto;
pub mod security;

mod json;

pub use config::{ConfigError, RegistryConfig, RegistryConfigBuilder};
pub use crypto::{
    canonicalize_metadata, compute_key_fingerprint, generate_keypair, sha256_hex, EcCurve,
    KeyPair, KeyParams, ProductMetadata, SignatureAlgorithm, SigningError,
};
pub use security::{
    authenticate, sign_product, verify_digest, verify_payload, verify_payload_offline,
    verify_payload_strict, verify_signature, FailedCheck, FileKeyManager, KeyError, KeyManager,
    PayloadError, PayloadSignError, PayloadSigner, RecipientSession, RegistryPayloadSigner,
    SessionState, SignedPayload, Verdict, VerificationError, VerificationReport,
};
