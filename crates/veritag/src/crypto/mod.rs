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

//! Cryptographic primitives for signed product records.
//!
//! This module provides:
//! - Canonical, order-independent encoding of product metadata
//! - SHA-256 digests and public key fingerprints
//! - RSA-PSS and ECDSA P-256 key generation, signing and verification

mod canonical;
mod digest;
mod signing;

pub use canonical::{canonicalize_metadata, canonicalize_value, ProductMetadata};
pub use digest::{compute_key_fingerprint, sha256_hex};
pub use signing::{
    check_rsa_bits, detect_algorithm, generate_keypair, sign_message, validate_public_key,
    verify_message, EcCurve, KeyPair, KeyParams, SignatureAlgorithm, SigningError,
    DEFAULT_RSA_BITS, MAX_RSA_BITS, MIN_RSA_BITS,
};
