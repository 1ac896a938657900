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

//! SHA-256 digests used for tamper detection and key fingerprints.

use sha2::{Digest, Sha256};

/// Computes the lowercase hex SHA-256 digest of `data`.
///
/// # Returns
///
/// A 64-character hex string.
pub fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Computes the fingerprint of an encoded public key.
///
/// The fingerprint is taken over the exact PEM text bytes, so two encodings
/// of the same key (e.g. different line endings) have different fingerprints.
/// Registries and payloads always carry the PEM produced at generation time.
pub fn compute_key_fingerprint(public_key_pem: &[u8]) -> String {
    sha256_hex(public_key_pem)
}
