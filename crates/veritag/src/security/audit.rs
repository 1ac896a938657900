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

//! Security audit logging for SIEM integration.
//!
//! Structured events for every security-sensitive operation:
//! - Key generation and registration
//! - Registry entries that could not be read
//! - Payload signing (success/failure)
//! - Payload verification (success/failure)
//!
//! Events carry a stable `event_type` field and are emitted through `tracing`.
//! Private key material never appears in any event.

use std::path::Path;

/// Event type strings.
pub mod events {
    /// Key pair generated.
    pub const KEY_GENERATED: &str = "key.generated";
    /// Key pair registered under an author.
    pub const KEY_REGISTERED: &str = "key.registered";
    /// Registry missing, corrupt, or holding an inconsistent entry.
    pub const KEY_REGISTRY_UNAVAILABLE: &str = "key.registry.unavailable";

    /// Payload signed.
    pub const PAYLOAD_SIGNED: &str = "payload.signed";
    /// Payload signing failed.
    pub const PAYLOAD_SIGN_FAILURE: &str = "payload.sign.failure";

    /// Verification success event type.
    pub const VERIFICATION_SUCCESS: &str = "verification.success";
    /// Verification failure event type.
    pub const VERIFICATION_FAILURE: &str = "verification.failure";
}

/// Log a key pair generation event.
pub fn log_key_generated(algorithm: &str, key_fingerprint: &str) {
    tracing::info!(
        event_type = events::KEY_GENERATED,
        algorithm = %algorithm,
        key_fingerprint = %key_fingerprint,
        "Key pair generated"
    );
}

/// Log a key registration event.
pub fn log_key_registered(author: &str, key_fingerprint: &str, replaced: bool) {
    tracing::warn!(
        event_type = events::KEY_REGISTERED,
        author = %author,
        key_fingerprint = %key_fingerprint,
        replaced = replaced,
        "Key registered"
    );
}

/// Log a registry that could not be used for a lookup.
pub fn log_registry_unavailable(path: &Path, reason: &str) {
    tracing::warn!(
        event_type = events::KEY_REGISTRY_UNAVAILABLE,
        registry_path = %path.display(),
        reason = %reason,
        "Key registry unavailable, treating as empty"
    );
}

/// Log a payload signing event.
pub fn log_payload_signed(author: &str, digest: &str, key_fingerprint: &str, algorithm: &str) {
    tracing::info!(
        event_type = events::PAYLOAD_SIGNED,
        author = %author,
        digest = %digest,
        key_fingerprint = %key_fingerprint,
        algorithm = %algorithm,
        "Payload signed"
    );
}

/// Log a payload signing failure.
pub fn log_payload_sign_failed(author: &str, error: &str) {
    tracing::error!(
        event_type = events::PAYLOAD_SIGN_FAILURE,
        author = %author,
        error = %error,
        "Payload signing failed"
    );
}

/// Log a verification success event.
pub fn log_verification_success(author: &str, digest: &str, signer_fingerprint: &str) {
    tracing::info!(
        event_type = events::VERIFICATION_SUCCESS,
        author = %author,
        digest = %digest,
        signer_fingerprint = %signer_fingerprint,
        "Payload verified successfully"
    );
}

/// Log a verification failure event.
pub fn log_verification_failure(
    author: &str,
    digest: &str,
    failure_reason: &str,
    signer_fingerprint: Option<&str>,
) {
    tracing::warn!(
        event_type = events::VERIFICATION_FAILURE,
        author = %author,
        digest = %digest,
        failure_reason = %failure_reason,
        signer_fingerprint = signer_fingerprint.unwrap_or("<unknown>"),
        "Payload verification failed"
    );
}
