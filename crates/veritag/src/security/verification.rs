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

//! Payload verification.
//!
//! Three independent checks decide whether a payload can be trusted:
//! - authenticity: the embedded public key is the one registered for the
//!   declared author (`metadata.manufacturer`)
//! - integrity: the metadata still hashes to the declared digest
//! - signature: the signature verifies over the canonical metadata
//!
//! Each check returns a [`Verdict`] and never fails or panics on hostile
//! input. The boolean predicates ([`authenticate`], [`verify_digest`],
//! [`verify_signature`]) are the same checks collapsed to `bool`.
//! [`verify_payload_strict`] is the error-returning form for callers that
//! want a hard failure.

use super::audit;
use super::key_manager::KeyManager;
use super::payload::{decode_public_key, SignedPayload};
use crate::crypto::{
    compute_key_fingerprint, sha256_hex, verify_message, SignatureAlgorithm, SigningError,
};
use std::fmt;
use thiserror::Error;

/// Outcome of a single check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// The check passed.
    Valid,
    /// The check ran and failed.
    Invalid { reason: String },
    /// The inputs could not be decoded, so the check could not run.
    Unevaluable { reason: String },
}

impl Verdict {
    fn invalid(reason: impl Into<String>) -> Self {
        Self::Invalid {
            reason: reason.into(),
        }
    }

    fn unevaluable(reason: impl Into<String>) -> Self {
        Self::Unevaluable {
            reason: reason.into(),
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }

    /// Why the check did not pass, if it did not.
    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Valid => None,
            Self::Invalid { reason } | Self::Unevaluable { reason } => Some(reason),
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Valid => f.write_str("valid"),
            Self::Invalid { reason } => write!(f, "invalid: {}", reason),
            Self::Unevaluable { reason } => write!(f, "could not evaluate: {}", reason),
        }
    }
}

/// The check that failed first, in evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailedCheck {
    Authenticity,
    Integrity,
    Signature,
}

impl FailedCheck {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Authenticity => "authenticity",
            Self::Integrity => "integrity",
            Self::Signature => "signature",
        }
    }
}

impl fmt::Display for FailedCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// All three check outcomes for one payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationReport {
    pub authenticity: Verdict,
    pub integrity: Verdict,
    pub signature: Verdict,
}

impl VerificationReport {
    /// True only if every check passed.
    pub fn is_verified(&self) -> bool {
        self.authenticity.is_valid() && self.integrity.is_valid() && self.signature.is_valid()
    }

    pub fn first_failure(&self) -> Option<FailedCheck> {
        if !self.authenticity.is_valid() {
            Some(FailedCheck::Authenticity)
        } else if !self.integrity.is_valid() {
            Some(FailedCheck::Integrity)
        } else if !self.signature.is_valid() {
            Some(FailedCheck::Signature)
        } else {
            None
        }
    }

    /// The boolean triple `(authenticity, integrity, signature)`.
    pub fn as_bools(&self) -> (bool, bool, bool) {
        (
            self.authenticity.is_valid(),
            self.integrity.is_valid(),
            self.signature.is_valid(),
        )
    }
}

/// Errors returned by strict verification.
///
/// These are hard failures - there are no "warnings" for security.
#[derive(Debug, Error)]
pub enum VerificationError {
    #[error("Untrusted author '{author}': {reason}")]
    UntrustedAuthor { author: String, reason: String },

    #[error("Payload has been tampered with: digest mismatch (expected {expected}, got {actual})")]
    TamperedPayload {
        /// Digest declared in the payload
        expected: String,
        /// Digest computed from the metadata
        actual: String,
    },

    #[error("Invalid signature: cryptographic verification failed")]
    InvalidSignature,

    #[error("Payload malformed: {reason}")]
    MalformedPayload { reason: String },
}

/// Result of successful strict verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationResult {
    pub author: String,
    pub digest: String,
    pub signer_fingerprint: String,
    pub algorithm: SignatureAlgorithm,
}

/// Check that `pubkey` (base64 PEM) is the key registered for `author`.
pub fn check_author<K: KeyManager + ?Sized>(
    key_manager: &K,
    pubkey: &str,
    author: &str,
) -> Verdict {
    if author.trim().is_empty() {
        return Verdict::unevaluable("no author declared");
    }

    let public_key_pem = match decode_public_key(pubkey) {
        Ok(pem) if !pem.trim().is_empty() => pem,
        Ok(_) => return Verdict::unevaluable("no public key supplied"),
        Err(e) => return Verdict::unevaluable(e.to_string()),
    };
    let fingerprint = compute_key_fingerprint(public_key_pem.as_bytes());

    match key_manager.lookup_public(author) {
        None => Verdict::invalid(format!("no key registered for author '{}'", author)),
        Some(entry) if entry.fingerprint != fingerprint => Verdict::invalid(format!(
            "public key {} is not the key registered for author '{}'",
            fingerprint, author
        )),
        Some(_) => Verdict::Valid,
    }
}

/// Authenticity check over a whole payload.
///
/// In addition to [`check_author`], the payload's declared fingerprint must
/// match its embedded key.
pub fn check_payload_author<K: KeyManager + ?Sized>(
    key_manager: &K,
    payload: &SignedPayload,
) -> Verdict {
    check_author_key(key_manager, &payload.pubkey, payload)
}

/// Authenticity of `pubkey` (base64 PEM) as the signer of `payload`.
///
/// The key must be registered for the payload's author and must be the key
/// the payload was signed with, both by embedded key and declared fingerprint.
pub(crate) fn check_author_key<K: KeyManager + ?Sized>(
    key_manager: &K,
    pubkey: &str,
    payload: &SignedPayload,
) -> Verdict {
    let author = match payload.author() {
        Some(author) => author,
        None => return Verdict::unevaluable("metadata has no manufacturer"),
    };

    let verdict = check_author(key_manager, pubkey, author);
    if !verdict.is_valid() {
        return verdict;
    }

    let key_fingerprint = match decode_public_key(pubkey) {
        Ok(pem) => compute_key_fingerprint(pem.as_bytes()),
        Err(e) => return Verdict::unevaluable(e.to_string()),
    };
    let embedded_fingerprint = match payload.public_key_pem() {
        Ok(pem) => compute_key_fingerprint(pem.as_bytes()),
        Err(e) => return Verdict::unevaluable(e.to_string()),
    };

    if key_fingerprint != embedded_fingerprint {
        return Verdict::invalid(format!(
            "author key {} does not match the key the payload was signed with ({})",
            key_fingerprint, embedded_fingerprint
        ));
    }
    if embedded_fingerprint != payload.pubkey_fingerprint {
        return Verdict::invalid("declared fingerprint does not match the embedded public key");
    }

    Verdict::Valid
}

/// Integrity check: recompute the metadata digest and compare.
pub fn check_digest(payload: &SignedPayload) -> Verdict {
    match recompute_digest(payload) {
        Err(reason) => Verdict::Unevaluable { reason },
        Ok(actual) if actual == payload.digest => Verdict::Valid,
        Ok(actual) => Verdict::invalid(format!(
            "digest mismatch: declared {}, computed {}",
            payload.digest, actual
        )),
    }
}

/// Signature check over the canonical metadata with the embedded key.
pub fn check_signature(payload: &SignedPayload) -> Verdict {
    let public_key_pem = match payload.public_key_pem() {
        Ok(pem) => pem,
        Err(e) => return Verdict::unevaluable(e.to_string()),
    };
    check_signature_with_key(payload, &public_key_pem)
}

fn check_signature_with_key(payload: &SignedPayload, public_key_pem: &str) -> Verdict {
    let signature = match payload.signature_bytes() {
        Ok(bytes) => bytes,
        Err(e) => return Verdict::unevaluable(e.to_string()),
    };
    let message = match payload.canonical_message() {
        Ok(message) => message,
        Err(e) => return Verdict::unevaluable(e.to_string()),
    };

    match verify_message(payload.algorithm, public_key_pem, &message, &signature) {
        Ok(()) => Verdict::Valid,
        Err(SigningError::VerificationFailed) => {
            Verdict::invalid("signature does not match the metadata")
        }
        Err(e) => Verdict::unevaluable(e.to_string()),
    }
}

fn recompute_digest(payload: &SignedPayload) -> Result<String, String> {
    if payload.metadata.is_empty() {
        return Err("payload has no metadata".to_string());
    }
    if payload.digest.trim().is_empty() {
        return Err("payload has no declared digest".to_string());
    }

    let message = payload.canonical_message().map_err(|e| e.to_string())?;
    Ok(sha256_hex(&message))
}

/// True if `pubkey` (base64 PEM) is the key registered for `author`.
pub fn authenticate<K: KeyManager + ?Sized>(key_manager: &K, pubkey: &str, author: &str) -> bool {
    check_author(key_manager, pubkey, author).is_valid()
}

/// True if the metadata hashes to the declared digest.
pub fn verify_digest(payload: &SignedPayload) -> bool {
    check_digest(payload).is_valid()
}

/// True if the signature verifies over the metadata.
pub fn verify_signature(payload: &SignedPayload) -> bool {
    check_signature(payload).is_valid()
}

/// Run all three checks and report each outcome.
pub fn verify_payload<K: KeyManager + ?Sized>(
    key_manager: &K,
    payload: &SignedPayload,
) -> VerificationReport {
    let report = VerificationReport {
        authenticity: check_payload_author(key_manager, payload),
        integrity: check_digest(payload),
        signature: check_signature(payload),
    };

    let author = payload.author().unwrap_or("<unknown>");
    match report.first_failure() {
        None => {
            audit::log_verification_success(author, &payload.digest, &payload.pubkey_fingerprint)
        }
        Some(check) => audit::log_verification_failure(
            author,
            &payload.digest,
            check.as_str(),
            Some(&payload.pubkey_fingerprint),
        ),
    }

    report
}

/// Verify a payload against the registry, failing on the first bad check.
///
/// Checks run in the order authenticity, integrity, signature.
pub fn verify_payload_strict<K: KeyManager + ?Sized>(
    key_manager: &K,
    payload: &SignedPayload,
) -> Result<VerificationResult, VerificationError> {
    let author = payload.author().unwrap_or("<unknown>");

    // 1. Authenticate the declared author
    if let Some(reason) = check_payload_author(key_manager, payload).reason() {
        audit::log_verification_failure(
            author,
            &payload.digest,
            "untrusted_author",
            Some(&payload.pubkey_fingerprint),
        );
        return Err(VerificationError::UntrustedAuthor {
            author: author.to_string(),
            reason: reason.to_string(),
        });
    }

    // 2-3. Digest and signature
    let public_key_pem = payload
        .public_key_pem()
        .map_err(|e| VerificationError::MalformedPayload {
            reason: e.to_string(),
        })?;
    if let Err(e) = verify_contents(payload, &public_key_pem) {
        audit::log_verification_failure(
            author,
            &payload.digest,
            failure_reason(&e),
            Some(&payload.pubkey_fingerprint),
        );
        return Err(e);
    }

    audit::log_verification_success(author, &payload.digest, &payload.pubkey_fingerprint);

    Ok(VerificationResult {
        author: author.to_string(),
        digest: payload.digest.clone(),
        signer_fingerprint: payload.pubkey_fingerprint.clone(),
        algorithm: payload.algorithm,
    })
}

/// Verify a payload against an explicitly trusted public key (offline mode).
///
/// Useful when no registry is available. The payload's embedded key must be
/// the trusted key.
pub fn verify_payload_offline(
    payload: &SignedPayload,
    trusted_public_key_pem: &str,
) -> Result<VerificationResult, VerificationError> {
    let author = payload.author().unwrap_or("<unknown>");
    let trusted_fingerprint = compute_key_fingerprint(trusted_public_key_pem.as_bytes());

    let embedded = payload
        .public_key_pem()
        .map_err(|e| VerificationError::MalformedPayload {
            reason: e.to_string(),
        })?;
    if compute_key_fingerprint(embedded.as_bytes()) != trusted_fingerprint
        || payload.pubkey_fingerprint != trusted_fingerprint
    {
        return Err(VerificationError::UntrustedAuthor {
            author: author.to_string(),
            reason: format!("payload key is not the trusted key {}", trusted_fingerprint),
        });
    }

    verify_contents(payload, trusted_public_key_pem)?;

    tracing::info!(
        event_type = "verification.success.offline",
        author = %author,
        signer_fingerprint = %trusted_fingerprint,
        "Payload verified (offline mode)"
    );

    Ok(VerificationResult {
        author: author.to_string(),
        digest: payload.digest.clone(),
        signer_fingerprint: trusted_fingerprint,
        algorithm: payload.algorithm,
    })
}

/// Digest then signature, as hard errors.
fn verify_contents(
    payload: &SignedPayload,
    public_key_pem: &str,
) -> Result<(), VerificationError> {
    let actual = recompute_digest(payload)
        .map_err(|reason| VerificationError::MalformedPayload { reason })?;
    if actual != payload.digest {
        return Err(VerificationError::TamperedPayload {
            expected: payload.digest.clone(),
            actual,
        });
    }

    match check_signature_with_key(payload, public_key_pem) {
        Verdict::Valid => Ok(()),
        Verdict::Invalid { .. } => Err(VerificationError::InvalidSignature),
        Verdict::Unevaluable { reason } => Err(VerificationError::MalformedPayload { reason }),
    }
}

fn failure_reason(error: &VerificationError) -> &'static str {
    match error {
        VerificationError::UntrustedAuthor { .. } => "untrusted_author",
        VerificationError::TamperedPayload { .. } => "tampered",
        VerificationError::InvalidSignature => "invalid_signature",
        VerificationError::MalformedPayload { .. } => "malformed",
    }
}
