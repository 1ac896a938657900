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

//! Recipient-side verification session.
//!
//! Tracks one payload through the recipient's workflow:
//!
//! ```text
//! Unloaded ──load──▶ Loaded ──enter_key──▶ KeyEntered ──evaluate──▶ Authenticated
//!                      │                                       └──▶ Rejected
//!                      └──────────────evaluate (pre-filled key)──────┘
//! ```
//!
//! Loading pre-fills the author key from the payload; the recipient may
//! replace it with key material obtained out of band. Integrity and signature
//! outcomes are evaluated alongside authenticity and stay queryable on their
//! own. The session never mutates the payload.

use super::key_manager::KeyManager;
use super::payload::{PayloadError, SignedPayload};
use super::verification::{check_author_key, check_digest, check_signature, VerificationReport};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("No payload loaded")]
    NoPayload,

    #[error("No author key entered")]
    NoKey,

    #[error("Failed to load payload: {0}")]
    Payload(#[from] PayloadError),
}

/// Where the session is in the recipient workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Unloaded,
    Loaded,
    KeyEntered,
    Authenticated,
    Rejected,
}

impl SessionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unloaded => "unloaded",
            Self::Loaded => "loaded",
            Self::KeyEntered => "key_entered",
            Self::Authenticated => "authenticated",
            Self::Rejected => "rejected",
        }
    }
}

/// A recipient's verification session over one payload.
#[derive(Debug)]
pub struct RecipientSession {
    state: SessionState,
    payload: Option<SignedPayload>,
    author_key: Option<String>,
    report: Option<VerificationReport>,
}

impl Default for RecipientSession {
    fn default() -> Self {
        Self::new()
    }
}

impl RecipientSession {
    pub fn new() -> Self {
        Self {
            state: SessionState::Unloaded,
            payload: None,
            author_key: None,
            report: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn payload(&self) -> Option<&SignedPayload> {
        self.payload.as_ref()
    }

    /// Base64 public key that authentication will check.
    pub fn author_key(&self) -> Option<&str> {
        self.author_key.as_deref()
    }

    /// Outcome of the last evaluation, cleared by any later load or key entry.
    pub fn report(&self) -> Option<&VerificationReport> {
        self.report.as_ref()
    }

    /// Load a payload, discarding any previous payload, key, and outcome.
    pub fn load(&mut self, payload: SignedPayload) {
        self.author_key = Some(payload.pubkey.clone());
        self.payload = Some(payload);
        self.report = None;
        self.state = SessionState::Loaded;

        tracing::debug!(state = self.state.as_str(), "Payload loaded into session");
    }

    /// Load a payload from JSON text, e.g. text decoded from a QR code.
    ///
    /// On error the session is left unchanged.
    pub fn load_json(&mut self, json: &str) -> Result<(), SessionError> {
        let payload = SignedPayload::from_json(json)?;
        self.load(payload);
        Ok(())
    }

    /// Load a payload from a transaction file.
    ///
    /// On error the session is left unchanged.
    pub fn load_file(&mut self, path: &Path) -> Result<(), SessionError> {
        let payload = SignedPayload::read_from_file(path)?;
        self.load(payload);
        Ok(())
    }

    /// Replace the author key (base64 PEM) used for authentication.
    pub fn enter_key(&mut self, pubkey: &str) -> Result<(), SessionError> {
        if self.payload.is_none() {
            return Err(SessionError::NoPayload);
        }

        let pubkey = pubkey.trim();
        if pubkey.is_empty() {
            return Err(SessionError::NoKey);
        }

        self.author_key = Some(pubkey.to_string());
        self.report = None;
        self.state = SessionState::KeyEntered;
        Ok(())
    }

    /// Run all three checks and move to `Authenticated` or `Rejected`.
    ///
    /// Authentication uses the session's author key, which must also be the
    /// key the payload was signed with; integrity and signature use the
    /// payload as loaded.
    pub fn evaluate<K: KeyManager + ?Sized>(
        &mut self,
        key_manager: &K,
    ) -> Result<&VerificationReport, SessionError> {
        let payload = self.payload.as_ref().ok_or(SessionError::NoPayload)?;
        let author_key = self.author_key.as_deref().ok_or(SessionError::NoKey)?;

        let report = VerificationReport {
            authenticity: check_author_key(key_manager, author_key, payload),
            integrity: check_digest(payload),
            signature: check_signature(payload),
        };

        self.state = if report.authenticity.is_valid() {
            SessionState::Authenticated
        } else {
            SessionState::Rejected
        };

        tracing::debug!(
            state = self.state.as_str(),
            integrity = report.integrity.is_valid(),
            signature = report.signature.is_valid(),
            "Session evaluated"
        );

        Ok(&*self.report.insert(report))
    }

    /// Authentication outcome, once evaluated.
    pub fn is_authenticated(&self) -> Option<bool> {
        self.report.as_ref().map(|r| r.authenticity.is_valid())
    }

    /// Integrity outcome, once evaluated.
    pub fn integrity_ok(&self) -> Option<bool> {
        self.report.as_ref().map(|r| r.integrity.is_valid())
    }

    /// Signature outcome, once evaluated.
    pub fn signature_ok(&self) -> Option<bool> {
        self.report.as_ref().map(|r| r.signature.is_valid())
    }

    /// Return to `Unloaded`.
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}
