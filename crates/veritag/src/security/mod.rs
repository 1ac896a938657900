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

//! Key registry, signing, and verification.
//!
//! This module provides:
//! - [`KeyManager`] trait mapping authors to their registered key pairs
//! - [`FileKeyManager`] JSON-file-backed implementation
//! - [`SignedPayload`] model shared by signer and verifier
//! - [`PayloadSigner`] / [`RegistryPayloadSigner`] for producing payloads
//! - Verification checks and the [`RecipientSession`] workflow
//! - Security audit logging for SIEM integration

pub mod audit;
mod file_key_manager;
mod key_manager;
mod payload;
mod session;
mod signer;
mod verification;

pub use file_key_manager::FileKeyManager;
pub use key_manager::{KeyError, KeyManager, PrivateKeyEntry, PublicKeyEntry, RegisteredKey};
pub use payload::{PayloadError, SignedPayload};
pub use session::{RecipientSession, SessionError, SessionState};
pub use signer::{
    sign_product, PayloadSignError, PayloadSigner, RegistryPayloadSigner, SIGNED_AT_FORMAT,
};
pub use verification::{
    authenticate, check_author, check_digest, check_payload_author, check_signature,
    verify_digest, verify_payload, verify_payload_offline, verify_payload_strict,
    verify_signature, FailedCheck, Verdict, VerificationError, VerificationReport,
    VerificationResult,
};
