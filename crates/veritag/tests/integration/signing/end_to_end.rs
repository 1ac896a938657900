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

//! Sender-to-recipient scenarios.

use crate::fixtures::{simple_metadata, TestRegistry, AUTHOR, RSA_KEYPAIR};
use veritag::{
    authenticate, verify_digest, verify_signature, KeyManager, KeyParams, PayloadSigner,
    ProductMetadata, RecipientSession, RegistryPayloadSigner, SessionState, SignatureAlgorithm,
    SignedPayload,
};

/// Register an RSA key for ACME, sign, verify, then tamper.
#[test]
fn test_acme_rsa_scenario() {
    let registry = TestRegistry::new();
    registry.keys.register(AUTHOR, &RSA_KEYPAIR).unwrap();

    let signer = RegistryPayloadSigner::new(&registry.keys, registry.config.transaction_path());
    let payload = signer
        .sign_with_registry_key(AUTHOR, &simple_metadata("SKU-1"), None)
        .unwrap();

    assert_eq!(payload.algorithm.as_str(), "RSA");
    assert_eq!(
        serde_json::to_value(&payload).unwrap()["algorithm"],
        serde_json::json!("RSA")
    );

    let checks = |p: &SignedPayload| {
        (
            authenticate(&registry.keys, &p.pubkey, AUTHOR),
            verify_digest(p),
            verify_signature(p),
        )
    };
    assert_eq!(checks(&payload), (true, true, true));

    let mut tampered = payload.clone();
    tampered.metadata.insert("product_id", "SKU-2");
    assert_eq!(checks(&tampered), (true, false, false));
}

/// Sender randomizes keys, fills the template, publishes; recipient loads
/// the transaction file and evaluates.
#[test]
fn test_publish_and_recipient_session() {
    let registry = TestRegistry::new();
    registry
        .keys
        .generate_and_register(AUTHOR, KeyParams::default_for(SignatureAlgorithm::Ecdsa))
        .unwrap();

    let signer = RegistryPayloadSigner::new(&registry.keys, registry.config.transaction_path());
    let payload = signer
        .sign_with_registry_key(AUTHOR, &ProductMetadata::template(), None)
        .unwrap();
    let path = signer.publish(&payload).unwrap();

    let mut session = RecipientSession::new();
    session.load_file(&path).unwrap();
    assert_eq!(session.state(), SessionState::Loaded);

    let report = session.evaluate(&registry.keys).unwrap();
    assert!(report.is_verified());
    assert_eq!(session.state(), SessionState::Authenticated);
}

/// Recipient loads the QR text form of a payload whose author was never
/// registered on the recipient's side.
#[test]
fn test_recipient_with_unregistered_author() {
    let sender = TestRegistry::new();
    sender
        .keys
        .generate_and_register(AUTHOR, KeyParams::default_for(SignatureAlgorithm::Ecdsa))
        .unwrap();
    let signer = RegistryPayloadSigner::new(&sender.keys, sender.config.transaction_path());
    let payload = signer
        .sign_with_registry_key(AUTHOR, &simple_metadata("SKU-1"), None)
        .unwrap();

    let recipient = TestRegistry::new();
    let mut session = RecipientSession::new();
    session.load_json(&payload.to_wire().unwrap()).unwrap();
    session.evaluate(&recipient.keys).unwrap();

    assert_eq!(session.state(), SessionState::Rejected);
    assert_eq!(session.integrity_ok(), Some(true));
    assert_eq!(session.signature_ok(), Some(true));
}

/// Keys re-randomized after signing invalidate authenticity of old payloads.
#[test]
fn test_rerandomized_keys_reject_old_payload() {
    let registry = TestRegistry::new();
    let params = KeyParams::default_for(SignatureAlgorithm::Ecdsa);
    registry.keys.generate_and_register(AUTHOR, params).unwrap();

    let signer = RegistryPayloadSigner::new(&registry.keys, registry.config.transaction_path());
    let old = signer
        .sign_with_registry_key(AUTHOR, &simple_metadata("SKU-1"), None)
        .unwrap();

    registry.keys.generate_and_register(AUTHOR, params).unwrap();

    assert!(!authenticate(&registry.keys, &old.pubkey, AUTHOR));
    assert!(verify_signature(&old));
}
