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

//! Security failure integration tests.
//!
//! These tests verify that verification correctly rejects:
//! - Tampered metadata
//! - Unknown and impostor authors
//! - Invalid signatures
//! - Malformed payloads

use crate::fixtures::{
    ecdsa_keypair, keypair_for, simple_metadata, weak_rsa_keypair, TestRegistry, AUTHOR,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde_json::json;
use veritag::security::{check_signature, verify_payload_strict, FailedCheck};
use veritag::{
    authenticate, sign_product, verify_digest, verify_payload, verify_signature, KeyManager,
    PayloadError, PayloadSignError, ProductMetadata, SignatureAlgorithm, SignedPayload,
    SigningError, VerificationError, Verdict,
};

fn signed(algorithm: SignatureAlgorithm, registry: &TestRegistry) -> SignedPayload {
    let key_pair = keypair_for(algorithm);
    registry.keys.register(AUTHOR, &key_pair).unwrap();
    sign_product(
        &ProductMetadata::template(),
        &key_pair.private_key_pem,
        &key_pair.public_key_pem,
        algorithm,
    )
    .unwrap()
}

/// Mutating any single metadata field breaks integrity and signature but
/// leaves authenticity alone.
#[test]
fn test_tampered_fields_detected() {
    for algorithm in [SignatureAlgorithm::Rsa, SignatureAlgorithm::Ecdsa] {
        let registry = TestRegistry::new();
        let payload = signed(algorithm, &registry);

        for (field, _) in ProductMetadata::template().iter() {
            if field == "manufacturer" {
                continue;
            }
            let mut tampered = payload.clone();
            tampered.metadata.insert(field.as_str(), "tampered");

            let report = verify_payload(&registry.keys, &tampered);
            assert_eq!(
                report.as_bools(),
                (true, false, false),
                "{} field {}",
                algorithm,
                field
            );
        }

        let mut added = payload.clone();
        added.metadata.insert("certificate", "forged");
        assert!(!verify_digest(&added));
        assert!(!verify_signature(&added));
    }
}

#[test]
fn test_tampered_payload_strict_error() {
    let registry = TestRegistry::new();
    let payload = signed(SignatureAlgorithm::Ecdsa, &registry);

    let mut tampered = payload.clone();
    tampered.metadata.insert("expiry_date", "2099-01-01");

    match verify_payload_strict(&registry.keys, &tampered).unwrap_err() {
        VerificationError::TamperedPayload { expected, actual } => {
            assert_eq!(expected, payload.digest);
            assert_ne!(expected, actual);
        }
        e => panic!("Expected TamperedPayload error, got {:?}", e),
    }
}

#[test]
fn test_unknown_author_not_authenticated() {
    let registry = TestRegistry::new();
    let payload = signed(SignatureAlgorithm::Ecdsa, &registry);

    assert!(authenticate(&registry.keys, &payload.pubkey, AUTHOR));
    assert!(!authenticate(&registry.keys, &payload.pubkey, "Unregistered Co"));
}

/// A self-consistent payload signed by someone else's key, claiming to be
/// from a registered author.
#[test]
fn test_impostor_key_rejected() {
    let registry = TestRegistry::new();
    registry.keys.register(AUTHOR, &ecdsa_keypair()).unwrap();

    let impostor = ecdsa_keypair();
    let payload = sign_product(
        &simple_metadata("SKU-1"),
        &impostor.private_key_pem,
        &impostor.public_key_pem,
        SignatureAlgorithm::Ecdsa,
    )
    .unwrap();

    let report = verify_payload(&registry.keys, &payload);
    assert_eq!(report.as_bools(), (false, true, true));
    assert_eq!(report.first_failure(), Some(FailedCheck::Authenticity));
    assert!(matches!(
        verify_payload_strict(&registry.keys, &payload),
        Err(VerificationError::UntrustedAuthor { .. })
    ));
}

/// Swapping in a key the signature was not made with.
#[test]
fn test_substituted_public_key_fails_signature() {
    let registry = TestRegistry::new();
    let payload = signed(SignatureAlgorithm::Ecdsa, &registry);

    let other = ecdsa_keypair();
    let mut substituted = payload.clone();
    substituted.pubkey = BASE64.encode(&other.public_key_pem);
    substituted.pubkey_fingerprint = other.fingerprint();

    let report = verify_payload(&registry.keys, &substituted);
    assert!(!report.authenticity.is_valid());
    assert!(report.integrity.is_valid());
    assert!(matches!(report.signature, Verdict::Invalid { .. }));
}

#[test]
fn test_garbage_fields_never_panic() {
    let registry = TestRegistry::new();
    let payload = signed(SignatureAlgorithm::Rsa, &registry);

    let mut garbage = payload.clone();
    garbage.pubkey = "\u{0}\u{1}not base64".to_string();
    garbage.signature = "=====".to_string();
    garbage.digest = "zz".to_string();

    let report = verify_payload(&registry.keys, &garbage);
    assert_eq!(report.as_bools(), (false, false, false));
    assert!(matches!(report.authenticity, Verdict::Unevaluable { .. }));
    assert!(matches!(check_signature(&garbage), Verdict::Unevaluable { .. }));
}

#[test]
fn test_algorithm_swap_fails_signature() {
    let registry = TestRegistry::new();
    let mut payload = signed(SignatureAlgorithm::Ecdsa, &registry);
    payload.algorithm = SignatureAlgorithm::Rsa;

    assert!(!verify_signature(&payload));
}

#[test]
fn test_malformed_payloads_rejected_at_decode() {
    let registry = TestRegistry::new();
    let payload = signed(SignatureAlgorithm::Ecdsa, &registry);
    let mut value = serde_json::to_value(&payload).unwrap();

    value["algorithm"] = json!("ED25519");
    assert!(matches!(
        SignedPayload::from_json(&value.to_string()),
        Err(PayloadError::UnsupportedAlgorithm(_))
    ));

    value["algorithm"] = json!("ECDSA");
    value.as_object_mut().unwrap().remove("pubkey_fingerprint");
    assert!(matches!(
        SignedPayload::from_json(&value.to_string()),
        Err(PayloadError::Malformed(_))
    ));
}

/// Keys below the RSA minimum can neither sign nor vouch for a signature.
#[test]
fn test_weak_rsa_key_refused() {
    let weak = weak_rsa_keypair();

    let result = sign_product(
        &simple_metadata("SKU-1"),
        &weak.private_key_pem,
        &weak.public_key_pem,
        SignatureAlgorithm::Rsa,
    );
    assert!(matches!(
        result,
        Err(PayloadSignError::Signing(SigningError::WeakKey { bits: 1024, .. }))
    ));

    let registry = TestRegistry::new();
    let mut payload = signed(SignatureAlgorithm::Rsa, &registry);
    payload.pubkey = BASE64.encode(&weak.public_key_pem);

    assert!(matches!(
        check_signature(&payload),
        Verdict::Unevaluable { .. }
    ));
    assert!(!verify_signature(&payload));
}
