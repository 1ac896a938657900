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

//! Sign and verify round trips for both algorithms.

use crate::fixtures::{keypair_for, simple_metadata, TestRegistry, AUTHOR};
use serde_json::json;
use veritag::{
    sign_product, verify_digest, verify_payload, verify_payload_offline, verify_signature,
    KeyManager, PayloadSigner, ProductMetadata, RegistryPayloadSigner, SignatureAlgorithm,
    SignedPayload,
};

const ALGORITHMS: [SignatureAlgorithm; 2] = [SignatureAlgorithm::Rsa, SignatureAlgorithm::Ecdsa];

#[test]
fn test_sign_verify_round_trip() {
    for algorithm in ALGORITHMS {
        let registry = TestRegistry::new();
        let key_pair = keypair_for(algorithm);
        registry.keys.register(AUTHOR, &key_pair).unwrap();

        let signer = RegistryPayloadSigner::new(&registry.keys, registry.config.transaction_path());
        let payload = signer
            .sign_with_registry_key(AUTHOR, &ProductMetadata::template(), None)
            .unwrap();

        assert_eq!(payload.algorithm, algorithm);
        assert!(verify_signature(&payload), "{} signature", algorithm);
        assert!(verify_digest(&payload), "{} digest", algorithm);
        assert!(verify_payload(&registry.keys, &payload).is_verified());
    }
}

#[test]
fn test_explicit_algorithm_overrides_detection() {
    let registry = TestRegistry::new();
    registry
        .keys
        .register(AUTHOR, &keypair_for(SignatureAlgorithm::Ecdsa))
        .unwrap();
    let signer = RegistryPayloadSigner::new(&registry.keys, registry.config.transaction_path());

    let payload = signer
        .sign_with_registry_key(AUTHOR, &simple_metadata("SKU-1"), Some(SignatureAlgorithm::Ecdsa))
        .unwrap();
    assert_eq!(payload.algorithm, SignatureAlgorithm::Ecdsa);

    // An RSA request against an EC key cannot be satisfied.
    assert!(signer
        .sign_with_registry_key(AUTHOR, &simple_metadata("SKU-1"), Some(SignatureAlgorithm::Rsa))
        .is_err());
}

#[test]
fn test_canonical_digest_is_insertion_order_independent() {
    let key_pair = keypair_for(SignatureAlgorithm::Ecdsa);

    let forward: ProductMetadata = serde_json::from_value(json!({
        "product_id": "SKU-1",
        "manufacturer": AUTHOR,
        "origin": "Việt Nam",
        "certificate": {"issuer": "VFA", "id": 42},
    }))
    .unwrap();
    let mut reverse = ProductMetadata::new();
    reverse.insert("certificate", json!({"id": 42, "issuer": "VFA"}));
    reverse.insert("origin", "Việt Nam");
    reverse.insert("manufacturer", AUTHOR);
    reverse.insert("product_id", "SKU-1");

    let a = sign_product(
        &forward,
        &key_pair.private_key_pem,
        &key_pair.public_key_pem,
        SignatureAlgorithm::Ecdsa,
    )
    .unwrap();
    let b = sign_product(
        &reverse,
        &key_pair.private_key_pem,
        &key_pair.public_key_pem,
        SignatureAlgorithm::Ecdsa,
    )
    .unwrap();

    assert_eq!(a.digest, b.digest);

    // A signature over one ordering verifies over the other.
    let mut swapped = b.clone();
    swapped.signature = a.signature.clone();
    assert!(verify_signature(&swapped));
}

#[test]
fn test_payload_survives_wire_and_file_forms() {
    for algorithm in ALGORITHMS {
        let key_pair = keypair_for(algorithm);
        let payload = sign_product(
            &ProductMetadata::template(),
            &key_pair.private_key_pem,
            &key_pair.public_key_pem,
            algorithm,
        )
        .unwrap();

        let from_wire = SignedPayload::from_json(&payload.to_wire().unwrap()).unwrap();
        assert_eq!(from_wire, payload);
        assert!(verify_signature(&from_wire));

        let registry = TestRegistry::new();
        let path = registry.dir.path().join("transaction.json");
        payload.write_to_file(&path).unwrap();
        let from_file = SignedPayload::read_from_file(&path).unwrap();
        assert!(verify_digest(&from_file));
        assert!(verify_signature(&from_file));
    }
}

#[test]
fn test_offline_verification_with_trusted_key() {
    for algorithm in ALGORITHMS {
        let key_pair = keypair_for(algorithm);
        let payload = sign_product(
            &simple_metadata("SKU-1"),
            &key_pair.private_key_pem,
            &key_pair.public_key_pem,
            algorithm,
        )
        .unwrap();

        let result = verify_payload_offline(&payload, &key_pair.public_key_pem).unwrap();
        assert_eq!(result.author, AUTHOR);
        assert_eq!(result.signer_fingerprint, key_pair.fingerprint());
        assert_eq!(result.algorithm, algorithm);
    }
}
