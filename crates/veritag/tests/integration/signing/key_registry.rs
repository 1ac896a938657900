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

//! Key registry integration tests.

use crate::fixtures::{ecdsa_keypair, TestRegistry, AUTHOR, RSA_KEYPAIR, RSA_KEYPAIR_2};
use std::io::Write;
use tempfile::NamedTempFile;
use veritag::{
    sha256_hex, FileKeyManager, KeyError, KeyManager, KeyParams, RegistryConfig,
    SignatureAlgorithm,
};

#[test]
fn test_fingerprint_is_digest_of_public_key() {
    let registry = TestRegistry::new();

    for key_pair in [RSA_KEYPAIR.clone(), ecdsa_keypair()] {
        let registered = registry.keys.register(AUTHOR, &key_pair).unwrap();
        let expected = sha256_hex(key_pair.public_key_pem.as_bytes());

        assert_eq!(key_pair.fingerprint(), expected);
        assert_eq!(registered.fingerprint, expected);
        assert_eq!(registry.keys.lookup_public(AUTHOR).unwrap().fingerprint, expected);
    }
}

#[test]
fn test_reregister_overwrites_instead_of_duplicating() {
    let registry = TestRegistry::new();

    let first = registry.keys.register(AUTHOR, &RSA_KEYPAIR).unwrap();
    let second = registry.keys.register(AUTHOR, &RSA_KEYPAIR_2).unwrap();

    assert!(!first.replaced);
    assert!(second.replaced);
    assert_ne!(first.fingerprint, second.fingerprint);
    assert_eq!(registry.keys.list_authors(), vec![AUTHOR]);

    let public = registry.keys.lookup_public(AUTHOR).unwrap();
    assert_eq!(public.public_key_pem, RSA_KEYPAIR_2.public_key_pem);
    let private = registry.keys.lookup_private(AUTHOR).unwrap();
    assert_eq!(private.private_key_pem, RSA_KEYPAIR_2.private_key_pem);

    for file in ["public_keys.json", "private_keys.json"] {
        let text = std::fs::read_to_string(registry.dir.path().join(file)).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value.as_object().unwrap().len(), 1, "{}", file);
    }
}

#[test]
fn test_empty_author_registration_fails() {
    let registry = TestRegistry::new();

    let result = registry.keys.register("", &ecdsa_keypair());
    assert!(matches!(result, Err(KeyError::EmptyAuthor)));

    let result = registry
        .keys
        .generate_and_register("", KeyParams::default_for(SignatureAlgorithm::Ecdsa));
    assert!(matches!(result, Err(KeyError::EmptyAuthor)));
}

#[test]
fn test_corrupt_registry_reads_as_empty() {
    let registry = TestRegistry::new();
    registry.keys.register(AUTHOR, &ecdsa_keypair()).unwrap();

    std::fs::write(registry.config.public_registry_path(), b"\xff\xfe garbage").unwrap();

    assert!(registry.keys.lookup_public(AUTHOR).is_none());
    assert!(registry.keys.lookup_private(AUTHOR).is_some());
    assert!(matches!(
        registry.keys.register(AUTHOR, &ecdsa_keypair()),
        Err(KeyError::RegistryUnavailable { .. })
    ));
}

#[test]
fn test_generate_and_register_both_algorithms() {
    let registry = TestRegistry::new();

    let rsa = registry
        .keys
        .generate_and_register("RSA Foods", KeyParams::Rsa { bits: 3072 })
        .unwrap();
    let ecdsa = registry
        .keys
        .generate_and_register("EC Foods", KeyParams::default_for(SignatureAlgorithm::Ecdsa))
        .unwrap();

    assert_eq!(rsa.algorithm, SignatureAlgorithm::Rsa);
    assert_eq!(ecdsa.algorithm, SignatureAlgorithm::Ecdsa);
    assert_eq!(
        registry.keys.lookup_public("RSA Foods").unwrap().algorithm(),
        Some(SignatureAlgorithm::Rsa)
    );
    assert_eq!(registry.keys.list_authors(), vec!["EC Foods", "RSA Foods"]);
}

#[test]
fn test_weak_rsa_rejected() {
    let registry = TestRegistry::new();

    let result = registry
        .keys
        .generate_and_register(AUTHOR, KeyParams::Rsa { bits: 1024 });
    assert!(matches!(result, Err(KeyError::KeyGeneration(_))));
    assert!(registry.keys.lookup_public(AUTHOR).is_none());
}

#[test]
fn test_manager_from_toml_config() {
    let registry = TestRegistry::new();
    let mut config_file = NamedTempFile::new().unwrap();
    writeln!(
        config_file,
        "data_dir = {:?}",
        registry.dir.path().join("store").display().to_string()
    )
    .unwrap();

    let config = RegistryConfig::from_toml_file(config_file.path()).unwrap();
    let keys = FileKeyManager::new(config);
    keys.register(AUTHOR, &ecdsa_keypair()).unwrap();

    assert!(registry
        .dir
        .path()
        .join("store")
        .join("public_keys.json")
        .exists());
}
