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

//! Shared test fixtures.

use once_cell::sync::Lazy;
use tempfile::TempDir;
use veritag::{
    generate_keypair, FileKeyManager, KeyPair, KeyParams, ProductMetadata, RegistryConfig,
    SignatureAlgorithm,
};

/// One RSA-3072 key pair for the whole test binary; generation is slow.
pub static RSA_KEYPAIR: Lazy<KeyPair> =
    Lazy::new(|| generate_keypair(KeyParams::default_for(SignatureAlgorithm::Rsa)).unwrap());

/// Second RSA key pair for overwrite and mismatch tests.
pub static RSA_KEYPAIR_2: Lazy<KeyPair> =
    Lazy::new(|| generate_keypair(KeyParams::default_for(SignatureAlgorithm::Rsa)).unwrap());

pub const AUTHOR: &str = "ACME FOOD JSC";

pub fn ecdsa_keypair() -> KeyPair {
    generate_keypair(KeyParams::default_for(SignatureAlgorithm::Ecdsa)).unwrap()
}

/// 1024-bit RSA key pair, built directly since `generate_keypair` refuses it.
pub fn weak_rsa_keypair() -> KeyPair {
    use rsa::pkcs8::{EncodePrivateKey, EncodePublicKey, LineEnding};

    let private_key = rsa::RsaPrivateKey::new(&mut rand::thread_rng(), 1024).unwrap();
    let public_key = rsa::RsaPublicKey::from(&private_key);
    KeyPair {
        algorithm: SignatureAlgorithm::Rsa,
        private_key_pem: private_key.to_pkcs8_pem(LineEnding::LF).unwrap().to_string(),
        public_key_pem: public_key.to_public_key_pem(LineEnding::LF).unwrap(),
    }
}

/// Key pair for `algorithm`, shared for RSA and fresh for ECDSA.
pub fn keypair_for(algorithm: SignatureAlgorithm) -> KeyPair {
    match algorithm {
        SignatureAlgorithm::Rsa => RSA_KEYPAIR.clone(),
        SignatureAlgorithm::Ecdsa => ecdsa_keypair(),
    }
}

/// Scratch registry directory and a key manager over it.
pub struct TestRegistry {
    pub dir: TempDir,
    pub config: RegistryConfig,
    pub keys: FileKeyManager,
}

impl TestRegistry {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let config = RegistryConfig::in_dir(dir.path());
        let keys = FileKeyManager::new(config.clone());
        Self { dir, config, keys }
    }
}

/// `{"product_id": <id>, "manufacturer": "ACME FOOD JSC"}`
pub fn simple_metadata(product_id: &str) -> ProductMetadata {
    let mut metadata = ProductMetadata::new();
    metadata.insert("product_id", product_id);
    metadata.insert("manufacturer", AUTHOR);
    metadata
}
