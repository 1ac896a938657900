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

//! RSA-PSS and ECDSA signing utilities.
//!
//! Provides functions for:
//! - Generating RSA and ECDSA P-256 keypairs as PEM text
//! - Signing messages (RSA-PSS/SHA-256, ECDSA/SHA-256)
//! - Verifying signatures
//!
//! Private keys are PKCS#8 PEM, public keys SubjectPublicKeyInfo PEM, both
//! with LF line endings. ECDSA signatures are DER-encoded.

use p256::ecdsa::{
    Signature as EcdsaSignature, SigningKey as EcdsaSigningKey,
    VerifyingKey as EcdsaVerifyingKey,
};
use rsa::pss::{
    BlindedSigningKey as PssSigningKey, Signature as PssSignature, VerifyingKey as PssVerifyingKey,
};
use rsa::{RsaPrivateKey, RsaPublicKey};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use super::digest::compute_key_fingerprint;

/// Default RSA modulus size for newly generated keys.
pub const DEFAULT_RSA_BITS: usize = 3072;

/// Smallest RSA modulus accepted for generation, signing and verification.
pub const MIN_RSA_BITS: usize = 3072;

/// Largest RSA modulus the `rsa` crate will decode from a public key.
pub const MAX_RSA_BITS: usize = 4096;

/// PEM label of a SubjectPublicKeyInfo public key.
const PUBLIC_KEY_PEM_TAG: &str = "PUBLIC KEY";

/// PEM label of a PKCS#8 private key.
const PRIVATE_KEY_PEM_TAG: &str = "PRIVATE KEY";

/// Errors that can occur during signing operations.
#[derive(Debug, Error)]
pub enum SigningError {
    #[error("Unsupported algorithm: {0} (expected RSA or ECDSA)")]
    UnsupportedAlgorithm(String),

    #[error("RSA key size {bits} is too weak: at least {minimum} bits required")]
    WeakKey { bits: usize, minimum: usize },

    #[error("RSA key size {bits} is not supported: at most {maximum} bits allowed")]
    OversizedKey { bits: usize, maximum: usize },

    #[error("Key generation failed: {0}")]
    KeyGeneration(String),

    #[error("Invalid key material: {0}")]
    KeyDecode(String),

    #[error("Invalid signature encoding: {0}")]
    SignatureDecode(String),

    #[error("Failed to create signature: {0}")]
    SignatureFailed(String),

    #[error("Signature verification failed")]
    VerificationFailed,

    #[error("Failed to canonicalize metadata: {0}")]
    Canonicalization(String),
}

/// Supported signature algorithms.
///
/// Serialized as the uppercase tags `"RSA"` and `"ECDSA"`; parsing is
/// case-insensitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "&'static str")]
pub enum SignatureAlgorithm {
    /// RSA-PSS with SHA-256, MGF1-SHA-256 and a 32-byte salt.
    Rsa,
    /// ECDSA over NIST P-256 with SHA-256.
    Ecdsa,
}

impl SignatureAlgorithm {
    /// Uppercase tag carried in signed payloads.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Rsa => "RSA",
            Self::Ecdsa => "ECDSA",
        }
    }
}

impl fmt::Display for SignatureAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SignatureAlgorithm {
    type Err = SigningError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "RSA" => Ok(Self::Rsa),
            "ECDSA" => Ok(Self::Ecdsa),
            _ => Err(SigningError::UnsupportedAlgorithm(s.to_string())),
        }
    }
}

impl TryFrom<String> for SignatureAlgorithm {
    type Error = SigningError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SignatureAlgorithm> for &'static str {
    fn from(algorithm: SignatureAlgorithm) -> Self {
        algorithm.as_str()
    }
}

/// Elliptic curves available for ECDSA keys.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EcCurve {
    /// NIST P-256 (secp256r1).
    #[default]
    P256,
}

impl fmt::Display for EcCurve {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::P256 => f.write_str("P-256"),
        }
    }
}

/// Parameters for key generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyParams {
    Rsa { bits: usize },
    Ecdsa { curve: EcCurve },
}

impl KeyParams {
    /// Default parameters for an algorithm: 3072-bit RSA or P-256 ECDSA.
    pub fn default_for(algorithm: SignatureAlgorithm) -> Self {
        match algorithm {
            SignatureAlgorithm::Rsa => Self::Rsa {
                bits: DEFAULT_RSA_BITS,
            },
            SignatureAlgorithm::Ecdsa => Self::Ecdsa {
                curve: EcCurve::P256,
            },
        }
    }

    pub fn algorithm(&self) -> SignatureAlgorithm {
        match self {
            Self::Rsa { .. } => SignatureAlgorithm::Rsa,
            Self::Ecdsa { .. } => SignatureAlgorithm::Ecdsa,
        }
    }
}

/// A generated keypair in portable PEM form.
#[derive(Clone)]
pub struct KeyPair {
    pub algorithm: SignatureAlgorithm,
    /// PKCS#8 PEM private key (must never be logged)
    pub private_key_pem: String,
    /// SubjectPublicKeyInfo PEM public key
    pub public_key_pem: String,
}

impl KeyPair {
    /// SHA256 hex fingerprint of the public key PEM.
    pub fn fingerprint(&self) -> String {
        compute_key_fingerprint(self.public_key_pem.as_bytes())
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("algorithm", &self.algorithm)
            .field("private_key_pem", &"<redacted>")
            .field("public_key_pem", &self.public_key_pem)
            .finish()
    }
}

/// Generates a new keypair.
///
/// RSA generation at 3072 bits and above takes noticeable time; interactive
/// callers should run it off their UI thread.
///
/// # Errors
///
/// Returns `SigningError::WeakKey` for RSA moduli below [`MIN_RSA_BITS`],
/// `SigningError::OversizedKey` above [`MAX_RSA_BITS`], or
/// `SigningError::KeyGeneration` if the key cannot be generated or encoded.
pub fn generate_keypair(params: KeyParams) -> Result<KeyPair, SigningError> {
    match params {
        KeyParams::Rsa { bits } => generate_rsa_keypair(bits),
        KeyParams::Ecdsa { curve } => generate_ecdsa_keypair(curve),
    }
}

fn generate_rsa_keypair(bits: usize) -> Result<KeyPair, SigningError> {
    use rsa::pkcs8::{EncodePrivateKey, EncodePublicKey, LineEnding};

    check_rsa_bits(bits)?;

    let mut rng = rand::thread_rng();
    let private_key = RsaPrivateKey::new(&mut rng, bits)
        .map_err(|e| SigningError::KeyGeneration(e.to_string()))?;
    let public_key = RsaPublicKey::from(&private_key);

    let private_key_pem = private_key.to_pkcs8_pem(LineEnding::LF).map_err(|e| {
        SigningError::KeyGeneration(format!("Failed to encode private key: {}", e))
    })?;
    let public_key_pem = public_key.to_public_key_pem(LineEnding::LF).map_err(|e| {
        SigningError::KeyGeneration(format!("Failed to encode public key: {}", e))
    })?;

    Ok(KeyPair {
        algorithm: SignatureAlgorithm::Rsa,
        private_key_pem: private_key_pem.to_string(),
        public_key_pem,
    })
}

fn generate_ecdsa_keypair(curve: EcCurve) -> Result<KeyPair, SigningError> {
    use p256::pkcs8::{EncodePrivateKey, EncodePublicKey, LineEnding};

    let signing_key = match curve {
        EcCurve::P256 => EcdsaSigningKey::random(&mut rand::rngs::OsRng),
    };
    let verifying_key = signing_key.verifying_key();

    let private_key_pem = signing_key.to_pkcs8_pem(LineEnding::LF).map_err(|e| {
        SigningError::KeyGeneration(format!("Failed to encode private key: {}", e))
    })?;
    let public_key_pem = verifying_key.to_public_key_pem(LineEnding::LF).map_err(|e| {
        SigningError::KeyGeneration(format!("Failed to encode public key: {}", e))
    })?;

    Ok(KeyPair {
        algorithm: SignatureAlgorithm::Ecdsa,
        private_key_pem: private_key_pem.to_string(),
        public_key_pem,
    })
}

/// Signs a message with a PEM private key.
///
/// RSA signatures are randomized (PSS), so signing the same message twice
/// yields different bytes that both verify.
///
/// # Errors
///
/// Returns `SigningError::KeyDecode` if the key is not a PKCS#8 key of the
/// requested algorithm.
pub fn sign_message(
    algorithm: SignatureAlgorithm,
    private_key_pem: &str,
    message: &[u8],
) -> Result<Vec<u8>, SigningError> {
    expect_pem_tag(private_key_pem, PRIVATE_KEY_PEM_TAG)?;

    match algorithm {
        SignatureAlgorithm::Rsa => sign_rsa_pss(private_key_pem, message),
        SignatureAlgorithm::Ecdsa => sign_ecdsa_p256(private_key_pem, message),
    }
}

/// Rejects RSA moduli outside [`MIN_RSA_BITS`]..=[`MAX_RSA_BITS`].
pub fn check_rsa_bits(bits: usize) -> Result<(), SigningError> {
    if bits < MIN_RSA_BITS {
        return Err(SigningError::WeakKey {
            bits,
            minimum: MIN_RSA_BITS,
        });
    }
    if bits > MAX_RSA_BITS {
        return Err(SigningError::OversizedKey {
            bits,
            maximum: MAX_RSA_BITS,
        });
    }
    Ok(())
}

fn sign_rsa_pss(private_key_pem: &str, message: &[u8]) -> Result<Vec<u8>, SigningError> {
    use rsa::pkcs8::DecodePrivateKey;
    use rsa::signature::{RandomizedSigner, SignatureEncoding};
    use rsa::traits::PublicKeyParts;

    let private_key = RsaPrivateKey::from_pkcs8_pem(private_key_pem)
        .map_err(|e| SigningError::KeyDecode(format!("Invalid RSA private key: {}", e)))?;
    check_rsa_bits(private_key.size() * 8)?;

    let signing_key = PssSigningKey::<Sha256>::new(private_key);
    let signature = signing_key
        .try_sign_with_rng(&mut rand::thread_rng(), message)
        .map_err(|e| SigningError::SignatureFailed(e.to_string()))?;

    Ok(signature.to_vec())
}

fn sign_ecdsa_p256(private_key_pem: &str, message: &[u8]) -> Result<Vec<u8>, SigningError> {
    use p256::ecdsa::signature::Signer;
    use p256::pkcs8::DecodePrivateKey;

    let signing_key = EcdsaSigningKey::from_pkcs8_pem(private_key_pem)
        .map_err(|e| SigningError::KeyDecode(format!("Invalid P-256 private key: {}", e)))?;

    let signature: EcdsaSignature = signing_key
        .try_sign(message)
        .map_err(|e| SigningError::SignatureFailed(e.to_string()))?;

    Ok(signature.to_der().to_bytes().to_vec())
}

/// Verifies a signature over `message` with a PEM public key.
///
/// # Returns
///
/// `Ok(())` if the signature is valid.
///
/// # Errors
///
/// Returns `SigningError::VerificationFailed` for a well-formed signature
/// that does not match, and `KeyDecode`/`SignatureDecode` when the inputs
/// cannot be decoded at all.
pub fn verify_message(
    algorithm: SignatureAlgorithm,
    public_key_pem: &str,
    message: &[u8],
    signature: &[u8],
) -> Result<(), SigningError> {
    expect_pem_tag(public_key_pem, PUBLIC_KEY_PEM_TAG)?;

    match algorithm {
        SignatureAlgorithm::Rsa => verify_rsa_pss(public_key_pem, message, signature),
        SignatureAlgorithm::Ecdsa => verify_ecdsa_p256(public_key_pem, message, signature),
    }
}

fn verify_rsa_pss(
    public_key_pem: &str,
    message: &[u8],
    signature: &[u8],
) -> Result<(), SigningError> {
    use rsa::pkcs8::DecodePublicKey;
    use rsa::signature::Verifier;
    use rsa::traits::PublicKeyParts;

    let public_key = RsaPublicKey::from_public_key_pem(public_key_pem)
        .map_err(|e| SigningError::KeyDecode(format!("Invalid RSA public key: {}", e)))?;
    check_rsa_bits(public_key.size() * 8)?;

    let verifying_key = PssVerifyingKey::<Sha256>::new(public_key);
    let sig = PssSignature::try_from(signature)
        .map_err(|e| SigningError::SignatureDecode(e.to_string()))?;

    verifying_key
        .verify(message, &sig)
        .map_err(|_| SigningError::VerificationFailed)
}

fn verify_ecdsa_p256(
    public_key_pem: &str,
    message: &[u8],
    signature: &[u8],
) -> Result<(), SigningError> {
    use p256::ecdsa::signature::Verifier;
    use p256::pkcs8::DecodePublicKey;

    let verifying_key = EcdsaVerifyingKey::from_public_key_pem(public_key_pem)
        .map_err(|e| SigningError::KeyDecode(format!("Invalid P-256 public key: {}", e)))?;

    let sig = EcdsaSignature::from_der(signature)
        .map_err(|e| SigningError::SignatureDecode(e.to_string()))?;

    verifying_key
        .verify(message, &sig)
        .map_err(|_| SigningError::VerificationFailed)
}

/// Determines which algorithm a PEM public key belongs to.
///
/// Returns `None` if the key is neither an RSA nor a P-256 public key.
pub fn detect_algorithm(public_key_pem: &str) -> Option<SignatureAlgorithm> {
    {
        use rsa::pkcs8::DecodePublicKey;
        if RsaPublicKey::from_public_key_pem(public_key_pem).is_ok() {
            return Some(SignatureAlgorithm::Rsa);
        }
    }
    {
        use p256::pkcs8::DecodePublicKey;
        if EcdsaVerifyingKey::from_public_key_pem(public_key_pem).is_ok() {
            return Some(SignatureAlgorithm::Ecdsa);
        }
    }

    None
}

/// Checks that a public key is usable for signing and verification.
///
/// Returns the key's algorithm, or `WeakKey`/`OversizedKey` for RSA moduli
/// outside the accepted range and `KeyDecode` for anything else.
pub fn validate_public_key(public_key_pem: &str) -> Result<SignatureAlgorithm, SigningError> {
    use rsa::traits::PublicKeyParts;

    expect_pem_tag(public_key_pem, PUBLIC_KEY_PEM_TAG)?;

    {
        use rsa::pkcs8::DecodePublicKey;
        if let Ok(key) = RsaPublicKey::from_public_key_pem(public_key_pem) {
            check_rsa_bits(key.size() * 8)?;
            return Ok(SignatureAlgorithm::Rsa);
        }
    }
    {
        use p256::pkcs8::DecodePublicKey;
        if EcdsaVerifyingKey::from_public_key_pem(public_key_pem).is_ok() {
            return Ok(SignatureAlgorithm::Ecdsa);
        }
    }

    Err(SigningError::KeyDecode(
        "Public key is neither a supported RSA key nor a P-256 key".to_string(),
    ))
}

/// Checks that `text` is a single PEM block with the expected label.
fn expect_pem_tag(text: &str, expected: &str) -> Result<(), SigningError> {
    let block = pem::parse(text).map_err(|e| SigningError::KeyDecode(e.to_string()))?;

    if block.tag() != expected {
        return Err(SigningError::KeyDecode(format!(
            "Expected PEM tag '{}', got '{}'",
            expected,
            block.tag()
        )));
    }

    Ok(())
}
