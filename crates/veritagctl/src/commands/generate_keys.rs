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

use anyhow::{Context, Result};
use veritag::{FileKeyManager, KeyManager, KeyParams, RegistryConfig, SignatureAlgorithm};

use crate::cli::Cli;
use crate::utils::{should_print, LogLevel};

pub fn generate_keys(
    config: &RegistryConfig,
    algorithm: SignatureAlgorithm,
    author: &str,
    rsa_bits: Option<usize>,
    cli: &Cli,
) -> Result<()> {
    let params = match algorithm {
        SignatureAlgorithm::Rsa => KeyParams::Rsa {
            bits: rsa_bits.unwrap_or(config.default_rsa_bits()),
        },
        SignatureAlgorithm::Ecdsa => {
            if rsa_bits.is_some() {
                tracing::warn!("--rsa-bits is ignored for ECDSA keys");
            }
            KeyParams::default_for(SignatureAlgorithm::Ecdsa)
        }
    };

    if should_print(cli, LogLevel::Debug) {
        println!("Generating {} key pair for {:?}", algorithm, author);
    }

    let keys = FileKeyManager::new(config.clone());
    let registered = keys
        .generate_and_register(author, params)
        .with_context(|| format!("Failed to generate keys for author {:?}", author))?;

    if should_print(cli, LogLevel::Info) {
        if registered.replaced {
            println!("Replaced existing key for {}", registered.author);
        }
        println!("Author:      {}", registered.author);
        println!("Algorithm:   {}", registered.algorithm);
        println!("Fingerprint: {}", registered.fingerprint);
        println!("Registry:    {}", config.public_registry_path().display());
    }

    Ok(())
}
