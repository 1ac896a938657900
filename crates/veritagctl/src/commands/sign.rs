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
use std::path::{Path, PathBuf};
use veritag::{
    FileKeyManager, PayloadSigner, RegistryConfig, RegistryPayloadSigner, SignatureAlgorithm,
};

use crate::cli::Cli;
use crate::utils::{should_print, LogLevel};

/// Arguments of the `sign` command.
pub struct SignArgs<'a> {
    pub author: &'a str,
    pub metadata: &'a Path,
    pub algorithm: Option<SignatureAlgorithm>,
    pub output: Option<PathBuf>,
    pub wire: bool,
}

pub fn sign_metadata(config: &RegistryConfig, args: SignArgs<'_>, cli: &Cli) -> Result<PathBuf> {
    let output = args
        .output
        .unwrap_or_else(|| config.transaction_path().to_path_buf());
    let signer = RegistryPayloadSigner::new(FileKeyManager::new(config.clone()), output);

    let payload = signer
        .sign_metadata_file(args.author, args.metadata, args.algorithm)
        .with_context(|| format!("Failed to sign {:?} as {:?}", args.metadata, args.author))?;
    let path = signer.publish(&payload).context("Failed to publish payload")?;

    if should_print(cli, LogLevel::Info) {
        println!("Signed {} as {}", args.metadata.display(), args.author);
        println!("Algorithm:   {}", payload.algorithm);
        println!("Digest:      {}", payload.digest);
        println!("Fingerprint: {}", payload.pubkey_fingerprint);
        println!("Signed at:   {}", payload.signed_at);
        println!("Payload:     {}", path.display());
    }

    if args.wire {
        let wire = payload.to_wire().context("Failed to encode payload")?;
        println!("{}", wire);
    }

    Ok(path)
}
