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

use anyhow::{bail, Result};
use veritag::{FileKeyManager, KeyManager, RegistryConfig};

use crate::cli::Cli;
use crate::utils::{should_print, LogLevel};

pub fn list_keys(config: &RegistryConfig, cli: &Cli) -> Result<()> {
    let keys = FileKeyManager::new(config.clone());
    let authors = keys.list_authors();

    if authors.is_empty() {
        if should_print(cli, LogLevel::Info) {
            println!(
                "No keys registered in {}",
                config.public_registry_path().display()
            );
        }
        return Ok(());
    }

    for author in authors {
        match keys.lookup_public(&author) {
            Some(entry) => {
                let algorithm = entry
                    .algorithm()
                    .map(|a| a.as_str())
                    .unwrap_or("UNKNOWN");
                println!("{:<32} {:<6} {}", author, algorithm, entry.fingerprint);
            }
            None => println!("{:<32} {:<6} <unreadable entry>", author, "-"),
        }
    }

    Ok(())
}

pub fn show_key(config: &RegistryConfig, author: &str, cli: &Cli) -> Result<()> {
    let keys = FileKeyManager::new(config.clone());

    let Some(entry) = keys.lookup_public(author) else {
        bail!("No key registered for author {:?}", author);
    };

    if should_print(cli, LogLevel::Info) {
        println!("Author:      {}", entry.author);
        if let Some(algorithm) = entry.algorithm() {
            println!("Algorithm:   {}", algorithm);
        }
        println!("Fingerprint: {}", entry.fingerprint);
        println!();
    }
    print!("{}", entry.public_key_pem);

    Ok(())
}
