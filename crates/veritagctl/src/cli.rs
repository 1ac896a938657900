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

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use veritag::SignatureAlgorithm;

#[derive(Parser, Debug)]
#[command(
    name = "veritagctl",
    version,
    about = "Generate author keys, sign product records and verify signed payloads",
    long_about = "A tool for managing the author key registry and producing and checking signed product records"
)]
pub struct Cli {
    /// Configuration file (TOML)
    #[arg(long, env = "VERITAG_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Directory holding the key registries and transaction file
    #[arg(long, env = "VERITAG_DATA_DIR", global = true)]
    pub data_dir: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate a key pair and register it under an author
    GenerateKeys {
        /// Key algorithm (rsa or ecdsa)
        #[arg(long, default_value = "rsa")]
        algorithm: SignatureAlgorithm,

        /// Author identity (the manufacturer name)
        #[arg(long)]
        author: String,

        /// RSA modulus size; defaults to the configured size
        #[arg(long)]
        rsa_bits: Option<usize>,
    },

    /// Sign a product metadata file with the author's registered key
    Sign {
        /// Author whose registered key signs the record
        #[arg(long)]
        author: String,

        /// JSON file holding the product metadata object
        #[arg(long)]
        metadata: PathBuf,

        /// Algorithm to sign with; defaults to the registered key's type
        #[arg(long)]
        algorithm: Option<SignatureAlgorithm>,

        /// Where to write the payload; defaults to the configured transaction file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Also print the compact wire form (QR text) to stdout
        #[arg(long)]
        wire: bool,
    },

    /// Verify a signed payload against the key registry
    Verify {
        /// Payload file; defaults to the configured transaction file
        #[arg(long)]
        payload: Option<PathBuf>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Inspect the key registry
    #[command(subcommand)]
    Keys(KeysCommands),
}

#[derive(Subcommand, Debug)]
pub enum KeysCommands {
    /// List registered authors with their key fingerprints
    List,
    /// Show the registered public key for an author
    Show {
        #[arg(long)]
        author: String,
    },
}
