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

//! Library side of `veritagctl`: argument definitions and command
//! implementations, so they can be exercised without spawning the binary.

pub mod cli;
pub mod commands;
pub mod config;
pub mod utils;

pub use cli::{Cli, Commands, KeysCommands};
pub use commands::*;
pub use config::resolve_config;
pub use utils::*;

use anyhow::Result;

/// Run a parsed command line and return the process exit code.
///
/// Operational failures are returned as errors; verification outcomes are
/// reported through the exit code.
pub fn run(cli: &Cli) -> Result<i32> {
    let config = resolve_config(cli)?;

    match &cli.command {
        Commands::GenerateKeys {
            algorithm,
            author,
            rsa_bits,
        } => {
            generate_keys(&config, *algorithm, author, *rsa_bits, cli)?;
        }
        Commands::Sign {
            author,
            metadata,
            algorithm,
            output,
            wire,
        } => {
            sign_metadata(
                &config,
                SignArgs {
                    author,
                    metadata,
                    algorithm: *algorithm,
                    output: output.clone(),
                    wire: *wire,
                },
                cli,
            )?;
        }
        Commands::Verify { payload, json } => {
            let report = verify_payload_file(&config, payload.clone(), *json, cli)?;
            return Ok(exit_code_for(&report));
        }
        Commands::Keys(KeysCommands::List) => list_keys(&config, cli)?,
        Commands::Keys(KeysCommands::Show { author }) => show_key(&config, author, cli)?,
    }

    Ok(commands::verify::EXIT_VERIFIED)
}
