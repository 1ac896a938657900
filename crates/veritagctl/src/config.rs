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

//! Registry configuration resolution for the CLI.

use anyhow::{Context, Result};
use veritag::RegistryConfig;

use crate::cli::Cli;

/// Resolve configuration: `--config` file, else `--data-dir`, else defaults.
pub fn resolve_config(cli: &Cli) -> Result<RegistryConfig> {
    if let Some(path) = &cli.config {
        let config = RegistryConfig::from_toml_file(path)
            .with_context(|| format!("Failed to load configuration from {:?}", path))?;
        tracing::debug!(config_file = %path.display(), "Loaded configuration file");
        return Ok(config);
    }

    let config = match &cli.data_dir {
        Some(dir) => RegistryConfig::in_dir(dir),
        None => RegistryConfig::default(),
    };
    config.validate().context("Invalid configuration")?;

    Ok(config)
}
