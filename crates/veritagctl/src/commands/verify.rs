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
use serde_json::json;
use std::path::PathBuf;
use veritag::{
    verify_payload, FailedCheck, FileKeyManager, RegistryConfig, SignedPayload, Verdict,
    VerificationReport,
};

use crate::cli::Cli;
use crate::utils::{should_print, LogLevel};

/// All checks passed.
pub const EXIT_VERIFIED: i32 = 0;
/// Operational error (unreadable or malformed payload, bad configuration).
pub const EXIT_ERROR: i32 = 1;
/// Author authentication failed.
pub const EXIT_AUTHENTICATION_FAILED: i32 = 2;
/// Digest mismatch.
pub const EXIT_INTEGRITY_FAILED: i32 = 3;
/// Signature did not verify.
pub const EXIT_SIGNATURE_FAILED: i32 = 4;

/// Exit code for a report: the first failing check in evaluation order.
pub fn exit_code_for(report: &VerificationReport) -> i32 {
    match report.first_failure() {
        None => EXIT_VERIFIED,
        Some(FailedCheck::Authenticity) => EXIT_AUTHENTICATION_FAILED,
        Some(FailedCheck::Integrity) => EXIT_INTEGRITY_FAILED,
        Some(FailedCheck::Signature) => EXIT_SIGNATURE_FAILED,
    }
}

pub fn verify_payload_file(
    config: &RegistryConfig,
    payload_path: Option<PathBuf>,
    as_json: bool,
    cli: &Cli,
) -> Result<VerificationReport> {
    let path = payload_path.unwrap_or_else(|| config.transaction_path().to_path_buf());
    let payload = SignedPayload::read_from_file(&path)
        .with_context(|| format!("Failed to load payload from {:?}", path))?;

    let keys = FileKeyManager::new(config.clone());
    let report = verify_payload(&keys, &payload);

    if as_json {
        let output = serde_json::to_string_pretty(&report_json(&payload, &report))
            .context("Failed to serialize report to JSON")?;
        println!("{}", output);
    } else if should_print(cli, LogLevel::Info) || !report.is_verified() {
        println!("Payload:      {}", path.display());
        println!("Author:       {}", payload.author().unwrap_or("<none>"));
        println!("Algorithm:    {}", payload.algorithm);
        println!("Authenticity: {}", report.authenticity);
        println!("Integrity:    {}", report.integrity);
        println!("Signature:    {}", report.signature);
        println!(
            "Result:       {}",
            if report.is_verified() {
                "VERIFIED"
            } else {
                "REJECTED"
            }
        );
    }

    Ok(report)
}

fn report_json(payload: &SignedPayload, report: &VerificationReport) -> serde_json::Value {
    json!({
        "author": payload.author(),
        "algorithm": payload.algorithm.as_str(),
        "pubkey_fingerprint": payload.pubkey_fingerprint,
        "verified": report.is_verified(),
        "first_failure": report.first_failure().map(|c| c.as_str()),
        "authenticity": verdict_json(&report.authenticity),
        "integrity": verdict_json(&report.integrity),
        "signature": verdict_json(&report.signature),
    })
}

fn verdict_json(verdict: &Verdict) -> serde_json::Value {
    let status = match verdict {
        Verdict::Valid => "valid",
        Verdict::Invalid { .. } => "invalid",
        Verdict::Unevaluable { .. } => "unevaluable",
    };
    json!({
        "valid": verdict.is_valid(),
        "status": status,
        "reason": verdict.reason(),
    })
}
