// File: evaluators/hashing.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2023-2026
// - Volker Schwaberow <volker@schwaberow.de>

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use murmur3::murmur3_32;
use sha2::{Digest, Sha256};
use std::io::Cursor;

use crate::errors::ProbeError;
use crate::evaluators::{ProbeContext, ProbeOutcome};
use crate::fingerprint::{HashAlgorithm, ProbeSpec, ProbeType};

// MIME line length used by Shodan's favicon hash.
const BASE64_LINE_INPUT: usize = 57;

/// Base64 with a newline after every 76 output characters, trailing newline
/// included.
pub fn mime_base64(data: &[u8]) -> String {
    let mut out = String::with_capacity(data.len() * 4 / 3 + data.len() / BASE64_LINE_INPUT + 4);
    for chunk in data.chunks(BASE64_LINE_INPUT) {
        out.push_str(&BASE64.encode(chunk));
        out.push('\n');
    }
    out
}

fn signed_mmh3(encoded: &str) -> Result<String, String> {
    let hash = murmur3_32(&mut Cursor::new(encoded.as_bytes()), 0)
        .map_err(|e| format!("mmh3 failed: {}", e))?;
    Ok((hash as i32).to_string())
}

/// Signed 32-bit MurmurHash3 of the MIME base64 encoding, as Shodan renders it.
pub fn shodan_mmh3(data: &[u8]) -> Result<String, String> {
    signed_mmh3(&mime_base64(data))
}

/// Signed 32-bit MurmurHash3 of the unwrapped base64 encoding.
pub fn plain_mmh3(data: &[u8]) -> Result<String, String> {
    signed_mmh3(&BASE64.encode(data))
}

/// Favicon form of every hash family. Mmh3 follows Shodan's convention.
pub fn digest(algorithm: HashAlgorithm, data: &[u8]) -> Result<String, String> {
    match algorithm {
        HashAlgorithm::Mmh3 => shodan_mmh3(data),
        HashAlgorithm::Sha256 => Ok(format!("{:x}", Sha256::digest(data))),
        HashAlgorithm::Md5 => Ok(format!("{:x}", md5::compute(data))),
    }
}

/// Hash as a given probe type computes it. Image mmh3 hashes unwrapped base64.
pub fn probe_digest(
    probe_type: ProbeType,
    algorithm: HashAlgorithm,
    data: &[u8],
) -> Result<String, String> {
    match (probe_type, algorithm) {
        (ProbeType::ImageHash, HashAlgorithm::Mmh3) => plain_mmh3(data),
        _ => digest(algorithm, data),
    }
}

pub fn hashes_match(actual: &str, expected: &str) -> bool {
    actual.trim().eq_ignore_ascii_case(expected.trim())
}

/// Shared body of the favicon and image evaluators.
pub fn evaluate_hash_probe(
    spec: &ProbeSpec,
    points: u32,
    ctx: &ProbeContext<'_>,
) -> Result<ProbeOutcome, ProbeError> {
    let response = ctx.response;
    if !response.is_success() {
        return Err(ProbeError::Evaluator {
            probe: spec.probe_type,
            reason: format!("HTTP {} at {}", response.status(), response.url()),
        });
    }
    if response.body().is_empty() {
        return Err(ProbeError::Evaluator {
            probe: spec.probe_type,
            reason: format!("empty body at {}", response.url()),
        });
    }

    let algorithm = spec.hash_algorithm();
    let actual = probe_digest(spec.probe_type, algorithm, response.body()).map_err(|reason| {
        ProbeError::Evaluator {
            probe: spec.probe_type,
            reason,
        }
    })?;
    let evidence = format!("{}:{}", algorithm, actual);

    if spec.expected_values().any(|expected| hashes_match(&actual, expected)) {
        Ok(ProbeOutcome::hit(spec.probe_type, points, evidence))
    } else {
        Ok(ProbeOutcome::miss(spec.probe_type, Some(evidence)))
    }
}
