// File: report.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2025-2026
// - Volker Schwaberow <volker@schwaberow.de>

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::candidate::Scheme;
use crate::classifier::Classification;
use crate::errors::ProbeError;
use crate::evaluators::ProbeOutcome;
use crate::fingerprint::{Fingerprint, FingerprintMode};
use crate::getstate::StateSnapshot;
use crate::tls_analyzer::CertificateInfo;
use crate::verifier::VerificationResult;

/// Exported form of one verification result.
#[derive(Debug, Clone, Serialize)]
pub struct ReportEntry {
    pub host: String,
    pub port: u16,
    pub score: u32,
    pub classification: Classification,
    pub matched_probes: Vec<ProbeOutcome>,
    pub errors: Vec<ProbeError>,
    pub probed_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheme: Option<Scheme>,
    pub alternate_scheme_tried: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prefix_used: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tls: Option<CertificateInfo>,
    pub duration_ms: u64,
}

impl From<&VerificationResult> for ReportEntry {
    fn from(result: &VerificationResult) -> Self {
        ReportEntry {
            host: result.candidate.host.clone(),
            port: result.candidate.port,
            score: result.total_score,
            classification: result.classification,
            matched_probes: result.matched_probes.clone(),
            errors: result.errors.clone(),
            probed_at: result.probed_at,
            source: result.candidate.source.clone(),
            metadata: result.candidate.metadata.clone(),
            scheme: result.scheme,
            alternate_scheme_tried: result.alternate_scheme_tried,
            prefix_used: result.prefix_used.clone(),
            tls: result.tls.clone(),
            duration_ms: result.duration_ms,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportSummary {
    pub total_candidates: usize,
    pub exported: usize,
    pub min_score: u32,
    pub classifications: BTreeMap<Classification, usize>,
    pub with_errors: usize,
    pub scheme_usage: BTreeMap<String, usize>,
    pub alternate_scheme_tried: usize,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub duration_ms: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<StateSnapshot>,
}

#[derive(Debug, Clone, Serialize)]
pub struct VerificationReport {
    pub app_name: String,
    pub mode: FingerprintMode,
    pub summary: ReportSummary,
    pub results: Vec<ReportEntry>,
}

impl VerificationReport {
    /// Counts cover every result; only results scoring at least `min_score`
    /// are exported, highest score first.
    pub fn build(
        fingerprint: &Fingerprint,
        results: &[VerificationResult],
        min_score: u32,
        started_at: DateTime<Utc>,
        finished_at: DateTime<Utc>,
    ) -> Self {
        let mut classifications: BTreeMap<Classification, usize> =
            Classification::ALL.iter().map(|c| (*c, 0)).collect();
        let mut scheme_usage: BTreeMap<String, usize> = BTreeMap::new();
        let mut with_errors = 0;
        let mut alternate_scheme_tried = 0;

        for result in results {
            *classifications.entry(result.classification).or_insert(0) += 1;
            let scheme = result
                .scheme
                .map(|s| s.as_str())
                .unwrap_or("none")
                .to_string();
            *scheme_usage.entry(scheme).or_insert(0) += 1;
            if !result.errors.is_empty() {
                with_errors += 1;
            }
            if result.alternate_scheme_tried {
                alternate_scheme_tried += 1;
            }
        }

        let mut entries: Vec<ReportEntry> = results
            .iter()
            .filter(|r| r.total_score >= min_score)
            .map(ReportEntry::from)
            .collect();
        entries.sort_by(|a, b| b.score.cmp(&a.score));

        VerificationReport {
            app_name: fingerprint.app_name.clone(),
            mode: fingerprint.mode,
            summary: ReportSummary {
                total_candidates: results.len(),
                exported: entries.len(),
                min_score,
                classifications,
                with_errors,
                scheme_usage,
                alternate_scheme_tried,
                started_at,
                finished_at,
                duration_ms: (finished_at - started_at).num_milliseconds(),
                stats: None,
            },
            results: entries,
        }
    }

    pub fn with_stats(mut self, stats: StateSnapshot) -> Self {
        self.summary.stats = Some(stats);
        self
    }

    pub fn count(&self, classification: Classification) -> usize {
        self.summary
            .classifications
            .get(&classification)
            .copied()
            .unwrap_or(0)
    }
}

pub struct ReportGenerator;

impl ReportGenerator {
    pub fn to_json(report: &VerificationReport) -> Result<String> {
        serde_json::to_string_pretty(report).context("Failed to serialize verification report")
    }

    pub fn generate_json_report<P: AsRef<Path>>(
        report: &VerificationReport,
        output_path: P,
    ) -> Result<()> {
        let output_path = output_path.as_ref();
        let json = Self::to_json(report)?;
        let mut file = File::create(output_path)
            .with_context(|| format!("Failed to create {}", output_path.display()))?;
        writeln!(file, "{}", json)
            .with_context(|| format!("Failed to write {}", output_path.display()))?;
        Ok(())
    }
}
