// File: evaluators/mod.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2023-2026
// - Volker Schwaberow <volker@schwaberow.de>

pub mod body;
pub mod favicon;
pub mod hashing;
pub mod header;
pub mod image;
pub mod title;


use serde::Serialize;

use crate::errors::ProbeError;
use crate::fingerprint::{ProbeSpec, ProbeType};
use crate::httpinner::HttpInner;
use crate::tls_analyzer::CertificateInfo;

/// What an evaluator may look at: the response fetched for the probe's path
/// and, over https, the candidate's leaf certificate.
pub struct ProbeContext<'a> {
    pub response: &'a HttpInner,
    pub certificate: Option<&'a CertificateInfo>,
}

impl<'a> ProbeContext<'a> {
    pub fn new(response: &'a HttpInner) -> Self {
        Self {
            response,
            certificate: None,
        }
    }

    pub fn with_certificate(mut self, certificate: Option<&'a CertificateInfo>) -> Self {
        self.certificate = certificate;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProbeOutcome {
    pub probe_type: ProbeType,
    pub matched: bool,
    pub points_awarded: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evidence: Option<String>,
}

impl ProbeOutcome {
    pub fn hit(probe_type: ProbeType, points: u32, evidence: String) -> Self {
        Self {
            probe_type,
            matched: true,
            points_awarded: points,
            evidence: Some(evidence),
        }
    }

    pub fn miss(probe_type: ProbeType, evidence: Option<String>) -> Self {
        Self {
            probe_type,
            matched: false,
            points_awarded: 0,
            evidence,
        }
    }
}

/// One comparison between an observed signal and a fingerprint entry.
/// Implementations must not mutate anything they are handed.
pub trait Evaluator: Send + Sync {
    fn name(&self) -> &'static str;
    fn probe_type(&self) -> ProbeType;
    fn evaluate(
        &self,
        spec: &ProbeSpec,
        points: u32,
        ctx: &ProbeContext<'_>,
    ) -> Result<ProbeOutcome, ProbeError>;
}

pub struct EvaluatorSet {
    evaluators: Vec<Box<dyn Evaluator>>,
}

impl EvaluatorSet {
    pub fn new() -> Self {
        let mut set = Self::empty();
        set.register_known_evaluators();
        set
    }

    pub fn empty() -> Self {
        Self {
            evaluators: Vec::new(),
        }
    }

    /// Adds an evaluator, replacing any earlier one for the same probe type.
    pub fn register(&mut self, evaluator: Box<dyn Evaluator>) {
        let probe_type = evaluator.probe_type();
        self.evaluators.retain(|e| e.probe_type() != probe_type);
        self.evaluators.push(evaluator);
    }

    pub fn register_known_evaluators(&mut self) {
        self.register(Box::new(favicon::FaviconEvaluator));
        self.register(Box::new(image::ImageEvaluator));
        self.register(Box::new(title::TitleEvaluator));
        self.register(Box::new(body::BodyEvaluator));
        self.register(Box::new(header::HeaderEvaluator));
    }

    pub fn list(&self) -> Vec<String> {
        self.evaluators.iter().map(|e| e.name().to_string()).collect()
    }

    pub fn evaluate(
        &self,
        spec: &ProbeSpec,
        points: u32,
        ctx: &ProbeContext<'_>,
    ) -> Result<ProbeOutcome, ProbeError> {
        let evaluator = self
            .evaluators
            .iter()
            .find(|e| e.probe_type() == spec.probe_type)
            .ok_or_else(|| ProbeError::Evaluator {
                probe: spec.probe_type,
                reason: "no evaluator registered".to_string(),
            })?;
        evaluator.evaluate(spec, points, ctx)
    }
}

impl Default for EvaluatorSet {
    fn default() -> Self {
        Self::new()
    }
}
