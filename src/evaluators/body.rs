// File: evaluators/body.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2023-2026
// - Volker Schwaberow <volker@schwaberow.de>

use crate::errors::ProbeError;
use crate::evaluators::{Evaluator, ProbeContext, ProbeOutcome};
use crate::fingerprint::{ProbeSpec, ProbeType};

pub struct BodyEvaluator;

impl Evaluator for BodyEvaluator {
    fn name(&self) -> &'static str {
        "Body Pattern"
    }

    fn probe_type(&self) -> ProbeType {
        ProbeType::BodyPattern
    }

    fn evaluate(
        &self,
        spec: &ProbeSpec,
        points: u32,
        ctx: &ProbeContext<'_>,
    ) -> Result<ProbeOutcome, ProbeError> {
        let body = ctx.response.text().to_lowercase();
        let found = spec
            .expected_values()
            .find(|pattern| body.contains(&pattern.to_lowercase()));

        match found {
            Some(pattern) => {
                let shown: String = pattern.chars().take(30).collect();
                Ok(ProbeOutcome::hit(
                    ProbeType::BodyPattern,
                    points,
                    format!("body:{}", shown),
                ))
            }
            None => Ok(ProbeOutcome::miss(ProbeType::BodyPattern, None)),
        }
    }
}
