// File: evaluators/header.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2023-2026
// - Volker Schwaberow <volker@schwaberow.de>

use crate::errors::ProbeError;
use crate::evaluators::{Evaluator, ProbeContext, ProbeOutcome};
use crate::fingerprint::{ProbeSpec, ProbeType};

/// Exact comparison when `exact` is set, case-insensitive containment
/// otherwise. Repeated headers match if any instance does.
pub struct HeaderEvaluator;

impl Evaluator for HeaderEvaluator {
    fn name(&self) -> &'static str {
        "Header Pattern"
    }

    fn probe_type(&self) -> ProbeType {
        ProbeType::HeaderPattern
    }

    fn evaluate(
        &self,
        spec: &ProbeSpec,
        points: u32,
        ctx: &ProbeContext<'_>,
    ) -> Result<ProbeOutcome, ProbeError> {
        let (name, expected) = spec.header_pair().ok_or_else(|| ProbeError::Evaluator {
            probe: ProbeType::HeaderPattern,
            reason: "no header name configured".to_string(),
        })?;

        let expected_lower = expected.to_lowercase();
        let found = ctx.response.header_values(name).into_iter().find(|value| {
            if spec.exact {
                value.trim() == expected
            } else {
                value.to_lowercase().contains(&expected_lower)
            }
        });

        match found {
            Some(value) => Ok(ProbeOutcome::hit(
                ProbeType::HeaderPattern,
                points,
                format!("header:{}: {}", name.to_lowercase(), value),
            )),
            None => Ok(ProbeOutcome::miss(ProbeType::HeaderPattern, None)),
        }
    }
}
