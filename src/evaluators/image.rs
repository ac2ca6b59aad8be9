// File: evaluators/image.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2023-2026
// - Volker Schwaberow <volker@schwaberow.de>

use crate::errors::ProbeError;
use crate::evaluators::{hashing, Evaluator, ProbeContext, ProbeOutcome};
use crate::fingerprint::{ProbeSpec, ProbeType};

/// Each configured image scores on its own.
pub struct ImageEvaluator;

impl Evaluator for ImageEvaluator {
    fn name(&self) -> &'static str {
        "Image Hash"
    }

    fn probe_type(&self) -> ProbeType {
        ProbeType::ImageHash
    }

    fn evaluate(
        &self,
        spec: &ProbeSpec,
        points: u32,
        ctx: &ProbeContext<'_>,
    ) -> Result<ProbeOutcome, ProbeError> {
        hashing::evaluate_hash_probe(spec, points, ctx)
    }
}
