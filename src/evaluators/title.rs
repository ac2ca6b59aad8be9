// File: evaluators/title.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2023-2026
// - Volker Schwaberow <volker@schwaberow.de>

use once_cell::sync::Lazy;
use regex::Regex;

use crate::errors::ProbeError;
use crate::evaluators::{Evaluator, ProbeContext, ProbeOutcome};
use crate::fingerprint::{ProbeSpec, ProbeType};

static TITLE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)<title[^>]*>(.*?)</title>").unwrap());

pub fn extract_title(html: &str) -> Option<String> {
    TITLE
        .captures(html)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
}

pub struct TitleEvaluator;

impl Evaluator for TitleEvaluator {
    fn name(&self) -> &'static str {
        "Title Pattern"
    }

    fn probe_type(&self) -> ProbeType {
        ProbeType::TitlePattern
    }

    fn evaluate(
        &self,
        spec: &ProbeSpec,
        points: u32,
        ctx: &ProbeContext<'_>,
    ) -> Result<ProbeOutcome, ProbeError> {
        let text = ctx.response.text();
        let title = match extract_title(&text) {
            Some(title) => title,
            None => return Ok(ProbeOutcome::miss(ProbeType::TitlePattern, None)),
        };

        if spec.expected_values().any(|pattern| title.contains(pattern)) {
            let shown: String = title.chars().take(50).collect();
            Ok(ProbeOutcome::hit(
                ProbeType::TitlePattern,
                points,
                format!("title:{}", shown),
            ))
        } else {
            Ok(ProbeOutcome::miss(ProbeType::TitlePattern, None))
        }
    }
}
