// File: scoring.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2023-2026
// - Volker Schwaberow <volker@schwaberow.de>

use log::trace;

use crate::evaluators::ProbeOutcome;

pub const MAX_SCORE: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreProgress {
    Continue,
    Capped,
}

/// Running total for one pass over a candidate. Only matched probes are
/// kept and the total never exceeds [`MAX_SCORE`].
#[derive(Debug, Clone, Default)]
pub struct ScoreAggregator {
    total: u32,
    matched: Vec<ProbeOutcome>,
}

impl ScoreAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, outcome: ProbeOutcome) -> ScoreProgress {
        if outcome.matched {
            self.total = self
                .total
                .saturating_add(outcome.points_awarded)
                .min(MAX_SCORE);
            trace!(
                "{} matched for {} points, total now {}",
                outcome.probe_type,
                outcome.points_awarded,
                self.total
            );
            self.matched.push(outcome);
        }
        self.progress()
    }

    pub fn progress(&self) -> ScoreProgress {
        if self.is_capped() {
            ScoreProgress::Capped
        } else {
            ScoreProgress::Continue
        }
    }

    pub fn is_capped(&self) -> bool {
        self.total >= MAX_SCORE
    }

    pub fn total(&self) -> u32 {
        self.total
    }

    pub fn matched(&self) -> &[ProbeOutcome] {
        &self.matched
    }

    pub fn into_matched(self) -> Vec<ProbeOutcome> {
        self.matched
    }
}
