// File: classifier.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2023-2026
// - Volker Schwaberow <volker@schwaberow.de>

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::ScoreThresholds;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    Verified,
    Likely,
    Partial,
    Unlikely,
    NoMatch,
}

impl Classification {
    pub const ALL: [Classification; 5] = [
        Classification::Verified,
        Classification::Likely,
        Classification::Partial,
        Classification::Unlikely,
        Classification::NoMatch,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Classification::Verified => "verified",
            Classification::Likely => "likely",
            Classification::Partial => "partial",
            Classification::Unlikely => "unlikely",
            Classification::NoMatch => "no_match",
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Maps a final score onto a confidence bucket. Bounds are inclusive and a
/// score of 0 is always `NoMatch`, whatever the thresholds.
pub fn classify(score: u32, thresholds: &ScoreThresholds) -> Classification {
    if score == 0 {
        Classification::NoMatch
    } else if score >= thresholds.verified {
        Classification::Verified
    } else if score >= thresholds.likely {
        Classification::Likely
    } else if score >= thresholds.partial {
        Classification::Partial
    } else {
        Classification::Unlikely
    }
}
