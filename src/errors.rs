// File: errors.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2023-2026
// - Volker Schwaberow <volker@schwaberow.de>

use serde::{Serialize, Serializer};
use std::fmt;

use crate::fingerprint::ProbeType;

/// Fatal configuration problems. Raised before any candidate is touched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidWorkerCount(usize),
    InvalidTimeout(String),
    ThresholdOrder {
        verified: u32,
        likely: u32,
        partial: u32,
    },
    InvalidWeight(String),
    UnknownWeightKey(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidWorkerCount(n) => {
                write!(f, "Configuration error: worker count must be positive, got {}", n)
            }
            Self::InvalidTimeout(what) => {
                write!(f, "Configuration error: {} must be greater than zero", what)
            }
            Self::ThresholdOrder {
                verified,
                likely,
                partial,
            } => write!(
                f,
                "Configuration error: thresholds must satisfy verified >= likely >= partial (got {}/{}/{})",
                verified, likely, partial
            ),
            Self::InvalidWeight(entry) => {
                write!(f, "Configuration error: cannot parse weight override '{}'", entry)
            }
            Self::UnknownWeightKey(key) => {
                write!(f, "Configuration error: unknown probe type '{}' in weights", key)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Recoverable, per-candidate error. Attached to the candidate's result and
/// never propagated out of the batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeError {
    Liveness {
        host: String,
        port: u16,
        reason: String,
    },
    Connect {
        url: String,
        reason: String,
    },
    Timeout {
        url: String,
    },
    Transport {
        url: String,
        reason: String,
    },
    Evaluator {
        probe: ProbeType,
        reason: String,
    },
    TaskTimeout {
        budget_ms: u128,
    },
    Internal(String),
}

impl ProbeError {
    /// Connect-level failures mean the remaining requests of a pass are pointless.
    /// A timed-out request only costs that request.
    pub fn is_unreachable(&self) -> bool {
        matches!(self, Self::Connect { .. })
    }

    /// A connect that times out is still a connect failure.
    pub fn from_reqwest(url: &str, error: &reqwest::Error) -> Self {
        if error.is_connect() {
            Self::Connect {
                url: url.to_string(),
                reason: root_cause(error),
            }
        } else if error.is_timeout() {
            Self::Timeout {
                url: url.to_string(),
            }
        } else {
            Self::Transport {
                url: url.to_string(),
                reason: root_cause(error),
            }
        }
    }
}

fn root_cause(error: &dyn std::error::Error) -> String {
    let mut current = error;
    while let Some(source) = current.source() {
        current = source;
    }
    current.to_string()
}

impl fmt::Display for ProbeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Liveness { host, port, reason } => {
                write!(f, "Host not alive: {}:{} ({})", host, port, reason)
            }
            Self::Connect { url, reason } => write!(f, "Connection error: {} ({})", url, reason),
            Self::Timeout { url } => write!(f, "Request timed out: {}", url),
            Self::Transport { url, reason } => write!(f, "Transport error: {} ({})", url, reason),
            Self::Evaluator { probe, reason } => write!(f, "Probe {} skipped: {}", probe, reason),
            Self::TaskTimeout { budget_ms } => {
                write!(f, "Verification aborted after {} ms budget", budget_ms)
            }
            Self::Internal(msg) => write!(f, "Verification failed: {}", msg),
        }
    }
}

impl std::error::Error for ProbeError {}

impl Serialize for ProbeError {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

/// Problems reading the fingerprint or candidate inputs.
#[derive(Debug)]
pub enum LoadError {
    Io(std::io::Error),
    Json(serde_json::Error),
    Invalid(String),
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {}", e),
            Self::Json(e) => write!(f, "JSON error: {}", e),
            Self::Invalid(msg) => write!(f, "Invalid input: {}", msg),
        }
    }
}

impl std::error::Error for LoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Json(e) => Some(e),
            Self::Invalid(_) => None,
        }
    }
}

impl From<std::io::Error> for LoadError {
    fn from(error: std::io::Error) -> Self {
        Self::Io(error)
    }
}

impl From<serde_json::Error> for LoadError {
    fn from(error: serde_json::Error) -> Self {
        Self::Json(error)
    }
}
