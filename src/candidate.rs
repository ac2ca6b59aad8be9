// File: candidate.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2023-2026
// - Volker Schwaberow <volker@schwaberow.de>

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

use crate::errors::LoadError;

const HTTPS_PORTS: [u16; 2] = [443, 8443];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scheme {
    Http,
    Https,
}

impl Scheme {
    pub fn for_port(port: u16) -> Self {
        if HTTPS_PORTS.contains(&port) {
            Scheme::Https
        } else {
            Scheme::Http
        }
    }

    pub fn alternate(&self) -> Self {
        match self {
            Scheme::Http => Scheme::Https,
            Scheme::Https => Scheme::Http,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Scheme::Http => "http",
            Scheme::Https => "https",
        }
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    #[serde(alias = "ip")]
    pub host: String,
    pub port: u16,
    #[serde(default, alias = "protocol", skip_serializing_if = "Option::is_none")]
    pub protocol_hint: Option<Scheme>,
    #[serde(default)]
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

impl Candidate {
    pub fn new(host: &str, port: u16) -> Self {
        Self {
            host: host.to_string(),
            port,
            protocol_hint: None,
            source: String::new(),
            metadata: None,
        }
    }

    pub fn with_hint(mut self, scheme: Scheme) -> Self {
        self.protocol_hint = Some(scheme);
        self
    }

    pub fn with_source(mut self, source: &str) -> Self {
        self.source = source.to_string();
        self
    }

    pub fn key(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn initial_scheme(&self) -> Scheme {
        self.protocol_hint
            .unwrap_or_else(|| Scheme::for_port(self.port))
    }

    pub fn base_url(&self, scheme: Scheme) -> String {
        if self.host.contains(':') && !self.host.starts_with('[') {
            format!("{}://[{}]:{}", scheme, self.host, self.port)
        } else {
            format!("{}://{}:{}", scheme, self.host, self.port)
        }
    }
}

/// Reads either a JSON array of candidate records or one record per line.
pub fn parse_candidates(data: &str) -> Result<Vec<Candidate>, LoadError> {
    let trimmed = data.trim_start();
    if trimmed.starts_with('[') {
        return Ok(serde_json::from_str(trimmed)?);
    }

    let mut candidates = Vec::new();
    for (number, line) in data.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let candidate: Candidate = serde_json::from_str(line).map_err(|e| {
            LoadError::Invalid(format!("candidate line {}: {}", number + 1, e))
        })?;
        candidates.push(candidate);
    }
    Ok(candidates)
}

pub fn load_candidates<P: AsRef<Path>>(path: P) -> Result<Vec<Candidate>, LoadError> {
    let data = std::fs::read_to_string(path)?;
    parse_candidates(&data)
}
