// File: fingerprint.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2023-2026
// - Volker Schwaberow <volker@schwaberow.de>

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

use crate::config::ProbeWeights;
use crate::errors::LoadError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbeType {
    FaviconHash,
    ImageHash,
    TitlePattern,
    BodyPattern,
    HeaderPattern,
}

impl ProbeType {
    pub const ALL: [ProbeType; 5] = [
        ProbeType::FaviconHash,
        ProbeType::ImageHash,
        ProbeType::TitlePattern,
        ProbeType::BodyPattern,
        ProbeType::HeaderPattern,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProbeType::FaviconHash => "favicon_hash",
            ProbeType::ImageHash => "image_hash",
            ProbeType::TitlePattern => "title_pattern",
            ProbeType::BodyPattern => "body_pattern",
            ProbeType::HeaderPattern => "header_pattern",
        }
    }

    /// Short aliases accepted by `--weights`.
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "favicon" | "favicon_hash" => Some(ProbeType::FaviconHash),
            "image" | "image_hash" => Some(ProbeType::ImageHash),
            "title" | "title_pattern" => Some(ProbeType::TitlePattern),
            "body" | "body_pattern" => Some(ProbeType::BodyPattern),
            "header" | "header_pattern" => Some(ProbeType::HeaderPattern),
            _ => None,
        }
    }

    pub fn is_hash(&self) -> bool {
        matches!(self, ProbeType::FaviconHash | ProbeType::ImageHash)
    }
}

impl fmt::Display for ProbeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    Mmh3,
    Sha256,
    Md5,
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HashAlgorithm::Mmh3 => write!(f, "mmh3"),
            HashAlgorithm::Sha256 => write!(f, "sha256"),
            HashAlgorithm::Md5 => write!(f, "md5"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FingerprintMode {
    #[default]
    Application,
    Organization,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeSpec {
    #[serde(rename = "type")]
    pub probe_type: ProbeType,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub points: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash_algorithm: Option<HashAlgorithm>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub alt_values: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header: Option<String>,
    #[serde(default)]
    pub exact: bool,
}

impl ProbeSpec {
    pub fn new(probe_type: ProbeType, value: &str) -> Self {
        Self {
            probe_type,
            value: value.to_string(),
            points: None,
            hash_algorithm: None,
            path: None,
            alt_values: Vec::new(),
            header: None,
            exact: false,
        }
    }

    pub fn with_path(mut self, path: &str) -> Self {
        self.path = Some(path.to_string());
        self
    }

    pub fn with_points(mut self, points: u32) -> Self {
        self.points = Some(points);
        self
    }

    pub fn with_hash_algorithm(mut self, algorithm: HashAlgorithm) -> Self {
        self.hash_algorithm = Some(algorithm);
        self
    }

    /// Request path relative to the pass prefix. Text probes read the root page.
    pub fn path(&self) -> &str {
        match (&self.path, self.probe_type) {
            (Some(path), _) => path.as_str(),
            (None, ProbeType::FaviconHash) => "/favicon.ico",
            (None, _) => "/",
        }
    }

    pub fn hash_algorithm(&self) -> HashAlgorithm {
        self.hash_algorithm.unwrap_or(match self.probe_type {
            ProbeType::FaviconHash => HashAlgorithm::Mmh3,
            _ => HashAlgorithm::Sha256,
        })
    }

    pub fn expected_values(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.value.as_str())
            .chain(self.alt_values.iter().map(String::as_str))
            .filter(|v| !v.is_empty())
    }

    /// Header name and expected value. Without an explicit `header` field the
    /// value is read as `Name: expected`.
    pub fn header_pair(&self) -> Option<(&str, &str)> {
        match &self.header {
            Some(name) => Some((name.as_str(), self.value.as_str())),
            None => self
                .value
                .split_once(':')
                .map(|(name, value)| (name.trim(), value.trim())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fingerprint {
    #[serde(default)]
    pub mode: FingerprintMode,
    pub app_name: String,
    pub probes: Vec<ProbeSpec>,
    #[serde(default)]
    pub include_version: bool,
}

static NON_ALNUM: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-z0-9]+").expect("static regex"));

const KNOWN_ABBREVIATIONS: &[(&str, &str)] = &[
    ("damn vulnerable web application", "dvwa"),
    ("owasp juice shop", "juice-shop"),
];

const STRIPPED_NAME_PREFIXES: &[&str] = &["owasp ", "apache ", "the "];

impl Fingerprint {
    pub fn new(mode: FingerprintMode, app_name: &str, probes: Vec<ProbeSpec>) -> Self {
        Self {
            mode,
            app_name: app_name.to_string(),
            probes,
            include_version: false,
        }
    }

    pub fn from_json_str(data: &str) -> Result<Self, LoadError> {
        let fingerprint: Fingerprint = serde_json::from_str(data)?;
        fingerprint.validate()?;
        Ok(fingerprint)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, LoadError> {
        let data = std::fs::read_to_string(path)?;
        Self::from_json_str(&data)
    }

    pub fn validate(&self) -> Result<(), LoadError> {
        for (index, probe) in self.probes.iter().enumerate() {
            let order = index + 1;
            if probe.value.trim().is_empty() && probe.alt_values.is_empty() {
                return Err(LoadError::Invalid(format!(
                    "probe #{} ({}) has no expected value",
                    order, probe.probe_type
                )));
            }
            if probe.probe_type == ProbeType::ImageHash && probe.path.is_none() {
                return Err(LoadError::Invalid(format!(
                    "probe #{} (image_hash) needs a path",
                    order
                )));
            }
            if probe.probe_type == ProbeType::HeaderPattern && probe.header_pair().is_none() {
                return Err(LoadError::Invalid(format!(
                    "probe #{} (header_pattern) needs a header name",
                    order
                )));
            }
            if let Some(path) = &probe.path {
                if !path.starts_with('/') {
                    return Err(LoadError::Invalid(format!(
                        "probe #{} path '{}' must start with '/'",
                        order, path
                    )));
                }
            }
        }
        Ok(())
    }

    /// Sum of all configured points, uncapped. Widened so that points read
    /// from the fingerprint file cannot overflow.
    pub fn max_attainable(&self, weights: &ProbeWeights) -> u64 {
        self.probes
            .iter()
            .enumerate()
            .map(|(index, probe)| u64::from(weights.points_for(index, probe)))
            .sum()
    }

    /// Context path tried when the root yields no signal, e.g. `/dvwa`.
    /// Organization fingerprints never get one.
    pub fn path_prefix(&self) -> Option<String> {
        if self.mode != FingerprintMode::Application {
            return None;
        }
        let prefix = app_prefix(&self.app_name);
        if prefix.is_empty() {
            None
        } else {
            Some(format!("/{}", prefix))
        }
    }
}

pub fn app_prefix(app_name: &str) -> String {
    let lowered = app_name.trim().to_lowercase();
    if lowered.is_empty() {
        return String::new();
    }

    if let Some((_, abbreviation)) = KNOWN_ABBREVIATIONS
        .iter()
        .find(|(name, _)| *name == lowered)
    {
        return abbreviation.to_string();
    }

    let mut name = lowered.as_str();
    for prefix in STRIPPED_NAME_PREFIXES {
        if let Some(rest) = name.strip_prefix(prefix) {
            name = rest;
        }
    }

    let slug = NON_ALNUM.replace_all(name, "-");
    let slug = slug.trim_matches('-').to_string();

    if slug.len() <= 20 {
        return slug;
    }

    let words: Vec<&str> = app_name.split_whitespace().collect();
    if words.len() > 1 {
        let acronym: String = words
            .iter()
            .filter_map(|w| w.chars().next())
            .flat_map(char::to_lowercase)
            .collect();
        if acronym.len() >= 2 {
            return acronym;
        }
        slug
    } else {
        slug.chars().take(20).collect()
    }
}
