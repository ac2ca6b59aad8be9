// File: config.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2023-2026
// - Volker Schwaberow <volker@schwaberow.de>

use std::collections::HashMap;
use std::num::NonZeroU32;
use std::time::Duration;

use crate::errors::ConfigError;
use crate::fingerprint::{ProbeSpec, ProbeType};

pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36";

/// Points awarded per matched probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeWeights {
    defaults: HashMap<ProbeType, u32>,
    type_overrides: HashMap<ProbeType, u32>,
    order_overrides: HashMap<usize, u32>,
}

impl Default for ProbeWeights {
    fn default() -> Self {
        let defaults = HashMap::from([
            (ProbeType::FaviconHash, 80),
            (ProbeType::ImageHash, 50),
            (ProbeType::TitlePattern, 15),
            (ProbeType::BodyPattern, 15),
            (ProbeType::HeaderPattern, 15),
        ]);
        Self {
            defaults,
            type_overrides: HashMap::new(),
            order_overrides: HashMap::new(),
        }
    }
}

impl ProbeWeights {
    /// Parses `favicon:80,body:20,3:40`. Numeric keys address probes by
    /// 1-based order in the fingerprint.
    pub fn parse(spec: &str) -> Result<Self, ConfigError> {
        let mut weights = Self::default();
        weights.apply_overrides(spec)?;
        Ok(weights)
    }

    pub fn apply_overrides(&mut self, spec: &str) -> Result<(), ConfigError> {
        for entry in spec.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            let (key, value) = entry
                .split_once(':')
                .ok_or_else(|| ConfigError::InvalidWeight(entry.to_string()))?;
            let key = key.trim().to_lowercase();
            let points: u32 = value
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidWeight(entry.to_string()))?;

            if key.chars().all(|c| c.is_ascii_digit()) {
                let order: usize = key
                    .parse()
                    .map_err(|_| ConfigError::InvalidWeight(entry.to_string()))?;
                if order == 0 {
                    return Err(ConfigError::InvalidWeight(entry.to_string()));
                }
                self.order_overrides.insert(order, points);
            } else {
                let probe_type =
                    ProbeType::from_key(&key).ok_or(ConfigError::UnknownWeightKey(key))?;
                self.type_overrides.insert(probe_type, points);
            }
        }
        Ok(())
    }

    pub fn set_type(&mut self, probe_type: ProbeType, points: u32) {
        self.type_overrides.insert(probe_type, points);
    }

    pub fn default_for(&self, probe_type: ProbeType) -> u32 {
        self.type_overrides
            .get(&probe_type)
            .or_else(|| self.defaults.get(&probe_type))
            .copied()
            .unwrap_or(0)
    }

    /// Order override, then type override, then the probe's own points, then
    /// the type default.
    pub fn points_for(&self, index: usize, probe: &ProbeSpec) -> u32 {
        if let Some(points) = self.order_overrides.get(&(index + 1)) {
            return *points;
        }
        if let Some(points) = self.type_overrides.get(&probe.probe_type) {
            return *points;
        }
        probe
            .points
            .unwrap_or_else(|| self.default_for(probe.probe_type))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreThresholds {
    pub verified: u32,
    pub likely: u32,
    pub partial: u32,
}

impl Default for ScoreThresholds {
    fn default() -> Self {
        Self {
            verified: 80,
            likely: 50,
            partial: 30,
        }
    }
}

impl ScoreThresholds {
    pub fn new(verified: u32, likely: u32, partial: u32) -> Result<Self, ConfigError> {
        let thresholds = Self {
            verified,
            likely,
            partial,
        };
        thresholds.validate()?;
        Ok(thresholds)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.verified >= self.likely && self.likely >= self.partial {
            Ok(())
        } else {
            Err(ConfigError::ThresholdOrder {
                verified: self.verified,
                likely: self.likely,
                partial: self.partial,
            })
        }
    }
}

#[derive(Debug, Clone)]
pub struct VerifyConfig {
    worker_count: usize,
    per_request_timeout: Duration,
    tcp_timeout: Duration,
    tcp_retries: u32,
    task_timeout: Option<Duration>,
    skip_tls: bool,
    skip_tcp_check: bool,
    stable_order: bool,
    show_progress: bool,
    rate_limit: Option<NonZeroU32>,
    user_agent: String,
    weights: ProbeWeights,
    thresholds: ScoreThresholds,
}

impl Default for VerifyConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl VerifyConfig {
    pub fn new() -> Self {
        Self {
            worker_count: 10,
            per_request_timeout: Duration::from_secs(10),
            tcp_timeout: Duration::from_secs(2),
            tcp_retries: 2,
            task_timeout: None,
            skip_tls: false,
            skip_tcp_check: false,
            stable_order: false,
            show_progress: false,
            rate_limit: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            weights: ProbeWeights::default(),
            thresholds: ScoreThresholds::default(),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.worker_count == 0 {
            return Err(ConfigError::InvalidWorkerCount(self.worker_count));
        }
        if self.per_request_timeout.is_zero() {
            return Err(ConfigError::InvalidTimeout("per-request timeout".to_string()));
        }
        if !self.skip_tcp_check {
            if self.tcp_timeout.is_zero() {
                return Err(ConfigError::InvalidTimeout("TCP timeout".to_string()));
            }
            if self.tcp_retries == 0 {
                return Err(ConfigError::InvalidTimeout("TCP retry count".to_string()));
            }
        }
        if let Some(budget) = self.task_timeout {
            if budget.is_zero() {
                return Err(ConfigError::InvalidTimeout("task timeout".to_string()));
            }
        }
        self.thresholds.validate()
    }

    /// Whole-candidate budget. Without an explicit task timeout it covers the
    /// liveness retries plus every request the plan could issue.
    pub fn task_budget(&self, planned_requests: u32) -> Duration {
        if let Some(budget) = self.task_timeout {
            return budget;
        }
        let liveness = if self.skip_tcp_check {
            Duration::ZERO
        } else {
            self.tcp_timeout.saturating_mul(self.tcp_retries)
        };
        liveness.saturating_add(self.per_request_timeout.saturating_mul(planned_requests.max(1)))
    }

    pub fn worker_count(&self) -> usize {
        self.worker_count
    }

    pub fn set_worker_count(&mut self, worker_count: usize) {
        self.worker_count = worker_count;
    }

    pub fn per_request_timeout(&self) -> Duration {
        self.per_request_timeout
    }

    pub fn set_per_request_timeout(&mut self, timeout: Duration) {
        self.per_request_timeout = timeout;
    }

    pub fn tcp_timeout(&self) -> Duration {
        self.tcp_timeout
    }

    pub fn set_tcp_timeout(&mut self, timeout: Duration) {
        self.tcp_timeout = timeout;
    }

    pub fn tcp_retries(&self) -> u32 {
        self.tcp_retries
    }

    pub fn set_tcp_retries(&mut self, retries: u32) {
        self.tcp_retries = retries;
    }

    pub fn task_timeout(&self) -> Option<Duration> {
        self.task_timeout
    }

    pub fn set_task_timeout(&mut self, timeout: Option<Duration>) {
        self.task_timeout = timeout;
    }

    pub fn skip_tls(&self) -> bool {
        self.skip_tls
    }

    pub fn set_skip_tls(&mut self, skip_tls: bool) {
        self.skip_tls = skip_tls;
    }

    pub fn skip_tcp_check(&self) -> bool {
        self.skip_tcp_check
    }

    pub fn set_skip_tcp_check(&mut self, skip_tcp_check: bool) {
        self.skip_tcp_check = skip_tcp_check;
    }

    pub fn stable_order(&self) -> bool {
        self.stable_order
    }

    pub fn set_stable_order(&mut self, stable_order: bool) {
        self.stable_order = stable_order;
    }

    pub fn show_progress(&self) -> bool {
        self.show_progress
    }

    pub fn set_show_progress(&mut self, show_progress: bool) {
        self.show_progress = show_progress;
    }

    pub fn rate_limit(&self) -> Option<NonZeroU32> {
        self.rate_limit
    }

    pub fn set_rate_limit(&mut self, rate_limit: Option<NonZeroU32>) {
        self.rate_limit = rate_limit;
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    pub fn set_user_agent(&mut self, user_agent: String) {
        self.user_agent = user_agent;
    }

    pub fn weights(&self) -> &ProbeWeights {
        &self.weights
    }

    pub fn set_weights(&mut self, weights: ProbeWeights) {
        self.weights = weights;
    }

    pub fn thresholds(&self) -> ScoreThresholds {
        self.thresholds
    }

    pub fn set_thresholds(&mut self, thresholds: ScoreThresholds) {
        self.thresholds = thresholds;
    }
}
