// File: verifier.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2023-2026
// - Volker Schwaberow <volker@schwaberow.de>

use chrono::{DateTime, Utc};
use log::{debug, trace, warn};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::timeout;

use crate::candidate::{Candidate, Scheme};
use crate::classifier::{classify, Classification};
use crate::config::{ScoreThresholds, VerifyConfig};
use crate::errors::{ConfigError, ProbeError};
use crate::evaluators::favicon::{discover_favicon_path, DEFAULT_FAVICON_PATH};
use crate::evaluators::{EvaluatorSet, ProbeContext, ProbeOutcome};
use crate::fingerprint::{Fingerprint, FingerprintMode, ProbeSpec, ProbeType};
use crate::getstate::GetState;
use crate::http::{Http, ProbeSession, SessionFactory};
use crate::httpinner::HttpInner;
use crate::liveness::{LivenessProbe, TcpLiveness};
use crate::scoring::ScoreAggregator;
use crate::tls_analyzer::CertificateInfo;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VerificationResult {
    pub candidate: Candidate,
    pub total_score: u32,
    pub classification: Classification,
    pub matched_probes: Vec<ProbeOutcome>,
    pub errors: Vec<ProbeError>,
    pub probed_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheme: Option<Scheme>,
    pub alternate_scheme_tried: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prefix_used: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tls: Option<CertificateInfo>,
    pub duration_ms: u64,
}

impl VerificationResult {
    /// Score-0 result for a candidate whose task never produced one.
    pub fn failed(candidate: Candidate, error: ProbeError) -> Self {
        Self {
            candidate,
            total_score: 0,
            classification: classify(0, &ScoreThresholds::default()),
            matched_probes: Vec::new(),
            errors: vec![error],
            probed_at: Utc::now(),
            scheme: None,
            alternate_scheme_tried: false,
            prefix_used: None,
            tls: None,
            duration_ms: 0,
        }
    }
}

/// Per-candidate lifecycle. Every transition is logged at trace level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateState {
    Queued,
    TcpChecking,
    Dead,
    HttpProbing(Scheme),
    Evaluating(Scheme),
    EarlyTerminated,
    Completed,
    ScoreFallbackCheck,
    Refetch(Scheme),
    Done,
}

type ResponseCache = HashMap<String, Result<Arc<HttpInner>, ProbeError>>;

#[derive(Debug)]
struct Attempt {
    scheme: Scheme,
    prefix: Option<String>,
    score: ScoreAggregator,
    errors: Vec<ProbeError>,
    unreachable: bool,
}

impl Attempt {
    fn new(scheme: Scheme, prefix: Option<String>) -> Self {
        Self {
            scheme,
            prefix,
            score: ScoreAggregator::new(),
            errors: Vec::new(),
            unreachable: false,
        }
    }
}

/// Verifies single candidates against one fingerprint. Cheap to clone; all
/// shared parts sit behind `Arc`.
#[derive(Clone)]
pub struct Verifier {
    fingerprint: Arc<Fingerprint>,
    config: Arc<VerifyConfig>,
    evaluators: Arc<EvaluatorSet>,
    sessions: Arc<dyn SessionFactory>,
    liveness: Arc<dyn LivenessProbe>,
    state_ptr: Arc<GetState>,
    planned_requests: u32,
}

impl Verifier {
    /// Verifier backed by real TCP and HTTP(S) probing.
    pub fn new(fingerprint: Fingerprint, config: VerifyConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let sessions = Arc::new(Http::new(&config));
        let liveness = Arc::new(TcpLiveness::new(config.tcp_timeout(), config.tcp_retries()));
        Self::with_components(
            fingerprint,
            config,
            sessions,
            liveness,
            EvaluatorSet::new(),
        )
    }

    pub fn with_components(
        fingerprint: Fingerprint,
        config: VerifyConfig,
        sessions: Arc<dyn SessionFactory>,
        liveness: Arc<dyn LivenessProbe>,
        evaluators: EvaluatorSet,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let planned_requests = plan_requests(&fingerprint, &config);
        Ok(Self {
            fingerprint: Arc::new(fingerprint),
            config: Arc::new(config),
            evaluators: Arc::new(evaluators),
            sessions,
            liveness,
            state_ptr: Arc::new(GetState::new()),
            planned_requests,
        })
    }

    pub fn config(&self) -> &VerifyConfig {
        &self.config
    }

    pub fn fingerprint(&self) -> &Fingerprint {
        &self.fingerprint
    }

    pub fn state(&self) -> Arc<GetState> {
        Arc::clone(&self.state_ptr)
    }

    pub fn task_budget(&self) -> Duration {
        self.config.task_budget(self.planned_requests)
    }

    pub async fn verify(&self, candidate: Candidate) -> VerificationResult {
        self.verify_traced(candidate).await.0
    }

    /// Same as [`Verifier::verify`], also returning the states the candidate
    /// went through.
    pub async fn verify_traced(
        &self,
        candidate: Candidate,
    ) -> (VerificationResult, Vec<CandidateState>) {
        let started = Instant::now();
        let probed_at = Utc::now();
        let budget = self.task_budget();

        let mut run = CandidateRun::new(self, &candidate);
        if timeout(budget, run.drive()).await.is_err() {
            warn!(
                "{} exceeded its {} ms budget, keeping partial score",
                candidate.key(),
                budget.as_millis()
            );
            self.state_ptr.add_timed_out();
            run.errors.push(ProbeError::TaskTimeout {
                budget_ms: budget.as_millis(),
            });
            run.transition(CandidateState::Done);
        }

        let transitions = run.transitions.clone();
        let result = run.finish(probed_at, started.elapsed());
        (result, transitions)
    }
}

/// Upper bound of requests one candidate may issue, used for the default
/// task budget.
fn plan_requests(fingerprint: &Fingerprint, config: &VerifyConfig) -> u32 {
    let mut paths: HashSet<&str> = fingerprint.probes.iter().map(ProbeSpec::path).collect();
    if fingerprint
        .probes
        .iter()
        .any(|p| p.probe_type == ProbeType::FaviconHash)
    {
        paths.insert(DEFAULT_FAVICON_PATH);
        if fingerprint.mode == FingerprintMode::Organization {
            paths.insert("/");
        }
    }

    let tls = if config.skip_tls() { 0 } else { 1 };
    let per_pass = paths.len() as u32 + tls;
    let prefix_passes = if fingerprint.path_prefix().is_some() { 2 } else { 1 };
    per_pass * prefix_passes * 2
}

struct CandidateRun<'a> {
    verifier: &'a Verifier,
    candidate: &'a Candidate,
    state: CandidateState,
    transitions: Vec<CandidateState>,
    attempts: Vec<Attempt>,
    errors: Vec<ProbeError>,
    tls: Option<CertificateInfo>,
    tls_attempted: bool,
    alternate_scheme_tried: bool,
}

impl<'a> CandidateRun<'a> {
    fn new(verifier: &'a Verifier, candidate: &'a Candidate) -> Self {
        Self {
            verifier,
            candidate,
            state: CandidateState::Queued,
            transitions: vec![CandidateState::Queued],
            attempts: Vec::new(),
            errors: Vec::new(),
            tls: None,
            tls_attempted: false,
            alternate_scheme_tried: false,
        }
    }

    fn transition(&mut self, next: CandidateState) {
        trace!("{}: {:?} -> {:?}", self.candidate.key(), self.state, next);
        self.state = next;
        self.transitions.push(next);
    }

    async fn drive(&mut self) {
        let verifier = self.verifier;
        let stats = &verifier.state_ptr;

        if !verifier.config.skip_tcp_check() {
            self.transition(CandidateState::TcpChecking);
            match verifier
                .liveness
                .is_alive(&self.candidate.host, self.candidate.port)
                .await
            {
                Ok(()) => stats.add_alive(),
                Err(e) => {
                    stats.add_dead();
                    self.errors.push(e);
                    self.transition(CandidateState::Dead);
                    return;
                }
            }
        }

        let session = match verifier.sessions.open(self.candidate) {
            Ok(session) => session,
            Err(e) => {
                self.errors.push(e);
                self.transition(CandidateState::Done);
                return;
            }
        };

        let scheme = self.candidate.initial_scheme();
        self.transition(CandidateState::HttpProbing(scheme));
        self.probe_scheme(session.as_ref(), scheme).await;
        self.transition(CandidateState::ScoreFallbackCheck);

        if self.needs_scheme_fallback() {
            let alternate = scheme.alternate();
            debug!(
                "{} scored {} over {}, retrying over {}",
                self.candidate.key(),
                self.best_score(),
                scheme,
                alternate
            );
            self.alternate_scheme_tried = true;
            self.transition(CandidateState::Refetch(alternate));
            self.probe_scheme(session.as_ref(), alternate).await;
            self.transition(CandidateState::ScoreFallbackCheck);
        }

        self.transition(CandidateState::Done);
    }

    fn best_score(&self) -> u32 {
        self.attempts
            .iter()
            .map(|a| a.score.total())
            .max()
            .unwrap_or(0)
    }

    /// Below half of the uncapped maximum. Runs at most once per candidate.
    fn needs_scheme_fallback(&self) -> bool {
        if self.alternate_scheme_tried {
            return false;
        }
        let best = self.best_score();
        if best >= crate::scoring::MAX_SCORE {
            return false;
        }
        let max = self
            .verifier
            .fingerprint
            .max_attainable(self.verifier.config.weights());
        max > 0 && u64::from(best) * 2 < max
    }

    async fn probe_scheme(&mut self, session: &dyn ProbeSession, scheme: Scheme) {
        let verifier = self.verifier;

        if scheme == Scheme::Https && !verifier.config.skip_tls() && !self.tls_attempted {
            self.tls_attempted = true;
            match session
                .certificate(&self.candidate.host, self.candidate.port)
                .await
            {
                Ok(certificate) => self.tls = Some(certificate),
                Err(e) => debug!("No certificate from {}: {}", self.candidate.key(), e),
            }
        }

        self.transition(CandidateState::Evaluating(scheme));
        self.run_attempt(session, scheme, None).await;

        let root_silent = self
            .attempts
            .last()
            .map(|a| !a.unreachable && a.score.total() == 0)
            .unwrap_or(false);
        if root_silent {
            if let Some(prefix) = verifier.fingerprint.path_prefix() {
                debug!(
                    "No signal at the root of {}, trying {}",
                    self.candidate.key(),
                    prefix
                );
                self.transition(CandidateState::Evaluating(scheme));
                self.run_attempt(session, scheme, Some(prefix)).await;
            }
        }
    }

    async fn run_attempt(
        &mut self,
        session: &dyn ProbeSession,
        scheme: Scheme,
        prefix: Option<String>,
    ) {
        let verifier = self.verifier;
        let base = format!(
            "{}{}",
            self.candidate.base_url(scheme),
            prefix.as_deref().unwrap_or("")
        );
        self.attempts.push(Attempt::new(scheme, prefix));
        let mut cache = ResponseCache::new();

        for (index, probe) in verifier.fingerprint.probes.iter().enumerate() {
            if self.current_attempt_capped() {
                break;
            }
            let points = verifier.config.weights().points_for(index, probe);
            let outcome = self
                .evaluate_probe(session, &mut cache, &base, probe, points)
                .await;

            let Some(attempt) = self.attempts.last_mut() else {
                break;
            };
            match outcome {
                Ok(outcome) => {
                    attempt.score.add(outcome);
                }
                Err(e) => {
                    debug!("{}: {}", base, e);
                    let unreachable = e.is_unreachable();
                    attempt.errors.push(e);
                    if unreachable {
                        attempt.unreachable = true;
                        break;
                    }
                }
            }
        }

        if self.current_attempt_capped() {
            self.transition(CandidateState::EarlyTerminated);
        } else {
            self.transition(CandidateState::Completed);
        }
    }

    fn current_attempt_capped(&self) -> bool {
        self.attempts
            .last()
            .map(|a| a.score.is_capped())
            .unwrap_or(false)
    }

    async fn evaluate_probe(
        &self,
        session: &dyn ProbeSession,
        cache: &mut ResponseCache,
        base: &str,
        probe: &ProbeSpec,
        points: u32,
    ) -> Result<ProbeOutcome, ProbeError> {
        let is_favicon = probe.probe_type == ProbeType::FaviconHash;
        let path = if is_favicon
            && probe.path.is_none()
            && self.verifier.fingerprint.mode == FingerprintMode::Organization
        {
            let root = self.fetch(session, cache, format!("{}/", base)).await?;
            discover_favicon_path(&root.text())
                .unwrap_or_else(|| DEFAULT_FAVICON_PATH.to_string())
        } else {
            probe.path().to_string()
        };

        let primary = self
            .evaluate_at(session, cache, base, &path, probe, points)
            .await;
        if !is_favicon || path == DEFAULT_FAVICON_PATH {
            return primary;
        }

        let retry = match &primary {
            Ok(outcome) => !outcome.matched,
            Err(e) => !e.is_unreachable(),
        };
        if retry {
            trace!("Favicon at {}{} did not match, trying {}", base, path, DEFAULT_FAVICON_PATH);
            match self
                .evaluate_at(session, cache, base, DEFAULT_FAVICON_PATH, probe, points)
                .await
            {
                Ok(outcome) if outcome.matched => return Ok(outcome),
                Err(e) if e.is_unreachable() => return Err(e),
                _ => {}
            }
        }
        primary
    }

    async fn evaluate_at(
        &self,
        session: &dyn ProbeSession,
        cache: &mut ResponseCache,
        base: &str,
        path: &str,
        probe: &ProbeSpec,
        points: u32,
    ) -> Result<ProbeOutcome, ProbeError> {
        let response = self.fetch(session, cache, format!("{}{}", base, path)).await?;
        let ctx = ProbeContext::new(&response).with_certificate(self.tls.as_ref());
        self.verifier.evaluators.evaluate(probe, points, &ctx)
    }

    async fn fetch(
        &self,
        session: &dyn ProbeSession,
        cache: &mut ResponseCache,
        url: String,
    ) -> Result<Arc<HttpInner>, ProbeError> {
        if let Some(cached) = cache.get(&url) {
            return cached.clone();
        }

        let stats = &self.verifier.state_ptr;
        stats.add_request();
        let result = session.get(&url).await.map(Arc::new);
        if result.is_err() {
            stats.add_failure();
        }
        cache.insert(url, result.clone());
        result
    }

    fn finish(self, probed_at: DateTime<Utc>, elapsed: Duration) -> VerificationResult {
        let thresholds = self.verifier.config.thresholds();

        let mut best: Option<&Attempt> = None;
        for attempt in &self.attempts {
            if best.map_or(true, |b| attempt.score.total() > b.score.total()) {
                best = Some(attempt);
            }
        }

        let total_score = best.map(|a| a.score.total()).unwrap_or(0);
        let matched_probes = best
            .map(|a| a.score.matched().to_vec())
            .unwrap_or_default();
        let scheme = best.map(|a| a.scheme);
        let prefix_used = best.and_then(|a| a.prefix.clone());

        let mut errors: Vec<ProbeError> = self
            .attempts
            .iter()
            .flat_map(|a| a.errors.iter().cloned())
            .collect();
        errors.extend(self.errors);

        let classification = classify(total_score, &thresholds);
        debug!(
            "{} finished with score {} ({})",
            self.candidate.key(),
            total_score,
            classification
        );

        VerificationResult {
            candidate: self.candidate.clone(),
            total_score,
            classification,
            matched_probes,
            errors,
            probed_at,
            scheme,
            alternate_scheme_tried: self.alternate_scheme_tried,
            prefix_used,
            tls: self.tls,
            duration_ms: elapsed.as_millis() as u64,
        }
    }
}
