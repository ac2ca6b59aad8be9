// File: common/mod.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2025-2026
// - Volker Schwaberow <volker@schwaberow.de>

#![allow(dead_code)]

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use sigprobe::candidate::Candidate;
use sigprobe::errors::ProbeError;
use sigprobe::evaluators::{Evaluator, EvaluatorSet, ProbeContext, ProbeOutcome};
use sigprobe::fingerprint::{ProbeSpec, ProbeType};
use sigprobe::http::{ProbeSession, SessionFactory};
use sigprobe::httpinner::HttpInner;
use sigprobe::liveness::LivenessProbe;
use sigprobe::tls_analyzer::CertificateInfo;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use wiremock::ResponseTemplate;

pub fn create_mock_response(status: u16, body: &str, headers: HashMap<&str, &str>) -> ResponseTemplate {
    let mut response = ResponseTemplate::new(status).set_body_string(body);
    for (key, value) in headers {
        response = response.append_header(key, value);
    }
    response
}

pub fn create_html_response(content: &str) -> ResponseTemplate {
    let mut headers = HashMap::new();
    headers.insert("content-type", "text/html");
    create_mock_response(200, content, headers)
}

pub fn create_bytes_response(bytes: &[u8], content_type: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_bytes(bytes.to_vec())
        .append_header("content-type", content_type)
}

pub fn sample_gitea_html() -> String {
    r#"<!DOCTYPE html>
<html lang="en-US">
<head>
    <title>Gitea: Git with a cup of tea</title>
    <link rel="icon" href="/assets/img/favicon.png" type="image/png">
</head>
<body>
    <div class="home">Powered by Gitea Version: 1.21.4</div>
</body>
</html>"#
        .to_string()
}

pub const SAMPLE_FAVICON: &[u8] = b"\x00\x00\x01\x00\x01\x00\x10\x10gitea-icon-bytes";

#[derive(Debug, Clone)]
pub struct MockPage {
    pub status: u16,
    pub body: Vec<u8>,
    pub headers: Vec<(&'static str, String)>,
    pub delay: Option<Duration>,
}

impl MockPage {
    pub fn html(body: &str) -> Self {
        Self {
            status: 200,
            body: body.as_bytes().to_vec(),
            headers: vec![("content-type", "text/html".to_string())],
            delay: None,
        }
    }

    pub fn bytes(body: &[u8]) -> Self {
        Self {
            status: 200,
            body: body.to_vec(),
            headers: Vec::new(),
            delay: None,
        }
    }

    pub fn with_header(mut self, name: &'static str, value: &str) -> Self {
        self.headers.push((name, value.to_string()));
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

/// In-memory web. Pages are keyed by full URL, unknown URLs answer 404.
#[derive(Default)]
pub struct MockWeb {
    pages: HashMap<String, MockPage>,
    shared_pages: HashMap<String, MockPage>,
    unreachable: Vec<String>,
    timing_out: Vec<String>,
    certificate: Option<CertificateInfo>,
    requests: Mutex<Vec<String>>,
    certificate_requests: AtomicUsize,
}

impl MockWeb {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, url: &str, page: MockPage) -> Self {
        self.pages.insert(url.to_string(), page);
        self
    }

    /// Served on every host and scheme for the given path.
    pub fn shared_page(mut self, path: &str, page: MockPage) -> Self {
        self.shared_pages.insert(path.to_string(), page);
        self
    }

    /// Every URL starting with `prefix` fails at connect level.
    pub fn unreachable(mut self, prefix: &str) -> Self {
        self.unreachable.push(prefix.to_string());
        self
    }

    /// Requests for exactly `url` exceed the per-request timeout.
    pub fn timing_out(mut self, url: &str) -> Self {
        self.timing_out.push(url.to_string());
        self
    }

    pub fn certificate(mut self, certificate: CertificateInfo) -> Self {
        self.certificate = Some(certificate);
        self
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests_for_host(&self, host: &str) -> usize {
        let needle = format!("://{}:", host);
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|url| url.contains(&needle))
            .count()
    }

    pub fn requests_for_url(&self, url: &str) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|u| u.as_str() == url)
            .count()
    }

    pub fn certificate_requests(&self) -> usize {
        self.certificate_requests.load(Ordering::SeqCst)
    }

    fn lookup(&self, url: &str) -> Option<&MockPage> {
        if let Some(page) = self.pages.get(url) {
            return Some(page);
        }
        let path = url
            .splitn(4, '/')
            .nth(3)
            .map(|rest| format!("/{}", rest))
            .unwrap_or_else(|| "/".to_string());
        self.shared_pages.get(&path)
    }
}

pub struct MockSessionFactory {
    pub web: Arc<MockWeb>,
    pub opened: AtomicUsize,
}

impl MockSessionFactory {
    pub fn new(web: Arc<MockWeb>) -> Arc<Self> {
        Arc::new(Self {
            web,
            opened: AtomicUsize::new(0),
        })
    }
}

impl SessionFactory for MockSessionFactory {
    fn open(&self, _candidate: &Candidate) -> Result<Box<dyn ProbeSession>, ProbeError> {
        self.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockSession {
            web: Arc::clone(&self.web),
        }))
    }
}

struct MockSession {
    web: Arc<MockWeb>,
}

#[async_trait]
impl ProbeSession for MockSession {
    async fn get(&self, url: &str) -> Result<HttpInner, ProbeError> {
        self.web.requests.lock().unwrap().push(url.to_string());

        if self.web.unreachable.iter().any(|prefix| url.starts_with(prefix)) {
            return Err(ProbeError::Connect {
                url: url.to_string(),
                reason: "connection refused".to_string(),
            });
        }

        if self.web.timing_out.iter().any(|u| u == url) {
            return Err(ProbeError::Timeout {
                url: url.to_string(),
            });
        }

        match self.web.lookup(url).cloned() {
            Some(page) => {
                if let Some(delay) = page.delay {
                    tokio::time::sleep(delay).await;
                }
                let mut headers = HeaderMap::new();
                for (name, value) in &page.headers {
                    headers.append(
                        HeaderName::from_static(*name),
                        HeaderValue::from_str(value).unwrap(),
                    );
                }
                Ok(HttpInner::new_with_all(headers, page.body, page.status, url.to_string()))
            }
            None => Ok(HttpInner::new_with_all(
                HeaderMap::new(),
                b"not found".to_vec(),
                404,
                url.to_string(),
            )),
        }
    }

    async fn certificate(&self, host: &str, port: u16) -> Result<CertificateInfo, ProbeError> {
        self.web.certificate_requests.fetch_add(1, Ordering::SeqCst);
        self.web.certificate.clone().ok_or_else(|| ProbeError::Connect {
            url: format!("https://{}:{}", host, port),
            reason: "no TLS".to_string(),
        })
    }
}

/// Liveness stub: hosts in `dead` refuse, everything else accepts.
#[derive(Default)]
pub struct MockLiveness {
    dead: HashSet<String>,
    pub calls: AtomicUsize,
}

impl MockLiveness {
    pub fn new(dead: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            dead: dead.iter().map(|h| h.to_string()).collect(),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn with_dead(dead: HashSet<String>) -> Arc<Self> {
        Arc::new(Self {
            dead,
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl LivenessProbe for MockLiveness {
    async fn is_alive(&self, host: &str, port: u16) -> Result<(), ProbeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.dead.contains(host) {
            Err(ProbeError::Liveness {
                host: host.to_string(),
                port,
                reason: "connection refused".to_string(),
            })
        } else {
            Ok(())
        }
    }
}

/// Evaluator calls per probe type.
#[derive(Default)]
pub struct EvaluatorCalls {
    calls: Mutex<HashMap<ProbeType, usize>>,
}

impl EvaluatorCalls {
    pub fn count(&self, probe_type: ProbeType) -> usize {
        self.calls
            .lock()
            .unwrap()
            .get(&probe_type)
            .copied()
            .unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.calls.lock().unwrap().values().sum()
    }

    fn record(&self, probe_type: ProbeType) {
        *self.calls.lock().unwrap().entry(probe_type).or_insert(0) += 1;
    }
}

pub struct CountingEvaluator {
    inner: Box<dyn Evaluator>,
    calls: Arc<EvaluatorCalls>,
}

impl Evaluator for CountingEvaluator {
    fn name(&self) -> &'static str {
        self.inner.name()
    }

    fn probe_type(&self) -> ProbeType {
        self.inner.probe_type()
    }

    fn evaluate(
        &self,
        spec: &ProbeSpec,
        points: u32,
        ctx: &ProbeContext<'_>,
    ) -> Result<ProbeOutcome, ProbeError> {
        self.calls.record(spec.probe_type);
        self.inner.evaluate(spec, points, ctx)
    }
}

/// Built-in evaluators wrapped so every call is counted.
pub fn counting_evaluators() -> (EvaluatorSet, Arc<EvaluatorCalls>) {
    use sigprobe::evaluators::{body, favicon, header, image, title};

    let calls = Arc::new(EvaluatorCalls::default());
    let inner: Vec<Box<dyn Evaluator>> = vec![
        Box::new(favicon::FaviconEvaluator),
        Box::new(image::ImageEvaluator),
        Box::new(title::TitleEvaluator),
        Box::new(body::BodyEvaluator),
        Box::new(header::HeaderEvaluator),
    ];

    let mut set = EvaluatorSet::empty();
    for evaluator in inner {
        set.register(Box::new(CountingEvaluator {
            inner: evaluator,
            calls: Arc::clone(&calls),
        }));
    }
    (set, calls)
}

/// Body evaluator that panics for responses from one host.
pub struct PanickingBodyEvaluator {
    pub host: &'static str,
}

impl Evaluator for PanickingBodyEvaluator {
    fn name(&self) -> &'static str {
        "Panicking Body"
    }

    fn probe_type(&self) -> ProbeType {
        ProbeType::BodyPattern
    }

    fn evaluate(
        &self,
        spec: &ProbeSpec,
        points: u32,
        ctx: &ProbeContext<'_>,
    ) -> Result<ProbeOutcome, ProbeError> {
        if ctx.response.url().contains(self.host) {
            panic!("evaluator blew up on {}", ctx.response.url());
        }
        sigprobe::evaluators::body::BodyEvaluator.evaluate(spec, points, ctx)
    }
}

pub fn sample_certificate() -> CertificateInfo {
    CertificateInfo {
        common_name: Some("git.example.org".to_string()),
        subject_org: Some("Example Org".to_string()),
        issuer: Some("Example Internal CA".to_string()),
        issuer_org: Some("Example Org".to_string()),
        subject_alternative_names: vec!["git.example.org".to_string()],
        emails: Vec::new(),
        valid_from: None,
        valid_to: None,
        is_valid_now: true,
        is_self_signed: false,
        fingerprint_sha256: "ab".repeat(32),
    }
}
