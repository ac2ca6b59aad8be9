// File: http.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2023-2026
// - Volker Schwaberow <volker@schwaberow.de>

use async_trait::async_trait;
use governor::{clock::DefaultClock, state::InMemoryState, state::NotKeyed, Quota, RateLimiter};
use log::{debug, trace};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use crate::candidate::Candidate;
use crate::config::VerifyConfig;
use crate::errors::ProbeError;
use crate::httpinner::HttpInner;
use crate::tls_analyzer::{CertificateInfo, TlsAnalyzer};

pub type SharedRateLimiter = Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>;

/// Builds the process-wide limiter. Every session gets a clone of the handle.
pub fn rate_limiter(requests_per_second: NonZeroU32) -> SharedRateLimiter {
    Arc::new(RateLimiter::direct(Quota::per_second(requests_per_second)))
}

/// Requests made on behalf of a single candidate. One session lives exactly
/// as long as that candidate's verification.
#[async_trait]
pub trait ProbeSession: Send + Sync {
    async fn get(&self, url: &str) -> Result<HttpInner, ProbeError>;
    async fn certificate(&self, host: &str, port: u16) -> Result<CertificateInfo, ProbeError>;
}

pub trait SessionFactory: Send + Sync {
    fn open(&self, candidate: &Candidate) -> Result<Box<dyn ProbeSession>, ProbeError>;
}

#[derive(Debug, Clone)]
pub struct Http {
    timeout: Duration,
    user_agent: String,
    rate_limiter: Option<SharedRateLimiter>,
}

impl Http {
    pub fn new(config: &VerifyConfig) -> Self {
        Http {
            timeout: config.per_request_timeout(),
            user_agent: config.user_agent().to_string(),
            rate_limiter: config.rate_limit().map(rate_limiter),
        }
    }

    pub fn with_rate_limiter(mut self, rate_limiter: SharedRateLimiter) -> Self {
        self.rate_limiter = Some(rate_limiter);
        self
    }
}

impl SessionFactory for Http {
    fn open(&self, candidate: &Candidate) -> Result<Box<dyn ProbeSession>, ProbeError> {
        let client = reqwest::Client::builder()
            .danger_accept_invalid_certs(true)
            .timeout(self.timeout)
            .connect_timeout(self.timeout)
            .user_agent(self.user_agent.clone())
            .pool_max_idle_per_host(1)
            .build()
            .map_err(|e| {
                ProbeError::Internal(format!(
                    "cannot build HTTP client for {}: {}",
                    candidate.key(),
                    e
                ))
            })?;

        trace!("Opened HTTP session for {}", candidate.key());
        Ok(Box::new(HttpSession {
            client,
            timeout: self.timeout,
            rate_limiter: self.rate_limiter.clone(),
        }))
    }
}

struct HttpSession {
    client: reqwest::Client,
    timeout: Duration,
    rate_limiter: Option<SharedRateLimiter>,
}

impl HttpSession {
    async fn wait_for_slot(&self) {
        if let Some(rate_limiter) = &self.rate_limiter {
            rate_limiter.until_ready().await;
        }
    }
}

#[async_trait]
impl ProbeSession for HttpSession {
    async fn get(&self, url: &str) -> Result<HttpInner, ProbeError> {
        self.wait_for_slot().await;
        debug!("GET {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ProbeError::from_reqwest(url, &e))?;

        let final_url = response.url().to_string();
        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let body = response
            .bytes()
            .await
            .map_err(|e| ProbeError::from_reqwest(url, &e))?;

        trace!("{} answered {} with {} bytes", final_url, status, body.len());
        Ok(HttpInner::new_with_all(headers, body.to_vec(), status, final_url))
    }

    async fn certificate(&self, host: &str, port: u16) -> Result<CertificateInfo, ProbeError> {
        self.wait_for_slot().await;
        TlsAnalyzer::fetch(host, port, self.timeout).await
    }
}
