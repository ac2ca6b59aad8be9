// File: liveness.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2023-2026
// - Volker Schwaberow <volker@schwaberow.de>

use async_trait::async_trait;
use log::{debug, trace};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::timeout;

use crate::errors::ProbeError;

#[async_trait]
pub trait LivenessProbe: Send + Sync {
    /// `Ok(())` when something accepts a TCP connection on `host:port`.
    async fn is_alive(&self, host: &str, port: u16) -> Result<(), ProbeError>;
}

/// Plain TCP connect with a per-attempt timeout. No bytes are sent.
#[derive(Debug, Clone)]
pub struct TcpLiveness {
    timeout: Duration,
    retries: u32,
}

impl TcpLiveness {
    pub fn new(timeout: Duration, retries: u32) -> Self {
        Self {
            timeout,
            retries: retries.max(1),
        }
    }
}

#[async_trait]
impl LivenessProbe for TcpLiveness {
    async fn is_alive(&self, host: &str, port: u16) -> Result<(), ProbeError> {
        let target = host.trim_matches(|c| c == '[' || c == ']');
        let mut last_reason = String::new();

        for attempt in 1..=self.retries {
            trace!("TCP check {}:{} attempt {}/{}", host, port, attempt, self.retries);
            match timeout(self.timeout, TcpStream::connect((target, port))).await {
                Ok(Ok(_stream)) => return Ok(()),
                Ok(Err(e)) => last_reason = e.to_string(),
                Err(_) => last_reason = format!("no answer within {} ms", self.timeout.as_millis()),
            }
        }

        debug!("{}:{} is not accepting connections: {}", host, port, last_reason);
        Err(ProbeError::Liveness {
            host: host.to_string(),
            port,
            reason: last_reason,
        })
    }
}
