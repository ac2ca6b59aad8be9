// File: getstate.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2023-2026
// - Volker Schwaberow <volker@schwaberow.de>

use serde::Serialize;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// Run-wide counters shared by every worker through an `Arc`.
#[derive(Debug, Default)]
pub struct GetState {
    total_candidates: AtomicUsize,
    alive_hosts: AtomicUsize,
    dead_hosts: AtomicUsize,
    timed_out_tasks: AtomicUsize,
    http_requests: AtomicUsize,
    failed_requests: AtomicUsize,
    start_time: AtomicU64,
    end_time: AtomicU64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StateSnapshot {
    pub total_candidates: usize,
    pub alive_hosts: usize,
    pub dead_hosts: usize,
    pub timed_out_tasks: usize,
    pub http_requests: usize,
    pub failed_requests: usize,
    pub elapsed_ms: u64,
}

impl GetState {
    pub fn new() -> GetState {
        GetState::default()
    }

    pub fn set_total_candidates(&self, total: usize) {
        self.total_candidates.store(total, Ordering::Relaxed);
    }

    pub fn add_alive(&self) {
        self.alive_hosts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_dead(&self) {
        self.dead_hosts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_timed_out(&self) {
        self.timed_out_tasks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_request(&self) {
        self.http_requests.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_failure(&self) {
        self.failed_requests.fetch_add(1, Ordering::Relaxed);
    }

    pub fn http_requests(&self) -> usize {
        self.http_requests.load(Ordering::Relaxed)
    }

    pub fn dead_hosts(&self) -> usize {
        self.dead_hosts.load(Ordering::Relaxed)
    }

    pub fn set_start_time(&self, millis: u64) {
        self.start_time.store(millis, Ordering::Relaxed);
    }

    pub fn set_end_time(&self, millis: u64) {
        self.end_time.store(millis, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StateSnapshot {
        let start = self.start_time.load(Ordering::Relaxed);
        let end = self.end_time.load(Ordering::Relaxed);
        StateSnapshot {
            total_candidates: self.total_candidates.load(Ordering::Relaxed),
            alive_hosts: self.alive_hosts.load(Ordering::Relaxed),
            dead_hosts: self.dead_hosts.load(Ordering::Relaxed),
            timed_out_tasks: self.timed_out_tasks.load(Ordering::Relaxed),
            http_requests: self.http_requests.load(Ordering::Relaxed),
            failed_requests: self.failed_requests.load(Ordering::Relaxed),
            elapsed_ms: end.saturating_sub(start),
        }
    }
}

pub fn now_millis() -> u64 {
    chrono::Utc::now().timestamp_millis().max(0) as u64
}
