// File: scheduler.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2023-2026
// - Volker Schwaberow <volker@schwaberow.de>

use indicatif::{ProgressBar, ProgressState, ProgressStyle};
use log::{debug, error, info};
use std::any::Any;
use std::collections::VecDeque;
use std::fmt::Write;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};

use crate::candidate::Candidate;
use crate::config::VerifyConfig;
use crate::errors::{ConfigError, ProbeError};
use crate::fingerprint::Fingerprint;
use crate::getstate::{now_millis, GetState};
use crate::verifier::{VerificationResult, Verifier};

type Queue = Arc<Mutex<VecDeque<(usize, Candidate)>>>;

/// Fixed-size pool of workers draining a shared candidate queue.
pub struct Scheduler {
    verifier: Verifier,
}

impl Scheduler {
    pub fn new(verifier: Verifier) -> Self {
        Scheduler { verifier }
    }

    pub fn state(&self) -> Arc<GetState> {
        self.verifier.state()
    }

    /// One result per candidate, in completion order unless the
    /// configuration asks for input order.
    pub async fn run(&self, candidates: Vec<Candidate>) -> Vec<VerificationResult> {
        let config = self.verifier.config();
        let total = candidates.len();
        let state_ptr = self.verifier.state();
        state_ptr.set_total_candidates(total);
        state_ptr.set_start_time(now_millis());

        let pb = progress_bar(total as u64, config.show_progress());
        let queue: Queue = Arc::new(Mutex::new(candidates.into_iter().enumerate().collect()));
        let (tx, mut rx) = mpsc::unbounded_channel::<(usize, VerificationResult)>();

        let worker_count = config.worker_count().min(total.max(1));
        info!(
            "Verifying {} candidates against '{}' with {} workers",
            total,
            self.verifier.fingerprint().app_name,
            worker_count
        );

        let mut workers = Vec::with_capacity(worker_count);
        for worker_id in 0..worker_count {
            let queue = Arc::clone(&queue);
            let tx = tx.clone();
            let verifier = self.verifier.clone();
            workers.push(tokio::spawn(async move {
                worker(worker_id, verifier, queue, tx).await;
            }));
        }
        drop(tx);

        let mut results = Vec::with_capacity(total);
        while let Some((index, result)) = rx.recv().await {
            pb.inc(1);
            results.push((index, result));
        }
        for handle in workers {
            if let Err(e) = handle.await {
                error!("Worker stopped abnormally: {}", e);
            }
        }
        pb.finish_and_clear();
        state_ptr.set_end_time(now_millis());

        if config.stable_order() {
            results.sort_by_key(|(index, _)| *index);
        }
        results.into_iter().map(|(_, result)| result).collect()
    }
}

async fn worker(
    worker_id: usize,
    verifier: Verifier,
    queue: Queue,
    tx: mpsc::UnboundedSender<(usize, VerificationResult)>,
) {
    loop {
        let next = queue.lock().await.pop_front();
        let Some((index, candidate)) = next else {
            break;
        };
        debug!("Worker {} picked {}", worker_id, candidate.key());

        let task_verifier = verifier.clone();
        let task_candidate = candidate.clone();
        let result = match tokio::spawn(async move { task_verifier.verify(task_candidate).await })
            .await
        {
            Ok(result) => result,
            Err(e) => {
                let reason = if e.is_panic() {
                    panic_message(e.into_panic())
                } else {
                    e.to_string()
                };
                error!("Verification of {} crashed: {}", candidate.key(), reason);
                VerificationResult::failed(candidate, ProbeError::Internal(reason))
            }
        };

        if tx.send((index, result)).is_err() {
            break;
        }
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "task panicked".to_string()
    }
}

fn progress_bar(len: u64, visible: bool) -> ProgressBar {
    if !visible {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new(len);
    if let Ok(style) =
        ProgressStyle::with_template("[{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} ({eta})")
    {
        pb.set_style(
            style
                .with_key("eta", |state: &ProgressState, w: &mut dyn Write| {
                    let _ = write!(w, "{:.1}s", state.eta().as_secs_f64());
                })
                .progress_chars("█▉▊▋▌▍▎▏  "),
        );
    }
    pb
}

/// Validates the configuration, then verifies every candidate with real
/// TCP and HTTP(S) probing.
pub async fn verify_candidates(
    fingerprint: Fingerprint,
    candidates: Vec<Candidate>,
    config: VerifyConfig,
) -> Result<Vec<VerificationResult>, ConfigError> {
    let verifier = Verifier::new(fingerprint, config)?;
    Ok(Scheduler::new(verifier).run(candidates).await)
}
