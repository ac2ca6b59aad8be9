// File: cli.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2023-2026
// - Volker Schwaberow <volker@schwaberow.de>

use clap::Parser;
use log::LevelFilter;
use std::num::NonZeroU32;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::config::{ProbeWeights, ScoreThresholds, VerifyConfig};
use crate::errors::ConfigError;

#[derive(Parser, Debug)]
#[command(
    name = env!("CARGO_PKG_NAME"),
    version = env!("CARGO_PKG_VERSION"),
    author = env!("CARGO_PKG_AUTHORS"),
    about = env!("CARGO_PKG_DESCRIPTION"),
)]
pub struct Cli {
    #[arg(short = 'f', long = "fingerprint", help = "Fingerprint JSON file")]
    pub fingerprint: PathBuf,

    #[arg(
        short = 'c',
        long = "candidates",
        help = "Candidate list (JSON array or one JSON record per line)"
    )]
    pub candidates: PathBuf,

    #[arg(short = 'o', long = "output", help = "Write the JSON report here instead of stdout")]
    pub output: Option<PathBuf>,

    #[arg(short = 'w', long = "workers", default_value_t = 10)]
    pub workers: usize,

    #[arg(
        short = 't',
        long = "timeout",
        default_value_t = 10,
        help = "HTTP request timeout in seconds"
    )]
    pub timeout: u64,

    #[arg(long = "tcp-timeout", default_value_t = 2, help = "TCP liveness timeout in seconds")]
    pub tcp_timeout: u64,

    #[arg(long = "tcp-retries", default_value_t = 2)]
    pub tcp_retries: u32,

    #[arg(long = "task-timeout", help = "Per-candidate budget in seconds")]
    pub task_timeout: Option<u64>,

    #[arg(long = "skip-tls", help = "Do not collect TLS certificate metadata")]
    pub skip_tls: bool,

    #[arg(long = "skip-tcp-check", help = "Go straight to HTTP probing")]
    pub skip_tcp_check: bool,

    #[arg(long = "weights", help = "Point overrides, e.g. favicon:80,body:20,3:40")]
    pub weights: Option<String>,

    #[arg(long = "verified", default_value_t = 80)]
    pub verified: u32,

    #[arg(long = "likely", default_value_t = 50)]
    pub likely: u32,

    #[arg(long = "partial", default_value_t = 30)]
    pub partial: u32,

    #[arg(long = "min-score", default_value_t = 0, help = "Only export results scoring at least this")]
    pub min_score: u32,

    #[arg(long = "stable-order", help = "Return results in input order")]
    pub stable_order: bool,

    #[arg(short = 'r', long = "rate-limit", help = "Maximum requests per second")]
    pub rate_limit: Option<u32>,

    #[arg(long = "user-agent")]
    pub user_agent: Option<String>,

    #[arg(long = "log-level", default_value = "warn")]
    pub log_level: String,

    #[arg(short = 'v', long = "verbose", help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(short = 'q', long = "quiet", help = "Reduce output verbosity")]
    pub quiet: bool,

    #[arg(long = "no-color", help = "Disable colored output")]
    pub no_color: bool,
}

impl Cli {
    pub fn log_level(&self) -> LevelFilter {
        if self.verbose {
            LevelFilter::Debug
        } else if self.quiet {
            LevelFilter::Error
        } else {
            LevelFilter::from_str(&self.log_level).unwrap_or(LevelFilter::Warn)
        }
    }

    pub fn to_config(&self) -> Result<VerifyConfig, ConfigError> {
        let mut config = VerifyConfig::new();
        config.set_worker_count(self.workers);
        config.set_per_request_timeout(Duration::from_secs(self.timeout));
        config.set_tcp_timeout(Duration::from_secs(self.tcp_timeout));
        config.set_tcp_retries(self.tcp_retries);
        config.set_task_timeout(self.task_timeout.map(Duration::from_secs));
        config.set_skip_tls(self.skip_tls);
        config.set_skip_tcp_check(self.skip_tcp_check);
        config.set_stable_order(self.stable_order);
        config.set_show_progress(!self.quiet);
        config.set_rate_limit(self.rate_limit.and_then(NonZeroU32::new));
        if let Some(user_agent) = &self.user_agent {
            config.set_user_agent(user_agent.clone());
        }
        if let Some(weights) = &self.weights {
            config.set_weights(ProbeWeights::parse(weights)?);
        }
        config.set_thresholds(ScoreThresholds::new(self.verified, self.likely, self.partial)?);
        config.validate()?;
        Ok(config)
    }
}
