// File: main.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2023-2026
// - Volker Schwaberow <volker@schwaberow.de>

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use colored::*;
use log::info;
use simple_logger::SimpleLogger;

use sigprobe::candidate::load_candidates;
use sigprobe::classifier::Classification;
use sigprobe::cli::Cli;
use sigprobe::fingerprint::Fingerprint;
use sigprobe::report::{ReportGenerator, VerificationReport};
use sigprobe::scheduler::Scheduler;
use sigprobe::verifier::Verifier;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.no_color {
        colored::control::set_override(false);
    }
    SimpleLogger::new()
        .with_level(cli.log_level())
        .init()
        .context("Failed to initialise logger")?;

    let fingerprint = Fingerprint::from_file(&cli.fingerprint)
        .with_context(|| format!("Failed to load fingerprint {}", cli.fingerprint.display()))?;
    let candidates = load_candidates(&cli.candidates)
        .with_context(|| format!("Failed to load candidates {}", cli.candidates.display()))?;
    let config = cli.to_config()?;

    info!(
        "Loaded fingerprint '{}' with {} probes and {} candidates",
        fingerprint.app_name,
        fingerprint.probes.len(),
        candidates.len()
    );

    let verifier = Verifier::new(fingerprint.clone(), config)?;
    let scheduler = Scheduler::new(verifier);

    let started_at = Utc::now();
    let results = scheduler.run(candidates).await;
    let finished_at = Utc::now();

    let report = VerificationReport::build(
        &fingerprint,
        &results,
        cli.min_score,
        started_at,
        finished_at,
    )
    .with_stats(scheduler.state().snapshot());

    match &cli.output {
        Some(path) => {
            ReportGenerator::generate_json_report(&report, path)?;
            info!("Report written to {}", path.display());
        }
        None => println!("{}", ReportGenerator::to_json(&report)?),
    }

    if !cli.quiet {
        print_summary(&report);
    }
    Ok(())
}

fn print_summary(report: &VerificationReport) {
    let summary = &report.summary;
    eprintln!();
    eprintln!("{}", format!("Verification of '{}'", report.app_name).bold());
    eprintln!("{}", "=".repeat(40).bright_blue());

    for classification in Classification::ALL {
        let count = report.count(classification).to_string();
        let count = match classification {
            Classification::Verified => count.green().bold(),
            Classification::Likely => count.green(),
            Classification::Partial => count.yellow(),
            Classification::Unlikely => count.bright_black(),
            Classification::NoMatch => count.normal(),
        };
        eprintln!("  {:<10} {}", classification.to_string(), count);
    }

    eprintln!("{}", "-".repeat(40).bright_blue());
    eprintln!("  {:<10} {}", "total", summary.total_candidates);
    eprintln!("  {:<10} {}", "exported", summary.exported);
    eprintln!("  {:<10} {}", "errors", summary.with_errors.to_string().red());
    if let Some(stats) = &summary.stats {
        eprintln!(
            "  {} alive, {} dead, {} timed out, {} HTTP requests in {} ms",
            stats.alive_hosts,
            stats.dead_hosts.to_string().red(),
            stats.timed_out_tasks,
            stats.http_requests,
            stats.elapsed_ms
        );
    }
}
