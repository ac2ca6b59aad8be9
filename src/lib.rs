// File: lib.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2023-2026
// - Volker Schwaberow <volker@schwaberow.de>

#![allow(clippy::uninlined_format_args)]
#![allow(clippy::bool_assert_comparison)]
#![allow(clippy::new_without_default)]

pub mod candidate;
pub mod classifier;
pub mod cli;
pub mod config;
pub mod errors;
pub mod evaluators;
pub mod fingerprint;
pub mod getstate;
pub mod http;
pub mod httpinner;
pub mod liveness;
pub mod report;
pub mod scheduler;
pub mod scoring;
pub mod tls_analyzer;
pub mod verifier;
