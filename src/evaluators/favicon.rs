// File: evaluators/favicon.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2023-2026
// - Volker Schwaberow <volker@schwaberow.de>

use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::errors::ProbeError;
use crate::evaluators::{hashing, Evaluator, ProbeContext, ProbeOutcome};
use crate::fingerprint::{ProbeSpec, ProbeType};

pub const DEFAULT_FAVICON_PATH: &str = "/favicon.ico";

static FAVICON_LINKS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r#"(?i)<link[^>]*rel=["'](?:shortcut )?icon["'][^>]*href=["']([^"']+)["']"#)
            .unwrap(),
        Regex::new(r#"(?i)<link[^>]*href=["']([^"']+)["'][^>]*rel=["'](?:shortcut )?icon["']"#)
            .unwrap(),
        Regex::new(r#"(?i)<link[^>]*rel=["']apple-touch-icon["'][^>]*href=["']([^"']+)["']"#)
            .unwrap(),
    ]
});

pub struct FaviconEvaluator;

impl Evaluator for FaviconEvaluator {
    fn name(&self) -> &'static str {
        "Favicon Hash"
    }

    fn probe_type(&self) -> ProbeType {
        ProbeType::FaviconHash
    }

    fn evaluate(
        &self,
        spec: &ProbeSpec,
        points: u32,
        ctx: &ProbeContext<'_>,
    ) -> Result<ProbeOutcome, ProbeError> {
        let outcome = hashing::evaluate_hash_probe(spec, points, ctx)?;
        if outcome.matched {
            debug!("Favicon hash matched at {}", ctx.response.url());
        }
        Ok(outcome)
    }
}

/// Favicon path announced by a page's `<link rel="icon">` family of tags,
/// reduced to a path on the same host.
pub fn discover_favicon_path(html: &str) -> Option<String> {
    let href = FAVICON_LINKS
        .iter()
        .find_map(|re| re.captures(html))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim())?;

    if href.is_empty() || href.starts_with("data:") {
        return None;
    }

    let path = if let Some(rest) = href
        .strip_prefix("http://")
        .or_else(|| href.strip_prefix("https://"))
        .or_else(|| href.strip_prefix("//"))
    {
        match rest.find('/') {
            Some(idx) => rest[idx..].to_string(),
            None => DEFAULT_FAVICON_PATH.to_string(),
        }
    } else if href.starts_with('/') {
        href.to_string()
    } else {
        format!("/{}", href)
    };

    Some(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::*;

    #[rstest]
    #[case(r#"<link rel="icon" href="/static/fav.png">"#, Some("/static/fav.png"))]
    #[case(r#"<link rel="shortcut icon" href="img/fav.ico">"#, Some("/img/fav.ico"))]
    #[case(r#"<LINK href='/x.ico' rel='icon'>"#, Some("/x.ico"))]
    #[case(r#"<link rel="apple-touch-icon" href="https://cdn.example/a/b.png">"#, Some("/a/b.png"))]
    #[case(r#"<link rel="icon" href="//cdn.example/c.ico">"#, Some("/c.ico"))]
    #[case(r#"<link rel="stylesheet" href="/site.css">"#, None)]
    #[case(r#"<link rel="icon" href="data:,">"#, None)]
    fn test_discover_favicon_path(#[case] html: &str, #[case] expected: Option<&str>) {
        assert_eq!(discover_favicon_path(html).as_deref(), expected);
    }
}
