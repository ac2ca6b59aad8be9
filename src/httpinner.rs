// File: httpinner.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2023-2026
// - Volker Schwaberow <volker@schwaberow.de>

use reqwest::header::HeaderMap;
use std::borrow::Cow;

/// Snapshot of one fetched response. Bodies are kept as raw bytes so hash
/// probes see exactly what came over the wire.
#[derive(Debug, Clone)]
pub struct HttpInner {
    body: Vec<u8>,
    headers: HeaderMap,
    status: u16,
    url: String,
}

impl HttpInner {
    pub fn new() -> Self {
        HttpInner {
            body: Vec::new(),
            headers: HeaderMap::new(),
            status: 0,
            url: String::new(),
        }
    }

    pub fn new_with_all(headers: HeaderMap, body: Vec<u8>, status: u16, url: String) -> Self {
        HttpInner {
            body,
            headers,
            status,
            url,
        }
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Body decoded as UTF-8, invalid sequences replaced.
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn header_values(&self, name: &str) -> Vec<&str> {
        self.headers
            .get_all(name)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .collect()
    }
}
