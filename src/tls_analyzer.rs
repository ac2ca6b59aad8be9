// File: tls_analyzer.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2023-2026
// - Volker Schwaberow <volker@schwaberow.de>

use chrono::{DateTime, Utc};
use log::{debug, trace};
use once_cell::sync::Lazy;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_rustls::rustls::client::{ServerCertVerified, ServerCertVerifier};
use tokio_rustls::rustls::{self, Certificate, ClientConfig, ServerName};
use tokio_rustls::TlsConnector;
use x509_parser::prelude::*;

use crate::errors::ProbeError;

/// Leaf certificate summary. Collected for any certificate, valid or not.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CertificateInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub common_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject_org: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issuer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issuer_org: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub subject_alternative_names: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub emails: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub valid_from: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub valid_to: Option<DateTime<Utc>>,
    pub is_valid_now: bool,
    pub is_self_signed: bool,
    pub fingerprint_sha256: String,
}

struct AcceptAnyCertificate;

impl ServerCertVerifier for AcceptAnyCertificate {
    fn verify_server_cert(
        &self,
        _end_entity: &Certificate,
        _intermediates: &[Certificate],
        _server_name: &ServerName,
        _scts: &mut dyn Iterator<Item = &[u8]>,
        _ocsp_response: &[u8],
        _now: SystemTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }
}

static TLS_CONFIG: Lazy<Arc<ClientConfig>> = Lazy::new(|| {
    Arc::new(
        ClientConfig::builder()
            .with_safe_defaults()
            .with_custom_certificate_verifier(Arc::new(AcceptAnyCertificate))
            .with_no_client_auth(),
    )
});

pub struct TlsAnalyzer;

impl TlsAnalyzer {
    /// Completes a handshake with `host:port` and summarises the leaf
    /// certificate. Connect and handshake are each bounded by `limit`.
    pub async fn fetch(host: &str, port: u16, limit: Duration) -> Result<CertificateInfo, ProbeError> {
        let url = format!("https://{}:{}", host, port);
        debug!("Fetching TLS certificate for {}", url);

        let tcp = match timeout(limit, TcpStream::connect((host, port))).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) => {
                return Err(ProbeError::Connect {
                    url,
                    reason: e.to_string(),
                })
            }
            Err(_) => return Err(ProbeError::Timeout { url }),
        };

        let server_name = ServerName::try_from(host.trim_matches(|c| c == '[' || c == ']'))
            .map_err(|e| ProbeError::Connect {
                url: url.clone(),
                reason: format!("invalid server name: {}", e),
            })?;

        let connector = TlsConnector::from(Arc::clone(&TLS_CONFIG));
        let stream = match timeout(limit, connector.connect(server_name, tcp)).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) => {
                return Err(ProbeError::Connect {
                    url,
                    reason: format!("TLS handshake failed: {}", e),
                })
            }
            Err(_) => return Err(ProbeError::Timeout { url }),
        };

        let der = stream
            .get_ref()
            .1
            .peer_certificates()
            .and_then(|certs| certs.first())
            .map(|cert| cert.0.clone())
            .ok_or_else(|| ProbeError::Transport {
                url: url.clone(),
                reason: "no peer certificate presented".to_string(),
            })?;

        trace!("Received {} byte leaf certificate from {}", der.len(), url);
        Self::parse_der(&der).map_err(|reason| ProbeError::Transport { url, reason })
    }

    pub fn parse_der(der: &[u8]) -> Result<CertificateInfo, String> {
        let (_, cert) = X509Certificate::from_der(der)
            .map_err(|e| format!("certificate parse failed: {}", e))?;

        let mut subject_alternative_names = Vec::new();
        let mut emails = Vec::new();
        if let Ok(Some(san)) = cert.subject_alternative_name() {
            for name in &san.value.general_names {
                match name {
                    GeneralName::DNSName(dns) => subject_alternative_names.push(dns.to_string()),
                    GeneralName::IPAddress(ip) => {
                        if let Some(addr) = ip_from_bytes(ip) {
                            subject_alternative_names.push(addr.to_string());
                        }
                    }
                    GeneralName::RFC822Name(mail) => emails.push(mail.to_string()),
                    _ => {}
                }
            }
        }

        let validity = cert.validity();
        Ok(CertificateInfo {
            common_name: common_name(cert.subject()),
            subject_org: organization(cert.subject()),
            issuer: common_name(cert.issuer()),
            issuer_org: organization(cert.issuer()),
            subject_alternative_names,
            emails,
            valid_from: DateTime::<Utc>::from_timestamp(validity.not_before.timestamp(), 0),
            valid_to: DateTime::<Utc>::from_timestamp(validity.not_after.timestamp(), 0),
            is_valid_now: validity.is_valid(),
            is_self_signed: cert.subject().as_raw() == cert.issuer().as_raw(),
            fingerprint_sha256: format!("{:x}", Sha256::digest(der)),
        })
    }
}

fn common_name(name: &X509Name) -> Option<String> {
    name.iter_common_name()
        .next()
        .and_then(|attr| attr.as_str().ok())
        .map(str::to_string)
}

fn organization(name: &X509Name) -> Option<String> {
    name.iter_organization()
        .next()
        .and_then(|attr| attr.as_str().ok())
        .map(str::to_string)
}

fn ip_from_bytes(bytes: &[u8]) -> Option<std::net::IpAddr> {
    match bytes.len() {
        4 => {
            let octets: [u8; 4] = bytes.try_into().ok()?;
            Some(std::net::IpAddr::from(octets))
        }
        16 => {
            let octets: [u8; 16] = bytes.try_into().ok()?;
            Some(std::net::IpAddr::from(octets))
        }
        _ => None,
    }
}
