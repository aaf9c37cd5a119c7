//
// Copyright 2026 The alexa-verifier Authors.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Checks a request has to pass besides the cryptographic ones: where its
//! certificate comes from, who the certificate was issued to, and when the
//! request was sent.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;
use tracing::debug;
use url::Url;

use crate::{
    config::{ECHO_API_HOSTNAME, MAX_TIMESTAMP_AGE_SECS},
    crypto::certificate,
    errors::{Result, VerifierError},
};

use super::models::{CertificateChain, VerificationError};

/// Locations certificate chains may be downloaded from.
///
/// The defaults only accept `https://s3.amazonaws.com/echo.api/...`, on the
/// standard port.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct CertificateUrlPolicy {
    pub scheme: String,
    pub host: String,
    pub port: u16,
    pub path_prefix: String,
}

impl Default for CertificateUrlPolicy {
    fn default() -> Self {
        Self {
            scheme: "https".to_string(),
            host: "s3.amazonaws.com".to_string(),
            port: 443,
            path_prefix: "/echo.api/".to_string(),
        }
    }
}

impl CertificateUrlPolicy {
    /// Checks an already parsed URL.
    ///
    /// Parsing resolves `.` and `..` path segments and lowercases scheme and
    /// host, so the comparisons below operate on the location that would
    /// actually be requested. The path prefix is case sensitive.
    pub fn accepts(&self, url: &Url) -> bool {
        url.scheme().eq_ignore_ascii_case(&self.scheme)
            && url
                .host_str()
                .is_some_and(|host| host.eq_ignore_ascii_case(&self.host))
            && url.port_or_known_default() == Some(self.port)
            && url.path().starts_with(&self.path_prefix)
    }

    /// Parses then checks `url`. Anything that is not a URL is rejected.
    pub fn is_valid_cert_url(&self, url: &str) -> bool {
        match Url::parse(url) {
            Ok(url) => self.accepts(&url),
            Err(error) => {
                debug!(url, %error, "cannot parse certificate URL");
                false
            }
        }
    }
}

/// Ensures the [leaf](CertificateChain::leaf) of the chain has been issued to
/// the platform's API host, `echo-api.amazon.com`.
///
/// Must run on a chain that already passed [`validate_chain`](super::validate_chain).
pub fn validate_domain(
    chain: CertificateChain,
) -> std::result::Result<CertificateChain, VerificationError> {
    validate_domain_for(chain, ECHO_API_HOSTNAME)
}

/// Same as [`validate_domain`], with a custom host name.
pub fn validate_domain_for(
    chain: CertificateChain,
    hostname: &str,
) -> std::result::Result<CertificateChain, VerificationError> {
    match leaf_identities(&chain) {
        Ok(names) if names.iter().any(|name| name.eq_ignore_ascii_case(hostname)) => Ok(chain),
        Ok(names) => {
            debug!(expected = hostname, ?names, "leaf certificate is bound to other hosts");
            Err(VerificationError::DomainMismatch)
        }
        Err(error) => {
            debug!(%error, "cannot read identities of leaf certificate");
            Err(VerificationError::DomainMismatch)
        }
    }
}

fn leaf_identities(chain: &CertificateChain) -> Result<Vec<String>> {
    let leaf = chain
        .leaf()
        .ok_or_else(|| VerifierError::InvalidCertError("empty certificate chain".to_string()))?;
    certificate::dns_identities(&certificate::parse(leaf.as_ref())?)
}

/// Parses the timestamp found inside of a request.
///
/// The date and time are read as UTC. An RFC 3339 offset is accepted but not
/// applied: `12:00:00+02:00` is noon UTC.
pub fn parse_timestamp(timestamp: &str) -> Option<DateTime<Utc>> {
    let timestamp = timestamp.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(timestamp) {
        return Some(ts.naive_local().and_utc());
    }

    NaiveDateTime::parse_from_str(timestamp, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|ts| ts.and_utc())
}

/// Whether a request sent at `timestamp` is recent enough to be processed.
///
/// Missing and malformed timestamps are never fresh.
pub fn is_fresh(timestamp: Option<&str>) -> bool {
    is_fresh_at(timestamp, Utc::now(), MAX_TIMESTAMP_AGE_SECS)
}

/// Same as [`is_fresh`], relative to `now` and with a custom window.
///
/// Only the age is bounded: timestamps ahead of `now` are accepted.
pub fn is_fresh_at(timestamp: Option<&str>, now: DateTime<Utc>, max_age_secs: i64) -> bool {
    let Some(raw) = timestamp else {
        debug!("request has no timestamp");
        return false;
    };

    let Some(sent_at) = parse_timestamp(raw) else {
        debug!(timestamp = raw, "cannot parse request timestamp");
        return false;
    };

    let age = (now - sent_at).num_seconds();
    if age > max_age_secs {
        debug!(age, max_age_secs, "request is too old");
        return false;
    }

    true
}
