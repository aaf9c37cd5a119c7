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

//! Settings of the verification pipeline.
//!
//! The defaults reproduce the rules of the Alexa Skills Kit; overriding them
//! is mostly useful to point the verifier at a test environment.

use std::time::Duration;

use serde::Deserialize;

use crate::verify::policy::CertificateUrlPolicy;

/// Request header carrying the location of the signing certificate chain.
pub const SIGNATURE_CERT_CHAIN_URL_HEADER: &str = "SignatureCertChainUrl";

/// Request header carrying the base64 RSA SHA-1 signature of the body.
pub const SIGNATURE_HEADER: &str = "Signature";

/// Request header carrying the base64 RSA SHA-256 signature of the body.
pub const SIGNATURE_256_HEADER: &str = "Signature-256";

/// Host name the signing certificate must have been issued for.
pub const ECHO_API_HOSTNAME: &str = "echo-api.amazon.com";

/// Oldest accepted request, in seconds.
pub const MAX_TIMESTAMP_AGE_SECS: i64 = 150;

/// How long the HTTP fetcher waits for a certificate bundle.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct VerifierConfig {
    /// Host name the leaf certificate must be bound to.
    pub expected_hostname: String,
    /// Locations certificate chains may be fetched from.
    pub cert_url: CertificateUrlPolicy,
    /// Maximum age of a request before it is considered a replay.
    pub max_timestamp_age_secs: i64,
    pub fetch_timeout_secs: u64,
}

impl VerifierConfig {
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            expected_hostname: ECHO_API_HOSTNAME.to_string(),
            cert_url: CertificateUrlPolicy::default(),
            max_timestamp_age_secs: MAX_TIMESTAMP_AGE_SECS,
            fetch_timeout_secs: DEFAULT_FETCH_TIMEOUT.as_secs(),
        }
    }
}
