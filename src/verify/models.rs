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

use pki_types::CertificateDer;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::{
    config::{SIGNATURE_256_HEADER, SIGNATURE_CERT_CHAIN_URL_HEADER, SIGNATURE_HEADER},
    crypto::{certificate, SigningScheme},
};

/// Reasons a request is rejected.
///
/// The `Display` implementation yields the text meant to be sent back to the
/// caller, usually as the body of a `401 Unauthorized` response.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationError {
    #[error("no request parameter named SignatureCertChainUrl")]
    MissingCertificateHeader,

    #[error("invalid sig chain url")]
    InvalidCertificateSourceUrl,

    #[error("unable to fetch certificate chain")]
    FetchOrDecodeFailure,

    #[error("no valid root found")]
    ChainValidationFailure,

    #[error("invalid DNS")]
    DomainMismatch,

    #[error("invalid timestamp")]
    StaleTimestamp,

    #[error("no signature")]
    MissingSignatureHeader,

    #[error("invalid certificate")]
    MissingCertificate,

    #[error("signature did not match")]
    SignatureMismatch,
}

pub type VerificationResult = Result<(), VerificationError>;

/// DER-encoded certificates as sent by the platform.
///
/// The order is the sender's: the first element is expected to be the leaf,
/// but nothing else about it is guaranteed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CertificateChain(Vec<CertificateDer<'static>>);

impl CertificateChain {
    pub fn new(certificates: Vec<CertificateDer<'static>>) -> Self {
        Self(certificates)
    }

    /// The certificate that signed the request.
    ///
    /// This is the first certificate, in the sender's order, that is not a
    /// certificate authority. When every certificate looks like an authority,
    /// or none can be decoded, the first element is returned.
    pub fn leaf(&self) -> Option<&CertificateDer<'static>> {
        self.0
            .iter()
            .find(|der| {
                certificate::parse(der.as_ref())
                    .and_then(|cert| certificate::is_ca(&cert))
                    .is_ok_and(|ca| !ca)
            })
            .or_else(|| self.0.first())
    }

    pub fn iter(&self) -> impl Iterator<Item = &CertificateDer<'static>> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<CertificateDer<'static>>> for CertificateChain {
    fn from(certificates: Vec<CertificateDer<'static>>) -> Self {
        Self::new(certificates)
    }
}

/// Everything the pipeline needs to know about an inbound request.
///
/// The body must be the exact bytes received on the wire: re-serializing a
/// parsed JSON document invalidates the signature.
#[derive(Clone, Debug, Default)]
pub struct VerificationRequest {
    pub(crate) cert_chain_url: Option<String>,
    pub(crate) signature: Option<String>,
    pub(crate) signature_256: Option<String>,
    pub(crate) timestamp: Option<String>,
    pub(crate) body: Vec<u8>,
}

#[derive(Deserialize)]
struct Envelope {
    request: Option<RequestTimestamp>,
}

#[derive(Deserialize)]
struct RequestTimestamp {
    timestamp: Option<String>,
}

impl VerificationRequest {
    pub fn new(body: impl Into<Vec<u8>>) -> Self {
        Self {
            body: body.into(),
            ..Default::default()
        }
    }

    /// Builds a request out of its HTTP headers and raw body.
    ///
    /// Header names are matched case-insensitively, and the timestamp is
    /// extracted from the body.
    pub fn from_headers<I, K, V>(headers: I, body: impl Into<Vec<u8>>) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut request = Self::new(body);
        for (name, value) in headers {
            let name = name.as_ref();
            let value = value.as_ref().to_string();
            if name.eq_ignore_ascii_case(SIGNATURE_CERT_CHAIN_URL_HEADER) {
                request.cert_chain_url = Some(value);
            } else if name.eq_ignore_ascii_case(SIGNATURE_HEADER) {
                request.signature = Some(value);
            } else if name.eq_ignore_ascii_case(SIGNATURE_256_HEADER) {
                request.signature_256 = Some(value);
            }
        }

        request.with_body_timestamp()
    }

    pub fn with_cert_chain_url(mut self, url: impl Into<String>) -> Self {
        self.cert_chain_url = Some(url.into());
        self
    }

    /// The base64 RSA SHA-1 signature of the body.
    pub fn with_signature(mut self, signature: impl Into<String>) -> Self {
        self.signature = Some(signature.into());
        self
    }

    /// The base64 RSA SHA-256 signature of the body.
    pub fn with_signature_256(mut self, signature: impl Into<String>) -> Self {
        self.signature_256 = Some(signature.into());
        self
    }

    pub fn with_timestamp(mut self, timestamp: impl Into<String>) -> Self {
        self.timestamp = Some(timestamp.into());
        self
    }

    /// Reads the timestamp from the `request.timestamp` field of the JSON
    /// body. A body that cannot be decoded leaves the timestamp unset, which
    /// later makes the request stale.
    pub fn with_body_timestamp(mut self) -> Self {
        match serde_json::from_slice::<Envelope>(&self.body) {
            Ok(envelope) => {
                self.timestamp = envelope.request.and_then(|r| r.timestamp);
            }
            Err(error) => {
                debug!(%error, "cannot extract timestamp from request body");
                self.timestamp = None;
            }
        }
        self
    }

    pub fn cert_chain_url(&self) -> Option<&str> {
        self.cert_chain_url.as_deref()
    }

    pub fn timestamp(&self) -> Option<&str> {
        self.timestamp.as_deref()
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// The signature to check, along with the scheme it was produced with.
    /// `Signature` wins over `Signature-256` when both are present.
    pub(crate) fn signature(&self) -> Option<(&str, SigningScheme)> {
        match (&self.signature, &self.signature_256) {
            (Some(sig), _) => Some((sig.as_str(), SigningScheme::RSA_PKCS1_SHA1)),
            (None, Some(sig)) => Some((sig.as_str(), SigningScheme::RSA_PKCS1_SHA256)),
            (None, None) => None,
        }
    }
}
