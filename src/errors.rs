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

//! The errors that can be raised by alexa-verifier outside of the request
//! pipeline.
//!
//! Failures of an individual request are reported through
//! [`VerificationError`](crate::verify::VerificationError) instead; the
//! variants below carry the detailed cause that the pipeline logs before
//! collapsing it into a rejection reason.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, VerifierError>;

#[derive(Error, Debug)]
pub enum VerifierError {
    #[error(transparent)]
    FromPEMError(#[from] pem::PemError),

    #[error(transparent)]
    Base64DecodeError(#[from] base64::DecodeError),

    #[error(transparent)]
    X509ParseError(#[from] x509_cert::der::Error),

    #[error(transparent)]
    WebPKIError(#[from] webpki::Error),

    #[cfg(feature = "http-fetcher")]
    #[cfg_attr(docsrs, doc(cfg(feature = "http-fetcher")))]
    #[error(transparent)]
    ReqwestError(#[from] reqwest::Error),

    #[error("Public key with unsupported algorithm: {0}")]
    PublicKeyUnsupportedAlgorithmError(String),

    #[error("unmatched key type {key_typ} and signing scheme {scheme}")]
    UnmatchedKeyAndSigningScheme { key_typ: String, scheme: String },

    #[error("Public key verification error")]
    PublicKeyVerificationError,

    #[error("Pkcs8 spki error : {0}")]
    PKCS8SpkiError(String),

    #[error("X.509 certificate version is not V3")]
    CertificateUnsupportedVersionError,

    #[error("Certificate validity check failed: {0}")]
    CertificateValidityError(String),

    #[error("Certificate was not issued by {0}")]
    CertificateIssuerMismatch(String),

    #[error("Invalid certificate: {0}")]
    InvalidCertError(String),

    #[error("Certificate pool error: {0}")]
    CertificatePoolError(String),

    #[error("Certificate bundle request to {url} failed: {reason}")]
    CertificateFetchError { url: String, reason: String },

    #[error("Certificate bundle does not contain any certificate")]
    EmptyCertificateBundle,

    #[error("Certificate cache is already bound to another verification policy")]
    IncompatibleCertificateCache,

    #[error("{0}")]
    UnexpectedError(String),
}
