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
use tracing::debug;

use crate::{
    crypto::{certificate, Signature, SigningScheme, VerificationKey},
    errors::Result,
};

use super::models::VerificationError;

/// Checks `signature_b64` is the RSA SHA-1 signature of `message`, produced
/// by the key of `leaf`.
///
/// `message` must be the raw request body.
pub fn verify_signature(
    message: &[u8],
    signature_b64: &str,
    leaf: &CertificateDer<'_>,
) -> std::result::Result<(), VerificationError> {
    verify_signature_with(message, signature_b64, leaf, SigningScheme::RSA_PKCS1_SHA1)
}

/// Same as [`verify_signature`], using the given signing scheme.
pub fn verify_signature_with(
    message: &[u8],
    signature_b64: &str,
    leaf: &CertificateDer<'_>,
    scheme: SigningScheme,
) -> std::result::Result<(), VerificationError> {
    check_signature(message, signature_b64, leaf, scheme).map_err(|error| {
        debug!(%error, %scheme, "request signature rejected");
        VerificationError::SignatureMismatch
    })
}

fn check_signature(
    message: &[u8],
    signature_b64: &str,
    leaf: &CertificateDer<'_>,
    scheme: SigningScheme,
) -> Result<()> {
    let leaf = certificate::parse(leaf.as_ref())?;
    let key = VerificationKey::from_spki(&leaf.tbs_certificate.subject_public_key_info, scheme)?;

    key.verify_signature(Signature::Base64Encoded(signature_b64.trim().as_bytes()), message)
}
