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

//! Roots of trust for certificate chain validation.

use pki_types::{CertificateDer, TrustAnchor};

use crate::errors::{Result, VerifierError};

/// An immutable set of root certificates.
///
/// Built once and shared read-only by every verification. The
/// [`Default`] set is the Mozilla root program bundled through
/// `webpki-roots`, which includes the authorities issuing the platform's
/// signing certificates.
#[derive(Debug, Clone)]
pub struct TrustAnchorSet {
    anchors: Vec<TrustAnchor<'static>>,
}

impl TrustAnchorSet {
    /// The roots bundled with the crate.
    pub fn bundled() -> Self {
        Self {
            anchors: webpki_roots::TLS_SERVER_ROOTS.to_vec(),
        }
    }

    /// Builds a `TrustAnchorSet` out of DER-encoded root certificates.
    pub fn from_certificates<'r, R>(trusted_roots: R) -> Result<Self>
    where
        R: IntoIterator<Item = CertificateDer<'r>>,
    {
        Ok(Self {
            anchors: trusted_roots
                .into_iter()
                .map(|x| Ok(webpki::anchor_from_trusted_cert(&x)?.to_owned()))
                .collect::<std::result::Result<Vec<_>, webpki::Error>>()?,
        })
    }

    /// Builds a `TrustAnchorSet` out of a PEM bundle. Blocks that are not
    /// certificates are ignored.
    pub fn from_pem(pem_bundle: &[u8]) -> Result<Self> {
        let roots: Vec<CertificateDer<'static>> = pem::parse_many(pem_bundle)?
            .into_iter()
            .filter(|block| block.tag() == "CERTIFICATE")
            .map(|block| CertificateDer::from(block.into_contents()))
            .collect();

        if roots.is_empty() {
            return Err(VerifierError::EmptyCertificateBundle);
        }

        Self::from_certificates(roots)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TrustAnchor<'static>> {
        self.anchors.iter()
    }

    pub fn len(&self) -> usize {
        self.anchors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.anchors.is_empty()
    }
}

impl Default for TrustAnchorSet {
    fn default() -> Self {
        Self::bundled()
    }
}
