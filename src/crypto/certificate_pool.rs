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

use chrono::{DateTime, Utc};
use pki_types::TrustAnchor;
use tracing::{debug, warn};
use x509_cert::{
    der::{asn1::AnyRef, Decode, Encode, Tag},
    name::Name,
    spki::SubjectPublicKeyInfoOwned,
    Certificate,
};

use crate::{
    crypto::certificate,
    errors::{Result, VerifierError},
    trust::TrustAnchorSet,
    verify::{CertificateChain, VerificationError},
};

/// Something the pool trusts to sign certificates: either a trust anchor or
/// a certificate of the chain that has already been proven trustworthy.
#[derive(Clone, Debug)]
struct Issuer {
    subject: Name,
    public_key: SubjectPublicKeyInfoOwned,
    may_issue: bool,
}

impl Issuer {
    fn from_anchor(anchor: &TrustAnchor<'_>) -> Result<Self> {
        // Trust anchors store the *contents* of the subject and SPKI
        // sequences, the outer tag has to be put back before decoding.
        let subject = Name::from_der(&reassemble_sequence(anchor.subject.as_ref())?)?;
        let public_key = SubjectPublicKeyInfoOwned::from_der(&reassemble_sequence(
            anchor.subject_public_key_info.as_ref(),
        )?)?;

        Ok(Self {
            subject,
            public_key,
            may_issue: true,
        })
    }

    fn from_certificate(cert: &Certificate) -> Self {
        Self {
            subject: cert.tbs_certificate.subject.clone(),
            public_key: cert.tbs_certificate.subject_public_key_info.clone(),
            may_issue: certificate::is_ca(cert).unwrap_or(false),
        }
    }

    /// One hop of path validation. `Ok(false)` means this issuer is not the
    /// one named by `cert`; an `Err` means it is but the hop does not hold.
    fn has_issued(&self, cert: &Certificate, now: DateTime<Utc>) -> Result<bool> {
        if cert.tbs_certificate.issuer != self.subject {
            return Ok(false);
        }

        if !self.may_issue {
            return Err(VerifierError::CertificateIssuerMismatch(format!(
                "{}, which is not a certificate authority",
                self.subject
            )));
        }

        certificate::verify_validity_at(cert, now)?;
        certificate::verify_issued_by(cert, &self.public_key)?;

        Ok(true)
    }
}

fn reassemble_sequence(contents: &[u8]) -> Result<Vec<u8>> {
    Ok(AnyRef::new(Tag::Sequence, contents)?.to_der()?)
}

/// The issuers trusted before looking at any request.
///
/// While validating a chain, its certificates are promoted to issuers as soon
/// as a trusted issuer is proven to have signed them. This makes validation
/// independent of the order in which the sender listed its certificates.
#[derive(Clone, Debug, Default)]
pub(crate) struct CertificatePool {
    issuers: Vec<Issuer>,
}

impl CertificatePool {
    /// Builds a `CertificatePool` out of a [`TrustAnchorSet`].
    ///
    /// Anchors that cannot be decoded are skipped.
    pub(crate) fn from_trust_anchors(trust_anchors: &TrustAnchorSet) -> Self {
        let issuers = trust_anchors
            .iter()
            .filter_map(|anchor| match Issuer::from_anchor(anchor) {
                Ok(issuer) => Some(issuer),
                Err(error) => {
                    warn!(?error, "skipping trust anchor that cannot be decoded");
                    None
                }
            })
            .collect();

        Self { issuers }
    }

    pub(crate) fn len(&self) -> usize {
        self.issuers.len()
    }

    /// Position of the first certificate of `worklist` issued by a trust
    /// anchor or by one of the `promoted` certificates.
    fn find_trusted(
        &self,
        promoted: &[Issuer],
        worklist: &[Certificate],
        now: DateTime<Utc>,
    ) -> Option<usize> {
        worklist.iter().position(|cert| {
            self.issuers
                .iter()
                .chain(promoted)
                .any(|issuer| match issuer.has_issued(cert, now) {
                    Ok(issued) => issued,
                    Err(error) => {
                        debug!(
                            subject = %cert.tbs_certificate.subject,
                            %error,
                            "issuer rejected certificate"
                        );
                        false
                    }
                })
        })
    }

    /// Ensures every certificate of `chain` is reachable from the trust
    /// anchors. The chain is handed back untouched.
    pub(crate) fn verify_chain(
        &self,
        chain: CertificateChain,
        now: DateTime<Utc>,
    ) -> Result<CertificateChain> {
        if chain.is_empty() {
            return Err(VerifierError::CertificatePoolError(
                "empty certificate chain".into(),
            ));
        }

        let mut worklist = chain
            .iter()
            .map(|der| certificate::parse(der.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        let mut promoted = Vec::with_capacity(worklist.len());

        while !worklist.is_empty() {
            let Some(position) = self.find_trusted(&promoted, &worklist, now) else {
                let untrusted: Vec<_> = worklist
                    .iter()
                    .map(|cert| cert.tbs_certificate.subject.to_string())
                    .collect();
                return Err(VerifierError::CertificatePoolError(format!(
                    "no trusted issuer for {}",
                    untrusted.join("; ")
                )));
            };

            let trusted = worklist.remove(position);
            debug!(subject = %trusted.tbs_certificate.subject, "certificate added to trusted pool");
            promoted.push(Issuer::from_certificate(&trusted));
        }

        Ok(chain)
    }
}

/// Ensures the given chain, in any order, is rooted in `trust_anchors`.
///
/// On success the chain is returned exactly as it was received, so its first
/// element remains the sender's leaf. Every failure is reported as
/// [`VerificationError::ChainValidationFailure`]; the detailed cause is
/// logged.
pub fn validate_chain(
    chain: CertificateChain,
    trust_anchors: &TrustAnchorSet,
) -> std::result::Result<CertificateChain, VerificationError> {
    validate_chain_at(chain, trust_anchors, Utc::now())
}

/// Same as [`validate_chain`], checking certificate validity at `now`.
pub fn validate_chain_at(
    chain: CertificateChain,
    trust_anchors: &TrustAnchorSet,
    now: DateTime<Utc>,
) -> std::result::Result<CertificateChain, VerificationError> {
    CertificatePool::from_trust_anchors(trust_anchors)
        .verify_chain(chain, now)
        .map_err(|error| {
            debug!(%error, "certificate chain rejected");
            VerificationError::ChainValidationFailure
        })
}
