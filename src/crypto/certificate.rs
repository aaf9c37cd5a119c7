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
use const_oid::db::rfc4519::CN;
use x509_cert::{
    der::{Decode, Encode},
    ext::pkix::{constraints, name::GeneralName, KeyUsage, SubjectAltName},
    spki::SubjectPublicKeyInfoOwned,
    Certificate,
};

use crate::{
    crypto::{Signature, SigningScheme, VerificationKey},
    errors::{Result, VerifierError},
};

/// Parses a single DER-encoded certificate.
pub(crate) fn parse(der: &[u8]) -> Result<Certificate> {
    Ok(Certificate::from_der(der)?)
}

/// Ensure `now` falls inside of the validity window of the certificate.
pub(crate) fn verify_validity_at(certificate: &Certificate, now: DateTime<Utc>) -> Result<()> {
    let validity = &certificate.tbs_certificate.validity;
    let not_before: DateTime<Utc> = validity.not_before.to_system_time().into();
    if now < not_before {
        return Err(VerifierError::CertificateValidityError(format!(
            "cannot be used before {}",
            validity.not_before
        )));
    }

    let not_after: DateTime<Utc> = validity.not_after.to_system_time().into();
    if now > not_after {
        return Err(VerifierError::CertificateValidityError(format!(
            "expired on {}",
            validity.not_after
        )));
    }

    Ok(())
}

/// Checks the signature of `certificate` against the public key of its
/// would-be issuer.
///
/// This does not compare names, the caller is expected to have matched the
/// certificate's issuer with the subject owning `issuer_key`.
pub(crate) fn verify_issued_by(
    certificate: &Certificate,
    issuer_key: &SubjectPublicKeyInfoOwned,
) -> Result<()> {
    let scheme = SigningScheme::from_signature_algorithm(&certificate.signature_algorithm.oid)?;
    let key = VerificationKey::from_spki(issuer_key, scheme)?;

    let signature = certificate.signature.as_bytes().ok_or_else(|| {
        VerifierError::InvalidCertError("signature is not octet aligned".to_string())
    })?;
    let tbs = certificate.tbs_certificate.to_der()?;

    key.verify_signature(Signature::Raw(signature), &tbs)
}

/// Checks if the given `certificate` is allowed to issue other certificates.
///
/// The certificate must be a V3 certificate carrying `BasicConstraints.ca`.
/// When a `KeyUsage` extension is present it must include `keyCertSign`.
pub(crate) fn is_ca(certificate: &Certificate) -> Result<bool> {
    let tbs = &certificate.tbs_certificate;

    // earlier versions of X.509 lack extensions and have ambiguous CA behavior.
    if tbs.version != x509_cert::Version::V3 {
        return Err(VerifierError::CertificateUnsupportedVersionError);
    }

    let ca = match tbs.get::<constraints::BasicConstraints>()? {
        None => return Ok(false),
        Some((_, v)) => v.ca,
    };

    let key_cert_sign = match tbs.get::<KeyUsage>()? {
        None => true,
        Some((_, v)) => v.key_cert_sign(),
    };

    Ok(ca && key_cert_sign)
}

/// Host names the certificate has been issued for: every `dNSName` of the
/// Subject Alternative Name extension, followed by the subject's common
/// names.
pub(crate) fn dns_identities(certificate: &Certificate) -> Result<Vec<String>> {
    let tbs = &certificate.tbs_certificate;
    let mut names = Vec::new();

    if let Some((_, san)) = tbs.get::<SubjectAltName>()? {
        names.extend(san.0.iter().filter_map(|name| match name {
            GeneralName::DnsName(name) => Some(name.as_str().to_owned()),
            _ => None,
        }));
    }

    names.extend(
        tbs.subject
            .0
            .iter()
            .flat_map(|rdn| rdn.0.iter())
            .filter(|atv| atv.oid == CN)
            .filter_map(|atv| std::str::from_utf8(atv.value.value()).ok())
            .map(str::to_owned),
    );

    Ok(names)
}
