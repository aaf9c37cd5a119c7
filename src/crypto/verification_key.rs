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

use base64::{engine::general_purpose::STANDARD as BASE64_STD_ENGINE, Engine as _};
use const_oid::db::rfc5912::{ID_EC_PUBLIC_KEY, RSA_ENCRYPTION};
use rsa::pkcs1v15;
use signature::Verifier;
use x509_cert::{der::referenced::OwnedToRef, spki::SubjectPublicKeyInfoOwned};

use super::{Signature, SigningScheme};

use crate::errors::*;

/// A key that can be used to verify signatures.
///
/// Currently the following key formats are supported:
///
///   * RSA keys, using PKCS1 padding and SHA-1 as the digest algorithm
///   * RSA keys, using PKCS1 padding and SHA-256 as the digest algorithm
///   * RSA keys, using PKCS1 padding and SHA-384 as the digest algorithm
///   * RSA keys, using PKCS1 padding and SHA-512 as the digest algorithm
///   * ECDSA keys, ASN.1 DER-encoded, using the P-256 curve and SHA-256 as digest algorithm
///   * ECDSA keys, ASN.1 DER-encoded, using the P-384 curve and SHA-384 as digest algorithm
#[allow(non_camel_case_types)]
#[derive(Debug, Clone)]
pub enum VerificationKey {
    RSA_PKCS1_SHA1(pkcs1v15::VerifyingKey<sha1::Sha1>),
    RSA_PKCS1_SHA256(pkcs1v15::VerifyingKey<sha2::Sha256>),
    RSA_PKCS1_SHA384(pkcs1v15::VerifyingKey<sha2::Sha384>),
    RSA_PKCS1_SHA512(pkcs1v15::VerifyingKey<sha2::Sha512>),
    ECDSA_P256_SHA256_ASN1(p256::ecdsa::VerifyingKey),
    ECDSA_P384_SHA384_ASN1(p384::ecdsa::VerifyingKey),
}

impl VerificationKey {
    /// Builds a [`VerificationKey`] out of a X.509 Subject Public Key Info,
    /// using the digest and padding dictated by `signing_scheme`.
    ///
    /// The key type found inside of the SPKI must agree with the scheme: an
    /// RSA key cannot be used with an ECDSA scheme and vice versa.
    pub fn from_spki(
        subject_pub_key_info: &SubjectPublicKeyInfoOwned,
        signing_scheme: SigningScheme,
    ) -> Result<Self> {
        let algorithm = subject_pub_key_info.algorithm.oid;
        match algorithm {
            RSA_ENCRYPTION if signing_scheme.is_rsa() => {
                let pubkey = rsa::RsaPublicKey::try_from(subject_pub_key_info.owned_to_ref())
                    .map_err(|e| {
                        VerifierError::PKCS8SpkiError(format!(
                            "RSA from der bytes to public key failed: {e}"
                        ))
                    })?;
                Ok(match signing_scheme {
                    SigningScheme::RSA_PKCS1_SHA1 => {
                        VerificationKey::RSA_PKCS1_SHA1(pkcs1v15::VerifyingKey::new(pubkey))
                    }
                    SigningScheme::RSA_PKCS1_SHA384 => {
                        VerificationKey::RSA_PKCS1_SHA384(pkcs1v15::VerifyingKey::new(pubkey))
                    }
                    SigningScheme::RSA_PKCS1_SHA512 => {
                        VerificationKey::RSA_PKCS1_SHA512(pkcs1v15::VerifyingKey::new(pubkey))
                    }
                    _ => VerificationKey::RSA_PKCS1_SHA256(pkcs1v15::VerifyingKey::new(pubkey)),
                })
            }
            ID_EC_PUBLIC_KEY => {
                // uncompressed SEC1 points: 0x04 || X || Y
                let public_key_der = &subject_pub_key_info.subject_public_key;
                match (public_key_der.raw_bytes().len(), signing_scheme) {
                    (65, SigningScheme::ECDSA_P256_SHA256_ASN1) => {
                        Ok(VerificationKey::ECDSA_P256_SHA256_ASN1(
                            p256::ecdsa::VerifyingKey::try_from(subject_pub_key_info.owned_to_ref())
                                .map_err(|e| {
                                    VerifierError::PKCS8SpkiError(format!(
                                        "Ecdsa-P256 from der bytes to public key failed: {e}"
                                    ))
                                })?,
                        ))
                    }
                    (97, SigningScheme::ECDSA_P384_SHA384_ASN1) => {
                        Ok(VerificationKey::ECDSA_P384_SHA384_ASN1(
                            p384::ecdsa::VerifyingKey::try_from(subject_pub_key_info.owned_to_ref())
                                .map_err(|e| {
                                    VerifierError::PKCS8SpkiError(format!(
                                        "Ecdsa-P384 from der bytes to public key failed: {e}"
                                    ))
                                })?,
                        ))
                    }
                    (65 | 97, _) => Err(VerifierError::UnmatchedKeyAndSigningScheme {
                        key_typ: format!(
                            "EC with size {}",
                            (public_key_der.raw_bytes().len() - 1) * 4
                        ),
                        scheme: signing_scheme.to_string(),
                    }),
                    (len, _) => Err(VerifierError::PublicKeyUnsupportedAlgorithmError(format!(
                        "EC with size {} is not supported",
                        (len.saturating_sub(1)) * 4
                    ))),
                }
            }
            RSA_ENCRYPTION => Err(VerifierError::UnmatchedKeyAndSigningScheme {
                key_typ: "RSA".to_string(),
                scheme: signing_scheme.to_string(),
            }),
            _ => Err(VerifierError::PublicKeyUnsupportedAlgorithmError(format!(
                "Key with algorithm OID {} is not supported",
                algorithm
            ))),
        }
    }

    /// Verify the signature provided has been actually generated by the given key
    /// when signing the provided message.
    pub fn verify_signature(&self, signature: Signature, msg: &[u8]) -> Result<()> {
        let sig = match signature {
            Signature::Raw(data) => data.to_owned(),
            Signature::Base64Encoded(data) => BASE64_STD_ENGINE.decode(data)?,
        };

        match self {
            VerificationKey::RSA_PKCS1_SHA1(inner) => {
                let sig = pkcs1v15::Signature::try_from(sig.as_slice())
                    .map_err(|_| VerifierError::PublicKeyVerificationError)?;
                inner
                    .verify(msg, &sig)
                    .map_err(|_| VerifierError::PublicKeyVerificationError)
            }
            VerificationKey::RSA_PKCS1_SHA256(inner) => {
                let sig = pkcs1v15::Signature::try_from(sig.as_slice())
                    .map_err(|_| VerifierError::PublicKeyVerificationError)?;
                inner
                    .verify(msg, &sig)
                    .map_err(|_| VerifierError::PublicKeyVerificationError)
            }
            VerificationKey::RSA_PKCS1_SHA384(inner) => {
                let sig = pkcs1v15::Signature::try_from(sig.as_slice())
                    .map_err(|_| VerifierError::PublicKeyVerificationError)?;
                inner
                    .verify(msg, &sig)
                    .map_err(|_| VerifierError::PublicKeyVerificationError)
            }
            VerificationKey::RSA_PKCS1_SHA512(inner) => {
                let sig = pkcs1v15::Signature::try_from(sig.as_slice())
                    .map_err(|_| VerifierError::PublicKeyVerificationError)?;
                inner
                    .verify(msg, &sig)
                    .map_err(|_| VerifierError::PublicKeyVerificationError)
            }
            // ECDSA signatures are encoded in der.
            VerificationKey::ECDSA_P256_SHA256_ASN1(inner) => {
                let sig = p256::ecdsa::Signature::from_der(&sig)
                    .map_err(|_| VerifierError::PublicKeyVerificationError)?;
                inner
                    .verify(msg, &sig)
                    .map_err(|_| VerifierError::PublicKeyVerificationError)
            }
            VerificationKey::ECDSA_P384_SHA384_ASN1(inner) => {
                let sig = p384::ecdsa::Signature::from_der(&sig)
                    .map_err(|_| VerifierError::PublicKeyVerificationError)?;
                inner
                    .verify(msg, &sig)
                    .map_err(|_| VerifierError::PublicKeyVerificationError)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use openssl::hash::MessageDigest;
    use x509_cert::der::Decode;
    use x509_cert::Certificate;

    use super::*;
    use crate::crypto::tests::*;

    const MESSAGE: &[u8] = br#"{"version":"1.0","request":{"type":"LaunchRequest"}}"#;

    fn leaf_spki(chain: &TestChain) -> SubjectPublicKeyInfoOwned {
        let cert = Certificate::from_der(&chain.leaf.cert.to_der().unwrap()).unwrap();
        cert.tbs_certificate.subject_public_key_info
    }

    #[test]
    fn verify_sha1_signature_success() -> anyhow::Result<()> {
        let chain = TestChain::new()?;
        let signature = chain.sign_sha1(MESSAGE);

        let key = VerificationKey::from_spki(&leaf_spki(&chain), SigningScheme::RSA_PKCS1_SHA1)?;
        assert!(key
            .verify_signature(Signature::Base64Encoded(signature.as_bytes()), MESSAGE)
            .is_ok());

        Ok(())
    }

    #[test]
    fn verify_sha256_signature_success() -> anyhow::Result<()> {
        let chain = TestChain::new()?;
        let signature = chain.sign(MESSAGE, MessageDigest::sha256());

        let key =
            VerificationKey::from_spki(&leaf_spki(&chain), SigningScheme::RSA_PKCS1_SHA256)?;
        assert!(key
            .verify_signature(Signature::Base64Encoded(signature.as_bytes()), MESSAGE)
            .is_ok());

        Ok(())
    }

    #[test]
    fn verify_signature_failure_because_wrong_digest() -> anyhow::Result<()> {
        let chain = TestChain::new()?;
        let signature = chain.sign(MESSAGE, MessageDigest::sha256());

        let key = VerificationKey::from_spki(&leaf_spki(&chain), SigningScheme::RSA_PKCS1_SHA1)?;
        let err = key
            .verify_signature(Signature::Base64Encoded(signature.as_bytes()), MESSAGE)
            .expect_err("Was expecting an error");
        assert!(matches!(err, VerifierError::PublicKeyVerificationError));

        Ok(())
    }

    #[test]
    fn verify_signature_failure_because_wrong_msg() -> anyhow::Result<()> {
        let chain = TestChain::new()?;
        let signature = chain.sign_sha1(MESSAGE);

        let key = VerificationKey::from_spki(&leaf_spki(&chain), SigningScheme::RSA_PKCS1_SHA1)?;
        let err = key
            .verify_signature(
                Signature::Base64Encoded(signature.as_bytes()),
                b"some other message",
            )
            .expect_err("Was expecting an error");
        assert!(matches!(err, VerifierError::PublicKeyVerificationError));

        Ok(())
    }

    #[test]
    fn rsa_key_rejects_ecdsa_scheme() -> anyhow::Result<()> {
        let chain = TestChain::new()?;

        let err = VerificationKey::from_spki(
            &leaf_spki(&chain),
            SigningScheme::ECDSA_P256_SHA256_ASN1,
        )
        .expect_err("Was expecting an error");
        assert!(matches!(
            err,
            VerifierError::UnmatchedKeyAndSigningScheme { .. }
        ));

        Ok(())
    }

    #[test]
    fn ecdsa_p256_key_from_authority_certificate() -> anyhow::Result<()> {
        let chain = TestChain::new()?;
        let cert = Certificate::from_der(&chain.intermediate.cert.to_der()?)?;

        let key = VerificationKey::from_spki(
            &cert.tbs_certificate.subject_public_key_info,
            SigningScheme::ECDSA_P256_SHA256_ASN1,
        )?;
        assert!(matches!(key, VerificationKey::ECDSA_P256_SHA256_ASN1(_)));

        Ok(())
    }
}
