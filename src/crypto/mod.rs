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

//! Structures and constants required to perform cryptographic operations.

use const_oid::{
    db::rfc5912::{
        ECDSA_WITH_SHA_256, ECDSA_WITH_SHA_384, SHA_1_WITH_RSA_ENCRYPTION,
        SHA_256_WITH_RSA_ENCRYPTION, SHA_384_WITH_RSA_ENCRYPTION, SHA_512_WITH_RSA_ENCRYPTION,
    },
    ObjectIdentifier,
};

use crate::errors::*;

pub use certificate_pool::{validate_chain, validate_chain_at};
pub use verification_key::VerificationKey;

/// Digital signature algorithms understood by the verifier.
/// * `RSA_PKCS1_SHA1`: PKCS#1 1.5 padding using SHA-1. This is what the
///   platform uses for the `Signature` request header.
/// * `RSA_PKCS1_SHA256`: PKCS#1 1.5 padding using SHA-256, used for the
///   `Signature-256` request header and by most certificate authorities.
/// * `RSA_PKCS1_SHA384`: PKCS#1 1.5 padding using SHA-384.
/// * `RSA_PKCS1_SHA512`: PKCS#1 1.5 padding using SHA-512.
/// * `ECDSA_P256_SHA256_ASN1`: ASN.1 DER-encoded ECDSA signatures using the
///   P-256 curve and SHA-256.
/// * `ECDSA_P384_SHA384_ASN1`: ASN.1 DER-encoded ECDSA signatures using the
///   P-384 curve and SHA-384.
#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum SigningScheme {
    RSA_PKCS1_SHA1,
    RSA_PKCS1_SHA256,
    RSA_PKCS1_SHA384,
    RSA_PKCS1_SHA512,
    ECDSA_P256_SHA256_ASN1,
    ECDSA_P384_SHA384_ASN1,
}

impl std::fmt::Display for SigningScheme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SigningScheme::RSA_PKCS1_SHA1 => write!(f, "RSA_PKCS1_SHA1"),
            SigningScheme::RSA_PKCS1_SHA256 => write!(f, "RSA_PKCS1_SHA256"),
            SigningScheme::RSA_PKCS1_SHA384 => write!(f, "RSA_PKCS1_SHA384"),
            SigningScheme::RSA_PKCS1_SHA512 => write!(f, "RSA_PKCS1_SHA512"),
            SigningScheme::ECDSA_P256_SHA256_ASN1 => write!(f, "ECDSA_P256_SHA256_ASN1"),
            SigningScheme::ECDSA_P384_SHA384_ASN1 => write!(f, "ECDSA_P384_SHA384_ASN1"),
        }
    }
}

impl SigningScheme {
    /// Maps the `signatureAlgorithm` OID found on a X.509 certificate to the
    /// scheme needed to check it against the issuer's key.
    pub fn from_signature_algorithm(oid: &ObjectIdentifier) -> Result<Self> {
        match *oid {
            SHA_1_WITH_RSA_ENCRYPTION => Ok(Self::RSA_PKCS1_SHA1),
            SHA_256_WITH_RSA_ENCRYPTION => Ok(Self::RSA_PKCS1_SHA256),
            SHA_384_WITH_RSA_ENCRYPTION => Ok(Self::RSA_PKCS1_SHA384),
            SHA_512_WITH_RSA_ENCRYPTION => Ok(Self::RSA_PKCS1_SHA512),
            ECDSA_WITH_SHA_256 => Ok(Self::ECDSA_P256_SHA256_ASN1),
            ECDSA_WITH_SHA_384 => Ok(Self::ECDSA_P384_SHA384_ASN1),
            _ => Err(VerifierError::PublicKeyUnsupportedAlgorithmError(format!(
                "Signature algorithm OID {oid} is not supported"
            ))),
        }
    }

    pub(crate) fn is_rsa(&self) -> bool {
        matches!(
            self,
            SigningScheme::RSA_PKCS1_SHA1
                | SigningScheme::RSA_PKCS1_SHA256
                | SigningScheme::RSA_PKCS1_SHA384
                | SigningScheme::RSA_PKCS1_SHA512
        )
    }
}

/// A signature produced by a private key
pub enum Signature<'a> {
    /// Raw signature. There's no need to process the contents
    Raw(&'a [u8]),
    /// A base64 encoded signature
    Base64Encoded(&'a [u8]),
}

pub(crate) mod certificate;
pub(crate) mod certificate_pool;
pub(crate) use certificate_pool::CertificatePool;

pub mod verification_key;

#[cfg(test)]
pub(crate) mod tests {
    use base64::{engine::general_purpose::STANDARD as BASE64_STD_ENGINE, Engine as _};
    use chrono::{DateTime, TimeDelta, Utc};
    use openssl::asn1::{Asn1Integer, Asn1Time};
    use openssl::bn::{BigNum, MsbOption};
    use openssl::conf::{Conf, ConfMethod};
    use openssl::ec::{EcGroup, EcKey};
    use openssl::hash::MessageDigest;
    use openssl::nid::Nid;
    use openssl::pkey;
    use openssl::sign::Signer;
    use openssl::x509::extension::{
        AuthorityKeyIdentifier, BasicConstraints, KeyUsage, SubjectAlternativeName,
        SubjectKeyIdentifier,
    };
    use openssl::x509::{X509Extension, X509NameBuilder, X509};
    use pki_types::CertificateDer;

    use super::{
        ObjectIdentifier, SigningScheme, ECDSA_WITH_SHA_256, ECDSA_WITH_SHA_384,
        SHA_1_WITH_RSA_ENCRYPTION, SHA_256_WITH_RSA_ENCRYPTION, SHA_384_WITH_RSA_ENCRYPTION,
        SHA_512_WITH_RSA_ENCRYPTION,
    };
    use crate::errors::VerifierError;
    use crate::trust::TrustAnchorSet;
    use crate::verify::CertificateChain;

    pub(crate) const ECHO_API_HOSTNAME: &str = "echo-api.amazon.com";

    pub(crate) struct CertData {
        pub cert: X509,
        pub private_key: pkey::PKey<pkey::Private>,
    }

    impl CertData {
        pub(crate) fn to_der(&self) -> CertificateDer<'static> {
            CertificateDer::from(self.cert.to_der().expect("Cannot DER-encode certificate"))
        }
    }

    pub(crate) struct CertGenerationOptions {
        pub ca: bool,
        pub common_name: String,
        pub dns_names: Vec<String>,
        pub not_before: DateTime<chrono::Utc>,
        pub not_after: DateTime<chrono::Utc>,
        pub private_key: pkey::PKey<pkey::Private>,
        pub public_key: pkey::PKey<pkey::Public>,
    }

    impl Default for CertGenerationOptions {
        fn default() -> Self {
            let not_before = Utc::now()
                .checked_sub_signed(TimeDelta::try_days(1).unwrap())
                .unwrap();
            let not_after = Utc::now()
                .checked_add_signed(TimeDelta::try_days(1).unwrap())
                .unwrap();

            // request bodies are signed with RSA keys
            let (private_key, public_key) = generate_rsa_keypair(2048);

            CertGenerationOptions {
                ca: false,
                common_name: String::from(ECHO_API_HOSTNAME),
                dns_names: vec![String::from(ECHO_API_HOSTNAME)],
                not_before,
                not_after,
                private_key,
                public_key,
            }
        }
    }

    impl CertGenerationOptions {
        pub(crate) fn authority(common_name: &str) -> Self {
            let (private_key, public_key) = generate_ecdsa_p256_keypair();
            CertGenerationOptions {
                ca: true,
                common_name: common_name.to_string(),
                dns_names: vec![],
                private_key,
                public_key,
                ..Default::default()
            }
        }
    }

    pub(crate) fn generate_ecdsa_p256_keypair(
    ) -> (pkey::PKey<pkey::Private>, pkey::PKey<pkey::Public>) {
        let group = EcGroup::from_curve_name(Nid::X9_62_PRIME256V1).expect("Cannot create EcGroup");
        let ec_private_key = EcKey::generate(&group).expect("Cannot create private key");
        let ec_public_key = ec_private_key.public_key();
        let ec_pub_key =
            EcKey::from_public_key(&group, ec_public_key).expect("Cannot create ec pub key");

        let public_key = pkey::PKey::from_ec_key(ec_pub_key).expect("Cannot create pkey");
        let private_key = pkey::PKey::from_ec_key(ec_private_key).expect("Cannot create pkey");

        (private_key, public_key)
    }

    pub(crate) fn generate_rsa_keypair(
        bits: u32,
    ) -> (pkey::PKey<pkey::Private>, pkey::PKey<pkey::Public>) {
        use openssl::rsa;

        let rsa_private_key = rsa::Rsa::generate(bits).expect("Cannot generate RSA key");
        let rsa_public_key_pem = rsa_private_key
            .public_key_to_pem()
            .expect("Cannot obtain public key");
        let rsa_public_key = rsa::Rsa::public_key_from_pem(&rsa_public_key_pem)
            .expect("Cannot create rsa_public_key");

        let private_key = pkey::PKey::from_rsa(rsa_private_key).expect("cannot create private_key");
        let public_key = pkey::PKey::from_rsa(rsa_public_key).expect("cannot create public_key");

        (private_key, public_key)
    }

    pub(crate) fn generate_certificate(
        issuer: Option<&CertData>,
        settings: CertGenerationOptions,
    ) -> anyhow::Result<CertData> {
        let mut x509_name_builder = X509NameBuilder::new()?;
        x509_name_builder.append_entry_by_text("O", "tests")?;
        x509_name_builder.append_entry_by_text("CN", &settings.common_name)?;
        let x509_name = x509_name_builder.build();

        let mut x509_builder = openssl::x509::X509::builder()?;
        x509_builder.set_subject_name(&x509_name)?;
        x509_builder
            .set_pubkey(&settings.public_key)
            .expect("Cannot set public key");

        // set serial number
        let mut big = BigNum::new().expect("Cannot create BigNum");
        big.rand(152, MsbOption::MAYBE_ZERO, true)?;
        let serial_number = Asn1Integer::from_bn(&big)?;
        x509_builder.set_serial_number(&serial_number)?;

        // set version 3
        x509_builder.set_version(2)?;

        // x509 v3 extensions
        let conf = Conf::new(ConfMethod::default())?;
        let x509v3_context = match issuer {
            Some(issuer_data) => x509_builder.x509v3_context(Some(&issuer_data.cert), Some(&conf)),
            None => x509_builder.x509v3_context(None, Some(&conf)),
        };

        let mut extensions: Vec<X509Extension> = Vec::new();

        let x509_extension_subject_key_identifier =
            SubjectKeyIdentifier::new().build(&x509v3_context)?;
        extensions.push(x509_extension_subject_key_identifier);

        if settings.ca {
            let x509_basic_constraint_ca = BasicConstraints::new().critical().ca().build()?;
            extensions.push(x509_basic_constraint_ca);

            let key_usage = KeyUsage::new()
                .critical()
                .crl_sign()
                .key_cert_sign()
                .build()?;
            extensions.push(key_usage);
        } else {
            let x509_basic_constraint = BasicConstraints::new().critical().build()?;
            extensions.push(x509_basic_constraint);

            let key_usage = KeyUsage::new()
                .critical()
                .digital_signature()
                .key_encipherment()
                .build()?;
            extensions.push(key_usage);
        }

        if issuer.is_some() {
            let x509_extension_authority_key_identifier = AuthorityKeyIdentifier::new()
                .keyid(true)
                .build(&x509v3_context)?;
            extensions.push(x509_extension_authority_key_identifier);
        }

        if !settings.dns_names.is_empty() {
            let mut san = SubjectAlternativeName::new();
            for name in &settings.dns_names {
                san.dns(name);
            }
            extensions.push(san.build(&x509v3_context)?);
        }

        for ext in extensions {
            x509_builder.append_extension(ext)?;
        }

        // setup validity
        let not_before = Asn1Time::from_unix(settings.not_before.timestamp())?;
        let not_after = Asn1Time::from_unix(settings.not_after.timestamp())?;
        x509_builder.set_not_after(&not_after)?;
        x509_builder.set_not_before(&not_before)?;

        // set issuer
        if let Some(issuer_data) = issuer {
            let issuer_name = issuer_data.cert.subject_name();
            x509_builder.set_issuer_name(issuer_name)?;
        } else {
            // self signed cert
            x509_builder.set_issuer_name(&x509_name)?;
        }

        // sign the cert
        let issuer_pkey = match issuer {
            Some(issuer_data) => issuer_data.private_key.clone(),
            None => settings.private_key.clone(),
        };
        x509_builder
            .sign(&issuer_pkey, MessageDigest::sha256())
            .expect("Cannot sign certificate");

        let x509 = x509_builder.build();

        Ok(CertData {
            cert: x509,
            private_key: settings.private_key,
        })
    }

    /// A root, an intermediate issued by the root, and a leaf issued by the
    /// intermediate.
    pub(crate) struct TestChain {
        pub root: CertData,
        pub intermediate: CertData,
        pub leaf: CertData,
    }

    impl TestChain {
        pub(crate) fn new() -> anyhow::Result<Self> {
            Self::with_leaf(CertGenerationOptions::default())
        }

        pub(crate) fn with_leaf(leaf_options: CertGenerationOptions) -> anyhow::Result<Self> {
            let root = generate_certificate(None, CertGenerationOptions::authority("Test Root CA"))?;
            let intermediate = generate_certificate(
                Some(&root),
                CertGenerationOptions::authority("Test Intermediate CA"),
            )?;
            let leaf = generate_certificate(Some(&intermediate), leaf_options)?;

            Ok(TestChain {
                root,
                intermediate,
                leaf,
            })
        }

        /// Leaf first, the way the platform serves its bundle.
        pub(crate) fn chain(&self) -> CertificateChain {
            CertificateChain::new(vec![self.leaf.to_der(), self.intermediate.to_der()])
        }

        pub(crate) fn trust_anchors(&self) -> TrustAnchorSet {
            TrustAnchorSet::from_certificates([self.root.to_der()])
                .expect("Cannot build trust anchors")
        }

        pub(crate) fn sign(&self, message: &[u8], digest: MessageDigest) -> String {
            let mut signer =
                Signer::new(digest, &self.leaf.private_key).expect("Cannot create signer");
            signer.update(message).expect("Cannot hash message");
            let signature = signer.sign_to_vec().expect("Cannot sign message");
            BASE64_STD_ENGINE.encode(signature)
        }

        pub(crate) fn sign_sha1(&self, message: &[u8]) -> String {
            self.sign(message, MessageDigest::sha1())
        }
    }

    #[rstest::rstest]
    #[case(SHA_1_WITH_RSA_ENCRYPTION, SigningScheme::RSA_PKCS1_SHA1)]
    #[case(SHA_256_WITH_RSA_ENCRYPTION, SigningScheme::RSA_PKCS1_SHA256)]
    #[case(SHA_384_WITH_RSA_ENCRYPTION, SigningScheme::RSA_PKCS1_SHA384)]
    #[case(SHA_512_WITH_RSA_ENCRYPTION, SigningScheme::RSA_PKCS1_SHA512)]
    #[case(ECDSA_WITH_SHA_256, SigningScheme::ECDSA_P256_SHA256_ASN1)]
    #[case(ECDSA_WITH_SHA_384, SigningScheme::ECDSA_P384_SHA384_ASN1)]
    fn certificate_signature_algorithms(
        #[case] oid: ObjectIdentifier,
        #[case] expected: SigningScheme,
    ) {
        assert_eq!(
            SigningScheme::from_signature_algorithm(&oid).ok(),
            Some(expected)
        );
    }

    #[test]
    fn unknown_signature_algorithm_is_rejected() {
        // id-Ed25519
        let oid = ObjectIdentifier::new_unwrap("1.3.101.112");
        let err = SigningScheme::from_signature_algorithm(&oid).expect_err("Was expecting an error");
        assert!(matches!(
            err,
            VerifierError::PublicKeyUnsupportedAlgorithmError(_)
        ));
    }
}
