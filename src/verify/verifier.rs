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

use std::sync::Arc;

use chrono::Utc;
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};
use url::Url;

use crate::{
    cache::{CertificateCache, PolicyFingerprint},
    config::VerifierConfig,
    crypto::CertificatePool,
    errors::{Result as VerifierResult, VerifierError},
    fetch::CertificateFetcher,
    trust::TrustAnchorSet,
};

use super::{
    models::{CertificateChain, VerificationError, VerificationRequest, VerificationResult},
    policy::{is_fresh_at, validate_domain_for},
    signature::verify_signature_with,
};

/// Authenticates requests sent by the platform.
///
/// A `Verifier` is meant to be built once and shared by all the request
/// handlers: it holds the trust anchors and the cache of validated
/// certificate chains.
pub struct Verifier {
    config: VerifierConfig,
    cert_pool: CertificatePool,
    fetcher: Box<dyn CertificateFetcher>,
    cache: Arc<CertificateCache>,
}

impl Verifier {
    pub fn builder() -> VerifierBuilder {
        VerifierBuilder::default()
    }

    /// A verifier trusting the bundled roots and downloading certificates
    /// over HTTPS.
    #[cfg(feature = "http-fetcher")]
    #[cfg_attr(docsrs, doc(cfg(feature = "http-fetcher")))]
    pub fn production() -> VerifierResult<Self> {
        Self::builder().build()
    }

    pub fn config(&self) -> &VerifierConfig {
        &self.config
    }

    pub fn cache(&self) -> &Arc<CertificateCache> {
        &self.cache
    }

    /// Forgets every certificate chain validated so far.
    pub fn purge_cache(&self) {
        self.cache.purge();
    }

    /// Runs every check on `request`, stopping at the first failure.
    ///
    /// The error returned, once displayed, is the reason to report back to
    /// the sender.
    pub async fn verify(&self, request: &VerificationRequest) -> VerificationResult {
        // 1) Locate the certificate chain that signed the request.
        let Some(cert_chain_url) = request.cert_chain_url() else {
            debug!("request has no certificate chain URL");
            return Err(VerificationError::MissingCertificateHeader);
        };

        // 2) Use the cached chain, or download and validate it.
        let chain = self.resolve_chain(cert_chain_url).await?;

        // 3) Reject replays.
        let now = Utc::now();
        if !is_fresh_at(request.timestamp(), now, self.config.max_timestamp_age_secs) {
            return Err(VerificationError::StaleTimestamp);
        }
        debug!("request timestamp is fresh");

        // 4) Verify that the body was signed by the leaf certificate.
        let Some((signature, scheme)) = request.signature() else {
            debug!("request has no signature");
            return Err(VerificationError::MissingSignatureHeader);
        };
        // only reachable with an empty chain put in the cache by hand
        let Some(leaf) = chain.leaf() else {
            return Err(VerificationError::MissingCertificate);
        };
        verify_signature_with(request.body(), signature, leaf, scheme)?;

        debug!("successfully verified!");
        Ok(())
    }

    async fn resolve_chain(
        &self,
        cert_chain_url: &str,
    ) -> Result<Arc<CertificateChain>, VerificationError> {
        if let Some(chain) = self.cache.get(cert_chain_url) {
            debug!(url = cert_chain_url, "cache hit, skipping certificate validation");
            return Ok(chain);
        }

        let url = match Url::parse(cert_chain_url) {
            Ok(url) if self.config.cert_url.accepts(&url) => url,
            Ok(_) => {
                info!(url = cert_chain_url, "certificate chain URL rejected by policy");
                return Err(VerificationError::InvalidCertificateSourceUrl);
            }
            Err(error) => {
                info!(url = cert_chain_url, %error, "cannot parse certificate chain URL");
                return Err(VerificationError::InvalidCertificateSourceUrl);
            }
        };

        let chain = self.fetcher.fetch(&url).await.map_err(|error| {
            warn!(%url, %error, "cannot fetch certificate chain");
            VerificationError::FetchOrDecodeFailure
        })?;

        let chain = self
            .cert_pool
            .verify_chain(chain, Utc::now())
            .map_err(|error| {
                info!(%url, %error, "fetched certificate chain failed chain validation");
                VerificationError::ChainValidationFailure
            })?;

        let chain = validate_domain_for(chain, &self.config.expected_hostname).inspect_err(|_| {
            info!(%url, "fetched certificate chain failed domain validation");
        })?;

        Ok(self.cache.put(cert_chain_url, chain))
    }
}

/// Builds [`Verifier`] instances.
///
/// Without any further setting the verifier trusts the bundled roots, applies
/// the default [`VerifierConfig`], downloads certificate chains over HTTPS
/// and owns a private cache.
#[derive(Default)]
pub struct VerifierBuilder {
    config: VerifierConfig,
    trust_anchors: Option<TrustAnchorSet>,
    fetcher: Option<Box<dyn CertificateFetcher>>,
    cache: Option<Arc<CertificateCache>>,
}

impl VerifierBuilder {
    pub fn with_config(mut self, config: VerifierConfig) -> Self {
        self.config = config;
        self
    }

    /// Optional - the roots certificate chains must lead to.
    pub fn with_trust_anchors(mut self, trust_anchors: TrustAnchorSet) -> Self {
        self.trust_anchors = Some(trust_anchors);
        self
    }

    /// Optional - how certificate chains are downloaded.
    ///
    /// Required when the `http-fetcher` feature is disabled.
    pub fn with_fetcher(mut self, fetcher: impl CertificateFetcher + 'static) -> Self {
        self.fetcher = Some(Box::new(fetcher));
        self
    }

    /// Optional - a cache shared with other verifiers.
    ///
    /// [`build`](Self::build) fails when the cache is already used by a
    /// verifier with other trust anchors, expected hostname or certificate
    /// URL policy.
    pub fn with_cache(mut self, cache: Arc<CertificateCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn build(self) -> VerifierResult<Verifier> {
        let trust_anchors = match self.trust_anchors {
            Some(trust_anchors) => {
                info!(anchors = trust_anchors.len(), "using custom trust anchors");
                trust_anchors
            }
            None => TrustAnchorSet::bundled(),
        };

        let cert_pool = CertificatePool::from_trust_anchors(&trust_anchors);
        if cert_pool.len() == 0 {
            return Err(VerifierError::CertificatePoolError(
                "no usable trust anchor".to_string(),
            ));
        }

        let cache = self.cache.unwrap_or_default();
        cache.bind(policy_fingerprint(&trust_anchors, &self.config))?;

        let fetcher = match self.fetcher {
            Some(fetcher) => fetcher,
            None => default_fetcher(&self.config)?,
        };

        Ok(Verifier {
            config: self.config,
            cert_pool,
            fetcher,
            cache,
        })
    }
}

/// Digest of everything a cached chain has been validated against.
fn policy_fingerprint(
    trust_anchors: &TrustAnchorSet,
    config: &VerifierConfig,
) -> PolicyFingerprint {
    let mut hasher = Sha256::new();
    let mut field = |bytes: &[u8]| {
        hasher.update((bytes.len() as u64).to_be_bytes());
        hasher.update(bytes);
    };

    for anchor in trust_anchors.iter() {
        field(anchor.subject.as_ref());
        field(anchor.subject_public_key_info.as_ref());
    }
    field(config.expected_hostname.to_ascii_lowercase().as_bytes());
    field(config.cert_url.scheme.to_ascii_lowercase().as_bytes());
    field(config.cert_url.host.to_ascii_lowercase().as_bytes());
    field(&config.cert_url.port.to_be_bytes());
    field(config.cert_url.path_prefix.as_bytes());

    hasher.finalize().into()
}

#[cfg(feature = "http-fetcher")]
fn default_fetcher(config: &VerifierConfig) -> VerifierResult<Box<dyn CertificateFetcher>> {
    Ok(Box::new(crate::fetch::HttpCertificateFetcher::new(
        config.fetch_timeout(),
    )?))
}

#[cfg(not(feature = "http-fetcher"))]
fn default_fetcher(_config: &VerifierConfig) -> VerifierResult<Box<dyn CertificateFetcher>> {
    Err(VerifierError::UnexpectedError(
        "no certificate fetcher configured".to_string(),
    ))
}
