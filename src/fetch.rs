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

//! Retrieval of the certificate chains referenced by requests.

use async_trait::async_trait;
use pki_types::CertificateDer;
use url::Url;

use crate::{
    errors::{Result, VerifierError},
    verify::CertificateChain,
};

/// Downloads the certificate chain found at a location.
///
/// Implementations are not expected to check the location: the verifier only
/// hands over URLs that passed its
/// [`CertificateUrlPolicy`](crate::verify::CertificateUrlPolicy).
#[async_trait]
pub trait CertificateFetcher: Send + Sync {
    async fn fetch(&self, url: &Url) -> Result<CertificateChain>;
}

/// Decodes a PEM bundle, keeping its certificates in the order they appear.
///
/// Blocks of other types are skipped. A bundle without any certificate is an
/// error.
pub fn parse_pem_bundle(bundle: &[u8]) -> Result<CertificateChain> {
    let certificates: Vec<CertificateDer<'static>> = pem::parse_many(bundle)?
        .into_iter()
        .filter(|block| block.tag() == "CERTIFICATE")
        .map(|block| CertificateDer::from(block.into_contents()))
        .collect();

    if certificates.is_empty() {
        return Err(VerifierError::EmptyCertificateBundle);
    }

    Ok(CertificateChain::new(certificates))
}

/// Largest certificate bundle accepted from the network, in bytes.
pub const MAX_BUNDLE_SIZE: usize = 64 * 1024;

#[cfg(feature = "http-fetcher")]
pub use http::HttpCertificateFetcher;

#[cfg(feature = "http-fetcher")]
mod http {
    use std::time::Duration;

    use async_trait::async_trait;
    use tracing::debug;
    use url::Url;

    use super::{parse_pem_bundle, CertificateFetcher, MAX_BUNDLE_SIZE};
    use crate::{
        errors::{Result, VerifierError},
        verify::CertificateChain,
    };

    /// Fetches PEM bundles over HTTPS.
    #[derive(Clone, Debug)]
    pub struct HttpCertificateFetcher {
        client: reqwest::Client,
    }

    impl HttpCertificateFetcher {
        pub fn new(timeout: Duration) -> Result<Self> {
            let client = reqwest::Client::builder().timeout(timeout).build()?;
            Ok(Self { client })
        }
    }

    #[async_trait]
    impl CertificateFetcher for HttpCertificateFetcher {
        async fn fetch(&self, url: &Url) -> Result<CertificateChain> {
            debug!(%url, "downloading certificate chain");
            let mut response = self
                .client
                .get(url.clone())
                .send()
                .await
                .map_err(|e| VerifierError::CertificateFetchError {
                    url: url.to_string(),
                    reason: e.to_string(),
                })?;

            let status = response.status();
            if !status.is_success() {
                return Err(VerifierError::CertificateFetchError {
                    url: url.to_string(),
                    reason: format!("unexpected status {status}"),
                });
            }

            let too_large = || VerifierError::CertificateFetchError {
                url: url.to_string(),
                reason: format!("bundle larger than {MAX_BUNDLE_SIZE} bytes"),
            };

            if response
                .content_length()
                .is_some_and(|len| len > MAX_BUNDLE_SIZE as u64)
            {
                return Err(too_large());
            }

            // the announced length may be missing or wrong
            let mut bundle = Vec::new();
            while let Some(chunk) = response.chunk().await? {
                if bundle.len() + chunk.len() > MAX_BUNDLE_SIZE {
                    return Err(too_large());
                }
                bundle.extend_from_slice(&chunk);
            }

            parse_pem_bundle(&bundle)
        }
    }
}
