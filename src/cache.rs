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

//! Memoization of validated certificate chains.

use std::sync::{Arc, OnceLock};

use dashmap::DashMap;
use tracing::debug;

use crate::{
    errors::{Result, VerifierError},
    verify::CertificateChain,
};

/// Digest of the settings a chain was validated against: trust anchors,
/// expected hostname and certificate URL policy.
pub type PolicyFingerprint = [u8; 32];

/// Certificate chains that passed both chain and domain validation, keyed by
/// the exact URL they were downloaded from.
///
/// Entries never expire: they are only dropped by [`CertificateCache::purge`].
/// The cache can be shared between verifiers by cloning an `Arc` to it, as
/// long as they validate chains the same way: the first verifier built on a
/// cache binds it to its [`PolicyFingerprint`].
#[derive(Debug, Default)]
pub struct CertificateCache {
    entries: DashMap<String, Arc<CertificateChain>>,
    policy: OnceLock<PolicyFingerprint>,
}

impl CertificateCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, url: &str) -> Option<Arc<CertificateChain>> {
        self.entries.get(url).map(|entry| Arc::clone(entry.value()))
    }

    /// Stores a validated chain. A concurrent write for the same URL simply
    /// replaces an equivalent value.
    pub fn put(&self, url: impl Into<String>, chain: CertificateChain) -> Arc<CertificateChain> {
        let url = url.into();
        let chain = Arc::new(chain);
        debug!(%url, "caching validated certificate chain");
        self.entries.insert(url, Arc::clone(&chain));
        chain
    }

    /// Ties the cache to one validation policy.
    ///
    /// Binding again with the same fingerprint is a no-op, any other
    /// fingerprint is refused.
    pub fn bind(&self, fingerprint: PolicyFingerprint) -> Result<()> {
        if *self.policy.get_or_init(|| fingerprint) != fingerprint {
            return Err(VerifierError::IncompatibleCertificateCache);
        }
        Ok(())
    }

    /// Removes every entry.
    pub fn purge(&self) {
        debug!(entries = self.entries.len(), "purging certificate cache");
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
