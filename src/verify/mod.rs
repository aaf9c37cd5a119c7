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

//! Verifier for Alexa Skills Kit requests.
//!
//! The [`Verifier`] runs every check a request has to pass, in order, and
//! stops at the first one that fails. The individual checks are exported as
//! well so they can be composed by callers with different needs.

mod models;
pub use models::{CertificateChain, VerificationError, VerificationRequest, VerificationResult};

pub mod policy;
pub use policy::{is_fresh, validate_domain, CertificateUrlPolicy};

mod signature;
pub use signature::{verify_signature, verify_signature_with};

mod verifier;
pub use verifier::{Verifier, VerifierBuilder};

pub use crate::crypto::{validate_chain, validate_chain_at};
