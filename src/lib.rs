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

//! Authentication of requests sent by the Alexa Skills Kit to a skill's
//! HTTPS endpoint.
//!
//! Every request carries the location of the certificate chain used to sign
//! it, a base64 signature of its body, and a timestamp inside of its JSON
//! body. A request is accepted only when:
//!
//! * the certificate chain was downloaded from the platform's bucket
//!   (`https://s3.amazonaws.com/echo.api/...`),
//! * the chain leads to a trusted root, in whatever order it was sent,
//! * the signing certificate has been issued to `echo-api.amazon.com`,
//! * the request is at most 150 seconds old,
//! * the body was signed by the signing certificate.
//!
//! Chains that pass validation are cached by URL, so that only the first
//! request signed with a given certificate pays for the download.
//!
//! # Verification
//!
//! ```rust,no_run
//! use alexa_verifier::verify::{VerificationRequest, Verifier};
//!
//! # async fn handler(headers: Vec<(String, String)>, body: Vec<u8>) -> Result<(), String> {
//! // build this once, and share it between request handlers
//! let verifier = Verifier::production().map_err(|e| e.to_string())?;
//!
//! let request = VerificationRequest::from_headers(headers, body);
//! if let Err(reason) = verifier.verify(&request).await {
//!     // reply with `401 Unauthorized`, using `reason` as body
//!     return Err(reason.to_string());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Feature flags
//!
//! * `http-fetcher` (default): download certificate chains with `reqwest`.
//!   When disabled, a [`fetch::CertificateFetcher`] must be given to the
//!   [`verify::VerifierBuilder`].

#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod cache;
pub mod config;
pub mod crypto;
pub mod errors;
pub mod fetch;
pub mod trust;
pub mod verify;
