// Copyright 2025 RISC Zero, Inc.
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

//! Errors produced while resolving configuration, building parameters, and deploying.

use std::{fmt, time::Duration};

use alloy::primitives::TxHash;
use thiserror::Error;

/// Errors from resolving a [NetworkConfig](crate::NetworkConfig).
///
/// These are always detected before any network interaction and are never retried.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("unknown network {network:?}; known networks: {}", .known.join(", "))]
    NotFound { network: String, known: Vec<&'static str> },

    #[error("incomplete configuration for network {network:?}: {}", DisplayViolations(.violations))]
    Invalid { network: String, violations: Vec<ConfigViolation> },
}

impl ConfigError {
    /// All violations carried by this error. Empty for [ConfigError::NotFound].
    pub fn violations(&self) -> &[ConfigViolation] {
        match self {
            Self::NotFound { .. } => &[],
            Self::Invalid { violations, .. } => violations,
        }
    }
}

/// A single problem with one configuration variable.
///
/// Raw credential values are never stored here.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigViolation {
    #[error("{var} is not set")]
    MissingEndpoint { var: &'static str },

    #[error("{var} is not a valid URL: {reason}")]
    InvalidEndpoint { var: &'static str, reason: String },

    #[error("{var} must be a positive integer chain ID, got {}", DisplayValue(.value))]
    InvalidChainId { var: &'static str, value: Option<String> },

    #[error("{var} is not set")]
    MissingCredential { var: &'static str },

    #[error("{var} is not a valid private key")]
    InvalidCredential { var: &'static str },
}

struct DisplayValue<'a>(&'a Option<String>);

impl fmt::Display for DisplayValue<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(value) => write!(f, "{value:?}"),
            None => f.write_str("nothing"),
        }
    }
}

struct DisplayTransaction<'a>(&'a Option<TxHash>);

impl fmt::Display for DisplayTransaction<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(tx_hash) => write!(f, " in transaction {tx_hash}"),
            None => Ok(()),
        }
    }
}

struct DisplayViolations<'a>(&'a [ConfigViolation]);

impl fmt::Display for DisplayViolations<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, violation) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{violation}")?;
        }
        Ok(())
    }
}

/// Errors from validating the initializer parameters.
///
/// Each variant names the first violation found for its invariant.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParamsError {
    #[error("invalid tier ordering: {0}")]
    InvalidTierOrdering(String),

    #[error("invalid beneficiary set: {0}")]
    InvalidBeneficiarySet(String),

    #[error("invalid time window: {0}")]
    InvalidTimeWindow(String),

    #[error("failed to load parameter definition: {0}")]
    Definition(String),
}

/// Errors from a proxy deployment attempt.
///
/// None of these are retried: resubmitting would create a second proxy.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeployError {
    #[error("deployment handle unavailable: {0}")]
    Unavailable(String),

    #[error("proxy deployment submission rejected: {0}")]
    SubmissionRejected(String),

    #[error(
        "timed out after {}s waiting for confirmation of transaction {tx_hash}; \
         it may still confirm later, check it before deploying again",
        .after.as_secs()
    )]
    Timeout { tx_hash: TxHash, after: Duration },

    /// The initializer rejected its arguments, either in a mined transaction or when the node
    /// simulated the proxy creation before accepting it.
    #[error("proxy initializer reverted{}: {reason}", DisplayTransaction(.tx_hash))]
    InitializerReverted { tx_hash: Option<TxHash>, reason: String },

    #[error("this deployer already made its single deployment attempt")]
    AlreadyAttempted,
}

/// Errors from submitting a deployment to a block explorer.
#[derive(Error, Debug)]
pub enum VerifyError {
    #[error("explorer request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("explorer returned HTTP {0}")]
    Status(reqwest::StatusCode),

    #[error("explorer rejected verification: {0}")]
    Rejected(String),

    #[error("malformed explorer response: {0}")]
    Malformed(String),

    #[error("verification {guid} still pending after {checks} status checks")]
    Pending { guid: String, checks: u32 },
}
