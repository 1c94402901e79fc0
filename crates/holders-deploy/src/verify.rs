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

//! Block explorer verification of a deployed implementation and its proxy.

use std::time::Duration;

use alloy::primitives::Address;
use async_trait::async_trait;
use serde::Deserialize;
use url::Url;

use crate::{
    config::EnvironmentView, contracts::SourceBundle, deployer::DeploymentResult,
    errors::VerifyError, networks::NetworkEntry,
};

/// Etherscan API v2 endpoint, shared by all chains it indexes.
pub const ETHERSCAN_V2_API_URL: &str = "https://api.etherscan.io/v2/api";

/// How long to keep asking the explorer about a submission.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Polling {
    /// Delay between two requests about the same submission.
    pub interval: Duration,
    /// Maximum number of requests per submission.
    pub attempts: u32,
}

impl Default for Polling {
    fn default() -> Self {
        Self { interval: Duration::from_secs(5), attempts: 12 }
    }
}

/// Explorer answer to a source code submission.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Submission {
    /// Accepted and queued under the given GUID.
    Queued(String),
    /// The explorer already holds verified source for this bytecode.
    AlreadyVerified,
}

/// State of a queued source verification.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VerificationStatus {
    Pending,
    Verified,
    Failed(String),
}

/// A block explorer able to verify contract source and link a proxy to its implementation.
#[async_trait]
pub trait ExplorerVerifier: Send + Sync {
    /// Submit the compiler input of the contract deployed at `address`.
    async fn submit_source(
        &self,
        address: Address,
        chain_id: u64,
        source: &SourceBundle,
    ) -> Result<Submission, VerifyError>;

    /// Ask for the state of the source verification queued as `guid`.
    async fn check_status(
        &self,
        guid: &str,
        chain_id: u64,
    ) -> Result<VerificationStatus, VerifyError>;

    /// Ask the explorer to mark `proxy` as a proxy of `implementation`, returning the explorer's
    /// reference for the request.
    async fn verify_proxy(
        &self,
        proxy: Address,
        implementation: Option<Address>,
        chain_id: u64,
    ) -> Result<String, VerifyError>;
}

/// Verify the implementation source of `deployment`, then link its proxy to it.
///
/// Without a `source` or a known implementation address only the proxy link is requested, which
/// succeeds when the explorer already knows the implementation's source.
pub async fn verify_deployment<V: ExplorerVerifier + ?Sized>(
    verifier: &V,
    deployment: &DeploymentResult,
    source: Option<&SourceBundle>,
    polling: Polling,
) -> Result<String, VerifyError> {
    let chain_id = deployment.chain_id;
    match (deployment.implementation_address, source) {
        (Some(implementation), Some(source)) => {
            verify_source(verifier, implementation, chain_id, source, polling).await?
        }
        (None, _) => tracing::warn!("Implementation address unknown; only linking the proxy"),
        (Some(_), None) => tracing::warn!("No compiler input available; only linking the proxy"),
    }

    let proxy = deployment.proxy_address;
    let guid =
        verifier.verify_proxy(proxy, deployment.implementation_address, chain_id).await?;
    tracing::info!(%proxy, "Submitted proxy verification: {guid}");
    Ok(guid)
}

async fn verify_source<V: ExplorerVerifier + ?Sized>(
    verifier: &V,
    implementation: Address,
    chain_id: u64,
    source: &SourceBundle,
    polling: Polling,
) -> Result<(), VerifyError> {
    let mut submissions = 0;
    let guid = loop {
        submissions += 1;
        match verifier.submit_source(implementation, chain_id, source).await {
            Ok(Submission::Queued(guid)) => break guid,
            Ok(Submission::AlreadyVerified) => {
                tracing::info!(%implementation, "{} is already verified", source.contract_name);
                return Ok(());
            }
            // Explorers index new contracts with some delay.
            Err(VerifyError::Rejected(reason))
                if is_not_indexed(&reason) && submissions < polling.attempts =>
            {
                tracing::debug!(%implementation, "Explorer has not indexed the contract yet");
                tokio::time::sleep(polling.interval).await;
            }
            Err(e) => return Err(e),
        }
    };
    tracing::info!(%implementation, "Submitted {} source: {guid}", source.contract_name);

    for _ in 0..polling.attempts {
        match verifier.check_status(&guid, chain_id).await? {
            VerificationStatus::Verified => {
                tracing::info!(%implementation, "Verified {}", source.contract_name);
                return Ok(());
            }
            VerificationStatus::Failed(reason) => return Err(VerifyError::Rejected(reason)),
            VerificationStatus::Pending => tokio::time::sleep(polling.interval).await,
        }
    }
    Err(VerifyError::Pending { guid, checks: polling.attempts })
}

fn is_not_indexed(reason: &str) -> bool {
    reason.to_lowercase().contains("unable to locate contractcode")
}

/// [ExplorerVerifier] for Etherscan and its API-compatible siblings.
#[derive(Clone)]
pub struct EtherscanVerifier {
    client: reqwest::Client,
    api_url: Url,
    api_key: String,
}

impl std::fmt::Debug for EtherscanVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EtherscanVerifier").field("api_url", &self.api_url.as_str()).finish()
    }
}

impl EtherscanVerifier {
    /// Verifier sending requests to `api_url`, authenticated with `api_key`.
    pub fn new(api_url: Url, api_key: impl Into<String>) -> Result<Self, VerifyError> {
        let client = reqwest::Client::builder().timeout(Duration::from_secs(30)).build()?;
        Ok(Self { client, api_url, api_key: api_key.into() })
    }

    /// Build a verifier with the explorer key of `network`, or `None` if the key is not set.
    pub fn from_env(
        network: &NetworkEntry,
        env: &impl EnvironmentView,
        api_url: Url,
    ) -> Result<Option<Self>, VerifyError> {
        let key = env
            .var(network.explorer_key_var)
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty());
        key.map(|key| Self::new(api_url, key)).transpose()
    }

    async fn post(&self, chain_id: u64, form: &[(&str, String)]) -> Result<String, VerifyError> {
        let request = self.client.post(self.api_url.clone()).form(form);
        self.send(request, chain_id).await
    }

    async fn get(&self, chain_id: u64, query: &[(&str, String)]) -> Result<String, VerifyError> {
        let request = self.client.get(self.api_url.clone()).query(query);
        self.send(request, chain_id).await
    }

    async fn send(
        &self,
        request: reqwest::RequestBuilder,
        chain_id: u64,
    ) -> Result<String, VerifyError> {
        let response = request.query(&[("chainid", chain_id.to_string())]).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(VerifyError::Status(status));
        }
        Ok(response.text().await?)
    }
}

#[async_trait]
impl ExplorerVerifier for EtherscanVerifier {
    async fn submit_source(
        &self,
        address: Address,
        chain_id: u64,
        source: &SourceBundle,
    ) -> Result<Submission, VerifyError> {
        let body = self.post(chain_id, &source_form(address, source, &self.api_key)).await?;
        parse_submission(&body)
    }

    async fn check_status(
        &self,
        guid: &str,
        chain_id: u64,
    ) -> Result<VerificationStatus, VerifyError> {
        let body = self.get(chain_id, &status_query(guid, &self.api_key)).await?;
        parse_verification_status(&body)
    }

    async fn verify_proxy(
        &self,
        proxy: Address,
        implementation: Option<Address>,
        chain_id: u64,
    ) -> Result<String, VerifyError> {
        let body = self.post(chain_id, &proxy_form(proxy, implementation, &self.api_key)).await?;
        parse_explorer_response(&body)
    }
}

fn source_form(
    address: Address,
    source: &SourceBundle,
    api_key: &str,
) -> Vec<(&'static str, String)> {
    vec![
        ("module", "contract".into()),
        ("action", "verifysourcecode".into()),
        ("apikey", api_key.into()),
        ("contractaddress", address.to_string()),
        ("codeformat", "solidity-standard-json-input".into()),
        ("sourceCode", source.standard_json_input.clone()),
        ("contractname", source.contract_name.clone()),
        ("compilerversion", source.compiler_version.clone()),
        // Etherscan's spelling. The implementation takes no constructor arguments.
        ("constructorArguements", String::new()),
    ]
}

fn status_query(guid: &str, api_key: &str) -> Vec<(&'static str, String)> {
    vec![
        ("module", "contract".into()),
        ("action", "checkverifystatus".into()),
        ("guid", guid.into()),
        ("apikey", api_key.into()),
    ]
}

fn proxy_form(
    proxy: Address,
    implementation: Option<Address>,
    api_key: &str,
) -> Vec<(&'static str, String)> {
    let mut form = vec![
        ("module", "contract".into()),
        ("action", "verifyproxycontract".into()),
        ("address", proxy.to_string()),
        ("apikey", api_key.into()),
    ];
    if let Some(implementation) = implementation {
        form.push(("expectedimplementation", implementation.to_string()));
    }
    form
}

#[derive(Deserialize)]
struct ExplorerResponse {
    status: String,
    message: String,
    result: String,
}

fn parse_body(body: &str) -> Result<ExplorerResponse, VerifyError> {
    serde_json::from_str(body).map_err(|e| VerifyError::Malformed(e.to_string()))
}

/// Interpret an Etherscan style `{status, message, result}` response body.
pub fn parse_explorer_response(body: &str) -> Result<String, VerifyError> {
    let response = parse_body(body)?;
    if response.status == "1" {
        Ok(response.result)
    } else {
        Err(VerifyError::Rejected(format!("{}: {}", response.message, response.result)))
    }
}

/// Interpret the response to a source code submission.
pub fn parse_submission(body: &str) -> Result<Submission, VerifyError> {
    match parse_explorer_response(body) {
        Ok(guid) => Ok(Submission::Queued(guid)),
        Err(VerifyError::Rejected(reason)) if is_already_verified(&reason) => {
            Ok(Submission::AlreadyVerified)
        }
        Err(e) => Err(e),
    }
}

/// Interpret the response to a `checkverifystatus` request.
pub fn parse_verification_status(body: &str) -> Result<VerificationStatus, VerifyError> {
    let response = parse_body(body)?;
    if response.status == "1" || is_already_verified(&response.result) {
        Ok(VerificationStatus::Verified)
    } else if response.result.to_lowercase().starts_with("pending") {
        Ok(VerificationStatus::Pending)
    } else {
        Ok(VerificationStatus::Failed(response.result))
    }
}

fn is_already_verified(reason: &str) -> bool {
    reason.to_lowercase().contains("already verified")
}
