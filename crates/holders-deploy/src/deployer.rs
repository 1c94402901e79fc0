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

//! Single-shot deployment of the Holders proxy.

use std::time::Duration;

use alloy::primitives::{Address, TxHash};

use crate::{
    config::NetworkConfig,
    contracts::{ContractFactory, ProxyHandle},
    errors::DeployError,
    networks::chain_name,
    params::InitParams,
};

/// Progress of a [Deployer].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DeploymentState {
    /// No attempt has been made yet.
    Idle,
    /// The deployment transaction was accepted and is awaiting confirmation.
    Submitted { tx_hash: TxHash },
    /// The proxy is deployed and initialized.
    Confirmed { proxy_address: Address },
    /// The attempt ended with an error.
    Failed,
}

/// Outcome of a confirmed deployment.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DeploymentResult {
    /// Address of the proxy. This is the address to interact with.
    pub proxy_address: Address,
    /// Hash of the proxy creation transaction.
    pub transaction_hash: TxHash,
    /// Chain ID reported by the node, equal to the configured one.
    pub chain_id: u64,
    /// Implementation behind the proxy, if the factory reports it.
    pub implementation_address: Option<Address>,
}

/// Deploys one initialized proxy through a [ContractFactory].
///
/// A deployer makes at most one submission. Any later call to [Deployer::deploy] fails with
/// [DeployError::AlreadyAttempted], whatever the outcome of the first.
pub struct Deployer<F> {
    factory: F,
    timeout: Duration,
    state: DeploymentState,
}

impl<F: ContractFactory> Deployer<F> {
    /// Create an idle deployer that waits at most `timeout` for confirmation.
    pub fn new(factory: F, timeout: Duration) -> Self {
        Self { factory, timeout, state: DeploymentState::Idle }
    }

    /// Current progress of the single deployment attempt.
    pub fn state(&self) -> &DeploymentState {
        &self.state
    }

    /// Deploy and initialize the proxy on the network described by `config`.
    ///
    /// Waits at most the configured timeout for confirmation after submitting. On timeout the
    /// transaction hash is reported, since the deployment may still land later.
    pub async fn deploy(
        &mut self,
        config: &NetworkConfig,
        params: &InitParams,
    ) -> Result<DeploymentResult, DeployError> {
        if self.state != DeploymentState::Idle {
            return Err(DeployError::AlreadyAttempted);
        }

        let result = self.attempt(config, params).await;
        if let Err(err) = &result {
            tracing::error!(network = config.network().id, "Deployment failed: {err}");
            self.state = DeploymentState::Failed;
        }
        result
    }

    async fn attempt(
        &mut self,
        config: &NetworkConfig,
        params: &InitParams,
    ) -> Result<DeploymentResult, DeployError> {
        let chain_id = config.chain_id();
        if !config.network().testnet {
            tracing::warn!(
                network = config.network().id,
                "Deploying to a mainnet; this transaction spends real funds"
            );
        }
        tracing::info!(
            network = config.network().id,
            deployer = %config.credential().address(),
            "Deploying Holders proxy to {}",
            chain_name(chain_id)
        );

        let handle = self.factory.connect(config).await?;
        let tx_hash = handle.submit(params.initializer_calldata()).await?;
        self.state = DeploymentState::Submitted { tx_hash };
        tracing::info!(
            %tx_hash,
            "Submitted proxy deployment, waiting up to {}s for confirmation",
            self.timeout.as_secs()
        );

        let confirmation = tokio::time::timeout(self.timeout, handle.confirm(tx_hash)).await;
        let Ok(confirmed) = confirmation else {
            return Err(DeployError::Timeout { tx_hash, after: self.timeout });
        };
        let proxy_address = confirmed?;
        self.state = DeploymentState::Confirmed { proxy_address };
        tracing::info!(%tx_hash, "Holders proxy deployed to {proxy_address}");

        Ok(DeploymentResult {
            proxy_address,
            transaction_hash: tx_hash,
            chain_id,
            implementation_address: handle.implementation(),
        })
    }
}

/// Deploy an initialized proxy with a fresh [Deployer].
pub async fn deploy<F: ContractFactory>(
    config: &NetworkConfig,
    params: &InitParams,
    factory: F,
    timeout: Duration,
) -> Result<DeploymentResult, DeployError> {
    Deployer::new(factory, timeout).deploy(config, params).await
}
