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

use std::{path::PathBuf, sync::OnceLock, time::Duration};

use alloy::{
    network::{EthereumWallet, TransactionBuilder},
    primitives::{Address, Bytes, TxHash, U256},
    providers::{
        DynProvider, PendingTransactionBuilder, PendingTransactionError, Provider,
        ProviderBuilder, WatchTxError,
    },
    rpc::types::{TransactionReceipt, TransactionRequest},
    transports::TransportError,
};
use async_trait::async_trait;
use derive_builder::Builder;

use super::{
    load_artifact, proxy_creation_code, Artifact, ContractFactory, ProxyHandle,
    ERC1967_IMPLEMENTATION_SLOT,
};
use crate::{config::NetworkConfig, errors::DeployError, networks::chain_name};

/// Default time to wait for a deployment transaction to confirm.
pub const DEFAULT_TX_TIMEOUT: Duration = Duration::from_secs(300);

/// Options for [RpcContractFactory].
#[derive(Clone, Debug, Builder)]
pub struct FactoryConfig {
    /// Directory holding the compiled contract artifacts.
    #[builder(setter(into))]
    pub artifacts_dir: PathBuf,
    /// Name of the implementation contract.
    #[builder(setter(into), default = "\"Holders\".to_string()")]
    pub contract: String,
    /// Name of the ERC-1967 proxy contract.
    #[builder(setter(into), default = "\"ERC1967Proxy\".to_string()")]
    pub proxy_contract: String,
    /// Time to wait for each deployment transaction to confirm.
    #[builder(default = "DEFAULT_TX_TIMEOUT")]
    pub tx_timeout: Duration,
    /// Number of confirmations required before a deployment is considered final.
    #[builder(default = "1")]
    pub confirmations: u64,
}

impl FactoryConfig {
    /// Builder with the default contract names, timeout, and one confirmation.
    pub fn builder() -> FactoryConfigBuilder {
        Default::default()
    }
}

/// [ContractFactory] deploying over JSON-RPC with creation code loaded from compiled artifacts.
#[derive(Clone, Debug)]
pub struct RpcContractFactory {
    config: FactoryConfig,
}

impl RpcContractFactory {
    /// Factory deploying the contracts named in `config`.
    pub fn new(config: FactoryConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl ContractFactory for RpcContractFactory {
    type Handle = RpcProxyHandle;

    async fn connect(&self, config: &NetworkConfig) -> Result<RpcProxyHandle, DeployError> {
        let artifacts = &self.config.artifacts_dir;
        let implementation = load_artifact(artifacts, &self.config.contract)
            .map_err(|e| DeployError::Unavailable(format!("{e:#}")))?;
        let proxy = load_artifact(artifacts, &self.config.proxy_contract)
            .map_err(|e| DeployError::Unavailable(format!("{e:#}")))?;

        let wallet = EthereumWallet::from(config.credential().signer().clone());
        let provider =
            ProviderBuilder::new().wallet(wallet).connect_http(config.endpoint().clone()).erased();

        let host = config.endpoint().host_str().unwrap_or_default().to_string();
        let remote_chain_id = provider.get_chain_id().await.map_err(|e| {
            DeployError::Unavailable(format!("failed to query chain ID from {host}: {e}"))
        })?;
        if remote_chain_id != config.chain_id() {
            return Err(DeployError::Unavailable(format!(
                "endpoint {host} serves chain ID {remote_chain_id}, but {} is set to {}",
                config.network().chain_id_var,
                config.chain_id()
            )));
        }
        tracing::debug!("Connected to {host} ({})", chain_name(remote_chain_id));

        Ok(RpcProxyHandle {
            provider,
            implementation,
            proxy,
            tx_timeout: self.config.tx_timeout,
            confirmations: self.config.confirmations,
            implementation_address: OnceLock::new(),
        })
    }
}

/// [ProxyHandle] backed by a wallet-enabled JSON-RPC provider.
///
/// Submitting first deploys the implementation contract and waits for it to confirm, then sends
/// the proxy creation transaction whose constructor runs the initializer.
pub struct RpcProxyHandle {
    provider: DynProvider,
    implementation: Artifact,
    proxy: Artifact,
    tx_timeout: Duration,
    confirmations: u64,
    implementation_address: OnceLock<Address>,
}

impl RpcProxyHandle {
    async fn send_creation(&self, code: Bytes, what: &str) -> Result<TxHash, TransportError> {
        let tx = TransactionRequest::default().with_deploy_code(code);
        let pending = self.provider.send_transaction(tx).await?;
        let tx_hash = *pending.tx_hash();
        tracing::info!(%tx_hash, "Sent {what} deployment transaction");
        Ok(tx_hash)
    }

    async fn wait(&self, tx_hash: TxHash) -> Result<TransactionReceipt, DeployError> {
        PendingTransactionBuilder::new(self.provider.root().clone(), tx_hash)
            .with_required_confirmations(self.confirmations)
            .with_timeout(Some(self.tx_timeout))
            .get_receipt()
            .await
            .map_err(|e| match e {
                PendingTransactionError::TxWatcher(WatchTxError::Timeout) => {
                    DeployError::Timeout { tx_hash, after: self.tx_timeout }
                }
                e => DeployError::Unavailable(format!(
                    "failed to fetch receipt for transaction {tx_hash}: {e}"
                )),
            })
    }
}

#[async_trait]
impl ProxyHandle for RpcProxyHandle {
    async fn submit(&self, initializer: Bytes) -> Result<TxHash, DeployError> {
        let implementation = match self.implementation_address.get() {
            Some(address) => *address,
            None => {
                let name = &self.implementation.name;
                let tx_hash = self
                    .send_creation(self.implementation.bytecode.clone(), name)
                    .await
                    .map_err(|e| DeployError::SubmissionRejected(format!("{name}: {e}")))?;
                let receipt = self.wait(tx_hash).await?;
                if !receipt.status() {
                    return Err(DeployError::SubmissionRejected(format!(
                        "{} implementation deployment reverted in transaction {tx_hash}",
                        self.implementation.name
                    )));
                }
                let address = receipt.contract_address.ok_or_else(|| {
                    DeployError::SubmissionRejected(format!(
                        "receipt of transaction {tx_hash} has no contract address"
                    ))
                })?;
                tracing::info!("Deployed {} implementation to {address}", self.implementation.name);
                *self.implementation_address.get_or_init(|| address)
            }
        };

        // The node simulates the creation to estimate gas, so a rejecting initializer usually
        // surfaces here rather than in a mined receipt.
        let code = proxy_creation_code(&self.proxy.bytecode, implementation, initializer);
        self.send_creation(code, &self.proxy.name).await.map_err(|e| {
            if is_revert(&e) {
                DeployError::InitializerReverted { tx_hash: None, reason: e.to_string() }
            } else {
                DeployError::SubmissionRejected(format!("{}: {e}", self.proxy.name))
            }
        })
    }

    async fn confirm(&self, tx_hash: TxHash) -> Result<Address, DeployError> {
        let receipt = self.wait(tx_hash).await?;
        if !receipt.status() {
            return Err(DeployError::InitializerReverted {
                tx_hash: Some(tx_hash),
                reason: "proxy creation reverted; the initializer rejected its arguments".into(),
            });
        }
        let proxy = receipt.contract_address.ok_or_else(|| {
            DeployError::InitializerReverted {
                tx_hash: Some(tx_hash),
                reason: "receipt has no contract address".into(),
            }
        })?;

        if let Some(expected) = self.implementation_address.get() {
            let slot = U256::from_be_bytes(ERC1967_IMPLEMENTATION_SLOT.0);
            match self.provider.get_storage_at(proxy, slot).await {
                Ok(value) => {
                    let actual = Address::from_word(value.to_be_bytes::<32>().into());
                    if actual != *expected {
                        tracing::warn!(
                            "Proxy {proxy} reports implementation {actual}, expected {expected}"
                        );
                    }
                }
                Err(e) => tracing::warn!("Failed to read implementation slot of {proxy}: {e}"),
            }
        }
        Ok(proxy)
    }

    fn implementation(&self) -> Option<Address> {
        self.implementation_address.get().copied()
    }
}

fn is_revert(e: &TransportError) -> bool {
    e.as_error_resp().is_some_and(|payload| payload.message.to_lowercase().contains("revert"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_defaults() {
        let config = FactoryConfig::builder().artifacts_dir("artifacts").build().unwrap();
        assert_eq!(config.artifacts_dir, PathBuf::from("artifacts"));
        assert_eq!(config.contract, "Holders");
        assert_eq!(config.proxy_contract, "ERC1967Proxy");
        assert_eq!(config.tx_timeout, DEFAULT_TX_TIMEOUT);
        assert_eq!(config.confirmations, 1);
    }

    #[test]
    fn builder_requires_artifacts_dir() {
        assert!(FactoryConfig::builder().build().is_err());
    }
}
