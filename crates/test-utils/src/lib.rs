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

use std::collections::HashMap;

use alloy::{
    node_bindings::{Anvil, AnvilInstance},
    primitives::{hex, Address, B256, U256},
    providers::{DynProvider, Provider, ProviderBuilder},
    signers::local::PrivateKeySigner,
};
use tempfile::TempDir;

pub mod artifacts;
pub mod explorer;

pub use artifacts::{write_hardhat_artifacts, Implementation};
pub use explorer::ExplorerMockServer;

/// A local Anvil node and a Hardhat artifacts directory to deploy from.
pub struct TestCtx {
    pub anvil: AnvilInstance,
    pub artifacts: TempDir,
    /// Read-only provider for inspecting the node.
    pub provider: DynProvider,
    pub deployer: PrivateKeySigner,
}

/// Creates a new [TestCtx] on a node started from `anvil`, with `implementation` standing in for
/// the Holders contract.
pub fn test_ctx(anvil: Anvil, implementation: Implementation) -> anyhow::Result<TestCtx> {
    let anvil = anvil.try_spawn()?;
    let artifacts = tempfile::tempdir()?;
    write_hardhat_artifacts(artifacts.path(), implementation)?;

    let provider = ProviderBuilder::new().connect_http(anvil.endpoint_url()).erased();
    let deployer: PrivateKeySigner = anvil.keys()[0].clone().into();
    Ok(TestCtx { anvil, artifacts, provider, deployer })
}

/// Node on the `tpol` chain ID.
pub fn tpol_anvil() -> Anvil {
    Anvil::new().chain_id(97)
}

impl TestCtx {
    /// Hex encoded private key of the funded deployer account.
    pub fn deployer_key(&self) -> String {
        hex::encode_prefixed(self.deployer.to_bytes())
    }

    /// Variables configuring the `tpol` network against this node, with the node's chain ID.
    pub fn tpol_env(&self) -> HashMap<String, String> {
        HashMap::from([
            ("TEST_POL_RPC".to_string(), self.anvil.endpoint()),
            ("TEST_POL_CID".to_string(), self.anvil.chain_id().to_string()),
            ("TEST_POL_PKEY".to_string(), self.deployer_key()),
        ])
    }

    /// Storage `slot` of `address`.
    pub async fn storage_at(&self, address: Address, slot: B256) -> U256 {
        self.provider
            .get_storage_at(address, U256::from_be_bytes(slot.0))
            .await
            .expect("failed to read storage")
    }
}
