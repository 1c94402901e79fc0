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

//! The static table of networks the Holders contract can be deployed to.

use alloy_chains::NamedChain;

use crate::errors::ConfigError;

/// Description of one deployment target.
///
/// An entry only names the environment variables holding the endpoint, chain ID, and signing
/// key. It never holds the values themselves.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NetworkEntry {
    /// Identifier selected with `--network`.
    pub id: &'static str,
    /// Variable holding the JSON-RPC endpoint URL.
    pub rpc_var: &'static str,
    /// Variable holding the EIP-155 chain ID.
    pub chain_id_var: &'static str,
    /// Variable holding the deployer private key.
    pub credential_var: &'static str,
    /// Variable holding the block explorer API key for this chain family.
    pub explorer_key_var: &'static str,
    /// Whether this is a test network.
    pub testnet: bool,
}

impl NetworkEntry {
    const fn new(
        id: &'static str,
        rpc_var: &'static str,
        chain_id_var: &'static str,
        credential_var: &'static str,
        explorer_key_var: &'static str,
        testnet: bool,
    ) -> Self {
        Self { id, rpc_var, chain_id_var, credential_var, explorer_key_var, testnet }
    }
}

/// [NetworkEntry] for Ethereum mainnet.
pub const ETH: NetworkEntry =
    NetworkEntry::new("eth", "ETH_RPC", "ETH_CID", "ETH_PKEY", "ETH_APIKEY", false);

/// [NetworkEntry] for BNB Smart Chain mainnet.
pub const BSC: NetworkEntry =
    NetworkEntry::new("bsc", "BSC_RPC", "BSC_CID", "BSC_PKEY", "BSC_APIKEY", false);

/// [NetworkEntry] for Polygon PoS mainnet.
pub const POL: NetworkEntry =
    NetworkEntry::new("pol", "POL_RPC", "POL_CID", "POL_PKEY", "POL_APIKEY", false);

/// [NetworkEntry] for the Sepolia testnet.
pub const SEP: NetworkEntry =
    NetworkEntry::new("sep", "SEP_RPC", "SEP_CID", "SEP_PKEY", "ETH_APIKEY", true);

/// [NetworkEntry] for the BNB Smart Chain testnet.
pub const TEST_BSC: NetworkEntry = NetworkEntry::new(
    "tbsc",
    "TEST_BSC_RPC",
    "TEST_BSC_CID",
    "TEST_BSC_PKEY",
    "BSC_APIKEY",
    true,
);

/// [NetworkEntry] for the Polygon testnet.
pub const TEST_POL: NetworkEntry = NetworkEntry::new(
    "tpol",
    "TEST_POL_RPC",
    "TEST_POL_CID",
    "TEST_POL_PKEY",
    "POL_APIKEY",
    true,
);

/// All built-in networks, mainnets first.
pub const BUILTIN_NETWORKS: &[NetworkEntry] = &[ETH, BSC, POL, SEP, TEST_BSC, TEST_POL];

/// Lookup table from network identifier to [NetworkEntry].
#[derive(Clone, Copy, Debug)]
pub struct NetworkRegistry {
    entries: &'static [NetworkEntry],
}

impl Default for NetworkRegistry {
    fn default() -> Self {
        Self::new(BUILTIN_NETWORKS)
    }
}

impl NetworkRegistry {
    /// Create a registry over the given entries.
    pub const fn new(entries: &'static [NetworkEntry]) -> Self {
        Self { entries }
    }

    /// Lookup the [NetworkEntry] for a network identifier.
    pub fn lookup(&self, id: &str) -> Result<&'static NetworkEntry, ConfigError> {
        self.entries.iter().find(|entry| entry.id == id).ok_or_else(|| ConfigError::NotFound {
            network: id.to_string(),
            known: self.ids().collect(),
        })
    }

    /// Identifiers of all known networks.
    pub fn ids(&self) -> impl Iterator<Item = &'static str> {
        self.entries.iter().map(|entry| entry.id)
    }

    /// Every entry, in registry order.
    pub fn entries(&self) -> &'static [NetworkEntry] {
        self.entries
    }
}

/// Human readable name of a chain ID, for log output.
pub fn chain_name(chain_id: u64) -> String {
    match NamedChain::try_from(chain_id) {
        Ok(chain) => format!("{chain} ({chain_id})"),
        Err(_) => format!("chain {chain_id}"),
    }
}
