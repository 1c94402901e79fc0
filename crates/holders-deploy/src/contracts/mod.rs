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

//! Smart contract interfaces and the factory used to deploy the Holders proxy.

use alloy::{
    primitives::{b256, Address, Bytes, TxHash, B256},
    sol_types::SolValue,
};
use async_trait::async_trait;

use crate::{config::NetworkConfig, errors::DeployError};

mod artifacts;
mod rpc;

pub use artifacts::{load_artifact, load_source_bundle, Artifact, SourceBundle};
pub use rpc::{
    FactoryConfig, FactoryConfigBuilder, FactoryConfigBuilderError, RpcContractFactory,
    RpcProxyHandle, DEFAULT_TX_TIMEOUT,
};

alloy::sol! {
    #![sol(all_derives)]

    /// Initializer of the Holders implementation contract.
    interface IHolders {
        struct Tier {
            string name;
            uint256 threshold;
            uint256 unitValue;
            uint256 cap;
        }

        struct Beneficiary {
            address account;
            uint256 weight;
        }

        function initialize(
            Tier[] calldata tiers,
            Beneficiary[] calldata beneficiaries,
            uint256 startTime,
            uint256 endTime
        ) external;
    }
}

/// Storage slot holding the implementation address of an ERC-1967 proxy.
///
/// See https://eips.ethereum.org/EIPS/eip-1967#logic-contract-address
pub const ERC1967_IMPLEMENTATION_SLOT: B256 =
    b256!("0x360894a13ba1a3210667c828492db98dca3e2076cc3735a920a3ca505d382bbc");

/// Creation code for an `ERC1967Proxy(implementation, data)`.
///
/// The proxy constructor delegate-calls `data` into the implementation, so the initializer runs
/// exactly once, in the same transaction that creates the proxy.
pub fn proxy_creation_code(proxy_bytecode: &Bytes, implementation: Address, data: Bytes) -> Bytes {
    let mut code = proxy_bytecode.to_vec();
    code.extend((implementation, data).abi_encode_params());
    code.into()
}

/// Source of proxy deployment handles.
///
/// Implementations are responsible for loading the contract code and signing with the
/// credential of the [NetworkConfig] they are connected with.
#[async_trait]
pub trait ContractFactory: Send + Sync {
    type Handle: ProxyHandle;

    /// Acquire a handle bound to the endpoint, chain ID, and credential of `config`.
    async fn connect(&self, config: &NetworkConfig) -> Result<Self::Handle, DeployError>;
}

/// A connection able to deploy one upgradeable proxy.
#[async_trait]
pub trait ProxyHandle: Send + Sync {
    /// Submit the proxy deployment with the given initializer calldata.
    async fn submit(&self, initializer: Bytes) -> Result<TxHash, DeployError>;

    /// Wait until the deployment transaction confirms, returning the proxy address.
    async fn confirm(&self, tx_hash: TxHash) -> Result<Address, DeployError>;

    /// Address of the implementation behind the proxy, once known.
    fn implementation(&self) -> Option<Address> {
        None
    }
}

#[cfg(test)]
mod tests {
    use alloy::primitives::{address, keccak256, U256};

    use super::*;

    #[test]
    fn creation_code_appends_constructor_args() {
        let bytecode = Bytes::from_static(&[0x60, 0x80, 0x60, 0x40]);
        let implementation = address!("0x5FbDB2315678afecb367f032d93F642f64180aa3");
        let data = Bytes::from_static(&[0xde, 0xad, 0xbe, 0xef]);

        let code = proxy_creation_code(&bytecode, implementation, data.clone());
        assert_eq!(&code[..4], bytecode.as_ref());

        let (decoded_impl, decoded_data) =
            <(Address, Bytes)>::abi_decode_params(&code[4..]).unwrap();
        assert_eq!(decoded_impl, implementation);
        assert_eq!(decoded_data, data);
    }

    #[test]
    fn implementation_slot_matches_eip1967() {
        // bytes32(uint256(keccak256("eip1967.proxy.implementation")) - 1)
        let hash = keccak256("eip1967.proxy.implementation");
        let slot = U256::from_be_bytes(hash.0) - U256::from(1);
        assert_eq!(B256::from(slot.to_be_bytes::<32>()), ERC1967_IMPLEMENTATION_SLOT);
    }
}
