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

//! Hand-assembled stand-ins for the Holders implementation and the ERC-1967 proxy, written to
//! disk in the Hardhat artifacts layout.

use std::{fs, path::Path};

use alloy::primitives::hex;
use serde_json::json;

/// Source path of the implementation in the written artifacts.
pub const HOLDERS_SOURCE: &str = "contracts/Holders.sol";
/// Source path of the proxy in the written artifacts.
pub const PROXY_SOURCE: &str = "@openzeppelin/contracts/proxy/ERC1967/ERC1967Proxy.sol";
/// Compiler version recorded in the written build info.
pub const SOLC_LONG_VERSION: &str = "0.8.9+commit.e5eed63a";

const BUILD_INFO_ID: &str = "5c0e7f3b2a1d4e6f8091a2b3c4d5e6f7";

/// Proxy constructor. Expects `abi.encode(implementation, data)` appended to the code.
///
/// Stores `implementation` in the ERC-1967 slot, delegate-calls `data` into it, bubbles up a
/// revert, and returns the runtime below.
const PROXY_CONSTRUCTOR: [u8; 90] = hex!(
    // args = code[0x9d..] -> memory[0..]
    "609d3803609d600039"
    // sstore(ERC1967_SLOT, mload(0))
    "600051807f360894a13ba1a3210667c828492db98dca3e2076cc3735a920a3ca505d382bbc55"
    // delegatecall(gas, implementation, data + 0x20, mload(data), 0, 0)
    "60006000602051805190602001845af4"
    // revert with the return data on failure
    "604c573d600060003e3d6000fd"
    // return code[0x5a..0x9d]
    "5b506043605a60003960436000f3"
);

/// Proxy runtime. Forwards every call to the implementation in the ERC-1967 slot.
const PROXY_RUNTIME: [u8; 67] = hex!(
    "366000600037"
    "600060003660007f360894a13ba1a3210667c828492db98dca3e2076cc3735a920a3ca505d382bbc545af4"
    "3d600060003e603e573d6000fd5b3d6000f3"
);

/// Behavior of the stand-in implementation contract.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Implementation {
    /// Stores 1 in slot 0 when called with this selector and reverts on any other call.
    Initializable([u8; 4]),
    /// Reverts on every call.
    Reverting,
}

impl Implementation {
    /// Code left on chain once the implementation is deployed.
    pub fn runtime_code(&self) -> Vec<u8> {
        match self {
            Self::Initializable(selector) => {
                let mut code = hex!("60003560e01c63").to_vec();
                code.extend_from_slice(selector);
                code.extend_from_slice(&hex!("14601357600080fd5b600160005500"));
                code
            }
            Self::Reverting => hex!("600080fd").to_vec(),
        }
    }

    /// Code deploying [Implementation::runtime_code].
    pub fn creation_code(&self) -> Vec<u8> {
        creation_code(&self.runtime_code())
    }
}

/// Wrap `runtime` in a constructor that returns it unchanged.
pub fn creation_code(runtime: &[u8]) -> Vec<u8> {
    let len = u8::try_from(runtime.len()).expect("runtime longer than 255 bytes");
    // codecopy(0, 12, len); return(0, len)
    let mut code = vec![0x60, len, 0x60, 0x0c, 0x60, 0x00, 0x39, 0x60, len, 0x60, 0x00, 0xf3];
    code.extend_from_slice(runtime);
    code
}

/// Creation code of the minimal ERC-1967 proxy, without constructor arguments.
pub fn proxy_creation_code() -> Vec<u8> {
    [PROXY_CONSTRUCTOR.as_slice(), PROXY_RUNTIME.as_slice()].concat()
}

/// Code left on chain once the proxy is deployed.
pub fn proxy_runtime_code() -> Vec<u8> {
    PROXY_RUNTIME.to_vec()
}

/// Write `Holders` and `ERC1967Proxy` artifacts, their debug files, and the shared build info
/// below `root`, as `npx hardhat compile` lays them out.
pub fn write_hardhat_artifacts(root: &Path, implementation: Implementation) -> anyhow::Result<()> {
    write_contract(
        root,
        HOLDERS_SOURCE,
        "Holders",
        &implementation.creation_code(),
        &implementation.runtime_code(),
    )?;
    write_contract(
        root,
        PROXY_SOURCE,
        "ERC1967Proxy",
        &proxy_creation_code(),
        &proxy_runtime_code(),
    )?;

    let build_info = json!({
        "_format": "hh-sol-build-info-1",
        "id": BUILD_INFO_ID,
        "solcVersion": "0.8.9",
        "solcLongVersion": SOLC_LONG_VERSION,
        "input": {
            "language": "Solidity",
            "sources": {
                HOLDERS_SOURCE: { "content": "// SPDX-License-Identifier: MIT\ncontract Holders {}\n" },
                PROXY_SOURCE: { "content": "// SPDX-License-Identifier: MIT\ncontract ERC1967Proxy {}\n" },
            },
            "settings": {
                "optimizer": { "enabled": true, "runs": 200 },
                "outputSelection": { "*": { "*": ["abi", "evm.bytecode", "evm.deployedBytecode"] } },
            },
        },
        "output": { "contracts": {}, "sources": {} },
    });
    write_json(&root.join("build-info").join(format!("{BUILD_INFO_ID}.json")), &build_info)
}

fn write_contract(
    root: &Path,
    source: &str,
    name: &str,
    bytecode: &[u8],
    deployed_bytecode: &[u8],
) -> anyhow::Result<()> {
    let dir = root.join(source);
    let artifact = json!({
        "_format": "hh-sol-artifact-1",
        "contractName": name,
        "sourceName": source,
        "abi": [],
        "bytecode": hex::encode_prefixed(bytecode),
        "deployedBytecode": hex::encode_prefixed(deployed_bytecode),
        "linkReferences": {},
        "deployedLinkReferences": {},
    });
    write_json(&dir.join(format!("{name}.json")), &artifact)?;

    let up = "../".repeat(source.split('/').count());
    let debug = json!({
        "_format": "hh-sol-dbg-1",
        "buildInfo": format!("{up}build-info/{BUILD_INFO_ID}.json"),
    });
    write_json(&dir.join(format!("{name}.dbg.json")), &debug)
}

fn write_json(path: &Path, value: &serde_json::Value) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, serde_json::to_string_pretty(value)?)?;
    Ok(())
}
