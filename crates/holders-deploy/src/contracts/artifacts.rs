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

use std::{
    fs,
    path::{Path, PathBuf},
};

use alloy::primitives::Bytes;
use anyhow::{bail, ensure, Context};
use serde::Deserialize;

/// Compiled creation code of a contract.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Artifact {
    /// Contract name the artifact was looked up by.
    pub name: String,
    /// Artifact file the bytecode was read from.
    pub path: PathBuf,
    pub bytecode: Bytes,
}

// Hardhat stores `bytecode` as a hex string, Foundry as `{ "object": "0x..." }`.
#[derive(Deserialize)]
#[serde(untagged)]
enum BytecodeField {
    Hex(String),
    Object { object: String },
}

#[derive(Deserialize)]
struct ArtifactJson {
    bytecode: BytecodeField,
}

/// Compiler input and identity of a contract, as block explorers need them to verify its source.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SourceBundle {
    /// Fully qualified name, `<source path>:<contract>`.
    pub contract_name: String,
    /// Compiler version in explorer notation, e.g. `v0.8.9+commit.e5eed63a`.
    pub compiler_version: String,
    /// Solidity standard JSON input the contract was compiled from.
    pub standard_json_input: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct HardhatArtifact {
    source_name: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DebugFile {
    build_info: PathBuf,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct BuildInfo {
    solc_long_version: String,
    input: serde_json::Value,
}

/// Find and load the artifact for contract `name` under `root`.
///
/// Artifacts are looked up as `<name>.sol/<name>.json` anywhere below `root`, which matches the
/// layout of both Hardhat's `artifacts/` and Foundry's `out/` directories.
pub fn load_artifact(root: &Path, name: &str) -> anyhow::Result<Artifact> {
    let path = find_artifact(root, name)?;
    let contents =
        fs::read_to_string(&path).with_context(|| format!("failed to read {}", path.display()))?;
    let bytecode = parse_bytecode(&contents)
        .with_context(|| format!("invalid artifact {}", path.display()))?;
    tracing::debug!(
        "Loaded {name} creation code ({} bytes) from {}",
        bytecode.len(),
        path.display()
    );

    Ok(Artifact { name: name.to_string(), path, bytecode })
}

/// Load the compiler input of contract `name` from a Hardhat artifacts directory.
///
/// Follows `<name>.dbg.json` next to the artifact to the `build-info` file it was compiled in.
pub fn load_source_bundle(root: &Path, name: &str) -> anyhow::Result<SourceBundle> {
    let path = find_artifact(root, name)?;
    let artifact: HardhatArtifact = read_json(&path).context("expected a Hardhat artifact")?;

    let dir = path.parent().unwrap_or(root);
    let debug: DebugFile = read_json(&dir.join(format!("{name}.dbg.json")))
        .context("no Hardhat debug file next to the artifact")?;
    let build_info_path = dir.join(&debug.build_info);
    let build_info: BuildInfo = read_json(&build_info_path)?;

    let sources = build_info.input.get("sources").and_then(|s| s.as_object());
    ensure!(
        sources.is_some_and(|sources| sources.contains_key(&artifact.source_name)),
        "build info {} does not contain {}",
        build_info_path.display(),
        artifact.source_name
    );

    Ok(SourceBundle {
        contract_name: format!("{}:{name}", artifact.source_name),
        compiler_version: format!("v{}", build_info.solc_long_version),
        standard_json_input: build_info.input.to_string(),
    })
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&contents).with_context(|| format!("failed to parse {}", path.display()))
}

fn find_artifact(root: &Path, name: &str) -> anyhow::Result<PathBuf> {
    ensure!(root.is_dir(), "artifacts directory {} does not exist", root.display());

    let mut found = Vec::new();
    find_artifacts(root, name, &mut found)
        .with_context(|| format!("failed to search {} for artifacts", root.display()))?;
    found.sort();

    match found.as_slice() {
        [] => bail!("no artifact for contract {name} found under {}", root.display()),
        [path] => Ok(path.clone()),
        paths => bail!(
            "multiple artifacts for contract {name} found: {}",
            paths.iter().map(|p| p.display().to_string()).collect::<Vec<_>>().join(", ")
        ),
    }
}

fn find_artifacts(dir: &Path, name: &str, found: &mut Vec<PathBuf>) -> std::io::Result<()> {
    let source_dir = format!("{name}.sol");
    let file_name = format!("{name}.json");
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_dir() {
            continue;
        }
        if path.file_name().is_some_and(|n| n == source_dir.as_str()) {
            let candidate = path.join(&file_name);
            if candidate.is_file() {
                found.push(candidate);
            }
        }
        // Hardhat's build-info holds full compiler inputs, never per-contract artifacts.
        if path.file_name().is_some_and(|n| n == "build-info") {
            continue;
        }
        find_artifacts(&path, name, found)?;
    }
    Ok(())
}

fn parse_bytecode(contents: &str) -> anyhow::Result<Bytes> {
    let artifact: ArtifactJson =
        serde_json::from_str(contents).context("expected a JSON object with a bytecode field")?;
    let hex = match artifact.bytecode {
        BytecodeField::Hex(hex) => hex,
        BytecodeField::Object { object } => object,
    };
    ensure!(!hex.contains("__"), "bytecode has unlinked library references");

    let bytecode: Bytes = hex.parse().context("bytecode is not valid hex")?;
    ensure!(!bytecode.is_empty(), "bytecode is empty; is the contract abstract or an interface?");
    Ok(bytecode)
}
