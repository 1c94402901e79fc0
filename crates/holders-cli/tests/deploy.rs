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

//! Integration tests for the `deploy` binary. Deployments run against a local Anvil node.

use alloy::{primitives::Address, providers::Provider, sol_types::SolCall};
use assert_cmd::Command;
use holders_deploy::{contracts::IHolders, InitDefinition, InitParamBuilder};
use holders_test_utils::{test_ctx, tpol_anvil, ExplorerMockServer, Implementation, TestCtx};
use predicates::{
    prelude::PredicateBooleanExt,
    str::{contains, is_empty},
};
use tempfile::TempDir;

const TEST_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

/// A `deploy` command with an empty environment, run from an empty directory so no `.env` file
/// is picked up.
fn deploy_cmd(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("deploy").unwrap();
    cmd.env_clear().current_dir(dir.path()).env("NO_COLOR", "1");
    cmd
}

fn with_tpol_env(cmd: &mut Command) -> &mut Command {
    cmd.env("TEST_POL_RPC", "http://127.0.0.1:1")
        .env("TEST_POL_CID", "97")
        .env("TEST_POL_PKEY", TEST_KEY)
}

#[test]
fn help() {
    let dir = TempDir::new().unwrap();
    deploy_cmd(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(contains("Usage:"))
        .stdout(contains("--network"));
}

#[test]
fn missing_network_exits_1() {
    let dir = TempDir::new().unwrap();
    deploy_cmd(&dir)
        .assert()
        .code(1)
        .stdout(is_empty())
        .stderr(contains("--network"));
}

#[test]
fn zero_tx_timeout_exits_1() {
    let dir = TempDir::new().unwrap();
    with_tpol_env(&mut deploy_cmd(&dir))
        .args(["--network", "tpol", "--tx-timeout", "0"])
        .assert()
        .code(1)
        .stderr(contains("timeout must be at least one second"));
}

#[test]
fn unknown_network_fails() {
    let dir = TempDir::new().unwrap();
    deploy_cmd(&dir)
        .args(["--network", "mainnet"])
        .assert()
        .code(1)
        .stdout(is_empty())
        .stderr(contains("error: unknown network \"mainnet\""))
        .stderr(contains("tpol"));
}

#[test]
fn missing_credential_fails_before_deploying() {
    let dir = TempDir::new().unwrap();
    deploy_cmd(&dir)
        .args(["--network", "tpol"])
        .env("TEST_POL_RPC", "http://127.0.0.1:1")
        .env("TEST_POL_CID", "97")
        .assert()
        .code(1)
        .stdout(is_empty())
        .stderr(contains("TEST_POL_PKEY is not set"));
}

#[test]
fn all_missing_variables_are_reported() {
    let dir = TempDir::new().unwrap();
    deploy_cmd(&dir)
        .args(["--network", "bsc"])
        .assert()
        .code(1)
        .stderr(contains("BSC_RPC is not set"))
        .stderr(contains("BSC_CID must be a positive integer chain ID"))
        .stderr(contains("BSC_PKEY is not set"));
}

#[test]
fn invalid_credential_is_not_echoed() {
    let dir = TempDir::new().unwrap();
    deploy_cmd(&dir)
        .args(["--network", "tpol"])
        .env("TEST_POL_RPC", "http://127.0.0.1:1")
        .env("TEST_POL_CID", "97")
        .env("TEST_POL_PKEY", "not-a-real-key-1234")
        .assert()
        .code(1)
        .stderr(contains("TEST_POL_PKEY is not a valid private key"))
        .stderr(contains("not-a-real-key-1234").not());
}

#[test]
fn prints_initializer_calldata() {
    let dir = TempDir::new().unwrap();
    let expected =
        InitParamBuilder::build(&InitDefinition::holders()).unwrap().initializer_calldata();

    with_tpol_env(&mut deploy_cmd(&dir))
        .args(["--network", "tpol", "--calldata"])
        .assert()
        .success()
        .stdout(format!("{expected}\n"));
}

#[test]
fn dotenv_file_is_loaded() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join(".env"),
        format!("TEST_POL_RPC=http://127.0.0.1:1\nTEST_POL_CID=97\nTEST_POL_PKEY={TEST_KEY}\n"),
    )
    .unwrap();

    deploy_cmd(&dir)
        .args(["--network", "tpol", "--calldata"])
        .assert()
        .success()
        .stdout(contains("0x"));
}

#[test]
fn invalid_params_file_fails() {
    let dir = TempDir::new().unwrap();
    let mut definition = serde_json::to_value(InitDefinition::holders()).unwrap();
    definition["start_timestamp"] = 2_000_000_000u64.into();
    definition["end_timestamp"] = 1_000_000_000u64.into();
    let path = dir.path().join("params.json");
    std::fs::write(&path, definition.to_string()).unwrap();

    with_tpol_env(&mut deploy_cmd(&dir))
        .args(["--network", "tpol", "--calldata", "--params"])
        .arg(&path)
        .assert()
        .code(1)
        .stdout(is_empty())
        .stderr(contains("invalid time window"));
}

#[test]
fn unreadable_params_file_fails() {
    let dir = TempDir::new().unwrap();
    with_tpol_env(&mut deploy_cmd(&dir))
        .args(["--network", "tpol", "--params", "missing.json"])
        .assert()
        .code(1)
        .stderr(contains("failed to load parameter definition"));
}

#[test]
fn missing_artifacts_fail_before_sending() {
    let dir = TempDir::new().unwrap();
    with_tpol_env(&mut deploy_cmd(&dir))
        .args(["--network", "tpol", "--artifacts", "no-such-dir"])
        .assert()
        .code(1)
        .stdout(is_empty())
        .stderr(contains("artifacts directory no-such-dir does not exist"));
}

fn anvil_ctx() -> TestCtx {
    test_ctx(tpol_anvil(), Implementation::Initializable(IHolders::initializeCall::SELECTOR))
        .unwrap()
}

/// A `deploy --network tpol` command pointed at the node and artifacts of `ctx`.
fn anvil_deploy_cmd(dir: &TempDir, ctx: &TestCtx) -> Command {
    let mut cmd = deploy_cmd(dir);
    cmd.envs(ctx.tpol_env()).args(["--network", "tpol", "--artifacts"]).arg(ctx.artifacts.path());
    cmd
}

#[tokio::test(flavor = "multi_thread")]
async fn deploys_and_prints_proxy_address() {
    let dir = TempDir::new().unwrap();
    let ctx = anvil_ctx();

    let output = anvil_deploy_cmd(&dir, &ctx).assert().success().get_output().stdout.clone();
    let stdout = String::from_utf8(output).unwrap();
    let proxy: Address = stdout.trim().parse().unwrap();

    assert!(!ctx.provider.get_code_at(proxy).await.unwrap().is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn verify_submits_source_and_proxy() {
    let dir = TempDir::new().unwrap();
    let ctx = anvil_ctx();
    let explorer = ExplorerMockServer::new().await;

    anvil_deploy_cmd(&dir, &ctx)
        .arg("--verify")
        .args(["--explorer-api-url", &explorer.api_url()])
        .env("POL_APIKEY", "test-api-key")
        .assert()
        .success()
        .stdout(contains("0x"));

    let actions: Vec<_> =
        explorer.requests().await.into_iter().map(|mut r| r.remove("action").unwrap()).collect();
    assert_eq!(actions, ["verifysourcecode", "checkverifystatus", "verifyproxycontract"]);
}

#[tokio::test(flavor = "multi_thread")]
async fn verify_without_explorer_key_still_succeeds() {
    let dir = TempDir::new().unwrap();
    let ctx = anvil_ctx();
    let explorer = ExplorerMockServer::new().await;

    anvil_deploy_cmd(&dir, &ctx)
        .arg("--verify")
        .args(["--explorer-api-url", &explorer.api_url()])
        .assert()
        .success()
        .stderr(contains("POL_APIKEY is not set"));

    assert!(explorer.requests().await.is_empty());
}
