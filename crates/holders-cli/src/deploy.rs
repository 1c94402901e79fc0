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

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use holders_deploy::{
    contracts::{load_source_bundle, RpcContractFactory},
    deploy,
    verify::{verify_deployment, EtherscanVerifier, Polling},
    ConfigResolver, DeploymentResult, EnvironmentView, InitDefinition, InitParamBuilder,
    NetworkConfig,
};

use crate::config::GlobalConfig;

/// Deploy the Holders contract behind an ERC-1967 proxy and print its address.
#[derive(Parser, Debug, Clone)]
#[clap(name = "deploy", author, version, about, long_about = None)]
pub struct DeployArgs {
    /// Network to deploy to: eth, bsc, pol, sep, tbsc or tpol
    #[clap(long)]
    pub network: String,

    /// JSON file with the tiers, beneficiaries, and time window to initialize with.
    ///
    /// The built-in Holders schedule is used when omitted.
    #[clap(long)]
    pub params: Option<PathBuf>,

    /// Print the initializer calldata instead of deploying
    #[clap(long)]
    pub calldata: bool,

    /// Submit the deployed proxy for verification on the block explorer
    #[clap(long)]
    pub verify: bool,

    #[clap(flatten)]
    pub config: GlobalConfig,
}

/// Run a deployment, returning the line to print on success.
///
/// Network variables are read from `env`; nothing is sent unless configuration and parameters
/// are both valid.
pub async fn run(args: &DeployArgs, env: &impl EnvironmentView) -> Result<String> {
    let config = ConfigResolver::default().resolve(&args.network, env)?;

    let definition = match &args.params {
        Some(path) => InitDefinition::from_json_file(path)?,
        None => InitDefinition::holders(),
    };
    let params = InitParamBuilder::build(&definition)?;

    if args.calldata {
        return Ok(params.initializer_calldata().to_string());
    }

    let factory = RpcContractFactory::new(args.config.factory_config()?);
    let result = deploy(&config, &params, factory, args.config.tx_timeout)
        .await
        .with_context(|| format!("Failed to deploy Holders to {}", args.network))?;

    if args.verify {
        verify(&args.config, &config, &result, env).await;
    }

    Ok(result.proxy_address.to_string())
}

async fn verify(
    global: &GlobalConfig,
    config: &NetworkConfig,
    result: &DeploymentResult,
    env: &impl EnvironmentView,
) {
    let network = config.network();
    let api_url = global.explorer_api_url.clone();
    let verifier = match EtherscanVerifier::from_env(network, env, api_url) {
        Ok(Some(verifier)) => verifier,
        Ok(None) => {
            tracing::warn!(
                "{} is not set; skipping explorer verification",
                network.explorer_key_var
            );
            return;
        }
        Err(e) => {
            tracing::warn!("Failed to create explorer client: {e}");
            return;
        }
    };

    let source = load_source_bundle(&global.artifacts, &global.contract)
        .inspect_err(|e| tracing::warn!("Cannot verify {} source: {e:#}", global.contract))
        .ok();

    let address = result.proxy_address;
    if let Err(e) = verify_deployment(&verifier, result, source.as_ref(), Polling::default()).await
    {
        tracing::warn!(%address, "Explorer verification failed: {e}");
    }
}
