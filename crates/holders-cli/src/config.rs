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

//! Deployment options shared by every network.

use std::{path::PathBuf, time::Duration};

use anyhow::{ensure, Context, Result};
use clap::Args;
use holders_deploy::{contracts::FactoryConfig, verify::ETHERSCAN_V2_API_URL};
use tracing::level_filters::LevelFilter;
use url::Url;

fn parse_seconds(arg: &str) -> Result<Duration> {
    let secs: u64 = arg.parse().context("expected a whole number of seconds")?;
    ensure!(secs > 0, "timeout must be at least one second");
    Ok(Duration::from_secs(secs))
}

/// Options that do not depend on the selected network.
#[derive(Args, Debug, Clone)]
pub struct GlobalConfig {
    /// Directory holding compiled contract artifacts (Hardhat `artifacts/` or Foundry `out/`)
    #[clap(long, env = "ARTIFACTS_DIR", default_value = "artifacts")]
    pub artifacts: PathBuf,

    /// Name of the implementation contract
    #[clap(long, default_value = "Holders")]
    pub contract: String,

    /// Name of the ERC-1967 proxy contract
    #[clap(long, default_value = "ERC1967Proxy")]
    pub proxy_contract: String,

    /// Ethereum transaction timeout in seconds.
    #[clap(long, env = "TX_TIMEOUT", default_value = "300", value_parser = parse_seconds)]
    pub tx_timeout: Duration,

    /// Number of block confirmations to wait for
    #[clap(long, default_value_t = 1, value_parser = clap::value_parser!(u64).range(1..))]
    pub confirmations: u64,

    /// Block explorer API used by --verify
    #[clap(long, env = "EXPLORER_API_URL", default_value = ETHERSCAN_V2_API_URL)]
    pub explorer_api_url: Url,

    /// Log level (error, warn, info, debug, trace)
    #[clap(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: LevelFilter,
}

impl GlobalConfig {
    /// Options for the JSON-RPC contract factory.
    pub fn factory_config(&self) -> Result<FactoryConfig> {
        FactoryConfig::builder()
            .artifacts_dir(self.artifacts.clone())
            .contract(self.contract.clone())
            .proxy_contract(self.proxy_contract.clone())
            .tx_timeout(self.tx_timeout)
            .confirmations(self.confirmations)
            .build()
            .context("Failed to build contract factory options")
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[derive(Parser)]
    struct Cli {
        #[clap(flatten)]
        config: GlobalConfig,
    }

    #[test]
    fn defaults() {
        let cli = Cli::try_parse_from(["deploy"]).unwrap();
        let factory = cli.config.factory_config().unwrap();
        assert_eq!(factory.contract, "Holders");
        assert_eq!(factory.proxy_contract, "ERC1967Proxy");
        assert_eq!(factory.confirmations, 1);
        assert_eq!(cli.config.explorer_api_url.as_str(), ETHERSCAN_V2_API_URL);
    }

    #[test]
    fn tx_timeout_in_seconds() {
        let cli = Cli::try_parse_from(["deploy", "--tx-timeout", "45"]).unwrap();
        assert_eq!(cli.config.tx_timeout, Duration::from_secs(45));

        assert!(Cli::try_parse_from(["deploy", "--tx-timeout", "0"]).is_err());
        assert!(Cli::try_parse_from(["deploy", "--tx-timeout", "soon"]).is_err());
    }

    #[test]
    fn confirmations_must_be_positive() {
        assert!(Cli::try_parse_from(["deploy", "--confirmations", "0"]).is_err());
    }
}
