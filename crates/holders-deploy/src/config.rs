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

//! Resolution of a network identifier into a complete, typed [NetworkConfig].

use std::{collections::HashMap, fmt, hash::BuildHasher, str::FromStr};

use alloy::{primitives::Address, signers::local::PrivateKeySigner};
use url::Url;

use crate::{
    errors::{ConfigError, ConfigViolation},
    networks::{NetworkEntry, NetworkRegistry},
};

/// Read-only view of configuration variables.
///
/// The process environment is the production source; tests substitute a map.
pub trait EnvironmentView {
    /// Value of the variable `key`, if set.
    fn var(&self, key: &str) -> Option<String>;
}

/// [EnvironmentView] over the variables of the current process.
#[derive(Clone, Copy, Debug, Default)]
pub struct ProcessEnv;

impl EnvironmentView for ProcessEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

impl<S: BuildHasher> EnvironmentView for HashMap<String, String, S> {
    fn var(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

impl<T: EnvironmentView + ?Sized> EnvironmentView for &T {
    fn var(&self, key: &str) -> Option<String> {
        (**self).var(key)
    }
}

/// Signing key of the deployer.
///
/// Formatting a credential only ever shows the address it signs for.
#[derive(Clone)]
pub struct Credential(PrivateKeySigner);

impl Credential {
    /// Address of the account this credential signs for.
    pub fn address(&self) -> Address {
        self.0.address()
    }

    /// Local signer for deployment transactions.
    pub fn signer(&self) -> &PrivateKeySigner {
        &self.0
    }
}

impl From<PrivateKeySigner> for Credential {
    fn from(signer: PrivateKeySigner) -> Self {
        Self(signer)
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Credential").field(&self.address()).finish()
    }
}

/// Fully resolved connection settings for one network.
#[derive(Clone, Debug)]
pub struct NetworkConfig {
    network: &'static NetworkEntry,
    endpoint: Url,
    chain_id: u64,
    credential: Credential,
}

impl NetworkConfig {
    /// Registry entry this configuration was resolved from.
    pub fn network(&self) -> &'static NetworkEntry {
        self.network
    }

    /// JSON-RPC endpoint.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// EIP-155 chain ID the deployment must land on.
    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    /// Key that signs and pays for the deployment.
    pub fn credential(&self) -> &Credential {
        &self.credential
    }
}

/// Resolves network identifiers against a [NetworkRegistry] and an [EnvironmentView].
#[derive(Clone, Copy, Debug, Default)]
pub struct ConfigResolver {
    registry: NetworkRegistry,
}

impl ConfigResolver {
    /// Resolver over the networks of `registry`.
    pub fn new(registry: NetworkRegistry) -> Self {
        Self { registry }
    }

    /// Networks this resolver knows.
    pub fn registry(&self) -> &NetworkRegistry {
        &self.registry
    }

    /// Resolve the [NetworkConfig] for the network `id`.
    ///
    /// Every variable of the network is checked before returning, so the error names all missing
    /// or malformed variables at once. Nothing falls back to a default value.
    pub fn resolve(
        &self,
        id: &str,
        env: &impl EnvironmentView,
    ) -> Result<NetworkConfig, ConfigError> {
        let network = self.registry.lookup(id)?;
        tracing::debug!(network = network.id, "Resolving network configuration");

        let endpoint = parse_endpoint(network.rpc_var, read(env, network.rpc_var));
        let chain_id = parse_chain_id(network.chain_id_var, read(env, network.chain_id_var));
        let credential =
            parse_credential(network.credential_var, read(env, network.credential_var));

        match (endpoint, chain_id, credential) {
            (Ok(endpoint), Ok(chain_id), Ok(credential)) => {
                tracing::info!(
                    network = network.id,
                    chain_id,
                    host = endpoint.host_str().unwrap_or_default(),
                    deployer = %credential.address(),
                    "Resolved network configuration"
                );
                Ok(NetworkConfig { network, endpoint, chain_id, credential })
            }
            (endpoint, chain_id, credential) => {
                let violations: Vec<_> = [endpoint.err(), chain_id.err(), credential.err()]
                    .into_iter()
                    .flatten()
                    .collect();
                Err(ConfigError::Invalid { network: network.id.to_string(), violations })
            }
        }
    }
}

/// Read a variable, treating empty and whitespace-only values as unset.
fn read(env: &impl EnvironmentView, var: &str) -> Option<String> {
    env.var(var).map(|value| value.trim().to_string()).filter(|value| !value.is_empty())
}

fn parse_endpoint(var: &'static str, value: Option<String>) -> Result<Url, ConfigViolation> {
    let value = value.ok_or(ConfigViolation::MissingEndpoint { var })?;
    let url = Url::parse(&value)
        .map_err(|e| ConfigViolation::InvalidEndpoint { var, reason: e.to_string() })?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => Err(ConfigViolation::InvalidEndpoint {
            var,
            reason: format!("unsupported scheme {scheme:?}, expected http or https"),
        }),
    }
}

fn parse_chain_id(var: &'static str, value: Option<String>) -> Result<u64, ConfigViolation> {
    match value.as_deref().map(u64::from_str) {
        Some(Ok(chain_id)) if chain_id > 0 => Ok(chain_id),
        _ => Err(ConfigViolation::InvalidChainId { var, value }),
    }
}

fn parse_credential(
    var: &'static str,
    value: Option<String>,
) -> Result<Credential, ConfigViolation> {
    let value = value.ok_or(ConfigViolation::MissingCredential { var })?;
    // NOTE: The parse error is dropped since it may echo part of the key.
    PrivateKeySigner::from_str(&value)
        .map(Credential)
        .map_err(|_| ConfigViolation::InvalidCredential { var })
}
