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

//! Network resolution and upgradeable proxy deployment for the Holders contract.
//!
//! The crate is split along the stages of a deployment run:
//!
//! * [networks] maps a network identifier to the environment variables describing it.
//! * [config] reads those variables from an [config::EnvironmentView] into a [NetworkConfig].
//! * [params] validates the tier and beneficiary schedule into [InitParams].
//! * [deployer] drives a [contracts::ContractFactory] through a single proxy deployment.
//! * [verify] optionally verifies the implementation source and links the proxy on a block
//!   explorer.

pub mod config;
pub mod contracts;
pub mod deployer;
pub mod errors;
pub mod networks;
pub mod params;
pub mod verify;

pub use config::{ConfigResolver, Credential, EnvironmentView, NetworkConfig, ProcessEnv};
pub use deployer::{deploy, Deployer, DeploymentResult, DeploymentState};
pub use errors::{ConfigError, ConfigViolation, DeployError, ParamsError, VerifyError};
pub use networks::{NetworkEntry, NetworkRegistry};
pub use params::{InitDefinition, InitParamBuilder, InitParams};
