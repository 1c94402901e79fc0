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

//! Construction and validation of the Holders initializer arguments.

use std::{collections::HashSet, path::Path, str::FromStr};

use alloy::{
    primitives::{Address, Bytes, U256},
    sol_types::SolCall,
};
use serde::{Deserialize, Serialize};

use crate::{contracts::IHolders, errors::ParamsError};

/// Latest accepted timestamp, 9999-12-31T23:59:59Z.
pub const MAX_PLAUSIBLE_TIMESTAMP: u64 = 253_402_300_799;

/// Unvalidated definition of one tier.
///
/// Amounts cover the full `uint256` range. In JSON they are either numbers up to `u64::MAX` or
/// decimal or `0x` prefixed hex strings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierDefinition {
    pub name: String,
    /// Must be strictly greater than the previous tier's threshold.
    pub threshold: U256,
    pub unit_value: U256,
    pub cap: U256,
}

/// Unvalidated definition of one beneficiary.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BeneficiaryDefinition {
    /// Hex encoded account address.
    pub address: String,
    /// Must be non-zero.
    pub weight: U256,
}

/// Static tier, beneficiary, and time window definition, as written by an operator.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitDefinition {
    pub tiers: Vec<TierDefinition>,
    pub beneficiaries: Vec<BeneficiaryDefinition>,
    /// Unix time in seconds.
    pub start_timestamp: u64,
    /// Unix time in seconds, not before `start_timestamp`.
    pub end_timestamp: u64,
}

impl InitDefinition {
    /// The Holders schedule deployed by default.
    pub fn holders() -> Self {
        let tier = |name: &str, threshold: u64, unit_value: u64, cap: u64| TierDefinition {
            name: name.to_string(),
            threshold: U256::from(threshold),
            unit_value: U256::from(unit_value),
            cap: U256::from(cap),
        };
        let beneficiary = |address: &str, weight: u64| BeneficiaryDefinition {
            address: address.to_string(),
            weight: U256::from(weight),
        };
        Self {
            tiers: vec![
                tier("Level 1", 1_000, 100, 1_000),
                tier("Level 2", 10_000, 1_000, 10_000),
                tier("Level 3", 100_000, 10_000, 100_000),
            ],
            beneficiaries: vec![
                beneficiary("0xddaAd340b0f1Ef65169Ae5E41A8b10776a75482d", 5),
                beneficiary("0x0fC5025C764cE34df352757e82f7B5c4Df39A836", 10),
            ],
            start_timestamp: 1_630_489_200,
            end_timestamp: 1_630_489_200,
        }
    }

    /// Load a definition from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ParamsError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ParamsError::Definition(format!("{}: {e}", path.display())))?;
        serde_json::from_str(&contents)
            .map_err(|e| ParamsError::Definition(format!("{}: {e}", path.display())))
    }
}

/// A validated tier.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Tier {
    pub name: String,
    pub threshold: U256,
    pub unit_value: U256,
    pub cap: U256,
}

/// A validated beneficiary.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Beneficiary {
    pub address: Address,
    pub weight: U256,
}

/// Validated initializer arguments for the Holders contract.
///
/// Only [InitParamBuilder::build] creates values of this type, so holding one means every
/// invariant has been checked.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InitParams {
    tiers: Vec<Tier>,
    beneficiaries: Vec<Beneficiary>,
    start_timestamp: u64,
    end_timestamp: u64,
}

impl InitParams {
    /// Tiers, ordered by strictly increasing threshold.
    pub fn tiers(&self) -> &[Tier] {
        &self.tiers
    }

    /// Beneficiaries, in definition order.
    pub fn beneficiaries(&self) -> &[Beneficiary] {
        &self.beneficiaries
    }

    pub fn start_timestamp(&self) -> u64 {
        self.start_timestamp
    }

    pub fn end_timestamp(&self) -> u64 {
        self.end_timestamp
    }

    /// The `initialize` call carrying these parameters.
    pub fn initialize_call(&self) -> IHolders::initializeCall {
        IHolders::initializeCall {
            tiers: self
                .tiers
                .iter()
                .map(|tier| IHolders::Tier {
                    name: tier.name.clone(),
                    threshold: tier.threshold,
                    unitValue: tier.unit_value,
                    cap: tier.cap,
                })
                .collect(),
            beneficiaries: self
                .beneficiaries
                .iter()
                .map(|b| IHolders::Beneficiary { account: b.address, weight: b.weight })
                .collect(),
            startTime: U256::from(self.start_timestamp),
            endTime: U256::from(self.end_timestamp),
        }
    }

    /// ABI encoded calldata of the `initialize` call.
    pub fn initializer_calldata(&self) -> Bytes {
        self.initialize_call().abi_encode().into()
    }
}

/// Builds [InitParams] from an [InitDefinition].
#[derive(Clone, Copy, Debug, Default)]
pub struct InitParamBuilder;

impl InitParamBuilder {
    /// Validate `definition` and convert it into [InitParams].
    ///
    /// Tiers are checked before beneficiaries, and beneficiaries before the time window. The first
    /// violation found is returned.
    pub fn build(definition: &InitDefinition) -> Result<InitParams, ParamsError> {
        let tiers = build_tiers(&definition.tiers)?;
        let beneficiaries = build_beneficiaries(&definition.beneficiaries)?;
        check_time_window(definition.start_timestamp, definition.end_timestamp)?;

        tracing::debug!(
            tiers = tiers.len(),
            beneficiaries = beneficiaries.len(),
            start = definition.start_timestamp,
            end = definition.end_timestamp,
            "Built initializer parameters"
        );
        Ok(InitParams {
            tiers,
            beneficiaries,
            start_timestamp: definition.start_timestamp,
            end_timestamp: definition.end_timestamp,
        })
    }
}

fn build_tiers(definitions: &[TierDefinition]) -> Result<Vec<Tier>, ParamsError> {
    if definitions.is_empty() {
        return Err(ParamsError::InvalidTierOrdering("at least one tier is required".into()));
    }
    for (prev, next) in definitions.iter().zip(definitions.iter().skip(1)) {
        if next.threshold <= prev.threshold {
            return Err(ParamsError::InvalidTierOrdering(format!(
                "tier {:?} threshold {} does not exceed tier {:?} threshold {}",
                next.name, next.threshold, prev.name, prev.threshold
            )));
        }
    }
    Ok(definitions
        .iter()
        .map(|tier| Tier {
            name: tier.name.clone(),
            threshold: tier.threshold,
            unit_value: tier.unit_value,
            cap: tier.cap,
        })
        .collect())
}

fn build_beneficiaries(
    definitions: &[BeneficiaryDefinition],
) -> Result<Vec<Beneficiary>, ParamsError> {
    if definitions.is_empty() {
        return Err(ParamsError::InvalidBeneficiarySet(
            "at least one beneficiary is required".into(),
        ));
    }
    let mut seen = HashSet::with_capacity(definitions.len());
    let mut beneficiaries = Vec::with_capacity(definitions.len());
    for definition in definitions {
        let address = Address::from_str(definition.address.trim()).map_err(|e| {
            ParamsError::InvalidBeneficiarySet(format!(
                "{:?} is not a valid address: {e}",
                definition.address
            ))
        })?;
        if address.is_zero() {
            return Err(ParamsError::InvalidBeneficiarySet(
                "the zero address cannot be a beneficiary".into(),
            ));
        }
        if definition.weight.is_zero() {
            return Err(ParamsError::InvalidBeneficiarySet(format!(
                "beneficiary {address} has zero weight"
            )));
        }
        if !seen.insert(address) {
            return Err(ParamsError::InvalidBeneficiarySet(format!(
                "beneficiary {address} is listed more than once"
            )));
        }
        beneficiaries.push(Beneficiary { address, weight: definition.weight });
    }
    Ok(beneficiaries)
}

fn check_time_window(start: u64, end: u64) -> Result<(), ParamsError> {
    for (label, timestamp) in [("start", start), ("end", end)] {
        if timestamp > MAX_PLAUSIBLE_TIMESTAMP {
            return Err(ParamsError::InvalidTimeWindow(format!(
                "{label} timestamp {timestamp} is not a plausible Unix timestamp"
            )));
        }
    }
    if start > end {
        return Err(ParamsError::InvalidTimeWindow(format!(
            "start timestamp {start} is after end timestamp {end}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    const ADDR_A: &str = "0xddaAd340b0f1Ef65169Ae5E41A8b10776a75482d";
    const ADDR_B: &str = "0x0fC5025C764cE34df352757e82f7B5c4Df39A836";

    fn tier(name: &str, threshold: u64) -> TierDefinition {
        TierDefinition {
            name: name.into(),
            threshold: U256::from(threshold),
            unit_value: U256::from(1),
            cap: U256::from(1),
        }
    }

    fn beneficiary(address: &str, weight: u64) -> BeneficiaryDefinition {
        BeneficiaryDefinition { address: address.into(), weight: U256::from(weight) }
    }

    #[test]
    fn holders_definition_is_valid() {
        let params = InitParamBuilder::build(&InitDefinition::holders()).unwrap();

        let names: Vec<_> = params.tiers().iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, ["Level 1", "Level 2", "Level 3"]);
        assert_eq!(params.tiers()[2].threshold, U256::from(100_000));
        assert_eq!(params.tiers()[2].unit_value, U256::from(10_000));
        assert_eq!(params.beneficiaries().len(), 2);
        assert_eq!(params.beneficiaries()[0].address, Address::from_str(ADDR_A).unwrap());
        assert_eq!(params.beneficiaries()[1].weight, U256::from(10));
        assert_eq!(params.start_timestamp(), 1_630_489_200);
        assert_eq!(params.end_timestamp(), 1_630_489_200);
    }

    #[test]
    fn calldata_round_trips_through_abi() {
        let params = InitParamBuilder::build(&InitDefinition::holders()).unwrap();
        let calldata = params.initializer_calldata();

        assert_eq!(&calldata[..4], IHolders::initializeCall::SELECTOR.as_slice());
        let decoded = IHolders::initializeCall::abi_decode(&calldata).unwrap();
        assert_eq!(decoded.tiers.len(), 3);
        assert_eq!(decoded.tiers[1].name, "Level 2");
        assert_eq!(decoded.tiers[1].unitValue, U256::from(1_000));
        assert_eq!(decoded.beneficiaries[1].account, Address::from_str(ADDR_B).unwrap());
        assert_eq!(decoded.startTime, U256::from(1_630_489_200u64));
    }

    #[test]
    fn rejects_empty_tiers() {
        let mut definition = InitDefinition::holders();
        definition.tiers.clear();
        assert!(matches!(
            InitParamBuilder::build(&definition),
            Err(ParamsError::InvalidTierOrdering(_))
        ));
    }

    #[test]
    fn rejects_unordered_or_duplicate_thresholds() {
        for thresholds in [[10, 5, 20], [10, 10, 20], [10, 20, 20], [30, 20, 10]] {
            let mut definition = InitDefinition::holders();
            definition.tiers =
                thresholds.iter().enumerate().map(|(i, t)| tier(&format!("T{i}"), *t)).collect();
            let err = InitParamBuilder::build(&definition).unwrap_err();
            assert!(
                matches!(err, ParamsError::InvalidTierOrdering(_)),
                "thresholds {thresholds:?} gave {err:?}"
            );
        }
    }

    #[test]
    fn single_tier_is_valid() {
        let mut definition = InitDefinition::holders();
        definition.tiers = vec![tier("only", 0)];
        assert_eq!(InitParamBuilder::build(&definition).unwrap().tiers().len(), 1);
    }

    #[test]
    fn rejects_bad_beneficiary_sets() {
        let cases = [
            vec![],
            vec![beneficiary(ADDR_A, 5), beneficiary(ADDR_A, 10)],
            // Same account with different casing.
            vec![beneficiary(ADDR_A, 5), beneficiary(&ADDR_A.to_lowercase(), 10)],
            vec![beneficiary(ADDR_A, 0)],
            vec![beneficiary("0x1234", 1)],
            vec![beneficiary("not an address", 1)],
            vec![beneficiary(&Address::ZERO.to_string(), 1)],
        ];
        for beneficiaries in cases {
            let mut definition = InitDefinition::holders();
            definition.beneficiaries = beneficiaries.clone();
            let err = InitParamBuilder::build(&definition).unwrap_err();
            assert!(
                matches!(err, ParamsError::InvalidBeneficiarySet(_)),
                "beneficiaries {beneficiaries:?} gave {err:?}"
            );
        }
    }

    #[test]
    fn time_window() {
        let pairs = [(1, 0), (1_630_489_201, 1_630_489_200), (u64::MAX, u64::MAX), (0, u64::MAX)];
        for (start, end) in pairs {
            let mut definition = InitDefinition::holders();
            definition.start_timestamp = start;
            definition.end_timestamp = end;
            assert!(
                matches!(
                    InitParamBuilder::build(&definition),
                    Err(ParamsError::InvalidTimeWindow(_))
                ),
                "({start}, {end})"
            );
        }

        let mut definition = InitDefinition::holders();
        definition.start_timestamp = 0;
        definition.end_timestamp = MAX_PLAUSIBLE_TIMESTAMP;
        assert!(InitParamBuilder::build(&definition).is_ok());
    }

    #[test]
    fn tier_errors_take_precedence() {
        let definition = InitDefinition {
            tiers: vec![tier("a", 2), tier("b", 1)],
            beneficiaries: vec![],
            start_timestamp: 2,
            end_timestamp: 1,
        };
        assert!(matches!(
            InitParamBuilder::build(&definition),
            Err(ParamsError::InvalidTierOrdering(_))
        ));

        let definition = InitDefinition { tiers: vec![tier("a", 1)], ..definition };
        assert!(matches!(
            InitParamBuilder::build(&definition),
            Err(ParamsError::InvalidBeneficiarySet(_))
        ));
    }

    #[test]
    fn load_definition_from_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
                "tiers": [
                    {{ "name": "Bronze", "threshold": 10, "unit_value": 1, "cap": 100 }},
                    {{ "name": "Silver", "threshold": 20, "unit_value": 2, "cap": 200 }}
                ],
                "beneficiaries": [{{ "address": "{ADDR_B}", "weight": 3 }}],
                "start_timestamp": 1700000000,
                "end_timestamp": 1800000000
            }}"#
        )
        .unwrap();

        let definition = InitDefinition::from_json_file(file.path()).unwrap();
        assert_eq!(definition.tiers[1].name, "Silver");
        assert_eq!(definition.beneficiaries[0].weight, U256::from(3));
        assert!(InitParamBuilder::build(&definition).is_ok());
    }

    #[test]
    fn definition_accepts_full_uint256_amounts() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
                "tiers": [
                    {{ "name": "Whale", "threshold": "1000000000000000000000000", "unit_value": "0xffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffff", "cap": 5 }}
                ],
                "beneficiaries": [{{ "address": "{ADDR_A}", "weight": "340282366920938463463374607431768211456" }}],
                "start_timestamp": 1700000000,
                "end_timestamp": 1800000000
            }}"#
        )
        .unwrap();

        let definition = InitDefinition::from_json_file(file.path()).unwrap();
        let params = InitParamBuilder::build(&definition).unwrap();
        assert_eq!(params.tiers()[0].threshold, U256::from(10u64).pow(U256::from(24)));
        assert_eq!(params.tiers()[0].unit_value, U256::MAX);
        assert_eq!(params.tiers()[0].cap, U256::from(5));
        // One past u128::MAX.
        assert_eq!(params.beneficiaries()[0].weight, U256::from(u128::MAX) + U256::from(1));

        let decoded =
            IHolders::initializeCall::abi_decode(&params.initializer_calldata()).unwrap();
        assert_eq!(decoded.tiers[0].unitValue, U256::MAX);
    }

    #[test]
    fn load_definition_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.json");
        let err = InitDefinition::from_json_file(&path).unwrap_err();
        assert!(matches!(err, ParamsError::Definition(ref msg) if msg.contains("missing.json")));
    }
}
