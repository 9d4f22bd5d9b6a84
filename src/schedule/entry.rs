//! Published fee schedule
//!
//! Prices are integers in units of 1/1000th of a tinycent
//! (`FEE_DIVISOR_FACTOR`), one per provider and resource, plus min/max
//! bounds on each provider's nominal fee.

use crate::resource::{ResourceProvider, UsableResource, UsageAccumulator, NUM_RESOURCES};
use crate::schedule::decimal::power_of_ten;
use crate::schedule::error::CalibrationError;
use crate::txn::{Operation, SubType};
use num_bigint::BigInt;
use num_rational::BigRational;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fs;
use std::io::{BufReader, BufWriter};
use std::path::Path;

// =============================================================================
// Constants
// =============================================================================

/// Schedule prices are in 1/FEE_DIVISOR_FACTOR tinycents
pub const FEE_DIVISOR_FACTOR: u64 = 1_000;

/// Tinycents per US dollar (100 cents of 10^8 tinycents each)
pub const USD_TO_TINYCENTS: u64 = 100 * 100_000_000;

/// Default lower bound on a provider's nominal fee
pub const DEFAULT_MIN_FEE: u64 = 0;

/// Default upper bound on a provider's nominal fee
pub const DEFAULT_MAX_FEE: u64 = 1_000_000_000_000_000;

// =============================================================================
// Fee Components
// =============================================================================

/// One provider's resource prices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeComponents {
    pub constant: u64,
    pub bpt: u64,
    pub vpt: u64,
    pub rbh: u64,
    pub sbh: u64,
    pub gas: u64,
    pub bpr: u64,
    pub sbpr: u64,
    #[serde(default)]
    pub min: u64,
    #[serde(default = "default_max")]
    pub max: u64,
}

fn default_max() -> u64 {
    DEFAULT_MAX_FEE
}

impl Default for FeeComponents {
    fn default() -> Self {
        Self::from_prices([0; NUM_RESOURCES])
    }
}

impl FeeComponents {
    /// Components with the given per-resource prices and default bounds
    pub fn from_prices(prices: [u64; NUM_RESOURCES]) -> Self {
        let mut components = Self {
            constant: 0,
            bpt: 0,
            vpt: 0,
            rbh: 0,
            sbh: 0,
            gas: 0,
            bpr: 0,
            sbpr: 0,
            min: DEFAULT_MIN_FEE,
            max: DEFAULT_MAX_FEE,
        };
        for resource in UsableResource::ALL {
            components.set_price(resource, prices[resource.index()]);
        }
        components
    }

    /// Price of one resource
    pub fn price(&self, resource: UsableResource) -> u64 {
        match resource {
            UsableResource::Constant => self.constant,
            UsableResource::Bpt => self.bpt,
            UsableResource::Vpt => self.vpt,
            UsableResource::Rbh => self.rbh,
            UsableResource::Sbh => self.sbh,
            UsableResource::Gas => self.gas,
            UsableResource::Bpr => self.bpr,
            UsableResource::Sbpr => self.sbpr,
        }
    }

    /// Overwrite the price of one resource
    pub fn set_price(&mut self, resource: UsableResource, price: u64) {
        let slot = match resource {
            UsableResource::Constant => &mut self.constant,
            UsableResource::Bpt => &mut self.bpt,
            UsableResource::Vpt => &mut self.vpt,
            UsableResource::Rbh => &mut self.rbh,
            UsableResource::Sbh => &mut self.sbh,
            UsableResource::Gas => &mut self.gas,
            UsableResource::Bpr => &mut self.bpr,
            UsableResource::Sbpr => &mut self.sbpr,
        };
        *slot = price;
    }

    /// Prices indexed by resource
    pub fn prices(&self) -> [u64; NUM_RESOURCES] {
        let mut prices = [0; NUM_RESOURCES];
        for resource in UsableResource::ALL {
            prices[resource.index()] = self.price(resource);
        }
        prices
    }

    /// Same prices with new min/max bounds
    pub fn with_bounds(mut self, min: u64, max: u64) -> Self {
        self.min = min;
        self.max = max;
        self
    }
}

// =============================================================================
// Fee Data
// =============================================================================

/// Node, network and service prices of one (operation, subtype)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeData {
    pub nodedata: FeeComponents,
    pub networkdata: FeeComponents,
    pub servicedata: FeeComponents,
}

impl FeeData {
    /// Prices for each provider
    pub fn new(node: FeeComponents, network: FeeComponents, service: FeeComponents) -> Self {
        Self {
            nodedata: node,
            networkdata: network,
            servicedata: service,
        }
    }

    /// Same components for all three providers
    pub fn uniform(components: FeeComponents) -> Self {
        Self::new(components, components, components)
    }

    /// Prices of one provider
    pub fn components(&self, provider: ResourceProvider) -> &FeeComponents {
        match provider {
            ResourceProvider::Node => &self.nodedata,
            ResourceProvider::Network => &self.networkdata,
            ResourceProvider::Service => &self.servicedata,
        }
    }

    /// Mutable prices of one provider
    pub fn components_mut(&mut self, provider: ResourceProvider) -> &mut FeeComponents {
        match provider {
            ResourceProvider::Node => &mut self.nodedata,
            ResourceProvider::Network => &mut self.networkdata,
            ResourceProvider::Service => &mut self.servicedata,
        }
    }

    /// Price of one (provider, resource)
    pub fn price(&self, provider: ResourceProvider, resource: UsableResource) -> u64 {
        self.components(provider).price(resource)
    }

    /// Exact USD cost of `usage` at these prices, ignoring min/max bounds
    pub fn usd_cost_of(&self, usage: &UsageAccumulator) -> BigRational {
        let mut sum = BigInt::from(0u32);
        for (provider, resource, units) in usage.non_zero() {
            sum += BigInt::from(self.price(provider, resource)) * BigInt::from(units);
        }
        let divisor = BigInt::from(FEE_DIVISOR_FACTOR) * BigInt::from(USD_TO_TINYCENTS);
        BigRational::new(sum, divisor)
    }
}

// =============================================================================
// Fee Schedule
// =============================================================================

/// Immutable price table for every priced (operation, subtype)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeeSchedule {
    entries: BTreeMap<Operation, BTreeMap<SubType, FeeData>>,
}

impl FeeSchedule {
    /// Empty schedule
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish prices for an (operation, subtype), replacing any previous ones
    pub fn insert(&mut self, function: Operation, subtype: SubType, prices: FeeData) {
        self.entries
            .entry(function)
            .or_default()
            .insert(subtype, prices);
    }

    /// Prices of an (operation, subtype)
    pub fn get(&self, function: Operation, subtype: SubType) -> Option<&FeeData> {
        self.entries.get(&function)?.get(&subtype)
    }

    /// Whether an (operation, subtype) is priced
    pub fn contains(&self, function: Operation, subtype: SubType) -> bool {
        self.get(function, subtype).is_some()
    }

    /// Number of (operation, subtype) entries
    pub fn len(&self) -> usize {
        self.entries.values().map(BTreeMap::len).sum()
    }

    /// Whether nothing is priced
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Entries in (operation, subtype) order
    pub fn iter(&self) -> impl Iterator<Item = (Operation, SubType, &FeeData)> {
        self.entries.iter().flat_map(|(function, scoped)| {
            scoped
                .iter()
                .map(move |(subtype, prices)| (*function, *subtype, prices))
        })
    }

    /// USD cost of `usage` under the entry for (function, subtype)
    pub fn repriced_usd(
        &self,
        function: Operation,
        subtype: SubType,
        usage: &UsageAccumulator,
    ) -> Option<BigRational> {
        self.get(function, subtype).map(|prices| prices.usd_cost_of(usage))
    }

    /// Hex SHA-256 of the canonical JSON encoding
    ///
    /// Replicas holding the same schedule compute the same digest.
    pub fn digest(&self) -> Result<String, CalibrationError> {
        let bytes = serde_json::to_vec(self)?;
        Ok(hex::encode(Sha256::digest(&bytes)))
    }

    /// Entry in the `transactionFeeSchedule` layout operators publish
    pub fn entry_repr(&self, function: Operation) -> Option<TransactionFeeScheduleRepr> {
        let scoped = self.entries.get(&function)?;
        let fees = scoped
            .iter()
            .map(|(subtype, prices)| ScopedFeeData {
                sub_type: (*subtype != SubType::Default).then_some(*subtype),
                prices: *prices,
            })
            .collect();
        Some(TransactionFeeScheduleRepr {
            transaction_fee_schedule: TransactionFeeSchedule {
                hedera_functionality: function,
                fees,
            },
        })
    }

    /// Save the schedule to disk
    pub fn save(&self, path: &Path) -> Result<(), CalibrationError> {
        let temp_path = path.with_extension("tmp");
        let file = fs::File::create(&temp_path)?;
        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)?;

        // Atomic rename
        fs::rename(&temp_path, path)?;
        Ok(())
    }

    /// Load a previously published schedule
    pub fn load(path: &Path) -> Result<Self, CalibrationError> {
        let file = fs::File::open(path)?;
        let reader = BufReader::new(file);
        Ok(serde_json::from_reader(reader)?)
    }
}

// =============================================================================
// Published representation
// =============================================================================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionFeeScheduleRepr {
    pub transaction_fee_schedule: TransactionFeeSchedule,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionFeeSchedule {
    pub hedera_functionality: Operation,
    pub fees: Vec<ScopedFeeData>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScopedFeeData {
    #[serde(rename = "subType", skip_serializing_if = "Option::is_none")]
    pub sub_type: Option<SubType>,
    #[serde(flatten)]
    pub prices: FeeData,
}

/// 10^`exponent` as an exact rational
pub(crate) fn rational_power_of_ten(exponent: usize) -> BigRational {
    BigRational::from_integer(power_of_ten(exponent))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn sample_prices() -> FeeData {
        let mut node = FeeComponents::default();
        node.constant = 74_741_325;
        node.bpt = 119_489;
        let network = FeeComponents::from_prices([1_494_826_501, 2_389_780, 0, 0, 0, 0, 0, 0]);
        FeeData::new(node, network, network)
    }

    #[test]
    fn test_components_price_accessors() {
        let mut components = FeeComponents::default();
        for (i, resource) in UsableResource::ALL.into_iter().enumerate() {
            components.set_price(resource, (i as u64 + 1) * 10);
        }
        assert_eq!(components.prices(), [10, 20, 30, 40, 50, 60, 70, 80]);
        assert_eq!(components.price(UsableResource::Sbpr), 80);
        assert_eq!(components.min, DEFAULT_MIN_FEE);
        assert_eq!(components.max, DEFAULT_MAX_FEE);
    }

    #[test]
    fn test_schedule_lookup() {
        let mut schedule = FeeSchedule::new();
        schedule.insert(Operation::CryptoTransfer, SubType::Default, sample_prices());
        schedule.insert(
            Operation::CryptoTransfer,
            SubType::TokenFungibleCommon,
            FeeData::default(),
        );

        assert_eq!(schedule.len(), 2);
        assert!(schedule.contains(Operation::CryptoTransfer, SubType::Default));
        assert!(!schedule.contains(Operation::TokenMint, SubType::Default));
        assert_eq!(
            schedule
                .get(Operation::CryptoTransfer, SubType::Default)
                .unwrap()
                .price(ResourceProvider::Node, UsableResource::Constant),
            74_741_325
        );
    }

    #[test]
    fn test_usd_cost_of_usage() {
        let mut usage = UsageAccumulator::new();
        usage.set(ResourceProvider::Node, UsableResource::Constant, 1);
        let prices = FeeData::uniform(FeeComponents::from_prices([
            FEE_DIVISOR_FACTOR * USD_TO_TINYCENTS / 100,
            0,
            0,
            0,
            0,
            0,
            0,
            0,
        ]));
        // One constant unit priced at one cent
        assert_eq!(
            prices.usd_cost_of(&usage),
            BigRational::new(BigInt::from(1), BigInt::from(100))
        );
    }

    #[test]
    fn test_entry_repr_layout() {
        let mut schedule = FeeSchedule::new();
        schedule.insert(Operation::TokenFeeScheduleUpdate, SubType::Default, sample_prices());

        let repr = schedule.entry_repr(Operation::TokenFeeScheduleUpdate).unwrap();
        let json = serde_json::to_value(&repr).unwrap();
        let entry = &json["transactionFeeSchedule"];
        assert_eq!(entry["hederaFunctionality"], "TokenFeeScheduleUpdate");
        assert!(entry["fees"][0].get("subType").is_none());
        assert_eq!(entry["fees"][0]["nodedata"]["constant"], 74_741_325);
        assert_eq!(entry["fees"][0]["servicedata"]["max"], DEFAULT_MAX_FEE);
        assert!(schedule.entry_repr(Operation::TokenMint).is_none());
    }

    #[test]
    fn test_save_load_and_digest() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("schedule.json");

        let mut schedule = FeeSchedule::new();
        schedule.insert(Operation::ConsensusSubmitMessage, SubType::Default, sample_prices());
        schedule.save(&path).unwrap();

        let loaded = FeeSchedule::load(&path).unwrap();
        assert_eq!(loaded, schedule);
        assert_eq!(loaded.digest().unwrap(), schedule.digest().unwrap());

        let mut changed = schedule.clone();
        changed.insert(Operation::ConsensusSubmitMessage, SubType::Default, FeeData::default());
        assert_ne!(changed.digest().unwrap(), schedule.digest().unwrap());
    }
}
