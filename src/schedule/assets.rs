//! Calibration inputs
//!
//! Capacities, provider weights, constant weights, canonical prices and
//! canonical usages, loaded once from a JSON document and validated eagerly.

use crate::resource::{ResourceProvider, UsableResource, UsageAccumulator};
use crate::schedule::decimal::Decimal;
use crate::schedule::error::CalibrationError;
use crate::txn::{Operation, SubType};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::BufReader;
use std::path::Path;

/// Where the calibrator reads its inputs from
///
/// Every lookup is fallible: a missing input is a calibration error, never a
/// silent default.
pub trait CalibrationSource {
    /// Network-wide capacity of a measured resource
    fn capacity(&self, resource: UsableResource) -> Result<Decimal, CalibrationError>;

    /// Relative weight of a provider
    fn provider_weight(&self, provider: ResourceProvider) -> Result<Decimal, CalibrationError>;

    /// Share of an operation's price carried by the constant component
    fn constant_weight(&self, function: Operation) -> Result<Decimal, CalibrationError>;

    /// Target USD price of the canonical transaction
    fn canonical_price(
        &self,
        function: Operation,
        subtype: SubType,
    ) -> Result<Decimal, CalibrationError>;

    /// Resource usage of the canonical transaction
    fn canonical_usage(
        &self,
        function: Operation,
        subtype: SubType,
    ) -> Result<UsageAccumulator, CalibrationError>;

    /// Every (operation, subtype) with a canonical price
    fn priced_pairs(&self) -> Vec<(Operation, SubType)>;
}

/// Calibration document as stored on disk
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CalibrationData {
    #[serde(default)]
    pub provider_weights: BTreeMap<ResourceProvider, Decimal>,
    #[serde(default)]
    pub capacities: BTreeMap<UsableResource, Decimal>,
    #[serde(default)]
    pub constant_weights: BTreeMap<Operation, Decimal>,
    #[serde(default)]
    pub canonical_prices: BTreeMap<Operation, BTreeMap<SubType, Decimal>>,
    #[serde(default)]
    pub canonical_usages: BTreeMap<Operation, BTreeMap<SubType, UsageAccumulator>>,
}

impl CalibrationData {
    /// Load and validate a calibration document
    pub fn load(path: &Path) -> Result<Self, CalibrationError> {
        let file = fs::File::open(path)?;
        let reader = BufReader::new(file);
        let data: Self = serde_json::from_reader(reader)?;
        data.validate()?;
        log::info!(
            "Loaded calibration data for {} priced entries from {}",
            data.priced_pairs().len(),
            path.display()
        );
        Ok(data)
    }

    /// Check every input the calibrator will read
    ///
    /// Weights and capacities must be positive, constant weights must lie
    /// strictly between 0 and 1, and every priced pair needs a positive
    /// price, a canonical usage and a constant weight for its operation.
    pub fn validate(&self) -> Result<(), CalibrationError> {
        for provider in ResourceProvider::ALL {
            self.provider_weight(provider)?;
        }
        for resource in UsableResource::measured() {
            self.capacity(resource)?;
        }
        for (function, subtype) in self.priced_pairs() {
            self.constant_weight(function)?;
            self.canonical_price(function, subtype)?;
            self.canonical_usage(function, subtype)?;
        }
        Ok(())
    }
}

impl CalibrationSource for CalibrationData {
    fn capacity(&self, resource: UsableResource) -> Result<Decimal, CalibrationError> {
        let capacity = self
            .capacities
            .get(&resource)
            .ok_or(CalibrationError::MissingCapacity(resource))?;
        if !capacity.is_positive() {
            return Err(CalibrationError::NonPositiveCapacity(
                resource,
                capacity.to_string(),
            ));
        }
        Ok(capacity.clone())
    }

    fn provider_weight(&self, provider: ResourceProvider) -> Result<Decimal, CalibrationError> {
        let weight = self
            .provider_weights
            .get(&provider)
            .ok_or(CalibrationError::MissingProviderWeight(provider))?;
        if !weight.is_positive() {
            return Err(CalibrationError::NonPositiveWeight(
                provider,
                weight.to_string(),
            ));
        }
        Ok(weight.clone())
    }

    fn constant_weight(&self, function: Operation) -> Result<Decimal, CalibrationError> {
        let weight = self
            .constant_weights
            .get(&function)
            .ok_or(CalibrationError::MissingConstantWeight(function))?;
        if !weight.is_proper_fraction() {
            return Err(CalibrationError::InvalidConstantWeight(
                function,
                weight.to_string(),
            ));
        }
        Ok(weight.clone())
    }

    fn canonical_price(
        &self,
        function: Operation,
        subtype: SubType,
    ) -> Result<Decimal, CalibrationError> {
        let price = self
            .canonical_prices
            .get(&function)
            .and_then(|scoped| scoped.get(&subtype))
            .ok_or(CalibrationError::MissingCanonicalPrice(function, subtype))?;
        if !price.is_positive() {
            return Err(CalibrationError::NonPositiveCanonicalPrice(
                function,
                subtype,
                price.to_string(),
            ));
        }
        Ok(price.clone())
    }

    fn canonical_usage(
        &self,
        function: Operation,
        subtype: SubType,
    ) -> Result<UsageAccumulator, CalibrationError> {
        self.canonical_usages
            .get(&function)
            .and_then(|scoped| scoped.get(&subtype))
            .copied()
            .ok_or(CalibrationError::MissingCanonicalUsage(function, subtype))
    }

    fn priced_pairs(&self) -> Vec<(Operation, SubType)> {
        self.canonical_prices
            .iter()
            .flat_map(|(function, scoped)| scoped.keys().map(move |subtype| (*function, *subtype)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const SAMPLE: &str = r#"{
        "provider_weights": { "node": "0.1", "network": "0.2", "service": "0.7" },
        "capacities": {
            "bpt": 1000, "vpt": 1000, "rbh": 1000, "sbh": 1000,
            "gas": 1000, "bpr": 1000, "sbpr": 1000
        },
        "constant_weights": { "ConsensusSubmitMessage": "0.2" },
        "canonical_prices": { "ConsensusSubmitMessage": { "DEFAULT": "0.0001" } },
        "canonical_usages": {
            "ConsensusSubmitMessage": {
                "DEFAULT": { "node": { "constant": 1, "bpt": 500 } }
            }
        }
    }"#;

    fn write_sample(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_sample() {
        let file = write_sample(SAMPLE);
        let data = CalibrationData::load(file.path()).unwrap();

        assert_eq!(
            data.priced_pairs(),
            vec![(Operation::ConsensusSubmitMessage, SubType::Default)]
        );
        assert_eq!(
            data.provider_weight(ResourceProvider::Service).unwrap(),
            Decimal::parse("0.7").unwrap()
        );
        let usage = data
            .canonical_usage(Operation::ConsensusSubmitMessage, SubType::Default)
            .unwrap();
        assert_eq!(usage.get(ResourceProvider::Node, UsableResource::Bpt), 500);
    }

    #[test]
    fn test_missing_capacity_rejected() {
        let file = write_sample(&SAMPLE.replace("\"sbpr\": 1000", "\"sbpr\": 0"));
        let err = CalibrationData::load(file.path()).unwrap_err();
        assert!(matches!(
            err,
            CalibrationError::NonPositiveCapacity(UsableResource::Sbpr, _)
        ));

        let mut data: CalibrationData = serde_json::from_str(SAMPLE).unwrap();
        data.capacities.remove(&UsableResource::Gas);
        assert!(matches!(
            data.validate(),
            Err(CalibrationError::MissingCapacity(UsableResource::Gas))
        ));
    }

    #[test]
    fn test_constant_weight_bounds() {
        for bad in ["\"0\"", "\"1\"", "\"1.5\"", "\"-0.2\""] {
            let file = write_sample(&SAMPLE.replace(
                "\"ConsensusSubmitMessage\": \"0.2\"",
                &format!("\"ConsensusSubmitMessage\": {}", bad),
            ));
            assert!(matches!(
                CalibrationData::load(file.path()),
                Err(CalibrationError::InvalidConstantWeight(
                    Operation::ConsensusSubmitMessage,
                    _
                ))
            ));
        }
    }

    #[test]
    fn test_missing_weight_and_usage_rejected() {
        let mut data: CalibrationData = serde_json::from_str(SAMPLE).unwrap();
        data.canonical_usages.clear();
        assert!(matches!(
            data.validate(),
            Err(CalibrationError::MissingCanonicalUsage(
                Operation::ConsensusSubmitMessage,
                SubType::Default
            ))
        ));

        let mut data: CalibrationData = serde_json::from_str(SAMPLE).unwrap();
        data.provider_weights.remove(&ResourceProvider::Network);
        assert!(matches!(
            data.validate(),
            Err(CalibrationError::MissingProviderWeight(ResourceProvider::Network))
        ));
    }

    #[test]
    fn test_float_literals_rejected() {
        let file = write_sample(&SAMPLE.replace("\"0.0001\"", "0.0001"));
        assert!(matches!(
            CalibrationData::load(file.path()),
            Err(CalibrationError::SerializationError(_))
        ));
    }
}
