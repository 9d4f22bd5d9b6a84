//! Usage accumulator
//!
//! A provider × resource matrix of units consumed by one operation.

use crate::resource::provider::{ResourceProvider, NUM_PROVIDERS};
use crate::resource::usable::{UsableResource, NUM_RESOURCES};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Sparse, human-editable form of a usage matrix
pub type UsageTable = BTreeMap<ResourceProvider, BTreeMap<UsableResource, u64>>;

/// Units of each resource consumed on behalf of each provider
///
/// Cells for combinations an operation never touches stay zero. Additions
/// saturate at `u64::MAX`, so an absurd usage can never wrap to a small one;
/// pricing a saturated cell at any non-zero price overflows and is rejected
/// by the calculator.
#[derive(Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "UsageTable", into = "UsageTable")]
pub struct UsageAccumulator {
    cells: [[u64; NUM_RESOURCES]; NUM_PROVIDERS],
}

impl UsageAccumulator {
    /// All-zero usage
    pub fn new() -> Self {
        Self::default()
    }

    /// Zero every cell before reuse
    pub fn reset(&mut self) {
        self.cells = [[0; NUM_RESOURCES]; NUM_PROVIDERS];
    }

    /// Units of `resource` used for `provider`
    pub fn get(&self, provider: ResourceProvider, resource: UsableResource) -> u64 {
        self.cells[provider.index()][resource.index()]
    }

    /// Overwrite one cell
    pub fn set(&mut self, provider: ResourceProvider, resource: UsableResource, units: u64) {
        self.cells[provider.index()][resource.index()] = units;
    }

    /// Add to one cell, saturating
    pub fn add(&mut self, provider: ResourceProvider, resource: UsableResource, units: u64) {
        let cell = &mut self.cells[provider.index()][resource.index()];
        *cell = cell.saturating_add(units);
    }

    /// Units consumed on behalf of one provider, indexed by resource
    pub fn provider_row(&self, provider: ResourceProvider) -> &[u64; NUM_RESOURCES] {
        &self.cells[provider.index()]
    }

    /// Whether every cell is zero
    pub fn is_empty(&self) -> bool {
        self.cells.iter().flatten().all(|units| *units == 0)
    }

    /// Iterate over all non-zero cells in provider-major order
    pub fn non_zero(&self) -> impl Iterator<Item = (ResourceProvider, UsableResource, u64)> + '_ {
        ResourceProvider::ALL.into_iter().flat_map(move |p| {
            UsableResource::ALL
                .into_iter()
                .map(move |r| (p, r, self.get(p, r)))
                .filter(|(_, _, units)| *units > 0)
        })
    }
}

impl From<UsageTable> for UsageAccumulator {
    fn from(table: UsageTable) -> Self {
        let mut usage = Self::new();
        for (provider, row) in table {
            for (resource, units) in row {
                usage.set(provider, resource, units);
            }
        }
        usage
    }
}

impl From<UsageAccumulator> for UsageTable {
    fn from(usage: UsageAccumulator) -> Self {
        let mut table = UsageTable::new();
        for (provider, resource, units) in usage.non_zero() {
            table.entry(provider).or_default().insert(resource, units);
        }
        table
    }
}

impl fmt::Debug for UsageAccumulator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (provider, resource, units) in self.non_zero() {
            map.entry(&format_args!("{}.{}", provider, resource), &units);
        }
        map.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ResourceProvider::*;
    use UsableResource::*;

    #[test]
    fn test_new_accumulator_is_zeroed() {
        let usage = UsageAccumulator::new();
        assert!(usage.is_empty());
        for p in ResourceProvider::ALL {
            for r in UsableResource::ALL {
                assert_eq!(usage.get(p, r), 0);
            }
        }
    }

    #[test]
    fn test_set_add_and_reset() {
        let mut usage = UsageAccumulator::new();
        usage.set(Node, Bpt, 100);
        usage.add(Node, Bpt, 23);
        usage.add(Service, Rbh, 7);

        assert_eq!(usage.get(Node, Bpt), 123);
        assert_eq!(usage.get(Network, Bpt), 0);
        assert_eq!(usage.provider_row(Service)[Rbh.index()], 7);
        assert_eq!(usage.non_zero().count(), 2);

        usage.reset();
        assert!(usage.is_empty());
    }

    #[test]
    fn test_add_saturates() {
        let mut usage = UsageAccumulator::new();
        usage.set(Network, Vpt, u64::MAX - 1);
        usage.add(Network, Vpt, 10);
        assert_eq!(usage.get(Network, Vpt), u64::MAX);
    }

    #[test]
    fn test_json_form_is_sparse() {
        let mut usage = UsageAccumulator::new();
        usage.set(Node, Constant, 1);
        usage.set(Network, Bpt, 250);

        let json = serde_json::to_string(&usage).unwrap();
        assert_eq!(json, r#"{"node":{"constant":1},"network":{"bpt":250}}"#);

        let parsed: UsageAccumulator = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, usage);
    }
}
