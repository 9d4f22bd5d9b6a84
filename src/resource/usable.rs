//! Usable resources
//!
//! Each resource kind is metered and priced independently. `Constant` is a
//! synthetic kind standing for the fixed overhead of an operation; its
//! price is derived during calibration rather than from a capacity.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of resource kinds, including `Constant`
pub const NUM_RESOURCES: usize = 8;

/// A kind of resource charged per unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UsableResource {
    /// Fixed per-operation overhead
    Constant,
    /// Bytes per transaction
    Bpt,
    /// Signature verifications per transaction
    Vpt,
    /// RAM byte-hours
    Rbh,
    /// Storage byte-hours
    Sbh,
    /// Smart contract gas
    Gas,
    /// Bytes per response
    Bpr,
    /// Storage bytes per response
    Sbpr,
}

impl UsableResource {
    pub const ALL: [UsableResource; NUM_RESOURCES] = [
        UsableResource::Constant,
        UsableResource::Bpt,
        UsableResource::Vpt,
        UsableResource::Rbh,
        UsableResource::Sbh,
        UsableResource::Gas,
        UsableResource::Bpr,
        UsableResource::Sbpr,
    ];

    /// Compact index into resource-minor matrices
    pub const fn index(self) -> usize {
        match self {
            UsableResource::Constant => 0,
            UsableResource::Bpt => 1,
            UsableResource::Vpt => 2,
            UsableResource::Rbh => 3,
            UsableResource::Sbh => 4,
            UsableResource::Gas => 5,
            UsableResource::Bpr => 6,
            UsableResource::Sbpr => 7,
        }
    }

    /// Whether this is the per-transaction constant
    pub const fn is_constant(self) -> bool {
        matches!(self, UsableResource::Constant)
    }

    /// Every resource except `Constant`
    pub fn measured() -> impl Iterator<Item = UsableResource> {
        Self::ALL.into_iter().filter(|r| !r.is_constant())
    }

    /// Lowercase name used in JSON
    pub const fn as_str(self) -> &'static str {
        match self {
            UsableResource::Constant => "constant",
            UsableResource::Bpt => "bpt",
            UsableResource::Vpt => "vpt",
            UsableResource::Rbh => "rbh",
            UsableResource::Sbh => "sbh",
            UsableResource::Gas => "gas",
            UsableResource::Bpr => "bpr",
            UsableResource::Sbpr => "sbpr",
        }
    }
}

impl fmt::Display for UsableResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
