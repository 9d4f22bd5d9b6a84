//! Resource providers
//!
//! Resources are consumed by three providers:
//! - the node, when talking to the client, running prechecks and submitting
//!   to the network
//! - the network, when gossiping, reaching consensus and keeping receipts
//! - the service, when performing the logical operation itself

use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of resource providers
pub const NUM_PROVIDERS: usize = 3;

/// A party whose resource consumption is priced
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceProvider {
    Node,
    Network,
    Service,
}

impl ResourceProvider {
    pub const ALL: [ResourceProvider; NUM_PROVIDERS] = [
        ResourceProvider::Node,
        ResourceProvider::Network,
        ResourceProvider::Service,
    ];

    /// Compact index into provider-major matrices
    pub const fn index(self) -> usize {
        match self {
            ResourceProvider::Node => 0,
            ResourceProvider::Network => 1,
            ResourceProvider::Service => 2,
        }
    }
}

impl fmt::Display for ResourceProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResourceProvider::Node => "node",
            ResourceProvider::Network => "network",
            ResourceProvider::Service => "service",
        };
        f.write_str(name)
    }
}
