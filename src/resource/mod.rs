//! Resource model
//!
//! The shared vocabulary of the fee subsystem:
//! - Resource providers (node, network, service)
//! - Usable resources, with the synthetic `Constant` kind
//! - The provider × resource usage accumulator

pub mod accumulator;
pub mod provider;
pub mod usable;

pub use accumulator::{UsageAccumulator, UsageTable};
pub use provider::{ResourceProvider, NUM_PROVIDERS};
pub use usable::{UsableResource, NUM_RESOURCES};
