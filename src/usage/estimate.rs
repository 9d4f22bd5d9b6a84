//! Base transaction usage estimate
//!
//! Every transaction pays for its body bytes, its signature verifications
//! and the record and receipt the network keeps for it. Operation-specific
//! assessors add to this base before it is projected into the
//! provider × resource matrix.

use crate::resource::{ResourceProvider, UsableResource, UsageAccumulator};
use crate::txn::TxnAccessor;
use crate::usage::sig_usage::SigUsage;
use serde::{Deserialize, Serialize};

// =============================================================================
// Constants
// =============================================================================

pub const LONG_SIZE: u64 = 8;
pub const INT_SIZE: u64 = 4;
pub const TX_HASH_SIZE: u64 = 48;

/// Seconds a receipt is kept in memory
pub const RECEIPT_STORAGE_TIME_SEC: u64 = 180;

/// Byte-seconds per byte-hour
pub const HRS_DIVISOR: u64 = 3_600;

pub const BASIC_ENTITY_ID_SIZE: u64 = 3 * LONG_SIZE;
pub const BASIC_ACCOUNT_AMT_SIZE: u64 = BASIC_ENTITY_ID_SIZE + LONG_SIZE;
pub const BASIC_TX_ID_SIZE: u64 = BASIC_ENTITY_ID_SIZE + LONG_SIZE;
pub const EXCHANGE_RATE_SIZE: u64 = 2 * INT_SIZE + LONG_SIZE;
pub const BASIC_RECEIPT_SIZE: u64 = INT_SIZE + 2 * EXCHANGE_RATE_SIZE;
pub const BASIC_TX_BODY_SIZE: u64 =
    BASIC_ENTITY_ID_SIZE + BASIC_TX_ID_SIZE + LONG_SIZE + (LONG_SIZE + INT_SIZE);
pub const BASIC_TX_RECORD_SIZE: u64 =
    BASIC_RECEIPT_SIZE + TX_HASH_SIZE + LONG_SIZE + BASIC_TX_ID_SIZE;

/// Bytes of one NFT ownership change (token, sender, receiver, serial)
pub const NFT_TRANSFER_SIZE: u64 = 3 * BASIC_ENTITY_ID_SIZE + LONG_SIZE;

/// Byte-seconds to byte-hours, never rounding a positive amount to zero
pub fn byte_seconds_to_byte_hours(byte_seconds: u64) -> u64 {
    crate::calc::non_degenerate_div(byte_seconds, HRS_DIVISOR)
}

// =============================================================================
// Base transaction meta
// =============================================================================

/// Facts about the transaction body shared by every operation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseTransactionMeta {
    pub memo_utf8_bytes: u64,
    pub num_explicit_transfers: u64,
}

impl BaseTransactionMeta {
    /// Base facts of a transaction
    pub fn new(memo_utf8_bytes: u64, num_explicit_transfers: u64) -> Self {
        Self {
            memo_utf8_bytes,
            num_explicit_transfers,
        }
    }

    /// Base facts read from a decoded transaction
    pub fn from_accessor(accessor: &TxnAccessor) -> Self {
        Self::new(
            accessor.memo_utf8_bytes(),
            u64::from(accessor.num_explicit_transfers),
        )
    }
}

// =============================================================================
// Usage estimate
// =============================================================================

/// Running estimate for one transaction
///
/// RAM and storage are tracked in byte-seconds and only converted to
/// byte-hours on projection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TxnUsageEstimate {
    sig_usage: SigUsage,
    bpt: u64,
    bpr: u64,
    gas: u64,
    rbs: u64,
    sbs: u64,
    network_rbs: u64,
}

impl TxnUsageEstimate {
    /// Estimate holding only the base usage
    pub fn new(base: &BaseTransactionMeta, sig_usage: SigUsage) -> Self {
        let mut estimate = Self::default();
        estimate.reset_for_transaction(base, sig_usage);
        estimate
    }

    /// Start over with the base usage of a new transaction
    pub fn reset_for_transaction(&mut self, base: &BaseTransactionMeta, sig_usage: SigUsage) {
        let record_bytes = BASIC_TX_RECORD_SIZE
            .saturating_add(base.memo_utf8_bytes)
            .saturating_add(BASIC_ACCOUNT_AMT_SIZE.saturating_mul(base.num_explicit_transfers));

        *self = Self {
            sig_usage,
            bpt: BASIC_TX_BODY_SIZE
                .saturating_add(base.memo_utf8_bytes)
                .saturating_add(sig_usage.sigs_size),
            bpr: INT_SIZE,
            gas: 0,
            rbs: RECEIPT_STORAGE_TIME_SEC.saturating_mul(record_bytes),
            sbs: 0,
            network_rbs: BASIC_RECEIPT_SIZE * RECEIPT_STORAGE_TIME_SEC,
        };
    }

    /// Add bytes per transaction
    pub fn add_bpt(&mut self, bytes: u64) -> &mut Self {
        self.bpt = self.bpt.saturating_add(bytes);
        self
    }

    /// Add gas
    pub fn add_gas(&mut self, gas: u64) -> &mut Self {
        self.gas = self.gas.saturating_add(gas);
        self
    }

    /// Add service RAM in byte-seconds
    pub fn add_rbs(&mut self, byte_seconds: u64) -> &mut Self {
        self.rbs = self.rbs.saturating_add(byte_seconds);
        self
    }

    /// Add storage in byte-seconds
    pub fn add_sbs(&mut self, byte_seconds: u64) -> &mut Self {
        self.sbs = self.sbs.saturating_add(byte_seconds);
        self
    }

    /// Add network RAM in byte-seconds
    pub fn add_network_rbs(&mut self, byte_seconds: u64) -> &mut Self {
        self.network_rbs = self.network_rbs.saturating_add(byte_seconds);
        self
    }

    pub fn bpt(&self) -> u64 {
        self.bpt
    }

    pub fn rbs(&self) -> u64 {
        self.rbs
    }

    pub fn network_rbs(&self) -> u64 {
        self.network_rbs
    }

    /// Overwrite `usage` with this estimate
    ///
    /// The node is paid for the bytes it receives and returns and for
    /// verifying the payer's signatures; the network for gossiping the body,
    /// verifying all signatures and holding receipts; the service for the
    /// record, state storage and gas.
    pub fn project_into(&self, usage: &mut UsageAccumulator) {
        use ResourceProvider::*;
        use UsableResource::*;

        usage.reset();

        usage.set(Node, Constant, 1);
        usage.set(Node, Bpt, self.bpt);
        usage.set(Node, Vpt, self.sig_usage.num_payer_keys);
        usage.set(Node, Bpr, self.bpr);

        usage.set(Network, Constant, 1);
        usage.set(Network, Bpt, self.bpt);
        usage.set(Network, Vpt, self.sig_usage.num_sigs);
        usage.set(Network, Rbh, byte_seconds_to_byte_hours(self.network_rbs));

        usage.set(Service, Constant, 1);
        usage.set(Service, Rbh, byte_seconds_to_byte_hours(self.rbs));
        usage.set(Service, Sbh, byte_seconds_to_byte_hours(self.sbs));
        usage.set(Service, Gas, self.gas);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ResourceProvider::*;
    use UsableResource::*;

    #[test]
    fn test_size_constants() {
        assert_eq!(BASIC_ENTITY_ID_SIZE, 24);
        assert_eq!(BASIC_ACCOUNT_AMT_SIZE, 32);
        assert_eq!(BASIC_RECEIPT_SIZE, 36);
        assert_eq!(BASIC_TX_BODY_SIZE, 76);
        assert_eq!(BASIC_TX_RECORD_SIZE, 124);
    }

    #[test]
    fn test_base_projection() {
        let base = BaseTransactionMeta::new(10, 2);
        let sigs = SigUsage::new(2, 140, 1);
        let estimate = TxnUsageEstimate::new(&base, sigs);

        let mut usage = UsageAccumulator::new();
        usage.set(Service, Gas, 99);
        estimate.project_into(&mut usage);

        assert_eq!(usage.get(Node, Constant), 1);
        assert_eq!(usage.get(Node, Bpt), 76 + 10 + 140);
        assert_eq!(usage.get(Node, Vpt), 1);
        assert_eq!(usage.get(Node, Bpr), INT_SIZE);
        assert_eq!(usage.get(Network, Bpt), 226);
        assert_eq!(usage.get(Network, Vpt), 2);
        // 36 bytes for 180 seconds is 6480 byte-seconds, under two hours
        assert_eq!(usage.get(Network, Rbh), 1);
        // (124 + 10 + 64) bytes for 180 seconds
        assert_eq!(usage.get(Service, Rbh), 9);
        assert_eq!(usage.get(Service, Sbh), 0);
        // Stale cells from a previous transaction are cleared
        assert_eq!(usage.get(Service, Gas), 0);
    }

    #[test]
    fn test_reset_discards_additions() {
        let base = BaseTransactionMeta::default();
        let mut estimate = TxnUsageEstimate::new(&base, SigUsage::default());
        estimate.add_bpt(100).add_gas(5).add_sbs(7_200);
        assert_eq!(estimate.bpt(), BASIC_TX_BODY_SIZE + 100);

        estimate.reset_for_transaction(&base, SigUsage::default());
        assert_eq!(estimate, TxnUsageEstimate::new(&base, SigUsage::default()));
    }

    #[test]
    fn test_byte_hours_never_degenerate() {
        assert_eq!(byte_seconds_to_byte_hours(0), 0);
        assert_eq!(byte_seconds_to_byte_hours(1), 1);
        assert_eq!(byte_seconds_to_byte_hours(7_200), 2);
    }
}
