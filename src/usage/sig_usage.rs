//! Signature usage of a transaction

use crate::txn::TxnAccessor;
use serde::{Deserialize, Serialize};

/// Signature facts every usage estimate starts from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SigUsage {
    /// Signature pairs in the signature map
    pub num_sigs: u64,
    /// Bytes of the signature map
    pub sigs_size: u64,
    /// Primitive keys in the payer's key
    pub num_payer_keys: u64,
}

impl SigUsage {
    /// Usage from raw signature counts
    pub fn new(num_sigs: u64, sigs_size: u64, num_payer_keys: u64) -> Self {
        Self {
            num_sigs,
            sigs_size,
            num_payer_keys,
        }
    }

    /// Usage of the transaction's signature map and payer key
    pub fn from_accessor(accessor: &TxnAccessor) -> Self {
        Self::new(
            accessor.num_sig_pairs(),
            accessor.sig_map_size(),
            accessor.payer_key.num_simple_keys(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::txn::{AccountId, Key, Operation, SigPair, TransactionId};
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_from_accessor() {
        let payer_key = Key::Threshold {
            threshold: 2,
            keys: vec![
                Key::Ed25519(vec![1; 32]),
                Key::KeyList(vec![Key::Ed25519(vec![2; 32]), Key::Secp256k1(vec![3; 33])]),
            ],
        };
        let accessor = TxnAccessor {
            txn_id: TransactionId::new(
                AccountId::num(1001),
                Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
            ),
            valid_duration_secs: 120,
            node_account: AccountId::num(3),
            function: Operation::CryptoTransfer,
            subtype: Default::default(),
            memo: String::new(),
            offered_fee: 100_000_000,
            num_explicit_transfers: 2,
            sig_map: vec![
                SigPair {
                    pub_key_prefix: vec![1; 2],
                    signature: vec![0; 64],
                },
                SigPair {
                    pub_key_prefix: vec![2; 2],
                    signature: vec![0; 64],
                },
            ],
            payer_key,
            op_meta: Default::default(),
        };

        assert_eq!(SigUsage::from_accessor(&accessor), SigUsage::new(2, 132, 3));
    }
}
