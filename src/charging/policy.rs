//! Fee charging policies
//!
//! Three mutually exclusive ways a computed fee is collected:
//! - Full: the payer pays node, network and service fees
//! - Duplicate: the payer pays node and network fees only
//! - Ignored due diligence: the submitting node pays the node fee
//!
//! Exempt payers are never debited by the first two.

use crate::calc::FeeObject;
use crate::charging::ledger::{Charge, ChargeExecutor, LedgerError};
use crate::txn::{AccountId, ResponseCode, TxnAccessor};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Which policy collected a transaction's fee
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChargingPolicy {
    Full,
    Duplicate,
    IgnoredDueDiligence,
}

impl fmt::Display for ChargingPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChargingPolicy::Full => write!(f, "full"),
            ChargingPolicy::Duplicate => write!(f, "duplicate"),
            ChargingPolicy::IgnoredDueDiligence => write!(f, "ignored due diligence"),
        }
    }
}

/// Applies charging policies to a ledger
#[derive(Debug, Clone, Default)]
pub struct FeeChargingPolicy {
    exempt_payers: BTreeSet<AccountId>,
}

impl FeeChargingPolicy {
    /// Policy with no exempt payers
    pub fn new() -> Self {
        Self::default()
    }

    /// Policy that never charges the given payers
    pub fn with_exempt_payers(exempt_payers: BTreeSet<AccountId>) -> Self {
        Self { exempt_payers }
    }

    /// Whether the transaction's payer is charged nothing
    pub fn has_exempt_payer(&self, accessor: &TxnAccessor) -> bool {
        self.exempt_payers.contains(&accessor.payer())
    }

    /// Charge the payer every fee, if it offered and can afford them
    pub fn apply(
        &self,
        accessor: &TxnAccessor,
        node: AccountId,
        fees: &FeeObject,
        ledger: &mut dyn ChargeExecutor,
    ) -> ResponseCode {
        if self.has_exempt_payer(accessor) {
            log::debug!("{} has an exempt payer; nothing charged", accessor.txn_id);
            return ResponseCode::Ok;
        }
        let total = match fees.total() {
            Ok(total) => total,
            Err(_) => return ResponseCode::FailFee,
        };
        if accessor.offered_fee < total {
            return ResponseCode::InsufficientTxFee;
        }
        let payer = accessor.payer();
        match ledger.balance(payer) {
            None => return ResponseCode::PayerAccountNotFound,
            Some(balance) if balance < total => return ResponseCode::InsufficientPayerBalance,
            Some(_) => {}
        }

        let charge = Charge {
            debit: payer,
            node_account: node,
            to_node: fees.node_fee,
            to_funding: fees.network_fee + fees.service_fee,
        };
        match ledger.charge(&charge) {
            Ok(()) => ResponseCode::Ok,
            Err(e) => ledger_failure_code(&e),
        }
    }

    /// Charge the payer node and network fees for a duplicate submission
    pub fn apply_for_duplicate(
        &self,
        accessor: &TxnAccessor,
        node: AccountId,
        fees: &FeeObject,
        ledger: &mut dyn ChargeExecutor,
    ) -> ResponseCode {
        if self.has_exempt_payer(accessor) {
            return ResponseCode::DuplicateTransaction;
        }
        let charge = Charge {
            debit: accessor.payer(),
            node_account: node,
            to_node: fees.node_fee,
            to_funding: fees.network_fee,
        };
        if let Err(e) = ledger.charge(&charge) {
            log::warn!("Could not charge duplicate {}: {}", accessor.txn_id, e);
        }
        ResponseCode::DuplicateTransaction
    }

    /// Charge the submitting node the node fee it failed to earn
    pub fn apply_for_ignored_due_diligence(
        &self,
        accessor: &TxnAccessor,
        node: AccountId,
        fees: &FeeObject,
        reason: ResponseCode,
        ledger: &mut dyn ChargeExecutor,
    ) -> ResponseCode {
        let charge = Charge {
            debit: node,
            node_account: node,
            to_node: 0,
            to_funding: fees.node_fee,
        };
        if let Err(e) = ledger.charge(&charge) {
            log::warn!(
                "Could not charge node {} for {}: {}",
                node,
                accessor.txn_id,
                e
            );
        }
        reason
    }
}

fn ledger_failure_code(error: &LedgerError) -> ResponseCode {
    match error {
        LedgerError::AccountNotFound(_) => ResponseCode::PayerAccountNotFound,
        LedgerError::InsufficientBalance { .. } => ResponseCode::InsufficientPayerBalance,
        _ => ResponseCode::FailFee,
    }
}
