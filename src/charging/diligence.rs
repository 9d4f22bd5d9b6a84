//! Node due-diligence screening
//!
//! A node that submits a transaction it should have rejected pays the node
//! fee itself instead of the payer. That covers a wrong or unknown node
//! account, resubmitting its own transaction, an unknown payer and a
//! consensus time outside the valid window.

use crate::charging::agent::HandleContext;
use crate::charging::history::DuplicateClassification;
use crate::charging::ledger::ChargeExecutor;
use crate::txn::{ResponseCode, TxnAccessor};

/// Decides whether the submitting node failed its due diligence
pub trait NodeDiligenceScreen: Send + Sync {
    /// The failure reason, or `None` if the node did its job
    fn screen(
        &self,
        accessor: &TxnAccessor,
        duplicity: DuplicateClassification,
        ctx: &HandleContext,
        accounts: &dyn ChargeExecutor,
    ) -> Option<ResponseCode>;
}

/// Screen checking the facts a node can verify before submitting
#[derive(Debug, Clone, Copy, Default)]
pub struct AwareNodeDiligenceScreen;

impl NodeDiligenceScreen for AwareNodeDiligenceScreen {
    fn screen(
        &self,
        accessor: &TxnAccessor,
        duplicity: DuplicateClassification,
        ctx: &HandleContext,
        accounts: &dyn ChargeExecutor,
    ) -> Option<ResponseCode> {
        let reason = if !accounts.account_exists(accessor.node_account)
            || accessor.node_account != ctx.submitting_node
        {
            ResponseCode::InvalidNodeAccount
        } else if duplicity == DuplicateClassification::NodeDuplicate {
            ResponseCode::DuplicateTransaction
        } else if !accounts.account_exists(accessor.payer()) {
            ResponseCode::PayerAccountNotFound
        } else if ctx.consensus_time < accessor.txn_id.valid_start {
            ResponseCode::InvalidTransactionStart
        } else if ctx.consensus_time > accessor.valid_until() {
            ResponseCode::TransactionExpired
        } else {
            return None;
        };

        log::warn!(
            "Node {} failed due diligence on {}: {}",
            ctx.submitting_node,
            accessor.txn_id,
            reason
        );
        Some(reason)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::charging::ledger::InMemoryLedger;
    use crate::txn::{AccountId, Key, Operation, TransactionId};
    use chrono::{DateTime, TimeZone, Utc};

    const UNIQUE: DuplicateClassification = DuplicateClassification::BelievedUnique;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    fn accessor() -> TxnAccessor {
        TxnAccessor {
            txn_id: TransactionId::new(AccountId::num(1001), at(0)),
            valid_duration_secs: 120,
            node_account: AccountId::num(3),
            function: Operation::CryptoTransfer,
            subtype: Default::default(),
            memo: String::new(),
            offered_fee: 100_000_000,
            num_explicit_transfers: 2,
            sig_map: Vec::new(),
            payer_key: Key::Ed25519(vec![7; 32]),
            op_meta: Default::default(),
        }
    }

    fn accounts() -> InMemoryLedger {
        let mut ledger = InMemoryLedger::new(AccountId::num(98));
        ledger.set_balance(AccountId::num(3), 0);
        ledger.set_balance(AccountId::num(1001), 1_000);
        ledger
    }

    fn ctx(node: u64, secs: i64) -> HandleContext {
        HandleContext::new(AccountId::num(node), at(secs))
    }

    #[test]
    fn test_diligent_node_passes() {
        let screen = AwareNodeDiligenceScreen;
        assert_eq!(screen.screen(&accessor(), UNIQUE, &ctx(3, 5), &accounts()), None);
        assert_eq!(screen.screen(&accessor(), UNIQUE, &ctx(3, 120), &accounts()), None);
        assert_eq!(
            screen.screen(
                &accessor(),
                DuplicateClassification::Duplicate,
                &ctx(3, 5),
                &accounts()
            ),
            None
        );
    }

    #[test]
    fn test_failures_in_order() {
        let screen = AwareNodeDiligenceScreen;
        let ledger = accounts();

        assert_eq!(
            screen.screen(&accessor(), UNIQUE, &ctx(4, 5), &ledger),
            Some(ResponseCode::InvalidNodeAccount)
        );

        let mut unknown_node = accessor();
        unknown_node.node_account = AccountId::num(7);
        assert_eq!(
            screen.screen(&unknown_node, UNIQUE, &ctx(7, 5), &ledger),
            Some(ResponseCode::InvalidNodeAccount)
        );

        assert_eq!(
            screen.screen(
                &accessor(),
                DuplicateClassification::NodeDuplicate,
                &ctx(3, 5),
                &ledger
            ),
            Some(ResponseCode::DuplicateTransaction)
        );

        let mut unknown_payer = accessor();
        unknown_payer.txn_id.payer = AccountId::num(5555);
        assert_eq!(
            screen.screen(&unknown_payer, UNIQUE, &ctx(3, 5), &ledger),
            Some(ResponseCode::PayerAccountNotFound)
        );

        assert_eq!(
            screen.screen(&accessor(), UNIQUE, &ctx(3, -1), &ledger),
            Some(ResponseCode::InvalidTransactionStart)
        );
        assert_eq!(
            screen.screen(&accessor(), UNIQUE, &ctx(3, 121), &ledger),
            Some(ResponseCode::TransactionExpired)
        );
    }
}
