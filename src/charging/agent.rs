//! Transaction charging agent
//!
//! Computes a handled transaction's fee and picks exactly one charging
//! policy, in a fixed order:
//!
//! 1. No assessor or no computable fee: nothing is charged
//! 2. Submitting node failed due diligence, including resubmitting a
//!    transaction it already submitted: the node pays the node fee
//! 3. Duplicate from another node: the payer pays node and network fees
//! 4. Otherwise the payer pays everything, or the transaction fails

use crate::calc::FeeObject;
use crate::charging::diligence::{AwareNodeDiligenceScreen, NodeDiligenceScreen};
use crate::charging::history::{DuplicateClassification, DuplicateHistory};
use crate::charging::ledger::ChargeExecutor;
use crate::charging::policy::{ChargingPolicy, FeeChargingPolicy};
use crate::fees::UsageBasedFeeCalculator;
use crate::resource::UsageAccumulator;
use crate::txn::{AccountId, ResponseCode, TxnAccessor};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::Arc;

/// Consensus facts about the transaction being handled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandleContext {
    pub submitting_node: AccountId,
    pub consensus_time: DateTime<Utc>,
}

impl HandleContext {
    /// Context of a transaction submitted by `submitting_node`
    pub fn new(submitting_node: AccountId, consensus_time: DateTime<Utc>) -> Self {
        Self {
            submitting_node,
            consensus_time,
        }
    }
}

/// Result of charging one transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PolicyOutcome {
    /// Whether the transaction itself should now be executed
    pub proceed: bool,
    pub status: ResponseCode,
    pub fees: Option<FeeObject>,
    pub policy: Option<ChargingPolicy>,
}

impl PolicyOutcome {
    fn halted(status: ResponseCode) -> Self {
        Self {
            proceed: false,
            status,
            fees: None,
            policy: None,
        }
    }

    fn charged(status: ResponseCode, fees: FeeObject, policy: ChargingPolicy) -> Self {
        Self {
            proceed: policy == ChargingPolicy::Full && status.is_ok(),
            status,
            fees: Some(fees),
            policy: Some(policy),
        }
    }
}

/// Charges fees on the single-threaded handle path
pub struct TxnChargingPolicyAgent {
    calculator: Arc<UsageBasedFeeCalculator>,
    policy: FeeChargingPolicy,
    screen: Box<dyn NodeDiligenceScreen>,
    handle_scoped: UsageAccumulator,
}

impl TxnChargingPolicyAgent {
    /// Agent screening nodes with `AwareNodeDiligenceScreen`
    pub fn new(calculator: Arc<UsageBasedFeeCalculator>) -> Self {
        Self::with_screen(calculator, Box::new(AwareNodeDiligenceScreen))
    }

    /// Agent with a custom due-diligence screen
    pub fn with_screen(
        calculator: Arc<UsageBasedFeeCalculator>,
        screen: Box<dyn NodeDiligenceScreen>,
    ) -> Self {
        Self {
            calculator,
            policy: FeeChargingPolicy::new(),
            screen,
            handle_scoped: UsageAccumulator::new(),
        }
    }

    /// Never charge the given payers
    pub fn with_exempt_payers(mut self, exempt_payers: BTreeSet<AccountId>) -> Self {
        self.policy = FeeChargingPolicy::with_exempt_payers(exempt_payers);
        self
    }

    /// Usage assessed for the most recently handled transaction
    pub fn last_usage(&self) -> &UsageAccumulator {
        &self.handle_scoped
    }

    /// Compute the fee of `accessor` and charge it under the right policy
    pub fn compute_and_apply_fee(
        &mut self,
        accessor: &TxnAccessor,
        ctx: &HandleContext,
        history: &dyn DuplicateHistory,
        ledger: &mut dyn ChargeExecutor,
    ) -> PolicyOutcome {
        if !self.calculator.supports(accessor.function) {
            log::debug!("{} is not supported", accessor.function);
            return PolicyOutcome::halted(ResponseCode::NotSupported);
        }

        let fees = match self
            .calculator
            .compute_fee(accessor, &mut self.handle_scoped)
        {
            Ok(fees) => fees,
            Err(e) => {
                log::warn!("Could not compute fee for {}: {}", accessor.txn_id, e);
                return PolicyOutcome::halted(e.response_code());
            }
        };

        let duplicity = history.current_duplicity_for(&accessor.txn_id, ctx.submitting_node);
        let node = ctx.submitting_node;

        let screened = self.screen.screen(accessor, duplicity, ctx, &*ledger);
        let (status, policy) = if let Some(reason) = screened {
            let status = self
                .policy
                .apply_for_ignored_due_diligence(accessor, node, &fees, reason, ledger);
            (status, ChargingPolicy::IgnoredDueDiligence)
        } else if duplicity != DuplicateClassification::BelievedUnique {
            let status = self.policy.apply_for_duplicate(accessor, node, &fees, ledger);
            (status, ChargingPolicy::Duplicate)
        } else {
            let status = self.policy.apply(accessor, node, &fees, ledger);
            (status, ChargingPolicy::Full)
        };

        log::debug!(
            "Charged {} under {} policy: {}",
            accessor.txn_id,
            policy,
            status
        );
        PolicyOutcome::charged(status, fees, policy)
    }
}
