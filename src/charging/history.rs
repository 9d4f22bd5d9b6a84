//! Recent transaction-id history
//!
//! Remembers which transaction ids reached consensus recently, so a
//! resubmission can be classified as a duplicate.

use crate::txn::{AccountId, TransactionId};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Whether a transaction id was already handled within the history window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DuplicateClassification {
    BelievedUnique,
    /// Already handled, first submitted by some other node
    Duplicate,
    /// Already handled, and the same node submitted it before
    NodeDuplicate,
}

/// Lookup of recently handled transaction ids
pub trait DuplicateHistory {
    fn current_duplicity_for(
        &self,
        txn_id: &TransactionId,
        submitting_node: AccountId,
    ) -> DuplicateClassification;
}

/// One handled submission of a transaction id
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryRecord {
    pub submitting_node: AccountId,
    pub consensus_time: DateTime<Utc>,
    /// False when the submitting node failed due diligence on it
    pub classifiable: bool,
}

/// In-memory history of recently handled transaction ids
#[derive(Debug, Clone)]
pub struct TxnIdRecentHistory {
    window: Duration,
    records: HashMap<TransactionId, Vec<HistoryRecord>>,
}

impl TxnIdRecentHistory {
    /// History remembering submissions for `window_secs`
    ///
    /// A window too large for `chrono::Duration` is rejected.
    pub fn new(window_secs: i64) -> Option<Self> {
        let window = Duration::try_seconds(window_secs.max(0))?;
        Some(Self {
            window,
            records: HashMap::new(),
        })
    }

    /// Record a handled submission
    pub fn observe(
        &mut self,
        txn_id: TransactionId,
        submitting_node: AccountId,
        consensus_time: DateTime<Utc>,
        classifiable: bool,
    ) {
        self.records.entry(txn_id).or_default().push(HistoryRecord {
            submitting_node,
            consensus_time,
            classifiable,
        });
    }

    /// Forget submissions that fell out of the window as of `now`
    pub fn expire_before(&mut self, now: DateTime<Utc>) {
        let window = self.window;
        self.records.retain(|_, records| {
            // A window reaching past the end of time never expires
            records.retain(|record| match record.consensus_time.checked_add_signed(window) {
                Some(expiry) => expiry >= now,
                None => true,
            });
            !records.is_empty()
        });
    }

    /// Transaction ids with at least one remembered submission
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether nothing is remembered
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl DuplicateHistory for TxnIdRecentHistory {
    fn current_duplicity_for(
        &self,
        txn_id: &TransactionId,
        submitting_node: AccountId,
    ) -> DuplicateClassification {
        let mut classifiable = self
            .records
            .get(txn_id)
            .into_iter()
            .flatten()
            .filter(|record| record.classifiable)
            .peekable();

        if classifiable.peek().is_none() {
            return DuplicateClassification::BelievedUnique;
        }
        if classifiable.any(|record| record.submitting_node == submitting_node) {
            log::debug!("{} resubmitted by the same node {}", txn_id, submitting_node);
            DuplicateClassification::NodeDuplicate
        } else {
            log::debug!("{} already handled; resubmitted by node {}", txn_id, submitting_node);
            DuplicateClassification::Duplicate
        }
    }
}
