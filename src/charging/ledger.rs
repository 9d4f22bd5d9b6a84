//! Fee charging against account balances
//!
//! `ChargeExecutor` is the seam to the real ledger. `InMemoryLedger` backs
//! tests and the operator CLI.

use crate::txn::AccountId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Account not found: {0}")]
    AccountNotFound(AccountId),
    #[error("Account {account} cannot pay {required} tinybars (balance {available})")]
    InsufficientBalance {
        account: AccountId,
        required: u64,
        available: u64,
    },
    #[error("Balance overflow")]
    Overflow,
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

/// One fee debit and its credits
///
/// `to_node` goes to `node_account`, `to_funding` to the funding account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Charge {
    pub debit: AccountId,
    pub node_account: AccountId,
    pub to_node: u64,
    pub to_funding: u64,
}

impl Charge {
    /// Amount debited, or `None` on overflow
    pub fn total(&self) -> Option<u64> {
        self.to_node.checked_add(self.to_funding)
    }
}

/// Accounts the charging policies can read and debit
pub trait ChargeExecutor {
    fn account_exists(&self, account: AccountId) -> bool;

    fn balance(&self, account: AccountId) -> Option<u64>;

    /// Apply a charge atomically: either every transfer happens or none does
    fn charge(&mut self, charge: &Charge) -> Result<(), LedgerError>;
}

/// Account balances held in memory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InMemoryLedger {
    funding_account: AccountId,
    balances: BTreeMap<AccountId, u64>,
}

impl InMemoryLedger {
    /// Ledger holding only the funding account, at zero
    pub fn new(funding_account: AccountId) -> Self {
        let mut balances = BTreeMap::new();
        balances.insert(funding_account, 0);
        Self {
            funding_account,
            balances,
        }
    }

    /// Account credited with network and service fees
    pub fn funding_account(&self) -> AccountId {
        self.funding_account
    }

    /// Create or overwrite an account balance
    pub fn set_balance(&mut self, account: AccountId, balance: u64) {
        self.balances.insert(account, balance);
    }

    /// Every balance, ordered by account
    pub fn balances(&self) -> &BTreeMap<AccountId, u64> {
        &self.balances
    }

    /// Load balances from a JSON file
    pub fn load(path: &Path) -> Result<Self, LedgerError> {
        let file = fs::File::open(path)?;
        let reader = BufReader::new(file);
        let mut ledger: Self = serde_json::from_reader(reader)?;
        ledger.balances.entry(ledger.funding_account).or_insert(0);
        Ok(ledger)
    }

    /// Save balances to a JSON file
    pub fn save(&self, path: &Path) -> Result<(), LedgerError> {
        let temp_path = path.with_extension("tmp");
        let file = fs::File::create(&temp_path)?;
        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)?;
        fs::rename(&temp_path, path)?;
        Ok(())
    }

    fn stage_credit(
        &self,
        staged: &mut BTreeMap<AccountId, u64>,
        account: AccountId,
        amount: u64,
    ) -> Result<(), LedgerError> {
        if amount == 0 {
            return Ok(());
        }
        let current = match staged.get(&account) {
            Some(balance) => *balance,
            None => self
                .balance(account)
                .ok_or(LedgerError::AccountNotFound(account))?,
        };
        let updated = current.checked_add(amount).ok_or(LedgerError::Overflow)?;
        staged.insert(account, updated);
        Ok(())
    }
}

impl ChargeExecutor for InMemoryLedger {
    fn account_exists(&self, account: AccountId) -> bool {
        self.balances.contains_key(&account)
    }

    fn balance(&self, account: AccountId) -> Option<u64> {
        self.balances.get(&account).copied()
    }

    fn charge(&mut self, charge: &Charge) -> Result<(), LedgerError> {
        let required = charge.total().ok_or(LedgerError::Overflow)?;
        let available = self
            .balance(charge.debit)
            .ok_or(LedgerError::AccountNotFound(charge.debit))?;
        if available < required {
            return Err(LedgerError::InsufficientBalance {
                account: charge.debit,
                required,
                available,
            });
        }

        let mut staged = BTreeMap::new();
        staged.insert(charge.debit, available - required);
        self.stage_credit(&mut staged, charge.node_account, charge.to_node)?;
        self.stage_credit(&mut staged, self.funding_account, charge.to_funding)?;

        self.balances.extend(staged);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const FUNDING: AccountId = AccountId::num(98);
    const NODE: AccountId = AccountId::num(3);
    const PAYER: AccountId = AccountId::num(1001);

    fn ledger() -> InMemoryLedger {
        let mut ledger = InMemoryLedger::new(FUNDING);
        ledger.set_balance(NODE, 0);
        ledger.set_balance(PAYER, 1_000);
        ledger
    }

    fn charge(to_node: u64, to_funding: u64) -> Charge {
        Charge {
            debit: PAYER,
            node_account: NODE,
            to_node,
            to_funding,
        }
    }

    #[test]
    fn test_charge_moves_balances() {
        let mut ledger = ledger();
        ledger.charge(&charge(100, 250)).unwrap();

        assert_eq!(ledger.balance(PAYER), Some(650));
        assert_eq!(ledger.balance(NODE), Some(100));
        assert_eq!(ledger.balance(FUNDING), Some(250));
    }

    #[test]
    fn test_insufficient_balance_changes_nothing() {
        let mut ledger = ledger();
        let before = ledger.clone();

        let err = ledger.charge(&charge(600, 600)).unwrap_err();
        assert!(matches!(
            err,
            LedgerError::InsufficientBalance {
                required: 1_200,
                available: 1_000,
                ..
            }
        ));
        assert_eq!(ledger, before);
    }

    #[test]
    fn test_missing_credit_account_changes_nothing() {
        let mut ledger = ledger();
        let before = ledger.clone();
        let mut charge = charge(10, 10);
        charge.node_account = AccountId::num(7);

        assert!(matches!(
            ledger.charge(&charge),
            Err(LedgerError::AccountNotFound(id)) if id == AccountId::num(7)
        ));
        assert_eq!(ledger, before);
    }

    #[test]
    fn test_self_credit() {
        let mut ledger = ledger();
        let charge = Charge {
            debit: PAYER,
            node_account: PAYER,
            to_node: 100,
            to_funding: 0,
        };
        ledger.charge(&charge).unwrap();
        assert_eq!(ledger.balance(PAYER), Some(1_000));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ledger.json");
        let ledger = ledger();
        ledger.save(&path).unwrap();

        let loaded = InMemoryLedger::load(&path).unwrap();
        assert_eq!(loaded, ledger);
        assert!(loaded.account_exists(FUNDING));
        assert!(!loaded.account_exists(AccountId::num(2)));
    }
}
