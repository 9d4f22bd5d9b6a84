//! Published schedule snapshot

use crate::schedule::entry::FeeSchedule;
use crate::schedule::error::CalibrationError;
use parking_lot::RwLock;
use std::sync::Arc;

/// Holds the currently published fee schedule
///
/// Readers take an `Arc` snapshot once per computation, so a concurrent
/// publish never changes prices halfway through a fee calculation.
#[derive(Debug, Default)]
pub struct ScheduleStore {
    current: RwLock<Arc<FeeSchedule>>,
}

impl ScheduleStore {
    /// Store publishing `schedule` from the start
    pub fn new(schedule: FeeSchedule) -> Self {
        Self {
            current: RwLock::new(Arc::new(schedule)),
        }
    }

    /// Snapshot of the published schedule
    pub fn current(&self) -> Arc<FeeSchedule> {
        Arc::clone(&self.current.read())
    }

    /// Replace the published schedule, returning its digest
    pub fn publish(&self, schedule: FeeSchedule) -> Result<String, CalibrationError> {
        let digest = schedule.digest()?;
        let entries = schedule.len();
        *self.current.write() = Arc::new(schedule);
        log::info!("Published fee schedule {} ({} entries)", digest, entries);
        Ok(digest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::entry::FeeData;
    use crate::txn::{Operation, SubType};

    #[test]
    fn test_publish_swaps_snapshot() {
        let store = ScheduleStore::default();
        let before = store.current();
        assert!(before.is_empty());

        let mut schedule = FeeSchedule::new();
        schedule.insert(Operation::CryptoTransfer, SubType::Default, FeeData::default());
        let digest = store.publish(schedule.clone()).unwrap();

        assert_eq!(digest, schedule.digest().unwrap());
        assert_eq!(store.current().len(), 1);
        // Snapshots taken before the publish are unaffected
        assert!(before.is_empty());
    }
}
