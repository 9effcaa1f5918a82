//! Recipient registry and per-index adjustment slots
//!
//! Recipients and adjustments share a single index space. Every appended
//! recipient gets an inactive adjustment slot at the same index, and neither
//! vector ever shrinks, so an index stays valid for the life of the registry.

use crate::errors::{DistributorError, Result};
use crate::types::{
    AdjustmentRecord, AdjustmentStep, Direction, Identity, Rate, RecipientRecord,
    GUARDIAN_STEP_DENOM, GUARDIAN_STEP_NUMER,
};
use serde::{Deserialize, Serialize};

/// Largest step a guardian may schedule against `rate` (2.5%, truncated).
pub fn guardian_step_limit(rate: Rate) -> Rate {
    ((rate as u128) * GUARDIAN_STEP_NUMER / GUARDIAN_STEP_DENOM) as Rate
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipientRegistry {
    recipients: Vec<RecipientRecord>,
    adjustments: Vec<AdjustmentRecord>,
}

/// Serializable view of one registry slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotSnapshot {
    pub index: usize,
    pub recipient: RecipientRecord,
    pub adjustment: AdjustmentRecord,
}

impl RecipientRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.recipients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recipients.is_empty()
    }

    fn check_index(&self, index: usize) -> Result<()> {
        if index >= self.recipients.len() {
            return Err(DistributorError::IndexOutOfRange {
                index,
                len: self.recipients.len(),
            });
        }
        Ok(())
    }

    /// Append a recipient and return its index.
    pub fn push(&mut self, record: RecipientRecord) -> usize {
        self.recipients.push(record);
        self.adjustments.push(AdjustmentRecord::default());
        debug_assert_eq!(self.recipients.len(), self.adjustments.len());
        self.recipients.len() - 1
    }

    pub fn get(&self, index: usize) -> Result<&RecipientRecord> {
        self.check_index(index)?;
        Ok(&self.recipients[index])
    }

    pub fn adjustment(&self, index: usize) -> Result<&AdjustmentRecord> {
        self.check_index(index)?;
        Ok(&self.adjustments[index])
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &RecipientRecord)> {
        self.recipients.iter().enumerate()
    }

    /// Logically remove the recipient at `index`.
    ///
    /// The slot keeps its index and its adjustment record; only identity and
    /// rate are zeroed. Returns the record that was removed.
    pub fn remove(&mut self, index: usize, expected: &Identity) -> Result<RecipientRecord> {
        self.check_index(index)?;
        let slot = &mut self.recipients[index];
        if slot.recipient != *expected {
            return Err(DistributorError::RecipientMismatch {
                index,
                expected: slot.recipient,
                supplied: *expected,
            });
        }
        Ok(std::mem::replace(slot, RecipientRecord::new(Identity::ZERO, 0)))
    }

    /// Replace the adjustment at `index` wholesale, returning the previous one.
    pub fn set_adjustment(
        &mut self,
        index: usize,
        adjustment: AdjustmentRecord,
    ) -> Result<AdjustmentRecord> {
        self.check_index(index)?;
        Ok(std::mem::replace(&mut self.adjustments[index], adjustment))
    }

    /// Apply one step of the pending adjustment at `index`.
    ///
    /// Returns `None` when the slot has no active adjustment. The rate may land
    /// past the target by less than one step; the adjustment then disables.
    /// Decreases saturate at zero.
    pub fn adjust(&mut self, index: usize) -> Option<AdjustmentStep> {
        let adjustment = *self.adjustments.get(index)?;
        if !adjustment.is_active() {
            return None;
        }

        let record = &mut self.recipients[index];
        let from = record.rate;
        let converged = match adjustment.direction {
            Direction::Increase => {
                record.rate = record.rate.saturating_add(adjustment.step);
                record.rate >= adjustment.target
            }
            Direction::Decrease => {
                record.rate = record.rate.saturating_sub(adjustment.step);
                record.rate <= adjustment.target
            }
        };

        if converged {
            self.adjustments[index].step = 0;
        }

        Some(AdjustmentStep {
            index,
            from,
            to: record.rate,
            converged,
        })
    }

    /// Rate of the last record registered under `identity`.
    pub fn last_rate_for(&self, identity: &Identity) -> Option<Rate> {
        self.recipients
            .iter()
            .rev()
            .find(|record| record.recipient == *identity)
            .map(|record| record.rate)
    }

    pub fn active_count(&self) -> usize {
        self.recipients.iter().filter(|r| r.is_active()).count()
    }

    pub fn pending_adjustments(&self) -> usize {
        self.adjustments.iter().filter(|a| a.is_active()).count()
    }

    pub fn snapshot(&self) -> Vec<SlotSnapshot> {
        self.recipients
            .iter()
            .zip(self.adjustments.iter())
            .enumerate()
            .map(|(index, (recipient, adjustment))| SlotSnapshot {
                index,
                recipient: *recipient,
                adjustment: *adjustment,
            })
            .collect()
    }
}
