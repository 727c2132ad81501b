//! Participant lifecycle types
//!
//! A participant record is created on first deposit (or when an operator
//! judges a participant who never deposited) and is never deleted. Status
//! only moves forward:
//!
//! ```text
//! InProgress -> Withdrawable -> Completed
//! InProgress -> Failed
//! ```

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Participant status within one cohort
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParticipantStatus {
    /// Deposit held, cohort outcome not yet decided
    InProgress,
    /// Passed; deposit may be withdrawn by the participant
    Withdrawable,
    /// Deposit returned to the participant
    Completed,
    /// Did not pass; deposit is forfeited
    Failed,
}

impl ParticipantStatus {
    /// Terminal statuses admit no further transition.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ParticipantStatus::Completed | ParticipantStatus::Failed)
    }

    /// Whether an operator may move a participant from `from` to `self`.
    ///
    /// `from == None` means the participant has no record yet. Re-applying
    /// the current status is accepted so repeated batches stay harmless.
    pub fn can_be_set_from(&self, from: Option<ParticipantStatus>) -> bool {
        use ParticipantStatus::*;
        match (from, self) {
            (None | Some(InProgress), Withdrawable | Failed) => true,
            (Some(Withdrawable), Withdrawable) => true,
            (Some(Failed), Failed) => true,
            _ => false,
        }
    }
}

/// Per-participant custody record
///
/// Invariant: `deposited_amount > 0` only while status is `InProgress` or
/// `Withdrawable`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantRecord {
    pub deposited_amount: Decimal,
    pub status: ParticipantStatus,
}

impl ParticipantRecord {
    /// Record created by a successful deposit.
    pub fn deposited(amount: Decimal) -> Self {
        Self {
            deposited_amount: amount,
            status: ParticipantStatus::InProgress,
        }
    }

    /// Record created by an operator judging a participant who never deposited.
    pub fn judged(status: ParticipantStatus) -> Self {
        Self {
            deposited_amount: Decimal::ZERO,
            status,
        }
    }

    /// Amount still owed back to the participant.
    pub fn owed(&self) -> Decimal {
        match self.status {
            ParticipantStatus::InProgress | ParticipantStatus::Withdrawable => {
                self.deposited_amount
            }
            ParticipantStatus::Completed | ParticipantStatus::Failed => Decimal::ZERO,
        }
    }

    /// Check record invariant
    pub fn check_invariant(&self) -> bool {
        self.deposited_amount >= Decimal::ZERO
            && (self.deposited_amount.is_zero() || !self.status.is_terminal())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ParticipantStatus::*;

    #[test]
    fn test_forward_transitions_allowed() {
        assert!(Withdrawable.can_be_set_from(Some(InProgress)));
        assert!(Failed.can_be_set_from(Some(InProgress)));
        assert!(Failed.can_be_set_from(None));
        assert!(Withdrawable.can_be_set_from(None));
    }

    #[test]
    fn test_reapplying_same_status_allowed() {
        assert!(Withdrawable.can_be_set_from(Some(Withdrawable)));
        assert!(Failed.can_be_set_from(Some(Failed)));
    }

    #[test]
    fn test_backward_transitions_rejected() {
        assert!(!Failed.can_be_set_from(Some(Withdrawable)));
        assert!(!Withdrawable.can_be_set_from(Some(Failed)));
        assert!(!Withdrawable.can_be_set_from(Some(Completed)));
        assert!(!Failed.can_be_set_from(Some(Completed)));
        assert!(!InProgress.can_be_set_from(Some(Withdrawable)));
        assert!(!Completed.can_be_set_from(Some(Withdrawable)));
    }

    #[test]
    fn test_owed_by_status() {
        let mut record = ParticipantRecord::deposited(Decimal::from(100));
        assert_eq!(record.owed(), Decimal::from(100));
        record.status = Withdrawable;
        assert_eq!(record.owed(), Decimal::from(100));
        record.status = Failed;
        assert_eq!(record.owed(), Decimal::ZERO);
    }

    #[test]
    fn test_invariant_rejects_balance_in_terminal_status() {
        let record = ParticipantRecord {
            deposited_amount: Decimal::from(5),
            status: Completed,
        };
        assert!(!record.check_invariant());
        assert!(ParticipantRecord::judged(Failed).check_invariant());
    }

    #[test]
    fn test_status_serialization() {
        let json = serde_json::to_string(&Withdrawable).unwrap();
        assert_eq!(json, "\"withdrawable\"");
    }
}
