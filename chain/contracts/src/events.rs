//! Contract events
//!
//! Events are immutable records emitted by custody and registry operations.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use types::ids::{AccountId, CohortId};
use types::participant::ParticipantStatus;

/// Participant deposit pulled into custody
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositRecorded {
    pub cohort_id: CohortId,
    pub depositor: AccountId,
    pub amount: Decimal,
}

/// Participant deposit returned from custody
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawalRecorded {
    pub cohort_id: CohortId,
    pub depositor: AccountId,
    pub amount: Decimal,
}

/// Operator set the same status on a batch of participants
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusBatchApplied {
    pub cohort_id: CohortId,
    pub operator: AccountId,
    pub status: ParticipantStatus,
    pub participants: Vec<AccountId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paused {
    pub cohort_id: CohortId,
    pub operator: AccountId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unpaused {
    pub cohort_id: CohortId,
    pub operator: AccountId,
}

/// Registry created a new custody instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CohortCreated {
    pub cohort_id: CohortId,
    pub custody_account: AccountId,
}

/// Admin extracted funds from a finished cohort
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminFundsWithdrawn {
    pub cohort_id: CohortId,
    pub admin: AccountId,
    pub amount: Decimal,
    pub remaining_balance: Decimal,
}

/// Enum wrapper for all contract events, enabling uniform handling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContractEvent {
    DepositRecorded(DepositRecorded),
    WithdrawalRecorded(WithdrawalRecorded),
    StatusBatchApplied(StatusBatchApplied),
    Paused(Paused),
    Unpaused(Unpaused),
    CohortCreated(CohortCreated),
    AdminFundsWithdrawn(AdminFundsWithdrawn),
}
