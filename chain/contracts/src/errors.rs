//! Contract-specific error types
//!
//! Error taxonomy for custody, ledger, access control, configuration and
//! registry operations. Every variant carries the offending value so a
//! rejected call can be diagnosed without reproducing it.

use rust_decimal::Decimal;
use thiserror::Error;
use types::ids::{AccountId, CohortId, TokenId};
use types::participant::ParticipantStatus;

use crate::security::{Role, RoleScope};

/// Role check failures
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AccessError {
    #[error("Unauthorized: {principal} lacks role {role:?} in {scope}")]
    MissingRole {
        principal: AccountId,
        role: Role,
        scope: RoleScope,
    },

    #[error("Primary admin {admin} cannot be revoked")]
    PrimaryAdmin { admin: AccountId },

    #[error("Zero identity cannot hold a role")]
    ZeroIdentity,
}

/// External ledger transfer failures
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LedgerError {
    #[error("Insufficient balance for {account}: required {required}, available {available}")]
    InsufficientBalance {
        account: AccountId,
        required: Decimal,
        available: Decimal,
    },

    #[error("Insufficient allowance from {owner} to {spender}: required {required}, authorized {authorized}")]
    InsufficientAllowance {
        owner: AccountId,
        spender: AccountId,
        required: Decimal,
        authorized: Decimal,
    },

    #[error("Account frozen: {account}")]
    AccountFrozen { account: AccountId },

    #[error("Transfer amount must be positive, got {amount}")]
    InvalidAmount { amount: Decimal },

    #[error("Arithmetic overflow in balance calculation")]
    Overflow,
}

/// Cohort configuration errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Deposit amount must be positive, got {amount}")]
    InvalidDepositAmount { amount: Decimal },

    #[error("Cohort duration must be positive, got {secs}s")]
    InvalidDuration { secs: i64 },

    #[error("Deposit grace period must be non-negative, got {secs}s")]
    InvalidGracePeriod { secs: i64 },

    #[error("Deposit grace period {grace_secs}s must be shorter than cohort duration {duration_secs}s")]
    GraceExceedsDuration { grace_secs: i64, duration_secs: i64 },

    #[error("Token symbol must not be blank")]
    BlankToken,

    #[error("Operator cannot be the zero identity")]
    ZeroOperator,

    #[error("Schedule overflow: start {start} + {secs}s")]
    ScheduleOverflow { start: i64, secs: i64 },

    #[error("Invalid config document: {0}")]
    Parse(String),
}

/// Custody instance errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CustodyError {
    #[error("Custody is paused")]
    Paused,

    #[error("Custody is already paused")]
    AlreadyPaused,

    #[error("Custody is not paused")]
    NotPaused,

    #[error("Deposit window closed at {window_end}, now {now}")]
    DepositWindowClosed { window_end: i64, now: i64 },

    #[error("Cohort not finished: finishes at {finish_time}, now {now}")]
    CohortNotFinished { finish_time: i64, now: i64 },

    #[error("Incorrect deposit amount: expected {expected}, got {provided}")]
    IncorrectAmount { expected: Decimal, provided: Decimal },

    #[error("Insufficient authorization: required {required}, authorized {authorized}")]
    InsufficientAuthorization { required: Decimal, authorized: Decimal },

    #[error("Participant {participant} already deposited (status {status:?})")]
    AlreadyDeposited {
        participant: AccountId,
        status: ParticipantStatus,
    },

    #[error("Wrong status for {participant}: {status:?}")]
    WrongStatus {
        participant: AccountId,
        status: Option<ParticipantStatus>,
    },

    #[error("Withdrawal amount mismatch: recorded {expected}, requested {provided}")]
    AmountMismatch { expected: Decimal, provided: Decimal },

    #[error("Nothing to withdraw for {participant}")]
    NothingToWithdraw { participant: AccountId },

    #[error("Participant cannot be the zero identity")]
    ZeroParticipant,

    #[error("Zero identity at batch position {index}")]
    ZeroIdentity { index: usize },

    #[error("Empty batch: no participants listed")]
    EmptyBatch,

    #[error("Invalid transition for {participant}: {from:?} -> {to:?}")]
    InvalidTransition {
        participant: AccountId,
        from: Option<ParticipantStatus>,
        to: ParticipantStatus,
    },

    #[error("Ledger token mismatch: expected {expected}, got {actual}")]
    TokenMismatch { expected: TokenId, actual: TokenId },

    #[error("Amount must be positive, got {amount}")]
    InvalidAmount { amount: Decimal },

    #[error("Extraction of {requested} exceeds extractable {available}")]
    ExceedsExtractable {
        requested: Decimal,
        available: Decimal,
    },

    #[error("Arithmetic overflow in custody accounting")]
    Overflow,

    #[error("Access error: {0}")]
    Access(#[from] AccessError),

    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),
}

/// Registry errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RegistryError {
    #[error("Cohort not found: {cohort_id}")]
    CohortNotFound { cohort_id: CohortId },

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Custody error: {0}")]
    Custody(#[from] CustodyError),

    #[error("Access error: {0}")]
    Access(#[from] AccessError),
}
