//! Custody Instance — per-cohort deposit ledger and lifecycle state machine
//!
//! One instance holds every participant deposit of one cohort:
//! - Deposit intake while the deposit window is open
//! - Operator batch judgement (withdrawable / failed) once the cohort finished
//! - Participant withdrawal of a withdrawable deposit
//! - Operator pause control gating deposit and withdrawal
//! - Admin extraction of funds no participant can still claim
//!
//! Every state-changing operation validates first, then mutates its own
//! state, then calls the external ledger. A ledger failure rolls the state
//! change back before the error is returned, so no partial effect survives.
//!
//! Mutating calls take `&mut self`. A ledger cannot call back into the
//! instance while one of them runs, so no runtime reentrancy lock is kept.

use rust_decimal::Decimal;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;
use tracing::{info, warn};
use types::ids::{AccountId, CohortId, TokenId};
use types::participant::{ParticipantRecord, ParticipantStatus};

use crate::commitment::{root_hex, CustodySnapshot};
use crate::config::{CohortConfig, ExtractionPolicy};
use crate::errors::{ConfigError, CustodyError};
use crate::events::{
    ContractEvent, DepositRecorded, Paused, StatusBatchApplied, Unpaused, WithdrawalRecorded,
};
use crate::ledger::TokenLedger;
use crate::schedule::{Schedule, Stage};
use crate::security::{require_role, PauseGuard, Role, RoleRegistry, RoleScope};

/// Custody state machine for one cohort.
///
/// Role checks are delegated to a shared [`RoleRegistry`] in this cohort's
/// scope; the external ledger is passed into each call that moves value and
/// must match the instance's token.
pub struct CustodyInstance {
    cohort_id: CohortId,
    /// Ledger account holding every deposit of this cohort
    custody_account: AccountId,
    deposit_amount: Decimal,
    token: TokenId,
    schedule: Schedule,
    extraction_policy: ExtractionPolicy,
    roles: Arc<dyn RoleRegistry>,
    participants: HashMap<AccountId, ParticipantRecord>,
    /// Deposits of failed participants not yet extracted by an admin
    forfeited: Decimal,
    pause_guard: PauseGuard,
    /// Emitted events log (append-only)
    events: Vec<ContractEvent>,
}

impl fmt::Debug for CustodyInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustodyInstance")
            .field("cohort_id", &self.cohort_id)
            .field("custody_account", &self.custody_account)
            .field("deposit_amount", &self.deposit_amount)
            .field("token", &self.token)
            .field("schedule", &self.schedule)
            .field("participants", &self.participants.len())
            .field("paused", &self.pause_guard.is_paused())
            .finish()
    }
}

impl CustodyInstance {
    /// Create the custody instance for a cohort starting at `now`.
    pub fn new(
        cohort_id: CohortId,
        custody_account: AccountId,
        config: &CohortConfig,
        roles: Arc<dyn RoleRegistry>,
        now: i64,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let schedule = Schedule::from_config(config, now)?;

        info!(
            cohort = %cohort_id,
            custody_account = %custody_account,
            deposit_amount = %config.deposit_amount,
            token = %config.token,
            deposit_window_end = schedule.deposit_window_end(),
            finish_time = schedule.finish_time(),
            "Custody instance created"
        );

        Ok(Self {
            cohort_id,
            custody_account,
            deposit_amount: config.deposit_amount,
            token: config.token.clone(),
            schedule,
            extraction_policy: config.extraction_policy,
            roles,
            participants: HashMap::new(),
            forfeited: Decimal::ZERO,
            pause_guard: PauseGuard::new(),
            events: Vec::new(),
        })
    }

    // ───────────────────────── Deposit ─────────────────────────

    /// Pull exactly `deposit_amount` from `participant` into custody.
    ///
    /// Validates: not paused, deposit window open, non-zero participant,
    /// exact amount, matching ledger, no prior record, sufficient allowance
    /// granted to the custody account. Emits `DepositRecorded`.
    pub fn deposit<L: TokenLedger + ?Sized>(
        &mut self,
        ledger: &mut L,
        participant: AccountId,
        amount: Decimal,
        now: i64,
    ) -> Result<ContractEvent, CustodyError> {
        self.check_not_paused()?;
        self.schedule.ensure_deposit_open(now)?;
        if participant.is_nil() {
            return Err(CustodyError::ZeroParticipant);
        }
        if amount != self.deposit_amount {
            return Err(CustodyError::IncorrectAmount {
                expected: self.deposit_amount,
                provided: amount,
            });
        }
        self.check_token(ledger)?;
        if let Some(record) = self.participants.get(&participant) {
            return Err(CustodyError::AlreadyDeposited {
                participant,
                status: record.status,
            });
        }
        let authorized = ledger.allowance(&participant, &self.custody_account);
        if authorized < amount {
            return Err(CustodyError::InsufficientAuthorization {
                required: amount,
                authorized,
            });
        }

        self.participants
            .insert(participant, ParticipantRecord::deposited(amount));

        let custody = self.custody_account;
        if let Err(err) = ledger.transfer_from(&custody, &participant, &custody, amount) {
            self.participants.remove(&participant);
            warn!(cohort = %self.cohort_id, depositor = %participant, error = %err, "Deposit pull failed, rolled back");
            return Err(err.into());
        }

        info!(cohort = %self.cohort_id, depositor = %participant, amount = %amount, "Deposit recorded");
        Ok(self.emit(ContractEvent::DepositRecorded(DepositRecorded {
            cohort_id: self.cohort_id,
            depositor: participant,
            amount,
        })))
    }

    // ───────────────────────── Withdrawal ─────────────────────────

    /// Return a withdrawable deposit to its participant.
    ///
    /// `amount` must equal the recorded deposit. The record is marked
    /// `Completed` before the ledger push, so a second call can never see it
    /// as withdrawable. Emits `WithdrawalRecorded`.
    pub fn withdraw<L: TokenLedger + ?Sized>(
        &mut self,
        ledger: &mut L,
        participant: AccountId,
        amount: Decimal,
    ) -> Result<ContractEvent, CustodyError> {
        self.check_not_paused()?;
        self.check_token(ledger)?;

        let prior = match self.participants.get(&participant) {
            Some(record) if record.status == ParticipantStatus::Withdrawable => record.clone(),
            other => {
                return Err(CustodyError::WrongStatus {
                    participant,
                    status: other.map(|r| r.status),
                })
            }
        };
        if prior.deposited_amount.is_zero() {
            return Err(CustodyError::NothingToWithdraw { participant });
        }
        if amount != prior.deposited_amount {
            return Err(CustodyError::AmountMismatch {
                expected: prior.deposited_amount,
                provided: amount,
            });
        }

        self.participants.insert(
            participant,
            ParticipantRecord {
                deposited_amount: Decimal::ZERO,
                status: ParticipantStatus::Completed,
            },
        );

        let custody = self.custody_account;
        if let Err(err) = ledger.transfer(&custody, &participant, amount) {
            self.participants.insert(participant, prior);
            warn!(cohort = %self.cohort_id, depositor = %participant, error = %err, "Withdrawal push failed, rolled back");
            return Err(err.into());
        }

        info!(cohort = %self.cohort_id, depositor = %participant, amount = %amount, "Withdrawal recorded");
        Ok(self.emit(ContractEvent::WithdrawalRecorded(WithdrawalRecorded {
            cohort_id: self.cohort_id,
            depositor: participant,
            amount,
        })))
    }

    // ───────────────────────── Batch Status ─────────────────────────

    /// Mark every listed participant withdrawable. Operator-only, finished stage.
    pub fn allow_withdraw_batch(
        &mut self,
        caller: &AccountId,
        participants: &[AccountId],
        now: i64,
    ) -> Result<ContractEvent, CustodyError> {
        self.apply_status_batch(caller, participants, ParticipantStatus::Withdrawable, now)
    }

    /// Mark every listed participant failed, forfeiting their deposits.
    /// Operator-only, finished stage.
    pub fn mark_failed_batch(
        &mut self,
        caller: &AccountId,
        participants: &[AccountId],
        now: i64,
    ) -> Result<ContractEvent, CustodyError> {
        self.apply_status_batch(caller, participants, ParticipantStatus::Failed, now)
    }

    /// Validate the whole batch, then apply it. Either every listed
    /// participant gets `status` or none changes.
    fn apply_status_batch(
        &mut self,
        caller: &AccountId,
        participants: &[AccountId],
        status: ParticipantStatus,
        now: i64,
    ) -> Result<ContractEvent, CustodyError> {
        self.check_operator(caller)?;
        self.schedule.ensure_finished(now)?;
        if participants.is_empty() {
            return Err(CustodyError::EmptyBatch);
        }

        let mut seen = HashSet::with_capacity(participants.len());
        let mut forfeited = self.forfeited;
        for (index, participant) in participants.iter().enumerate() {
            if participant.is_nil() {
                return Err(CustodyError::ZeroIdentity { index });
            }
            let from = self.participants.get(participant).map(|r| r.status);
            if !status.can_be_set_from(from) {
                return Err(CustodyError::InvalidTransition {
                    participant: *participant,
                    from,
                    to: status,
                });
            }
            if status == ParticipantStatus::Failed && seen.insert(*participant) {
                forfeited = forfeited
                    .checked_add(self.deposited_of(participant))
                    .ok_or(CustodyError::Overflow)?;
            }
        }

        for participant in participants {
            let record = self
                .participants
                .entry(*participant)
                .or_insert_with(|| ParticipantRecord::judged(status));
            record.status = status;
            if status == ParticipantStatus::Failed {
                record.deposited_amount = Decimal::ZERO;
            }
        }
        self.forfeited = forfeited;

        info!(
            cohort = %self.cohort_id,
            operator = %caller,
            status = ?status,
            count = participants.len(),
            state_root = %root_hex(&self.state_root()),
            "Status batch applied"
        );
        Ok(self.emit(ContractEvent::StatusBatchApplied(StatusBatchApplied {
            cohort_id: self.cohort_id,
            operator: *caller,
            status,
            participants: participants.to_vec(),
        })))
    }

    // ───────────────────────── Pause ─────────────────────────

    /// Stop deposits and withdrawals until an operator unpauses. Operator-only.
    pub fn pause(&mut self, caller: &AccountId) -> Result<ContractEvent, CustodyError> {
        self.check_operator(caller)?;
        if self.pause_guard.is_paused() {
            return Err(CustodyError::AlreadyPaused);
        }
        self.pause_guard.pause();
        warn!(cohort = %self.cohort_id, operator = %caller, "Custody paused");
        Ok(self.emit(ContractEvent::Paused(Paused {
            cohort_id: self.cohort_id,
            operator: *caller,
        })))
    }

    /// Resume deposits and withdrawals. Operator-only.
    pub fn unpause(&mut self, caller: &AccountId) -> Result<ContractEvent, CustodyError> {
        self.check_operator(caller)?;
        if !self.pause_guard.is_paused() {
            return Err(CustodyError::NotPaused);
        }
        self.pause_guard.unpause();
        info!(cohort = %self.cohort_id, operator = %caller, "Custody unpaused");
        Ok(self.emit(ContractEvent::Unpaused(Unpaused {
            cohort_id: self.cohort_id,
            operator: *caller,
        })))
    }

    pub fn is_paused(&self) -> bool {
        self.pause_guard.is_paused()
    }

    // ───────────────────────── Admin Extraction ─────────────────────────

    /// Send `amount` of unclaimable custody funds to the calling admin.
    ///
    /// Admin-only, finished stage, bounded by the instance's
    /// [`ExtractionPolicy`]. Returns the custodial balance left afterwards.
    pub fn withdraw_admin<L: TokenLedger + ?Sized>(
        &mut self,
        ledger: &mut L,
        caller: &AccountId,
        amount: Decimal,
        now: i64,
    ) -> Result<Decimal, CustodyError> {
        require_role(self.roles.as_ref(), caller, Role::Admin, self.scope())?;
        self.schedule.ensure_finished(now)?;
        self.check_token(ledger)?;
        if amount <= Decimal::ZERO {
            return Err(CustodyError::InvalidAmount { amount });
        }
        let available = self.extractable(ledger);
        if amount > available {
            return Err(CustodyError::ExceedsExtractable {
                requested: amount,
                available,
            });
        }

        let prior_forfeited = self.forfeited;
        self.forfeited = (self.forfeited - amount).max(Decimal::ZERO);

        let custody = self.custody_account;
        if let Err(err) = ledger.transfer(&custody, caller, amount) {
            self.forfeited = prior_forfeited;
            warn!(cohort = %self.cohort_id, admin = %caller, error = %err, "Admin extraction failed, rolled back");
            return Err(err.into());
        }

        let remaining = ledger.balance_of(&custody);
        info!(
            cohort = %self.cohort_id,
            admin = %caller,
            amount = %amount,
            remaining = %remaining,
            "Admin funds withdrawn"
        );
        Ok(remaining)
    }

    /// Amount an admin could extract right now under the extraction policy.
    pub fn extractable<L: TokenLedger + ?Sized>(&self, ledger: &L) -> Decimal {
        let balance = ledger.balance_of(&self.custody_account);
        let unclaimed = (balance - self.total_owed()).max(Decimal::ZERO);
        match self.extraction_policy {
            ExtractionPolicy::UnclaimedOnly => unclaimed,
            ExtractionPolicy::ForfeitedOnly => unclaimed.min(self.forfeited),
        }
    }

    // ───────────────────────── Queries ─────────────────────────

    pub fn cohort_id(&self) -> CohortId {
        self.cohort_id
    }

    pub fn custody_account(&self) -> AccountId {
        self.custody_account
    }

    pub fn deposit_amount(&self) -> Decimal {
        self.deposit_amount
    }

    pub fn token(&self) -> &TokenId {
        &self.token
    }

    pub fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    pub fn extraction_policy(&self) -> ExtractionPolicy {
        self.extraction_policy
    }

    pub fn stage(&self, now: i64) -> Stage {
        self.schedule.stage_at(now)
    }

    pub fn participant(&self, participant: &AccountId) -> Option<&ParticipantRecord> {
        self.participants.get(participant)
    }

    pub fn status_of(&self, participant: &AccountId) -> Option<ParticipantStatus> {
        self.participants.get(participant).map(|r| r.status)
    }

    /// Recorded deposit, zero when never deposited, withdrawn or forfeited.
    pub fn deposited_of(&self, participant: &AccountId) -> Decimal {
        self.participants
            .get(participant)
            .map(|r| r.deposited_amount)
            .unwrap_or(Decimal::ZERO)
    }

    pub fn participant_count(&self) -> usize {
        self.participants.len()
    }

    /// Sum of deposits still owed to in-progress or withdrawable participants.
    pub fn total_owed(&self) -> Decimal {
        self.participants.values().map(ParticipantRecord::owed).sum()
    }

    pub fn forfeited(&self) -> Decimal {
        self.forfeited
    }

    /// Custody holds at least what it owes participants.
    pub fn is_solvent<L: TokenLedger + ?Sized>(&self, ledger: &L) -> bool {
        self.total_owed() <= ledger.balance_of(&self.custody_account)
    }

    /// Canonical, sorted view of the custody state.
    pub fn snapshot(&self) -> CustodySnapshot {
        let mut participants: Vec<(AccountId, ParticipantRecord)> = self
            .participants
            .iter()
            .map(|(id, record)| (*id, record.clone()))
            .collect();
        participants.sort_by_key(|(id, _)| *id);

        CustodySnapshot {
            cohort_id: self.cohort_id,
            custody_account: self.custody_account,
            token: self.token.clone(),
            deposit_amount: self.deposit_amount,
            schedule: self.schedule,
            paused: self.pause_guard.is_paused(),
            forfeited: self.forfeited,
            participants,
        }
    }

    /// SHA-256 commitment over [`CustodyInstance::snapshot`].
    pub fn state_root(&self) -> [u8; 32] {
        self.snapshot().root()
    }

    // ───────────────────────── Events ─────────────────────────

    pub fn events(&self) -> &[ContractEvent] {
        &self.events
    }

    /// Drain all events (consume and clear).
    pub fn drain_events(&mut self) -> Vec<ContractEvent> {
        std::mem::take(&mut self.events)
    }

    fn emit(&mut self, event: ContractEvent) -> ContractEvent {
        self.events.push(event.clone());
        event
    }

    // ───────────────────────── Internal Guards ─────────────────────────

    fn check_not_paused(&self) -> Result<(), CustodyError> {
        if self.pause_guard.is_paused() {
            return Err(CustodyError::Paused);
        }
        Ok(())
    }

    fn check_operator(&self, caller: &AccountId) -> Result<(), CustodyError> {
        require_role(self.roles.as_ref(), caller, Role::Operator, self.scope())?;
        Ok(())
    }

    fn scope(&self) -> RoleScope {
        RoleScope::Cohort(self.cohort_id)
    }

    fn check_token<L: TokenLedger + ?Sized>(&self, ledger: &L) -> Result<(), CustodyError> {
        if ledger.token() != &self.token {
            return Err(CustodyError::TokenMismatch {
                expected: self.token.clone(),
                actual: ledger.token().clone(),
            });
        }
        Ok(())
    }
}
