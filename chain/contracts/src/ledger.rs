//! External token ledger interface
//!
//! Custody never holds value itself; it moves value on an external fungible
//! token ledger through two calls:
//! - pull: `transfer_from`, spending an allowance the owner granted beforehand
//! - push: `transfer`, from the custody account to a recipient
//!
//! Both calls are atomic: they either move the full amount or change nothing.

use rust_decimal::Decimal;
use std::collections::{HashMap, HashSet};
use tracing::debug;
use types::ids::{AccountId, TokenId};

use crate::errors::LedgerError;

/// Transfer contract of an external fungible-token ledger.
pub trait TokenLedger {
    /// Instrument this ledger moves.
    fn token(&self) -> &TokenId;

    fn balance_of(&self, account: &AccountId) -> Decimal;

    /// Amount `spender` may still pull from `owner`.
    fn allowance(&self, owner: &AccountId, spender: &AccountId) -> Decimal;

    /// Pull `amount` from `from` to `to`, consuming `spender`'s allowance.
    fn transfer_from(
        &mut self,
        spender: &AccountId,
        from: &AccountId,
        to: &AccountId,
        amount: Decimal,
    ) -> Result<(), LedgerError>;

    /// Push `amount` from `from` to `to`.
    fn transfer(
        &mut self,
        from: &AccountId,
        to: &AccountId,
        amount: Decimal,
    ) -> Result<(), LedgerError>;
}

/// In-process ledger for a single token.
///
/// Frozen accounts can neither send nor receive, which lets callers observe
/// how custody behaves when the external ledger refuses a transfer.
#[derive(Debug)]
pub struct InMemoryLedger {
    token: TokenId,
    balances: HashMap<AccountId, Decimal>,
    allowances: HashMap<(AccountId, AccountId), Decimal>,
    frozen: HashSet<AccountId>,
}

impl InMemoryLedger {
    pub fn new(token: TokenId) -> Self {
        Self {
            token,
            balances: HashMap::new(),
            allowances: HashMap::new(),
            frozen: HashSet::new(),
        }
    }

    /// Credit new units to an account.
    pub fn mint(&mut self, account: AccountId, amount: Decimal) -> Result<(), LedgerError> {
        Self::check_amount(amount)?;
        self.credit(account, amount)
    }

    /// Set (not add to) the amount `spender` may pull from `owner`.
    pub fn approve(&mut self, owner: AccountId, spender: AccountId, amount: Decimal) {
        self.allowances.insert((owner, spender), amount);
    }

    pub fn freeze(&mut self, account: AccountId) {
        self.frozen.insert(account);
    }

    pub fn unfreeze(&mut self, account: &AccountId) {
        self.frozen.remove(account);
    }

    /// Sum of all balances.
    pub fn total_supply(&self) -> Decimal {
        self.balances.values().copied().sum()
    }

    fn check_amount(amount: Decimal) -> Result<(), LedgerError> {
        if amount <= Decimal::ZERO {
            return Err(LedgerError::InvalidAmount { amount });
        }
        Ok(())
    }

    fn check_not_frozen(&self, account: &AccountId) -> Result<(), LedgerError> {
        if self.frozen.contains(account) {
            return Err(LedgerError::AccountFrozen { account: *account });
        }
        Ok(())
    }

    fn credit(&mut self, account: AccountId, amount: Decimal) -> Result<(), LedgerError> {
        let current = self.balances.entry(account).or_insert(Decimal::ZERO);
        *current = current.checked_add(amount).ok_or(LedgerError::Overflow)?;
        Ok(())
    }

    /// Validate then move. Nothing is written unless every check passes.
    fn move_funds(
        &mut self,
        from: &AccountId,
        to: &AccountId,
        amount: Decimal,
    ) -> Result<(), LedgerError> {
        Self::check_amount(amount)?;
        self.check_not_frozen(from)?;
        self.check_not_frozen(to)?;

        let available = self.balance_of(from);
        if available < amount {
            return Err(LedgerError::InsufficientBalance {
                account: *from,
                required: amount,
                available,
            });
        }
        if from != to {
            self.balance_of(to)
                .checked_add(amount)
                .ok_or(LedgerError::Overflow)?;
        }

        self.balances.insert(*from, available - amount);
        self.credit(*to, amount)?;
        debug!(token = %self.token, from = %from, to = %to, amount = %amount, "Ledger transfer");
        Ok(())
    }
}

impl TokenLedger for InMemoryLedger {
    fn token(&self) -> &TokenId {
        &self.token
    }

    fn balance_of(&self, account: &AccountId) -> Decimal {
        self.balances.get(account).copied().unwrap_or(Decimal::ZERO)
    }

    fn allowance(&self, owner: &AccountId, spender: &AccountId) -> Decimal {
        self.allowances
            .get(&(*owner, *spender))
            .copied()
            .unwrap_or(Decimal::ZERO)
    }

    fn transfer_from(
        &mut self,
        spender: &AccountId,
        from: &AccountId,
        to: &AccountId,
        amount: Decimal,
    ) -> Result<(), LedgerError> {
        let authorized = self.allowance(from, spender);
        if authorized < amount {
            return Err(LedgerError::InsufficientAllowance {
                owner: *from,
                spender: *spender,
                required: amount,
                authorized,
            });
        }
        self.move_funds(from, to, amount)?;
        self.allowances.insert((*from, *spender), authorized - amount);
        Ok(())
    }

    fn transfer(
        &mut self,
        from: &AccountId,
        to: &AccountId,
        amount: Decimal,
    ) -> Result<(), LedgerError> {
        self.move_funds(from, to, amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup_ledger() -> (InMemoryLedger, AccountId) {
        let mut ledger = InMemoryLedger::new(TokenId::from("USDC"));
        let holder = AccountId::new();
        ledger.mint(holder, Decimal::from(1_000)).unwrap();
        (ledger, holder)
    }

    #[test]
    fn test_transfer_moves_balance() {
        let (mut ledger, holder) = setup_ledger();
        let to = AccountId::new();
        ledger.transfer(&holder, &to, Decimal::from(250)).unwrap();
        assert_eq!(ledger.balance_of(&holder), Decimal::from(750));
        assert_eq!(ledger.balance_of(&to), Decimal::from(250));
        assert_eq!(ledger.total_supply(), Decimal::from(1_000));
    }

    #[test]
    fn test_transfer_insufficient_balance() {
        let (mut ledger, holder) = setup_ledger();
        let to = AccountId::new();
        let result = ledger.transfer(&holder, &to, Decimal::from(1_001));
        assert!(matches!(result, Err(LedgerError::InsufficientBalance { .. })));
        assert_eq!(ledger.balance_of(&holder), Decimal::from(1_000));
    }

    #[test]
    fn test_transfer_from_consumes_allowance() {
        let (mut ledger, holder) = setup_ledger();
        let spender = AccountId::new();
        ledger.approve(holder, spender, Decimal::from(300));

        ledger
            .transfer_from(&spender, &holder, &spender, Decimal::from(100))
            .unwrap();
        assert_eq!(ledger.allowance(&holder, &spender), Decimal::from(200));
        assert_eq!(ledger.balance_of(&spender), Decimal::from(100));
    }

    #[test]
    fn test_transfer_from_without_allowance() {
        let (mut ledger, holder) = setup_ledger();
        let spender = AccountId::new();
        let result = ledger.transfer_from(&spender, &holder, &spender, Decimal::from(1));
        assert_eq!(
            result,
            Err(LedgerError::InsufficientAllowance {
                owner: holder,
                spender,
                required: Decimal::from(1),
                authorized: Decimal::ZERO,
            })
        );
    }

    #[test]
    fn test_frozen_account_rejects_transfers() {
        let (mut ledger, holder) = setup_ledger();
        let to = AccountId::new();
        ledger.freeze(to);
        let result = ledger.transfer(&holder, &to, Decimal::from(1));
        assert_eq!(result, Err(LedgerError::AccountFrozen { account: to }));
        assert_eq!(ledger.balance_of(&holder), Decimal::from(1_000));

        ledger.unfreeze(&to);
        assert!(ledger.transfer(&holder, &to, Decimal::from(1)).is_ok());
    }

    #[test]
    fn test_failed_pull_keeps_allowance() {
        let (mut ledger, holder) = setup_ledger();
        let spender = AccountId::new();
        ledger.approve(holder, spender, Decimal::from(5_000));
        let result = ledger.transfer_from(&spender, &holder, &spender, Decimal::from(2_000));
        assert!(matches!(result, Err(LedgerError::InsufficientBalance { .. })));
        assert_eq!(ledger.allowance(&holder, &spender), Decimal::from(5_000));
    }

    #[test]
    fn test_zero_amount_rejected() {
        let (mut ledger, holder) = setup_ledger();
        let result = ledger.transfer(&holder, &AccountId::new(), Decimal::ZERO);
        assert!(matches!(result, Err(LedgerError::InvalidAmount { .. })));
    }
}
