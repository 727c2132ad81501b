//! Concurrency test
//!
//! Verifies that independent cohorts can run on separate threads while
//! sharing one role registry. Each cohort owns its custody instance and
//! ledger, so no coordination between them is needed.

use cohort_custody::config::CohortConfig;
use cohort_custody::custody::CustodyInstance;
use cohort_custody::ledger::{InMemoryLedger, TokenLedger};
use cohort_custody::security::{AccessControl, Role, RoleScope};
use rust_decimal::Decimal;
use std::sync::Arc;
use std::thread;
use types::ids::{AccountId, CohortId, TokenId};

#[test]
fn test_concurrent_cohorts_share_roles() {
    let admin = AccountId::new();
    let operator = AccountId::new();
    let roles = Arc::new(AccessControl::new(admin));
    // One operator serves every cohort
    roles
        .grant_role(&admin, operator, Role::Operator, RoleScope::Global)
        .unwrap();

    let tokens = vec!["USDC", "DAI", "USDT", "EURC"];

    let handles: Vec<_> = tokens
        .into_iter()
        .map(|symbol| {
            let roles = roles.clone();
            thread::spawn(move || {
                let token = TokenId::from(symbol);
                let config = CohortConfig::new(Decimal::from(50), token.clone(), operator, 1_000)
                    .with_deposit_grace(100);
                let mut custody =
                    CustodyInstance::new(CohortId::new(), AccountId::new(), &config, roles, 0)
                        .unwrap();
                let mut ledger = InMemoryLedger::new(token);

                let participants: Vec<AccountId> = (0..200).map(|_| AccountId::new()).collect();
                for p in &participants {
                    ledger.mint(*p, Decimal::from(50)).unwrap();
                    ledger.approve(*p, custody.custody_account(), Decimal::from(50));
                    custody.deposit(&mut ledger, *p, Decimal::from(50), 10).unwrap();
                }

                let (passed, failed) = participants.split_at(150);
                custody.allow_withdraw_batch(&operator, passed, 1_000).unwrap();
                custody.mark_failed_batch(&operator, failed, 1_000).unwrap();
                for p in passed {
                    custody.withdraw(&mut ledger, *p, Decimal::from(50)).unwrap();
                }

                assert!(custody.is_solvent(&ledger));
                ledger.balance_of(&custody.custody_account())
            })
        })
        .collect();

    for handle in handles {
        let retained = handle.join().expect("cohort thread panicked");
        assert_eq!(retained, Decimal::from(50 * 50));
    }
}
