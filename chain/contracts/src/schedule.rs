//! Cohort schedule and stage gates
//!
//! ```text
//! cohort_start          deposit_window_end            finish_time
//!      |------ Deposit ------|--------- Locked ---------|---- Finished ---->
//! ```
//!
//! Deposits are accepted up to and including `deposit_window_end`. Operator
//! judgement and admin extraction open at `finish_time`.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::CohortConfig;
use crate::errors::{ConfigError, CustodyError};

/// Lifecycle stage of a cohort at a given time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Deposit,
    Locked,
    Finished,
}

/// Absolute schedule of one cohort, in unix seconds. Immutable once built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    cohort_start: i64,
    deposit_window_end: i64,
    finish_time: i64,
}

impl Schedule {
    /// Build the schedule for a cohort starting at `cohort_start`.
    pub fn from_config(config: &CohortConfig, cohort_start: i64) -> Result<Self, ConfigError> {
        let deposit_window_end = cohort_start
            .checked_add(config.deposit_grace_secs)
            .ok_or(ConfigError::ScheduleOverflow {
                start: cohort_start,
                secs: config.deposit_grace_secs,
            })?;
        let finish_time = cohort_start
            .checked_add(config.cohort_duration_secs)
            .ok_or(ConfigError::ScheduleOverflow {
                start: cohort_start,
                secs: config.cohort_duration_secs,
            })?;
        Ok(Self {
            cohort_start,
            deposit_window_end,
            finish_time,
        })
    }

    pub fn cohort_start(&self) -> i64 {
        self.cohort_start
    }

    pub fn deposit_window_end(&self) -> i64 {
        self.deposit_window_end
    }

    pub fn finish_time(&self) -> i64 {
        self.finish_time
    }

    pub fn stage_at(&self, now: i64) -> Stage {
        if now >= self.finish_time {
            Stage::Finished
        } else if now <= self.deposit_window_end {
            Stage::Deposit
        } else {
            Stage::Locked
        }
    }

    /// Gate for deposit intake.
    pub fn ensure_deposit_open(&self, now: i64) -> Result<(), CustodyError> {
        if now > self.deposit_window_end {
            debug!(now, window_end = self.deposit_window_end, "Deposit window closed");
            return Err(CustodyError::DepositWindowClosed {
                window_end: self.deposit_window_end,
                now,
            });
        }
        Ok(())
    }

    /// Gate for operator judgement and admin extraction.
    pub fn ensure_finished(&self, now: i64) -> Result<(), CustodyError> {
        if now < self.finish_time {
            debug!(now, finish_time = self.finish_time, "Cohort not finished");
            return Err(CustodyError::CohortNotFinished {
                finish_time: self.finish_time,
                now,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use types::ids::{AccountId, TokenId};

    fn schedule() -> Schedule {
        let config = CohortConfig::new(
            Decimal::from(100),
            TokenId::from("USDC"),
            AccountId::new(),
            1_000,
        )
        .with_deposit_grace(100);
        Schedule::from_config(&config, 10_000).unwrap()
    }

    #[test]
    fn test_schedule_points() {
        let s = schedule();
        assert_eq!(s.cohort_start(), 10_000);
        assert_eq!(s.deposit_window_end(), 10_100);
        assert_eq!(s.finish_time(), 11_000);
    }

    #[test]
    fn test_stage_boundaries() {
        let s = schedule();
        assert_eq!(s.stage_at(10_000), Stage::Deposit);
        assert_eq!(s.stage_at(10_100), Stage::Deposit);
        assert_eq!(s.stage_at(10_101), Stage::Locked);
        assert_eq!(s.stage_at(10_999), Stage::Locked);
        assert_eq!(s.stage_at(11_000), Stage::Finished);
    }

    #[test]
    fn test_deposit_gate() {
        let s = schedule();
        assert!(s.ensure_deposit_open(10_100).is_ok());
        assert_eq!(
            s.ensure_deposit_open(10_101),
            Err(CustodyError::DepositWindowClosed {
                window_end: 10_100,
                now: 10_101
            })
        );
    }

    #[test]
    fn test_finished_gate() {
        let s = schedule();
        assert!(matches!(
            s.ensure_finished(10_999),
            Err(CustodyError::CohortNotFinished { .. })
        ));
        assert!(s.ensure_finished(11_000).is_ok());
    }

    #[test]
    fn test_schedule_overflow() {
        let config = CohortConfig::new(
            Decimal::from(1),
            TokenId::from("USDC"),
            AccountId::new(),
            10,
        );
        let config = config.with_deposit_grace(5);
        let result = Schedule::from_config(&config, i64::MAX - 7);
        assert_eq!(
            result,
            Err(ConfigError::ScheduleOverflow {
                start: i64::MAX - 7,
                secs: 10
            })
        );
    }
}
