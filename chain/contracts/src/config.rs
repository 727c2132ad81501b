//! Cohort configuration
//!
//! Parameters a registry supplies when it creates a custody instance. Loaded
//! from JSON or built in code, and validated before any instance exists.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use types::ids::{AccountId, TokenId};

use crate::errors::ConfigError;

/// Deposit window length after cohort start (3 days).
pub const DEFAULT_DEPOSIT_GRACE_SECS: i64 = 3 * 24 * 60 * 60;

/// How much an admin may extract from a finished cohort.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionPolicy {
    /// Custodial balance minus everything still owed to participants.
    #[default]
    UnclaimedOnly,
    /// Only deposits forfeited by failed participants, never surplus.
    ForfeitedOnly,
}

/// Configuration for one cohort's custody instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CohortConfig {
    /// Exact amount each participant must deposit.
    pub deposit_amount: Decimal,
    /// Instrument of the external ledger all moves happen on.
    pub token: TokenId,
    /// Principal granted the operator role at creation.
    pub operator: AccountId,
    /// Seconds from creation until the cohort is finished.
    pub cohort_duration_secs: i64,
    /// Seconds from creation during which deposits are accepted.
    #[serde(default = "default_grace")]
    pub deposit_grace_secs: i64,
    #[serde(default)]
    pub extraction_policy: ExtractionPolicy,
}

fn default_grace() -> i64 {
    DEFAULT_DEPOSIT_GRACE_SECS
}

impl CohortConfig {
    /// Config with the default deposit window and extraction policy.
    pub fn new(
        deposit_amount: Decimal,
        token: TokenId,
        operator: AccountId,
        cohort_duration_secs: i64,
    ) -> Self {
        Self {
            deposit_amount,
            token,
            operator,
            cohort_duration_secs,
            deposit_grace_secs: DEFAULT_DEPOSIT_GRACE_SECS,
            extraction_policy: ExtractionPolicy::default(),
        }
    }

    pub fn with_deposit_grace(mut self, secs: i64) -> Self {
        self.deposit_grace_secs = secs;
        self
    }

    pub fn with_extraction_policy(mut self, policy: ExtractionPolicy) -> Self {
        self.extraction_policy = policy;
        self
    }

    /// Parse and validate a JSON config document.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate invariants the custody schedule relies on.
    ///
    /// The deposit window must close strictly before the cohort finishes,
    /// and the token symbol must not be blank.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.deposit_amount <= Decimal::ZERO {
            return Err(ConfigError::InvalidDepositAmount {
                amount: self.deposit_amount,
            });
        }
        if self.cohort_duration_secs <= 0 {
            return Err(ConfigError::InvalidDuration {
                secs: self.cohort_duration_secs,
            });
        }
        if self.deposit_grace_secs < 0 {
            return Err(ConfigError::InvalidGracePeriod {
                secs: self.deposit_grace_secs,
            });
        }
        // Deposit window closes strictly before judgement opens
        if self.deposit_grace_secs >= self.cohort_duration_secs {
            return Err(ConfigError::GraceExceedsDuration {
                grace_secs: self.deposit_grace_secs,
                duration_secs: self.cohort_duration_secs,
            });
        }
        if self.token.is_blank() {
            return Err(ConfigError::BlankToken);
        }
        if self.operator.is_nil() {
            return Err(ConfigError::ZeroOperator);
        }
        Ok(())
    }
}
