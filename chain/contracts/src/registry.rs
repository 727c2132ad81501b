//! Registry — creates and tracks one custody instance per cohort
//!
//! Thin bookkeeping around [`CustodyInstance`]: admin-gated creation,
//! lookup by id, and forwarding of admin fund extraction.

use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;
use types::ids::{AccountId, CohortId};

use crate::config::CohortConfig;
use crate::custody::CustodyInstance;
use crate::errors::RegistryError;
use crate::events::{AdminFundsWithdrawn, CohortCreated, ContractEvent};
use crate::ledger::TokenLedger;
use crate::security::{require_role, AccessControl, Role, RoleScope};

#[derive(Debug)]
pub struct Registry {
    access_control: Arc<AccessControl>,
    instances: HashMap<CohortId, CustodyInstance>,
    /// Emitted events log (append-only)
    events: Vec<ContractEvent>,
}

impl Registry {
    /// Create a registry whose role set starts with `admin`.
    pub fn new(admin: AccountId) -> Self {
        Self::with_access_control(Arc::new(AccessControl::new(admin)))
    }

    /// Create a registry over an existing, possibly shared, role set.
    pub fn with_access_control(access_control: Arc<AccessControl>) -> Self {
        Self {
            access_control,
            instances: HashMap::new(),
            events: Vec::new(),
        }
    }

    /// Create a custody instance for a new cohort starting at `now`.
    ///
    /// Admin-only. Grants `Operator` to `config.operator` for this cohort
    /// alone and allocates a fresh custody account. Emits `CohortCreated`.
    pub fn create_cohort(
        &mut self,
        caller: &AccountId,
        config: &CohortConfig,
        now: i64,
    ) -> Result<CohortId, RegistryError> {
        require_role(
            self.access_control.as_ref(),
            caller,
            Role::Admin,
            RoleScope::Global,
        )?;
        config.validate()?;

        let cohort_id = CohortId::new();
        let custody_account = AccountId::new();
        let instance = CustodyInstance::new(
            cohort_id,
            custody_account,
            config,
            self.access_control.clone(),
            now,
        )?;
        self.access_control.grant_role(
            caller,
            config.operator,
            Role::Operator,
            RoleScope::Cohort(cohort_id),
        )?;
        self.instances.insert(cohort_id, instance);

        info!(cohort = %cohort_id, admin = %caller, operator = %config.operator, "Cohort created");
        self.events.push(ContractEvent::CohortCreated(CohortCreated {
            cohort_id,
            custody_account,
        }));
        Ok(cohort_id)
    }

    pub fn instance(&self, cohort_id: &CohortId) -> Option<&CustodyInstance> {
        self.instances.get(cohort_id)
    }

    pub fn instance_mut(&mut self, cohort_id: &CohortId) -> Option<&mut CustodyInstance> {
        self.instances.get_mut(cohort_id)
    }

    /// Extract funds from a finished cohort to the calling admin.
    ///
    /// Emits `AdminFundsWithdrawn` with the custodial balance left behind.
    pub fn withdraw_admin<L: TokenLedger + ?Sized>(
        &mut self,
        caller: &AccountId,
        cohort_id: &CohortId,
        ledger: &mut L,
        amount: Decimal,
        now: i64,
    ) -> Result<ContractEvent, RegistryError> {
        let instance = self
            .instances
            .get_mut(cohort_id)
            .ok_or(RegistryError::CohortNotFound {
                cohort_id: *cohort_id,
            })?;
        let remaining_balance = instance.withdraw_admin(ledger, caller, amount, now)?;

        let event = ContractEvent::AdminFundsWithdrawn(AdminFundsWithdrawn {
            cohort_id: *cohort_id,
            admin: *caller,
            amount,
            remaining_balance,
        });
        self.events.push(event.clone());
        Ok(event)
    }

    pub fn access_control(&self) -> &Arc<AccessControl> {
        &self.access_control
    }

    pub fn events(&self) -> &[ContractEvent] {
        &self.events
    }

    /// Drain all events (consume and clear).
    pub fn drain_events(&mut self) -> Vec<ContractEvent> {
        std::mem::take(&mut self.events)
    }
}
