//! Shared security primitives for contract modules
//!
//! Provides the pause guard and the cohort-scoped role registry used by
//! custody instances and the registry that creates them.

use dashmap::DashSet;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{info, warn};
use types::ids::{AccountId, CohortId};

use crate::errors::AccessError;

/// Composable pause modifier.
///
/// When paused, protected operations must be rejected.
#[derive(Debug, Clone, Default)]
pub struct PauseGuard {
    paused: bool,
}

impl PauseGuard {
    pub fn new() -> Self {
        Self { paused: false }
    }

    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn unpause(&mut self) {
        self.paused = false;
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }
}

/// Roles consumed by the custody core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Creates cohorts, manages roles, extracts funds from finished cohorts
    Admin,
    /// Runs batch status transitions and pause control
    Operator,
}

/// Where a role grant applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RoleScope {
    /// Every cohort of the registry
    Global,
    /// A single cohort
    Cohort(CohortId),
}

impl fmt::Display for RoleScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Global => write!(f, "global scope"),
            Self::Cohort(id) => write!(f, "cohort {id}"),
        }
    }
}

/// Source of truth for who holds which role.
///
/// Custody instances only read from it; grant/revoke happen elsewhere.
/// A `Global` grant satisfies a check in any cohort scope.
pub trait RoleRegistry: Send + Sync {
    fn has_role(&self, principal: &AccountId, role: Role, scope: RoleScope) -> bool;
}

/// Capability check invoked at the top of every privileged operation.
pub fn require_role(
    registry: &dyn RoleRegistry,
    caller: &AccountId,
    role: Role,
    scope: RoleScope,
) -> Result<(), AccessError> {
    if registry.has_role(caller, role, scope) {
        return Ok(());
    }
    warn!(caller = %caller, role = ?role, scope = %scope, "Rejected privileged call");
    Err(AccessError::MissingRole {
        principal: *caller,
        role,
        scope,
    })
}

/// Role-based access control shared by every cohort of a registry.
///
/// Grants are keyed by `(principal, role, scope)` in a concurrent set, so one
/// instance can be read from independent cohorts on different threads while
/// an operator of one cohort holds no power over another.
#[derive(Debug)]
pub struct AccessControl {
    grants: DashSet<(AccountId, Role, RoleScope)>,
    primary_admin: AccountId,
}

impl AccessControl {
    /// Create access control with an initial global admin.
    pub fn new(admin: AccountId) -> Self {
        let grants = DashSet::new();
        grants.insert((admin, Role::Admin, RoleScope::Global));
        Self {
            grants,
            primary_admin: admin,
        }
    }

    /// Assign a role to a principal within `scope`. Only a global admin can
    /// assign roles.
    pub fn grant_role(
        &self,
        admin_caller: &AccountId,
        target: AccountId,
        role: Role,
        scope: RoleScope,
    ) -> Result<(), AccessError> {
        require_role(self, admin_caller, Role::Admin, RoleScope::Global)?;
        if target.is_nil() {
            return Err(AccessError::ZeroIdentity);
        }
        if self.grants.insert((target, role, scope)) {
            info!(target = %target, role = ?role, scope = %scope, granted_by = %admin_caller, "Role granted");
        }
        Ok(())
    }

    /// Remove a role grant from a principal. Only a global admin can revoke.
    pub fn revoke_role(
        &self,
        admin_caller: &AccountId,
        target: &AccountId,
        role: Role,
        scope: RoleScope,
    ) -> Result<(), AccessError> {
        require_role(self, admin_caller, Role::Admin, RoleScope::Global)?;
        // Cannot revoke the primary admin
        if *target == self.primary_admin && role == Role::Admin && scope == RoleScope::Global {
            return Err(AccessError::PrimaryAdmin {
                admin: self.primary_admin,
            });
        }
        if self.grants.remove(&(*target, role, scope)).is_some() {
            info!(target = %target, role = ?role, scope = %scope, revoked_by = %admin_caller, "Role revoked");
        }
        Ok(())
    }

    pub fn primary_admin(&self) -> &AccountId {
        &self.primary_admin
    }

    /// Check if a principal is a global admin.
    pub fn is_admin(&self, principal: &AccountId) -> bool {
        self.has_role(principal, Role::Admin, RoleScope::Global)
    }
}

impl RoleRegistry for AccessControl {
    fn has_role(&self, principal: &AccountId, role: Role, scope: RoleScope) -> bool {
        self.grants.contains(&(*principal, role, scope))
            || self.grants.contains(&(*principal, role, RoleScope::Global))
    }
}
