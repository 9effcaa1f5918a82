//! Role-based capability checks for distributor operations
//!
//! Every mutating operation calls [`authorize`] first. The check resolves the
//! caller to the [`Role`] it acts under, or fails with a typed
//! `Unauthorized` error naming the rejected [`Action`].

use crate::errors::{DistributorError, Result};
use crate::types::Identity;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;

/// Resolves governor and guardian principals.
pub trait AuthorizationProvider: Send + Sync {
    fn is_governor(&self, caller: &Identity) -> bool;

    fn is_guardian(&self, caller: &Identity) -> bool;
}

/// Role a caller was authorized under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    Governor,
    Guardian,
    EpochTrigger,
}

/// Operations gated by [`authorize`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    Distribute,
    RetrieveBounty,
    AddRecipient,
    RemoveRecipient,
    SetAdjustment,
    SetBounty,
}

/// Who may perform an [`Action`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    EpochTrigger,
    Governor,
    GovernorOrGuardian,
}

impl Action {
    pub fn requirement(&self) -> Requirement {
        match self {
            Action::Distribute | Action::RetrieveBounty => Requirement::EpochTrigger,
            Action::AddRecipient | Action::SetBounty => Requirement::Governor,
            Action::RemoveRecipient | Action::SetAdjustment => Requirement::GovernorOrGuardian,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Action::Distribute => "distribute",
            Action::RetrieveBounty => "retrieve bounty",
            Action::AddRecipient => "add recipient",
            Action::RemoveRecipient => "remove recipient",
            Action::SetAdjustment => "set adjustment",
            Action::SetBounty => "set bounty",
        };
        f.write_str(name)
    }
}

/// Resolve `caller` to the role it may perform `action` under.
///
/// A caller holding both governor and guardian rights acts as governor.
pub fn authorize(
    provider: &dyn AuthorizationProvider,
    epoch_trigger: &Identity,
    caller: &Identity,
    action: Action,
) -> Result<Role> {
    let role = match action.requirement() {
        Requirement::EpochTrigger => (caller == epoch_trigger).then_some(Role::EpochTrigger),
        Requirement::Governor => provider.is_governor(caller).then_some(Role::Governor),
        Requirement::GovernorOrGuardian => {
            if provider.is_governor(caller) {
                Some(Role::Governor)
            } else if provider.is_guardian(caller) {
                Some(Role::Guardian)
            } else {
                None
            }
        }
    };

    role.ok_or_else(|| {
        warn!(
            target: "distributor",
            caller = %caller.short(),
            "Rejected unauthorized attempt to {}",
            action
        );
        DistributorError::Unauthorized {
            action,
            caller: *caller,
        }
    })
}

/// Fixed governor/guardian pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaticAuthority {
    pub governor: Identity,
    pub guardian: Identity,
}

impl StaticAuthority {
    pub fn new(governor: Identity, guardian: Identity) -> Self {
        Self { governor, guardian }
    }
}

impl AuthorizationProvider for StaticAuthority {
    fn is_governor(&self, caller: &Identity) -> bool {
        !caller.is_zero() && *caller == self.governor
    }

    fn is_guardian(&self, caller: &Identity) -> bool {
        !caller.is_zero() && *caller == self.guardian
    }
}
