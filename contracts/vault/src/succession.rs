//! Owner succession: a two-phase, timelocked hand-off of the Owner role to
//! the current executor. The executor initiates, waits out the override
//! timelock, then approves — at which point the old owner is demoted, the
//! caller becomes owner, and the executor slot is left empty until a new
//! executor is appointed. This path is deliberately unilateral: it is the
//! designated fallback for a non-responsive or compromised owner.

use crate::config;
use crate::roles::{self, RoleError};
use soroban_sdk::{contracterror, contractevent, contracttype, Address, Env};

/// Errors that can occur during owner succession
#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum SuccessionError {
    /// Caller is not the executor
    Unauthorized = 1,
    /// A succession request is already active
    AlreadyActive = 2,
    /// No active succession request
    NotActive = 3,
    /// Override timelock has not elapsed
    TimelockNotElapsed = 4,
    /// New owner equals the current owner
    SameOwner = 5,
}

impl From<RoleError> for SuccessionError {
    fn from(err: RoleError) -> Self {
        match err {
            RoleError::SameOwner => SuccessionError::SameOwner,
            _ => SuccessionError::Unauthorized,
        }
    }
}

/// The singleton succession request
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SuccessionRequest {
    pub initiated_at: u64,
    pub active: bool,
}

/// Storage key for the succession request
#[contracttype]
#[derive(Clone)]
pub enum SuccessionDataKey {
    Request,
}

/// Emitted when the executor opens a succession request
#[contractevent]
#[derive(Clone, Debug)]
pub struct OwnerOverrideInitiatedEvent {
    pub executor: Address,
    pub initiated_at: u64,
}

/// Emitted when succession completes and ownership changes hands
#[contractevent]
#[derive(Clone, Debug)]
pub struct OwnerOverrideApprovedEvent {
    pub previous_owner: Address,
    pub new_owner: Address,
    pub timestamp: u64,
}

/// Open a succession request. Executor only; at most one may be active.
pub fn initiate_owner_override(env: &Env, caller: Address) -> Result<(), SuccessionError> {
    caller.require_auth();

    if !roles::is_executor(env, &caller) {
        return Err(SuccessionError::Unauthorized);
    }
    if request(env).map(|r| r.active).unwrap_or(false) {
        return Err(SuccessionError::AlreadyActive);
    }

    let now = env.ledger().timestamp();
    env.storage().persistent().set(
        &SuccessionDataKey::Request,
        &SuccessionRequest {
            initiated_at: now,
            active: true,
        },
    );

    OwnerOverrideInitiatedEvent {
        executor: caller,
        initiated_at: now,
    }
    .publish(env);

    Ok(())
}

/// Finalize an active succession request once the override timelock has
/// elapsed. The caller (the executor) becomes owner, the old owner loses
/// its role, and the executor slot empties.
pub fn approve_owner_override(env: &Env, caller: Address) -> Result<(), SuccessionError> {
    caller.require_auth();

    if !roles::is_executor(env, &caller) {
        return Err(SuccessionError::Unauthorized);
    }

    let pending = request(env).ok_or(SuccessionError::NotActive)?;
    if !pending.active {
        return Err(SuccessionError::NotActive);
    }

    let now = env.ledger().timestamp();
    if now < pending
        .initiated_at
        .saturating_add(config::override_timelock(env))
    {
        return Err(SuccessionError::TimelockNotElapsed);
    }

    let previous = roles::owner(env).ok_or(SuccessionError::Unauthorized)?;

    // Deactivate the request before mutating roles.
    env.storage().persistent().remove(&SuccessionDataKey::Request);

    roles::revoke_executor(env)?;
    roles::replace_owner(env, &caller)?;

    OwnerOverrideApprovedEvent {
        previous_owner: previous,
        new_owner: caller,
        timestamp: now,
    }
    .publish(env);

    Ok(())
}

/// The succession request, if one has been recorded
pub fn request(env: &Env) -> Option<SuccessionRequest> {
    env.storage().persistent().get(&SuccessionDataKey::Request)
}
