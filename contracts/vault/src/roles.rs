//! # Role Registry
//!
//! Owns the Owner/Executor/Signer role assignments and the parallel user
//! directory (one [`UserProfile`] per active role holder).
//!
//! ## Invariants
//! - Exactly one Owner exists once the vault is initialized.
//! - At most one Executor exists at a time.
//! - Owner, Executor, and the signer set are pairwise disjoint: an address
//!   holds at most one role.
//! - A profile exists if and only if the address currently holds a role;
//!   the Owner's profile is never removed while it holds the role.
//!
//! Functions here mutate role state without performing authorization — the
//! facade and the pipelines decide who is allowed to call them.

use soroban_sdk::{contracterror, contractevent, contracttype, Address, Env, Map, Vec};

/// Errors that can occur during role operations
#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum RoleError {
    /// Caller lacks the role required for the operation
    Unauthorized = 1,
    /// Target already holds a role
    RoleConflict = 2,
    /// Target does not hold the role being revoked
    RoleNotHeld = 3,
    /// An executor is already appointed
    ExecutorAlreadySet = 4,
    /// Owner replacement with the same address
    SameOwner = 5,
    /// Signer quorum is reachable; the change must go through the
    /// governance action pipeline
    GovernanceRequired = 6,
}

/// The three vault roles. An address holds at most one at a time.
#[contracttype]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[repr(u32)]
pub enum Role {
    Owner = 0,
    Executor = 1,
    Signer = 2,
}

/// Storage keys for role assignments and the user directory
#[contracttype]
#[derive(Clone)]
pub enum RoleDataKey {
    /// The vault owner
    Owner,
    /// The appointed executor, if any
    Executor,
    /// Signer set: Map<Address, bool>
    Signers,
    /// Directory entry for an active role holder
    Profile(Address),
}

/// Directory entry kept for every active role holder
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct UserProfile {
    pub address: Address,
    pub role: Role,
    pub joined_at: u64,
}

/// Emitted when an address is granted a role
#[contractevent]
#[derive(Clone, Debug)]
pub struct RoleGrantedEvent {
    pub account: Address,
    pub role: Role,
    pub timestamp: u64,
}

/// Emitted when a role is revoked from an address
#[contractevent]
#[derive(Clone, Debug)]
pub struct RoleRevokedEvent {
    pub account: Address,
    pub role: Role,
    pub timestamp: u64,
}

/// Emitted when ownership passes to a new address
#[contractevent]
#[derive(Clone, Debug)]
pub struct OwnerChangedEvent {
    pub previous_owner: Address,
    pub new_owner: Address,
    pub timestamp: u64,
}

/// Record the initial owner. Called once from `initialize`.
pub fn set_initial_owner(env: &Env, owner: &Address) {
    env.storage().persistent().set(&RoleDataKey::Owner, owner);
    save_profile(env, owner, Role::Owner);
    emit_granted(env, owner, Role::Owner);
}

/// Current owner, if the vault has been initialized
pub fn owner(env: &Env) -> Option<Address> {
    env.storage().persistent().get(&RoleDataKey::Owner)
}

/// Current executor, if one is appointed
pub fn executor(env: &Env) -> Option<Address> {
    env.storage().persistent().get(&RoleDataKey::Executor)
}

/// The role currently held by `account`, if any
pub fn role_of(env: &Env, account: &Address) -> Option<Role> {
    env.storage()
        .persistent()
        .get::<_, UserProfile>(&RoleDataKey::Profile(account.clone()))
        .map(|profile| profile.role)
}

/// Directory entry for `account`, if it holds a role
pub fn profile(env: &Env, account: &Address) -> Option<UserProfile> {
    env.storage()
        .persistent()
        .get(&RoleDataKey::Profile(account.clone()))
}

pub fn is_owner(env: &Env, account: &Address) -> bool {
    owner(env).map(|o| o == *account).unwrap_or(false)
}

pub fn is_executor(env: &Env, account: &Address) -> bool {
    executor(env).map(|e| e == *account).unwrap_or(false)
}

pub fn is_signer(env: &Env, account: &Address) -> bool {
    signer_map(env).contains_key(account.clone())
}

/// Valid signer = Owner or Signer. Eligible to initiate and approve requests.
pub fn is_valid_signer(env: &Env, account: &Address) -> bool {
    is_owner(env, account) || is_signer(env, account)
}

/// Valid executor = Owner or Executor. Eligible to execute or delete requests.
pub fn is_valid_executor(env: &Env, account: &Address) -> bool {
    is_owner(env, account) || is_executor(env, account)
}

/// All current signer addresses
pub fn signer_list(env: &Env) -> Vec<Address> {
    signer_map(env).keys()
}

/// Number of addresses in the signer set
pub fn signer_count(env: &Env) -> u32 {
    signer_map(env).len()
}

/// Signers plus the owner: the pool an approval quorum is drawn from
pub fn total_valid_signers(env: &Env) -> u32 {
    let mut total = signer_count(env);
    if owner(env).is_some() {
        total += 1;
    }
    total
}

/// Number of active role holders
pub fn user_count(env: &Env) -> u32 {
    let mut total = total_valid_signers(env);
    if executor(env).is_some() {
        total += 1;
    }
    total
}

/// Appoint `account` as executor. The slot must be empty and `account`
/// must not hold any role.
pub fn grant_executor(env: &Env, account: &Address) -> Result<(), RoleError> {
    if executor(env).is_some() {
        return Err(RoleError::ExecutorAlreadySet);
    }
    if role_of(env, account).is_some() {
        return Err(RoleError::RoleConflict);
    }

    env.storage()
        .persistent()
        .set(&RoleDataKey::Executor, account);
    save_profile(env, account, Role::Executor);
    emit_granted(env, account, Role::Executor);
    Ok(())
}

/// Remove the current executor and its directory entry
pub fn revoke_executor(env: &Env) -> Result<Address, RoleError> {
    let account = executor(env).ok_or(RoleError::RoleNotHeld)?;

    env.storage().persistent().remove(&RoleDataKey::Executor);
    remove_profile(env, &account);
    emit_revoked(env, &account, Role::Executor);
    Ok(account)
}

/// Add `account` to the signer set. Fails if it already holds any role.
pub fn grant_signer(env: &Env, account: &Address) -> Result<(), RoleError> {
    if role_of(env, account).is_some() {
        return Err(RoleError::RoleConflict);
    }

    let mut signers = signer_map(env);
    signers.set(account.clone(), true);
    save_signer_map(env, &signers);
    save_profile(env, account, Role::Signer);
    emit_granted(env, account, Role::Signer);
    Ok(())
}

/// Remove `account` from the signer set and delete its directory entry
pub fn revoke_signer(env: &Env, account: &Address) -> Result<(), RoleError> {
    let mut signers = signer_map(env);
    if signers.remove(account.clone()).is_none() {
        return Err(RoleError::RoleNotHeld);
    }
    save_signer_map(env, &signers);
    remove_profile(env, account);
    emit_revoked(env, account, Role::Signer);
    Ok(())
}

/// Hand the Owner role to `new_owner`. Used only by the succession
/// protocol, after the caller's previous role has been revoked.
pub fn replace_owner(env: &Env, new_owner: &Address) -> Result<(), RoleError> {
    let previous = owner(env).ok_or(RoleError::RoleNotHeld)?;
    if previous == *new_owner {
        return Err(RoleError::SameOwner);
    }
    if role_of(env, new_owner).is_some() {
        return Err(RoleError::RoleConflict);
    }

    remove_profile(env, &previous);
    emit_revoked(env, &previous, Role::Owner);

    env.storage()
        .persistent()
        .set(&RoleDataKey::Owner, new_owner);
    save_profile(env, new_owner, Role::Owner);
    emit_granted(env, new_owner, Role::Owner);

    OwnerChangedEvent {
        previous_owner: previous,
        new_owner: new_owner.clone(),
        timestamp: env.ledger().timestamp(),
    }
    .publish(env);

    Ok(())
}

fn signer_map(env: &Env) -> Map<Address, bool> {
    env.storage()
        .persistent()
        .get(&RoleDataKey::Signers)
        .unwrap_or_else(|| Map::new(env))
}

fn save_signer_map(env: &Env, signers: &Map<Address, bool>) {
    env.storage().persistent().set(&RoleDataKey::Signers, signers);
}

fn save_profile(env: &Env, account: &Address, role: Role) {
    let profile = UserProfile {
        address: account.clone(),
        role,
        joined_at: env.ledger().timestamp(),
    };
    env.storage()
        .persistent()
        .set(&RoleDataKey::Profile(account.clone()), &profile);
}

fn remove_profile(env: &Env, account: &Address) {
    env.storage()
        .persistent()
        .remove(&RoleDataKey::Profile(account.clone()));
}

fn emit_granted(env: &Env, account: &Address, role: Role) {
    RoleGrantedEvent {
        account: account.clone(),
        role,
        timestamp: env.ledger().timestamp(),
    }
    .publish(env);
}

fn emit_revoked(env: &Env, account: &Address, role: Role) {
    RoleRevokedEvent {
        account: account.clone(),
        role,
        timestamp: env.ledger().timestamp(),
    }
    .publish(env);
}
