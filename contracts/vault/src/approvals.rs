//! Approval bookkeeping shared by both request pipelines: who has signed
//! off on request `id` in a given domain. Approvals are kept as a
//! `Map<Address, bool>` used as a set, so duplicate approvals are rejected
//! by membership rather than a linear scan.
//!
//! Validity and executed-state checks on the request itself are the
//! calling pipeline's responsibility; this module only validates that the
//! approver is drawn from the quorum pool.

use crate::roles;
use soroban_sdk::{contracterror, contracttype, Address, Env, Map, Vec};

/// Errors that can occur while recording or revoking approvals
#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum ApprovalError {
    /// Approver has already signed off on this request
    AlreadyApproved = 1,
    /// Approver has no approval on record for this request
    NotApproved = 2,
    /// Approver is neither the owner nor a signer
    NotSigner = 3,
}

/// The two request pipelines sharing this ledger, each with its own id space
#[contracttype]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[repr(u32)]
pub enum RequestDomain {
    Action = 0,
    Transaction = 1,
}

/// Storage keys for approval sets
#[contracttype]
#[derive(Clone)]
pub enum ApprovalDataKey {
    /// Approval set for a request: Map<Address, bool>
    Approvals(RequestDomain, u64),
}

/// Record `approver`'s sign-off on a request. Returns the new count.
pub fn record_approval(
    env: &Env,
    domain: RequestDomain,
    id: u64,
    approver: &Address,
) -> Result<u32, ApprovalError> {
    if !roles::is_valid_signer(env, approver) {
        return Err(ApprovalError::NotSigner);
    }

    let mut set = approval_map(env, domain, id);
    if set.contains_key(approver.clone()) {
        return Err(ApprovalError::AlreadyApproved);
    }

    set.set(approver.clone(), true);
    save_approval_map(env, domain, id, &set);
    Ok(set.len())
}

/// Withdraw a previously recorded approval. Returns the new count.
pub fn revoke_approval(
    env: &Env,
    domain: RequestDomain,
    id: u64,
    approver: &Address,
) -> Result<u32, ApprovalError> {
    let mut set = approval_map(env, domain, id);
    if set.remove(approver.clone()).is_none() {
        return Err(ApprovalError::NotApproved);
    }
    save_approval_map(env, domain, id, &set);
    Ok(set.len())
}

pub fn approval_count(env: &Env, domain: RequestDomain, id: u64) -> u32 {
    approval_map(env, domain, id).len()
}

pub fn approvers(env: &Env, domain: RequestDomain, id: u64) -> Vec<Address> {
    approval_map(env, domain, id).keys()
}

pub fn has_approved(env: &Env, domain: RequestDomain, id: u64, approver: &Address) -> bool {
    approval_map(env, domain, id).contains_key(approver.clone())
}

/// Drop the approval set for a deleted request slot
pub fn clear(env: &Env, domain: RequestDomain, id: u64) {
    env.storage()
        .persistent()
        .remove(&ApprovalDataKey::Approvals(domain, id));
}

fn approval_map(env: &Env, domain: RequestDomain, id: u64) -> Map<Address, bool> {
    env.storage()
        .persistent()
        .get(&ApprovalDataKey::Approvals(domain, id))
        .unwrap_or_else(|| Map::new(env))
}

fn save_approval_map(env: &Env, domain: RequestDomain, id: u64, set: &Map<Address, bool>) {
    env.storage()
        .persistent()
        .set(&ApprovalDataKey::Approvals(domain, id), set);
}
