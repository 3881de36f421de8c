//! # Governance Action Pipeline
//!
//! Single-slot queue of pending administrative actions: signer-set changes
//! and threshold/timelock adjustments. Requests move through
//! `None → Pending → {Executed | Deleted}`.
//!
//! ## Lifecycle
//! 1. A valid signer (owner or signer) creates a request with
//!    [`initiate_action`]. Only one unexecuted request may exist at a time.
//! 2. Valid signers sign off via [`approve_action`] and may withdraw with
//!    [`revoke_action_approval`].
//! 3. Once the request timelock has elapsed, the owner (with full quorum)
//!    or the executor (with or without quorum) finalizes it with
//!    [`execute_action`]. Executor execution below quorum is recorded
//!    permanently on the request as `was_overridden`.
//! 4. An unexecuted request can be discarded with [`delete_pending_action`],
//!    which frees its id for reuse.
//!
//! Request ids are a monotone sequence starting at 1; id 0 means "no such
//! request". Deleting the open slot decrements the sequence, which is safe
//! because only the latest, unexecuted id can ever be deleted.

use crate::approvals::{self, ApprovalError, RequestDomain};
use crate::config;
use crate::roles::{self, Role, RoleError};
use soroban_sdk::{contracterror, contractevent, contracttype, Address, Env};

/// Errors that can occur in the governance action pipeline
#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum ActionError {
    /// Caller lacks the role required for the operation
    Unauthorized = 1,
    /// An unexecuted action already occupies the slot
    ActionAlreadyPending = 2,
    /// No action with this id exists
    ActionNotFound = 3,
    /// Action has already been executed
    AlreadyExecuted = 4,
    /// Request timelock has not elapsed
    TimelockNotElapsed = 5,
    /// Owner-path execution requires the owner among the approvers
    ActionNotApproved = 6,
    /// Approvals below quorum threshold
    InsufficientApprovals = 7,
    /// AddSigner target is already a signer
    SignerAlreadyExists = 8,
    /// RemoveSigner target is not a signer
    SignerNotFound = 9,
    /// Action requires a target address
    InvalidTarget = 10,
    /// Value violates the increase/decrease contract or is out of range
    InvalidValue = 11,
    /// Quorum pool smaller than the threshold
    InsufficientSigners = 12,
    /// No executor is appointed
    MissingExecutor = 13,
    /// Approver has already signed off
    AlreadyApproved = 14,
    /// No approval on record to revoke
    NotApproved = 15,
    /// Target acquired a conflicting role before execution
    RoleConflict = 16,
    /// No unexecuted action to delete
    NothingPending = 17,
    /// Id sequence exhausted
    Overflow = 18,
}

impl From<ApprovalError> for ActionError {
    fn from(err: ApprovalError) -> Self {
        match err {
            ApprovalError::AlreadyApproved => ActionError::AlreadyApproved,
            ApprovalError::NotApproved => ActionError::NotApproved,
            ApprovalError::NotSigner => ActionError::Unauthorized,
        }
    }
}

impl From<RoleError> for ActionError {
    fn from(err: RoleError) -> Self {
        match err {
            RoleError::RoleConflict => ActionError::RoleConflict,
            RoleError::RoleNotHeld => ActionError::SignerNotFound,
            _ => ActionError::Unauthorized,
        }
    }
}

/// The enumerated administrative actions the pipeline can carry
#[contracttype]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[repr(u32)]
pub enum ActionKind {
    AddSigner = 0,
    RemoveSigner = 1,
    IncreaseTimelock = 2,
    DecreaseTimelock = 3,
    IncreaseThreshold = 4,
    DecreaseThreshold = 5,
}

/// A queued administrative action
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PendingAction {
    pub id: u64,
    pub initiator: Address,
    pub kind: ActionKind,
    /// Address operand, used by the signer kinds
    pub target: Option<Address>,
    /// Numeric operand, used by the timelock/threshold kinds
    pub value: u64,
    pub created_at: u64,
    pub executed: bool,
    pub was_overridden: bool,
}

/// Storage keys for the action pipeline
#[contracttype]
#[derive(Clone)]
pub enum ActionDataKey {
    /// Latest issued action id
    ActionCounter,
    /// Action record by id
    Action(u64),
}

/// Emitted when an action enters the pending slot
#[contractevent]
#[derive(Clone, Debug)]
pub struct ActionInitiatedEvent {
    pub id: u64,
    pub initiator: Address,
    pub kind: ActionKind,
    pub target: Option<Address>,
    pub value: u64,
    pub timestamp: u64,
}

/// Emitted on each approval or approval withdrawal
#[contractevent]
#[derive(Clone, Debug)]
pub struct ActionApprovalEvent {
    pub id: u64,
    pub approver: Address,
    pub approved: bool,
    pub approvals: u32,
}

/// Emitted when an action is executed
#[contractevent]
#[derive(Clone, Debug)]
pub struct ActionExecutedEvent {
    pub id: u64,
    pub executor: Address,
    pub was_overridden: bool,
    pub timestamp: u64,
}

/// Emitted when the open slot is deleted
#[contractevent]
#[derive(Clone, Debug)]
pub struct ActionDeletedEvent {
    pub id: u64,
    pub caller: Address,
    pub timestamp: u64,
}

/// Create a pending governance action.
///
/// The caller must be the owner or a signer. Fails while another action is
/// unexecuted, when the quorum pool cannot meet the threshold, or when no
/// executor is appointed — a request that could never be executed is
/// rejected up front.
pub fn initiate_action(
    env: &Env,
    initiator: Address,
    kind: ActionKind,
    target: Option<Address>,
    value: u64,
) -> Result<u64, ActionError> {
    initiator.require_auth();

    if !roles::is_valid_signer(env, &initiator) {
        return Err(ActionError::Unauthorized);
    }
    if roles::executor(env).is_none() {
        return Err(ActionError::MissingExecutor);
    }
    if roles::total_valid_signers(env) < config::quorum_threshold(env) {
        return Err(ActionError::InsufficientSigners);
    }
    if pending_action(env).is_some() {
        return Err(ActionError::ActionAlreadyPending);
    }

    validate_kind(env, kind, &target, value)?;

    let id = next_id(env)?;
    let action = PendingAction {
        id,
        initiator: initiator.clone(),
        kind,
        target: target.clone(),
        value,
        created_at: env.ledger().timestamp(),
        executed: false,
        was_overridden: false,
    };
    save_action(env, &action);
    env.storage()
        .persistent()
        .set(&ActionDataKey::ActionCounter, &id);

    ActionInitiatedEvent {
        id,
        initiator,
        kind,
        target,
        value,
        timestamp: action.created_at,
    }
    .publish(env);

    Ok(id)
}

/// Sign off on a pending action. Returns the updated approval count.
pub fn approve_action(env: &Env, approver: Address, id: u64) -> Result<u32, ActionError> {
    approver.require_auth();

    require_open(env, id)?;
    let count = approvals::record_approval(env, RequestDomain::Action, id, &approver)?;

    ActionApprovalEvent {
        id,
        approver,
        approved: true,
        approvals: count,
    }
    .publish(env);

    Ok(count)
}

/// Withdraw a previously recorded approval. Returns the updated count.
pub fn revoke_action_approval(env: &Env, approver: Address, id: u64) -> Result<u32, ActionError> {
    approver.require_auth();

    require_open(env, id)?;
    let count = approvals::revoke_approval(env, RequestDomain::Action, id, &approver)?;

    ActionApprovalEvent {
        id,
        approver,
        approved: false,
        approvals: count,
    }
    .publish(env);

    Ok(count)
}

/// Finalize a pending action once its timelock has elapsed.
///
/// The owner may execute only after approving the action itself and only
/// with quorum met. The executor may execute below quorum; that bypass is
/// recorded permanently on the request as `was_overridden`.
pub fn execute_action(env: &Env, caller: Address, id: u64) -> Result<(), ActionError> {
    caller.require_auth();

    if !roles::is_valid_executor(env, &caller) {
        return Err(ActionError::Unauthorized);
    }

    let mut action = action(env, id).ok_or(ActionError::ActionNotFound)?;
    if action.executed {
        return Err(ActionError::AlreadyExecuted);
    }

    let now = env.ledger().timestamp();
    if now < action.created_at.saturating_add(config::request_timelock(env)) {
        return Err(ActionError::TimelockNotElapsed);
    }

    let count = approvals::approval_count(env, RequestDomain::Action, id);
    let threshold = config::quorum_threshold(env);
    let mut overridden = false;
    if roles::is_owner(env, &caller) {
        if !approvals::has_approved(env, RequestDomain::Action, id, &caller) {
            return Err(ActionError::ActionNotApproved);
        }
        if count < threshold {
            return Err(ActionError::InsufficientApprovals);
        }
    } else if count < threshold {
        overridden = true;
    }

    // Finalize the request before touching role or config state.
    action.executed = true;
    action.was_overridden = overridden;
    save_action(env, &action);

    apply_kind(env, &action)?;

    ActionExecutedEvent {
        id,
        executor: caller,
        was_overridden: overridden,
        timestamp: now,
    }
    .publish(env);

    Ok(())
}

/// Discard the open slot. Only the latest, unexecuted action can be
/// deleted; its id is returned to the sequence and reused by the next
/// `initiate_action`.
pub fn delete_pending_action(env: &Env, caller: Address) -> Result<u64, ActionError> {
    caller.require_auth();

    if !roles::is_valid_executor(env, &caller) {
        return Err(ActionError::Unauthorized);
    }

    let counter = action_counter(env);
    let open: PendingAction = action(env, counter).ok_or(ActionError::NothingPending)?;
    if open.executed {
        return Err(ActionError::NothingPending);
    }

    env.storage()
        .persistent()
        .remove(&ActionDataKey::Action(counter));
    approvals::clear(env, RequestDomain::Action, counter);
    env.storage()
        .persistent()
        .set(&ActionDataKey::ActionCounter, &(counter - 1));

    ActionDeletedEvent {
        id: counter,
        caller,
        timestamp: env.ledger().timestamp(),
    }
    .publish(env);

    Ok(counter)
}

/// Latest issued action id; 0 when none has been created
pub fn action_counter(env: &Env) -> u64 {
    env.storage()
        .persistent()
        .get(&ActionDataKey::ActionCounter)
        .unwrap_or(0)
}

/// Action record by id
pub fn action(env: &Env, id: u64) -> Option<PendingAction> {
    if id == 0 {
        return None;
    }
    env.storage().persistent().get(&ActionDataKey::Action(id))
}

/// The unexecuted action occupying the slot, if any
pub fn pending_action(env: &Env) -> Option<PendingAction> {
    let open = action(env, action_counter(env))?;
    if open.executed {
        None
    } else {
        Some(open)
    }
}

fn validate_kind(
    env: &Env,
    kind: ActionKind,
    target: &Option<Address>,
    value: u64,
) -> Result<(), ActionError> {
    match kind {
        ActionKind::AddSigner => {
            let target = target.as_ref().ok_or(ActionError::InvalidTarget)?;
            match roles::role_of(env, target) {
                Some(Role::Signer) => Err(ActionError::SignerAlreadyExists),
                Some(_) => Err(ActionError::RoleConflict),
                None => Ok(()),
            }
        }
        ActionKind::RemoveSigner => {
            let target = target.as_ref().ok_or(ActionError::InvalidTarget)?;
            if !roles::is_signer(env, target) {
                return Err(ActionError::SignerNotFound);
            }
            Ok(())
        }
        ActionKind::IncreaseTimelock => {
            if value <= config::request_timelock(env) {
                return Err(ActionError::InvalidValue);
            }
            Ok(())
        }
        ActionKind::DecreaseTimelock => {
            if value == 0 || value >= config::request_timelock(env) {
                return Err(ActionError::InvalidValue);
            }
            Ok(())
        }
        ActionKind::IncreaseThreshold => {
            if value > u32::MAX as u64 || value <= config::quorum_threshold(env) as u64 {
                return Err(ActionError::InvalidValue);
            }
            Ok(())
        }
        ActionKind::DecreaseThreshold => {
            if value == 0 || value >= config::quorum_threshold(env) as u64 {
                return Err(ActionError::InvalidValue);
            }
            Ok(())
        }
    }
}

// Signer-referencing kinds are re-validated here rather than trusting the
// initiate-time check: the target's role may have changed while the
// request sat in the slot.
fn apply_kind(env: &Env, action: &PendingAction) -> Result<(), ActionError> {
    match action.kind {
        ActionKind::AddSigner => {
            let target = action.target.as_ref().ok_or(ActionError::InvalidTarget)?;
            roles::grant_signer(env, target)?;
        }
        ActionKind::RemoveSigner => {
            let target = action.target.as_ref().ok_or(ActionError::InvalidTarget)?;
            roles::revoke_signer(env, target)?;
        }
        ActionKind::IncreaseTimelock | ActionKind::DecreaseTimelock => {
            config::set_request_timelock(env, action.value)
                .map_err(|_| ActionError::InvalidValue)?;
        }
        ActionKind::IncreaseThreshold | ActionKind::DecreaseThreshold => {
            let threshold =
                u32::try_from(action.value).map_err(|_| ActionError::InvalidValue)?;
            config::set_quorum_threshold(env, threshold)
                .map_err(|_| ActionError::InvalidValue)?;
        }
    }
    Ok(())
}

fn next_id(env: &Env) -> Result<u64, ActionError> {
    action_counter(env)
        .checked_add(1)
        .ok_or(ActionError::Overflow)
}

fn save_action(env: &Env, action: &PendingAction) {
    env.storage()
        .persistent()
        .set(&ActionDataKey::Action(action.id), action);
}

fn require_open(env: &Env, id: u64) -> Result<(), ActionError> {
    let action = action(env, id).ok_or(ActionError::ActionNotFound)?;
    if action.executed {
        return Err(ActionError::AlreadyExecuted);
    }
    Ok(())
}
