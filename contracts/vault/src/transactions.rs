//! # Asset Transaction Pipeline
//!
//! Single-slot queue of pending asset transfers out of the vault, under
//! the same approval/timelock discipline as the governance pipeline.
//! `asset = None` means the configured native asset; `Some(address)` any
//! other token contract.
//!
//! The balance check at initiation is a liveness check, not a reservation:
//! funds can still leave between initiation and execution. Execution
//! persists the request as executed before issuing the external transfer;
//! a failing transfer traps in the host and the whole invocation reverts,
//! so bookkeeping and funds move together or not at all.
//!
//! Custody is funded by plain transfers to the vault address, or through
//! [`deposit_token`] which pulls tokens against a pre-existing allowance.

use crate::approvals::{self, ApprovalError, RequestDomain};
use crate::config;
use crate::roles;
use soroban_sdk::{contracterror, contractevent, contracttype, token, Address, Bytes, Env};

/// Errors that can occur in the asset transaction pipeline
#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum TransactionError {
    /// Caller lacks the role required for the operation
    Unauthorized = 1,
    /// An unexecuted transaction already occupies the slot
    TransactionAlreadyPending = 2,
    /// No transaction with this id exists
    TransactionNotFound = 3,
    /// Transaction has already been executed
    AlreadyExecuted = 4,
    /// Request timelock has not elapsed
    TimelockNotElapsed = 5,
    /// Owner-path execution requires the owner among the approvers
    TransactionNotApproved = 6,
    /// Approvals below quorum threshold
    InsufficientApprovals = 7,
    /// Recipient is missing or the vault itself
    InvalidRecipient = 8,
    /// Amount must be positive
    InvalidAmount = 9,
    /// Requested amount exceeds the vault's balance
    InsufficientBalance = 10,
    /// Spending allowance to the vault is too small
    InsufficientAllowance = 11,
    /// Quorum pool smaller than the threshold
    InsufficientSigners = 12,
    /// No executor is appointed
    MissingExecutor = 13,
    /// Approver has already signed off
    AlreadyApproved = 14,
    /// No approval on record to revoke
    NotApproved = 15,
    /// Native asset address has not been configured
    NativeAssetNotSet = 16,
    /// No unexecuted transaction to delete
    NothingPending = 17,
    /// Id sequence exhausted
    Overflow = 18,
}

impl From<ApprovalError> for TransactionError {
    fn from(err: ApprovalError) -> Self {
        match err {
            ApprovalError::AlreadyApproved => TransactionError::AlreadyApproved,
            ApprovalError::NotApproved => TransactionError::NotApproved,
            ApprovalError::NotSigner => TransactionError::Unauthorized,
        }
    }
}

/// A queued asset transfer
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PendingTransaction {
    pub id: u64,
    pub initiator: Address,
    pub recipient: Address,
    /// None = the configured native asset
    pub asset: Option<Address>,
    pub amount: i128,
    /// Opaque payload recorded with the request and echoed on execution
    pub memo: Bytes,
    pub created_at: u64,
    pub executed: bool,
    pub was_overridden: bool,
}

/// Storage keys for the transaction pipeline
#[contracttype]
#[derive(Clone)]
pub enum TransactionDataKey {
    /// Latest issued transaction id
    TransactionCounter,
    /// Transaction record by id
    Transaction(u64),
}

/// Emitted when a transfer enters the pending slot
#[contractevent]
#[derive(Clone, Debug)]
pub struct TransactionInitiatedEvent {
    pub id: u64,
    pub initiator: Address,
    pub recipient: Address,
    pub asset: Option<Address>,
    pub amount: i128,
    pub timestamp: u64,
}

/// Emitted on each approval or approval withdrawal
#[contractevent]
#[derive(Clone, Debug)]
pub struct TransactionApprovalEvent {
    pub id: u64,
    pub approver: Address,
    pub approved: bool,
    pub approvals: u32,
}

/// Emitted when a transfer is executed and funds leave the vault
#[contractevent]
#[derive(Clone, Debug)]
pub struct TransactionExecutedEvent {
    pub id: u64,
    pub executor: Address,
    pub recipient: Address,
    pub asset: Option<Address>,
    pub amount: i128,
    pub memo: Bytes,
    pub was_overridden: bool,
    pub timestamp: u64,
}

/// Emitted when the open slot is deleted
#[contractevent]
#[derive(Clone, Debug)]
pub struct TransactionDeletedEvent {
    pub id: u64,
    pub caller: Address,
    pub timestamp: u64,
}

/// Emitted when tokens are pulled into custody
#[contractevent]
#[derive(Clone, Debug)]
pub struct TokenDepositedEvent {
    pub from: Address,
    pub asset: Address,
    pub amount: i128,
    pub timestamp: u64,
}

/// Create a pending asset transfer.
///
/// The caller must be the owner or a signer, the recipient must not be the
/// vault itself, and the vault must currently hold at least `amount` of
/// the asset. The balance may still move before execution.
pub fn initiate_transaction(
    env: &Env,
    initiator: Address,
    recipient: Address,
    asset: Option<Address>,
    amount: i128,
    memo: Bytes,
) -> Result<u64, TransactionError> {
    initiator.require_auth();

    if !roles::is_valid_signer(env, &initiator) {
        return Err(TransactionError::Unauthorized);
    }
    if roles::executor(env).is_none() {
        return Err(TransactionError::MissingExecutor);
    }
    if roles::total_valid_signers(env) < config::quorum_threshold(env) {
        return Err(TransactionError::InsufficientSigners);
    }
    if pending_transaction(env).is_some() {
        return Err(TransactionError::TransactionAlreadyPending);
    }

    if amount <= 0 {
        return Err(TransactionError::InvalidAmount);
    }
    if recipient == env.current_contract_address() {
        return Err(TransactionError::InvalidRecipient);
    }

    let resolved = resolve_asset(env, &asset)?;
    let held = token::Client::new(env, &resolved).balance(&env.current_contract_address());
    if held < amount {
        return Err(TransactionError::InsufficientBalance);
    }

    let id = next_id(env)?;
    let tx = PendingTransaction {
        id,
        initiator: initiator.clone(),
        recipient: recipient.clone(),
        asset: asset.clone(),
        amount,
        memo,
        created_at: env.ledger().timestamp(),
        executed: false,
        was_overridden: false,
    };
    save_transaction(env, &tx);
    env.storage()
        .persistent()
        .set(&TransactionDataKey::TransactionCounter, &id);

    TransactionInitiatedEvent {
        id,
        initiator,
        recipient,
        asset,
        amount,
        timestamp: tx.created_at,
    }
    .publish(env);

    Ok(id)
}

/// Sign off on a pending transaction. Returns the updated approval count.
pub fn approve_transaction(env: &Env, approver: Address, id: u64) -> Result<u32, TransactionError> {
    approver.require_auth();

    require_open(env, id)?;
    let count = approvals::record_approval(env, RequestDomain::Transaction, id, &approver)?;

    TransactionApprovalEvent {
        id,
        approver,
        approved: true,
        approvals: count,
    }
    .publish(env);

    Ok(count)
}

/// Withdraw a previously recorded approval. Returns the updated count.
pub fn revoke_transaction_approval(
    env: &Env,
    approver: Address,
    id: u64,
) -> Result<u32, TransactionError> {
    approver.require_auth();

    require_open(env, id)?;
    let count = approvals::revoke_approval(env, RequestDomain::Transaction, id, &approver)?;

    TransactionApprovalEvent {
        id,
        approver,
        approved: false,
        approvals: count,
    }
    .publish(env);

    Ok(count)
}

/// Finalize a pending transfer once its timelock has elapsed.
///
/// Same gating as governance execution: owner path requires own approval
/// plus quorum; executor path below quorum proceeds with
/// `was_overridden = true`. The request is persisted as executed before
/// the transfer call; if the transfer fails the host reverts everything.
pub fn execute_transaction(env: &Env, caller: Address, id: u64) -> Result<(), TransactionError> {
    caller.require_auth();

    if !roles::is_valid_executor(env, &caller) {
        return Err(TransactionError::Unauthorized);
    }

    let mut tx = transaction(env, id).ok_or(TransactionError::TransactionNotFound)?;
    if tx.executed {
        return Err(TransactionError::AlreadyExecuted);
    }

    let now = env.ledger().timestamp();
    if now < tx.created_at.saturating_add(config::request_timelock(env)) {
        return Err(TransactionError::TimelockNotElapsed);
    }

    let count = approvals::approval_count(env, RequestDomain::Transaction, id);
    let threshold = config::quorum_threshold(env);
    let mut overridden = false;
    if roles::is_owner(env, &caller) {
        if !approvals::has_approved(env, RequestDomain::Transaction, id, &caller) {
            return Err(TransactionError::TransactionNotApproved);
        }
        if count < threshold {
            return Err(TransactionError::InsufficientApprovals);
        }
    } else if count < threshold {
        overridden = true;
    }

    let resolved = resolve_asset(env, &tx.asset)?;

    // Commit bookkeeping before the external call. A failed transfer traps
    // and rolls the whole invocation back.
    tx.executed = true;
    tx.was_overridden = overridden;
    save_transaction(env, &tx);

    token::Client::new(env, &resolved).transfer(
        &env.current_contract_address(),
        &tx.recipient,
        &tx.amount,
    );

    TransactionExecutedEvent {
        id,
        executor: caller,
        recipient: tx.recipient,
        asset: tx.asset,
        amount: tx.amount,
        memo: tx.memo,
        was_overridden: overridden,
        timestamp: now,
    }
    .publish(env);

    Ok(())
}

/// Discard the open slot. Only the latest, unexecuted transaction can be
/// deleted; its id is reused by the next `initiate_transaction`.
pub fn delete_pending_transaction(env: &Env, caller: Address) -> Result<u64, TransactionError> {
    caller.require_auth();

    if !roles::is_valid_executor(env, &caller) {
        return Err(TransactionError::Unauthorized);
    }

    let counter = transaction_counter(env);
    let open: PendingTransaction =
        transaction(env, counter).ok_or(TransactionError::NothingPending)?;
    if open.executed {
        return Err(TransactionError::NothingPending);
    }

    env.storage()
        .persistent()
        .remove(&TransactionDataKey::Transaction(counter));
    approvals::clear(env, RequestDomain::Transaction, counter);
    env.storage()
        .persistent()
        .set(&TransactionDataKey::TransactionCounter, &(counter - 1));

    TransactionDeletedEvent {
        id: counter,
        caller,
        timestamp: env.ledger().timestamp(),
    }
    .publish(env);

    Ok(counter)
}

/// Pull `amount` of `asset` from `from` into custody. Requires a
/// pre-existing spending allowance from `from` to the vault; an
/// insufficient allowance is reported explicitly rather than as a trap
/// inside the token contract.
pub fn deposit_token(
    env: &Env,
    from: Address,
    asset: Address,
    amount: i128,
) -> Result<(), TransactionError> {
    from.require_auth();

    if amount <= 0 {
        return Err(TransactionError::InvalidAmount);
    }

    let vault = env.current_contract_address();
    let client = token::Client::new(env, &asset);
    if client.allowance(&from, &vault) < amount {
        return Err(TransactionError::InsufficientAllowance);
    }

    client.transfer_from(&vault, &from, &vault, &amount);

    TokenDepositedEvent {
        from,
        asset,
        amount,
        timestamp: env.ledger().timestamp(),
    }
    .publish(env);

    Ok(())
}

/// Vault balance of the configured native asset
pub fn native_balance(env: &Env) -> Result<i128, TransactionError> {
    let asset = config::native_asset(env).ok_or(TransactionError::NativeAssetNotSet)?;
    Ok(token::Client::new(env, &asset).balance(&env.current_contract_address()))
}

/// Vault balance of an arbitrary token
pub fn token_balance(env: &Env, asset: &Address) -> i128 {
    token::Client::new(env, asset).balance(&env.current_contract_address())
}

/// Latest issued transaction id; 0 when none has been created
pub fn transaction_counter(env: &Env) -> u64 {
    env.storage()
        .persistent()
        .get(&TransactionDataKey::TransactionCounter)
        .unwrap_or(0)
}

/// Transaction record by id
pub fn transaction(env: &Env, id: u64) -> Option<PendingTransaction> {
    if id == 0 {
        return None;
    }
    env.storage()
        .persistent()
        .get(&TransactionDataKey::Transaction(id))
}

/// The unexecuted transaction occupying the slot, if any
pub fn pending_transaction(env: &Env) -> Option<PendingTransaction> {
    let open = transaction(env, transaction_counter(env))?;
    if open.executed {
        None
    } else {
        Some(open)
    }
}

fn resolve_asset(env: &Env, asset: &Option<Address>) -> Result<Address, TransactionError> {
    match asset {
        Some(token_address) => Ok(token_address.clone()),
        None => config::native_asset(env).ok_or(TransactionError::NativeAssetNotSet),
    }
}

fn next_id(env: &Env) -> Result<u64, TransactionError> {
    transaction_counter(env)
        .checked_add(1)
        .ok_or(TransactionError::Overflow)
}

fn save_transaction(env: &Env, tx: &PendingTransaction) {
    env.storage()
        .persistent()
        .set(&TransactionDataKey::Transaction(tx.id), tx);
}

fn require_open(env: &Env, id: u64) -> Result<(), TransactionError> {
    let tx = transaction(env, id).ok_or(TransactionError::TransactionNotFound)?;
    if tx.executed {
        return Err(TransactionError::AlreadyExecuted);
    }
    Ok(())
}
