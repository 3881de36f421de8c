//! # Custody Vault Contract
//!
//! A role-gated custody vault: pooled assets leave the contract, and its
//! own governance parameters change, only after a quorum of authorized
//! parties has approved a single pending request and a cooling-off period
//! has elapsed.
//!
//! Three roles gate every privileged operation. The **Owner** administers
//! the organization, the **Executor** finalizes requests (and may
//! force-execute below quorum once the timelock has elapsed — recorded
//! permanently for audit), and **Signers** form the approval pool. Each
//! pipeline holds at most one pending request at a time.

#![no_std]
use soroban_sdk::{contract, contractimpl, Address, Bytes, Env, Vec};

mod approvals;
mod config;
mod governance;
mod roles;
mod succession;
mod transactions;

pub use approvals::{ApprovalError, RequestDomain};
pub use config::ConfigError;
pub use governance::{ActionError, ActionKind, PendingAction};
pub use roles::{Role, RoleError, UserProfile};
pub use succession::{SuccessionError, SuccessionRequest};
pub use transactions::{PendingTransaction, TransactionError};


#[cfg(test)]
mod roles_test;



#[cfg(test)]
mod transactions_test;



#[contract]
pub struct VaultContract;

#[contractimpl]
impl VaultContract {
    /// Initialize the vault.
    ///
    /// Records the initial owner and the three governance parameters. All
    /// parameters must be positive; initialization is one-shot.
    ///
    /// # Arguments
    /// * `owner` - The initial owner address
    /// * `quorum_threshold` - Minimum approvals to execute without override
    /// * `request_timelock` - Minimum request age before execution, seconds
    /// * `override_timelock` - Minimum succession-request age, seconds
    ///
    /// # Errors
    /// - `AlreadyInitialized` - The vault has already been initialized
    /// - `InvalidThreshold` / `InvalidTimelock` - A parameter is zero
    pub fn initialize(
        env: Env,
        owner: Address,
        quorum_threshold: u32,
        request_timelock: u64,
        override_timelock: u64,
    ) -> Result<(), ConfigError> {
        if config::is_initialized(&env) {
            return Err(ConfigError::AlreadyInitialized);
        }

        config::set_quorum_threshold(&env, quorum_threshold)?;
        config::set_request_timelock(&env, request_timelock)?;
        config::set_override_timelock(&env, override_timelock)?;
        roles::set_initial_owner(&env, &owner);
        config::mark_initialized(&env);

        Ok(())
    }

    /// Configure the Stellar Asset Contract address standing in for native
    /// currency. Owner only; one-shot.
    pub fn set_native_asset(env: Env, caller: Address, asset: Address) -> Result<(), ConfigError> {
        caller.require_auth();
        if !roles::is_owner(&env, &caller) {
            return Err(ConfigError::Unauthorized);
        }
        config::set_native_asset(&env, &asset)
    }

    // ------------------------------------------------------------------
    // Role management
    // ------------------------------------------------------------------

    /// Add a signer directly. Owner only, and only while the organization
    /// has not yet reached quorum-worthy size — after that, signer-set
    /// changes must go through the governance action pipeline.
    ///
    /// # Errors
    /// - `Unauthorized` - Caller is not the owner
    /// - `GovernanceRequired` - Signer quorum is already reachable
    /// - `RoleConflict` - Target already holds a role
    pub fn add_signer(env: Env, caller: Address, account: Address) -> Result<(), RoleError> {
        caller.require_auth();
        if !roles::is_owner(&env, &caller) {
            return Err(RoleError::Unauthorized);
        }
        Self::require_bootstrap_phase(&env)?;
        roles::grant_signer(&env, &account)
    }

    /// Remove a signer directly. Same gating as [`add_signer`].
    pub fn remove_signer(env: Env, caller: Address, account: Address) -> Result<(), RoleError> {
        caller.require_auth();
        if !roles::is_owner(&env, &caller) {
            return Err(RoleError::Unauthorized);
        }
        Self::require_bootstrap_phase(&env)?;
        roles::revoke_signer(&env, &account)
    }

    /// Change the quorum threshold directly. Owner only, bootstrap phase
    /// only; afterwards threshold changes go through the pipeline.
    pub fn set_quorum_threshold(
        env: Env,
        caller: Address,
        threshold: u32,
    ) -> Result<(), ConfigError> {
        caller.require_auth();
        if !roles::is_owner(&env, &caller) {
            return Err(ConfigError::Unauthorized);
        }
        if roles::total_valid_signers(&env) >= config::quorum_threshold(&env) {
            return Err(ConfigError::GovernanceRequired);
        }
        config::set_quorum_threshold(&env, threshold)
    }

    /// Appoint the executor. Owner only. The slot must be empty — the
    /// previous executor must be removed first (or have succeeded to
    /// ownership, which empties the slot).
    pub fn set_executor(env: Env, caller: Address, account: Address) -> Result<(), RoleError> {
        caller.require_auth();
        if !roles::is_owner(&env, &caller) {
            return Err(RoleError::Unauthorized);
        }
        roles::grant_executor(&env, &account)
    }

    /// Remove the current executor. Owner only.
    pub fn remove_executor(env: Env, caller: Address) -> Result<(), RoleError> {
        caller.require_auth();
        if !roles::is_owner(&env, &caller) {
            return Err(RoleError::Unauthorized);
        }
        roles::revoke_executor(&env).map(|_| ())
    }

    // ------------------------------------------------------------------
    // Governance action pipeline
    // ------------------------------------------------------------------

    /// Create a pending governance action.
    ///
    /// # Arguments
    /// * `initiator` - Owner or signer (must authorize)
    /// * `kind` - The administrative action to queue
    /// * `target` - Address operand for the signer kinds
    /// * `value` - Numeric operand for the threshold/timelock kinds
    ///
    /// # Returns
    /// The id of the new request.
    ///
    /// # Errors
    /// - `ActionAlreadyPending` - An unexecuted action occupies the slot
    /// - `InsufficientSigners` / `MissingExecutor` - The request could
    ///   never become executable
    /// - Kind-specific validation errors (see [`ActionError`])
    pub fn initiate_action(
        env: Env,
        initiator: Address,
        kind: ActionKind,
        target: Option<Address>,
        value: u64,
    ) -> Result<u64, ActionError> {
        governance::initiate_action(&env, initiator, kind, target, value)
    }

    /// Sign off on a pending action. Owner or signer; once per address.
    pub fn approve_action(env: Env, approver: Address, id: u64) -> Result<u32, ActionError> {
        governance::approve_action(&env, approver, id)
    }

    /// Withdraw a previously recorded approval from a pending action.
    pub fn revoke_action_approval(
        env: Env,
        approver: Address,
        id: u64,
    ) -> Result<u32, ActionError> {
        governance::revoke_action_approval(&env, approver, id)
    }

    /// Execute a pending action once its timelock has elapsed.
    ///
    /// Owner path requires the owner's own approval and full quorum; the
    /// executor may execute below quorum, flagging the request
    /// `was_overridden` for audit.
    pub fn execute_action(env: Env, caller: Address, id: u64) -> Result<(), ActionError> {
        governance::execute_action(&env, caller, id)
    }

    /// Delete the open action slot. Owner or executor. Frees the id for
    /// reuse by the next initiation.
    pub fn delete_pending_action(env: Env, caller: Address) -> Result<u64, ActionError> {
        governance::delete_pending_action(&env, caller)
    }

    // ------------------------------------------------------------------
    // Asset transaction pipeline
    // ------------------------------------------------------------------

    /// Create a pending asset transfer out of the vault.
    ///
    /// # Arguments
    /// * `initiator` - Owner or signer (must authorize)
    /// * `recipient` - Transfer destination; must not be the vault
    /// * `asset` - Token contract, or `None` for the native asset
    /// * `amount` - Amount to transfer; must not exceed the current balance
    /// * `memo` - Opaque payload echoed on execution
    ///
    /// # Returns
    /// The id of the new request.
    ///
    /// # Errors
    /// - `TransactionAlreadyPending` - An unexecuted transfer occupies the slot
    /// - `InsufficientBalance` - The vault holds less than `amount`
    /// - `InvalidRecipient` / `InvalidAmount` - Malformed request
    pub fn initiate_transaction(
        env: Env,
        initiator: Address,
        recipient: Address,
        asset: Option<Address>,
        amount: i128,
        memo: Bytes,
    ) -> Result<u64, TransactionError> {
        transactions::initiate_transaction(&env, initiator, recipient, asset, amount, memo)
    }

    /// Sign off on a pending transfer. Owner or signer; once per address.
    pub fn approve_transaction(
        env: Env,
        approver: Address,
        id: u64,
    ) -> Result<u32, TransactionError> {
        transactions::approve_transaction(&env, approver, id)
    }

    /// Withdraw a previously recorded approval from a pending transfer.
    pub fn revoke_transaction_approval(
        env: Env,
        approver: Address,
        id: u64,
    ) -> Result<u32, TransactionError> {
        transactions::revoke_transaction_approval(&env, approver, id)
    }

    /// Execute a pending transfer once its timelock has elapsed. Same
    /// quorum/override rules as [`execute_action`]; the funds move in the
    /// same invocation or not at all.
    pub fn execute_transaction(env: Env, caller: Address, id: u64) -> Result<(), TransactionError> {
        transactions::execute_transaction(&env, caller, id)
    }

    /// Delete the open transaction slot. Owner or executor.
    pub fn delete_pending_transaction(env: Env, caller: Address) -> Result<u64, TransactionError> {
        transactions::delete_pending_transaction(&env, caller)
    }

    /// Pull tokens into custody against a pre-existing allowance from
    /// `from` to the vault.
    ///
    /// # Errors
    /// - `InsufficientAllowance` - Allowance smaller than `amount`
    /// - `InvalidAmount` - Amount is zero or negative
    pub fn deposit_token(
        env: Env,
        from: Address,
        asset: Address,
        amount: i128,
    ) -> Result<(), TransactionError> {
        transactions::deposit_token(&env, from, asset, amount)
    }

    // ------------------------------------------------------------------
    // Owner succession
    // ------------------------------------------------------------------

    /// Open an owner-succession request. Executor only.
    pub fn initiate_owner_override(env: Env, caller: Address) -> Result<(), SuccessionError> {
        succession::initiate_owner_override(&env, caller)
    }

    /// Finalize an active succession request once the override timelock
    /// has elapsed. The executor becomes owner and the executor slot
    /// empties.
    pub fn approve_owner_override(env: Env, caller: Address) -> Result<(), SuccessionError> {
        succession::approve_owner_override(&env, caller)
    }

    // ------------------------------------------------------------------
    // Views
    // ------------------------------------------------------------------

    /// Current owner, if initialized
    pub fn get_owner(env: Env) -> Option<Address> {
        roles::owner(&env)
    }

    /// Current executor, if appointed
    pub fn get_executor(env: Env) -> Option<Address> {
        roles::executor(&env)
    }

    /// All current signer addresses
    pub fn get_signers(env: Env) -> Vec<Address> {
        roles::signer_list(&env)
    }

    /// Directory entry for an active role holder
    pub fn get_user_profile(env: Env, account: Address) -> Option<UserProfile> {
        roles::profile(&env, &account)
    }

    /// Number of active role holders
    pub fn get_user_count(env: Env) -> u32 {
        roles::user_count(&env)
    }

    /// Number of addresses in the signer set
    pub fn get_signer_count(env: Env) -> u32 {
        roles::signer_count(&env)
    }

    pub fn get_quorum_threshold(env: Env) -> u32 {
        config::quorum_threshold(&env)
    }

    pub fn get_request_timelock(env: Env) -> u64 {
        config::request_timelock(&env)
    }

    pub fn get_override_timelock(env: Env) -> u64 {
        config::override_timelock(&env)
    }

    pub fn get_native_asset(env: Env) -> Option<Address> {
        config::native_asset(&env)
    }

    /// The unexecuted governance action occupying the slot, if any
    pub fn get_pending_action(env: Env) -> Option<PendingAction> {
        governance::pending_action(&env)
    }

    /// Governance action record by id (executed records included)
    pub fn get_action(env: Env, id: u64) -> Option<PendingAction> {
        governance::action(&env, id)
    }

    /// Addresses that have signed off on a governance action
    pub fn get_action_approvers(env: Env, id: u64) -> Vec<Address> {
        approvals::approvers(&env, RequestDomain::Action, id)
    }

    pub fn get_action_approval_count(env: Env, id: u64) -> u32 {
        approvals::approval_count(&env, RequestDomain::Action, id)
    }

    /// The unexecuted transfer occupying the slot, if any
    pub fn get_pending_transaction(env: Env) -> Option<PendingTransaction> {
        transactions::pending_transaction(&env)
    }

    /// Transaction record by id (executed records included)
    pub fn get_transaction(env: Env, id: u64) -> Option<PendingTransaction> {
        transactions::transaction(&env, id)
    }

    /// Addresses that have signed off on a transfer
    pub fn get_transaction_approvers(env: Env, id: u64) -> Vec<Address> {
        approvals::approvers(&env, RequestDomain::Transaction, id)
    }

    pub fn get_transaction_approval_count(env: Env, id: u64) -> u32 {
        approvals::approval_count(&env, RequestDomain::Transaction, id)
    }

    /// The succession request, if one has been recorded
    pub fn get_succession_request(env: Env) -> Option<SuccessionRequest> {
        succession::request(&env)
    }

    /// Vault balance of the configured native asset
    pub fn get_native_balance(env: Env) -> Result<i128, TransactionError> {
        transactions::native_balance(&env)
    }

    /// Vault balance of an arbitrary token
    pub fn get_token_balance(env: Env, asset: Address) -> i128 {
        transactions::token_balance(&env, &asset)
    }
}

impl VaultContract {
    // Bootstrap phase = the quorum pool is still smaller than the
    // threshold. Administrative self-service closes once quorum is
    // reachable.
    fn require_bootstrap_phase(env: &Env) -> Result<(), RoleError> {
        if roles::total_valid_signers(env) >= config::quorum_threshold(env) {
            return Err(RoleError::GovernanceRequired);
        }
        Ok(())
    }
}
