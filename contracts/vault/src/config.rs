//! Governed configuration state: quorum threshold, request timelock and
//! owner-override timelock, plus the native asset address. Thresholds and
//! timelocks are set at initialization and change only through the
//! bootstrap shortcut or governance-action execution; there is no direct
//! unguarded assignment path.

use soroban_sdk::{contracterror, contractevent, contracttype, Address, Env};

/// Errors that can occur during configuration operations
#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum ConfigError {
    /// Vault has already been initialized
    AlreadyInitialized = 1,
    /// Caller is not the owner
    Unauthorized = 2,
    /// Quorum threshold must be a positive integer
    InvalidThreshold = 3,
    /// Timelocks must be positive durations
    InvalidTimelock = 4,
    /// Native asset address has not been configured
    NativeAssetNotSet = 5,
    /// Native asset address is already configured
    NativeAssetAlreadySet = 6,
    /// Signer quorum is reachable; the change must go through the
    /// governance action pipeline
    GovernanceRequired = 7,
}

/// Storage keys for configuration state
#[contracttype]
#[derive(Clone)]
pub enum ConfigDataKey {
    Initialized,
    QuorumThreshold,
    RequestTimelock,
    OverrideTimelock,
    NativeAsset,
}

/// Emitted when the quorum threshold changes
#[contractevent]
#[derive(Clone, Debug)]
pub struct ThresholdUpdatedEvent {
    pub threshold: u32,
    pub timestamp: u64,
}

/// Emitted when the request timelock changes
#[contractevent]
#[derive(Clone, Debug)]
pub struct TimelockUpdatedEvent {
    pub timelock: u64,
    pub timestamp: u64,
}

/// Emitted when the native asset address is configured
#[contractevent]
#[derive(Clone, Debug)]
pub struct NativeAssetSetEvent {
    pub asset: Address,
    pub timestamp: u64,
}

pub fn is_initialized(env: &Env) -> bool {
    env.storage().instance().has(&ConfigDataKey::Initialized)
}

pub fn mark_initialized(env: &Env) {
    env.storage()
        .instance()
        .set(&ConfigDataKey::Initialized, &true);
}

/// Minimum distinct approvals to execute a request without override
pub fn quorum_threshold(env: &Env) -> u32 {
    env.storage()
        .persistent()
        .get(&ConfigDataKey::QuorumThreshold)
        .unwrap_or(1)
}

/// Minimum age a request must reach before execution, in seconds
pub fn request_timelock(env: &Env) -> u64 {
    env.storage()
        .persistent()
        .get(&ConfigDataKey::RequestTimelock)
        .unwrap_or(0)
}

/// Minimum age an owner-succession request must reach, in seconds
pub fn override_timelock(env: &Env) -> u64 {
    env.storage()
        .persistent()
        .get(&ConfigDataKey::OverrideTimelock)
        .unwrap_or(0)
}

/// The Stellar Asset Contract address standing in for native currency
pub fn native_asset(env: &Env) -> Option<Address> {
    env.storage().persistent().get(&ConfigDataKey::NativeAsset)
}

pub fn set_quorum_threshold(env: &Env, threshold: u32) -> Result<(), ConfigError> {
    if threshold == 0 {
        return Err(ConfigError::InvalidThreshold);
    }
    env.storage()
        .persistent()
        .set(&ConfigDataKey::QuorumThreshold, &threshold);
    ThresholdUpdatedEvent {
        threshold,
        timestamp: env.ledger().timestamp(),
    }
    .publish(env);
    Ok(())
}

pub fn set_request_timelock(env: &Env, timelock: u64) -> Result<(), ConfigError> {
    if timelock == 0 {
        return Err(ConfigError::InvalidTimelock);
    }
    env.storage()
        .persistent()
        .set(&ConfigDataKey::RequestTimelock, &timelock);
    TimelockUpdatedEvent {
        timelock,
        timestamp: env.ledger().timestamp(),
    }
    .publish(env);
    Ok(())
}

pub fn set_override_timelock(env: &Env, timelock: u64) -> Result<(), ConfigError> {
    if timelock == 0 {
        return Err(ConfigError::InvalidTimelock);
    }
    env.storage()
        .persistent()
        .set(&ConfigDataKey::OverrideTimelock, &timelock);
    Ok(())
}

/// Configure the native asset address. One-shot: repointing the native
/// asset under a pending native transfer is not allowed.
pub fn set_native_asset(env: &Env, asset: &Address) -> Result<(), ConfigError> {
    if native_asset(env).is_some() {
        return Err(ConfigError::NativeAssetAlreadySet);
    }
    env.storage()
        .persistent()
        .set(&ConfigDataKey::NativeAsset, asset);
    NativeAssetSetEvent {
        asset: asset.clone(),
        timestamp: env.ledger().timestamp(),
    }
    .publish(env);
    Ok(())
}
