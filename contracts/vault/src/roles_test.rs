use super::*;
use soroban_sdk::{testutils::Address as _, Address, Env};

fn setup(threshold: u32) -> (Env, VaultContractClient<'static>, Address) {
    let env = Env::default();
    env.mock_all_auths();

    let contract_id = env.register(VaultContract, ());
    let client = VaultContractClient::new(&env, &contract_id);

    let owner = Address::generate(&env);
    client.initialize(&owner, &threshold, &100, &200);
    (env, client, owner)
}

#[test]
fn test_initialize_sets_owner_and_profile() {
    let (_env, client, owner) = setup(3);

    assert_eq!(client.get_owner(), Some(owner.clone()));
    assert_eq!(client.get_executor(), None);
    assert_eq!(client.get_signer_count(), 0);
    assert_eq!(client.get_user_count(), 1);

    let profile = client.get_user_profile(&owner).unwrap();
    assert_eq!(profile.address, owner);
    assert_eq!(profile.role, Role::Owner);
}

#[test]
fn test_initialize_twice_fails() {
    let (env, client, _owner) = setup(3);

    let other = Address::generate(&env);
    let result = client.try_initialize(&other, &1, &100, &200);
    assert_eq!(result, Err(Ok(ConfigError::AlreadyInitialized)));
}

#[test]
fn test_initialize_validates_parameters() {
    let env = Env::default();
    env.mock_all_auths();

    let contract_id = env.register(VaultContract, ());
    let client = VaultContractClient::new(&env, &contract_id);
    let owner = Address::generate(&env);

    let result = client.try_initialize(&owner, &0, &100, &200);
    assert_eq!(result, Err(Ok(ConfigError::InvalidThreshold)));

    let result = client.try_initialize(&owner, &1, &0, &200);
    assert_eq!(result, Err(Ok(ConfigError::InvalidTimelock)));

    let result = client.try_initialize(&owner, &1, &100, &0);
    assert_eq!(result, Err(Ok(ConfigError::InvalidTimelock)));

    // Nothing was recorded by the failed attempts
    assert_eq!(client.get_owner(), None);
}

#[test]
fn test_set_and_remove_executor() {
    let (env, client, owner) = setup(3);

    let executor = Address::generate(&env);
    client.set_executor(&owner, &executor);

    assert_eq!(client.get_executor(), Some(executor.clone()));
    assert_eq!(client.get_user_count(), 2);
    let profile = client.get_user_profile(&executor).unwrap();
    assert_eq!(profile.role, Role::Executor);

    client.remove_executor(&owner);
    assert_eq!(client.get_executor(), None);
    assert_eq!(client.get_user_profile(&executor), None);
    assert_eq!(client.get_user_count(), 1);
}

#[test]
fn test_executor_slot_conflicts() {
    let (env, client, owner) = setup(3);

    // Owner cannot take the executor slot
    let result = client.try_set_executor(&owner, &owner);
    assert_eq!(result, Err(Ok(RoleError::RoleConflict)));

    let executor = Address::generate(&env);
    client.set_executor(&owner, &executor);

    // Occupied slot
    let other = Address::generate(&env);
    let result = client.try_set_executor(&owner, &other);
    assert_eq!(result, Err(Ok(RoleError::ExecutorAlreadySet)));

    // A signer cannot become executor without losing the signer role first
    client.remove_executor(&owner);
    let signer = Address::generate(&env);
    client.add_signer(&owner, &signer);
    let result = client.try_set_executor(&owner, &signer);
    assert_eq!(result, Err(Ok(RoleError::RoleConflict)));
}

#[test]
fn test_add_signer_bootstrap_window() {
    let (env, client, owner) = setup(3);

    // Owner counts toward the pool, so two signers reach the threshold of 3
    let s1 = Address::generate(&env);
    let s2 = Address::generate(&env);
    client.add_signer(&owner, &s1);
    client.add_signer(&owner, &s2);
    assert_eq!(client.get_signer_count(), 2);

    // Quorum is now reachable: self-service closes
    let s3 = Address::generate(&env);
    let result = client.try_add_signer(&owner, &s3);
    assert_eq!(result, Err(Ok(RoleError::GovernanceRequired)));

    let result = client.try_remove_signer(&owner, &s1);
    assert_eq!(result, Err(Ok(RoleError::GovernanceRequired)));
}

#[test]
fn test_add_signer_twice_fails() {
    let (env, client, owner) = setup(5);

    let signer = Address::generate(&env);
    client.add_signer(&owner, &signer);

    let result = client.try_add_signer(&owner, &signer);
    assert_eq!(result, Err(Ok(RoleError::RoleConflict)));
    assert_eq!(client.get_signer_count(), 1);
}

#[test]
fn test_remove_signer_not_held() {
    let (env, client, owner) = setup(3);

    let stranger = Address::generate(&env);
    let result = client.try_remove_signer(&owner, &stranger);
    assert_eq!(result, Err(Ok(RoleError::RoleNotHeld)));
}

#[test]
fn test_roles_are_pairwise_disjoint() {
    let (env, client, owner) = setup(5);

    let executor = Address::generate(&env);
    let signer = Address::generate(&env);
    client.set_executor(&owner, &executor);
    client.add_signer(&owner, &signer);

    // Every cross-role grant is rejected
    assert_eq!(
        client.try_add_signer(&owner, &owner),
        Err(Ok(RoleError::RoleConflict))
    );
    assert_eq!(
        client.try_add_signer(&owner, &executor),
        Err(Ok(RoleError::RoleConflict))
    );

    let signers = client.get_signers();
    assert!(signers.contains(signer.clone()));
    assert!(!signers.contains(owner.clone()));
    assert!(!signers.contains(executor.clone()));
}

#[test]
fn test_non_owner_cannot_manage_roles() {
    let (env, client, owner) = setup(3);

    let executor = Address::generate(&env);
    client.set_executor(&owner, &executor);

    let account = Address::generate(&env);
    assert_eq!(
        client.try_add_signer(&executor, &account),
        Err(Ok(RoleError::Unauthorized))
    );
    assert_eq!(
        client.try_remove_executor(&executor),
        Err(Ok(RoleError::Unauthorized))
    );
    assert_eq!(
        client.try_set_executor(&account, &account),
        Err(Ok(RoleError::Unauthorized))
    );
}

#[test]
fn test_set_quorum_threshold_bootstrap_only() {
    let (env, client, owner) = setup(3);

    // Pool of 1 < 3: still bootstrap phase
    client.set_quorum_threshold(&owner, &2);
    assert_eq!(client.get_quorum_threshold(), 2);

    let s1 = Address::generate(&env);
    client.add_signer(&owner, &s1);

    // Pool of 2 reaches the threshold of 2: closed
    let result = client.try_set_quorum_threshold(&owner, &5);
    assert_eq!(result, Err(Ok(ConfigError::GovernanceRequired)));

    // Validation still applies during bootstrap
    let (_env2, client2, owner2) = setup(3);
    let result = client2.try_set_quorum_threshold(&owner2, &0);
    assert_eq!(result, Err(Ok(ConfigError::InvalidThreshold)));
}

#[test]
fn test_set_native_asset_once() {
    let (env, client, owner) = setup(3);

    let asset = Address::generate(&env);
    client.set_native_asset(&owner, &asset);
    assert_eq!(client.get_native_asset(), Some(asset.clone()));

    let other = Address::generate(&env);
    let result = client.try_set_native_asset(&owner, &other);
    assert_eq!(result, Err(Ok(ConfigError::NativeAssetAlreadySet)));

    let stranger = Address::generate(&env);
    let result = client.try_set_native_asset(&stranger, &other);
    assert_eq!(result, Err(Ok(ConfigError::Unauthorized)));
}
