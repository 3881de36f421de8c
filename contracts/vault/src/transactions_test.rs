use super::*;
use soroban_sdk::{
    testutils::{Address as _, Ledger},
    token, Address, Bytes, Env,
};

// Org at threshold 3 (owner + two signers), request timelock 100s, with a
// token and 10_000 units already in custody.
fn setup() -> (
    Env,
    Address,
    VaultContractClient<'static>,
    Address,
    Address,
    Address,
    Address,
    Address,
) {
    let env = Env::default();
    env.mock_all_auths();
    env.ledger().with_mut(|li| {
        li.timestamp = 1000;
    });

    let contract_id = env.register(VaultContract, ());
    let client = VaultContractClient::new(&env, &contract_id);

    let owner = Address::generate(&env);
    let executor = Address::generate(&env);
    let s1 = Address::generate(&env);
    let s2 = Address::generate(&env);

    client.initialize(&owner, &3, &100, &200);
    client.set_executor(&owner, &executor);
    client.add_signer(&owner, &s1);
    client.add_signer(&owner, &s2);

    let token_admin = Address::generate(&env);
    let asset = env
        .register_stellar_asset_contract_v2(token_admin.clone())
        .address();
    token::StellarAssetClient::new(&env, &asset).mint(&contract_id, &10_000);

    (env, contract_id, client, owner, executor, s1, s2, asset)
}

fn advance(env: &Env, by: u64) {
    env.ledger().with_mut(|li| {
        li.timestamp += by;
    });
}

#[test]
fn test_initiate_insufficient_balance() {
    let (env, _cid, client, owner, _executor, _s1, _s2, asset) = setup();

    let recipient = Address::generate(&env);
    let result = client.try_initiate_transaction(
        &owner,
        &recipient,
        &Some(asset.clone()),
        &10_001,
        &Bytes::new(&env),
    );
    assert_eq!(result, Err(Ok(TransactionError::InsufficientBalance)));

    // Never reached the pending slot
    assert_eq!(client.get_pending_transaction(), None);
}

#[test]
fn test_initiate_validations() {
    let (env, cid, client, owner, executor, _s1, _s2, asset) = setup();

    let recipient = Address::generate(&env);
    for amount in [0i128, -5] {
        let result = client.try_initiate_transaction(
            &owner,
            &recipient,
            &Some(asset.clone()),
            &amount,
            &Bytes::new(&env),
        );
        assert_eq!(result, Err(Ok(TransactionError::InvalidAmount)));
    }

    // The vault cannot pay itself
    let result = client.try_initiate_transaction(
        &owner,
        &cid,
        &Some(asset.clone()),
        &100,
        &Bytes::new(&env),
    );
    assert_eq!(result, Err(Ok(TransactionError::InvalidRecipient)));

    // The executor is outside the quorum pool
    let result = client.try_initiate_transaction(
        &executor,
        &recipient,
        &Some(asset),
        &100,
        &Bytes::new(&env),
    );
    assert_eq!(result, Err(Ok(TransactionError::Unauthorized)));
}

#[test]
fn test_single_slot_invariant() {
    let (env, _cid, client, owner, _executor, s1, _s2, asset) = setup();

    let recipient = Address::generate(&env);
    let id = client.initiate_transaction(
        &owner,
        &recipient,
        &Some(asset.clone()),
        &1_000,
        &Bytes::new(&env),
    );
    assert_eq!(id, 1);

    let result = client.try_initiate_transaction(
        &s1,
        &recipient,
        &Some(asset),
        &500,
        &Bytes::new(&env),
    );
    assert_eq!(result, Err(Ok(TransactionError::TransactionAlreadyPending)));
}

#[test]
fn test_full_transfer_flow() {
    let (env, cid, client, owner, executor, s1, s2, asset) = setup();

    let recipient = Address::generate(&env);
    let memo = Bytes::from_slice(&env, b"payroll-2026-08");
    let id = client.initiate_transaction(&owner, &recipient, &Some(asset.clone()), &1_000, &memo);

    client.approve_transaction(&owner, &id);
    client.approve_transaction(&s1, &id);
    client.approve_transaction(&s2, &id);

    advance(&env, 99);
    let result = client.try_execute_transaction(&executor, &id);
    assert_eq!(result, Err(Ok(TransactionError::TimelockNotElapsed)));

    advance(&env, 1);
    client.execute_transaction(&executor, &id);

    let token_client = token::Client::new(&env, &asset);
    assert_eq!(token_client.balance(&recipient), 1_000);
    assert_eq!(token_client.balance(&cid), 9_000);

    let tx = client.get_transaction(&id).unwrap();
    assert!(tx.executed);
    assert!(!tx.was_overridden);
    assert_eq!(tx.memo, memo);

    // Slot is free again; the sequence moves on
    assert_eq!(client.get_pending_transaction(), None);
    let id = client.initiate_transaction(
        &owner,
        &recipient,
        &Some(asset),
        &500,
        &Bytes::new(&env),
    );
    assert_eq!(id, 2);
}

#[test]
fn test_executor_override_below_quorum() {
    let (env, _cid, client, owner, executor, _s1, _s2, asset) = setup();

    let recipient = Address::generate(&env);
    let id = client.initiate_transaction(
        &owner,
        &recipient,
        &Some(asset.clone()),
        &2_000,
        &Bytes::new(&env),
    );
    client.approve_transaction(&owner, &id);
    advance(&env, 100);

    client.execute_transaction(&executor, &id);

    let tx = client.get_transaction(&id).unwrap();
    assert!(tx.executed);
    assert!(tx.was_overridden);
    assert_eq!(token::Client::new(&env, &asset).balance(&recipient), 2_000);
}

#[test]
fn test_owner_execution_gating() {
    let (env, _cid, client, owner, _executor, s1, _s2, asset) = setup();

    let recipient = Address::generate(&env);
    let id = client.initiate_transaction(
        &owner,
        &recipient,
        &Some(asset),
        &1_000,
        &Bytes::new(&env),
    );
    client.approve_transaction(&owner, &id);
    advance(&env, 100);

    // 1 of 3: the owner has no override privilege
    let result = client.try_execute_transaction(&owner, &id);
    assert_eq!(result, Err(Ok(TransactionError::InsufficientApprovals)));

    // A signer may never execute
    let result = client.try_execute_transaction(&s1, &id);
    assert_eq!(result, Err(Ok(TransactionError::Unauthorized)));
}

#[test]
fn test_balance_moved_after_initiation() {
    let (env, cid, client, owner, executor, s1, s2, asset) = setup();

    let recipient = Address::generate(&env);
    let id = client.initiate_transaction(
        &owner,
        &recipient,
        &Some(asset.clone()),
        &10_000,
        &Bytes::new(&env),
    );
    client.approve_transaction(&owner, &id);
    client.approve_transaction(&s1, &id);
    client.approve_transaction(&s2, &id);
    advance(&env, 100);

    // Funds leave custody out-of-band: the initiation check was a
    // liveness check, not a reservation
    let elsewhere = Address::generate(&env);
    token::Client::new(&env, &asset).transfer(&cid, &elsewhere, &5_000);

    let result = client.try_execute_transaction(&executor, &id);
    assert!(result.is_err());

    // The failed transfer rolled the whole call back
    let tx = client.get_transaction(&id).unwrap();
    assert!(!tx.executed);
    assert_eq!(token::Client::new(&env, &asset).balance(&cid), 5_000);
    assert_eq!(token::Client::new(&env, &asset).balance(&recipient), 0);
}

#[test]
fn test_native_asset_not_configured() {
    let (env, _cid, client, owner, _executor, _s1, _s2, _asset) = setup();

    let recipient = Address::generate(&env);
    let result =
        client.try_initiate_transaction(&owner, &recipient, &None, &100, &Bytes::new(&env));
    assert_eq!(result, Err(Ok(TransactionError::NativeAssetNotSet)));

    let result = client.try_get_native_balance();
    assert_eq!(result, Err(Ok(TransactionError::NativeAssetNotSet)));
}

#[test]
fn test_native_transfer_flow() {
    let (env, _cid, client, owner, executor, s1, s2, asset) = setup();

    client.set_native_asset(&owner, &asset);
    assert_eq!(client.get_native_balance(), 10_000);

    let recipient = Address::generate(&env);
    let id =
        client.initiate_transaction(&owner, &recipient, &None, &4_000, &Bytes::new(&env));
    client.approve_transaction(&owner, &id);
    client.approve_transaction(&s1, &id);
    client.approve_transaction(&s2, &id);
    advance(&env, 100);
    client.execute_transaction(&executor, &id);

    assert_eq!(client.get_native_balance(), 6_000);
    assert_eq!(token::Client::new(&env, &asset).balance(&recipient), 4_000);
}

#[test]
fn test_deposit_token_with_allowance() {
    let (env, cid, client, _owner, _executor, _s1, _s2, asset) = setup();

    let depositor = Address::generate(&env);
    token::StellarAssetClient::new(&env, &asset).mint(&depositor, &1_000);

    let token_client = token::Client::new(&env, &asset);
    token_client.approve(&depositor, &cid, &600, &100);

    client.deposit_token(&depositor, &asset, &600);
    assert_eq!(client.get_token_balance(&asset), 10_600);
    assert_eq!(token_client.balance(&depositor), 400);

    // Allowance is spent: the next pull is rejected up front
    let result = client.try_deposit_token(&depositor, &asset, &100);
    assert_eq!(result, Err(Ok(TransactionError::InsufficientAllowance)));

    let result = client.try_deposit_token(&depositor, &asset, &0);
    assert_eq!(result, Err(Ok(TransactionError::InvalidAmount)));
}

#[test]
fn test_delete_pending_transaction_frees_the_id() {
    let (env, _cid, client, owner, executor, s1, _s2, asset) = setup();

    let recipient = Address::generate(&env);
    let id = client.initiate_transaction(
        &owner,
        &recipient,
        &Some(asset.clone()),
        &1_000,
        &Bytes::new(&env),
    );
    assert_eq!(id, 1);
    client.approve_transaction(&owner, &id);
    client.approve_transaction(&s1, &id);

    assert_eq!(client.delete_pending_transaction(&owner), 1);
    assert_eq!(client.get_pending_transaction(), None);
    assert_eq!(client.get_transaction(&1), None);

    let result = client.try_delete_pending_transaction(&executor);
    assert_eq!(result, Err(Ok(TransactionError::NothingPending)));

    let id = client.initiate_transaction(
        &owner,
        &recipient,
        &Some(asset),
        &500,
        &Bytes::new(&env),
    );
    assert_eq!(id, 1);
    assert_eq!(client.get_transaction_approval_count(&id), 0);
}
