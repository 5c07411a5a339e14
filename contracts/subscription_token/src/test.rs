use super::*;
use crate::storage::{DAY_IN_LEDGERS, PERSISTENT_BUMP_AMOUNT};
use soroban_sdk::{
    testutils::{storage::Instance as _, Address as _, Ledger},
    Address, Env, String,
};

const START: u64 = 1_000;
const EXPIRY: u64 = START + 30 * 86_400;

struct Setup {
    env: Env,
    client: SubscriptionTokenClient<'static>,
    creator: Address,
}

fn setup() -> Setup {
    let env = Env::default();
    env.mock_all_auths();
    env.ledger().set_timestamp(START);

    let contract_id = env.register(SubscriptionToken, ());
    let client = SubscriptionTokenClient::new(&env, &contract_id);

    let admin = Address::generate(&env);
    client.initialize(
        &admin,
        &String::from_str(&env, "Tokenized Subscription"),
        &String::from_str(&env, "TSUB"),
        &String::from_str(&env, "https://api.tokensub.io/tokens/"),
    );

    let creator = Address::generate(&env);
    Setup {
        env,
        client,
        creator,
    }
}

fn create(s: &Setup, max_supply: i128) -> u32 {
    s.client.create_token(
        &s.creator,
        &String::from_str(&s.env, "netflix-premium"),
        &86_400u64,
        &EXPIRY,
        &max_supply,
        &s.creator,
    )
}

#[test]
fn test_initialize() {
    let s = setup();
    let admin = Address::generate(&s.env);

    let result = s.client.try_initialize(
        &admin,
        &String::from_str(&s.env, "Other"),
        &String::from_str(&s.env, "OTH"),
        &String::from_str(&s.env, ""),
    );
    assert_eq!(result, Err(Ok(Error::AlreadyInitialized)));

    assert_eq!(s.client.name(), String::from_str(&s.env, "Tokenized Subscription"));
    assert_eq!(s.client.symbol(), String::from_str(&s.env, "TSUB"));
}

#[test]
fn test_create_token_credits_full_supply() {
    let s = setup();
    let recipient = Address::generate(&s.env);

    let token_id = s.client.create_token(
        &s.creator,
        &String::from_str(&s.env, "spotify-family"),
        &3_600u64,
        &EXPIRY,
        &100i128,
        &recipient,
    );
    assert_eq!(token_id, 1);
    assert_eq!(s.client.token_counter(), 1);

    let token = s.client.token_info(&token_id);
    assert_eq!(token.creator, s.creator);
    assert_eq!(token.time_unit, 3_600);
    assert_eq!(token.expiry_time, EXPIRY);
    assert_eq!(token.max_supply, 100);
    assert_eq!(token.current_supply, 100);
    assert!(token.is_active);
    assert_eq!(token.price, 0);

    assert_eq!(s.client.balance_of(&recipient, &token_id), 100);
    assert_eq!(s.client.balance_of(&s.creator, &token_id), 0);

    assert_eq!(create(&s, 5), 2);
}

#[test]
fn test_create_token_rejects_invalid_parameters() {
    let s = setup();
    let service = String::from_str(&s.env, "netflix");

    let past = s
        .client
        .try_create_token(&s.creator, &service, &60u64, &START, &10i128, &s.creator);
    assert_eq!(past, Err(Ok(Error::InvalidParameters)));

    let zero_supply = s
        .client
        .try_create_token(&s.creator, &service, &60u64, &EXPIRY, &0i128, &s.creator);
    assert_eq!(zero_supply, Err(Ok(Error::InvalidParameters)));

    let zero_unit = s
        .client
        .try_create_token(&s.creator, &service, &0u64, &EXPIRY, &10i128, &s.creator);
    assert_eq!(zero_unit, Err(Ok(Error::InvalidParameters)));

    let bad_service = s.client.try_create_token(
        &s.creator,
        &String::from_str(&s.env, "not a service id"),
        &60u64,
        &EXPIRY,
        &10i128,
        &s.creator,
    );
    assert_eq!(bad_service, Err(Ok(Error::InvalidParameters)));

    assert_eq!(s.client.token_counter(), 0);
}

#[test]
fn test_balance_of_unknown_pair_is_zero() {
    let s = setup();
    let stranger = Address::generate(&s.env);
    assert_eq!(s.client.balance_of(&stranger, &42u32), 0);
    assert_eq!(s.client.try_token_info(&42u32), Err(Ok(Error::TokenNotFound)));
}

#[test]
fn test_transfer() {
    let s = setup();
    let token_id = create(&s, 100);
    let user = Address::generate(&s.env);

    s.client.transfer(&s.creator, &user, &token_id, &40i128);

    assert_eq!(s.client.balance_of(&s.creator, &token_id), 60);
    assert_eq!(s.client.balance_of(&user, &token_id), 40);

    // self-transfer is a no-op on balances
    s.client.transfer(&user, &user, &token_id, &40i128);
    assert_eq!(s.client.balance_of(&user, &token_id), 40);
}

#[test]
fn test_insufficient_balance_error() {
    let s = setup();
    let token_id = create(&s, 100);
    let user = Address::generate(&s.env);

    let result = s.client.try_transfer(&s.creator, &user, &token_id, &101i128);
    assert_eq!(result, Err(Ok(Error::InsufficientBalance)));

    let zero = s.client.try_transfer(&s.creator, &user, &token_id, &0i128);
    assert_eq!(zero, Err(Ok(Error::InvalidParameters)));

    assert_eq!(s.client.balance_of(&s.creator, &token_id), 100);
}

#[test]
fn test_transfer_rejected_after_expiry_but_balances_queryable() {
    let s = setup();
    let token_id = create(&s, 100);
    let user = Address::generate(&s.env);
    s.client.transfer(&s.creator, &user, &token_id, &10i128);

    s.env.ledger().set_timestamp(EXPIRY);

    let result = s.client.try_transfer(&user, &s.creator, &token_id, &5i128);
    assert_eq!(result, Err(Ok(Error::InactiveToken)));

    assert_eq!(s.client.balance_of(&user, &token_id), 10);
    assert_eq!(s.client.balance_of(&s.creator, &token_id), 90);
}

#[test]
fn test_deactivate_if_expired_is_idempotent() {
    let s = setup();
    let token_id = create(&s, 100);

    assert!(!s.client.deactivate_if_expired(&token_id));
    assert!(s.client.token_info(&token_id).is_active);

    s.env.ledger().set_timestamp(EXPIRY + 1);

    assert!(s.client.deactivate_if_expired(&token_id));
    assert!(!s.client.deactivate_if_expired(&token_id));

    let token = s.client.token_info(&token_id);
    assert!(!token.is_active);
    assert_eq!(token.current_supply, 100);
    assert_eq!(s.client.balance_of(&s.creator, &token_id), 100);
}

#[test]
fn test_burn_then_mint_respects_max_supply() {
    let s = setup();
    let token_id = create(&s, 100);

    let full = s.client.try_mint(&token_id, &s.creator, &1i128);
    assert_eq!(full, Err(Ok(Error::SupplyCapExceeded)));

    s.client.burn(&token_id, &s.creator, &30i128);
    assert_eq!(s.client.token_info(&token_id).current_supply, 70);

    let user = Address::generate(&s.env);
    s.client.mint(&token_id, &user, &20i128);
    let token = s.client.token_info(&token_id);
    assert_eq!(token.current_supply, 90);
    assert!(token.current_supply <= token.max_supply);
    assert_eq!(s.client.balance_of(&user, &token_id), 20);

    let over = s.client.try_mint(&token_id, &user, &11i128);
    assert_eq!(over, Err(Ok(Error::SupplyCapExceeded)));

    s.client.mint(&token_id, &user, &10i128);
    assert_eq!(s.client.token_info(&token_id).current_supply, 100);
}

#[test]
fn test_burn_insufficient_balance() {
    let s = setup();
    let token_id = create(&s, 100);
    let user = Address::generate(&s.env);

    let result = s.client.try_burn(&token_id, &user, &1i128);
    assert_eq!(result, Err(Ok(Error::InsufficientBalance)));
}

#[test]
fn test_inactive_token_rejects_mint() {
    let s = setup();
    let token_id = create(&s, 100);
    s.client.burn(&token_id, &s.creator, &50i128);

    s.client.deactivate_token(&token_id);
    assert!(!s.client.token_info(&token_id).is_active);

    let result = s.client.try_mint(&token_id, &s.creator, &1i128);
    assert_eq!(result, Err(Ok(Error::InactiveToken)));

    let again = s.client.try_deactivate_token(&token_id);
    assert_eq!(again, Err(Ok(Error::InactiveToken)));

    // deactivated but unexpired units can still move
    let user = Address::generate(&s.env);
    s.client.transfer(&s.creator, &user, &token_id, &5i128);
    assert_eq!(s.client.balance_of(&user, &token_id), 5);
}

#[test]
fn test_expired_token_rejects_mint() {
    let s = setup();
    let token_id = create(&s, 100);
    s.client.burn(&token_id, &s.creator, &10i128);

    s.env.ledger().set_timestamp(EXPIRY);

    let result = s.client.try_mint(&token_id, &s.creator, &1i128);
    assert_eq!(result, Err(Ok(Error::InactiveToken)));

    // retiring dead inventory is still allowed
    s.client.burn(&token_id, &s.creator, &90i128);
    assert_eq!(s.client.token_info(&token_id).current_supply, 0);
}

#[test]
fn test_transfer_from_requires_approval() {
    let s = setup();
    let token_id = create(&s, 100);
    let operator = Address::generate(&s.env);
    let user = Address::generate(&s.env);

    let denied = s
        .client
        .try_transfer_from(&operator, &s.creator, &user, &token_id, &10i128);
    assert_eq!(denied, Err(Ok(Error::Unauthorized)));

    s.client.set_approval_for_all(&s.creator, &operator, &true);
    assert!(s.client.is_approved_for_all(&s.creator, &operator));

    s.client
        .transfer_from(&operator, &s.creator, &user, &token_id, &10i128);
    assert_eq!(s.client.balance_of(&user, &token_id), 10);

    s.client.set_approval_for_all(&s.creator, &operator, &false);
    assert!(!s.client.is_approved_for_all(&s.creator, &operator));

    let revoked = s
        .client
        .try_transfer_from(&operator, &s.creator, &user, &token_id, &10i128);
    assert_eq!(revoked, Err(Ok(Error::Unauthorized)));
}

#[test]
fn test_set_price() {
    let s = setup();
    let token_id = create(&s, 100);

    s.client.set_price(&token_id, &25_000_000i128);
    assert_eq!(s.client.token_info(&token_id).price, 25_000_000);

    let negative = s.client.try_set_price(&token_id, &-1i128);
    assert_eq!(negative, Err(Ok(Error::InvalidParameters)));
}

#[test]
fn test_token_uri() {
    let s = setup();
    let token_id = create(&s, 100);

    assert_eq!(
        s.client.token_uri(&token_id),
        String::from_str(&s.env, "https://api.tokensub.io/tokens/1")
    );

    s.client
        .set_base_uri(&String::from_str(&s.env, "ipfs://subs/"));
    assert_eq!(
        s.client.token_uri(&token_id),
        String::from_str(&s.env, "ipfs://subs/1")
    );

    assert_eq!(s.client.try_token_uri(&9u32), Err(Ok(Error::TokenNotFound)));
}

fn instance_ttl(s: &Setup) -> u32 {
    s.env
        .as_contract(&s.client.address, || s.env.storage().instance().get_ttl())
}

fn skip_days(s: &Setup, days: u32) {
    let sequence = s.env.ledger().sequence();
    s.env
        .ledger()
        .set_sequence_number(sequence + days * DAY_IN_LEDGERS);
}

#[test]
fn test_balance_updates_extend_instance_ttl() {
    let s = setup();
    let token_id = create(&s, 100);
    let user = Address::generate(&s.env);
    assert_eq!(instance_ttl(&s), PERSISTENT_BUMP_AMOUNT);

    skip_days(&s, 2);
    assert!(instance_ttl(&s) < PERSISTENT_BUMP_AMOUNT);
    s.client.transfer(&s.creator, &user, &token_id, &10i128);
    assert_eq!(instance_ttl(&s), PERSISTENT_BUMP_AMOUNT);

    skip_days(&s, 2);
    s.client.burn(&token_id, &user, &10i128);
    assert_eq!(instance_ttl(&s), PERSISTENT_BUMP_AMOUNT);

    skip_days(&s, 2);
    s.client.mint(&token_id, &user, &5i128);
    assert_eq!(instance_ttl(&s), PERSISTENT_BUMP_AMOUNT);
}
