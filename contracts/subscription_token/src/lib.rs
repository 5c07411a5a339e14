#![no_std]

mod error;
mod events;
mod metadata;
mod storage;

pub use error::Error;
pub use storage::{Metadata, Token};

use events::{
    ApprovalForAllEvent, BurnEvent, MintEvent, TokenCreatedEvent, TokenDeactivatedEvent,
    TransferEvent,
};
use storage::{DataKey, Storage};

use soroban_sdk::{contract, contractimpl, log, Address, Env, String, Symbol};

#[contract]
pub struct SubscriptionToken;

#[contractimpl]
impl SubscriptionToken {
    /// Initialize the token contract
    ///
    /// # Errors
    /// - `AlreadyInitialized`: Contract already initialized
    /// - `InvalidParameters`: Empty name/symbol or oversized base URI
    pub fn initialize(
        env: Env,
        admin: Address,
        name: String,
        symbol: String,
        base_uri: String,
    ) -> Result<(), Error> {
        if Storage::is_initialized(&env) {
            return Err(Error::AlreadyInitialized);
        }

        admin.require_auth();
        metadata::validate_collection(&name, &symbol, &base_uri)?;

        env.storage().instance().set(&DataKey::Initialized, &true);
        env.storage().instance().set(&DataKey::Admin, &admin);
        Storage::set_metadata(
            &env,
            &Metadata {
                name,
                symbol,
                base_uri,
            },
        );
        Storage::set_token_counter(&env, 0);

        Ok(())
    }

    /// Replace the base URI used by `token_uri`
    ///
    /// # Errors
    /// - `NotInitialized`: Contract not initialized
    /// - `InvalidParameters`: URI longer than 200 bytes
    pub fn set_base_uri(env: Env, base_uri: String) -> Result<(), Error> {
        let admin = Storage::get_admin(&env).ok_or(Error::NotInitialized)?;
        admin.require_auth();

        metadata::validate_base_uri(&base_uri)?;

        let mut meta = Storage::get_metadata(&env).ok_or(Error::NotInitialized)?;
        meta.base_uri = base_uri;
        Storage::set_metadata(&env, &meta);

        Ok(())
    }

    // ============================================
    // ISSUANCE
    // ============================================

    /// Create a new subscription token, crediting the whole supply to `recipient`
    ///
    /// # Errors
    /// - `NotInitialized`: Contract not initialized
    /// - `InvalidParameters`: `time_unit == 0`, `expiry_time <= now`,
    ///   `max_supply <= 0`, or malformed `service_id`
    pub fn create_token(
        env: Env,
        creator: Address,
        service_id: String,
        time_unit: u64,
        expiry_time: u64,
        max_supply: i128,
        recipient: Address,
    ) -> Result<u32, Error> {
        if !Storage::is_initialized(&env) {
            return Err(Error::NotInitialized);
        }

        creator.require_auth();

        let now = env.ledger().timestamp();
        if time_unit == 0 || expiry_time <= now || max_supply <= 0 {
            return Err(Error::InvalidParameters);
        }
        metadata::validate_service_id(&service_id)?;

        let token_id = Storage::token_counter(&env)
            .checked_add(1)
            .ok_or(Error::ArithmeticOverflow)?;

        let token = Token {
            id: token_id,
            creator: creator.clone(),
            service_id: service_id.clone(),
            time_unit,
            expiry_time,
            max_supply,
            current_supply: max_supply,
            is_active: true,
            price: 0,
            created_at: now,
        };

        Storage::set_token(&env, &token);
        Storage::set_token_counter(&env, token_id);
        Storage::set_balance(&env, token_id, &recipient, max_supply);
        Storage::bump_instance(&env);

        env.events().publish(
            (Symbol::new(&env, "token_created"), token_id),
            TokenCreatedEvent {
                token_id,
                creator,
                service_id,
                time_unit,
                expiry_time,
                max_supply,
                recipient,
            },
        );

        Ok(token_id)
    }

    /// Mint additional units up to `max_supply` (creator only)
    ///
    /// # Errors
    /// - `InvalidParameters`: Quantity <= 0
    /// - `TokenNotFound`: Unknown token
    /// - `InactiveToken`: Token deactivated or expired
    /// - `SupplyCapExceeded`: Would push `current_supply` past `max_supply`
    pub fn mint(env: Env, token_id: u32, to: Address, quantity: i128) -> Result<(), Error> {
        if quantity <= 0 {
            return Err(Error::InvalidParameters);
        }

        let mut token = Storage::get_token(&env, token_id).ok_or(Error::TokenNotFound)?;
        token.creator.require_auth();

        if !token.is_active || token.is_expired_at(env.ledger().timestamp()) {
            return Err(Error::InactiveToken);
        }

        let new_supply = token
            .current_supply
            .checked_add(quantity)
            .ok_or(Error::ArithmeticOverflow)?;
        if new_supply > token.max_supply {
            return Err(Error::SupplyCapExceeded);
        }

        let new_balance = Storage::balance(&env, token_id, &to)
            .checked_add(quantity)
            .ok_or(Error::ArithmeticOverflow)?;

        token.current_supply = new_supply;
        Storage::set_token(&env, &token);
        Storage::set_balance(&env, token_id, &to, new_balance);
        Storage::bump_instance(&env);

        env.events().publish(
            (Symbol::new(&env, "mint"), token_id),
            MintEvent {
                token_id,
                to,
                quantity,
            },
        );

        Ok(())
    }

    /// Retire units held by `from`, lowering `current_supply`
    ///
    /// Expired units may still be burned.
    ///
    /// # Errors
    /// - `InvalidParameters`: Quantity <= 0
    /// - `TokenNotFound`: Unknown token
    /// - `InsufficientBalance`: Not enough balance
    pub fn burn(env: Env, token_id: u32, from: Address, quantity: i128) -> Result<(), Error> {
        if quantity <= 0 {
            return Err(Error::InvalidParameters);
        }

        from.require_auth();

        let mut token = Storage::get_token(&env, token_id).ok_or(Error::TokenNotFound)?;

        let balance = Storage::balance(&env, token_id, &from);
        if balance < quantity {
            return Err(Error::InsufficientBalance);
        }

        token.current_supply -= quantity;
        Storage::set_token(&env, &token);
        Storage::set_balance(&env, token_id, &from, balance - quantity);
        Storage::bump_instance(&env);

        env.events().publish(
            (Symbol::new(&env, "burn"), token_id),
            BurnEvent {
                token_id,
                from,
                quantity,
            },
        );

        Ok(())
    }

    // ============================================
    // TRANSFERS
    // ============================================

    /// Transfer units between holders
    ///
    /// # Errors
    /// - `InvalidParameters`: Quantity <= 0
    /// - `TokenNotFound`: Unknown token
    /// - `InactiveToken`: Token expiry has passed
    /// - `InsufficientBalance`: Not enough balance
    pub fn transfer(
        env: Env,
        from: Address,
        to: Address,
        token_id: u32,
        quantity: i128,
    ) -> Result<(), Error> {
        from.require_auth();
        Self::move_units(&env, &from, &to, token_id, quantity)
    }

    /// Transfer on behalf of `from` by `from` itself or an approved operator
    ///
    /// # Errors
    /// - `Unauthorized`: Spender is neither `from` nor an approved operator
    /// - otherwise as `transfer`
    pub fn transfer_from(
        env: Env,
        spender: Address,
        from: Address,
        to: Address,
        token_id: u32,
        quantity: i128,
    ) -> Result<(), Error> {
        spender.require_auth();

        if spender != from && !Storage::is_approved(&env, &from, &spender) {
            return Err(Error::Unauthorized);
        }

        Self::move_units(&env, &from, &to, token_id, quantity)
    }

    /// Grant or revoke `operator` control over every token held by `owner`
    pub fn set_approval_for_all(
        env: Env,
        owner: Address,
        operator: Address,
        approved: bool,
    ) -> Result<(), Error> {
        if !Storage::is_initialized(&env) {
            return Err(Error::NotInitialized);
        }
        if owner == operator {
            return Err(Error::InvalidParameters);
        }

        owner.require_auth();

        Storage::set_approval(&env, &owner, &operator, approved);

        env.events().publish(
            (Symbol::new(&env, "approval_for_all"), owner.clone()),
            ApprovalForAllEvent {
                owner,
                operator,
                approved,
            },
        );

        Ok(())
    }

    pub fn is_approved_for_all(env: Env, owner: Address, operator: Address) -> bool {
        Storage::is_approved(&env, &owner, &operator)
    }

    // ============================================
    // LIFECYCLE
    // ============================================

    /// Flip `is_active` to false once the expiry time has been reached.
    /// Returns whether this call changed the flag.
    ///
    /// # Errors
    /// - `TokenNotFound`: Unknown token
    pub fn deactivate_if_expired(env: Env, token_id: u32) -> Result<bool, Error> {
        let mut token = Storage::get_token(&env, token_id).ok_or(Error::TokenNotFound)?;

        if !token.is_active || !token.is_expired_at(env.ledger().timestamp()) {
            return Ok(false);
        }

        token.is_active = false;
        Storage::set_token(&env, &token);

        log!(&env, "token expired", token_id, token.expiry_time);
        env.events().publish(
            (Symbol::new(&env, "token_deactivated"), token_id),
            TokenDeactivatedEvent {
                token_id,
                expired: true,
            },
        );

        Ok(true)
    }

    /// Explicitly deactivate a token (creator only). Balances are untouched.
    ///
    /// # Errors
    /// - `TokenNotFound`: Unknown token
    /// - `InactiveToken`: Already inactive
    pub fn deactivate_token(env: Env, token_id: u32) -> Result<(), Error> {
        let mut token = Storage::get_token(&env, token_id).ok_or(Error::TokenNotFound)?;
        token.creator.require_auth();

        if !token.is_active {
            return Err(Error::InactiveToken);
        }

        token.is_active = false;
        Storage::set_token(&env, &token);

        env.events().publish(
            (Symbol::new(&env, "token_deactivated"), token_id),
            TokenDeactivatedEvent {
                token_id,
                expired: false,
            },
        );

        Ok(())
    }

    /// Set the informational reference price (creator only)
    pub fn set_price(env: Env, token_id: u32, price: i128) -> Result<(), Error> {
        if price < 0 {
            return Err(Error::InvalidParameters);
        }

        let mut token = Storage::get_token(&env, token_id).ok_or(Error::TokenNotFound)?;
        token.creator.require_auth();

        token.price = price;
        Storage::set_token(&env, &token);

        Ok(())
    }

    // ============================================
    // VIEW FUNCTIONS
    // ============================================

    /// Get balance for a holder; zero for unknown pairs
    pub fn balance_of(env: Env, holder: Address, token_id: u32) -> i128 {
        Storage::balance(&env, token_id, &holder)
    }

    pub fn token_info(env: Env, token_id: u32) -> Result<Token, Error> {
        Storage::get_token(&env, token_id).ok_or(Error::TokenNotFound)
    }

    pub fn token_counter(env: Env) -> u32 {
        Storage::token_counter(&env)
    }

    pub fn token_uri(env: Env, token_id: u32) -> Result<String, Error> {
        if Storage::get_token(&env, token_id).is_none() {
            return Err(Error::TokenNotFound);
        }
        let meta = Storage::get_metadata(&env).ok_or(Error::NotInitialized)?;
        Ok(metadata::token_uri(&env, &meta.base_uri, token_id))
    }

    pub fn name(env: Env) -> Result<String, Error> {
        Ok(Storage::get_metadata(&env).ok_or(Error::NotInitialized)?.name)
    }

    pub fn symbol(env: Env) -> Result<String, Error> {
        Ok(Storage::get_metadata(&env).ok_or(Error::NotInitialized)?.symbol)
    }

    pub fn admin(env: Env) -> Result<Address, Error> {
        Storage::get_admin(&env).ok_or(Error::NotInitialized)
    }

    // ============================================
    // INTERNAL HELPERS
    // ============================================

    fn move_units(
        env: &Env,
        from: &Address,
        to: &Address,
        token_id: u32,
        quantity: i128,
    ) -> Result<(), Error> {
        if quantity <= 0 {
            return Err(Error::InvalidParameters);
        }

        let token = Storage::get_token(env, token_id).ok_or(Error::TokenNotFound)?;
        if token.is_expired_at(env.ledger().timestamp()) {
            return Err(Error::InactiveToken);
        }

        let from_balance = Storage::balance(env, token_id, from);
        if from_balance < quantity {
            return Err(Error::InsufficientBalance);
        }

        if from != to {
            let new_to_balance = Storage::balance(env, token_id, to)
                .checked_add(quantity)
                .ok_or(Error::ArithmeticOverflow)?;

            Storage::set_balance(env, token_id, from, from_balance - quantity);
            Storage::set_balance(env, token_id, to, new_to_balance);
        }
        Storage::bump_instance(env);

        env.events().publish(
            (Symbol::new(env, "transfer"), token_id),
            TransferEvent {
                token_id,
                from: from.clone(),
                to: to.clone(),
                quantity,
            },
        );

        Ok(())
    }
}

#[cfg(test)]
mod test;
