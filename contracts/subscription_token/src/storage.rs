use soroban_sdk::{contracttype, Address, Env, String};

pub(crate) const DAY_IN_LEDGERS: u32 = 17_280;
pub(crate) const PERSISTENT_BUMP_AMOUNT: u32 = 30 * DAY_IN_LEDGERS;
pub(crate) const PERSISTENT_LIFETIME_THRESHOLD: u32 = PERSISTENT_BUMP_AMOUNT - DAY_IN_LEDGERS;

/// A fractional, time-bound claim on a subscription service.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Token {
    pub id: u32,
    pub creator: Address,
    /// Name of the underlying subscription service
    pub service_id: String,
    /// Seconds of access one unit represents
    pub time_unit: u64,
    /// Ledger timestamp after which the token is unusable
    pub expiry_time: u64,
    pub max_supply: i128,
    pub current_supply: i128,
    pub is_active: bool,
    /// Reference unit price (informational only)
    pub price: i128,
    pub created_at: u64,
}

impl Token {
    pub fn is_expired_at(&self, now: u64) -> bool {
        now >= self.expiry_time
    }
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Metadata {
    pub name: String,
    pub symbol: String,
    pub base_uri: String,
}

#[contracttype]
#[derive(Clone)]
pub enum DataKey {
    Admin,
    Metadata,
    TokenCounter,
    Initialized,
    Token(u32),
    Balance(u32, Address),       // (token_id, holder)
    Approval(Address, Address),  // (owner, operator)
}

pub struct Storage;

impl Storage {
    pub fn is_initialized(env: &Env) -> bool {
        env.storage().instance().has(&DataKey::Initialized)
    }

    pub fn get_admin(env: &Env) -> Option<Address> {
        env.storage().instance().get(&DataKey::Admin)
    }

    pub fn get_metadata(env: &Env) -> Option<Metadata> {
        env.storage().instance().get(&DataKey::Metadata)
    }

    pub fn set_metadata(env: &Env, metadata: &Metadata) {
        env.storage().instance().set(&DataKey::Metadata, metadata);
    }

    pub fn token_counter(env: &Env) -> u32 {
        env.storage()
            .instance()
            .get(&DataKey::TokenCounter)
            .unwrap_or(0)
    }

    pub fn set_token_counter(env: &Env, counter: u32) {
        env.storage().instance().set(&DataKey::TokenCounter, &counter);
    }

    // Tokens
    pub fn get_token(env: &Env, token_id: u32) -> Option<Token> {
        let key = DataKey::Token(token_id);
        let token = env.storage().persistent().get::<DataKey, Token>(&key);
        if token.is_some() {
            Self::bump(env, &key);
        }
        token
    }

    pub fn set_token(env: &Env, token: &Token) {
        let key = DataKey::Token(token.id);
        env.storage().persistent().set(&key, token);
        Self::bump(env, &key);
    }

    // Balances
    pub fn balance(env: &Env, token_id: u32, holder: &Address) -> i128 {
        env.storage()
            .persistent()
            .get::<DataKey, i128>(&DataKey::Balance(token_id, holder.clone()))
            .unwrap_or(0)
    }

    /// Zero balances are removed instead of stored.
    pub fn set_balance(env: &Env, token_id: u32, holder: &Address, amount: i128) {
        let key = DataKey::Balance(token_id, holder.clone());
        if amount == 0 {
            env.storage().persistent().remove(&key);
        } else {
            env.storage().persistent().set(&key, &amount);
            Self::bump(env, &key);
        }
    }

    // Operator approvals
    pub fn is_approved(env: &Env, owner: &Address, operator: &Address) -> bool {
        env.storage()
            .persistent()
            .get::<DataKey, bool>(&DataKey::Approval(owner.clone(), operator.clone()))
            .unwrap_or(false)
    }

    pub fn set_approval(env: &Env, owner: &Address, operator: &Address, approved: bool) {
        let key = DataKey::Approval(owner.clone(), operator.clone());
        if approved {
            env.storage().persistent().set(&key, &true);
            Self::bump(env, &key);
        } else {
            env.storage().persistent().remove(&key);
        }
    }

    pub fn bump_instance(env: &Env) {
        env.storage()
            .instance()
            .extend_ttl(PERSISTENT_LIFETIME_THRESHOLD, PERSISTENT_BUMP_AMOUNT);
    }

    fn bump(env: &Env, key: &DataKey) {
        env.storage().persistent().extend_ttl(
            key,
            PERSISTENT_LIFETIME_THRESHOLD,
            PERSISTENT_BUMP_AMOUNT,
        );
    }
}
