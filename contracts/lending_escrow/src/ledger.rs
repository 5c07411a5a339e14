use soroban_sdk::{contracttype, vec, Address, Env, IntoVal, String, Symbol};

use crate::error::Error;

/// Token record as returned by the ledger's `token_info`.
#[contracttype]
#[derive(Clone, Debug)]
pub struct TokenInfo {
    pub id: u32,
    pub creator: Address,
    pub service_id: String,
    pub time_unit: u64,
    pub expiry_time: u64,
    pub max_supply: i128,
    pub current_supply: i128,
    pub is_active: bool,
    pub price: i128,
    pub created_at: u64,
}

impl TokenInfo {
    /// Usable for new listings and positions at `now`.
    pub fn is_live_at(&self, now: u64) -> bool {
        self.is_active && now < self.expiry_time
    }
}

/// Cross-contract calls into the subscription token ledger.
pub struct Ledger<'a> {
    env: &'a Env,
    address: Address,
}

impl<'a> Ledger<'a> {
    pub fn new(env: &'a Env, address: Address) -> Self {
        Ledger { env, address }
    }

    pub fn token_info(&self, token_id: u32) -> Result<TokenInfo, Error> {
        // ids are assigned 1..=counter, so anything else would trap in the ledger
        let counter: u32 = self.env.invoke_contract(
            &self.address,
            &Symbol::new(self.env, "token_counter"),
            vec![self.env],
        );
        if token_id == 0 || token_id > counter {
            return Err(Error::TokenNotFound);
        }

        Ok(self.env.invoke_contract(
            &self.address,
            &Symbol::new(self.env, "token_info"),
            vec![self.env, token_id.into()],
        ))
    }

    pub fn balance_of(&self, holder: &Address, token_id: u32) -> i128 {
        self.env.invoke_contract(
            &self.address,
            &Symbol::new(self.env, "balance_of"),
            vec![self.env, holder.to_val(), token_id.into()],
        )
    }

    pub fn transfer(&self, from: &Address, to: &Address, token_id: u32, quantity: i128) {
        self.env.invoke_contract::<()>(
            &self.address,
            &Symbol::new(self.env, "transfer"),
            vec![
                self.env,
                from.to_val(),
                to.to_val(),
                token_id.into(),
                quantity.into_val(self.env),
            ],
        );
    }

    pub fn deactivate_if_expired(&self, token_id: u32) -> bool {
        self.env.invoke_contract(
            &self.address,
            &Symbol::new(self.env, "deactivate_if_expired"),
            vec![self.env, token_id.into()],
        )
    }
}
