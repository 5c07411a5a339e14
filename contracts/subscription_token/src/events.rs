use soroban_sdk::{contracttype, Address, String};

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TokenCreatedEvent {
    pub token_id: u32,
    pub creator: Address,
    pub service_id: String,
    pub time_unit: u64,
    pub expiry_time: u64,
    pub max_supply: i128,
    pub recipient: Address,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TransferEvent {
    pub token_id: u32,
    pub from: Address,
    pub to: Address,
    pub quantity: i128,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MintEvent {
    pub token_id: u32,
    pub to: Address,
    pub quantity: i128,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BurnEvent {
    pub token_id: u32,
    pub from: Address,
    pub quantity: i128,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ApprovalForAllEvent {
    pub owner: Address,
    pub operator: Address,
    pub approved: bool,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TokenDeactivatedEvent {
    pub token_id: u32,
    pub expired: bool,
}
