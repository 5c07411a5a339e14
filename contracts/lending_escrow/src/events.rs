use soroban_sdk::{contracttype, Address};

#[contracttype]
#[derive(Clone, Debug)]
pub struct ListingCreatedEvent {
    pub listing_id: u64,
    pub token_id: u32,
    pub lender: Address,
    pub amount: i128,
    pub rate_per_second: i128,
}

#[contracttype]
#[derive(Clone, Debug)]
pub struct ListingCancelledEvent {
    pub listing_id: u64,
    pub lender: Address,
    pub returned: i128,
}

/// Units left unborrowed at expiry can no longer move on the ledger and stay
/// in the escrow balance. `stranded` of them belong to the listing's lender,
/// and `listing_info` keeps reporting them as `available`.
#[contracttype]
#[derive(Clone, Debug)]
pub struct ListingExpiredEvent {
    pub listing_id: u64,
    pub token_id: u32,
    pub stranded: i128,
}

#[contracttype]
#[derive(Clone, Debug)]
pub struct RateUpdatedEvent {
    pub listing_id: u64,
    pub old_rate: i128,
    pub new_rate: i128,
}

#[contracttype]
#[derive(Clone, Debug)]
pub struct PositionOpenedEvent {
    pub position_id: u64,
    pub listing_id: u64,
    pub borrower: Address,
    pub quantity: i128,
    pub rate_per_second: i128,
    pub prepaid_amount: i128,
}

#[contracttype]
#[derive(Clone, Debug)]
pub struct PositionToppedUpEvent {
    pub position_id: u64,
    pub amount: i128,
    pub prepaid_amount: i128,
}

#[contracttype]
#[derive(Clone, Debug)]
pub struct PositionSettledEvent {
    pub position_id: u64,
    pub listing_id: u64,
    pub settlement_time: u64,
    pub interest: i128,
    pub fee: i128,
    pub lender_payout: i128,
    pub refund: i128,
}

#[contracttype]
#[derive(Clone, Debug)]
pub struct PositionDefaultedEvent {
    pub position_id: u64,
    pub listing_id: u64,
    pub borrower: Address,
    pub forfeited: i128,
    pub fee: i128,
    pub lender_payout: i128,
}
