use soroban_sdk::{contracttype, Address, Env};

// Constants
pub const BASIS_POINTS: i128 = 10_000; // 100% = 10,000 basis points
pub const SCALE: i128 = 10_000_000; // 7 decimals

pub(crate) const DAY_IN_LEDGERS: u32 = 17_280;
pub(crate) const PERSISTENT_BUMP_AMOUNT: u32 = 30 * DAY_IN_LEDGERS;
pub(crate) const PERSISTENT_LIFETIME_THRESHOLD: u32 = PERSISTENT_BUMP_AMOUNT - DAY_IN_LEDGERS;

#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ListingStatus {
    /// Open for new positions
    Active = 0,
    /// Lender withdrew the listing (terminal)
    Cancelled = 1,
    /// Backing token reached its expiry time (terminal)
    Expired = 2,
}

#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PositionStatus {
    /// Interest is accruing
    Open = 0,
    /// Interest paid out of the prepayment, remainder refunded
    Settled = 1,
    /// Prepayment did not cover interest past the grace deadline; forfeited
    Defaulted = 2,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Listing {
    /// Unique listing ID
    pub id: u64,
    /// Ledger token backing the listing
    pub token_id: u32,
    pub lender: Address,
    /// Units moved into escrow at creation
    pub amount: i128,
    /// Payment units per token unit per second, scaled by `rate_scale`
    pub rate_per_second: i128,
    /// Units not currently borrowed. Once expired, the lender's units left
    /// in escrow custody.
    pub available: i128,
    pub status: ListingStatus,
    /// Snapshot of the token's (immutable) expiry time
    pub expires_at: u64,
    pub open_positions: u32,
    pub created_at: u64,
}

impl Listing {
    pub fn is_active(&self) -> bool {
        self.status == ListingStatus::Active
    }

    pub fn is_expired_at(&self, now: u64) -> bool {
        now >= self.expires_at
    }
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Position {
    /// Unique position ID
    pub id: u64,
    pub listing_id: u64,
    pub borrower: Address,
    /// Token units borrowed from the listing
    pub quantity: i128,
    /// Timestamp when the position was opened
    pub start_time: u64,
    /// Rate snapshotted from the listing at open time
    pub rate_per_second: i128,
    /// Payment funds held in escrow for this position
    pub prepaid_amount: i128,
    pub status: PositionStatus,
    /// Effective settlement time; 0 while open
    pub settled_at: u64,
    /// Interest charged (the forfeited prepayment on default)
    pub interest_paid: i128,
    pub fee_paid: i128,
    pub refunded: i128,
}

impl Position {
    pub fn is_open(&self) -> bool {
        self.status == PositionStatus::Open
    }
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct EscrowConfig {
    pub admin: Address,
    /// Recipient of platform fees
    pub platform_treasury: Address,
    /// Subscription token ledger contract
    pub subscription_token: Address,
    /// SEP-41 asset borrowers pay in
    pub payment_token: Address,
    /// Platform cut of interest, 0..=10,000
    pub platform_fee_bps: u32,
    /// Seconds of interest a prepayment must cover at open
    pub min_commitment_secs: u64,
    /// Fixed-point denominator of `rate_per_second`
    pub rate_scale: i128,
    /// Seconds an under-funded position may stay open before it can default
    pub grace_period_secs: u64,
}

/// Protocol-wide money flow counters
#[contracttype]
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct EscrowAccounting {
    /// Prepayments currently held for open positions
    pub total_prepaid_locked: i128,
    pub total_interest_paid: i128,
    pub total_fees_collected: i128,
    pub total_refunded: i128,
    /// Prepayments forfeited by defaulted positions
    pub total_forfeited: i128,
    pub positions_opened: u64,
    pub positions_settled: u64,
    pub positions_defaulted: u64,
}

// Totals saturate instead of failing.
impl EscrowAccounting {
    pub fn record_open(&mut self, prepaid: i128) {
        self.total_prepaid_locked = self.total_prepaid_locked.saturating_add(prepaid);
        self.positions_opened = self.positions_opened.saturating_add(1);
    }

    pub fn record_top_up(&mut self, amount: i128) {
        self.total_prepaid_locked = self.total_prepaid_locked.saturating_add(amount);
    }

    /// `charged` is the interest taken, or the whole prepayment on default.
    pub fn record_settlement(
        &mut self,
        prepaid: i128,
        charged: i128,
        fee: i128,
        refund: i128,
        defaulted: bool,
    ) {
        self.total_prepaid_locked = self.total_prepaid_locked.saturating_sub(prepaid).max(0);
        self.total_interest_paid = self.total_interest_paid.saturating_add(charged);
        self.total_fees_collected = self.total_fees_collected.saturating_add(fee);
        self.total_refunded = self.total_refunded.saturating_add(refund);

        if defaulted {
            self.total_forfeited = self.total_forfeited.saturating_add(prepaid);
            self.positions_defaulted = self.positions_defaulted.saturating_add(1);
        } else {
            self.positions_settled = self.positions_settled.saturating_add(1);
        }
    }
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum GuardKey {
    Listing(u64),
    Position(u64),
}

#[contracttype]
#[derive(Clone)]
pub enum DataKey {
    Config,
    Accounting,
    ListingCounter,
    PositionCounter,
    Initialized,
    Paused,
    Listing(u64),   // Listing ID → Listing
    Position(u64),  // Position ID → Position
    Guard(GuardKey),
}

pub struct Storage;

impl Storage {
    pub fn is_initialized(env: &Env) -> bool {
        env.storage().instance().has(&DataKey::Initialized)
    }

    pub fn get_config(env: &Env) -> Option<EscrowConfig> {
        env.storage().instance().get(&DataKey::Config)
    }

    pub fn set_config(env: &Env, config: &EscrowConfig) {
        env.storage().instance().set(&DataKey::Config, config);
    }

    pub fn is_paused(env: &Env) -> bool {
        env.storage()
            .instance()
            .get::<DataKey, bool>(&DataKey::Paused)
            .unwrap_or(false)
    }

    pub fn set_paused(env: &Env, paused: bool) {
        env.storage().instance().set(&DataKey::Paused, &paused);
    }

    pub fn get_accounting(env: &Env) -> EscrowAccounting {
        env.storage()
            .instance()
            .get(&DataKey::Accounting)
            .unwrap_or_default()
    }

    pub fn set_accounting(env: &Env, accounting: &EscrowAccounting) {
        env.storage().instance().set(&DataKey::Accounting, accounting);
    }

    // Counters
    pub fn listing_counter(env: &Env) -> u64 {
        env.storage()
            .instance()
            .get(&DataKey::ListingCounter)
            .unwrap_or(0)
    }

    pub fn set_listing_counter(env: &Env, counter: u64) {
        env.storage().instance().set(&DataKey::ListingCounter, &counter);
    }

    pub fn position_counter(env: &Env) -> u64 {
        env.storage()
            .instance()
            .get(&DataKey::PositionCounter)
            .unwrap_or(0)
    }

    pub fn set_position_counter(env: &Env, counter: u64) {
        env.storage()
            .instance()
            .set(&DataKey::PositionCounter, &counter);
    }

    // Listings
    pub fn get_listing(env: &Env, listing_id: u64) -> Option<Listing> {
        let key = DataKey::Listing(listing_id);
        let listing = env.storage().persistent().get::<DataKey, Listing>(&key);
        if listing.is_some() {
            Self::bump(env, &key);
        }
        listing
    }

    pub fn set_listing(env: &Env, listing: &Listing) {
        let key = DataKey::Listing(listing.id);
        env.storage().persistent().set(&key, listing);
        Self::bump(env, &key);
    }

    // Positions
    pub fn get_position(env: &Env, position_id: u64) -> Option<Position> {
        let key = DataKey::Position(position_id);
        let position = env.storage().persistent().get::<DataKey, Position>(&key);
        if position.is_some() {
            Self::bump(env, &key);
        }
        position
    }

    pub fn set_position(env: &Env, position: &Position) {
        let key = DataKey::Position(position.id);
        env.storage().persistent().set(&key, position);
        Self::bump(env, &key);
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
