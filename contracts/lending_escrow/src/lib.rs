#![no_std]

mod error;
mod events;
mod guard;
mod interest;
mod ledger;
mod storage;

pub use error::Error;
pub use ledger::TokenInfo;
pub use storage::{
    EscrowAccounting, EscrowConfig, Listing, ListingStatus, Position, PositionStatus,
    BASIS_POINTS, SCALE,
};

use events::*;
use guard::with_guards;
use ledger::Ledger;
use storage::{DataKey, GuardKey, Storage};

use soroban_sdk::{contract, contractimpl, log, token, Address, Env, Symbol};

#[contract]
pub struct LendingEscrow;

#[contractimpl]
impl LendingEscrow {
    // ============================================
    // INITIALIZATION & ADMIN
    // ============================================

    /// Initialize the escrow
    ///
    /// # Errors
    /// - `AlreadyInitialized`: Contract already initialized
    /// - `InvalidParameters`: `platform_fee_bps > 10,000` or `rate_scale <= 0`
    pub fn initialize(
        env: Env,
        admin: Address,
        platform_treasury: Address,
        subscription_token: Address,
        payment_token: Address,
        platform_fee_bps: u32,
        min_commitment_secs: u64,
        rate_scale: i128,
        grace_period_secs: u64,
    ) -> Result<(), Error> {
        if Storage::is_initialized(&env) {
            return Err(Error::AlreadyInitialized);
        }

        if platform_fee_bps as i128 > BASIS_POINTS || rate_scale <= 0 {
            return Err(Error::InvalidParameters);
        }

        admin.require_auth();

        env.storage().instance().set(&DataKey::Initialized, &true);
        Storage::set_config(
            &env,
            &EscrowConfig {
                admin,
                platform_treasury,
                subscription_token,
                payment_token,
                platform_fee_bps,
                min_commitment_secs,
                rate_scale,
                grace_period_secs,
            },
        );
        Storage::set_listing_counter(&env, 0);
        Storage::set_position_counter(&env, 0);
        Storage::set_paused(&env, false);

        Ok(())
    }

    pub fn pause(env: Env) -> Result<(), Error> {
        let config = Self::config(&env)?;
        config.admin.require_auth();

        Storage::set_paused(&env, true);
        Ok(())
    }

    pub fn unpause(env: Env) -> Result<(), Error> {
        let config = Self::config(&env)?;
        config.admin.require_auth();

        Storage::set_paused(&env, false);
        Ok(())
    }

    // ============================================
    // LISTINGS
    // ============================================

    /// Move `amount` ledger units into escrow and offer them at a fixed rate
    ///
    /// # Errors
    /// - `ContractPaused`: Contract is paused
    /// - `InvalidParameters`: `amount <= 0` or `rate_per_second < 0`
    /// - `TokenNotFound`: Unknown ledger token
    /// - `InactiveToken`: Token deactivated or expired
    /// - `InsufficientBalance`: Lender holds fewer than `amount` units
    pub fn create_listing(
        env: Env,
        lender: Address,
        token_id: u32,
        amount: i128,
        rate_per_second: i128,
    ) -> Result<u64, Error> {
        Self::check_not_paused(&env)?;

        if amount <= 0 || rate_per_second < 0 {
            return Err(Error::InvalidParameters);
        }

        lender.require_auth();

        let config = Self::config(&env)?;
        let ledger = Ledger::new(&env, config.subscription_token.clone());
        let now = env.ledger().timestamp();

        let token = ledger.token_info(token_id)?;
        if !token.is_live_at(now) {
            return Err(Error::InactiveToken);
        }

        if ledger.balance_of(&lender, token_id) < amount {
            return Err(Error::InsufficientBalance);
        }

        let listing_id = Storage::listing_counter(&env)
            .checked_add(1)
            .ok_or(Error::ArithmeticOverflow)?;

        let listing = Listing {
            id: listing_id,
            token_id,
            lender: lender.clone(),
            amount,
            rate_per_second,
            available: amount,
            status: ListingStatus::Active,
            expires_at: token.expiry_time,
            open_positions: 0,
            created_at: now,
        };

        with_guards(&env, &[GuardKey::Listing(listing_id)], || {
            Storage::set_listing(&env, &listing);
            Storage::set_listing_counter(&env, listing_id);
            Storage::bump_instance(&env);

            ledger.transfer(&lender, &env.current_contract_address(), token_id, amount);
            Ok(())
        })?;

        env.events().publish(
            (Symbol::new(&env, "listing_created"), listing_id),
            ListingCreatedEvent {
                listing_id,
                token_id,
                lender,
                amount,
                rate_per_second,
            },
        );

        Ok(listing_id)
    }

    /// Withdraw a listing and return its escrowed units to the lender
    ///
    /// # Errors
    /// - `ListingNotFound`: Listing doesn't exist
    /// - `Unauthorized`: Caller is not the lender
    /// - `InactiveListing`: Listing already cancelled or expired
    /// - `ListingBusy`: Borrowed quantity outstanding (available < amount)
    /// - `InactiveToken`: Token expired; its units can no longer move
    pub fn cancel_listing(env: Env, listing_id: u64, caller: Address) -> Result<(), Error> {
        caller.require_auth();

        let config = Self::config(&env)?;
        let mut listing = Storage::get_listing(&env, listing_id).ok_or(Error::ListingNotFound)?;

        if listing.lender != caller {
            return Err(Error::Unauthorized);
        }
        if !listing.is_active() {
            return Err(Error::InactiveListing);
        }
        if listing.available != listing.amount {
            return Err(Error::ListingBusy);
        }
        if listing.is_expired_at(env.ledger().timestamp()) {
            return Err(Error::InactiveToken);
        }

        let returned = listing.available;

        with_guards(&env, &[GuardKey::Listing(listing_id)], || {
            listing.status = ListingStatus::Cancelled;
            listing.available = 0;
            Storage::set_listing(&env, &listing);

            Ledger::new(&env, config.subscription_token.clone()).transfer(
                &env.current_contract_address(),
                &listing.lender,
                listing.token_id,
                returned,
            );
            Ok(())
        })?;

        env.events().publish(
            (Symbol::new(&env, "listing_cancelled"), listing_id),
            ListingCancelledEvent {
                listing_id,
                lender: caller,
                returned,
            },
        );

        Ok(())
    }

    /// Reprice an active listing. Open positions keep their snapshotted rate.
    ///
    /// # Errors
    /// - `ContractPaused`: Contract is paused
    /// - `InvalidParameters`: Negative rate
    /// - `ListingNotFound`: Listing doesn't exist
    /// - `Unauthorized`: Caller is not the lender
    /// - `InactiveListing`: Listing cancelled or expired
    /// - `InactiveToken`: Token expiry has passed
    pub fn update_rate(
        env: Env,
        listing_id: u64,
        lender: Address,
        rate_per_second: i128,
    ) -> Result<(), Error> {
        Self::check_not_paused(&env)?;

        if rate_per_second < 0 {
            return Err(Error::InvalidParameters);
        }

        lender.require_auth();

        let mut listing = Storage::get_listing(&env, listing_id).ok_or(Error::ListingNotFound)?;

        if listing.lender != lender {
            return Err(Error::Unauthorized);
        }
        if !listing.is_active() {
            return Err(Error::InactiveListing);
        }
        if listing.is_expired_at(env.ledger().timestamp()) {
            return Err(Error::InactiveToken);
        }

        let old_rate = listing.rate_per_second;
        listing.rate_per_second = rate_per_second;
        Storage::set_listing(&env, &listing);

        env.events().publish(
            (Symbol::new(&env, "rate_updated"), listing_id),
            RateUpdatedEvent {
                listing_id,
                old_rate,
                new_rate: rate_per_second,
            },
        );

        Ok(())
    }

    /// Mark a listing expired once its token's expiry time has passed.
    /// Returns whether this call changed anything.
    ///
    /// # Errors
    /// - `ListingNotFound`: Listing doesn't exist
    pub fn expire_listing(env: Env, listing_id: u64) -> Result<bool, Error> {
        let config = Self::config(&env)?;
        let mut listing = Storage::get_listing(&env, listing_id).ok_or(Error::ListingNotFound)?;

        if !listing.is_active() || !listing.is_expired_at(env.ledger().timestamp()) {
            return Ok(false);
        }

        with_guards(&env, &[GuardKey::Listing(listing_id)], || {
            Self::mark_expired(&env, &config, &mut listing);
            Storage::set_listing(&env, &listing);
            Ok(())
        })?;

        Ok(true)
    }

    // ============================================
    // POSITIONS
    // ============================================

    /// Borrow `quantity` units from a listing, escrowing `prepaid_amount`
    ///
    /// # Errors
    /// - `ContractPaused`: Contract is paused
    /// - `InvalidParameters`: `quantity <= 0` or `prepaid_amount < 0`
    /// - `ListingNotFound`: Listing doesn't exist
    /// - `InactiveListing`: Listing cancelled or expired
    /// - `InactiveToken`: Token expiry has passed
    /// - `ExceedsAvailable`: `quantity` > listing available
    /// - `InsufficientPrepayment`: Prepayment below the minimum commitment
    /// - `ArithmeticOverflow`: Interest up to expiry does not fit in i128
    pub fn open_position(
        env: Env,
        listing_id: u64,
        borrower: Address,
        quantity: i128,
        prepaid_amount: i128,
    ) -> Result<u64, Error> {
        Self::check_not_paused(&env)?;

        if quantity <= 0 || prepaid_amount < 0 {
            return Err(Error::InvalidParameters);
        }

        borrower.require_auth();

        let config = Self::config(&env)?;
        let mut listing = Storage::get_listing(&env, listing_id).ok_or(Error::ListingNotFound)?;

        if !listing.is_active() {
            return Err(Error::InactiveListing);
        }

        // a deactivated token keeps lending out already escrowed units
        let now = env.ledger().timestamp();
        if listing.is_expired_at(now) {
            return Err(Error::InactiveToken);
        }

        if quantity > listing.available {
            return Err(Error::ExceedsAvailable);
        }

        let rate = listing.rate_per_second;
        let required = interest::min_prepayment(
            quantity,
            rate,
            config.min_commitment_secs,
            config.rate_scale,
        )
        .ok_or(Error::ArithmeticOverflow)?;

        if prepaid_amount < required {
            return Err(Error::InsufficientPrepayment);
        }

        // every later settlement must be computable
        let max_interest =
            interest::accrued_interest(quantity, rate, listing.expires_at - now, config.rate_scale)
                .ok_or(Error::ArithmeticOverflow)?;
        interest::platform_fee(max_interest.max(prepaid_amount), config.platform_fee_bps)
            .ok_or(Error::ArithmeticOverflow)?;

        let position_id = Storage::position_counter(&env)
            .checked_add(1)
            .ok_or(Error::ArithmeticOverflow)?;

        let position = Position {
            id: position_id,
            listing_id,
            borrower: borrower.clone(),
            quantity,
            start_time: now,
            rate_per_second: rate,
            prepaid_amount,
            status: PositionStatus::Open,
            settled_at: 0,
            interest_paid: 0,
            fee_paid: 0,
            refunded: 0,
        };

        let mut accounting = Storage::get_accounting(&env);
        accounting.record_open(prepaid_amount);

        let keys = [GuardKey::Listing(listing_id), GuardKey::Position(position_id)];
        with_guards(&env, &keys, || {
            listing.available -= quantity;
            listing.open_positions += 1;

            Storage::set_listing(&env, &listing);
            Storage::set_position(&env, &position);
            Storage::set_position_counter(&env, position_id);
            Storage::set_accounting(&env, &accounting);
            Storage::bump_instance(&env);

            if prepaid_amount > 0 {
                token::Client::new(&env, &config.payment_token).transfer(
                    &borrower,
                    &env.current_contract_address(),
                    &prepaid_amount,
                );
            }
            Ok(())
        })?;

        env.events().publish(
            (Symbol::new(&env, "position_opened"), position_id),
            PositionOpenedEvent {
                position_id,
                listing_id,
                borrower,
                quantity,
                rate_per_second: rate,
                prepaid_amount,
            },
        );

        Ok(position_id)
    }

    /// Add prepayment to an open position
    ///
    /// # Errors
    /// - `ContractPaused`: Contract is paused
    /// - `InvalidParameters`: `amount <= 0`
    /// - `PositionNotFound`: Position doesn't exist
    /// - `Unauthorized`: Caller is not the borrower
    /// - `AlreadySettled`: Position is no longer open
    pub fn top_up(env: Env, position_id: u64, borrower: Address, amount: i128) -> Result<(), Error> {
        Self::check_not_paused(&env)?;

        if amount <= 0 {
            return Err(Error::InvalidParameters);
        }

        borrower.require_auth();

        let config = Self::config(&env)?;
        let mut position =
            Storage::get_position(&env, position_id).ok_or(Error::PositionNotFound)?;

        if position.borrower != borrower {
            return Err(Error::Unauthorized);
        }
        if !position.is_open() {
            return Err(Error::AlreadySettled);
        }

        let prepaid = position
            .prepaid_amount
            .checked_add(amount)
            .ok_or(Error::ArithmeticOverflow)?;
        interest::platform_fee(prepaid, config.platform_fee_bps).ok_or(Error::ArithmeticOverflow)?;

        let mut accounting = Storage::get_accounting(&env);
        accounting.record_top_up(amount);

        with_guards(&env, &[GuardKey::Position(position_id)], || {
            position.prepaid_amount = prepaid;
            Storage::set_position(&env, &position);
            Storage::set_accounting(&env, &accounting);

            token::Client::new(&env, &config.payment_token).transfer(
                &borrower,
                &env.current_contract_address(),
                &amount,
            );
            Ok(())
        })?;

        env.events().publish(
            (Symbol::new(&env, "position_topped_up"), position_id),
            PositionToppedUpEvent {
                position_id,
                amount,
                prepaid_amount: prepaid,
            },
        );

        Ok(())
    }

    /// Settle a position at `settlement_time`
    ///
    /// The borrower, the lender or the admin may force settlement. Only the
    /// lender and the admin may settle at a time earlier than now. Interest
    /// stops accruing at the token expiry.
    ///
    /// Returns the terminal position record: `Settled` when the prepayment
    /// covered the interest, `Defaulted` when it did not and the grace
    /// deadline has passed (the whole prepayment is forfeited).
    ///
    /// # Errors
    /// - `PositionNotFound`: Position doesn't exist
    /// - `AlreadySettled`: Position already settled or defaulted
    /// - `Unauthorized`: Caller is not borrower, lender or admin
    /// - `InvalidParameters`: `settlement_time` outside `[start_time, now]`,
    ///   or a borrower settling at a time other than now
    /// - `InsufficientPrepayment`: Interest exceeds the prepayment and the
    ///   grace deadline has not passed yet
    pub fn close_position(
        env: Env,
        position_id: u64,
        caller: Address,
        settlement_time: u64,
    ) -> Result<Position, Error> {
        caller.require_auth();

        let config = Self::config(&env)?;
        let position = Storage::get_position(&env, position_id).ok_or(Error::PositionNotFound)?;

        if !position.is_open() {
            return Err(Error::AlreadySettled);
        }

        let listing =
            Storage::get_listing(&env, position.listing_id).ok_or(Error::ListingNotFound)?;

        let is_borrower = caller == position.borrower;
        let is_privileged = caller == listing.lender || caller == config.admin;
        if !is_borrower && !is_privileged {
            return Err(Error::Unauthorized);
        }

        let now = env.ledger().timestamp();
        if settlement_time < position.start_time || settlement_time > now {
            return Err(Error::InvalidParameters);
        }
        if !is_privileged && settlement_time != now {
            return Err(Error::InvalidParameters);
        }

        Self::settle(&env, &config, position, listing, settlement_time)
    }

    /// Force settlement of an open position once its token has expired,
    /// using the expiry time as the settlement time. Callable by anyone.
    ///
    /// # Errors
    /// - `PositionNotFound`: Position doesn't exist
    /// - `AlreadySettled`: Position already settled or defaulted
    /// - `NotExpired`: Token expiry time not reached
    /// - `InsufficientPrepayment`: As for `close_position`
    pub fn settle_expired(env: Env, position_id: u64) -> Result<Position, Error> {
        let config = Self::config(&env)?;
        let position = Storage::get_position(&env, position_id).ok_or(Error::PositionNotFound)?;

        if !position.is_open() {
            return Err(Error::AlreadySettled);
        }

        let listing =
            Storage::get_listing(&env, position.listing_id).ok_or(Error::ListingNotFound)?;

        if !listing.is_expired_at(env.ledger().timestamp()) {
            return Err(Error::NotExpired);
        }

        let expires_at = listing.expires_at;
        log!(&env, "expiry sweep", position_id, expires_at);
        Self::settle(&env, &config, position, listing, expires_at)
    }

    // ============================================
    // VIEW FUNCTIONS
    // ============================================

    /// Interest accrued by a position as of `as_of`
    ///
    /// Capped at the token expiry, and at the settlement time once the
    /// position is terminal. Zero before the start time.
    pub fn accrued_interest(env: Env, position_id: u64, as_of: u64) -> Result<i128, Error> {
        let config = Self::config(&env)?;
        let position = Storage::get_position(&env, position_id).ok_or(Error::PositionNotFound)?;
        let listing =
            Storage::get_listing(&env, position.listing_id).ok_or(Error::ListingNotFound)?;

        let as_of = if position.is_open() {
            as_of
        } else {
            as_of.min(position.settled_at)
        };

        Self::interest_at(&config, &position, &listing, as_of)
    }

    pub fn listing_info(env: Env, listing_id: u64) -> Result<Listing, Error> {
        Storage::get_listing(&env, listing_id).ok_or(Error::ListingNotFound)
    }

    pub fn listing_counter(env: Env) -> u64 {
        Storage::listing_counter(&env)
    }

    pub fn position_info(env: Env, position_id: u64) -> Result<Position, Error> {
        Storage::get_position(&env, position_id).ok_or(Error::PositionNotFound)
    }

    pub fn position_counter(env: Env) -> u64 {
        Storage::position_counter(&env)
    }

    pub fn get_config(env: Env) -> Result<EscrowConfig, Error> {
        Self::config(&env)
    }

    pub fn get_accounting(env: Env) -> EscrowAccounting {
        Storage::get_accounting(&env)
    }

    pub fn is_paused(env: Env) -> bool {
        Storage::is_paused(&env)
    }

    // ============================================
    // INTERNAL HELPERS
    // ============================================

    fn config(env: &Env) -> Result<EscrowConfig, Error> {
        Storage::get_config(env).ok_or(Error::NotInitialized)
    }

    fn check_not_paused(env: &Env) -> Result<(), Error> {
        if Storage::is_paused(env) {
            return Err(Error::ContractPaused);
        }
        Ok(())
    }

    fn interest_at(
        config: &EscrowConfig,
        position: &Position,
        listing: &Listing,
        as_of: u64,
    ) -> Result<i128, Error> {
        let effective = as_of.min(listing.expires_at);
        if effective <= position.start_time {
            return Ok(0);
        }

        interest::accrued_interest(
            position.quantity,
            position.rate_per_second,
            effective - position.start_time,
            config.rate_scale,
        )
        .ok_or(Error::ArithmeticOverflow)
    }

    fn mark_expired(env: &Env, config: &EscrowConfig, listing: &mut Listing) {
        listing.status = ListingStatus::Expired;
        Ledger::new(env, config.subscription_token.clone()).deactivate_if_expired(listing.token_id);

        log!(env, "listing expired", listing.id, listing.available);
        env.events().publish(
            (Symbol::new(env, "listing_expired"), listing.id),
            ListingExpiredEvent {
                listing_id: listing.id,
                token_id: listing.token_id,
                stranded: listing.available,
            },
        );
    }

    fn settle(
        env: &Env,
        config: &EscrowConfig,
        mut position: Position,
        mut listing: Listing,
        settlement_time: u64,
    ) -> Result<Position, Error> {
        let now = env.ledger().timestamp();
        let effective = settlement_time.min(listing.expires_at);
        let interest = Self::interest_at(config, &position, &listing, effective)?;
        let prepaid = position.prepaid_amount;

        let (charged, refund) = if interest <= prepaid {
            position.status = PositionStatus::Settled;
            (interest, prepaid - interest)
        } else {
            let funded = interest::funded_seconds(
                prepaid,
                position.quantity,
                position.rate_per_second,
                config.rate_scale,
            )
            .ok_or(Error::ArithmeticOverflow)?;
            let deadline =
                interest::grace_deadline(position.start_time, funded, config.grace_period_secs);

            if now < deadline {
                log!(env, "interest exceeds prepayment", position.id, interest, prepaid, deadline);
                return Err(Error::InsufficientPrepayment);
            }

            position.status = PositionStatus::Defaulted;
            (prepaid, 0)
        };

        let fee =
            interest::platform_fee(charged, config.platform_fee_bps).ok_or(Error::ArithmeticOverflow)?;
        let lender_payout = charged - fee;

        position.settled_at = effective;
        position.interest_paid = charged;
        position.fee_paid = fee;
        position.refunded = refund;

        let mut accounting = Storage::get_accounting(env);
        accounting.record_settlement(
            prepaid,
            charged,
            fee,
            refund,
            position.status == PositionStatus::Defaulted,
        );

        let keys = [GuardKey::Listing(listing.id), GuardKey::Position(position.id)];
        with_guards(env, &keys, || {
            listing.available += position.quantity;
            listing.open_positions -= 1;
            if listing.is_active() && listing.is_expired_at(now) {
                Self::mark_expired(env, config, &mut listing);
            }

            Storage::set_position(env, &position);
            Storage::set_listing(env, &listing);
            Storage::set_accounting(env, &accounting);

            let payment = token::Client::new(env, &config.payment_token);
            let escrow = env.current_contract_address();
            if fee > 0 {
                payment.transfer(&escrow, &config.platform_treasury, &fee);
            }
            if lender_payout > 0 {
                payment.transfer(&escrow, &listing.lender, &lender_payout);
            }
            if refund > 0 {
                payment.transfer(&escrow, &position.borrower, &refund);
            }
            Ok(())
        })?;

        if position.status == PositionStatus::Defaulted {
            env.events().publish(
                (Symbol::new(env, "position_defaulted"), position.id),
                PositionDefaultedEvent {
                    position_id: position.id,
                    listing_id: listing.id,
                    borrower: position.borrower.clone(),
                    forfeited: charged,
                    fee,
                    lender_payout,
                },
            );
        } else {
            env.events().publish(
                (Symbol::new(env, "position_settled"), position.id),
                PositionSettledEvent {
                    position_id: position.id,
                    listing_id: listing.id,
                    settlement_time: effective,
                    interest: charged,
                    fee,
                    lender_payout,
                    refund,
                },
            );
        }

        Ok(position)
    }
}
