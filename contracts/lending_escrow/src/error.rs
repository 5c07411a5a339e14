use soroban_sdk::contracterror;

#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum Error {
    // ============================================
    // INITIALIZATION ERRORS (1-5)
    // ============================================
    /// Contract already initialized
    AlreadyInitialized = 1,
    /// Contract not initialized
    NotInitialized = 2,

    // ============================================
    // AUTHORIZATION ERRORS (10-15)
    // ============================================
    /// Caller is not the lender / borrower / admin required by the operation
    Unauthorized = 10,

    // ============================================
    // INPUT ERRORS (20-29)
    // ============================================
    /// Non-positive amount or quantity, negative rate or prepayment,
    /// fee above 10,000 bps, or settlement time outside [start, now]
    InvalidParameters = 20,

    // ============================================
    // RECORD ERRORS (30-39)
    // ============================================
    /// Listing not found
    ListingNotFound = 30,
    /// Position not found
    PositionNotFound = 31,
    /// Token id unknown to the subscription token ledger
    TokenNotFound = 32,

    // ============================================
    // FUNDING ERRORS (40-49)
    // ============================================
    /// Lender holds fewer ledger units than the listing amount
    InsufficientBalance = 40,
    /// Prepayment below the minimum commitment, or accrued interest
    /// exceeds the prepayment before the grace deadline
    InsufficientPrepayment = 41,
    /// Requested quantity > listing available
    ExceedsAvailable = 42,

    // ============================================
    // STATE ERRORS (50-59)
    // ============================================
    /// Backing token inactive or past its expiry time
    InactiveToken = 50,
    /// Listing cancelled or expired
    InactiveListing = 51,
    /// Listing still has borrowed quantity outstanding (available < amount)
    ListingBusy = 52,
    /// Position already settled or defaulted
    AlreadySettled = 53,
    /// Expiry sweep called before the token expiry time
    NotExpired = 54,

    // ============================================
    // ARITHMETIC ERRORS (60-69)
    // ============================================
    /// A fixed-point product does not fit in i128
    ArithmeticOverflow = 60,

    // ============================================
    // OPERATIONAL ERRORS (70-79)
    // ============================================
    /// Contract is paused
    ContractPaused = 70,
    /// Listing or position is already mid-operation
    Reentrancy = 71,
}
