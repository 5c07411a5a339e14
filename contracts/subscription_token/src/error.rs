use soroban_sdk::contracterror;

#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum Error {
    // Initialization errors
    AlreadyInitialized = 1,
    NotInitialized = 2,

    // Authorization errors
    /// Caller is not the admin, the token creator, or an approved operator
    Unauthorized = 3,

    // Input errors
    /// Zero/negative quantity, zero time unit, expiry not in the future,
    /// or a malformed service id / base URI
    InvalidParameters = 4,

    // Token errors
    TokenNotFound = 10,
    /// `now >= expiry_time`, or the token was deactivated (mint only)
    InactiveToken = 11,
    /// `current_supply + quantity > max_supply`
    SupplyCapExceeded = 12,

    // Balance errors
    /// Holder balance < requested quantity
    InsufficientBalance = 20,
    ArithmeticOverflow = 21,
}
