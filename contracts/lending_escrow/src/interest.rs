use crate::storage::BASIS_POINTS;

/// Interest accrued by `quantity` units over `elapsed` seconds
///
/// Formula: interest = floor(quantity × rate_per_second × elapsed / rate_scale)
///
/// Example:
/// - quantity: 10 units
/// - rate_per_second: 1.0 (= rate_scale)
/// - elapsed: 100 s
/// - interest: 10 × 1.0 × 100 = 1,000
///
/// Returns `None` if an intermediate product overflows i128.
pub fn accrued_interest(
    quantity: i128,
    rate_per_second: i128,
    elapsed: u64,
    rate_scale: i128,
) -> Option<i128> {
    if quantity == 0 || rate_per_second == 0 || elapsed == 0 {
        return Some(0);
    }

    quantity
        .checked_mul(rate_per_second)?
        .checked_mul(elapsed as i128)?
        .checked_div(rate_scale)
}

/// Smallest prepayment accepted when opening a position: the interest
/// owed over the minimum commitment horizon.
pub fn min_prepayment(
    quantity: i128,
    rate_per_second: i128,
    horizon_secs: u64,
    rate_scale: i128,
) -> Option<i128> {
    accrued_interest(quantity, rate_per_second, horizon_secs, rate_scale)
}

/// Platform share of an interest (or forfeited) amount
///
/// Formula: fee = floor(amount × fee_bps / 10,000)
///
/// Example:
/// - amount: 1,000
/// - fee: 5% (500 basis points)
/// - fee: 50, lender receives 950
pub fn platform_fee(amount: i128, fee_bps: u32) -> Option<i128> {
    amount
        .checked_mul(fee_bps as i128)?
        .checked_div(BASIS_POINTS)
}

/// Last elapsed second whose floored interest is still covered by `prepaid`
///
/// Formula: funded = ((prepaid + 1) × rate_scale − 1) / (quantity × rate)
///
/// so that `accrued_interest(funded) <= prepaid < accrued_interest(funded + 1)`.
/// A zero rate never runs out of funding and yields `u64::MAX`.
pub fn funded_seconds(
    prepaid: i128,
    quantity: i128,
    rate_per_second: i128,
    rate_scale: i128,
) -> Option<u64> {
    if quantity == 0 || rate_per_second == 0 {
        return Some(u64::MAX);
    }

    let per_second = quantity.checked_mul(rate_per_second)?;
    let covered = prepaid
        .checked_add(1)?
        .checked_mul(rate_scale)?
        .checked_sub(1)?
        .checked_div(per_second)?;

    Some(u64::try_from(covered).unwrap_or(u64::MAX))
}

/// Moment after which an under-funded position may be forced into default
pub fn grace_deadline(start_time: u64, funded: u64, grace_period_secs: u64) -> u64 {
    start_time
        .saturating_add(funded)
        .saturating_add(1)
        .saturating_add(grace_period_secs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::SCALE;

    #[test]
    fn test_accrued_interest() {
        // 10 units × 1.0/s × 100 s = 1,000
        let interest = accrued_interest(10, SCALE, 100, SCALE).unwrap();
        assert_eq!(interest, 1_000);

        assert_eq!(accrued_interest(10, SCALE, 0, SCALE), Some(0));
        assert_eq!(accrued_interest(10, 0, 100, SCALE), Some(0));
    }

    #[test]
    fn test_accrued_interest_rounds_down() {
        // 1 unit × 0.5/s × 3 s = 1.5 → 1
        let half = SCALE / 2;
        assert_eq!(accrued_interest(1, half, 3, SCALE), Some(1));

        // 3 units × 0.0000001/s × 3 s = 0.0000009 → 0
        assert_eq!(accrued_interest(3, 1, 3, SCALE), Some(0));
    }

    #[test]
    fn test_accrued_interest_overflow() {
        assert_eq!(accrued_interest(i128::MAX / 2, 3, 1, SCALE), None);
        assert_eq!(accrued_interest(i128::MAX / 4, 2, u64::MAX, SCALE), None);
    }

    #[test]
    fn test_accrued_interest_is_monotonic() {
        let rate = 3 * SCALE / 7;
        let mut previous = 0;
        for elapsed in 0..500u64 {
            let interest = accrued_interest(13, rate, elapsed, SCALE).unwrap();
            assert!(interest >= previous);
            previous = interest;
        }
    }

    #[test]
    fn test_min_prepayment() {
        // 10 units × 1.0/s over a 60 s commitment
        assert_eq!(min_prepayment(10, SCALE, 60, SCALE), Some(600));
        assert_eq!(min_prepayment(10, SCALE, 0, SCALE), Some(0));
    }

    #[test]
    fn test_platform_fee() {
        assert_eq!(platform_fee(1_000, 500), Some(50));
        assert_eq!(platform_fee(1_000, 0), Some(0));
        assert_eq!(platform_fee(1_000, 10_000), Some(1_000));
        // 5% of 19 = 0.95 → 0
        assert_eq!(platform_fee(19, 500), Some(0));
    }

    #[test]
    fn test_funded_seconds_boundary() {
        let rate = SCALE / 3;
        let prepaid = 1_000;
        let funded = funded_seconds(prepaid, 7, rate, SCALE).unwrap();

        assert!(accrued_interest(7, rate, funded, SCALE).unwrap() <= prepaid);
        assert!(accrued_interest(7, rate, funded + 1, SCALE).unwrap() > prepaid);
    }

    #[test]
    fn test_funded_seconds_exact_cover() {
        // 10 units × 1.0/s: 1,000 covers exactly 100 s
        assert_eq!(funded_seconds(1_000, 10, SCALE, SCALE), Some(100));
        assert_eq!(funded_seconds(0, 10, SCALE, SCALE), Some(0));
    }

    #[test]
    fn test_funded_seconds_zero_rate() {
        assert_eq!(funded_seconds(0, 10, 0, SCALE), Some(u64::MAX));
    }

    #[test]
    fn test_grace_deadline() {
        assert_eq!(grace_deadline(1_000, 100, 0), 1_101);
        assert_eq!(grace_deadline(1_000, 100, 3_600), 4_701);
        assert_eq!(grace_deadline(1_000, u64::MAX, 0), u64::MAX);
    }
}
