//! Fixed-point money.
//!
//! Stacks, bets, pots and bankrolls are all [`Chips`] — a decimal with at
//! most two fractional digits. Floating point never touches a chip count.

use rust_decimal::{Decimal, RoundingStrategy};

use super::errors::GameError;

/// Type alias for table money. Serializes as a decimal string.
pub type Chips = Decimal;

/// Largest single amount accepted from a caller. Anything bigger is a typo
/// or an attack, not a buy-in.
pub const MAX_AMOUNT: i64 = 100_000_000;

/// Validate an externally supplied amount: strictly positive, at most two
/// decimal places, and within [`MAX_AMOUNT`].
pub fn validate_amount(amount: Chips) -> Result<Chips, GameError> {
    if amount <= Chips::ZERO {
        return Err(GameError::InvalidAmount("amount must be positive".into()));
    }
    if amount.normalize().scale() > 2 {
        return Err(GameError::InvalidAmount(
            "amounts are limited to cents".into(),
        ));
    }
    if amount > Chips::from(MAX_AMOUNT) {
        return Err(GameError::InvalidAmount("amount is too large".into()));
    }
    Ok(amount)
}

/// Round down to whole cents. Used when splitting a pot so the shares never
/// exceed the pot; the leftover cent(s) are awarded separately.
pub fn floor_cents(amount: Chips) -> Chips {
    amount.round_dp_with_strategy(2, RoundingStrategy::ToZero)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn accepts_whole_and_cent_amounts() {
        assert_eq!(validate_amount(dec!(100)), Ok(dec!(100)));
        assert_eq!(validate_amount(dec!(0.01)), Ok(dec!(0.01)));
        assert_eq!(validate_amount(dec!(19.99)), Ok(dec!(19.99)));
    }

    #[test]
    fn rejects_zero_negative_and_subcent() {
        assert!(validate_amount(dec!(0)).is_err());
        assert!(validate_amount(dec!(-5)).is_err());
        assert!(validate_amount(dec!(0.001)).is_err());
    }

    #[test]
    fn rejects_absurd_amounts() {
        assert!(validate_amount(Chips::from(MAX_AMOUNT) + dec!(1)).is_err());
    }

    #[test]
    fn trailing_zeros_do_not_count_as_extra_scale() {
        // 10.10 stored with scale 3 is still a cent amount.
        let amount = dec!(10.100);
        assert_eq!(validate_amount(amount), Ok(amount));
    }

    #[test]
    fn floor_cents_truncates_toward_zero() {
        assert_eq!(floor_cents(dec!(13.333333)), dec!(13.33));
        assert_eq!(floor_cents(dec!(20)), dec!(20));
        assert_eq!(floor_cents(dec!(6.666666)), dec!(6.66));
    }

    #[test]
    fn split_shares_never_exceed_pot() {
        let pot = dec!(40);
        let share = floor_cents(pot / dec!(3));
        assert_eq!(share, dec!(13.33));
        let remainder = pot - share * dec!(3);
        assert_eq!(remainder, dec!(0.01));
        assert_eq!(share * dec!(3) + remainder, pot);
    }

    #[test]
    fn chips_serialize_as_strings() {
        let amount = dec!(102.50);
        assert_eq!(serde_json::to_string(&amount).unwrap(), "\"102.50\"");
        let parsed: Chips = serde_json::from_str("\"33.25\"").unwrap();
        assert_eq!(parsed, dec!(33.25));
    }
}
