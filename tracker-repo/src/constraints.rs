//! Integrity rules checked on every write, and the names under which they are
//! reported. The PostgreSQL schema declares the same constraints with the same
//! names, so both backends surface identical errors.

use crate::error::RepoError;
use crate::lifecycle::truncate_to_micros;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

pub const UNIQUE_USER_EMAIL: &str = "unique_user_email";
pub const UNIQUE_TAG_NAME_BY_USER: &str = "unique_tag_name_by_user";
pub const UNIQUE_TRANSACTION: &str = "unique_transaction";
pub const UNIQUE_REVERSAL: &str = "unique_reversal";
pub const NON_NEGATIVE_AMOUNT: &str = "non_negative_amount";
pub const TRANSACTION_DATE_NOT_FUTURE: &str = "transaction_date_not_future";
pub const AMOUNT_PRECISION: &str = "amount_precision";

pub const TAG_CREATED_BY_FKEY: &str = "transaction_tags_created_by_fkey";
pub const TRANSACTION_CREATED_BY_FKEY: &str = "transactions_created_by_fkey";
pub const REVERSAL_CREATED_BY_FKEY: &str = "transaction_reversals_created_by_fkey";
pub const REVERSAL_TRANSACTION_FKEY: &str = "transaction_reversals_transaction_id_fkey";
pub const LINK_TRANSACTION_FKEY: &str = "transactions_tags_transaction_id_fkey";
pub const LINK_TAG_FKEY: &str = "transactions_tags_tag_id_fkey";

/// Total digits of a stored amount.
pub const AMOUNT_DIGITS: u32 = 10;
/// Fraction digits of a stored amount.
pub const AMOUNT_SCALE: u32 = 2;

/// Checks that `amount` fits `NUMERIC(10, 2)` and returns it with exactly two
/// fraction digits.
pub fn check_amount_precision(amount: Decimal) -> Result<Decimal, RepoError> {
    if amount.normalize().scale() > AMOUNT_SCALE {
        return Err(RepoError::constraint(AMOUNT_PRECISION));
    }
    let mut amount = amount;
    amount.rescale(AMOUNT_SCALE);
    if amount.mantissa().abs() >= 10_i128.pow(AMOUNT_DIGITS) {
        return Err(RepoError::constraint(AMOUNT_PRECISION));
    }
    Ok(amount)
}

pub fn check_non_negative(amount: Decimal) -> Result<(), RepoError> {
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(RepoError::constraint(NON_NEGATIVE_AMOUNT));
    }
    Ok(())
}

pub fn check_transaction_date(
    transaction_date: DateTime<Utc>,
    created_at: DateTime<Utc>,
) -> Result<(), RepoError> {
    if transaction_date > created_at {
        return Err(RepoError::constraint(TRANSACTION_DATE_NOT_FUTURE));
    }
    Ok(())
}

/// All row-local checks for a transaction or reversal, in the order the
/// database evaluates them. Returns the amount and date as they are stored:
/// two fraction digits and microsecond precision.
pub fn check_entry(
    amount: Decimal,
    transaction_date: DateTime<Utc>,
    created_at: DateTime<Utc>,
) -> Result<(Decimal, DateTime<Utc>), RepoError> {
    let amount = check_amount_precision(amount)?;
    check_non_negative(amount)?;
    let transaction_date = truncate_to_micros(transaction_date);
    check_transaction_date(transaction_date, created_at)?;
    Ok((amount, transaction_date))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use std::str::FromStr;

    fn violated<T: std::fmt::Debug>(result: Result<T, RepoError>) -> String {
        match result {
            Err(RepoError::ConstraintViolation(c)) => c,
            other => panic!("expected constraint violation, got {:?}", other),
        }
    }

    #[test]
    fn test_amount_precision() {
        let amount = check_amount_precision(Decimal::from(5)).unwrap();
        assert_eq!(amount.to_string(), "5.00");

        let amount = check_amount_precision(Decimal::from_str("1.500").unwrap()).unwrap();
        assert_eq!(amount.to_string(), "1.50");

        let max = Decimal::from_str("99999999.99").unwrap();
        assert_eq!(check_amount_precision(max).unwrap(), max);

        let too_big = Decimal::from_str("100000000.00").unwrap();
        assert_eq!(violated(check_amount_precision(too_big)), AMOUNT_PRECISION);

        let too_fine = Decimal::from_str("0.001").unwrap();
        assert_eq!(violated(check_amount_precision(too_fine)), AMOUNT_PRECISION);
    }

    #[test]
    fn test_non_negative() {
        assert!(check_non_negative(Decimal::ZERO).is_ok());
        assert!(check_non_negative(Decimal::from_str("-0.00").unwrap()).is_ok());
        assert!(matches!(
            check_non_negative(Decimal::from_str("-0.01").unwrap()),
            Err(RepoError::ConstraintViolation(_))
        ));
    }

    #[test]
    fn test_check_entry() {
        let created_at = Utc.with_ymd_and_hms(2023, 3, 1, 9, 30, 0).unwrap();

        assert!(check_entry(Decimal::ONE, created_at, created_at).is_ok());
        assert_eq!(
            violated(check_entry(
                Decimal::ONE,
                created_at + Duration::seconds(1),
                created_at
            )),
            TRANSACTION_DATE_NOT_FUTURE
        );
        assert_eq!(
            violated(check_entry(
                Decimal::from_str("-0.01").unwrap(),
                created_at,
                created_at
            )),
            NON_NEGATIVE_AMOUNT
        );
    }

    #[test]
    fn test_check_entry_truncates_date() {
        let created_at = Utc.with_ymd_and_hms(2023, 3, 1, 9, 30, 0).unwrap();

        let (amount, date) =
            check_entry(Decimal::ONE, created_at + Duration::nanoseconds(400), created_at).unwrap();
        assert_eq!(amount.to_string(), "1.00");
        assert_eq!(date, created_at);

        assert_eq!(
            violated(check_entry(
                Decimal::ONE,
                created_at + Duration::microseconds(1),
                created_at
            )),
            TRANSACTION_DATE_NOT_FUTURE
        );
    }
}
