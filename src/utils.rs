use chrono::{Datelike, Months, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use std::str::FromStr;

use crate::constants::MONTH_KEY_FORMAT;
use crate::errors::ValidationError;

/// Parses a decimal stored as TEXT. Storage writes always go through
/// `Decimal::to_string`, so a parse failure here means a corrupted row; it
/// is surfaced as an error, never coerced into a plausible number.
pub fn parse_stored_decimal(
    value_str: &str,
    field_name: &str,
) -> Result<Decimal, ValidationError> {
    Decimal::from_str(value_str).map_err(|e| {
        log::error!(
            "Failed to parse {} '{}' as Decimal: {}",
            field_name,
            value_str,
            e
        );
        ValidationError::CorruptStoredValue {
            field: field_name.to_string(),
            value: value_str.to_string(),
        }
    })
}

/// Month key ("YYYY-MM") for a timestamp.
pub fn month_key_of(ts: NaiveDateTime) -> String {
    ts.format(MONTH_KEY_FORMAT).to_string()
}

/// Month key for the current UTC time.
pub fn current_month_key() -> String {
    month_key_of(Utc::now().naive_utc())
}

fn first_day_of(month: &str) -> Result<NaiveDate, ValidationError> {
    NaiveDate::parse_from_str(&format!("{}-01", month), "%Y-%m-%d")
        .map_err(|_| ValidationError::InvalidMonth(month.to_string()))
}

/// Validates a "YYYY-MM" month key.
pub fn validate_month_key(month: &str) -> Result<(), ValidationError> {
    first_day_of(month).map(|_| ())
}

/// Half-open timestamp range [start, end) covering the given month.
pub fn month_bounds(month: &str) -> Result<(NaiveDateTime, NaiveDateTime), ValidationError> {
    let start = first_day_of(month)?;
    let end = start
        .checked_add_months(Months::new(1))
        .ok_or_else(|| ValidationError::InvalidMonth(month.to_string()))?;
    Ok((
        start.and_hms_opt(0, 0, 0).expect("midnight is always valid"),
        end.and_hms_opt(0, 0, 0).expect("midnight is always valid"),
    ))
}

/// Shifts a month key backwards by `months_back` whole months.
pub fn shift_month_back(month: &str, months_back: u32) -> Result<String, ValidationError> {
    let start = first_day_of(month)?;
    let shifted = start
        .checked_sub_months(Months::new(months_back))
        .ok_or_else(|| ValidationError::InvalidMonth(month.to_string()))?;
    Ok(format!("{:04}-{:02}", shifted.year(), shifted.month()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn parses_stored_decimal() {
        assert_eq!(
            parse_stored_decimal("1234.56", "amount").unwrap(),
            dec!(1234.56)
        );
        assert!(matches!(
            parse_stored_decimal("garbage", "amount"),
            Err(ValidationError::CorruptStoredValue { .. })
        ));
    }

    #[test]
    fn month_bounds_cover_one_month() {
        let (start, end) = month_bounds("2024-01").unwrap();
        assert_eq!(start.to_string(), "2024-01-01 00:00:00");
        assert_eq!(end.to_string(), "2024-02-01 00:00:00");
        assert!(month_bounds("2024-13").is_err());
        assert!(month_bounds("not-a-month").is_err());
    }

    #[test]
    fn shifts_months_across_year_boundary() {
        assert_eq!(shift_month_back("2024-01", 1).unwrap(), "2023-12");
        assert_eq!(shift_month_back("2024-03", 15).unwrap(), "2022-12");
        assert_eq!(shift_month_back("2024-03", 0).unwrap(), "2024-03");
    }
}
