//! Display formatting and lenient input parsing.
//!
//! Output follows en-US conventions: comma thousands separators, a dot
//! decimal separator and `Jan 15, 2024` style dates.

use chrono::{NaiveDate, TimeDelta};

use crate::error::{FinanceError, Result};
use crate::models::Currency;

/// Formats an amount in the given display currency.
///
/// Well-known codes use their symbol (`$1,234.56`); other codes are
/// prefixed with the code itself (`CHF 1,234.56`). Fraction digits follow
/// [`Currency::fraction_digits`].
#[must_use]
pub fn format_currency(amount: f64, currency: &Currency) -> String {
    let digits = currency.fraction_digits();
    let body = group_decimal(&format!("{:.*}", digits, amount.abs()));
    let sign = if amount < 0.0 && body.chars().any(|ch| matches!(ch, '1'..='9')) {
        "-"
    } else {
        ""
    };
    match currency.symbol() {
        Some(symbol) => format!("{sign}{symbol}{body}"),
        None => format!("{sign}{} {body}", currency.code()),
    }
}

/// Formats a number with thousands separators and at most two fraction
/// digits, dropping trailing zeros (`1,234.5`, `1,000`).
#[must_use]
pub fn format_number(value: f64) -> String {
    let fixed = format!("{:.2}", value.abs());
    let trimmed = if fixed.contains('.') {
        fixed.trim_end_matches('0').trim_end_matches('.')
    } else {
        fixed.as_str()
    };
    let body = group_decimal(trimmed);
    if value < 0.0 && body != "0" {
        format!("-{body}")
    } else {
        body
    }
}

/// Parses user-typed amounts leniently.
///
/// Everything except ASCII digits and `.` is discarded, then the longest
/// leading decimal number is read. Input with no digits yields `0`. A minus
/// sign is discarded like any other character, so `"-5"` parses as `5`.
#[must_use]
pub fn parse_formatted_number(input: &str) -> f64 {
    let cleaned: String = input
        .chars()
        .filter(|ch| ch.is_ascii_digit() || *ch == '.')
        .collect();
    let mut seen_dot = false;
    let prefix: String = cleaned
        .chars()
        .take_while(|ch| {
            if *ch == '.' {
                if seen_dot {
                    return false;
                }
                seen_dot = true;
            }
            true
        })
        .collect();
    prefix.parse::<f64>().unwrap_or(0.0)
}

/// Formats a date as `Jan 15, 2024`.
#[inline]
#[must_use]
pub fn format_date(date: NaiveDate) -> String {
    date.format("%b %-d, %Y").to_string()
}

/// Formats the month of a date as `January 2024`.
#[inline]
#[must_use]
pub fn month_name(date: NaiveDate) -> String {
    date.format("%B %Y").to_string()
}

/// Normalizes a `YYYY-MM-DD` string to a calendar date.
///
/// Each dash-separated component is read as a leading integer (so
/// `"2024-01-15T10:00"` reads day `15`). Out-of-range months and days roll
/// over into neighbouring months and years: `2024-13-01` becomes
/// `2025-01-01` and `2024-02-30` becomes `2024-03-01`. Years `0..=99` are
/// taken as `1900..=1999`.
///
/// # Errors
///
/// Returns [`FinanceError::InvalidDate`] if a component is missing or has
/// no leading digits, or if the result is outside the representable range.
pub fn normalize_date(input: &str) -> Result<NaiveDate> {
    let invalid = || FinanceError::InvalidDate(input.to_owned());
    let mut parts = input.split('-');
    let mut component = || parts.next().and_then(parse_int_prefix).ok_or_else(invalid);
    let raw_year = component()?;
    let month = component()?;
    let day = component()?;

    let year = if (0..=99).contains(&raw_year) {
        raw_year + 1900
    } else {
        raw_year
    };
    let month_index = month.checked_sub(1).ok_or_else(invalid)?;
    let year_total = year
        .checked_add(month_index.div_euclid(12))
        .ok_or_else(invalid)?;
    let month0 = month_index.rem_euclid(12);

    let first = i32::try_from(year_total)
        .ok()
        .zip(u32::try_from(month0 + 1).ok())
        .and_then(|(y, m)| NaiveDate::from_ymd_opt(y, m, 1))
        .ok_or_else(invalid)?;
    day.checked_sub(1)
        .and_then(TimeDelta::try_days)
        .and_then(|offset| first.checked_add_signed(offset))
        .ok_or_else(invalid)
}

/// Generates an identifier of the form `{prefix}-{uuid}`.
#[inline]
#[must_use]
pub fn generate_unique_id(prefix: &str) -> String {
    format!("{prefix}-{}", uuid::Uuid::new_v4())
}

// ── Helpers ─────────────────────────────────────────────────────────────

/// Reads an optionally signed leading integer, skipping leading
/// whitespace. Returns `None` when no digit follows.
fn parse_int_prefix(text: &str) -> Option<i64> {
    let trimmed = text.trim_start();
    let (negative, rest) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };
    let mut value: Option<i64> = None;
    for digit in rest.chars().map_while(|ch| ch.to_digit(10)) {
        value = Some(
            value
                .unwrap_or(0)
                .checked_mul(10)?
                .checked_add(i64::from(digit))?,
        );
    }
    value.map(|magnitude| if negative { -magnitude } else { magnitude })
}

/// Inserts thousands separators into the integer part of a plain decimal
/// string such as `1234567.89`.
fn group_decimal(plain: &str) -> String {
    let (int_part, frac_part) = plain.split_once('.').map_or((plain, None), |(i, f)| (i, Some(f)));
    let len = int_part.chars().count();
    let mut grouped = String::with_capacity(plain.len() + len.div_euclid(3));
    for (idx, ch) in int_part.chars().enumerate() {
        if idx > 0 && (len - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if let Some(frac) = frac_part {
        grouped.push('.');
        grouped.push_str(frac);
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn currency_usd_grouping() {
        let usd = Currency::default();
        assert_eq!(format_currency(1234.5, &usd), "$1,234.50");
        assert_eq!(format_currency(0.0, &usd), "$0.00");
        assert_eq!(format_currency(1_000_000.0, &usd), "$1,000,000.00");
        assert_eq!(format_currency(-42.1, &usd), "-$42.10");
        assert_eq!(format_currency(999.999, &usd), "$1,000.00");
    }

    #[test]
    fn currency_other_codes() {
        assert_eq!(format_currency(1500.0, &Currency::new("EUR")), "\u{20ac}1,500.00");
        assert_eq!(format_currency(1500.4, &Currency::new("JPY")), "\u{a5}1,500");
        assert_eq!(format_currency(12.0, &Currency::new("CHF")), "CHF 12.00");
    }

    #[test]
    fn currency_negative_zero_has_no_sign() {
        assert_eq!(format_currency(-0.001, &Currency::default()), "$0.00");
    }

    #[test]
    fn number_trims_fraction() {
        assert_eq!(format_number(1234.5), "1,234.5");
        assert_eq!(format_number(1000.0), "1,000");
        assert_eq!(format_number(0.126), "0.13");
        assert_eq!(format_number(-2500.75), "-2,500.75");
        assert_eq!(format_number(0.0), "0");
    }

    #[test]
    fn parse_strips_formatting() {
        assert!((parse_formatted_number("$1,234.56") - 1234.56).abs() < 1e-9);
        assert!((parse_formatted_number("12.34.56") - 12.34).abs() < 1e-9);
        assert!((parse_formatted_number(" 7 ") - 7.0).abs() < 1e-9);
        assert!((parse_formatted_number("-5") - 5.0).abs() < 1e-9);
        assert!((parse_formatted_number(".5") - 0.5).abs() < 1e-9);
    }

    #[test]
    fn parse_falls_back_to_zero() {
        assert!(parse_formatted_number("").abs() < f64::EPSILON);
        assert!(parse_formatted_number("abc").abs() < f64::EPSILON);
        assert!(parse_formatted_number(".").abs() < f64::EPSILON);
    }

    #[test]
    fn format_date_short_month() {
        assert_eq!(format_date(date(2024, 1, 15)), "Jan 15, 2024");
        assert_eq!(format_date(date(2023, 12, 3)), "Dec 3, 2023");
    }

    #[test]
    fn month_name_full() {
        assert_eq!(month_name(date(2024, 1, 15)), "January 2024");
        assert_eq!(month_name(date(2023, 9, 30)), "September 2023");
    }

    #[test]
    fn normalize_plain_dates() {
        assert_eq!(normalize_date("2024-01-15").unwrap(), date(2024, 1, 15));
        assert_eq!(normalize_date("2024-1-5").unwrap(), date(2024, 1, 5));
        assert_eq!(normalize_date("2024-03-07T12:00:00").unwrap(), date(2024, 3, 7));
    }

    #[test]
    fn normalize_rolls_over() {
        assert_eq!(normalize_date("2024-13-01").unwrap(), date(2025, 1, 1));
        assert_eq!(normalize_date("2024-02-30").unwrap(), date(2024, 3, 1));
        assert_eq!(normalize_date("2024-00-10").unwrap(), date(2023, 12, 10));
        assert_eq!(normalize_date("2024-03-00").unwrap(), date(2024, 2, 29));
    }

    #[test]
    fn normalize_two_digit_year() {
        assert_eq!(normalize_date("99-06-01").unwrap(), date(1999, 6, 1));
    }

    #[test]
    fn normalize_rejects_garbage() {
        for input in ["", "2024", "2024-01", "abcd-01-01", "2024-xx-01", "2024-01-"] {
            let err = normalize_date(input).unwrap_err();
            assert!(matches!(err, FinanceError::InvalidDate(_)), "{input}");
        }
    }

    #[test]
    fn unique_id_has_prefix() {
        let id = generate_unique_id("debt");
        assert!(id.starts_with("debt-"));
        assert_eq!(id.len(), "debt-".len() + 36);
        assert_ne!(id, generate_unique_id("debt"));
    }
}
