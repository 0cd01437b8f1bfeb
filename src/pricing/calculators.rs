//! Core pricing calculation functions.
//!
//! Pure functions for pricing math - no network access.
//! All amounts are `Decimal`, so the tendered/owed comparison is exact.

use rust_decimal::prelude::*;

use crate::error::{AppError, Result};

use super::models::{CheckoutBreakdown, DateRange, DiscountType, Quote};

/// Round to specified decimal places using banker's rounding (ROUND_HALF_EVEN).
///
/// # Examples
/// ```
/// use rust_decimal_macros::dec;
/// use car_rental_core::pricing::round_money;
///
/// assert_eq!(round_money(dec!(2.5), 0), dec!(2));   // rounds to even
/// assert_eq!(round_money(dec!(3.5), 0), dec!(4));   // rounds to even
/// assert_eq!(round_money(dec!(1.234), 2), dec!(1.23));
/// ```
pub fn round_money(amount: Decimal, places: u32) -> Decimal {
    amount.round_dp_with_strategy(places, RoundingStrategy::MidpointNearestEven)
}

/// Rental duration in days, counting both endpoints.
///
/// A same-day rental is one day. Fails with `InvalidRange` when `end < start`.
pub fn compute_duration(range: DateRange) -> Result<i64> {
    if range.end < range.start {
        return Err(AppError::InvalidRange {
            start: range.start,
            end: range.end,
        });
    }
    Ok((range.end - range.start).num_days() + 1)
}

/// `daily_rate * days`.
///
/// Fails with `InvalidRate` for a non-positive rate, or one so large the total
/// does not fit in a `Decimal`.
pub fn compute_base_total(daily_rate: Decimal, days: i64) -> Result<Decimal> {
    if daily_rate <= Decimal::ZERO {
        return Err(AppError::InvalidRate(daily_rate));
    }
    daily_rate
        .checked_mul(Decimal::from(days))
        .ok_or(AppError::InvalidRate(daily_rate))
}

/// Discount taken off the base total for the given category.
pub fn compute_discount(base_total: Decimal, discount_type: DiscountType) -> Decimal {
    base_total * discount_type.rate()
}

/// `base_total - discount`, never below zero.
pub fn compute_final(base_total: Decimal, discount: Decimal) -> Decimal {
    (base_total - discount).max(Decimal::ZERO)
}

/// Change owed back on a cash payment.
pub fn compute_change(cash_tendered: Decimal, final_price: Decimal) -> Result<Decimal> {
    if cash_tendered < final_price {
        return Err(AppError::InsufficientFunds {
            tendered: cash_tendered,
            owed: final_price,
        });
    }
    Ok(cash_tendered - final_price)
}

/// Duration and base total for a vehicle over a date range.
pub fn quote(daily_rate: Decimal, range: DateRange) -> Result<Quote> {
    let days = compute_duration(range)?;
    let base_total = compute_base_total(daily_rate, days)?;
    Ok(Quote {
        days,
        daily_rate,
        base_total,
    })
}

/// Discount, final price and change for a checkout.
///
/// `cash_tendered` is `None` for wallet payments; those carry no change.
pub fn breakdown(
    base_total: Decimal,
    discount_type: DiscountType,
    cash_tendered: Option<Decimal>,
) -> Result<CheckoutBreakdown> {
    let discount_amount = compute_discount(base_total, discount_type);
    let final_price = compute_final(base_total, discount_amount);

    let (cash_tendered, change_due) = match cash_tendered {
        Some(cash) => (cash, compute_change(cash, final_price)?),
        None => (Decimal::ZERO, Decimal::ZERO),
    };

    Ok(CheckoutBreakdown {
        base_total,
        discount_type,
        discount_amount,
        final_price,
        cash_tendered,
        change_due,
    })
}

/// Render an amount as pesos with thousands separators, e.g. `₱1,234.50`.
pub fn format_peso(amount: Decimal) -> String {
    let rounded = round_money(amount, 2);
    let negative = rounded.is_sign_negative() && !rounded.is_zero();
    let text = format!("{:.2}", rounded.abs());
    let (whole, fraction) = text.split_once('.').unwrap_or((text.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    format!("{}₱{}.{}", if negative { "-" } else { "" }, grouped, fraction)
}
