//! Value types shared by the pricing calculators and checkout.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Inclusive calendar date range.
///
/// Not validated on construction: a proposed reschedule may arrive with
/// `end < start` and must still be representable so it can be rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }
}

/// Discount categories offered at checkout
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiscountType {
    #[default]
    None,
    Student,
    Senior,
}

impl DiscountType {
    /// Fraction of the base total taken off.
    pub fn rate(self) -> Decimal {
        match self {
            DiscountType::None => dec!(0.00),
            DiscountType::Student => dec!(0.20),
            DiscountType::Senior => dec!(0.30),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DiscountType::None => "none",
            DiscountType::Student => "student",
            DiscountType::Senior => "senior",
        }
    }
}

/// How the customer settles a checkout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentMethod {
    #[serde(rename = "cash")]
    Cash,
    #[serde(rename = "gcash")]
    DigitalWallet,
}

impl PaymentMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::DigitalWallet => "gcash",
        }
    }
}

/// Price quote shown while the customer picks dates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quote {
    pub days: i64,
    pub daily_rate: Decimal,
    pub base_total: Decimal,
}

/// Full set of checkout numbers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckoutBreakdown {
    pub base_total: Decimal,
    pub discount_type: DiscountType,
    pub discount_amount: Decimal,
    pub final_price: Decimal,
    pub cash_tendered: Decimal,
    pub change_due: Decimal,
}
