//! Pricing engine module.
//!
//! Pure arithmetic for rental duration, base total, discounts and cash change.
//! Nothing in here touches the network.

pub mod calculators;
pub mod models;

// Re-export commonly used items
pub use calculators::{
    breakdown, compute_base_total, compute_change, compute_discount, compute_duration,
    compute_final, format_peso, quote, round_money,
};
pub use models::{CheckoutBreakdown, DateRange, DiscountType, PaymentMethod, Quote};
