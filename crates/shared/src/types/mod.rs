//! Common types used across the application.

pub mod id;
pub mod money;
pub mod pagination;

pub use id::*;
pub use money::{
    MAX_AMOUNT, MONEY_SCALE, MONEY_TOLERANCE, VAT_RATE, checked_sum, is_storable, round_money,
    within_tolerance,
};
pub use pagination::{MAX_PER_PAGE, PageMeta, PageRequest, PageResponse};
