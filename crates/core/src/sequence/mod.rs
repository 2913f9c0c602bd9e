//! Document number series.
//!
//! Numbers have the form `{PREFIX}-{YYYYMM}-{NNNN}`: one independent,
//! gap-free counter per tenant, series and calendar month. Allocation itself
//! happens in the database inside the caller's transaction; this module owns
//! the formatting, parsing and error vocabulary.

pub mod error;
pub mod number;

pub use error::SequenceError;
pub use number::{DocumentNumber, Period, Series};
