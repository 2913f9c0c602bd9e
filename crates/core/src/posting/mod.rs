//! Automatic posting rules.
//!
//! Turns approved documents and recorded payments into balanced journal
//! entry requests for the ledger:
//!
//! | Trigger          | Debit                        | Credit                       |
//! |------------------|------------------------------|------------------------------|
//! | Invoice approved | AR: total                    | Sales: subtotal, VAT Output  |
//! | Bill approved    | Purchases: subtotal, VAT In  | AP: total                    |
//! | Receipt          | cash/bank: amount            | AR: amount                   |
//! | Payment          | AP: amount                   | cash/bank: amount            |

pub mod error;
pub mod rules;

#[cfg(test)]
mod rules_props;

pub use error::PostingError;
pub use rules::{PostingRules, SystemAccountRole};
