//! Chart of accounts.
//!
//! - Account classification and normal balance derivation
//! - Hierarchy building for the account tree view
//! - The default chart seeded for new tenants

pub mod chart;
pub mod tree;
pub mod types;

pub use chart::{ChartTemplateEntry, default_chart};
pub use tree::{MAX_TREE_DEPTH, build_tree};
pub use types::{Account, AccountNode, AccountType, NormalBalance};
