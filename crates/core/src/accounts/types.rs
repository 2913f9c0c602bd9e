//! Account domain types.

use serde::{Deserialize, Serialize};
use std::fmt;
use tally_shared::types::{AccountId, TenantId};

/// Classification of an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    /// Resources owned (cash, receivables, input VAT).
    Asset,
    /// Obligations owed (payables, output VAT).
    Liability,
    /// Owner's residual interest.
    Equity,
    /// Income from sales and services.
    Revenue,
    /// Costs incurred (purchases, salaries).
    Expense,
}

impl AccountType {
    /// Returns the string representation of the account type.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Asset => "asset",
            Self::Liability => "liability",
            Self::Equity => "equity",
            Self::Revenue => "revenue",
            Self::Expense => "expense",
        }
    }

    /// Parses an account type from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "asset" => Some(Self::Asset),
            "liability" => Some(Self::Liability),
            "equity" => Some(Self::Equity),
            "revenue" => Some(Self::Revenue),
            "expense" => Some(Self::Expense),
            _ => None,
        }
    }

    /// Normal balance side for this account type.
    ///
    /// Asset/Expense are debit-normal; Liability/Equity/Revenue are credit-normal.
    #[must_use]
    pub const fn normal_balance(&self) -> NormalBalance {
        match self {
            Self::Asset | Self::Expense => NormalBalance::Debit,
            Self::Liability | Self::Equity | Self::Revenue => NormalBalance::Credit,
        }
    }
}

impl fmt::Display for AccountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The side on which an account's balance normally increases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NormalBalance {
    /// Balance grows with debits.
    Debit,
    /// Balance grows with credits.
    Credit,
}

impl NormalBalance {
    /// Returns the string representation of the normal balance.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Debit => "debit",
            Self::Credit => "credit",
        }
    }

    /// Parses a normal balance from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "debit" => Some(Self::Debit),
            "credit" => Some(Self::Credit),
            _ => None,
        }
    }
}

impl fmt::Display for NormalBalance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A chart of accounts entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Account ID.
    pub id: AccountId,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Account code, unique within the tenant.
    pub code: String,
    /// Display name.
    pub name: String,
    /// Account classification.
    pub account_type: AccountType,
    /// Derived from `account_type`.
    pub normal_balance: NormalBalance,
    /// Depth in the hierarchy, 1 for top-level accounts.
    pub level: i16,
    /// Header accounts group children and never receive postings.
    pub is_header: bool,
    /// Parent account, if any.
    pub parent_id: Option<AccountId>,
    /// Inactive accounts cannot receive new postings.
    pub is_active: bool,
}

impl Account {
    /// Returns true if journal lines may be posted to this account.
    #[must_use]
    pub const fn is_postable(&self) -> bool {
        self.is_active && !self.is_header
    }

    /// Level for a new account placed under `parent`.
    #[must_use]
    pub fn child_level(parent: Option<&Self>) -> i16 {
        parent.map_or(1, |p| p.level.saturating_add(1))
    }
}

/// An account with its children, as returned by the tree view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountNode {
    /// The account itself.
    #[serde(flatten)]
    pub account: Account,
    /// Direct children ordered by code.
    pub children: Vec<AccountNode>,
}

impl AccountNode {
    /// Total number of accounts in this subtree, including the node itself.
    #[must_use]
    pub fn subtree_size(&self) -> usize {
        1 + self.children.iter().map(Self::subtree_size).sum::<usize>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(AccountType::Asset, NormalBalance::Debit)]
    #[case(AccountType::Expense, NormalBalance::Debit)]
    #[case(AccountType::Liability, NormalBalance::Credit)]
    #[case(AccountType::Equity, NormalBalance::Credit)]
    #[case(AccountType::Revenue, NormalBalance::Credit)]
    fn test_normal_balance_derivation(#[case] ty: AccountType, #[case] expected: NormalBalance) {
        assert_eq!(ty.normal_balance(), expected);
    }

    #[test]
    fn test_account_type_parse() {
        assert_eq!(AccountType::parse("asset"), Some(AccountType::Asset));
        assert_eq!(AccountType::parse("REVENUE"), Some(AccountType::Revenue));
        assert_eq!(AccountType::parse("income"), None);
        assert_eq!(AccountType::Liability.to_string(), "liability");
    }

    #[test]
    fn test_is_postable() {
        let mut account = Account {
            id: AccountId::new(),
            tenant_id: TenantId::new(),
            code: "11110".to_string(),
            name: "Petty Cash".to_string(),
            account_type: AccountType::Asset,
            normal_balance: NormalBalance::Debit,
            level: 4,
            is_header: false,
            parent_id: None,
            is_active: true,
        };
        assert!(account.is_postable());
        assert_eq!(Account::child_level(Some(&account)), 5);
        assert_eq!(Account::child_level(None), 1);

        account.is_header = true;
        assert!(!account.is_postable());

        account.is_header = false;
        account.is_active = false;
        assert!(!account.is_postable());
    }
}
