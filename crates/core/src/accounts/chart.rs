//! Default chart of accounts seeded for a new tenant.
//!
//! Five-digit codes; the first digit is the account class. The posting
//! accounts referenced by the default system account codes are all present.

use super::types::AccountType;

/// One account in the seed chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChartTemplateEntry {
    /// Account code.
    pub code: &'static str,
    /// Display name.
    pub name: &'static str,
    /// Account classification.
    pub account_type: AccountType,
    /// Code of the parent entry, listed earlier in the chart.
    pub parent_code: Option<&'static str>,
    /// Whether the account only groups children.
    pub is_header: bool,
}

const fn header(
    code: &'static str,
    name: &'static str,
    account_type: AccountType,
    parent_code: Option<&'static str>,
) -> ChartTemplateEntry {
    ChartTemplateEntry {
        code,
        name,
        account_type,
        parent_code,
        is_header: true,
    }
}

const fn posting(
    code: &'static str,
    name: &'static str,
    account_type: AccountType,
    parent_code: &'static str,
) -> ChartTemplateEntry {
    ChartTemplateEntry {
        code,
        name,
        account_type,
        parent_code: Some(parent_code),
        is_header: false,
    }
}

const DEFAULT_CHART: &[ChartTemplateEntry] = &[
    header("10000", "Assets", AccountType::Asset, None),
    header("11000", "Current Assets", AccountType::Asset, Some("10000")),
    header("11100", "Cash and Cash Equivalents", AccountType::Asset, Some("11000")),
    posting("11110", "Petty Cash", AccountType::Asset, "11100"),
    posting("11120", "Cash at Bank - Savings", AccountType::Asset, "11100"),
    posting("11130", "Cash at Bank - Current", AccountType::Asset, "11100"),
    header("11200", "Trade Receivables", AccountType::Asset, Some("11000")),
    posting("11210", "Trade Accounts Receivable", AccountType::Asset, "11200"),
    header("11400", "Other Current Assets", AccountType::Asset, Some("11000")),
    posting("11410", "Input VAT", AccountType::Asset, "11400"),
    header("20000", "Liabilities", AccountType::Liability, None),
    header("21000", "Current Liabilities", AccountType::Liability, Some("20000")),
    header("21100", "Trade Payables", AccountType::Liability, Some("21000")),
    posting("21110", "Trade Accounts Payable", AccountType::Liability, "21100"),
    header("21200", "Tax Payables", AccountType::Liability, Some("21000")),
    posting("21210", "Output VAT Payable", AccountType::Liability, "21200"),
    header("30000", "Equity", AccountType::Equity, None),
    header("31000", "Share Capital", AccountType::Equity, Some("30000")),
    posting("31100", "Registered Share Capital", AccountType::Equity, "31000"),
    header("32000", "Retained Earnings", AccountType::Equity, Some("30000")),
    posting("32100", "Retained Earnings - Unappropriated", AccountType::Equity, "32000"),
    header("40000", "Revenue", AccountType::Revenue, None),
    header("41000", "Operating Revenue", AccountType::Revenue, Some("40000")),
    posting("41100", "Sales - Products", AccountType::Revenue, "41000"),
    posting("41200", "Service Revenue", AccountType::Revenue, "41000"),
    header("50000", "Expenses", AccountType::Expense, None),
    header("51000", "Cost of Sales", AccountType::Expense, Some("50000")),
    posting("51100", "Cost of Goods Sold", AccountType::Expense, "51000"),
    posting("51200", "Purchases", AccountType::Expense, "51000"),
    header("52000", "Administrative Expenses", AccountType::Expense, Some("50000")),
    posting("52100", "Salaries and Wages", AccountType::Expense, "52000"),
    posting("52200", "Rent Expense", AccountType::Expense, "52000"),
];

/// Returns the default chart, parents before children.
#[must_use]
pub fn default_chart() -> &'static [ChartTemplateEntry] {
    DEFAULT_CHART
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use tally_shared::config::SystemAccountCodes;

    #[test]
    fn test_codes_are_unique() {
        let codes: HashSet<_> = default_chart().iter().map(|e| e.code).collect();
        assert_eq!(codes.len(), default_chart().len());
    }

    #[test]
    fn test_parents_precede_children() {
        let mut seen = HashSet::new();
        for entry in default_chart() {
            if let Some(parent) = entry.parent_code {
                assert!(seen.contains(parent), "{} listed before {parent}", entry.code);
            }
            seen.insert(entry.code);
        }
    }

    #[test]
    fn test_children_share_parent_type_and_parents_are_headers() {
        for entry in default_chart() {
            if let Some(parent_code) = entry.parent_code {
                let parent = default_chart()
                    .iter()
                    .find(|e| e.code == parent_code)
                    .unwrap();
                assert!(parent.is_header);
                assert_eq!(parent.account_type, entry.account_type);
            }
        }
    }

    #[test]
    fn test_default_system_accounts_are_postable() {
        let codes = SystemAccountCodes::default();
        for code in [
            &codes.accounts_receivable,
            &codes.sales_revenue,
            &codes.vat_output,
            &codes.accounts_payable,
            &codes.purchases,
            &codes.vat_input,
        ] {
            let entry = default_chart().iter().find(|e| e.code == code).unwrap();
            assert!(!entry.is_header, "{code} must be postable");
        }
    }
}
