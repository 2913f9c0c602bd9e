//! `SeaORM` active enums mirroring the Postgres enum types.
//!
//! Each enum converts to and from its `tally-core` counterpart so
//! repositories hand domain types to callers.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use tally_core::{accounts, documents, ledger};

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "account_type")]
pub enum AccountType {
    #[sea_orm(string_value = "asset")]
    Asset,
    #[sea_orm(string_value = "liability")]
    Liability,
    #[sea_orm(string_value = "equity")]
    Equity,
    #[sea_orm(string_value = "revenue")]
    Revenue,
    #[sea_orm(string_value = "expense")]
    Expense,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "normal_balance")]
pub enum NormalBalance {
    #[sea_orm(string_value = "debit")]
    Debit,
    #[sea_orm(string_value = "credit")]
    Credit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "journal_type")]
pub enum JournalType {
    #[sea_orm(string_value = "general")]
    General,
    #[sea_orm(string_value = "sales")]
    Sales,
    #[sea_orm(string_value = "purchase")]
    Purchase,
    #[sea_orm(string_value = "receipt")]
    Receipt,
    #[sea_orm(string_value = "payment")]
    Payment,
    #[sea_orm(string_value = "reversal")]
    Reversal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "journal_status")]
pub enum JournalStatus {
    #[sea_orm(string_value = "posted")]
    Posted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "contact_kind")]
pub enum ContactKind {
    #[sea_orm(string_value = "customer")]
    Customer,
    #[sea_orm(string_value = "vendor")]
    Vendor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "document_kind")]
pub enum DocumentKind {
    #[sea_orm(string_value = "invoice")]
    Invoice,
    #[sea_orm(string_value = "bill")]
    Bill,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "document_status")]
pub enum DocumentStatus {
    #[sea_orm(string_value = "draft")]
    Draft,
    #[sea_orm(string_value = "approved")]
    Approved,
    #[sea_orm(string_value = "partial")]
    Partial,
    #[sea_orm(string_value = "overdue")]
    Overdue,
    #[sea_orm(string_value = "paid")]
    Paid,
    #[sea_orm(string_value = "voided")]
    Voided,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "payment_type")]
pub enum PaymentType {
    #[sea_orm(string_value = "receive")]
    Receive,
    #[sea_orm(string_value = "pay")]
    Pay,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "payment_method")]
pub enum PaymentMethod {
    #[sea_orm(string_value = "cash")]
    Cash,
    #[sea_orm(string_value = "bank_transfer")]
    BankTransfer,
    #[sea_orm(string_value = "cheque")]
    Cheque,
    #[sea_orm(string_value = "credit_card")]
    CreditCard,
}

/// Generates `From` conversions in both directions between a database enum
/// and the domain enum with the same variants.
macro_rules! mirror_enum {
    ($db:ident, $module:ident::$domain:ident, [$($variant:ident),+ $(,)?]) => {
        impl From<$db> for $module::$domain {
            fn from(value: $db) -> Self {
                match value {
                    $($db::$variant => Self::$variant,)+
                }
            }
        }

        impl From<$module::$domain> for $db {
            fn from(value: $module::$domain) -> Self {
                match value {
                    $($module::$domain::$variant => Self::$variant,)+
                }
            }
        }
    };
}

mirror_enum!(
    AccountType,
    accounts::AccountType,
    [Asset, Liability, Equity, Revenue, Expense]
);
mirror_enum!(NormalBalance, accounts::NormalBalance, [Debit, Credit]);
mirror_enum!(
    JournalType,
    ledger::JournalType,
    [General, Sales, Purchase, Receipt, Payment, Reversal]
);
mirror_enum!(JournalStatus, ledger::EntryStatus, [Posted]);
mirror_enum!(ContactKind, documents::CounterpartyKind, [Customer, Vendor]);
mirror_enum!(DocumentKind, documents::DocumentKind, [Invoice, Bill]);
mirror_enum!(
    DocumentStatus,
    documents::DocumentStatus,
    [Draft, Approved, Partial, Overdue, Paid, Voided]
);
mirror_enum!(PaymentType, documents::PaymentType, [Receive, Pay]);
mirror_enum!(
    PaymentMethod,
    documents::PaymentMethod,
    [Cash, BankTransfer, Cheque, CreditCard]
);
