//! Trade document domain types.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use tally_shared::types::{
    AccountId, ContactId, DocumentId, JournalEntryId, PaymentId, TenantId, UserId, VAT_RATE,
    round_money,
};

use crate::ledger::JournalType;
use crate::sequence::Series;

/// Which side of trade a document records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    /// Sales invoice issued to a customer.
    Invoice,
    /// Purchase bill received from a vendor.
    Bill,
}

impl DocumentKind {
    /// Returns the string representation of the kind.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Invoice => "invoice",
            Self::Bill => "bill",
        }
    }

    /// Numbering series for the document itself.
    #[must_use]
    pub const fn series(&self) -> Series {
        match self {
            Self::Invoice => Series::Invoice,
            Self::Bill => Series::Bill,
        }
    }

    /// Numbering series for payments settling the document.
    #[must_use]
    pub const fn payment_series(&self) -> Series {
        match self {
            Self::Invoice => Series::Receipt,
            Self::Bill => Series::PaymentVoucher,
        }
    }

    /// Counterparty kind the document must reference.
    #[must_use]
    pub const fn counterparty_kind(&self) -> CounterpartyKind {
        match self {
            Self::Invoice => CounterpartyKind::Customer,
            Self::Bill => CounterpartyKind::Vendor,
        }
    }

    /// Payment direction for the document.
    #[must_use]
    pub const fn payment_type(&self) -> PaymentType {
        match self {
            Self::Invoice => PaymentType::Receive,
            Self::Bill => PaymentType::Pay,
        }
    }

    /// Journal type of the entry posted on approval.
    #[must_use]
    pub const fn journal_type(&self) -> JournalType {
        match self {
            Self::Invoice => JournalType::Sales,
            Self::Bill => JournalType::Purchase,
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Customer or vendor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CounterpartyKind {
    /// Buys from the tenant; referenced by invoices.
    Customer,
    /// Sells to the tenant; referenced by bills.
    Vendor,
}

impl CounterpartyKind {
    /// Returns the string representation of the kind.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Customer => "customer",
            Self::Vendor => "vendor",
        }
    }
}

impl fmt::Display for CounterpartyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Document status.
///
/// The valid transitions are:
/// - Draft → Approved (approve, posts to the ledger)
/// - Draft → Voided (void)
/// - Approved/Partial/Overdue → Partial/Overdue/Paid (payment)
/// - Approved/Partial → Overdue (due date passed)
/// - Approved/Overdue → Voided (void while unpaid, posts a reversal)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentStatus {
    /// Editable, not yet posted.
    Draft,
    /// Posted, nothing paid.
    Approved,
    /// Posted, partly paid.
    Partial,
    /// Posted, due date passed while not fully paid.
    Overdue,
    /// Fully paid (terminal).
    Paid,
    /// Cancelled (terminal).
    Voided,
}

impl DocumentStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Approved => "approved",
            Self::Partial => "partial",
            Self::Overdue => "overdue",
            Self::Paid => "paid",
            Self::Voided => "voided",
        }
    }

    /// Parses a status from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "draft" => Some(Self::Draft),
            "approved" => Some(Self::Approved),
            "partial" => Some(Self::Partial),
            "overdue" => Some(Self::Overdue),
            "paid" => Some(Self::Paid),
            "voided" => Some(Self::Voided),
            _ => None,
        }
    }

    /// Returns true if payments may be applied.
    #[must_use]
    pub const fn accepts_payment(&self) -> bool {
        matches!(self, Self::Approved | Self::Partial | Self::Overdue)
    }

    /// Returns true if no further transition is possible.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Paid | Self::Voided)
    }
}

impl fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A requested lifecycle action, reported in transition errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentAction {
    /// Approve and post.
    Approve,
    /// Apply a payment.
    Pay,
    /// Cancel.
    Void,
}

impl DocumentAction {
    /// Returns the string representation of the action.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Approve => "approve",
            Self::Pay => "pay",
            Self::Void => "void",
        }
    }
}

impl fmt::Display for DocumentAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Payment direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentType {
    /// Money received from a customer against an invoice.
    Receive,
    /// Money paid to a vendor against a bill.
    Pay,
}

impl PaymentType {
    /// Returns the string representation of the payment type.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Receive => "receive",
            Self::Pay => "pay",
        }
    }

    /// Kind of document this payment settles.
    #[must_use]
    pub const fn document_kind(&self) -> DocumentKind {
        match self {
            Self::Receive => DocumentKind::Invoice,
            Self::Pay => DocumentKind::Bill,
        }
    }
}

/// How money moved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Cash.
    Cash,
    /// Bank transfer.
    BankTransfer,
    /// Cheque.
    Cheque,
    /// Credit card.
    CreditCard,
}

impl PaymentMethod {
    /// Returns the string representation of the method.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Cash => "cash",
            Self::BankTransfer => "bank_transfer",
            Self::Cheque => "cheque",
            Self::CreditCard => "credit_card",
        }
    }

    /// Parses a method from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "cash" => Some(Self::Cash),
            "bank_transfer" | "transfer" => Some(Self::BankTransfer),
            "cheque" | "check" => Some(Self::Cheque),
            "credit_card" | "card" => Some(Self::CreditCard),
            _ => None,
        }
    }
}

/// A customer or vendor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counterparty {
    /// Contact ID.
    pub id: ContactId,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Customer or vendor.
    pub kind: CounterpartyKind,
    /// Short code, unique per tenant and kind.
    pub code: String,
    /// Display name used in entry descriptions.
    pub name: String,
    /// Tax identification number.
    pub tax_id: Option<String>,
    /// Inactive counterparties cannot receive new documents.
    pub is_active: bool,
}

/// A document item as entered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentItemInput {
    /// Item narration.
    pub description: String,
    /// Quantity, must be positive.
    pub quantity: Decimal,
    /// Unit price, must not be negative.
    pub unit_price: Decimal,
}

impl DocumentItemInput {
    /// Creates an item.
    #[must_use]
    pub fn new(description: impl Into<String>, quantity: Decimal, unit_price: Decimal) -> Self {
        Self {
            description: description.into(),
            quantity,
            unit_price,
        }
    }
}

/// A priced document item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentItem {
    /// 1-based position within the document.
    pub line_number: i32,
    /// Item narration.
    pub description: String,
    /// Quantity.
    pub quantity: Decimal,
    /// Unit price.
    pub unit_price: Decimal,
    /// `round(quantity × unit_price, 2)`.
    pub amount: Decimal,
}

/// Subtotal, VAT and total of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentTotals {
    /// Sum of item amounts.
    pub subtotal: Decimal,
    /// `round(subtotal × 7%, 2)`.
    pub vat_amount: Decimal,
    /// `subtotal + vat_amount`.
    pub total_amount: Decimal,
}

impl DocumentTotals {
    /// Computes VAT and total from a subtotal.
    #[must_use]
    pub fn from_subtotal(subtotal: Decimal) -> Self {
        let subtotal = round_money(subtotal);
        let vat_amount = round_money(subtotal * VAT_RATE);
        Self {
            subtotal,
            vat_amount,
            total_amount: subtotal + vat_amount,
        }
    }
}

/// An invoice or bill.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeDocument {
    /// Document ID.
    pub id: DocumentId,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Invoice or bill.
    pub kind: DocumentKind,
    /// `INV-…` or `BILL-…` number.
    pub document_number: String,
    /// Issue date.
    pub document_date: NaiveDate,
    /// Payment due date.
    pub due_date: NaiveDate,
    /// Customer (invoice) or vendor (bill).
    pub counterparty_id: ContactId,
    /// Vendor's own invoice number, for bills.
    pub external_reference: Option<String>,
    /// Free-form notes.
    pub notes: Option<String>,
    /// Sum of item amounts.
    pub subtotal: Decimal,
    /// VAT at 7%.
    pub vat_amount: Decimal,
    /// Subtotal plus VAT.
    pub total_amount: Decimal,
    /// Amount settled so far.
    pub paid_amount: Decimal,
    /// Current status.
    pub status: DocumentStatus,
    /// Entry posted on approval.
    pub journal_entry_id: Option<JournalEntryId>,
    /// User who created the document.
    pub created_by: UserId,
    /// Items ordered by line number.
    pub items: Vec<DocumentItem>,
}

impl TradeDocument {
    /// Amount still owed.
    #[must_use]
    pub fn outstanding(&self) -> Decimal {
        self.total_amount - self.paid_amount
    }
}

/// A recorded receipt or payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    /// Payment ID.
    pub id: PaymentId,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// `RCT-…` or `PV-…` number.
    pub document_number: String,
    /// Date money moved.
    pub payment_date: NaiveDate,
    /// Receive (invoice) or pay (bill).
    pub payment_type: PaymentType,
    /// How money moved.
    pub payment_method: PaymentMethod,
    /// Amount applied.
    pub amount: Decimal,
    /// Settled document.
    pub document_id: DocumentId,
    /// Cash or bank account debited or credited.
    pub cash_account_id: AccountId,
    /// Entry posted for the payment.
    pub journal_entry_id: JournalEntryId,
    /// Free-form notes.
    pub notes: Option<String>,
    /// User who recorded the payment.
    pub created_by: UserId,
}
