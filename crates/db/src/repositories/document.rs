//! Document repository for invoices, bills and their payments.
//!
//! Each lifecycle operation is one transaction: the document row is locked,
//! the transition is checked by `DocumentLifecycle`, the posting is built by
//! `PostingRules` and written through the journal repository, and the
//! document is updated. A lost number race restarts the whole unit.

use std::collections::HashMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};
use tally_core::accounts::Account;
use tally_core::documents::{
    DocumentError, DocumentItem, DocumentItemInput, DocumentKind, DocumentLifecycle,
    DocumentStatus, Payment, PaymentMethod, PaymentType, PricedItems, TradeDocument, VoidAction,
};
use tally_core::ledger::LedgerError;
use tally_core::posting::{PostingError, PostingRules};
use tally_core::sequence::{Period, SequenceError};
use tally_shared::config::LedgerConfig;
use tally_shared::types::{AccountId, ContactId, DocumentId, PaymentId, TenantId};
use tally_shared::{AppError, RequestContext};
use uuid::Uuid;

use super::account::{accounts_by_codes, accounts_by_ids};
use super::contact::find_contact;
use super::journal::{JournalError, JournalRepository};
use super::sequence::{
    SequenceRepository, SequenceRetry, number_conflict, number_width, with_sequence_retry,
};
use crate::entities::sea_orm_active_enums as db_enums;
use crate::entities::{payments, trade_document_items, trade_documents};
use crate::rls::RlsConnection;

/// Error types for document operations.
#[derive(Debug, thiserror::Error)]
pub enum DocumentRepoError {
    /// Lifecycle rule violated.
    #[error(transparent)]
    Document(#[from] DocumentError),

    /// Posting could not be built.
    #[error(transparent)]
    Posting(#[from] PostingError),

    /// Posting was rejected by the ledger.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// Document number could not be allocated.
    #[error(transparent)]
    Sequence(#[from] SequenceError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl DocumentRepoError {
    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Document(e) => e.error_code(),
            Self::Posting(e) => e.error_code(),
            Self::Ledger(e) => e.error_code(),
            Self::Sequence(e) => e.error_code(),
            Self::Database(_) => "DATABASE_ERROR",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn http_status_code(&self) -> u16 {
        match self {
            Self::Document(e) => e.http_status_code(),
            Self::Posting(e) => e.http_status_code(),
            Self::Ledger(e) => e.http_status_code(),
            Self::Sequence(e) => e.http_status_code(),
            Self::Database(_) => 500,
        }
    }
}

impl From<JournalError> for DocumentRepoError {
    fn from(err: JournalError) -> Self {
        match err {
            JournalError::Ledger(e) => Self::Ledger(e),
            JournalError::Sequence(e) => Self::Sequence(e),
            JournalError::Database(e) => Self::Database(e),
        }
    }
}

impl SequenceRetry for DocumentRepoError {
    fn is_sequence_conflict(&self) -> bool {
        matches!(self, Self::Sequence(err) if err.is_retryable())
    }
}

impl From<DocumentRepoError> for AppError {
    fn from(err: DocumentRepoError) -> Self {
        match err {
            DocumentRepoError::Posting(e) if e.is_configuration() => {
                Self::Configuration(e.to_string())
            }
            DocumentRepoError::Database(e) => Self::Database(e.to_string()),
            other => Self::from_status(other.http_status_code(), other.to_string()),
        }
    }
}

/// Input for creating a draft invoice or bill.
#[derive(Debug, Clone)]
pub struct CreateDocumentInput {
    /// Invoice or bill.
    pub kind: DocumentKind,
    /// Customer for invoices, vendor for bills.
    pub counterparty_id: ContactId,
    /// Document date; selects the numbering period.
    pub document_date: NaiveDate,
    /// Payment due date.
    pub due_date: NaiveDate,
    /// Line items.
    pub items: Vec<DocumentItemInput>,
    /// Counterparty's own reference.
    pub external_reference: Option<String>,
    /// Free-form notes.
    pub notes: Option<String>,
}

/// Input for recording a receipt or a payment against a document.
#[derive(Debug, Clone)]
pub struct RecordPaymentInput {
    /// Invoice (receipts) or bill (payments) being settled.
    pub document_id: DocumentId,
    /// Amount settled; rounded to 2 places.
    pub amount: Decimal,
    /// Payment date; selects the numbering period.
    pub payment_date: NaiveDate,
    /// How money moved.
    pub payment_method: PaymentMethod,
    /// Cash or bank account the money moved through.
    pub cash_account_id: AccountId,
    /// Free-form notes.
    pub notes: Option<String>,
}

/// Document repository.
#[derive(Debug, Clone)]
pub struct DocumentRepository {
    db: DatabaseConnection,
    ledger: LedgerConfig,
}

impl DocumentRepository {
    /// Creates a new document repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection, ledger: LedgerConfig) -> Self {
        Self { db, ledger }
    }

    /// Creates a draft document with priced items and a fresh number.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - An item is invalid or there are none
    /// - The due date precedes the document date
    /// - The counterparty is missing, inactive or of the wrong kind
    /// - No number could be allocated after every retry
    pub async fn create(
        &self,
        ctx: RequestContext,
        input: CreateDocumentInput,
    ) -> Result<TradeDocument, DocumentRepoError> {
        let priced = DocumentLifecycle::price_items(&input.items)?;
        DocumentLifecycle::validate_dates(input.document_date, input.due_date)?;

        let (input, priced) = (&input, &priced);
        with_sequence_retry(self.ledger.max_sequence_attempts, move || async move {
            self.create_once(ctx, input, priced).await
        })
        .await
    }

    async fn create_once(
        &self,
        ctx: RequestContext,
        input: &CreateDocumentInput,
        priced: &PricedItems,
    ) -> Result<TradeDocument, DocumentRepoError> {
        let tenant_id = ctx.tenant_id;
        let period = Period::from_date(input.document_date)?;
        let rls = RlsConnection::new(&self.db, tenant_id).await?;
        let txn = rls.transaction();

        let counterparty = find_contact(txn, tenant_id, input.counterparty_id)
            .await?
            .ok_or(DocumentError::CounterpartyNotFound(input.counterparty_id))?;
        DocumentLifecycle::ensure_counterparty(input.kind, &counterparty)?;

        let number = SequenceRepository::allocate::<_, DocumentRepoError>(
            txn,
            tenant_id,
            input.kind.series(),
            period,
        )
        .await?;

        let document_id = Uuid::now_v7();
        let now = chrono::Utc::now().into();
        let totals = priced.totals;
        let model = trade_documents::ActiveModel {
            id: Set(document_id),
            tenant_id: Set(tenant_id.into_inner()),
            kind: Set(input.kind.into()),
            document_number: Set(number.to_string()),
            document_date: Set(input.document_date),
            due_date: Set(input.due_date),
            contact_id: Set(counterparty.id.into_inner()),
            external_reference: Set(input.external_reference.clone()),
            notes: Set(input.notes.clone()),
            subtotal: Set(totals.subtotal),
            vat_amount: Set(totals.vat_amount),
            total_amount: Set(totals.total_amount),
            paid_amount: Set(Decimal::ZERO),
            status: Set(db_enums::DocumentStatus::Draft),
            journal_entry_id: Set(None),
            created_by: Set(ctx.user_id.into_inner()),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(txn)
        .await
        .map_err(|err| number_conflict::<DocumentRepoError>(err, &number))?;

        let items = priced.items.iter().map(|item| trade_document_items::ActiveModel {
            id: Set(Uuid::now_v7()),
            tenant_id: Set(tenant_id.into_inner()),
            document_id: Set(document_id),
            line_number: Set(item.line_number),
            description: Set(item.description.clone()),
            quantity: Set(item.quantity),
            unit_price: Set(item.unit_price),
            amount: Set(item.amount),
        });
        trade_document_items::Entity::insert_many(items).exec(txn).await?;

        rls.commit().await?;

        tracing::info!(
            %tenant_id,
            kind = %input.kind,
            document_number = %model.document_number,
            total = %totals.total_amount,
            "Created document"
        );
        Ok(to_document(model, priced.items.clone()))
    }

    /// Approves a draft and posts its sales or purchase entry.
    ///
    /// # Errors
    ///
    /// Returns `DocumentNotFound`, `InvalidTransition` unless the document
    /// is a draft, `MissingSystemAccount`, or any posting error.
    pub async fn approve(
        &self,
        ctx: RequestContext,
        document_id: DocumentId,
    ) -> Result<TradeDocument, DocumentRepoError> {
        with_sequence_retry(self.ledger.max_sequence_attempts, move || async move {
            self.approve_once(ctx, document_id).await
        })
        .await
    }

    async fn approve_once(
        &self,
        ctx: RequestContext,
        document_id: DocumentId,
    ) -> Result<TradeDocument, DocumentRepoError> {
        let tenant_id = ctx.tenant_id;
        let rls = RlsConnection::new(&self.db, tenant_id).await?;
        let txn = rls.transaction();

        let document = load_document_in(txn, tenant_id, document_id, true).await?;
        let status = DocumentLifecycle::approve(document.status)?;

        let counterparty = find_contact(txn, tenant_id, document.counterparty_id)
            .await?
            .ok_or(DocumentError::CounterpartyNotFound(document.counterparty_id))?;

        let codes = &self.ledger.system_accounts;
        let accounts = accounts_by_codes(txn, tenant_id, &PostingRules::system_codes(codes)).await?;
        let resolve = |code: &str| accounts.get(code).cloned();
        let request = match document.kind {
            DocumentKind::Invoice => {
                PostingRules::invoice_approved(&document, &counterparty.name, codes, resolve)?
            }
            DocumentKind::Bill => {
                PostingRules::bill_approved(&document, &counterparty.name, codes, resolve)?
            }
        };
        let entry = JournalRepository::post_in(txn, ctx, &request).await?;

        let model = trade_documents::ActiveModel {
            id: Set(document.id.into_inner()),
            status: Set(status.into()),
            journal_entry_id: Set(Some(entry.id.into_inner())),
            updated_at: Set(chrono::Utc::now().into()),
            ..Default::default()
        }
        .update(txn)
        .await?;

        rls.commit().await?;

        tracing::info!(
            %tenant_id,
            document_number = %document.document_number,
            entry_number = %entry.entry_number,
            "Approved document"
        );
        Ok(to_document(model, document.items))
    }

    /// Records money received against an invoice.
    ///
    /// # Errors
    ///
    /// See [`Self::record_payment`].
    pub async fn record_receipt(
        &self,
        ctx: RequestContext,
        input: RecordPaymentInput,
    ) -> Result<Payment, DocumentRepoError> {
        self.settle(ctx, PaymentType::Receive, input).await
    }

    /// Records money paid against a bill.
    ///
    /// The payment row, its journal entry and the document's paid amount
    /// and status are written together.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The document is missing or of the other kind
    /// - Its status does not accept payments
    /// - The amount is non-positive or exceeds the outstanding amount
    /// - The cash account is not an active postable asset
    /// - A system account is missing
    pub async fn record_payment(
        &self,
        ctx: RequestContext,
        input: RecordPaymentInput,
    ) -> Result<Payment, DocumentRepoError> {
        self.settle(ctx, PaymentType::Pay, input).await
    }

    async fn settle(
        &self,
        ctx: RequestContext,
        payment_type: PaymentType,
        input: RecordPaymentInput,
    ) -> Result<Payment, DocumentRepoError> {
        let input = &input;
        with_sequence_retry(self.ledger.max_sequence_attempts, move || async move {
            self.settle_once(ctx, payment_type, input).await
        })
        .await
    }

    async fn settle_once(
        &self,
        ctx: RequestContext,
        payment_type: PaymentType,
        input: &RecordPaymentInput,
    ) -> Result<Payment, DocumentRepoError> {
        let tenant_id = ctx.tenant_id;
        let period = Period::from_date(input.payment_date)?;
        let rls = RlsConnection::new(&self.db, tenant_id).await?;
        let txn = rls.transaction();

        let document = load_document_in(txn, tenant_id, input.document_id, true).await?;
        let expected = payment_type.document_kind();
        if document.kind != expected {
            return Err(PostingError::DocumentKindMismatch { expected }.into());
        }

        let application = DocumentLifecycle::apply_payment(
            document.status,
            document.total_amount,
            document.paid_amount,
            input.amount,
        )?;
        let amount = application.new_paid - document.paid_amount;

        let cash_account: Account = accounts_by_ids(txn, tenant_id, &[input.cash_account_id])
            .await?
            .remove(&input.cash_account_id)
            .ok_or(PostingError::InvalidCashAccount(input.cash_account_id))?;

        let number = SequenceRepository::allocate::<_, DocumentRepoError>(
            txn,
            tenant_id,
            document.kind.payment_series(),
            period,
        )
        .await?;
        let payment_number = number.to_string();

        let codes = &self.ledger.system_accounts;
        let accounts = accounts_by_codes(txn, tenant_id, &PostingRules::system_codes(codes)).await?;
        let resolve = |code: &str| accounts.get(code).cloned();
        let request = match payment_type {
            PaymentType::Receive => PostingRules::receipt_recorded(
                &document,
                &payment_number,
                input.payment_date,
                amount,
                &cash_account,
                codes,
                resolve,
            )?,
            PaymentType::Pay => PostingRules::payment_recorded(
                &document,
                &payment_number,
                input.payment_date,
                amount,
                &cash_account,
                codes,
                resolve,
            )?,
        };
        let entry = JournalRepository::post_in(txn, ctx, &request).await?;

        let payment = payments::ActiveModel {
            id: Set(PaymentId::new().into_inner()),
            tenant_id: Set(tenant_id.into_inner()),
            document_number: Set(payment_number),
            payment_date: Set(input.payment_date),
            payment_type: Set(payment_type.into()),
            payment_method: Set(input.payment_method.into()),
            amount: Set(amount),
            document_id: Set(document.id.into_inner()),
            cash_account_id: Set(cash_account.id.into_inner()),
            journal_entry_id: Set(entry.id.into_inner()),
            notes: Set(input.notes.clone()),
            created_by: Set(ctx.user_id.into_inner()),
            created_at: Set(chrono::Utc::now().into()),
        }
        .insert(txn)
        .await
        .map_err(|err| number_conflict::<DocumentRepoError>(err, &number))?;

        trade_documents::ActiveModel {
            id: Set(document.id.into_inner()),
            paid_amount: Set(application.new_paid),
            status: Set(application.new_status.into()),
            updated_at: Set(chrono::Utc::now().into()),
            ..Default::default()
        }
        .update(txn)
        .await?;

        rls.commit().await?;

        tracing::info!(
            %tenant_id,
            payment_number = %payment.document_number,
            document_number = %document.document_number,
            %amount,
            status = %application.new_status,
            "Recorded payment"
        );
        Ok(payment.into())
    }

    /// Voids a document.
    ///
    /// Drafts are voided without ledger effect. Approved or overdue
    /// documents with nothing paid get a reversal of their approval entry.
    ///
    /// # Errors
    ///
    /// Returns `DocumentNotFound`, `InvalidTransition` for paid, partly paid
    /// or voided documents, or any posting error of the reversal.
    pub async fn void(
        &self,
        ctx: RequestContext,
        document_id: DocumentId,
        void_date: NaiveDate,
        reason: Option<&str>,
    ) -> Result<TradeDocument, DocumentRepoError> {
        with_sequence_retry(self.ledger.max_sequence_attempts, move || async move {
            self.void_once(ctx, document_id, void_date, reason).await
        })
        .await
    }

    async fn void_once(
        &self,
        ctx: RequestContext,
        document_id: DocumentId,
        void_date: NaiveDate,
        reason: Option<&str>,
    ) -> Result<TradeDocument, DocumentRepoError> {
        let tenant_id = ctx.tenant_id;
        let rls = RlsConnection::new(&self.db, tenant_id).await?;
        let txn = rls.transaction();

        let document = load_document_in(txn, tenant_id, document_id, true).await?;
        let action = DocumentLifecycle::void(document.status, document.paid_amount)?;

        if action == VoidAction::ReverseEntry {
            let entry_id = document.journal_entry_id.ok_or_else(|| {
                DbErr::RecordNotFound(format!(
                    "approval entry of {}",
                    document.document_number
                ))
            })?;
            let reason = reason.map_or_else(
                || format!("Void {}", document.document_number),
                |r| format!("Void {}: {r}", document.document_number),
            );
            JournalRepository::reverse_in(txn, ctx, entry_id, void_date, Some(&reason)).await?;
        }

        let model = trade_documents::ActiveModel {
            id: Set(document.id.into_inner()),
            status: Set(db_enums::DocumentStatus::Voided),
            updated_at: Set(chrono::Utc::now().into()),
            ..Default::default()
        }
        .update(txn)
        .await?;

        rls.commit().await?;

        tracing::info!(
            %tenant_id,
            document_number = %document.document_number,
            reversed = action == VoidAction::ReverseEntry,
            "Voided document"
        );
        Ok(to_document(model, document.items))
    }

    /// Flags approved and partly paid documents due before `as_of` as
    /// overdue. Returns how many documents changed.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub async fn mark_overdue(
        &self,
        tenant_id: TenantId,
        as_of: NaiveDate,
    ) -> Result<u64, DocumentRepoError> {
        let rls = RlsConnection::new(&self.db, tenant_id).await?;
        let txn = rls.transaction();

        let candidates = trade_documents::Entity::find()
            .filter(trade_documents::Column::TenantId.eq(tenant_id.into_inner()))
            .filter(trade_documents::Column::Status.is_in([
                db_enums::DocumentStatus::Approved,
                db_enums::DocumentStatus::Partial,
            ]))
            .filter(trade_documents::Column::DueDate.lt(as_of))
            .lock_exclusive()
            .all(txn)
            .await?;

        let now = chrono::Utc::now().into();
        let mut updated = 0;
        for model in candidates {
            if !DocumentLifecycle::is_overdue(model.status.into(), model.due_date, as_of) {
                continue;
            }
            trade_documents::ActiveModel {
                id: Set(model.id),
                status: Set(db_enums::DocumentStatus::Overdue),
                updated_at: Set(now),
                ..Default::default()
            }
            .update(txn)
            .await?;
            updated += 1;
        }

        rls.commit().await?;

        if updated > 0 {
            tracing::info!(%tenant_id, %as_of, count = updated, "Marked documents overdue");
        }
        Ok(updated)
    }

    /// Gets a document with its items.
    ///
    /// # Errors
    ///
    /// Returns `DocumentNotFound` if the document does not exist in the tenant.
    pub async fn get(
        &self,
        tenant_id: TenantId,
        document_id: DocumentId,
    ) -> Result<TradeDocument, DocumentRepoError> {
        let rls = RlsConnection::new(&self.db, tenant_id).await?;
        let document = load_document_in(rls.transaction(), tenant_id, document_id, false).await?;
        rls.commit().await?;
        Ok(document)
    }

    /// Lists documents of one kind, newest number first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(
        &self,
        tenant_id: TenantId,
        kind: DocumentKind,
    ) -> Result<Vec<TradeDocument>, DocumentRepoError> {
        let rls = RlsConnection::new(&self.db, tenant_id).await?;
        let txn = rls.transaction();

        let models = trade_documents::Entity::find()
            .filter(trade_documents::Column::TenantId.eq(tenant_id.into_inner()))
            .filter(trade_documents::Column::Kind.eq(db_enums::DocumentKind::from(kind)))
            .order_by_desc(number_width(trade_documents::Column::DocumentNumber))
            .order_by_desc(trade_documents::Column::DocumentNumber)
            .all(txn)
            .await?;
        let ids: Vec<Uuid> = models.iter().map(|m| m.id).collect();
        let mut items = items_by_document(txn, ids).await?;
        rls.commit().await?;

        Ok(models
            .into_iter()
            .map(|model| {
                let lines = items.remove(&model.id).unwrap_or_default();
                to_document(model, lines)
            })
            .collect())
    }

    /// Lists payments, optionally of one direction, newest number first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_payments(
        &self,
        tenant_id: TenantId,
        payment_type: Option<PaymentType>,
    ) -> Result<Vec<Payment>, DocumentRepoError> {
        let rls = RlsConnection::new(&self.db, tenant_id).await?;

        let mut query = payments::Entity::find()
            .filter(payments::Column::TenantId.eq(tenant_id.into_inner()));
        if let Some(payment_type) = payment_type {
            query = query
                .filter(payments::Column::PaymentType.eq(db_enums::PaymentType::from(payment_type)));
        }
        let models = query
            .order_by_desc(payments::Column::PaymentDate)
            .order_by_desc(number_width(payments::Column::DocumentNumber))
            .order_by_desc(payments::Column::DocumentNumber)
            .all(rls.transaction())
            .await?;

        rls.commit().await?;
        Ok(models.into_iter().map(Into::into).collect())
    }
}

// ============================================================================
// Helper functions
// ============================================================================

/// Loads a document and its items, optionally locking the document row.
async fn load_document_in<C: ConnectionTrait>(
    conn: &C,
    tenant_id: TenantId,
    document_id: DocumentId,
    for_update: bool,
) -> Result<TradeDocument, DocumentRepoError> {
    let mut query = trade_documents::Entity::find_by_id(document_id.into_inner())
        .filter(trade_documents::Column::TenantId.eq(tenant_id.into_inner()));
    if for_update {
        query = query.lock_exclusive();
    }
    let model = query
        .one(conn)
        .await?
        .ok_or(DocumentError::DocumentNotFound(document_id))?;

    let items = trade_document_items::Entity::find()
        .filter(trade_document_items::Column::DocumentId.eq(model.id))
        .order_by_asc(trade_document_items::Column::LineNumber)
        .all(conn)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();

    Ok(to_document(model, items))
}

async fn items_by_document<C: ConnectionTrait>(
    conn: &C,
    ids: Vec<Uuid>,
) -> Result<HashMap<Uuid, Vec<DocumentItem>>, DbErr> {
    let mut grouped: HashMap<Uuid, Vec<DocumentItem>> = HashMap::new();
    if ids.is_empty() {
        return Ok(grouped);
    }
    let items = trade_document_items::Entity::find()
        .filter(trade_document_items::Column::DocumentId.is_in(ids))
        .order_by_asc(trade_document_items::Column::DocumentId)
        .order_by_asc(trade_document_items::Column::LineNumber)
        .all(conn)
        .await?;
    for item in items {
        grouped.entry(item.document_id).or_default().push(item.into());
    }
    Ok(grouped)
}

fn to_document(model: trade_documents::Model, items: Vec<DocumentItem>) -> TradeDocument {
    TradeDocument {
        id: model.id.into(),
        tenant_id: model.tenant_id.into(),
        kind: model.kind.into(),
        document_number: model.document_number,
        document_date: model.document_date,
        due_date: model.due_date,
        counterparty_id: model.contact_id.into(),
        external_reference: model.external_reference,
        notes: model.notes,
        subtotal: model.subtotal,
        vat_amount: model.vat_amount,
        total_amount: model.total_amount,
        paid_amount: model.paid_amount,
        status: DocumentStatus::from(model.status),
        journal_entry_id: model.journal_entry_id.map(Into::into),
        created_by: model.created_by.into(),
        items,
    }
}
