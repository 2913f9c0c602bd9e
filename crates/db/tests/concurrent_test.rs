//! Concurrency tests for number allocation and document locking.
//!
//! These tests verify that:
//! - Concurrent creations and approvals in one tenant and period receive
//!   distinct, gap-free numbers
//! - Concurrent payments against one document never overpay it

#![allow(clippy::cast_possible_truncation)]

mod common;

use std::collections::BTreeSet;
use std::sync::Arc;

use common::{TestTenant, date};
use futures::future::join_all;
use rust_decimal_macros::dec;
use tally_core::documents::{DocumentError, DocumentKind, DocumentStatus, PaymentMethod};
use tally_db::repositories::{
    DocumentRepoError, DocumentRepository, JournalRepository, RecordPaymentInput,
};
use tally_shared::config::LedgerConfig;
use tally_shared::types::PageRequest;
use tokio::sync::Barrier;

const NUM_DOCUMENTS: usize = 20;
const PAYERS: usize = 3;

fn sequences(numbers: impl IntoIterator<Item = String>) -> BTreeSet<u32> {
    numbers
        .into_iter()
        .map(|n| n.rsplit('-').next().unwrap().parse().unwrap())
        .collect()
}

#[tokio::test]
async fn test_concurrent_creations_get_distinct_gap_free_numbers() {
    let Some(t) = TestTenant::setup().await else { return };
    let documents = Arc::new(DocumentRepository::new(t.db.clone(), LedgerConfig::default()));
    let barrier = Arc::new(Barrier::new(NUM_DOCUMENTS));

    let handles: Vec<_> = (0..NUM_DOCUMENTS)
        .map(|_| {
            let documents = Arc::clone(&documents);
            let barrier = Arc::clone(&barrier);
            let input = t.document_input(DocumentKind::Invoice, date(2024, 4, 1), dec!(10));
            let ctx = t.ctx;
            tokio::spawn(async move {
                barrier.wait().await;
                documents.create(ctx, input).await
            })
        })
        .collect();

    let numbers: Vec<String> = join_all(handles)
        .await
        .into_iter()
        .map(|joined| joined.unwrap().unwrap().document_number)
        .collect();

    assert_eq!(numbers.len(), NUM_DOCUMENTS);
    let expected: BTreeSet<u32> = (1..=NUM_DOCUMENTS as u32).collect();
    assert_eq!(sequences(numbers), expected);
}

#[tokio::test]
async fn test_concurrent_approvals_post_distinct_gap_free_entries() {
    let Some(t) = TestTenant::setup().await else { return };
    let documents = Arc::new(DocumentRepository::new(t.db.clone(), LedgerConfig::default()));

    let mut ids = Vec::with_capacity(NUM_DOCUMENTS);
    for _ in 0..NUM_DOCUMENTS {
        let invoice = documents
            .create(t.ctx, t.document_input(DocumentKind::Invoice, date(2024, 5, 2), dec!(100)))
            .await
            .unwrap();
        ids.push(invoice.id);
    }

    let barrier = Arc::new(Barrier::new(NUM_DOCUMENTS));
    let handles: Vec<_> = ids
        .into_iter()
        .map(|id| {
            let documents = Arc::clone(&documents);
            let barrier = Arc::clone(&barrier);
            let ctx = t.ctx;
            tokio::spawn(async move {
                barrier.wait().await;
                documents.approve(ctx, id).await
            })
        })
        .collect();

    for joined in join_all(handles).await {
        let approved = joined.unwrap().unwrap();
        assert_eq!(approved.status, DocumentStatus::Approved);
    }

    let entries = JournalRepository::new(t.db.clone())
        .list(
            t.ctx.tenant_id,
            &PageRequest {
                page: 1,
                per_page: 100,
            },
        )
        .await
        .unwrap();
    assert_eq!(entries.meta.total, NUM_DOCUMENTS as u64);
    assert!(entries.data.iter().all(|e| e.total_debit == e.total_credit));

    let expected: BTreeSet<u32> = (1..=NUM_DOCUMENTS as u32).collect();
    assert_eq!(
        sequences(entries.data.into_iter().map(|e| e.entry_number)),
        expected
    );
}

#[tokio::test]
async fn test_concurrent_payments_never_overpay() {
    let Some(t) = TestTenant::setup().await else { return };
    let documents = Arc::new(DocumentRepository::new(t.db.clone(), LedgerConfig::default()));
    let bank = t.account("11120").await;

    let invoice = documents
        .create(t.ctx, t.document_input(DocumentKind::Invoice, date(2024, 6, 1), dec!(1000)))
        .await
        .unwrap();
    documents.approve(t.ctx, invoice.id).await.unwrap();

    let barrier = Arc::new(Barrier::new(PAYERS));
    let handles: Vec<_> = (0..PAYERS)
        .map(|_| {
            let documents = Arc::clone(&documents);
            let barrier = Arc::clone(&barrier);
            let ctx = t.ctx;
            let input = RecordPaymentInput {
                document_id: invoice.id,
                amount: dec!(500),
                payment_date: date(2024, 6, 10),
                payment_method: PaymentMethod::Cash,
                cash_account_id: bank.id,
                notes: None,
            };
            tokio::spawn(async move {
                barrier.wait().await;
                documents.record_receipt(ctx, input).await
            })
        })
        .collect();

    let mut succeeded = 0;
    for joined in join_all(handles).await {
        match joined.unwrap() {
            Ok(_) => succeeded += 1,
            Err(DocumentRepoError::Document(DocumentError::Overpayment { .. })) => {}
            Err(other) => panic!("unexpected error: {other}"),
        }
    }
    assert_eq!(succeeded, 2);

    let settled = documents.get(t.ctx.tenant_id, invoice.id).await.unwrap();
    assert_eq!(settled.paid_amount, dec!(1000));
    assert_eq!(settled.status, DocumentStatus::Partial);
}
