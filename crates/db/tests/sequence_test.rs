//! Integration tests for document number allocation.

mod common;

use common::{TestTenant, date};
use rust_decimal_macros::dec;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use tally_core::documents::DocumentKind;
use tally_core::sequence::{Period, Series};
use tally_db::entities::document_sequences;
use tally_db::repositories::{DocumentRepository, SequenceRepository};
use tally_shared::config::LedgerConfig;

#[tokio::test]
async fn test_next_starts_at_one_per_period() {
    let Some(t) = TestTenant::setup().await else { return };
    let sequences = SequenceRepository::new(t.db.clone());
    let january = Period::new(2024, 1).unwrap();
    let february = Period::new(2024, 2).unwrap();

    let first = sequences.next(t.ctx.tenant_id, Series::Receipt, january).await.unwrap();
    let second = sequences.next(t.ctx.tenant_id, Series::Receipt, january).await.unwrap();
    let other = sequences.next(t.ctx.tenant_id, Series::Receipt, february).await.unwrap();

    assert_eq!(first.to_string(), "RCT-202401-0001");
    assert_eq!(second.to_string(), "RCT-202401-0002");
    assert_eq!(other.to_string(), "RCT-202402-0001");
}

#[tokio::test]
async fn test_counter_is_floored_at_existing_numbers() {
    let Some(t) = TestTenant::setup().await else { return };
    let documents = DocumentRepository::new(t.db.clone(), LedgerConfig::default());
    for _ in 0..3 {
        documents
            .create(t.ctx, t.document_input(DocumentKind::Bill, date(2024, 7, 1), dec!(10)))
            .await
            .unwrap();
    }

    // Lose the counter row; allocation must continue after BILL-202407-0003.
    document_sequences::Entity::delete_many()
        .filter(document_sequences::Column::TenantId.eq(t.ctx.tenant_id.into_inner()))
        .filter(document_sequences::Column::Series.eq(Series::Bill.prefix()))
        .exec(&t.db)
        .await
        .unwrap();

    let bill = documents
        .create(t.ctx, t.document_input(DocumentKind::Bill, date(2024, 7, 2), dec!(10)))
        .await
        .unwrap();
    assert_eq!(bill.document_number, "BILL-202407-0004");
}
