//! `SeaORM` Entity for payments table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::{PaymentMethod, PaymentType};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "payments")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub document_number: String,
    pub payment_date: Date,
    pub payment_type: PaymentType,
    pub payment_method: PaymentMethod,
    #[sea_orm(column_type = "Decimal(Some((18, 2)))")]
    pub amount: Decimal,
    pub document_id: Uuid,
    pub cash_account_id: Uuid,
    pub journal_entry_id: Uuid,
    #[sea_orm(column_type = "Text", nullable)]
    pub notes: Option<String>,
    pub created_by: Uuid,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::trade_documents::Entity",
        from = "Column::DocumentId",
        to = "super::trade_documents::Column::Id"
    )]
    TradeDocuments,
}

impl Related<super::trade_documents::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TradeDocuments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for tally_core::documents::Payment {
    fn from(model: Model) -> Self {
        Self {
            id: model.id.into(),
            tenant_id: model.tenant_id.into(),
            document_number: model.document_number,
            payment_date: model.payment_date,
            payment_type: model.payment_type.into(),
            payment_method: model.payment_method.into(),
            amount: model.amount,
            document_id: model.document_id.into(),
            cash_account_id: model.cash_account_id.into(),
            journal_entry_id: model.journal_entry_id.into(),
            notes: model.notes,
            created_by: model.created_by.into(),
        }
    }
}
