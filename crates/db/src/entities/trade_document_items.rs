//! `SeaORM` Entity for trade_document_items table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "trade_document_items")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub document_id: Uuid,
    pub line_number: i32,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    #[sea_orm(column_type = "Decimal(Some((18, 4)))")]
    pub quantity: Decimal,
    #[sea_orm(column_type = "Decimal(Some((18, 4)))")]
    pub unit_price: Decimal,
    #[sea_orm(column_type = "Decimal(Some((18, 2)))")]
    pub amount: Decimal,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::trade_documents::Entity",
        from = "Column::DocumentId",
        to = "super::trade_documents::Column::Id",
        on_delete = "Cascade"
    )]
    TradeDocuments,
}

impl Related<super::trade_documents::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TradeDocuments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for tally_core::documents::DocumentItem {
    fn from(model: Model) -> Self {
        Self {
            line_number: model.line_number,
            description: model.description,
            quantity: model.quantity,
            unit_price: model.unit_price,
            amount: model.amount,
        }
    }
}
