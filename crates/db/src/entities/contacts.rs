//! `SeaORM` Entity for contacts table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::ContactKind;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "contacts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub kind: ContactKind,
    pub code: String,
    pub name: String,
    pub tax_id: Option<String>,
    pub is_active: bool,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::trade_documents::Entity")]
    TradeDocuments,
}

impl Related<super::trade_documents::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TradeDocuments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for tally_core::documents::Counterparty {
    fn from(model: Model) -> Self {
        Self {
            id: model.id.into(),
            tenant_id: model.tenant_id.into(),
            kind: model.kind.into(),
            code: model.code,
            name: model.name,
            tax_id: model.tax_id,
            is_active: model.is_active,
        }
    }
}
