//! Category registry per account.
//!
//! `kind` keeps the legacy type code: `"1"` for expense, `"2"` for income.

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

pub const CATEGORY_KIND_EXPENSE: &str = "1";
pub const CATEGORY_KIND_INCOME: &str = "2";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: i32,
    pub account_id: i32,
    pub name: String,
    pub kind: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "categories")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub account_id: i32,
    pub name: String,
    pub kind: String,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::ledgers::Entity")]
    Ledgers,
}

impl Related<super::ledgers::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Ledgers.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Category {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            account_id: model.account_id,
            name: model.name,
            kind: model.kind,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}
