//! Uploaded documents that can be attached to ledger entries.
//!
//! Upload and storage live outside the engine; only the metadata row is
//! managed here.

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct File {
    pub id: i32,
    pub account_id: i32,
    pub name: String,
    pub path: String,
    pub mime_type: String,
    pub size: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "files")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub account_id: i32,
    pub name: String,
    pub path: String,
    pub mime_type: String,
    pub size: i64,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::files_to_ledger::Entity")]
    FilesToLedger,
}

impl Related<super::files_to_ledger::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::FilesToLedger.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for File {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            account_id: model.account_id,
            name: model.name,
            path: model.path,
            mime_type: model.mime_type,
            size: model.size,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}
