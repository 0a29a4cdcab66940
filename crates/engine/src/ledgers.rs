//! Ledger entries.
//!
//! A `Ledger` is the aggregate root of a booking: it owns one contact and one
//! category reference and shares labels and files with other entries through
//! the `labels_to_ledger` and `files_to_ledger` join tables.

use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{Category, Contact, File, Label};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Ledger {
    pub id: i32,
    pub account_id: i32,
    pub added_by_id: i32,
    pub contact_id: i32,
    pub category_id: i32,
    pub date: NaiveDate,
    pub amount: f64,
    pub note: String,
    /// Populated only when the `Contact` preload was requested.
    pub contact: Option<Contact>,
    /// Populated only when the `Category` preload was requested.
    pub category: Option<Category>,
    pub labels: Vec<Label>,
    pub files: Vec<File>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "ledgers")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub account_id: i32,
    pub added_by_id: i32,
    pub contact_id: i32,
    pub category_id: i32,
    pub date: Date,
    #[sea_orm(column_type = "Double")]
    pub amount: f64,
    #[sea_orm(column_type = "Text")]
    pub note: String,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::contacts::Entity",
        from = "Column::ContactId",
        to = "super::contacts::Column::Id"
    )]
    Contact,
    #[sea_orm(
        belongs_to = "super::categories::Entity",
        from = "Column::CategoryId",
        to = "super::categories::Column::Id"
    )]
    Category,
    #[sea_orm(has_many = "super::labels_to_ledger::Entity")]
    LabelsToLedger,
    #[sea_orm(has_many = "super::files_to_ledger::Entity")]
    FilesToLedger,
}

impl Related<super::contacts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Contact.def()
    }
}

impl Related<super::categories::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Category.def()
    }
}

impl Related<super::labels_to_ledger::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::LabelsToLedger.def()
    }
}

impl Related<super::files_to_ledger::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::FilesToLedger.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Ledger {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            account_id: model.account_id,
            added_by_id: model.added_by_id,
            contact_id: model.contact_id,
            category_id: model.category_id,
            date: model.date,
            amount: model.amount,
            note: model.note,
            contact: None,
            category: None,
            labels: Vec::new(),
            files: Vec::new(),
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}
