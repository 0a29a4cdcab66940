//! Ledger ↔ label association.
//!
//! `account_id`, `created_at` and `updated_at` are denormalized copies read by
//! consumers that do not join through `ledgers`; they must always match the
//! owning ledger.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "labels_to_ledger")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub account_id: i32,
    pub label_id: i32,
    pub ledger_id: i32,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::labels::Entity",
        from = "Column::LabelId",
        to = "super::labels::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Label,
    #[sea_orm(
        belongs_to = "super::ledgers::Entity",
        from = "Column::LedgerId",
        to = "super::ledgers::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Ledger,
}

impl Related<super::labels::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Label.def()
    }
}

impl Related<super::ledgers::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Ledger.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
