//! Contacts: the customers and vendors a ledger entry is booked against.

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Legacy contact type written on every contact touched by a ledger write.
pub const CONTACT_KIND_BOTH: &str = "Both";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub id: i32,
    pub account_id: i32,
    pub name: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub kind: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip: String,
    pub country: String,
    pub phone: String,
    pub website: String,
    pub avatar: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "contacts")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub account_id: i32,
    pub name: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub kind: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip: String,
    pub country: String,
    pub phone: String,
    pub website: String,
    pub avatar: String,
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

impl From<Model> for Contact {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            account_id: model.account_id,
            name: model.name,
            first_name: model.first_name,
            last_name: model.last_name,
            email: model.email,
            kind: model.kind,
            address: model.address,
            city: model.city,
            state: model.state,
            zip: model.zip,
            country: model.country,
            phone: model.phone,
            website: model.website,
            avatar: model.avatar,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}
