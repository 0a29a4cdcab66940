use chrono::Utc;
use sea_orm::{
    ActiveValue, Condition, DatabaseTransaction, QueryFilter, QueryOrder, prelude::*,
    sea_query::OnConflict,
};

use crate::{
    Contact, ContactDraft, EngineError, ResultEngine, contacts,
    query::{self, KeyPredicate, Page, QueryParams},
};

use super::{Engine, ListQuery};

const CONTACT_ORDER_COLS: [&str; 2] = ["id", "name"];
const CONTACT_SEARCH_COLS: [&str; 3] = ["name", "first_name", "last_name"];

impl Engine {
    /// Lists the contacts of an account, searchable by company or person name.
    pub async fn list_contacts(
        &self,
        account_id: i32,
        list: &ListQuery,
    ) -> ResultEngine<Page<Contact>> {
        let params = QueryParams::new()
            .limit(list.limit())
            .page(list.page())
            .order(list.order_or("name"))
            .sort(list.sort_or("ASC"))
            .allowed_order_cols(CONTACT_ORDER_COLS)
            .search(CONTACT_SEARCH_COLS, list.search.trim())
            .filter(KeyPredicate::eq("account_id", account_id));

        let page = query::find_with_meta::<contacts::Entity, _>(&self.database, &params).await?;
        Ok(page.map(Contact::from))
    }

    /// Resolves the contact of a ledger write.
    ///
    /// A draft with an id overwrites the identifying fields of that stored
    /// contact. A draft without one is matched by company name or by first and
    /// last name and created when nothing matches.
    pub(super) async fn resolve_contact(
        &self,
        db_tx: &DatabaseTransaction,
        draft: &ContactDraft,
    ) -> ResultEngine<contacts::Model> {
        match draft.id {
            Some(id) => Self::merge_contact(db_tx, id, draft).await,
            None => Self::find_or_create_contact(db_tx, draft).await,
        }
    }

    async fn merge_contact(
        db_tx: &DatabaseTransaction,
        id: i32,
        draft: &ContactDraft,
    ) -> ResultEngine<contacts::Model> {
        let model = contacts::Entity::find_by_id(id)
            .filter(contacts::Column::AccountId.eq(draft.account_id))
            .one(db_tx)
            .await?
            .ok_or_else(|| EngineError::NotFound("Contact not found.".to_string()))?;

        let mut active: contacts::ActiveModel = model.into();
        active.kind = ActiveValue::Set(draft.kind.clone());
        active.name = ActiveValue::Set(draft.name.clone());
        active.first_name = ActiveValue::Set(draft.first_name.clone());
        active.last_name = ActiveValue::Set(draft.last_name.clone());
        active.email = ActiveValue::Set(draft.email.clone());
        active.updated_at = ActiveValue::Set(Utc::now());

        Ok(active.update(db_tx).await?)
    }

    async fn find_or_create_contact(
        db_tx: &DatabaseTransaction,
        draft: &ContactDraft,
    ) -> ResultEngine<contacts::Model> {
        if let Some(model) = Self::match_contact(db_tx, draft).await? {
            return Ok(model);
        }

        let now = Utc::now();
        let active = contacts::ActiveModel {
            account_id: ActiveValue::Set(draft.account_id),
            name: ActiveValue::Set(draft.name.clone()),
            first_name: ActiveValue::Set(draft.first_name.clone()),
            last_name: ActiveValue::Set(draft.last_name.clone()),
            email: ActiveValue::Set(draft.email.clone()),
            kind: ActiveValue::Set(draft.kind.clone()),
            created_at: ActiveValue::Set(now),
            updated_at: ActiveValue::Set(now),
            ..Default::default()
        };

        // A concurrent writer may have inserted the same natural key since the
        // lookup; the unique index turns that into a no-op and the re-select
        // below picks up the winner.
        contacts::Entity::insert(active)
            .on_conflict(
                OnConflict::columns([
                    contacts::Column::AccountId,
                    contacts::Column::Name,
                    contacts::Column::FirstName,
                    contacts::Column::LastName,
                ])
                .do_nothing()
                .to_owned(),
            )
            .exec_without_returning(db_tx)
            .await?;

        contacts::Entity::find()
            .filter(contacts::Column::AccountId.eq(draft.account_id))
            .filter(contacts::Column::Name.eq(draft.name.as_str()))
            .filter(contacts::Column::FirstName.eq(draft.first_name.as_str()))
            .filter(contacts::Column::LastName.eq(draft.last_name.as_str()))
            .one(db_tx)
            .await?
            .ok_or_else(|| EngineError::NotFound("Contact not found.".to_string()))
    }

    async fn match_contact(
        db_tx: &DatabaseTransaction,
        draft: &ContactDraft,
    ) -> ResultEngine<Option<contacts::Model>> {
        let mut matches = Condition::any();
        let mut has_key = false;

        if !draft.name.is_empty() {
            matches = matches.add(contacts::Column::Name.eq(draft.name.as_str()));
            has_key = true;
        }
        if !draft.first_name.is_empty() || !draft.last_name.is_empty() {
            matches = matches.add(
                Condition::all()
                    .add(contacts::Column::FirstName.eq(draft.first_name.as_str()))
                    .add(contacts::Column::LastName.eq(draft.last_name.as_str())),
            );
            has_key = true;
        }
        if !has_key {
            return Ok(None);
        }

        Ok(contacts::Entity::find()
            .filter(contacts::Column::AccountId.eq(draft.account_id))
            .filter(matches)
            .order_by_asc(contacts::Column::Id)
            .one(db_tx)
            .await?)
    }
}
