use std::collections::HashSet;

use chrono::Utc;
use sea_orm::{
    ActiveValue, DatabaseTransaction, QueryFilter, TransactionTrait, prelude::*,
    sea_query::{Expr, Func, OnConflict},
};

use crate::{
    EngineError, Label, LabelDraft, ResultEngine, labels,
    query::{self, KeyPredicate, Page, QueryParams},
};

use super::{Engine, ListQuery, normalize_required_name, with_tx};

const LABEL_PAGE_LIMIT: i64 = 500;
const LABEL_ORDER_COLS: [&str; 2] = ["id", "name"];

impl Engine {
    /// Lists the labels of an account.
    pub async fn list_labels(&self, account_id: i32, list: &ListQuery) -> ResultEngine<Page<Label>> {
        let params = QueryParams::new()
            .limit(LABEL_PAGE_LIMIT)
            .page(list.page())
            .order(list.order_or("name"))
            .sort(list.sort_or("ASC"))
            .allowed_order_cols(LABEL_ORDER_COLS)
            .filter(KeyPredicate::eq("account_id", account_id));

        let page = query::find_with_meta::<labels::Entity, _>(&self.database, &params).await?;
        Ok(page.map(Label::from))
    }

    /// Creates a label, rejecting names already used in the account regardless
    /// of case.
    pub async fn create_label(&self, account_id: i32, name: &str) -> ResultEngine<Label> {
        let name = normalize_required_name(name, "name", "The name field is required.")?;

        with_tx!(self, |db_tx| {
            let duplicate = labels::Entity::find()
                .filter(labels::Column::AccountId.eq(account_id))
                .filter(
                    Expr::expr(Func::lower(Expr::col(labels::Column::Name)))
                        .eq(name.to_lowercase()),
                )
                .one(&db_tx)
                .await?;
            if duplicate.is_some() {
                return Err(EngineError::invalid_field(
                    "name",
                    "Label name is already in use.",
                ));
            }

            let now = Utc::now();
            let model = labels::ActiveModel {
                account_id: ActiveValue::Set(account_id),
                name: ActiveValue::Set(name),
                created_at: ActiveValue::Set(now),
                updated_at: ActiveValue::Set(now),
                ..Default::default()
            }
            .insert(&db_tx)
            .await?;
            tracing::info!(account_id, label_id = model.id, "label created");

            Ok(Label::from(model))
        })
    }

    /// Resolves the labels of a ledger write, keeping the first occurrence of
    /// each label.
    pub(super) async fn resolve_labels(
        &self,
        db_tx: &DatabaseTransaction,
        drafts: &[LabelDraft],
    ) -> ResultEngine<Vec<labels::Model>> {
        let mut seen = HashSet::new();
        let mut resolved = Vec::with_capacity(drafts.len());

        for draft in drafts {
            let model = if draft.name.is_empty() {
                Self::label_by_id(db_tx, draft).await?
            } else {
                Self::find_or_create_label(db_tx, draft).await?
            };
            if seen.insert(model.id) {
                resolved.push(model);
            }
        }

        Ok(resolved)
    }

    async fn label_by_id(
        db_tx: &DatabaseTransaction,
        draft: &LabelDraft,
    ) -> ResultEngine<labels::Model> {
        let Some(id) = draft.id else {
            return Err(EngineError::invalid_field(
                "labels",
                "Label name is required.",
            ));
        };
        labels::Entity::find_by_id(id)
            .filter(labels::Column::AccountId.eq(draft.account_id))
            .one(db_tx)
            .await?
            .ok_or_else(|| EngineError::NotFound("Label not found.".to_string()))
    }

    async fn find_or_create_label(
        db_tx: &DatabaseTransaction,
        draft: &LabelDraft,
    ) -> ResultEngine<labels::Model> {
        let find = || {
            labels::Entity::find()
                .filter(labels::Column::AccountId.eq(draft.account_id))
                .filter(labels::Column::Name.eq(draft.name.as_str()))
        };

        if let Some(model) = find().one(db_tx).await? {
            return Ok(model);
        }

        let now = Utc::now();
        let active = labels::ActiveModel {
            account_id: ActiveValue::Set(draft.account_id),
            name: ActiveValue::Set(draft.name.clone()),
            created_at: ActiveValue::Set(now),
            updated_at: ActiveValue::Set(now),
            ..Default::default()
        };
        labels::Entity::insert(active)
            .on_conflict(
                OnConflict::columns([labels::Column::AccountId, labels::Column::Name])
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(db_tx)
            .await?;

        find()
            .one(db_tx)
            .await?
            .ok_or_else(|| EngineError::NotFound("Label not found.".to_string()))
    }
}
