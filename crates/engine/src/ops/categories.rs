use chrono::Utc;
use sea_orm::{
    ActiveValue, DatabaseTransaction, QueryFilter, TransactionTrait, prelude::*,
    sea_query::{Expr, Func, OnConflict},
};

use crate::{
    Category, CategoryDraft, EngineError, ResultEngine, ValidationErrors, categories,
    categories::{CATEGORY_KIND_EXPENSE, CATEGORY_KIND_INCOME},
    query::{self, KeyPredicate, Page, QueryParams},
};

use super::{Engine, EntryKind, ListQuery, with_tx};

const CATEGORY_PAGE_LIMIT: i64 = 500;
const CATEGORY_ORDER_COLS: [&str; 2] = ["id", "name"];

impl Engine {
    /// Lists the categories of an account, optionally only income or expense
    /// ones.
    pub async fn list_categories(
        &self,
        account_id: i32,
        list: &ListQuery,
        kind: Option<EntryKind>,
    ) -> ResultEngine<Page<Category>> {
        let mut params = QueryParams::new()
            .limit(CATEGORY_PAGE_LIMIT)
            .page(list.page())
            .order(list.order_or("name"))
            .sort(list.sort_or("ASC"))
            .allowed_order_cols(CATEGORY_ORDER_COLS)
            .filter(KeyPredicate::eq("account_id", account_id));
        if let Some(kind) = kind {
            params = params.filter(KeyPredicate::eq("kind", kind.category_code()));
        }

        let page = query::find_with_meta::<categories::Entity, _>(&self.database, &params).await?;
        Ok(page.map(Category::from))
    }

    /// Creates a category, rejecting names already used by a category of the
    /// same type in the account regardless of case.
    pub async fn create_category(
        &self,
        account_id: i32,
        name: &str,
        kind: &str,
    ) -> ResultEngine<Category> {
        let mut errors = ValidationErrors::new();
        let name = name.trim().to_string();
        if name.is_empty() {
            errors.add("name", "The name field is required.");
        }
        let kind = kind.trim().to_string();
        if kind.is_empty() {
            errors.add("type", "The type field is required.");
        } else if kind != CATEGORY_KIND_EXPENSE && kind != CATEGORY_KIND_INCOME {
            errors.add("type", "The type field must be 1, or 2.");
        }
        errors.into_result()?;

        with_tx!(self, |db_tx| {
            let duplicate = categories::Entity::find()
                .filter(categories::Column::AccountId.eq(account_id))
                .filter(categories::Column::Kind.eq(kind.as_str()))
                .filter(
                    Expr::expr(Func::lower(Expr::col(categories::Column::Name)))
                        .eq(name.to_lowercase()),
                )
                .one(&db_tx)
                .await?;
            if duplicate.is_some() {
                return Err(EngineError::invalid_field(
                    "name",
                    "Category name is already in use.",
                ));
            }

            let now = Utc::now();
            let model = categories::ActiveModel {
                account_id: ActiveValue::Set(account_id),
                name: ActiveValue::Set(name),
                kind: ActiveValue::Set(kind),
                created_at: ActiveValue::Set(now),
                updated_at: ActiveValue::Set(now),
                ..Default::default()
            }
            .insert(&db_tx)
            .await?;
            tracing::info!(account_id, category_id = model.id, "category created");

            Ok(Category::from(model))
        })
    }

    /// Resolves the category of a ledger write.
    ///
    /// An id is used as is once it is known to belong to the account;
    /// otherwise the category is found or created by name and type.
    pub(super) async fn resolve_category(
        &self,
        db_tx: &DatabaseTransaction,
        draft: &CategoryDraft,
    ) -> ResultEngine<categories::Model> {
        if let Some(id) = draft.id {
            return categories::Entity::find_by_id(id)
                .filter(categories::Column::AccountId.eq(draft.account_id))
                .one(db_tx)
                .await?
                .ok_or_else(|| EngineError::NotFound("Category not found.".to_string()));
        }

        let find = || {
            categories::Entity::find()
                .filter(categories::Column::AccountId.eq(draft.account_id))
                .filter(categories::Column::Name.eq(draft.name.as_str()))
                .filter(categories::Column::Kind.eq(draft.kind.as_str()))
        };

        if let Some(model) = find().one(db_tx).await? {
            return Ok(model);
        }

        let now = Utc::now();
        let active = categories::ActiveModel {
            account_id: ActiveValue::Set(draft.account_id),
            name: ActiveValue::Set(draft.name.clone()),
            kind: ActiveValue::Set(draft.kind.clone()),
            created_at: ActiveValue::Set(now),
            updated_at: ActiveValue::Set(now),
            ..Default::default()
        };
        categories::Entity::insert(active)
            .on_conflict(
                OnConflict::columns([
                    categories::Column::AccountId,
                    categories::Column::Name,
                    categories::Column::Kind,
                ])
                .do_nothing()
                .to_owned(),
            )
            .exec_without_returning(db_tx)
            .await?;

        find()
            .one(db_tx)
            .await?
            .ok_or_else(|| EngineError::NotFound("Category not found.".to_string()))
    }
}
