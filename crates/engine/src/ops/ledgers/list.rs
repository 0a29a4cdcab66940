use chrono::NaiveDate;
use sea_orm::{Condition, QueryFilter, QuerySelect, prelude::*};

use crate::{
    Ledger, ResultEngine, contacts, labels_to_ledger, ledgers,
    query::{self, KeyPredicate, Page, QueryParams},
};

use super::read::LEDGER_PRELOADS;
use super::super::{Engine, EntryKind};

const LEDGER_PAGE_LIMIT: i64 = 25;
const LEDGER_ORDER_COLS: [&str; 2] = ["id", "date"];

/// Filters for listing ledger entries.
///
/// Date bounds are inclusive. `label_ids` matches entries carrying any of the
/// labels, and an empty set matches nothing; `search` matches entries whose contact's company, first or last
/// name contains the term.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LedgerListFilter {
    pub page: i64,
    pub order: String,
    pub sort: String,
    pub kind: Option<EntryKind>,
    pub category_id: Option<i32>,
    pub year: Option<i32>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub label_ids: Option<Vec<i32>>,
    pub search: String,
}

fn date_value(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

impl LedgerListFilter {
    fn query_params(&self, account_id: i32) -> QueryParams {
        let order = if self.order.is_empty() {
            "date"
        } else {
            self.order.as_str()
        };
        let sort = if self.sort.is_empty() {
            "DESC"
        } else {
            self.sort.as_str()
        };

        let mut params = QueryParams::new()
            .limit(LEDGER_PAGE_LIMIT)
            .page(self.page.max(1))
            .order(order)
            .sort(sort)
            .allowed_order_cols(LEDGER_ORDER_COLS)
            .filter(KeyPredicate::eq("account_id", account_id));
        for hint in LEDGER_PRELOADS {
            params = params.preload(hint);
        }

        params = match self.kind {
            Some(EntryKind::Income) => params.filter(KeyPredicate::new("amount", ">=", 0.01)),
            Some(EntryKind::Expense) => params.filter(KeyPredicate::new("amount", "<=", -0.01)),
            None => params,
        };
        if let Some(category_id) = self.category_id {
            params = params.filter(KeyPredicate::eq("category_id", category_id));
        }
        if let Some(year) = self.year {
            params = params
                .filter(KeyPredicate::new("date", ">=", format!("{year:04}-01-01")))
                .filter(KeyPredicate::new("date", "<=", format!("{year:04}-12-31")));
        }
        if let Some(start) = self.start_date {
            params = params.filter(KeyPredicate::new("date", ">=", date_value(start)));
        }
        if let Some(end) = self.end_date {
            params = params.filter(KeyPredicate::new("date", "<=", date_value(end)));
        }

        params
    }
}

impl Engine {
    /// Lists the ledger entries of an account, 25 per page, newest first by
    /// default, with every association loaded.
    pub async fn list_ledgers(
        &self,
        account_id: i32,
        filter: &LedgerListFilter,
    ) -> ResultEngine<Page<Ledger>> {
        let mut params = filter.query_params(account_id);
        params.validate()?;

        if let Some(label_ids) = &filter.label_ids {
            let ids = if label_ids.is_empty() {
                Vec::new()
            } else {
                self.ledger_ids_with_labels(account_id, label_ids).await?
            };
            if ids.is_empty() {
                return Ok(Page::empty(&params));
            }
            params = params.filter(KeyPredicate::is_in("id", ids));
        }

        let search = filter.search.trim();
        if !search.is_empty() {
            let ids = self.contact_ids_matching(account_id, search).await?;
            if ids.is_empty() {
                return Ok(Page::empty(&params));
            }
            params = params.filter(KeyPredicate::is_in("contact_id", ids));
        }

        query::find_with_meta::<ledgers::Entity, _>(&self.database, &params).await
    }

    async fn ledger_ids_with_labels(
        &self,
        account_id: i32,
        label_ids: &[i32],
    ) -> ResultEngine<Vec<i64>> {
        let ids: Vec<i32> = labels_to_ledger::Entity::find()
            .select_only()
            .column(labels_to_ledger::Column::LedgerId)
            .filter(labels_to_ledger::Column::AccountId.eq(account_id))
            .filter(labels_to_ledger::Column::LabelId.is_in(label_ids.iter().copied()))
            .distinct()
            .into_tuple()
            .all(&self.database)
            .await?;
        Ok(ids.into_iter().map(i64::from).collect())
    }

    async fn contact_ids_matching(&self, account_id: i32, term: &str) -> ResultEngine<Vec<i64>> {
        let pattern = format!("%{term}%");
        let ids: Vec<i32> = contacts::Entity::find()
            .select_only()
            .column(contacts::Column::Id)
            .filter(contacts::Column::AccountId.eq(account_id))
            .filter(
                Condition::any()
                    .add(contacts::Column::Name.like(pattern.as_str()))
                    .add(contacts::Column::FirstName.like(pattern.as_str()))
                    .add(contacts::Column::LastName.like(pattern.as_str())),
            )
            .into_tuple()
            .all(&self.database)
            .await?;
        Ok(ids.into_iter().map(i64::from).collect())
    }
}
