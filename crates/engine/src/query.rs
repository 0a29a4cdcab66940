//! Filtered and paginated listing shared by every list endpoint.
//!
//! A [`QueryParams`] value describes one page of results: ordering, free-text
//! search, typed predicates and eager-load hints. [`find`] and [`count_all`]
//! turn it into queries over any sea-orm entity implementing [`Preload`], and
//! [`PageMeta`] derives the paging headers from the unlimited row count.
//!
//! Predicate keys, comparison operators and search columns are spliced into
//! the generated SQL. They must come from code, never from request input.

use std::{future::Future, str::FromStr};

use sea_orm::{
    ColumnTrait, ColumnType, Condition, ConnectionTrait, EntityName, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Select, Value,
    sea_query::{Expr, Func, Order, SimpleExpr},
};
use serde::{Deserialize, Serialize};

use crate::{EngineError, ResultEngine, categories, contacts, files, labels};

/// Value bound to a [`KeyPredicate`].
///
/// Blank values (empty text, zero, empty list) make the predicate a no-op.
#[derive(Clone, Debug, PartialEq)]
pub enum PredicateValue {
    Text(String),
    Int(i64),
    Float(f64),
    IntList(Vec<i64>),
}

impl PredicateValue {
    fn is_blank(&self) -> bool {
        match self {
            Self::Text(value) => value.is_empty(),
            Self::Int(value) => *value == 0,
            Self::Float(value) => *value == 0.0,
            Self::IntList(values) => values.is_empty(),
        }
    }
}

impl From<&str> for PredicateValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for PredicateValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for PredicateValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for PredicateValue {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<f64> for PredicateValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<Vec<i64>> for PredicateValue {
    fn from(values: Vec<i64>) -> Self {
        Self::IntList(values)
    }
}

/// `key compare value`, for example `amount >= 0.01` or `id IN (1, 2)`.
#[derive(Clone, Debug, PartialEq)]
pub struct KeyPredicate {
    pub key: String,
    pub compare: String,
    pub value: PredicateValue,
}

impl KeyPredicate {
    pub fn new(
        key: impl Into<String>,
        compare: impl Into<String>,
        value: impl Into<PredicateValue>,
    ) -> Self {
        Self {
            key: key.into(),
            compare: compare.into(),
            value: value.into(),
        }
    }

    pub fn eq(key: impl Into<String>, value: impl Into<PredicateValue>) -> Self {
        Self::new(key, "=", value)
    }

    pub fn is_in(key: impl Into<String>, values: Vec<i64>) -> Self {
        Self::new(key, "IN", PredicateValue::IntList(values))
    }

    fn to_expr(&self) -> Option<SimpleExpr> {
        if self.value.is_blank() {
            return None;
        }

        let (key, compare) = (&self.key, &self.compare);
        let expr = match &self.value {
            PredicateValue::Text(value) => {
                Expr::cust_with_values(format!("{key} {compare} ?"), [Value::from(value.clone())])
            }
            PredicateValue::Int(value) => {
                Expr::cust_with_values(format!("{key} {compare} ?"), [Value::from(*value)])
            }
            PredicateValue::Float(value) => {
                Expr::cust_with_values(format!("{key} {compare} ?"), [Value::from(*value)])
            }
            PredicateValue::IntList(values) => {
                let placeholders = vec!["?"; values.len()].join(", ");
                Expr::cust_with_values(
                    format!("{key} {compare} ({placeholders})"),
                    values.iter().map(|value| Value::from(*value)),
                )
            }
        };
        Some(expr)
    }
}

/// Declarative description of one page of a list query.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct QueryParams {
    pub limit: i64,
    pub page: i64,
    pub offset: i64,
    pub order: String,
    pub sort: String,
    pub search_cols: Vec<String>,
    pub search_term: String,
    pub wheres: Vec<KeyPredicate>,
    pub preloads: Vec<String>,
    /// Whitelist for `order`; empty accepts any column of the entity.
    pub allowed_order_cols: Vec<String>,
}

impl QueryParams {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = limit;
        self
    }

    #[must_use]
    pub fn page(mut self, page: i64) -> Self {
        self.page = page;
        self
    }

    #[must_use]
    pub fn offset(mut self, offset: i64) -> Self {
        self.offset = offset;
        self
    }

    #[must_use]
    pub fn order(mut self, order: impl Into<String>) -> Self {
        self.order = order.into();
        self
    }

    #[must_use]
    pub fn sort(mut self, sort: impl Into<String>) -> Self {
        self.sort = sort.into();
        self
    }

    #[must_use]
    pub fn search<I, S>(mut self, cols: I, term: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.search_cols = cols.into_iter().map(Into::into).collect();
        self.search_term = term.into();
        self
    }

    #[must_use]
    pub fn filter(mut self, predicate: KeyPredicate) -> Self {
        self.wheres.push(predicate);
        self
    }

    #[must_use]
    pub fn preload(mut self, hint: impl Into<String>) -> Self {
        self.preloads.push(hint.into());
        self
    }

    #[must_use]
    pub fn allowed_order_cols<I, S>(mut self, cols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_order_cols = cols.into_iter().map(Into::into).collect();
        self
    }

    /// Check `order` against the whitelist and `sort` against `ASC`/`DESC`.
    pub fn validate(&self) -> ResultEngine<()> {
        if !self.order.is_empty()
            && !self.allowed_order_cols.is_empty()
            && !self.allowed_order_cols.iter().any(|col| *col == self.order)
        {
            return Err(EngineError::InvalidParameter("order".to_string()));
        }

        if !self.sort.is_empty() {
            let sort = self.sort.to_uppercase();
            if sort != "ASC" && sort != "DESC" {
                return Err(EngineError::InvalidParameter("sort".to_string()));
            }
        }

        Ok(())
    }

    /// Row offset of the requested page; `page` wins over an explicit offset.
    pub fn effective_offset(&self) -> i64 {
        if self.page > 0 && self.limit > 0 {
            self.page.saturating_mul(self.limit).saturating_sub(self.limit)
        } else {
            self.offset.max(0)
        }
    }

    fn sort_order(&self) -> Order {
        if self.sort.eq_ignore_ascii_case("DESC") {
            Order::Desc
        } else {
            Order::Asc
        }
    }

    fn search_expr(&self) -> Option<SimpleExpr> {
        if self.search_term.is_empty() || self.search_cols.is_empty() {
            return None;
        }

        let clause = self
            .search_cols
            .iter()
            .map(|col| format!("{col} LIKE ?"))
            .collect::<Vec<_>>()
            .join(" OR ");
        let pattern = format!("%{}%", self.search_term);

        Some(Expr::cust_with_values(
            format!("({clause})"),
            self.search_cols
                .iter()
                .map(|_| Value::from(pattern.clone())),
        ))
    }
}

/// Paging information returned alongside a page of results.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMeta {
    pub page: i64,
    pub limit: i64,
    pub offset: i64,
    pub page_count: i64,
    pub last_page: bool,
    pub no_limit_count: i64,
}

impl PageMeta {
    /// Derive the paging fields from the unlimited row count.
    ///
    /// Without a positive limit only `limit` and `no_limit_count` are set.
    pub fn compute(no_limit_count: u64, params: &QueryParams) -> Self {
        let no_limit_count = i64::try_from(no_limit_count).unwrap_or(i64::MAX);
        let limit = params.limit;
        if limit <= 0 {
            return Self {
                limit,
                no_limit_count,
                ..Self::default()
            };
        }

        let page = params.page.max(0);
        let offset = if page > 0 {
            page.saturating_mul(limit).saturating_sub(limit)
        } else {
            0
        };
        let page_count = no_limit_count / limit + i64::from(no_limit_count % limit != 0);

        Self {
            page,
            limit,
            offset,
            page_count,
            last_page: page == page_count,
            no_limit_count,
        }
    }
}

/// One page of results and its paging information.
#[derive(Clone, Debug, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub meta: PageMeta,
}

impl<T> Page<T> {
    /// A page with no rows, used when a pre-filter already matched nothing.
    pub fn empty(params: &QueryParams) -> Self {
        Self {
            items: Vec::new(),
            meta: PageMeta::compute(0, params),
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            meta: self.meta,
        }
    }
}

trait ApplyQueryParams: QueryFilter + Sized {
    fn apply_query_params(self, params: &QueryParams) -> Self;
}

impl<T> ApplyQueryParams for T
where
    T: QueryFilter + Sized,
{
    fn apply_query_params(self, params: &QueryParams) -> Self {
        let mut condition = Condition::all();
        for expr in params.wheres.iter().filter_map(KeyPredicate::to_expr) {
            condition = condition.add(expr);
        }
        if let Some(search) = params.search_expr() {
            condition = condition.add(search);
        }
        self.filter(condition)
    }
}

fn is_text_column(column_type: &ColumnType) -> bool {
    matches!(
        column_type,
        ColumnType::String(_) | ColumnType::Text | ColumnType::Char(_)
    )
}

fn ordered<E>(select: Select<E>, params: &QueryParams) -> ResultEngine<Select<E>>
where
    E: EntityTrait,
{
    if params.order.is_empty() {
        return Ok(select);
    }

    let column = E::Column::from_str(&params.order)
        .map_err(|_| EngineError::InvalidParameter("order".to_string()))?;
    let order = params.sort_order();

    // Text columns sort case-insensitively so "abc" and "Abc" sit together.
    if is_text_column(column.def().get_column_type()) {
        let lowered = SimpleExpr::from(Func::lower(Expr::col((E::default(), column))));
        Ok(select.order_by(lowered, order))
    } else {
        Ok(select.order_by(column, order))
    }
}

fn build_select<E>(params: &QueryParams) -> ResultEngine<Select<E>>
where
    E: EntityTrait,
{
    params.validate()?;

    let mut select = ordered(E::find().apply_query_params(params), params)?;

    let offset = params.effective_offset();
    if offset > 0 {
        select = select.offset(offset as u64);
    }
    if params.limit > 0 {
        select = select.limit(params.limit as u64);
    }

    Ok(select)
}

/// Eager loading of the associations named by [`QueryParams::preloads`].
pub trait Preload: EntityTrait {
    /// Row type handed back once the hints are applied.
    type Loaded;

    /// Loads the hinted associations of `models`. Unknown hints are logged
    /// and skipped.
    fn preload<C>(
        db: &C,
        models: Vec<Self::Model>,
        hints: &[String],
    ) -> impl Future<Output = Vec<Self::Loaded>>
    where
        C: ConnectionTrait;
}

fn skip_preloads<E>(hints: &[String])
where
    E: EntityTrait,
{
    for hint in hints {
        tracing::debug!(
            table = E::default().table_name(),
            hint = %hint,
            "unknown preload skipped"
        );
    }
}

macro_rules! without_preloads {
    ($($entity:path),+ $(,)?) => {
        $(
            impl Preload for $entity {
                type Loaded = <Self as EntityTrait>::Model;

                fn preload<C>(
                    _db: &C,
                    models: Vec<Self::Model>,
                    hints: &[String],
                ) -> impl Future<Output = Vec<Self::Loaded>>
                where
                    C: ConnectionTrait,
                {
                    skip_preloads::<Self>(hints);
                    std::future::ready(models)
                }
            }
        )+
    };
}

without_preloads!(
    contacts::Entity,
    categories::Entity,
    labels::Entity,
    files::Entity,
);

/// Fetch the rows of `E` described by `params` with their preloads applied.
pub async fn find<E, C>(db: &C, params: &QueryParams) -> ResultEngine<Vec<E::Loaded>>
where
    E: Preload,
    C: ConnectionTrait,
{
    let select = build_select::<E>(params)?;
    tracing::debug!(
        table = E::default().table_name(),
        limit = params.limit,
        offset = params.effective_offset(),
        order = %params.order,
        preloads = params.preloads.len(),
        "running list query"
    );
    let models = select.all(db).await?;
    Ok(E::preload(db, models, &params.preloads).await)
}

/// Count every row of `E` matching the predicates and search of `params`,
/// ignoring limit, offset and ordering.
pub async fn count_all<E, C>(db: &C, params: &QueryParams) -> ResultEngine<u64>
where
    E: EntityTrait,
    E::Model: Sync,
    C: ConnectionTrait,
{
    Ok(E::find().apply_query_params(params).count(db).await?)
}

/// [`find`] plus [`count_all`] folded into a [`Page`].
pub async fn find_with_meta<E, C>(db: &C, params: &QueryParams) -> ResultEngine<Page<E::Loaded>>
where
    E: Preload,
    E::Model: Sync,
    C: ConnectionTrait,
{
    let items = find::<E, C>(db, params).await?;
    let no_limit_count = count_all::<E, C>(db, params).await?;
    Ok(Page {
        items,
        meta: PageMeta::compute(no_limit_count, params),
    })
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use migration::MigratorTrait;
    use sea_orm::{Database, DbBackend, QueryTrait};

    use super::*;
    use crate::{CategoryDraft, ContactDraft, Engine, LedgerDraft, ledgers};

    fn params(limit: i64, page: i64) -> QueryParams {
        QueryParams::new().limit(limit).page(page)
    }

    #[test]
    fn meta_for_three_pages() {
        let first = PageMeta::compute(105, &params(50, 1));
        assert_eq!(first.offset, 0);
        assert_eq!(first.page_count, 3);
        assert!(!first.last_page);

        let second = PageMeta::compute(105, &params(50, 2));
        assert_eq!(second.offset, 50);
        assert!(!second.last_page);

        let third = PageMeta::compute(105, &params(50, 3));
        assert_eq!(third.offset, 100);
        assert!(third.last_page);
    }

    #[test]
    fn page_count_is_ceiling_of_count_over_limit() {
        for limit in 1..=12_i64 {
            for count in 0..=60_u64 {
                let meta = PageMeta::compute(count, &params(limit, 2));
                let expected = (count as i64 + limit - 1) / limit;
                assert_eq!(meta.page_count, expected, "count={count} limit={limit}");
                assert_eq!(meta.last_page, meta.page == meta.page_count);
            }
        }
    }

    #[test]
    fn meta_without_limit_only_carries_count() {
        let meta = PageMeta::compute(42, &params(0, 3));
        assert_eq!(
            meta,
            PageMeta {
                no_limit_count: 42,
                ..PageMeta::default()
            }
        );
    }

    #[test]
    fn empty_result_without_page_is_last_page() {
        let meta = PageMeta::compute(0, &params(25, 0));
        assert_eq!(meta.page_count, 0);
        assert!(meta.last_page);
    }

    #[test]
    fn order_outside_whitelist_is_rejected() {
        let params = QueryParams::new()
            .order("secret")
            .allowed_order_cols(["id", "name"]);
        assert_eq!(
            params.validate(),
            Err(EngineError::InvalidParameter("order".to_string()))
        );
    }

    #[test]
    fn sort_is_case_insensitive_and_restricted() {
        assert!(QueryParams::new().sort("desc").validate().is_ok());
        assert!(QueryParams::new().sort("Asc").validate().is_ok());
        assert_eq!(
            QueryParams::new().sort("sideways").validate(),
            Err(EngineError::InvalidParameter("sort".to_string()))
        );
    }

    #[test]
    fn page_overrides_explicit_offset() {
        assert_eq!(params(25, 3).offset(7).effective_offset(), 50);
        assert_eq!(params(25, 0).offset(7).effective_offset(), 7);
        assert_eq!(params(25, 0).offset(-4).effective_offset(), 0);
    }

    #[test]
    fn blank_predicates_are_skipped() {
        assert!(KeyPredicate::eq("name", "").to_expr().is_none());
        assert!(KeyPredicate::eq("category_id", 0_i64).to_expr().is_none());
        assert!(KeyPredicate::new("amount", ">=", 0.0).to_expr().is_none());
        assert!(KeyPredicate::is_in("id", Vec::new()).to_expr().is_none());
        assert!(KeyPredicate::new("amount", ">=", 0.01).to_expr().is_some());
    }

    #[test]
    fn unknown_order_column_is_rejected() {
        let params = QueryParams::new().order("nope");
        assert_eq!(
            build_select::<labels::Entity>(&params).err(),
            Some(EngineError::InvalidParameter("order".to_string()))
        );
    }

    #[test]
    fn text_order_is_lowercased() {
        let params = QueryParams::new().order("name").sort("DESC").limit(10);
        let sql = build_select::<labels::Entity>(&params)
            .map(|select| select.build(DbBackend::Sqlite).to_string())
            .unwrap_or_default();
        assert!(sql.contains("LOWER("), "{sql}");
        assert!(sql.contains("DESC"), "{sql}");
        assert!(sql.contains("LIMIT 10"), "{sql}");
    }

    #[test]
    fn search_and_predicates_are_combined() {
        let params = QueryParams::new()
            .filter(KeyPredicate::eq("account_id", 7_i64))
            .filter(KeyPredicate::is_in("id", vec![1, 2, 3]))
            .search(["name"], "rent");
        let sql = build_select::<labels::Entity>(&params)
            .map(|select| select.build(DbBackend::Sqlite).to_string())
            .unwrap_or_default();
        assert!(sql.contains("account_id = 7"), "{sql}");
        assert!(sql.contains("id IN (1, 2, 3)"), "{sql}");
        assert!(sql.contains("(name LIKE '%rent%')"), "{sql}");
    }

    #[tokio::test]
    async fn preloads_are_applied_by_the_query() {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        migration::Migrator::up(&db, None).await.unwrap();
        let engine = Engine::builder()
            .database(db.clone())
            .build()
            .await
            .unwrap();
        let date = NaiveDate::from_ymd_opt(2024, 3, 14).unwrap();
        engine
            .create_ledger(
                LedgerDraft::new(
                    1,
                    7,
                    date,
                    -5.0,
                    ContactDraft::named("Acme"),
                    CategoryDraft::new("Office", "1"),
                )
                .label("Travel"),
            )
            .await
            .unwrap();

        let params = QueryParams::new().preload("Labels").preload("Budget");
        let ledgers = find::<ledgers::Entity, _>(&db, &params).await.unwrap();
        assert_eq!(ledgers.len(), 1);
        assert_eq!(ledgers[0].labels.len(), 1);
        assert_eq!(ledgers[0].labels[0].name, "Travel");
        assert!(ledgers[0].contact.is_none());

        let params = QueryParams::new().preload("Ledgers");
        let listed = find_with_meta::<labels::Entity, _>(&db, &params).await.unwrap();
        assert_eq!(listed.items.len(), 1);
        assert_eq!(listed.items[0].name, "Travel");
        assert_eq!(listed.meta.no_limit_count, 1);
    }
}
