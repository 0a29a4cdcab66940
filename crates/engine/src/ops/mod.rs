use sea_orm::DatabaseConnection;

use crate::{EngineError, ResultEngine};

mod categories;
mod contacts;
mod labels;
mod ledgers;

pub use ledgers::{LEDGER_PRELOADS, LedgerListFilter};

/// Run a block inside a DB transaction, committing on success and rolling back on error.
macro_rules! with_tx {
    ($self:expr, |$tx:ident| $body:expr) => {{
        let $tx = $self.database.begin().await?;
        let result = $body;
        match result {
            Ok(value) => {
                $tx.commit().await?;
                Ok(value)
            }
            Err(err) => Err(err),
        }
    }};
}

pub(crate) use with_tx;

/// Direction of money on a ledger entry or category.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntryKind {
    Income,
    Expense,
}

impl EntryKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
        }
    }

    /// Legacy category type code.
    pub fn category_code(self) -> &'static str {
        match self {
            Self::Income => crate::categories::CATEGORY_KIND_INCOME,
            Self::Expense => crate::categories::CATEGORY_KIND_EXPENSE,
        }
    }
}

impl TryFrom<&str> for EntryKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "income" => Ok(Self::Income),
            "expense" => Ok(Self::Expense),
            other => Err(EngineError::InvalidParameter(format!("type {other}"))),
        }
    }
}

/// Paging, ordering and search shared by the contact, category and label
/// listings.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ListQuery {
    pub page: i64,
    pub limit: i64,
    pub order: String,
    pub sort: String,
    pub search: String,
}

/// Default and maximum page size of request-driven listings.
pub const MAX_PAGE_LIMIT: i64 = 100;

impl ListQuery {
    /// Requested page, at least 1.
    pub fn page(&self) -> i64 {
        self.page.max(1)
    }

    /// Requested limit, defaulting to and capped at [`MAX_PAGE_LIMIT`].
    pub fn limit(&self) -> i64 {
        if self.limit <= 0 {
            MAX_PAGE_LIMIT
        } else {
            self.limit.min(MAX_PAGE_LIMIT)
        }
    }

    fn order_or<'a>(&'a self, default: &'a str) -> &'a str {
        if self.order.is_empty() {
            default
        } else {
            &self.order
        }
    }

    fn sort_or<'a>(&'a self, default: &'a str) -> &'a str {
        if self.sort.is_empty() {
            default
        } else {
            &self.sort
        }
    }
}

#[derive(Debug)]
pub struct Engine {
    database: DatabaseConnection,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }
}

fn normalize_required_name(value: &str, field: &str, message: &str) -> ResultEngine<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(EngineError::invalid_field(field, message));
    }
    Ok(trimmed.to_string())
}

/// The builder for `Engine`
#[derive(Default)]
pub struct EngineBuilder {
    database: DatabaseConnection,
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    /// Construct `Engine`
    pub async fn build(self) -> ResultEngine<Engine> {
        tracing::debug!("engine ready");
        Ok(Engine {
            database: self.database,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_query_paging_defaults() {
        let query = ListQuery::default();
        assert_eq!(query.page(), 1);
        assert_eq!(query.limit(), MAX_PAGE_LIMIT);

        let query = ListQuery {
            page: 4,
            limit: 500,
            ..ListQuery::default()
        };
        assert_eq!(query.page(), 4);
        assert_eq!(query.limit(), MAX_PAGE_LIMIT);
    }

    #[test]
    fn entry_kind_maps_to_category_codes() {
        assert_eq!(EntryKind::try_from("income"), Ok(EntryKind::Income));
        assert_eq!(EntryKind::Income.category_code(), "2");
        assert_eq!(EntryKind::Expense.category_code(), "1");
        assert!(EntryKind::try_from("transfer").is_err());
    }
}
