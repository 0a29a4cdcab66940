//! Bookkeeping engine: account-scoped ledger entries with their contacts,
//! categories, labels and files, plus the generic filtered and paginated
//! query layer the listings are built on.

pub use categories::{CATEGORY_KIND_EXPENSE, CATEGORY_KIND_INCOME, Category};
pub use commands::{CategoryDraft, ContactDraft, LabelDraft, LedgerDraft};
pub use contacts::{CONTACT_KIND_BOTH, Contact};
pub use error::{EngineError, ValidationErrors};
pub use files::File;
pub use labels::Label;
pub use ledgers::Ledger;
pub use ops::{
    Engine, EngineBuilder, EntryKind, LEDGER_PRELOADS, LedgerListFilter, ListQuery, MAX_PAGE_LIMIT,
};
pub use query::{KeyPredicate, Page, PageMeta, PredicateValue, QueryParams};

mod categories;
mod commands;
mod contacts;
mod error;
mod files;
mod files_to_ledger;
mod labels;
mod labels_to_ledger;
mod ledgers;
mod ops;
pub mod query;

pub type ResultEngine<T> = Result<T, EngineError>;
