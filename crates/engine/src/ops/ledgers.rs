//! Ledger aggregate operations: reading, listing and the upsert workflow that
//! resolves contacts, categories, labels and files before writing the entry.

mod list;
mod prepare;
mod read;
mod write;

pub use list::LedgerListFilter;
pub use read::LEDGER_PRELOADS;
