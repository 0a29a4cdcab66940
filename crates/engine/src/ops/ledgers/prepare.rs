use std::collections::HashSet;

use chrono::NaiveDate;
use sea_orm::{DatabaseTransaction, QueryFilter, prelude::*};

use crate::{EngineError, LedgerDraft, ResultEngine, categories, contacts, files, labels};

use super::super::Engine;

/// A validated draft whose associations all resolved to rows of the ledger's
/// account. Only this shape is ever written.
#[derive(Clone, Debug)]
pub(super) struct PreparedLedger {
    pub(super) account_id: i32,
    pub(super) added_by_id: i32,
    pub(super) date: NaiveDate,
    pub(super) amount: f64,
    pub(super) note: String,
    pub(super) contact: contacts::Model,
    pub(super) category: categories::Model,
    pub(super) labels: Vec<labels::Model>,
    pub(super) files: Vec<files::Model>,
}

impl PreparedLedger {
    pub(super) fn label_ids(&self) -> Vec<i32> {
        self.labels.iter().map(|label| label.id).collect()
    }

    pub(super) fn file_ids(&self) -> Vec<i32> {
        self.files.iter().map(|file| file.id).collect()
    }
}

impl Engine {
    /// Resolves every association of a normalized, validated draft.
    pub(super) async fn prepare_ledger(
        &self,
        db_tx: &DatabaseTransaction,
        draft: LedgerDraft,
    ) -> ResultEngine<PreparedLedger> {
        let date = draft
            .date
            .ok_or_else(|| EngineError::invalid_field("date", "The date field is required."))?;

        let contact = self.resolve_contact(db_tx, &draft.contact).await?;
        let category = self.resolve_category(db_tx, &draft.category).await?;
        let labels = self.resolve_labels(db_tx, &draft.labels).await?;
        let files = Self::resolve_files(db_tx, draft.account_id, &draft.files).await?;

        tracing::debug!(
            account_id = draft.account_id,
            contact_id = contact.id,
            category_id = category.id,
            labels = labels.len(),
            files = files.len(),
            "ledger associations resolved"
        );

        Ok(PreparedLedger {
            account_id: draft.account_id,
            added_by_id: draft.added_by_id,
            date,
            amount: draft.amount,
            note: draft.note,
            contact,
            category,
            labels,
            files,
        })
    }

    /// Loads the given files, failing when any of them is not in the account.
    pub(super) async fn resolve_files(
        db_tx: &DatabaseTransaction,
        account_id: i32,
        file_ids: &[i32],
    ) -> ResultEngine<Vec<files::Model>> {
        let mut seen = HashSet::new();
        let wanted: Vec<i32> = file_ids
            .iter()
            .copied()
            .filter(|id| seen.insert(*id))
            .collect();
        if wanted.is_empty() {
            return Ok(Vec::new());
        }

        let found = files::Entity::find()
            .filter(files::Column::AccountId.eq(account_id))
            .filter(files::Column::Id.is_in(wanted.clone()))
            .all(db_tx)
            .await?;

        wanted
            .into_iter()
            .map(|id| {
                found
                    .iter()
                    .find(|file| file.id == id)
                    .cloned()
                    .ok_or_else(|| EngineError::NotFound("File not found.".to_string()))
            })
            .collect()
    }
}
