use std::collections::HashSet;

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveValue, DatabaseTransaction, QueryFilter, TransactionTrait, prelude::*,
    sea_query::{Expr, OnConflict},
};

use crate::{Ledger, LedgerDraft, ResultEngine, files_to_ledger, labels_to_ledger, ledgers};

use super::{
    prepare::PreparedLedger,
    read::{find_ledger_model, load_ledger},
};
use super::super::{Engine, with_tx};

impl Engine {
    /// Creates a ledger entry.
    ///
    /// The draft is validated before anything is written; associations are
    /// then resolved and the entry and its join rows are written in one
    /// transaction.
    pub async fn create_ledger(&self, draft: LedgerDraft) -> ResultEngine<Ledger> {
        let draft = draft.normalize();
        draft.validate()?;

        with_tx!(self, |db_tx| {
            let prepared = self.prepare_ledger(&db_tx, draft).await?;
            let now = Utc::now();

            let model = ledgers::ActiveModel {
                account_id: ActiveValue::Set(prepared.account_id),
                added_by_id: ActiveValue::Set(prepared.added_by_id),
                contact_id: ActiveValue::Set(prepared.contact.id),
                category_id: ActiveValue::Set(prepared.category.id),
                date: ActiveValue::Set(prepared.date),
                amount: ActiveValue::Set(prepared.amount),
                note: ActiveValue::Set(prepared.note.clone()),
                created_at: ActiveValue::Set(now),
                updated_at: ActiveValue::Set(now),
                ..Default::default()
            }
            .insert(&db_tx)
            .await?;

            link_labels(&db_tx, &model, &prepared.label_ids(), now).await?;
            link_files(&db_tx, &model, &prepared.file_ids(), now).await?;
            sync_join_columns(&db_tx, &model).await?;

            tracing::info!(
                account_id = model.account_id,
                ledger_id = model.id,
                "ledger entry created"
            );
            load_ledger(&db_tx, model.account_id, model.id).await
        })
    }

    /// Updates a ledger entry of the draft's account.
    ///
    /// The entry's label set becomes exactly the draft's labels. Files are
    /// only added; files already attached stay attached.
    pub async fn update_ledger(&self, ledger_id: i32, draft: LedgerDraft) -> ResultEngine<Ledger> {
        let draft = draft.normalize();
        draft.validate()?;

        with_tx!(self, |db_tx| {
            let existing = find_ledger_model(&db_tx, draft.account_id, ledger_id).await?;
            let prepared = self.prepare_ledger(&db_tx, draft).await?;
            let now = Utc::now();

            let mut active: ledgers::ActiveModel = existing.into();
            apply_prepared(&mut active, &prepared, now);
            let model = active.update(&db_tx).await?;

            replace_labels(&db_tx, &model, &prepared.label_ids(), now).await?;
            link_files(&db_tx, &model, &prepared.file_ids(), now).await?;
            sync_join_columns(&db_tx, &model).await?;

            tracing::info!(
                account_id = model.account_id,
                ledger_id = model.id,
                "ledger entry updated"
            );
            load_ledger(&db_tx, model.account_id, model.id).await
        })
    }

    /// Deletes a ledger entry together with its label and file associations.
    pub async fn delete_ledger(&self, account_id: i32, ledger_id: i32) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let model = find_ledger_model(&db_tx, account_id, ledger_id).await?;

            labels_to_ledger::Entity::delete_many()
                .filter(labels_to_ledger::Column::LedgerId.eq(model.id))
                .exec(&db_tx)
                .await?;
            files_to_ledger::Entity::delete_many()
                .filter(files_to_ledger::Column::LedgerId.eq(model.id))
                .exec(&db_tx)
                .await?;
            ledgers::Entity::delete_by_id(model.id).exec(&db_tx).await?;

            tracing::info!(account_id, ledger_id, "ledger entry deleted");
            Ok(())
        })
    }

    /// Attaches an uploaded file to a ledger entry of the same account.
    ///
    /// Attaching a file twice is a no-op.
    pub async fn add_file_to_ledger(
        &self,
        account_id: i32,
        ledger_id: i32,
        file_id: i32,
    ) -> ResultEngine<Ledger> {
        with_tx!(self, |db_tx| {
            let model = find_ledger_model(&db_tx, account_id, ledger_id).await?;
            let files = Self::resolve_files(&db_tx, account_id, &[file_id]).await?;
            let file_ids: Vec<i32> = files.iter().map(|file| file.id).collect();

            link_files(&db_tx, &model, &file_ids, Utc::now()).await?;
            sync_join_columns(&db_tx, &model).await?;

            tracing::info!(account_id, ledger_id, file_id, "file attached to ledger entry");
            load_ledger(&db_tx, account_id, ledger_id).await
        })
    }
}

fn apply_prepared(active: &mut ledgers::ActiveModel, prepared: &PreparedLedger, now: DateTime<Utc>) {
    active.contact_id = ActiveValue::Set(prepared.contact.id);
    active.category_id = ActiveValue::Set(prepared.category.id);
    active.date = ActiveValue::Set(prepared.date);
    active.amount = ActiveValue::Set(prepared.amount);
    active.note = ActiveValue::Set(prepared.note.clone());
    active.updated_at = ActiveValue::Set(now);
}

/// Inserts the missing label join rows with their denormalized columns.
async fn link_labels(
    db_tx: &DatabaseTransaction,
    ledger: &ledgers::Model,
    label_ids: &[i32],
    now: DateTime<Utc>,
) -> ResultEngine<()> {
    for &label_id in label_ids {
        let row = labels_to_ledger::ActiveModel {
            account_id: ActiveValue::Set(ledger.account_id),
            label_id: ActiveValue::Set(label_id),
            ledger_id: ActiveValue::Set(ledger.id),
            created_at: ActiveValue::Set(now),
            updated_at: ActiveValue::Set(now),
            ..Default::default()
        };
        labels_to_ledger::Entity::insert(row)
            .on_conflict(
                OnConflict::columns([
                    labels_to_ledger::Column::LedgerId,
                    labels_to_ledger::Column::LabelId,
                ])
                .do_nothing()
                .to_owned(),
            )
            .exec_without_returning(db_tx)
            .await?;
    }
    Ok(())
}

/// Inserts the missing file join rows with their denormalized columns.
async fn link_files(
    db_tx: &DatabaseTransaction,
    ledger: &ledgers::Model,
    file_ids: &[i32],
    now: DateTime<Utc>,
) -> ResultEngine<()> {
    for &file_id in file_ids {
        let row = files_to_ledger::ActiveModel {
            account_id: ActiveValue::Set(ledger.account_id),
            file_id: ActiveValue::Set(file_id),
            ledger_id: ActiveValue::Set(ledger.id),
            created_at: ActiveValue::Set(now),
            updated_at: ActiveValue::Set(now),
            ..Default::default()
        };
        files_to_ledger::Entity::insert(row)
            .on_conflict(
                OnConflict::columns([
                    files_to_ledger::Column::LedgerId,
                    files_to_ledger::Column::FileId,
                ])
                .do_nothing()
                .to_owned(),
            )
            .exec_without_returning(db_tx)
            .await?;
    }
    Ok(())
}

/// Makes the ledger's label associations equal to `label_ids`, touching only
/// the rows that differ.
async fn replace_labels(
    db_tx: &DatabaseTransaction,
    ledger: &ledgers::Model,
    label_ids: &[i32],
    now: DateTime<Utc>,
) -> ResultEngine<()> {
    let wanted: HashSet<i32> = label_ids.iter().copied().collect();
    let current = labels_to_ledger::Entity::find()
        .filter(labels_to_ledger::Column::LedgerId.eq(ledger.id))
        .all(db_tx)
        .await?;

    let stale: Vec<i32> = current
        .iter()
        .filter(|row| !wanted.contains(&row.label_id))
        .map(|row| row.id)
        .collect();
    if !stale.is_empty() {
        labels_to_ledger::Entity::delete_many()
            .filter(labels_to_ledger::Column::Id.is_in(stale))
            .exec(db_tx)
            .await?;
    }

    let present: HashSet<i32> = current.iter().map(|row| row.label_id).collect();
    let missing: Vec<i32> = label_ids
        .iter()
        .copied()
        .filter(|id| !present.contains(id))
        .collect();
    link_labels(db_tx, ledger, &missing, now).await
}

/// Rewrites `account_id` on join rows of the ledger that disagree with it,
/// including rows written by other writers.
async fn sync_join_columns(db_tx: &DatabaseTransaction, ledger: &ledgers::Model) -> ResultEngine<()> {
    let labels = labels_to_ledger::Entity::update_many()
        .col_expr(
            labels_to_ledger::Column::AccountId,
            Expr::value(ledger.account_id),
        )
        .filter(labels_to_ledger::Column::LedgerId.eq(ledger.id))
        .filter(labels_to_ledger::Column::AccountId.ne(ledger.account_id))
        .exec(db_tx)
        .await?;

    let files = files_to_ledger::Entity::update_many()
        .col_expr(
            files_to_ledger::Column::AccountId,
            Expr::value(ledger.account_id),
        )
        .filter(files_to_ledger::Column::LedgerId.eq(ledger.id))
        .filter(files_to_ledger::Column::AccountId.ne(ledger.account_id))
        .exec(db_tx)
        .await?;

    let repaired = labels.rows_affected + files.rows_affected;
    if repaired > 0 {
        tracing::warn!(
            ledger_id = ledger.id,
            repaired,
            "join rows carried a foreign account id"
        );
    }
    Ok(())
}
