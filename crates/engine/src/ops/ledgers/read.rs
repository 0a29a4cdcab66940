use std::{
    collections::{BTreeSet, HashMap},
    future::Future,
};

use sea_orm::{ConnectionTrait, DbErr, QueryFilter, QueryOrder, prelude::*};

use crate::{
    Category, Contact, EngineError, File, Label, Ledger, ResultEngine, categories, contacts,
    files, files_to_ledger, labels, labels_to_ledger, ledgers, query::Preload,
};

use super::super::Engine;

/// Every association a ledger can eager-load.
pub const LEDGER_PRELOADS: [&str; 4] = ["Contact", "Category", "Labels", "Files"];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Association {
    Contact,
    Category,
    Labels,
    Files,
}

impl Association {
    fn parse(hint: &str) -> Option<Self> {
        match hint {
            "Contact" => Some(Self::Contact),
            "Category" => Some(Self::Category),
            "Labels" => Some(Self::Labels),
            "Files" => Some(Self::Files),
            _ => None,
        }
    }
}

impl Engine {
    /// Returns a ledger entry of the account with every association loaded.
    pub async fn ledger(&self, account_id: i32, ledger_id: i32) -> ResultEngine<Ledger> {
        load_ledger(&self.database, account_id, ledger_id).await
    }
}

impl Preload for ledgers::Entity {
    type Loaded = Ledger;

    fn preload<C>(
        db: &C,
        models: Vec<ledgers::Model>,
        hints: &[String],
    ) -> impl Future<Output = Vec<Ledger>>
    where
        C: ConnectionTrait,
    {
        attach_preloads(db, models, hints)
    }
}

pub(super) fn ledger_not_found() -> EngineError {
    EngineError::NotFound("Ledger entry not found.".to_string())
}

pub(super) async fn find_ledger_model<C>(
    db: &C,
    account_id: i32,
    ledger_id: i32,
) -> ResultEngine<ledgers::Model>
where
    C: ConnectionTrait,
{
    ledgers::Entity::find_by_id(ledger_id)
        .filter(ledgers::Column::AccountId.eq(account_id))
        .one(db)
        .await?
        .ok_or_else(ledger_not_found)
}

pub(super) async fn load_ledger<C>(db: &C, account_id: i32, ledger_id: i32) -> ResultEngine<Ledger>
where
    C: ConnectionTrait,
{
    let model = find_ledger_model(db, account_id, ledger_id).await?;
    attach_preloads(db, vec![model], &LEDGER_PRELOADS[..])
        .await
        .pop()
        .ok_or_else(ledger_not_found)
}

/// Builds ledger aggregates, loading the requested associations in one query
/// per association. Unknown hints and failed loads are logged and leave the
/// association empty.
async fn attach_preloads<C, S>(
    db: &C,
    models: Vec<ledgers::Model>,
    hints: &[S],
) -> Vec<Ledger>
where
    C: ConnectionTrait,
    S: AsRef<str>,
{
    let mut ledgers: Vec<Ledger> = models.into_iter().map(Ledger::from).collect();
    if ledgers.is_empty() {
        return ledgers;
    }

    for hint in hints {
        let hint = hint.as_ref();
        let result = match Association::parse(hint) {
            Some(Association::Contact) => preload_contacts(db, &mut ledgers).await,
            Some(Association::Category) => preload_categories(db, &mut ledgers).await,
            Some(Association::Labels) => preload_labels(db, &mut ledgers).await,
            Some(Association::Files) => preload_files(db, &mut ledgers).await,
            None => {
                tracing::debug!(hint, "unknown ledger preload skipped");
                continue;
            }
        };
        if let Err(err) = result {
            tracing::warn!(hint, "ledger preload failed: {err}");
        }
    }

    ledgers
}

fn distinct_ids(ids: impl Iterator<Item = i32>) -> Vec<i32> {
    ids.collect::<BTreeSet<_>>().into_iter().collect()
}

async fn preload_contacts<C>(db: &C, ledgers: &mut [Ledger]) -> Result<(), DbErr>
where
    C: ConnectionTrait,
{
    let ids = distinct_ids(ledgers.iter().map(|ledger| ledger.contact_id));
    let by_id: HashMap<i32, Contact> = contacts::Entity::find()
        .filter(contacts::Column::Id.is_in(ids))
        .all(db)
        .await?
        .into_iter()
        .map(|model| (model.id, Contact::from(model)))
        .collect();

    for ledger in ledgers.iter_mut() {
        ledger.contact = by_id.get(&ledger.contact_id).cloned();
    }
    Ok(())
}

async fn preload_categories<C>(db: &C, ledgers: &mut [Ledger]) -> Result<(), DbErr>
where
    C: ConnectionTrait,
{
    let ids = distinct_ids(ledgers.iter().map(|ledger| ledger.category_id));
    let by_id: HashMap<i32, Category> = categories::Entity::find()
        .filter(categories::Column::Id.is_in(ids))
        .all(db)
        .await?
        .into_iter()
        .map(|model| (model.id, Category::from(model)))
        .collect();

    for ledger in ledgers.iter_mut() {
        ledger.category = by_id.get(&ledger.category_id).cloned();
    }
    Ok(())
}

async fn preload_labels<C>(db: &C, ledgers: &mut [Ledger]) -> Result<(), DbErr>
where
    C: ConnectionTrait,
{
    let ledger_ids = distinct_ids(ledgers.iter().map(|ledger| ledger.id));
    let rows = labels_to_ledger::Entity::find()
        .filter(labels_to_ledger::Column::LedgerId.is_in(ledger_ids))
        .order_by_asc(labels_to_ledger::Column::Id)
        .all(db)
        .await?;

    let label_ids = distinct_ids(rows.iter().map(|row| row.label_id));
    let by_id: HashMap<i32, Label> = labels::Entity::find()
        .filter(labels::Column::Id.is_in(label_ids))
        .all(db)
        .await?
        .into_iter()
        .map(|model| (model.id, Label::from(model)))
        .collect();

    let mut per_ledger: HashMap<i32, Vec<Label>> = HashMap::new();
    for row in &rows {
        if let Some(label) = by_id.get(&row.label_id) {
            per_ledger
                .entry(row.ledger_id)
                .or_default()
                .push(label.clone());
        }
    }

    for ledger in ledgers.iter_mut() {
        ledger.labels = per_ledger.remove(&ledger.id).unwrap_or_default();
    }
    Ok(())
}

async fn preload_files<C>(db: &C, ledgers: &mut [Ledger]) -> Result<(), DbErr>
where
    C: ConnectionTrait,
{
    let ledger_ids = distinct_ids(ledgers.iter().map(|ledger| ledger.id));
    let rows = files_to_ledger::Entity::find()
        .filter(files_to_ledger::Column::LedgerId.is_in(ledger_ids))
        .order_by_asc(files_to_ledger::Column::Id)
        .all(db)
        .await?;

    let file_ids = distinct_ids(rows.iter().map(|row| row.file_id));
    let by_id: HashMap<i32, File> = files::Entity::find()
        .filter(files::Column::Id.is_in(file_ids))
        .all(db)
        .await?
        .into_iter()
        .map(|model| (model.id, File::from(model)))
        .collect();

    let mut per_ledger: HashMap<i32, Vec<File>> = HashMap::new();
    for row in &rows {
        if let Some(file) = by_id.get(&row.file_id) {
            per_ledger
                .entry(row.ledger_id)
                .or_default()
                .push(file.clone());
        }
    }

    for ledger in ledgers.iter_mut() {
        ledger.files = per_ledger.remove(&ledger.id).unwrap_or_default();
    }
    Ok(())
}
