use chrono::{NaiveDate, Utc};
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Statement};

use engine::{
    CategoryDraft, ContactDraft, Engine, EngineError, EntryKind, LabelDraft, LedgerDraft,
    LedgerListFilter,
};
use migration::MigratorTrait;

async fn engine_with_db() -> (Engine, DatabaseConnection) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder()
        .database(db.clone())
        .build()
        .await
        .unwrap();
    (engine, db)
}

async fn count(db: &DatabaseConnection, sql: &str) -> i64 {
    let row = db
        .query_one(Statement::from_string(db.get_database_backend(), sql))
        .await
        .unwrap()
        .unwrap();
    row.try_get::<i64>("", "n").unwrap()
}

async fn insert_file(db: &DatabaseConnection, account_id: i32, name: &str) -> i32 {
    let now = Utc::now();
    let backend = db.get_database_backend();
    db.execute(Statement::from_sql_and_values(
        backend,
        "INSERT INTO files (account_id, name, path, mime_type, size, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?)",
        vec![
            account_id.into(),
            name.into(),
            format!("accounts/{account_id}/{name}").into(),
            "application/pdf".into(),
            1024_i64.into(),
            now.into(),
            now.into(),
        ],
    ))
    .await
    .unwrap();
    let row = db
        .query_one(Statement::from_string(
            backend,
            "SELECT MAX(id) AS n FROM files",
        ))
        .await
        .unwrap()
        .unwrap();
    row.try_get::<i32>("", "n").unwrap()
}

fn day(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

fn expense(account_id: i32, contact: &str) -> LedgerDraft {
    LedgerDraft::new(
        account_id,
        7,
        day(2024, 3, 14),
        -42.5,
        ContactDraft::named(contact),
        CategoryDraft::new("Office", "1"),
    )
}

#[tokio::test]
async fn creates_ledger_with_all_associations() {
    let (engine, db) = engine_with_db().await;
    let file_id = insert_file(&db, 1, "receipt.pdf").await;

    let ledger = engine
        .create_ledger(
            expense(1, " Acme Corp ")
                .note(" paper ")
                .label("Q1")
                .label("Travel")
                .file(file_id),
        )
        .await
        .unwrap();

    assert_eq!(ledger.account_id, 1);
    assert_eq!(ledger.added_by_id, 7);
    assert_eq!(ledger.note, "paper");
    assert_eq!(ledger.date, day(2024, 3, 14));
    let contact = ledger.contact.unwrap();
    assert_eq!(contact.name, "Acme Corp");
    assert_eq!(contact.kind, "Both");
    assert_eq!(ledger.category.unwrap().kind, "1");
    let labels: Vec<&str> = ledger.labels.iter().map(|l| l.name.as_str()).collect();
    assert_eq!(labels, ["Q1", "Travel"]);
    assert_eq!(ledger.files.len(), 1);
    assert_eq!(ledger.files[0].id, file_id);

    assert_eq!(engine.ledger(1, ledger.id).await.unwrap().id, ledger.id);
}

#[tokio::test]
async fn contacts_are_shared_within_an_account_only() {
    let (engine, db) = engine_with_db().await;

    let first = engine.create_ledger(expense(1, "Acme Corp")).await.unwrap();
    let second = engine.create_ledger(expense(1, "Acme Corp")).await.unwrap();
    let other = engine.create_ledger(expense(2, "Acme Corp")).await.unwrap();

    assert_eq!(first.contact_id, second.contact_id);
    assert_eq!(first.category_id, second.category_id);
    assert_ne!(first.contact_id, other.contact_id);
    assert_eq!(count(&db, "SELECT COUNT(*) AS n FROM contacts").await, 2);
    assert_eq!(count(&db, "SELECT COUNT(*) AS n FROM categories").await, 2);
}

#[tokio::test]
async fn person_contacts_match_on_first_and_last_name() {
    let (engine, db) = engine_with_db().await;

    let mut draft = expense(1, "");
    draft.contact = ContactDraft::person("Jane", "Doe");
    let first = engine.create_ledger(draft.clone()).await.unwrap();
    let second = engine.create_ledger(draft).await.unwrap();

    assert_eq!(first.contact_id, second.contact_id);
    assert_eq!(count(&db, "SELECT COUNT(*) AS n FROM contacts").await, 1);
}

#[tokio::test]
async fn contact_id_updates_the_stored_contact() {
    let (engine, _db) = engine_with_db().await;
    let created = engine.create_ledger(expense(1, "Acme")).await.unwrap();

    let mut draft = expense(1, "Acme Holdings");
    draft.contact = ContactDraft::named("Acme Holdings")
        .id(created.contact_id)
        .email("billing@acme.test");
    let updated = engine.update_ledger(created.id, draft).await.unwrap();

    assert_eq!(updated.contact_id, created.contact_id);
    let contact = updated.contact.unwrap();
    assert_eq!(contact.name, "Acme Holdings");
    assert_eq!(contact.email, "billing@acme.test");
}

#[tokio::test]
async fn contact_merge_keeps_untouched_fields() {
    let (engine, db) = engine_with_db().await;
    let created = engine.create_ledger(expense(1, "Acme")).await.unwrap();
    db.execute(Statement::from_string(
        db.get_database_backend(),
        "UPDATE contacts SET address = '1 Main', avatar = 'a.png'",
    ))
    .await
    .unwrap();

    let mut draft = expense(1, "Acme2");
    draft.contact = ContactDraft::named("Acme2").id(created.contact_id);
    let updated = engine.update_ledger(created.id, draft).await.unwrap();

    let contact = updated.contact.unwrap();
    assert_eq!(contact.id, created.contact_id);
    assert_eq!(contact.name, "Acme2");
    assert_eq!(contact.address, "1 Main");
    assert_eq!(contact.avatar, "a.png");
}

#[tokio::test]
async fn update_replaces_the_label_set() {
    let (engine, db) = engine_with_db().await;
    let created = engine
        .create_ledger(expense(1, "Acme").label("A").label("B"))
        .await
        .unwrap();
    assert_eq!(created.labels.len(), 2);

    let updated = engine
        .update_ledger(created.id, expense(1, "Acme").label("C"))
        .await
        .unwrap();

    let labels: Vec<&str> = updated.labels.iter().map(|l| l.name.as_str()).collect();
    assert_eq!(labels, ["C"]);
    assert_eq!(
        count(&db, "SELECT COUNT(*) AS n FROM labels_to_ledger").await,
        1
    );
    assert_eq!(count(&db, "SELECT COUNT(*) AS n FROM labels").await, 3);
}

#[tokio::test]
async fn kept_label_links_keep_their_creation_time() {
    let (engine, db) = engine_with_db().await;
    let created = engine
        .create_ledger(expense(1, "Acme").label("A"))
        .await
        .unwrap();
    db.execute(Statement::from_string(
        db.get_database_backend(),
        "UPDATE labels_to_ledger SET created_at = '2000-01-01 00:00:00+00:00'",
    ))
    .await
    .unwrap();

    engine
        .update_ledger(created.id, expense(1, "Acme").label("A").label("B"))
        .await
        .unwrap();

    assert_eq!(
        count(
            &db,
            "SELECT COUNT(*) AS n FROM labels_to_ledger \
             WHERE created_at = '2000-01-01 00:00:00+00:00'"
        )
        .await,
        1
    );
    assert_eq!(
        count(&db, "SELECT COUNT(*) AS n FROM labels_to_ledger").await,
        2
    );
}

#[tokio::test]
async fn duplicate_labels_in_one_write_link_once() {
    let (engine, _db) = engine_with_db().await;
    let label = engine.create_label(1, "Travel").await.unwrap();

    let mut draft = expense(1, "Acme").label("Travel");
    draft.labels.push(LabelDraft {
        id: Some(label.id),
        ..LabelDraft::default()
    });
    let ledger = engine.create_ledger(draft).await.unwrap();

    assert_eq!(ledger.labels.len(), 1);
    assert_eq!(ledger.labels[0].id, label.id);
}

#[tokio::test]
async fn join_rows_carry_the_ledger_account() {
    let (engine, db) = engine_with_db().await;
    let file_id = insert_file(&db, 4, "scan.png").await;
    let ledger = engine
        .create_ledger(expense(4, "Acme").label("Q1").file(file_id))
        .await
        .unwrap();

    assert_eq!(
        count(
            &db,
            "SELECT COUNT(*) AS n FROM labels_to_ledger WHERE account_id <> 4"
        )
        .await,
        0
    );
    assert_eq!(
        count(
            &db,
            "SELECT COUNT(*) AS n FROM files_to_ledger WHERE account_id = 4"
        )
        .await,
        1
    );

    // Rows written with a foreign account are repaired on the next write.
    db.execute(Statement::from_string(
        db.get_database_backend(),
        "UPDATE labels_to_ledger SET account_id = 99",
    ))
    .await
    .unwrap();
    engine
        .update_ledger(ledger.id, expense(4, "Acme").label("Q1"))
        .await
        .unwrap();
    assert_eq!(
        count(
            &db,
            "SELECT COUNT(*) AS n FROM labels_to_ledger WHERE account_id = 4"
        )
        .await,
        1
    );
}

#[tokio::test]
async fn files_are_only_added_on_update() {
    let (engine, db) = engine_with_db().await;
    let first = insert_file(&db, 1, "a.pdf").await;
    let second = insert_file(&db, 1, "b.pdf").await;

    let created = engine
        .create_ledger(expense(1, "Acme").file(first))
        .await
        .unwrap();
    let updated = engine
        .update_ledger(created.id, expense(1, "Acme").file(second))
        .await
        .unwrap();
    assert_eq!(updated.files.len(), 2);

    let attached = engine.add_file_to_ledger(1, created.id, first).await.unwrap();
    assert_eq!(attached.files.len(), 2);
}

#[tokio::test]
async fn foreign_file_rolls_back_the_whole_write() {
    let (engine, db) = engine_with_db().await;
    let foreign = insert_file(&db, 2, "theirs.pdf").await;

    let err = engine
        .create_ledger(expense(1, "Acme").label("Q1").file(foreign))
        .await
        .unwrap_err();

    assert_eq!(err, EngineError::NotFound("File not found.".to_string()));
    assert_eq!(count(&db, "SELECT COUNT(*) AS n FROM contacts").await, 0);
    assert_eq!(count(&db, "SELECT COUNT(*) AS n FROM labels").await, 0);
    assert_eq!(count(&db, "SELECT COUNT(*) AS n FROM ledgers").await, 0);
}

#[tokio::test]
async fn validation_runs_before_any_write() {
    let (engine, db) = engine_with_db().await;

    let mut draft = expense(1, "Acme");
    draft.amount = 0.0;
    draft.category = CategoryDraft::new("", "1");
    let Err(EngineError::Validation(errors)) = engine.create_ledger(draft).await else {
        panic!("expected validation errors");
    };

    assert_eq!(errors.get("amount"), Some("The amount field is required."));
    assert_eq!(errors.get("category"), Some("Category name is required."));
    assert_eq!(count(&db, "SELECT COUNT(*) AS n FROM contacts").await, 0);
}

#[tokio::test]
async fn ledgers_are_scoped_to_their_account() {
    let (engine, _db) = engine_with_db().await;
    let ledger = engine.create_ledger(expense(1, "Acme")).await.unwrap();

    let not_found = || Some(EngineError::NotFound("Ledger entry not found.".to_string()));
    assert_eq!(engine.ledger(2, ledger.id).await.err(), not_found());
    assert_eq!(
        engine
            .update_ledger(ledger.id, expense(2, "Acme"))
            .await
            .err(),
        not_found()
    );
    assert_eq!(engine.delete_ledger(2, ledger.id).await.err(), not_found());
}

#[tokio::test]
async fn category_id_from_another_account_is_rejected() {
    let (engine, _db) = engine_with_db().await;
    let theirs = engine.create_category(2, "Sales", "2").await.unwrap();

    let mut draft = expense(1, "Acme");
    draft.category = CategoryDraft::new("Sales", "2").id(theirs.id);
    assert_eq!(
        engine.create_ledger(draft).await.err(),
        Some(EngineError::NotFound("Category not found.".to_string()))
    );
}

#[tokio::test]
async fn delete_leaves_no_join_rows() {
    let (engine, db) = engine_with_db().await;
    let file_id = insert_file(&db, 1, "receipt.pdf").await;
    let ledger = engine
        .create_ledger(expense(1, "Acme").label("Q1").file(file_id))
        .await
        .unwrap();

    engine.delete_ledger(1, ledger.id).await.unwrap();

    assert_eq!(count(&db, "SELECT COUNT(*) AS n FROM ledgers").await, 0);
    assert_eq!(
        count(&db, "SELECT COUNT(*) AS n FROM labels_to_ledger").await,
        0
    );
    assert_eq!(
        count(&db, "SELECT COUNT(*) AS n FROM files_to_ledger").await,
        0
    );
    assert_eq!(count(&db, "SELECT COUNT(*) AS n FROM labels").await, 1);
}

#[tokio::test]
async fn category_and_label_names_are_unique_per_account() {
    let (engine, _db) = engine_with_db().await;

    engine.create_category(1, "Rent", "1").await.unwrap();
    let Err(EngineError::Validation(errors)) = engine.create_category(1, " rent ", "1").await
    else {
        panic!("expected duplicate category");
    };
    assert_eq!(errors.get("name"), Some("Category name is already in use."));
    engine.create_category(1, "Rent", "2").await.unwrap();
    engine.create_category(2, "Rent", "1").await.unwrap();

    let Err(EngineError::Validation(errors)) = engine.create_category(1, "", "3").await else {
        panic!("expected invalid category");
    };
    assert_eq!(errors.get("name"), Some("The name field is required."));
    assert_eq!(errors.get("type"), Some("The type field must be 1, or 2."));

    engine.create_label(1, "Travel").await.unwrap();
    let Err(EngineError::Validation(errors)) = engine.create_label(1, "TRAVEL").await else {
        panic!("expected duplicate label");
    };
    assert_eq!(errors.get("name"), Some("Label name is already in use."));
    engine.create_label(2, "Travel").await.unwrap();
}

#[tokio::test]
async fn lists_ledgers_with_filters() {
    let (engine, _db) = engine_with_db().await;
    let income = engine
        .create_ledger(LedgerDraft::new(
            1,
            7,
            day(2023, 6, 1),
            1500.0,
            ContactDraft::named("Big Client"),
            CategoryDraft::new("Sales", "2"),
        ))
        .await
        .unwrap();
    let travel = engine
        .create_ledger(expense(1, "Airline").label("Travel"))
        .await
        .unwrap();
    let mut diner = expense(1, "Bobs Diner");
    diner.date = Some(day(2024, 8, 2));
    let diner = engine.create_ledger(diner).await.unwrap();
    engine.create_ledger(expense(2, "Airline")).await.unwrap();

    let all = engine
        .list_ledgers(1, &LedgerListFilter::default())
        .await
        .unwrap();
    let ids: Vec<i32> = all.items.iter().map(|l| l.id).collect();
    assert_eq!(ids, [diner.id, travel.id, income.id]);
    assert_eq!(all.meta.no_limit_count, 3);
    assert!(all.items.iter().all(|l| l.contact.is_some()));

    let expenses = engine
        .list_ledgers(
            1,
            &LedgerListFilter {
                kind: Some(EntryKind::Expense),
                ..LedgerListFilter::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(expenses.meta.no_limit_count, 2);

    let in_2023 = engine
        .list_ledgers(
            1,
            &LedgerListFilter {
                year: Some(2023),
                ..LedgerListFilter::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(in_2023.items.len(), 1);
    assert_eq!(in_2023.items[0].id, income.id);

    let labelled = engine
        .list_ledgers(
            1,
            &LedgerListFilter {
                label_ids: Some(vec![travel.labels[0].id]),
                ..LedgerListFilter::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(labelled.items.len(), 1);
    assert_eq!(labelled.items[0].id, travel.id);

    let no_labels = engine
        .list_ledgers(
            1,
            &LedgerListFilter {
                label_ids: Some(Vec::new()),
                ..LedgerListFilter::default()
            },
        )
        .await
        .unwrap();
    assert!(no_labels.items.is_empty());
    assert_eq!(no_labels.meta.no_limit_count, 0);

    let searched = engine
        .list_ledgers(
            1,
            &LedgerListFilter {
                search: "diner".to_string(),
                ..LedgerListFilter::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(searched.items.len(), 1);
    assert_eq!(searched.items[0].id, diner.id);

    let nothing = engine
        .list_ledgers(
            1,
            &LedgerListFilter {
                search: "nobody".to_string(),
                ..LedgerListFilter::default()
            },
        )
        .await
        .unwrap();
    assert!(nothing.items.is_empty());
    assert_eq!(nothing.meta.no_limit_count, 0);

    let bad_order = engine
        .list_ledgers(
            1,
            &LedgerListFilter {
                order: "amount".to_string(),
                ..LedgerListFilter::default()
            },
        )
        .await;
    assert_eq!(
        bad_order.err(),
        Some(EngineError::InvalidParameter("order".to_string()))
    );
}
