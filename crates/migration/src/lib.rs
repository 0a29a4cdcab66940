pub use sea_orm_migration::prelude::*;

mod m20260105_000001_contacts;
mod m20260105_000002_categories;
mod m20260105_000003_labels;
mod m20260105_000004_files;
mod m20260105_000005_ledgers;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260105_000001_contacts::Migration),
            Box::new(m20260105_000002_categories::Migration),
            Box::new(m20260105_000003_labels::Migration),
            Box::new(m20260105_000004_files::Migration),
            Box::new(m20260105_000005_ledgers::Migration),
        ]
    }
}
