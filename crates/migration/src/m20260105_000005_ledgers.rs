use sea_orm_migration::prelude::*;

use crate::{
    m20260105_000001_contacts::Contacts, m20260105_000002_categories::Categories,
    m20260105_000003_labels::Labels, m20260105_000004_files::Files,
};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
enum Ledgers {
    Table,
    Id,
    AccountId,
    AddedById,
    ContactId,
    CategoryId,
    Date,
    Amount,
    Note,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum LabelsToLedger {
    Table,
    Id,
    AccountId,
    LabelId,
    LedgerId,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum FilesToLedger {
    Table,
    Id,
    AccountId,
    FileId,
    LedgerId,
    CreatedAt,
    UpdatedAt,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Ledgers::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Ledgers::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Ledgers::AccountId).integer().not_null())
                    .col(ColumnDef::new(Ledgers::AddedById).integer().not_null())
                    .col(ColumnDef::new(Ledgers::ContactId).integer().not_null())
                    .col(ColumnDef::new(Ledgers::CategoryId).integer().not_null())
                    .col(ColumnDef::new(Ledgers::Date).date().not_null())
                    .col(ColumnDef::new(Ledgers::Amount).double().not_null())
                    .col(ColumnDef::new(Ledgers::Note).text().not_null().default(""))
                    .col(
                        ColumnDef::new(Ledgers::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Ledgers::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-ledgers-contact_id")
                            .from(Ledgers::Table, Ledgers::ContactId)
                            .to(Contacts::Table, Contacts::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-ledgers-category_id")
                            .from(Ledgers::Table, Ledgers::CategoryId)
                            .to(Categories::Table, Categories::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-ledgers-account_id-date")
                    .table(Ledgers::Table)
                    .col(Ledgers::AccountId)
                    .col(Ledgers::Date)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(LabelsToLedger::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(LabelsToLedger::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(LabelsToLedger::AccountId)
                            .integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(LabelsToLedger::LabelId).integer().not_null())
                    .col(
                        ColumnDef::new(LabelsToLedger::LedgerId)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(LabelsToLedger::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(LabelsToLedger::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-labels_to_ledger-label_id")
                            .from(LabelsToLedger::Table, LabelsToLedger::LabelId)
                            .to(Labels::Table, Labels::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-labels_to_ledger-ledger_id")
                            .from(LabelsToLedger::Table, LabelsToLedger::LedgerId)
                            .to(Ledgers::Table, Ledgers::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-labels_to_ledger-ledger_id-label_id-unique")
                    .table(LabelsToLedger::Table)
                    .col(LabelsToLedger::LedgerId)
                    .col(LabelsToLedger::LabelId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(FilesToLedger::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(FilesToLedger::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(FilesToLedger::AccountId).integer().not_null())
                    .col(ColumnDef::new(FilesToLedger::FileId).integer().not_null())
                    .col(ColumnDef::new(FilesToLedger::LedgerId).integer().not_null())
                    .col(
                        ColumnDef::new(FilesToLedger::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(FilesToLedger::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-files_to_ledger-file_id")
                            .from(FilesToLedger::Table, FilesToLedger::FileId)
                            .to(Files::Table, Files::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-files_to_ledger-ledger_id")
                            .from(FilesToLedger::Table, FilesToLedger::LedgerId)
                            .to(Ledgers::Table, Ledgers::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-files_to_ledger-ledger_id-file_id-unique")
                    .table(FilesToLedger::Table)
                    .col(FilesToLedger::LedgerId)
                    .col(FilesToLedger::FileId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(FilesToLedger::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(LabelsToLedger::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Ledgers::Table).to_owned())
            .await?;
        Ok(())
    }
}
