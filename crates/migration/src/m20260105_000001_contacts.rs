use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
pub enum Contacts {
    Table,
    Id,
    AccountId,
    Name,
    FirstName,
    LastName,
    Email,
    Kind,
    Address,
    City,
    State,
    Zip,
    Country,
    Phone,
    Website,
    Avatar,
    CreatedAt,
    UpdatedAt,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let mut table = Table::create();
        table
            .table(Contacts::Table)
            .if_not_exists()
            .col(
                ColumnDef::new(Contacts::Id)
                    .integer()
                    .not_null()
                    .auto_increment()
                    .primary_key(),
            )
            .col(ColumnDef::new(Contacts::AccountId).integer().not_null());

        // Free-form text columns share the same shape.
        for column in [
            Contacts::Name,
            Contacts::FirstName,
            Contacts::LastName,
            Contacts::Email,
            Contacts::Address,
            Contacts::City,
            Contacts::State,
            Contacts::Zip,
            Contacts::Country,
            Contacts::Phone,
            Contacts::Website,
            Contacts::Avatar,
        ] {
            table.col(ColumnDef::new(column).string().not_null().default(""));
        }

        table
            .col(
                ColumnDef::new(Contacts::Kind)
                    .string()
                    .not_null()
                    .default("Both"),
            )
            .col(
                ColumnDef::new(Contacts::CreatedAt)
                    .timestamp_with_time_zone()
                    .not_null(),
            )
            .col(
                ColumnDef::new(Contacts::UpdatedAt)
                    .timestamp_with_time_zone()
                    .not_null(),
            );

        manager.create_table(table.to_owned()).await?;

        // Natural key used by the ledger upsert find-or-create.
        manager
            .create_index(
                Index::create()
                    .name("idx-contacts-account_id-name-first_name-last_name-unique")
                    .table(Contacts::Table)
                    .col(Contacts::AccountId)
                    .col(Contacts::Name)
                    .col(Contacts::FirstName)
                    .col(Contacts::LastName)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Contacts::Table).to_owned())
            .await
    }
}
