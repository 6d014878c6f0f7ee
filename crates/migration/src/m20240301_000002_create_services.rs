//! Create `services` table with a nullable FK to the creating user.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Services::Table)
                    .if_not_exists()
                    .col(uuid(Services::Id).primary_key())
                    .col(string_len(Services::Name, 255).not_null())
                    .col(text_null(Services::Description))
                    .col(string_len_null(Services::Application, 3))
                    .col(uuid_null(Services::CreatedBy))
                    .col(timestamp_with_time_zone(Services::CreatedAt).not_null())
                    .col(timestamp_with_time_zone(Services::UpdatedAt).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_services_created_by")
                            .from(Services::Table, Services::CreatedBy)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Services::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Services { Table, Id, Name, Description, Application, CreatedBy, CreatedAt, UpdatedAt }

#[derive(DeriveIden)]
enum Users { Table, Id }
