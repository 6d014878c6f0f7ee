//! Create `deployments` table.
//!
//! Rows cascade away with their service; the creator reference is nulled
//! when the user is removed.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Deployments::Table)
                    .if_not_exists()
                    .col(uuid(Deployments::Id).primary_key())
                    .col(uuid(Deployments::ServiceId).not_null())
                    .col(string_len(Deployments::Version, 64).not_null())
                    .col(text_null(Deployments::Changes))
                    .col(string_len(Deployments::BranchName, 255).not_null().default("main"))
                    .col(uuid_null(Deployments::CreatedBy))
                    .col(timestamp_with_time_zone(Deployments::CreatedAt).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_deployments_service")
                            .from(Deployments::Table, Deployments::ServiceId)
                            .to(Services::Table, Services::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_deployments_created_by")
                            .from(Deployments::Table, Deployments::CreatedBy)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Deployments::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Deployments { Table, Id, ServiceId, Version, Changes, BranchName, CreatedBy, CreatedAt }

#[derive(DeriveIden)]
enum Services { Table, Id }

#[derive(DeriveIden)]
enum Users { Table, Id }
