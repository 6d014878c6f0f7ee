//! Create `deployment_files` table: documentation attached to a deployment.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(DeploymentFiles::Table)
                    .if_not_exists()
                    .col(uuid(DeploymentFiles::Id).primary_key())
                    .col(uuid(DeploymentFiles::DeploymentId).not_null())
                    .col(string_len(DeploymentFiles::FileName, 255).not_null())
                    .col(string_len(DeploymentFiles::FilePath, 1024).not_null())
                    .col(string_len(DeploymentFiles::FileType, 16).not_null())
                    .col(big_integer(DeploymentFiles::FileSize).not_null())
                    .col(uuid_null(DeploymentFiles::UploadedBy))
                    .col(timestamp_with_time_zone(DeploymentFiles::UploadedAt).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_deployment_files_deployment")
                            .from(DeploymentFiles::Table, DeploymentFiles::DeploymentId)
                            .to(Deployments::Table, Deployments::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_deployment_files_uploaded_by")
                            .from(DeploymentFiles::Table, DeploymentFiles::UploadedBy)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(DeploymentFiles::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum DeploymentFiles {
    Table,
    Id,
    DeploymentId,
    FileName,
    FilePath,
    FileType,
    FileSize,
    UploadedBy,
    UploadedAt,
}

#[derive(DeriveIden)]
enum Deployments { Table, Id }

#[derive(DeriveIden)]
enum Users { Table, Id }
