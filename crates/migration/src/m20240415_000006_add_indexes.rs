use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Deployments: history lookups per service, newest first
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_deployments_service_created")
                    .table(Deployments::Table)
                    .col(Deployments::ServiceId)
                    .col(Deployments::CreatedAt)
                    .to_owned(),
            )
            .await?;

        // DeploymentFiles: files per deployment
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_deployment_files_deployment")
                    .table(DeploymentFiles::Table)
                    .col(DeploymentFiles::DeploymentId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_deployments_service_created")
                    .table(Deployments::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_index(
                Index::drop()
                    .name("idx_deployment_files_deployment")
                    .table(DeploymentFiles::Table)
                    .to_owned(),
            )
            .await
    }
}

#[derive(DeriveIden)]
enum Deployments { Table, ServiceId, CreatedAt }

#[derive(DeriveIden)]
enum DeploymentFiles { Table, DeploymentId }
