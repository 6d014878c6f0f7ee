//! Enforce one row per `(service_id, version)`.
//!
//! Databases created before the constraint may already hold duplicates, so
//! `up` first renames them: within each group the newest row keeps its version
//! and older rows become `<version>-duplicate-<n>`, n counting from 1 in
//! descending `created_at` order. `version` is widened first so the suffix
//! fits even on a maximum-length version; `down` leaves the width alone since
//! renamed rows may no longer fit the old limit.
use sea_orm_migration::prelude::*;
use tracing::info;

pub const CONSTRAINT_NAME: &str = "unique_service_version";

/// Room for a 64-char version plus `-duplicate-<n>`.
pub const VERSION_COLUMN_LEN: u32 = 128;

const RENAME_DUPLICATES: &str = r#"
WITH ranked AS (
    SELECT id,
           version,
           ROW_NUMBER() OVER (
               PARTITION BY service_id, version
               ORDER BY created_at DESC, id
           ) - 1 AS dup_index
    FROM deployments
)
UPDATE deployments AS d
SET version = r.version || '-duplicate-' || r.dup_index
FROM ranked AS r
WHERE d.id = r.id AND r.dup_index > 0
"#;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .alter_table(
                Table::alter()
                    .table(Deployments::Table)
                    .modify_column(ColumnDef::new(Deployments::Version).string_len(VERSION_COLUMN_LEN).not_null())
                    .to_owned(),
            )
            .await?;

        let renamed = manager
            .get_connection()
            .execute_unprepared(RENAME_DUPLICATES)
            .await?
            .rows_affected();
        if renamed > 0 {
            info!(renamed, constraint = CONSTRAINT_NAME, "renamed duplicate deployment versions");
        }

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name(CONSTRAINT_NAME)
                    .table(Deployments::Table)
                    .col(Deployments::ServiceId)
                    .col(Deployments::Version)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name(CONSTRAINT_NAME).table(Deployments::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Deployments { Table, ServiceId, Version }
