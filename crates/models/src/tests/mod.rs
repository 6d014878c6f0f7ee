/// CRUD operations tests for all models
pub mod crud_tests;


use migration::MigratorTrait;
use sea_orm::DatabaseConnection;
use tokio::sync::OnceCell;

static MIGRATED: OnceCell<()> = OnceCell::const_new();

/// Connect and migrate once per process. `None` means no database is configured
/// (or `SKIP_DB_TESTS` is set) and the calling test should return early.
pub(crate) async fn test_db() -> Option<DatabaseConnection> {
    if std::env::var("SKIP_DB_TESTS").is_ok() || std::env::var("DATABASE_URL").is_err() {
        eprintln!("skip: DATABASE_URL not set");
        return None;
    }
    MIGRATED
        .get_or_init(|| async {
            let db = crate::db::connect().await.expect("connect db for migration");
            migration::Migrator::up(&db, None).await.expect("migrate up");
        })
        .await;
    Some(crate::db::connect().await.expect("connect db"))
}
