//! Operator commands: schema migrations and admin bootstrap.

use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use migration::MigratorTrait;
use tracing::info;

use service::auth::repo::seaorm::SeaOrmAuthRepository;
use service::auth::service::{AuthConfig, AuthService};

#[derive(Parser, Debug)]
#[command(name = "dbctl", author, version, about = "Deploy tracker database tooling")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Apply all pending migrations
    Migrate,
    /// Revert applied migrations
    Rollback {
        /// How many migrations to revert
        #[arg(long, default_value_t = 1)]
        steps: u32,
    },
    /// Create an admin, or reset its password and promote it if the email exists
    SeedAdmin {
        #[arg(long, env = "ADMIN_EMAIL")]
        email: String,
        #[arg(long, env = "ADMIN_PASSWORD")]
        password: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    let cli = Cli::parse();
    let cfg = configs::AppConfig::load_or_env().context("load configuration")?;
    common::utils::logging::init_logging(cfg.log.json);

    let db = models::db::connect_with_config(&cfg.database)
        .await
        .context("connect database")?;

    match cli.command {
        Command::Migrate => {
            migration::Migrator::up(&db, None).await?;
            info!(event = "migrate", "migrations applied");
        }
        Command::Rollback { steps } => {
            migration::Migrator::down(&db, Some(steps)).await?;
            info!(event = "rollback", steps, "migrations reverted");
        }
        Command::SeedAdmin { email, password } => {
            let svc = AuthService::new(
                Arc::new(SeaOrmAuthRepository { db: db.clone() }),
                AuthConfig { jwt_secret: cfg.auth.jwt_secret.clone(), token_ttl_hours: cfg.auth.token_ttl_hours },
            );
            let admin = svc.seed_admin(&email, &password).await?;
            info!(event = "seed_admin", user_id = %admin.id, email = %admin.email, "admin ready");
        }
    }
    Ok(())
}
