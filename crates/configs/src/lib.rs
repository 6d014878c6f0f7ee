use anyhow::Result;
use serde::Deserialize;
use anyhow::anyhow;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub worker_threads: Option<usize>,
    /// Prebuilt frontend bundle served at `/` when present.
    #[serde(default)]
    pub static_dir: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "127.0.0.1".into(), port: 5000, worker_threads: None, static_dir: None }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,
    #[serde(default = "default_max_lifetime")]
    pub max_lifetime_secs: u64,
    #[serde(default = "default_acquire_timeout")]
    pub acquire_timeout_secs: u64,
    #[serde(default)]
    pub sqlx_logging: bool,
}

fn default_max_connections() -> u32 { 10 }
fn default_min_connections() -> u32 { 2 }
fn default_connect_timeout() -> u64 { 30 }
fn default_idle_timeout() -> u64 { 600 }
fn default_max_lifetime() -> u64 { 3600 }
fn default_acquire_timeout() -> u64 { 30 }

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            connect_timeout_secs: default_connect_timeout(),
            idle_timeout_secs: default_idle_timeout(),
            max_lifetime_secs: default_max_lifetime(),
            acquire_timeout_secs: default_acquire_timeout(),
            sqlx_logging: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    #[serde(default)]
    pub jwt_secret: String,
    #[serde(default = "default_token_ttl_hours")]
    pub token_ttl_hours: i64,
}

fn default_token_ttl_hours() -> i64 { 24 }

impl Default for AuthConfig {
    fn default() -> Self {
        Self { jwt_secret: String::new(), token_ttl_hours: default_token_ttl_hours() }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_upload_dir")]
    pub upload_dir: String,
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: u64,
}

fn default_upload_dir() -> String { "uploads".into() }
fn default_max_upload_bytes() -> u64 { 200 * 1024 * 1024 }

impl Default for StorageConfig {
    fn default() -> Self {
        Self { upload_dir: default_upload_dir(), max_upload_bytes: default_max_upload_bytes() }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct LogConfig {
    #[serde(default)]
    pub json: bool,
}

/// Used when neither config.toml nor JWT_SECRET provides one.
pub const DEV_JWT_SECRET: &str = "dev-secret-change-me";

pub fn load_default() -> Result<AppConfig> {
    let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
    load_from_file(&path)
}

pub fn load_from_file(path: &str) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    let cfg: AppConfig = toml::from_str(&content)?;
    Ok(cfg)
}

impl AppConfig {
    /// Load `CONFIG_PATH` (or `config.toml`), falling back to defaults when the
    /// file is missing, then layer environment variables on top and validate.
    pub fn load_or_env() -> Result<Self> {
        let mut cfg = load_default().unwrap_or_default();
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    pub fn normalize_and_validate(&mut self) -> Result<()> {
        self.apply_env(|k| std::env::var(k).ok());
        // 归一化 server
        self.server.normalize()?;
        self.database.validate()?;
        self.auth.normalize()?;
        self.storage.validate()?;
        Ok(())
    }

    /// Fill gaps from environment variables; `SERVER_*` and `JWT_*` override the file.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(host) = lookup("SERVER_HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("SERVER_PORT").and_then(|p| p.parse::<u16>().ok()) {
            self.server.port = port;
        }
        if self.server.worker_threads.is_none() {
            self.server.worker_threads = lookup("TOKIO_WORKER_THREADS").and_then(|v| v.parse().ok());
        }
        // 若 TOML 中未提供 URL，则尝试从环境变量填充
        if self.database.url.trim().is_empty() {
            if let Some(url) = lookup("DATABASE_URL") {
                self.database.url = url;
            }
        }
        if let Some(secret) = lookup("JWT_SECRET") {
            self.auth.jwt_secret = secret;
        }
        if let Some(ttl) = lookup("JWT_EXPIRE_HOURS").and_then(|v| v.parse().ok()) {
            self.auth.token_ttl_hours = ttl;
        }
        if let Some(dir) = lookup("UPLOAD_DIR") {
            self.storage.upload_dir = dir;
        }
    }
}

impl ServerConfig {
    fn normalize(&mut self) -> Result<()> {
        if self.host.trim().is_empty() {
            self.host = "127.0.0.1".to_string();
        }
        if self.port == 0 {
            return Err(anyhow!("server.port must be in 1..=65535"));
        }
        match self.worker_threads {
            Some(0) | None => self.worker_threads = Some(4),
            Some(_) => {}
        }
        Ok(())
    }
}

impl DatabaseConfig {
    pub fn validate(&self) -> Result<()> {
        if self.url.trim().is_empty() {
            return Err(anyhow!("database.url is empty; set it in config.toml or DATABASE_URL"));
        }
        let lower = self.url.to_lowercase();
        if !(lower.starts_with("postgresql://") || lower.starts_with("postgres://")) {
            return Err(anyhow!("database.url must start with postgresql:// or postgres://"));
        }
        if self.min_connections == 0 {
            return Err(anyhow!("database.min_connections must be >= 1"));
        }
        if self.max_connections < self.min_connections {
            return Err(anyhow!("database.max_connections must be >= min_connections"));
        }
        if self.connect_timeout_secs == 0 || self.acquire_timeout_secs == 0 {
            return Err(anyhow!("database timeouts must be positive seconds"));
        }
        Ok(())
    }
}

impl AuthConfig {
    fn normalize(&mut self) -> Result<()> {
        if self.jwt_secret.trim().is_empty() {
            self.jwt_secret = DEV_JWT_SECRET.to_string();
        }
        if self.token_ttl_hours <= 0 {
            return Err(anyhow!("auth.token_ttl_hours must be > 0"));
        }
        Ok(())
    }
}

impl StorageConfig {
    fn validate(&self) -> Result<()> {
        if self.upload_dir.trim().is_empty() {
            return Err(anyhow!("storage.upload_dir must not be empty"));
        }
        if self.max_upload_bytes == 0 {
            return Err(anyhow!("storage.max_upload_bytes must be > 0"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> =
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn parses_full_toml() {
        let cfg: AppConfig = toml::from_str(
            r#"
            [server]
            host = "0.0.0.0"
            port = 8080

            [database]
            url = "postgres://u:p@localhost/deploys"
            max_connections = 5

            [auth]
            jwt_secret = "s3cret"
            token_ttl_hours = 2

            [storage]
            upload_dir = "/var/lib/deploys"

            [log]
            json = true
            "#,
        )
        .unwrap();
        assert_eq!(cfg.server.port, 8080);
        assert_eq!(cfg.database.max_connections, 5);
        assert_eq!(cfg.database.min_connections, 2);
        assert_eq!(cfg.auth.token_ttl_hours, 2);
        assert_eq!(cfg.storage.upload_dir, "/var/lib/deploys");
        assert_eq!(cfg.storage.max_upload_bytes, 200 * 1024 * 1024);
        assert!(cfg.log.json);
    }

    #[test]
    fn env_fills_database_url_and_overrides_port() {
        let mut cfg = AppConfig::default();
        cfg.apply_env(env(&[
            ("DATABASE_URL", "postgres://localhost/x"),
            ("SERVER_PORT", "9000"),
            ("JWT_SECRET", "from-env"),
        ]));
        assert_eq!(cfg.database.url, "postgres://localhost/x");
        assert_eq!(cfg.server.port, 9000);
        assert_eq!(cfg.auth.jwt_secret, "from-env");
    }

    #[test]
    fn env_does_not_replace_configured_database_url() {
        let mut cfg = AppConfig::default();
        cfg.database.url = "postgres://file/db".into();
        cfg.apply_env(env(&[("DATABASE_URL", "postgres://env/db")]));
        assert_eq!(cfg.database.url, "postgres://file/db");
    }

    #[test]
    fn database_validation_rejects_non_postgres() {
        let mut db = DatabaseConfig { url: "mysql://x".into(), ..Default::default() };
        db.min_connections = 1;
        db.max_connections = 2;
        db.connect_timeout_secs = 1;
        db.acquire_timeout_secs = 1;
        assert!(db.validate().is_err());
        db.url = "postgres://localhost/db".into();
        assert!(db.validate().is_ok());
    }

    #[test]
    fn empty_jwt_secret_falls_back_to_dev_secret() {
        let mut auth = AuthConfig::default();
        auth.normalize().unwrap();
        assert_eq!(auth.jwt_secret, DEV_JWT_SECRET);
    }

    #[test]
    fn zero_worker_threads_normalized() {
        let mut s = ServerConfig { worker_threads: Some(0), ..Default::default() };
        s.normalize().unwrap();
        assert_eq!(s.worker_threads, Some(4));
    }

    #[test]
    fn worker_threads_come_from_env_without_config_file() {
        let mut cfg = AppConfig::default();
        cfg.apply_env(env(&[("TOKIO_WORKER_THREADS", "8")]));
        cfg.server.normalize().unwrap();
        assert_eq!(cfg.server.worker_threads, Some(8));

        let mut cfg = AppConfig::default();
        cfg.apply_env(env(&[]));
        cfg.server.normalize().unwrap();
        assert_eq!(cfg.server.worker_threads, Some(4));
    }

    #[test]
    fn configured_worker_threads_win_over_env() {
        let mut cfg: AppConfig = toml::from_str("[server]\nworker_threads = 2\n").unwrap();
        cfg.apply_env(env(&[("TOKIO_WORKER_THREADS", "8")]));
        cfg.server.normalize().unwrap();
        assert_eq!(cfg.server.worker_threads, Some(2));
    }

    #[test]
    fn defaults_validate_once_database_url_is_known() {
        let mut cfg = AppConfig::default();
        cfg.database.url = "postgres://localhost/deploys".into();
        assert!(cfg.database.validate().is_ok());
        assert_eq!(cfg.server.port, 5000);
    }

    #[test]
    fn zero_upload_limit_rejected() {
        let s = StorageConfig { max_upload_bytes: 0, ..Default::default() };
        assert!(s.validate().is_err());
    }
}
