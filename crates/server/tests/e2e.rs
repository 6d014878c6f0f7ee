use std::net::SocketAddr;
use std::sync::Arc;

use migration::MigratorTrait;
use reqwest::multipart::{Form, Part};
use reqwest::StatusCode as HttpStatusCode;
use serde_json::{json, Value};
use tempfile::TempDir;
use tokio::net::TcpListener;
use uuid::Uuid;

use server::auth::{ServerAuthConfig, ServerState};
use server::routes;
use service::auth::repo::seaorm::SeaOrmAuthRepository;
use service::auth::service::{AuthConfig, AuthService};
use service::storage::LocalFileStore;

const SECRET: &str = "test-secret";

struct TestApp {
    base_url: String,
    admin_email: String,
    admin_password: String,
    uploads: TempDir,
}

async fn start_server() -> anyhow::Result<Option<TestApp>> {
    if std::env::var("SKIP_DB_TESTS").is_ok() || std::env::var("DATABASE_URL").is_err() {
        eprintln!("DATABASE_URL missing; skip e2e tests. Provide .env.test or env var.");
        return Ok(None);
    }
    // Ensure models prefer env over config file
    std::env::set_var("CONFIG_PATH", "/nonexistent-config-for-tests.toml");

    let db = models::db::connect().await?;
    if let Err(e) = migration::Migrator::up(&db, None).await { eprintln!("migrations notice: {}", e); }

    // Seed an admin the way `dbctl seed-admin` does
    let admin_email = format!("admin_{}@example.com", Uuid::new_v4());
    let admin_password = "AdminPass123".to_string();
    let auth = AuthService::new(
        Arc::new(SeaOrmAuthRepository { db: db.clone() }),
        AuthConfig { jwt_secret: SECRET.into(), token_ttl_hours: 1 },
    );
    auth.seed_admin(&admin_email, &admin_password).await?;

    let uploads = TempDir::new()?;
    let state = ServerState::new(
        db,
        ServerAuthConfig { jwt_secret: SECRET.into(), token_ttl_hours: 1 },
        LocalFileStore::new(uploads.path(), 64 * 1024),
    );
    let app = routes::build_router(state, tower_http::cors::CorsLayer::very_permissive(), None);

    let listener = TcpListener::bind((std::net::Ipv4Addr::LOCALHOST, 0)).await?;
    let addr: SocketAddr = listener.local_addr()?;
    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await { eprintln!("server error: {}", e); }
    });

    Ok(Some(TestApp { base_url: format!("http://{}", addr), admin_email, admin_password, uploads }))
}

fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .cookie_store(true)
        .build()
        .expect("reqwest client")
}

async fn login(c: &reqwest::Client, app: &TestApp, email: &str, password: &str) -> anyhow::Result<String> {
    let res = c.post(format!("{}/api/auth/login", app.base_url))
        .json(&json!({"email": email, "password": password}))
        .send().await?;
    assert_eq!(res.status(), HttpStatusCode::OK);
    let body = res.json::<Value>().await?;
    Ok(body["token"].as_str().unwrap_or_default().to_string())
}

fn pdf_part(name: &str) -> Part {
    Part::bytes(b"%PDF-1.4 release notes".to_vec()).file_name(name.to_string())
}

#[tokio::test]
async fn e2e_public_health() -> anyhow::Result<()> {
    let Some(app) = start_server().await? else { return Ok(()) };
    let res = client().get(format!("{}/health", app.base_url)).send().await?;
    assert_eq!(res.status(), HttpStatusCode::OK);
    let body = res.json::<Value>().await?;
    assert_eq!(body["status"], "ok");
    Ok(())
}

#[tokio::test]
async fn e2e_cookie_session_and_logout() -> anyhow::Result<()> {
    let Some(app) = start_server().await? else { return Ok(()) };
    let c = client();
    let email = format!("user_{}@example.com", Uuid::new_v4());

    let res = c.post(format!("{}/api/auth/register", app.base_url))
        .json(&json!({"email": email, "password": "S3curePass!"}))
        .send().await?;
    assert_eq!(res.status(), HttpStatusCode::CREATED);
    login(&c, &app, &email, "S3curePass!").await?;

    // Cookie alone authenticates
    let res = c.get(format!("{}/api/services", app.base_url)).send().await?;
    assert_eq!(res.status(), HttpStatusCode::OK);

    let res = c.get(format!("{}/api/auth/logout", app.base_url)).send().await?;
    assert_eq!(res.status(), HttpStatusCode::OK);
    assert_eq!(res.json::<Value>().await?["message"], "Logged out successfully");

    let res = c.get(format!("{}/api/services", app.base_url)).send().await?;
    assert_eq!(res.status(), HttpStatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn e2e_deployment_lifecycle_with_files() -> anyhow::Result<()> {
    let Some(app) = start_server().await? else { return Ok(()) };
    let c = reqwest::Client::new();
    let token = login(&c, &app, &app.admin_email, &app.admin_password).await?;
    let base = &app.base_url;

    // Service
    let res = c.post(format!("{base}/api/services"))
        .header("x-auth-token", &token)
        .json(&json!({"name": format!("billing-{}", Uuid::new_v4()), "application": "ABB"}))
        .send().await?;
    assert_eq!(res.status(), HttpStatusCode::CREATED);
    let service_id = res.json::<Value>().await?["service"]["id"].as_str().unwrap_or_default().to_string();

    // File is mandatory
    let form = Form::new().text("serviceId", service_id.clone()).text("version", "1.0.0");
    let res = c.post(format!("{base}/api/deployments/with-file"))
        .header("x-auth-token", &token)
        .multipart(form)
        .send().await?;
    assert_eq!(res.status(), HttpStatusCode::BAD_REQUEST);
    assert_eq!(res.json::<Value>().await?["message"], "File upload is mandatory for deployment creation");

    // Disallowed type
    let form = Form::new()
        .text("serviceId", service_id.clone())
        .text("version", "1.0.0")
        .part("file", Part::bytes(b"#!/bin/sh".to_vec()).file_name("run.sh"));
    let res = c.post(format!("{base}/api/deployments/with-file"))
        .header("x-auth-token", &token)
        .multipart(form)
        .send().await?;
    assert_eq!(res.status(), HttpStatusCode::BAD_REQUEST);

    // Happy path
    let form = Form::new()
        .text("serviceId", service_id.clone())
        .text("version", "1.0.0")
        .text("changes", "first release")
        .part("file", pdf_part("Release Notes.pdf"));
    let res = c.post(format!("{base}/api/deployments/with-file"))
        .header("x-auth-token", &token)
        .multipart(form)
        .send().await?;
    assert_eq!(res.status(), HttpStatusCode::CREATED);
    let body = res.json::<Value>().await?;
    assert_eq!(body["deployment"]["branch_name"], "main");
    assert_eq!(body["file"]["file_type"], "pdf");
    assert!(body["file"].get("file_path").is_none());
    let deployment_id = body["deployment"]["id"].as_str().unwrap_or_default().to_string();
    let file_id = body["file"]["id"].as_str().unwrap_or_default().to_string();

    // Duplicate version
    let res = c.post(format!("{base}/api/deployments"))
        .header("x-auth-token", &token)
        .json(&json!({"serviceId": service_id, "version": "1.0.0"}))
        .send().await?;
    assert_eq!(res.status(), HttpStatusCode::CONFLICT);
    assert_eq!(res.json::<Value>().await?["message"], "Version already exists for this service");

    // Second file by admin
    let form = Form::new().part("file", Part::bytes(b"sheet".to_vec()).file_name("metrics.xlsx"));
    let res = c.post(format!("{base}/api/deployments/{deployment_id}/files"))
        .header("x-auth-token", &token)
        .multipart(form)
        .send().await?;
    assert_eq!(res.status(), HttpStatusCode::CREATED);

    // Listing carries joined fields
    let res = c.get(format!("{base}/api/deployments/service/{service_id}"))
        .header("x-auth-token", &token)
        .send().await?;
    let list = res.json::<Value>().await?;
    let first = &list["deployments"][0];
    assert_eq!(first["application"], "abb");
    assert_eq!(first["creator_email"], app.admin_email.as_str());
    assert_eq!(first["files"].as_array().map(Vec::len), Some(2));

    // Download
    let res = c.get(format!("{base}/api/deployments/files/{file_id}"))
        .header("x-auth-token", &token)
        .send().await?;
    assert_eq!(res.status(), HttpStatusCode::OK);
    let disposition = res.headers().get("content-disposition").and_then(|v| v.to_str().ok()).unwrap_or_default().to_string();
    assert!(disposition.contains("filename=\"Release Notes.pdf\""), "{disposition}");
    assert_eq!(res.bytes().await?.as_ref(), b"%PDF-1.4 release notes");

    // Delete cascades
    let res = c.delete(format!("{base}/api/services/{service_id}"))
        .header("x-auth-token", &token)
        .send().await?;
    assert_eq!(res.status(), HttpStatusCode::OK);
    let res = c.get(format!("{base}/api/deployments/{deployment_id}"))
        .header("x-auth-token", &token)
        .send().await?;
    assert_eq!(res.status(), HttpStatusCode::NOT_FOUND);
    let res = c.get(format!("{base}/api/deployments/files/{file_id}"))
        .header("x-auth-token", &token)
        .send().await?;
    assert_eq!(res.status(), HttpStatusCode::NOT_FOUND);
    assert_eq!(std::fs::read_dir(app.uploads.path())?.count(), 0);
    Ok(())
}

#[tokio::test]
async fn e2e_oversize_upload_rejected() -> anyhow::Result<()> {
    let Some(app) = start_server().await? else { return Ok(()) };
    let c = reqwest::Client::new();
    let token = login(&c, &app, &app.admin_email, &app.admin_password).await?;

    let res = c.post(format!("{}/api/services", app.base_url))
        .header("x-auth-token", &token)
        .json(&json!({"name": format!("big-{}", Uuid::new_v4())}))
        .send().await?;
    let service_id = res.json::<Value>().await?["service"]["id"].as_str().unwrap_or_default().to_string();

    let form = Form::new()
        .text("serviceId", service_id)
        .text("version", "9.9.9")
        .part("file", Part::bytes(vec![0u8; 65 * 1024]).file_name("huge.pdf"));
    let res = c.post(format!("{}/api/deployments/with-file", app.base_url))
        .header("x-auth-token", &token)
        .multipart(form)
        .send().await?;
    assert_eq!(res.status(), HttpStatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(std::fs::read_dir(app.uploads.path()).map(|d| d.count()).unwrap_or(0), 0);
    Ok(())
}
