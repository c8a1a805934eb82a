#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::{mpsc, OnceLock};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use reqwest::StatusCode;
use serde_json::{json, Value};

use discountify::client::ApiClient;
use discountify::config::AppConfig;
use discountify::database::{init_schema, DatabaseManager};
use discountify::database::models::Shop;
use discountify::{app, AppState};

pub const PASSWORD: &str = "correct-horse-1";

static SERVER: OnceLock<Option<TestServer>> = OnceLock::new();

pub struct TestServer {
    pub port: u16,
    pub base_url: String,
}

impl TestServer {
    /// Serves the app from its own runtime so it outlives each test's runtime
    fn spawn(database_url: String) -> Result<Self> {
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);
        let (ready_tx, ready_rx) = mpsc::channel::<Result<()>>();

        std::thread::spawn(move || {
            let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
                Ok(rt) => rt,
                Err(e) => {
                    let _ = ready_tx.send(Err(e.into()));
                    return;
                }
            };

            runtime.block_on(async move {
                let setup = async {
                    let mut config = AppConfig::development();
                    config.database.url = Some(database_url);
                    config.security.jwt_secret = "integration-test-secret".to_string();

                    let pool = DatabaseManager::connect(&config.database).await?;
                    init_schema(&pool).await?;
                    let listener = tokio::net::TcpListener::bind(("127.0.0.1", port)).await?;
                    Ok::<_, anyhow::Error>((AppState::new(pool, config), listener))
                };

                match setup.await {
                    Ok((state, listener)) => {
                        let _ = ready_tx.send(Ok(()));
                        let service = app(state).into_make_service_with_connect_info::<SocketAddr>();
                        if let Err(e) = axum::serve(listener, service).await {
                            eprintln!("test server stopped: {}", e);
                        }
                    }
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                    }
                }
            });
        });

        ready_rx
            .recv_timeout(Duration::from_secs(30))
            .context("test server did not report readiness")??;

        Ok(Self { port, base_url })
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let client = reqwest::Client::new();
        let deadline = Instant::now() + timeout;
        loop {
            if Instant::now() > deadline {
                break;
            }
            let url = format!("{}/health", self.base_url);
            if let Ok(resp) = client.get(&url).send().await {
                if resp.status() == StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }
}

/// Shared server for this test binary, or `None` when DATABASE_URL is not set
pub async fn ensure_server() -> Result<Option<&'static TestServer>> {
    let server = SERVER.get_or_init(|| {
        let _ = dotenvy::dotenv();
        let url = std::env::var("DATABASE_URL").ok().filter(|u| !u.trim().is_empty())?;
        Some(TestServer::spawn(url).expect("failed to start test server"))
    });

    match server {
        Some(server) => {
            server.wait_ready(Duration::from_secs(10)).await?;
            Ok(Some(server))
        }
        None => {
            eprintln!("DATABASE_URL not set; skipping database-backed test");
            Ok(None)
        }
    }
}

/// CURRENT_DATE as the database sees it; date windows are evaluated there
pub async fn database_today() -> Result<NaiveDate> {
    let url = std::env::var("DATABASE_URL").context("DATABASE_URL not set")?;
    let pool = sqlx::PgPool::connect(&url).await?;
    let today = sqlx::query_scalar("SELECT CURRENT_DATE").fetch_one(&pool).await?;
    pool.close().await;
    Ok(today)
}

pub fn client(server: &TestServer) -> Result<ApiClient> {
    Ok(ApiClient::new(server.base_url.clone())?)
}

pub fn unique_email(prefix: &str) -> String {
    format!("{}-{}@example.test", prefix, uuid::Uuid::new_v4().simple())
}

pub fn unique(prefix: &str) -> String {
    format!("{} {}", prefix, uuid::Uuid::new_v4().simple())
}

/// Registers a shop and returns it with the email used
pub async fn register_shop(client: &ApiClient, name: &str, city: &str) -> Result<(Shop, String)> {
    let email = unique_email(&name.to_lowercase().replace(' ', "-"));
    let shop: Shop = client
        .post(
            "/api/shops/register",
            &json!({"shop_name": name, "email": email, "password": PASSWORD, "city": city}),
        )
        .await?;
    Ok((shop, email))
}

/// Registers a shop and signs `client` in as it
pub async fn signed_in_shop(client: &ApiClient, name: &str, city: &str) -> Result<Shop> {
    let (shop, email) = register_shop(client, name, city).await?;
    let _: Shop = client
        .post("/api/auth/login", &json!({"email": email, "password": PASSWORD}))
        .await?;
    Ok(shop)
}

pub fn discount_body(title: &str, percentage: Value, start: &str, end: &str) -> Value {
    json!({
        "title": title,
        "discount_percentage": percentage,
        "category": "Clothing",
        "start_date": start,
        "end_date": end,
    })
}
