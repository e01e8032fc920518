#![allow(dead_code)]

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::StatusCode;
use serde_json::{json, Value};

use product_catalog_api::auth::MemoryCredentialStore;
use product_catalog_api::config::AppConfig;
use product_catalog_api::database::MemoryStore;
use product_catalog_api::{app, AppState};

pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    pub client: reqwest::Client,
    /// The record store behind the server, for asserting on what was persisted.
    pub store: Arc<MemoryStore>,
}

/// An account registered and signed in against a `TestServer`.
pub struct TestUser {
    pub id: String,
    pub email: String,
    pub token: String,
}

impl TestServer {
    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let deadline = Instant::now() + timeout;
        loop {
            if Instant::now() > deadline {
                break;
            }
            let url = format!("{}/health", self.base_url);
            if let Ok(resp) = self.client.get(&url).send().await {
                if resp.status() == StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Register `email` (display name derived from the local part) and sign in.
    pub async fn user(&self, email: &str) -> Result<TestUser> {
        let display_name = email.split('@').next().unwrap_or(email);
        let res = self
            .client
            .post(self.url("/auth/register"))
            .json(&json!({ "email": email, "password": "secret-pw", "display_name": display_name }))
            .send()
            .await?;
        anyhow::ensure!(res.status() == StatusCode::OK, "register failed: {}", res.text().await?);

        let res = self
            .client
            .post(self.url("/auth/login"))
            .json(&json!({ "email": email, "password": "secret-pw" }))
            .send()
            .await?;
        anyhow::ensure!(res.status() == StatusCode::OK, "login failed: {}", res.text().await?);

        let body = res.json::<Value>().await?;
        let token = body["session"]["access_token"]
            .as_str()
            .context("missing access_token")?
            .to_string();
        let id = body["user"]["id"].as_str().context("missing user id")?.to_string();

        Ok(TestUser {
            id,
            email: email.to_string(),
            token,
        })
    }

    /// POST /products as `user`, asserting success.
    pub async fn create_product(&self, user: &TestUser, body: Value) -> Result<Value> {
        let res = self
            .client
            .post(self.url("/products"))
            .bearer_auth(&user.token)
            .json(&body)
            .send()
            .await?;
        anyhow::ensure!(res.status() == StatusCode::OK, "create failed: {}", res.text().await?);
        Ok(res.json().await?)
    }
}

/// Start the app in-process on a free port with in-memory stores.
pub async fn spawn_server() -> Result<TestServer> {
    spawn_server_with(AppConfig::development()).await
}

pub async fn spawn_server_with(mut config: AppConfig) -> Result<TestServer> {
    let port = portpicker::pick_unused_port().context("failed to pick free port")?;
    config.server.port = port;

    let store = Arc::new(MemoryStore::new());
    let state = AppState::memory(store.clone(), Arc::new(MemoryCredentialStore::new()));
    let router = app(state, &config);

    let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
        .await
        .context("failed to bind test listener")?;
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });

    let server = TestServer {
        port,
        base_url: format!("http://127.0.0.1:{}", port),
        client: reqwest::Client::new(),
        store,
    };
    server.wait_ready(Duration::from_secs(5)).await?;
    Ok(server)
}
