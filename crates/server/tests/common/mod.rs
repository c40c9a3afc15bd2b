//! # Common Test Utilities
//!
//! `TestApp` spawns the real router on a random port around an `AppState`
//! built by the test, so each test decides which chain answers questions.

// Allow unused code because not every test file uses every helper.
#![allow(unused)]

use anyhow::Result;
use askdb::Chain;
use askdb_server::{
    config::{get_config, AppConfig},
    router,
    state::AppState,
};
use axum::serve;
use reqwest::Client;
use std::{fs::File, io::Write, net::SocketAddr, sync::Arc};
use tempfile::{tempdir, TempDir};
use tokio::{net::TcpListener, task::JoinHandle};

/// Writes `yaml` to a temporary `config.yml` and loads it.
///
/// The returned directory must be kept alive while the file is needed.
pub fn load_test_config(yaml: &str) -> Result<(AppConfig, TempDir)> {
    let config_dir = tempdir()?;
    let config_path = config_dir.path().join("config.yml");
    let mut file = File::create(&config_path)?;
    file.write_all(yaml.as_bytes())?;

    let config = get_config(Some(config_path.to_str().unwrap()))?;
    Ok((config, config_dir))
}

/// A harness for end-to-end testing of the Axum server.
pub struct TestApp {
    pub address: String,
    pub client: Client,
    pub app_state: AppState,
    _server_handle: JoinHandle<()>,
    shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

impl TestApp {
    /// Spawns the server with a default configuration around `chain`.
    pub async fn spawn_with_chain(chain: Arc<dyn Chain>) -> Result<Self> {
        let (config, _dir) = load_test_config("port: 0\n")?;
        Self::spawn_with_state(AppState::with_chain(config, chain)).await
    }

    pub async fn spawn_with_state(app_state: AppState) -> Result<Self> {
        dotenvy::dotenv().ok();
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .compact()
            .try_init();

        let app_state_for_harness = app_state.clone();

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr: SocketAddr = listener.local_addr()?;
        let address = format!("http://{addr}");

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
        let server_handle = tokio::spawn(async move {
            let app = router::create_router(app_state);
            let server = serve(listener, app).with_graceful_shutdown(async {
                shutdown_rx.await.ok();
            });
            if let Err(e) = server.await {
                tracing::error!("[TestApp] Server error: {}", e);
            }
        });

        Ok(Self {
            address,
            client: Client::new(),
            app_state: app_state_for_harness,
            _server_handle: server_handle,
            shutdown_tx: Some(shutdown_tx),
        })
    }

    /// Posts `question` to `/query` and returns the answer string.
    pub async fn ask(&self, question: &str) -> Result<String> {
        let response = self
            .client
            .post(format!("{}/query", self.address))
            .json(&serde_json::json!({ "question": question }))
            .send()
            .await?;
        anyhow::ensure!(
            response.status().is_success(),
            "Request failed with status: {}",
            response.status()
        );
        let body: serde_json::Value = response.json().await?;
        body["result"]["answer"]
            .as_str()
            .map(String::from)
            .ok_or_else(|| anyhow::anyhow!("answer field is not a string: {body}"))
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}
