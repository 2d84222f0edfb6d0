use axum::extract::{Path as AxumPath, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use eyre::Result;
use relvault_lib::config::{AssetSelection, Config, DownloadConfig, RepositoryDef, RetryConfig};
use serde_json::json;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

#[derive(Clone)]
enum ReleaseResponse {
    Json(serde_json::Value),
    Status(u16),
}

#[derive(Clone)]
enum AssetResponse {
    Body(Vec<u8>),
    Status(u16),
}

#[derive(Default)]
struct ServerState {
    releases: Mutex<HashMap<String, ReleaseResponse>>,
    assets: Mutex<HashMap<String, AssetResponse>>,
    release_hits: AtomicUsize,
    asset_hits: AtomicUsize,
}

/// In-process stand-in for the GitHub API plus asset hosting, with
/// per-route hit counters so tests can assert which network calls a run
/// actually made.
pub struct MockGitHub {
    addr: SocketAddr,
    state: Arc<ServerState>,
}

impl MockGitHub {
    pub async fn start() -> Self {
        let state = Arc::new(ServerState::default());
        let app = Router::new()
            .route(
                "/repos/{owner}/{repo}/releases/latest",
                get(latest_release_handler),
            )
            .route("/repos/{owner}/{repo}", get(repository_handler))
            .route("/assets/{name}", get(asset_handler))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind mock server");
        let addr = listener.local_addr().expect("mock server has no address");
        tracing::debug!(%addr, "Mock release API listening");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("mock server died");
        });

        Self { addr, state }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn asset_url(&self, name: &str) -> String {
        format!("{}/assets/{}", self.base_url(), name)
    }

    pub fn set_latest_release(&self, repo: &str, release: serde_json::Value) {
        self.state
            .releases
            .lock()
            .unwrap()
            .insert(repo.to_string(), ReleaseResponse::Json(release));
    }

    pub fn set_release_error(&self, repo: &str, status: u16) {
        self.state
            .releases
            .lock()
            .unwrap()
            .insert(repo.to_string(), ReleaseResponse::Status(status));
    }

    pub fn set_asset(&self, name: &str, body: Vec<u8>) {
        self.state
            .assets
            .lock()
            .unwrap()
            .insert(name.to_string(), AssetResponse::Body(body));
    }

    pub fn set_asset_error(&self, name: &str, status: u16) {
        self.state
            .assets
            .lock()
            .unwrap()
            .insert(name.to_string(), AssetResponse::Status(status));
    }

    pub fn release_hits(&self) -> usize {
        self.state.release_hits.load(Ordering::SeqCst)
    }

    pub fn asset_hits(&self) -> usize {
        self.state.asset_hits.load(Ordering::SeqCst)
    }

    /// Release payload whose asset URLs point back at this server.
    pub fn release_json(&self, tag: &str, assets: &[(&str, u64)]) -> serde_json::Value {
        json!({
            "tag_name": tag,
            "assets": assets
                .iter()
                .map(|(name, size)| {
                    json!({
                        "name": name,
                        "browser_download_url": self.asset_url(name),
                        "size": size,
                    })
                })
                .collect::<Vec<_>>(),
        })
    }
}

async fn latest_release_handler(
    State(state): State<Arc<ServerState>>,
    AxumPath((owner, repo)): AxumPath<(String, String)>,
) -> Response {
    state.release_hits.fetch_add(1, Ordering::SeqCst);
    let key = format!("{owner}/{repo}");
    match state.releases.lock().unwrap().get(&key) {
        Some(ReleaseResponse::Json(release)) => axum::Json(release.clone()).into_response(),
        Some(ReleaseResponse::Status(code)) => {
            StatusCode::from_u16(*code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR).into_response()
        }
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn repository_handler(
    AxumPath((owner, repo)): AxumPath<(String, String)>,
) -> Response {
    axum::Json(json!({
        "full_name": format!("{owner}/{repo}"),
        "default_branch": "main",
    }))
    .into_response()
}

async fn asset_handler(
    State(state): State<Arc<ServerState>>,
    AxumPath(name): AxumPath<String>,
) -> Response {
    state.asset_hits.fetch_add(1, Ordering::SeqCst);
    match state.assets.lock().unwrap().get(&name) {
        Some(AssetResponse::Body(body)) => body.clone().into_response(),
        Some(AssetResponse::Status(code)) => {
            StatusCode::from_u16(*code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR).into_response()
        }
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

/// Config pointed at the mock server, with fast retries for tests.
pub fn create_test_config(server: &MockGitHub, download_dir: &Path, repos: &[&str]) -> Config {
    Config {
        token: Some("test-token".to_string()),
        repositories: repos
            .iter()
            .map(|repo| RepositoryDef::Simple(repo.to_string()))
            .collect(),
        api_base_url: Some(server.base_url()),
        proxy: None,
        download: DownloadConfig {
            path: download_dir.to_path_buf(),
            assets: AssetSelection::Assets,
            parallelism: 4,
            timeout_secs: 5,
        },
        retry: RetryConfig {
            max_attempts: 3,
            base_delay_ms: 1,
            max_delay_ms: 5,
        },
        state_path: None,
    }
}

/// Every file under `dir`, recursively. Empty when the directory does not
/// exist yet.
pub fn files_under(dir: &Path) -> Vec<std::path::PathBuf> {
    let mut files = Vec::new();
    let Ok(entries) = std::fs::read_dir(dir) else {
        return files;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            files.extend(files_under(&path));
        } else {
            files.push(path);
        }
    }
    files
}

/// Write the config to disk so tests go through the loader and command
/// resolution, the same path the binary takes.
pub fn write_test_config(config: &Config) -> Result<(TempDir, String)> {
    let temp_dir = tempfile::tempdir()?;
    let config_path = temp_dir.path().join("relvault.json");
    std::fs::write(&config_path, serde_json::to_string_pretty(config)?)?;
    let config_path = config_path
        .to_str()
        .ok_or_else(|| eyre::eyre!("non-UTF8 temp path"))?
        .to_string();
    Ok((temp_dir, config_path))
}
