//! Test server lifecycle management
//!
//! Each test gets an isolated server with its own storefront database.

use super::constants::*;
use super::fixtures::create_test_db;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use storefront_server::server::{make_app, RequestsLoggingLevel, ServerConfig};
use storefront_server::storefront_store::{
    LikeMode, RemoteStorefrontStore, SqliteStorefrontStore, StorefrontStore,
};
use tempfile::TempDir;
use tokio::net::TcpListener;

/// Test server instance with an isolated database
///
/// When dropped, the server gracefully shuts down and temp resources are cleaned up.
pub struct TestServer {
    /// Base URL for making requests (e.g., "http://127.0.0.1:12345")
    pub base_url: String,

    /// The port the server is listening on
    pub port: u16,

    /// Store shared with the server, for direct database access in tests
    pub store: Arc<SqliteStorefrontStore>,

    /// Path of the backing SQLite file
    pub db_path: PathBuf,

    // Private fields - keep resources alive until drop
    _temp_db_dir: TempDir,
    _shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

impl TestServer {
    /// Spawns a new test server on a random port with recorded likes
    pub async fn spawn() -> Self {
        Self::spawn_with_mode(LikeMode::Recorded).await
    }

    /// Spawns a new test server on a random port
    ///
    /// # Panics
    ///
    /// Panics if the database cannot be seeded, the port cannot be bound or
    /// the server doesn't become ready within timeout.
    pub async fn spawn_with_mode(like_mode: LikeMode) -> Self {
        let (temp_db_dir, db_path) =
            create_test_db(like_mode).expect("Failed to create test database");

        let store = Arc::new(
            SqliteStorefrontStore::new(&db_path, like_mode)
                .expect("Failed to open storefront store"),
        );

        // Bind to random port
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");

        let port = listener
            .local_addr()
            .expect("Failed to get local address")
            .port();

        let base_url = format!("http://127.0.0.1:{}", port);

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

        let config = ServerConfig {
            port,
            requests_logging_level: RequestsLoggingLevel::None,
            content_cache_age_sec: 0,
            frontend_dir_path: None,
            like_mode,
        };

        let app = make_app(config, store.clone() as Arc<dyn StorefrontStore>)
            .expect("Failed to build app");

        // Spawn server in background task with graceful shutdown
        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .expect("Server failed");
        });

        let server = Self {
            base_url,
            port,
            store,
            db_path,
            _temp_db_dir: temp_db_dir,
            _shutdown_tx: Some(shutdown_tx),
        };

        server.wait_for_ready().await;

        server
    }

    /// A store client pointed at this server
    pub fn remote_store(&self) -> RemoteStorefrontStore {
        RemoteStorefrontStore::new(self.base_url.clone(), REQUEST_TIMEOUT_SECS)
            .expect("Failed to build remote store")
    }

    /// Waits for the server to become ready by polling the root endpoint
    async fn wait_for_ready(&self) {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(100))
            .build()
            .expect("Failed to build reqwest client");

        let start = std::time::Instant::now();
        let timeout = Duration::from_millis(SERVER_READY_TIMEOUT_MS);

        loop {
            if start.elapsed() > timeout {
                panic!(
                    "Server did not become ready within {}ms",
                    SERVER_READY_TIMEOUT_MS
                );
            }

            match client.get(format!("{}/", self.base_url)).send().await {
                Ok(response) if response.status().is_success() => return,
                _ => {
                    tokio::time::sleep(Duration::from_millis(SERVER_READY_POLL_INTERVAL_MS)).await;
                }
            }
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self._shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}
