use std::fs;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use tempfile::TempDir;
use tokio::task::JoinHandle;

use ragchat::providers::ScriptedProvider;
use ragchat::server::{router, AppState};

/// A relay service running on an ephemeral local port
#[allow(dead_code)]
pub struct TestRelay {
    pub addr: SocketAddr,
    handle: JoinHandle<()>,
}

#[allow(dead_code)]
impl TestRelay {
    pub fn stream_url(&self) -> String {
        format!("http://{}/api/chat/stream", self.addr)
    }

    pub fn health_url(&self) -> String {
        format!("http://{}/health", self.addr)
    }
}

impl Drop for TestRelay {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Serve the relay router backed by `provider` on 127.0.0.1
#[allow(dead_code)]
pub async fn spawn_relay(provider: ScriptedProvider) -> TestRelay {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("failed to bind test listener");
    let addr = listener.local_addr().expect("listener has no address");
    let app = router(Arc::new(AppState::new(Arc::new(provider), 8)));

    let handle = tokio::spawn(async move {
        axum::serve(listener, app).await.expect("test relay failed");
    });

    TestRelay { addr, handle }
}

/// URL of a local port nothing is listening on
#[allow(dead_code)]
pub async fn unreachable_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("failed to bind test listener");
    let addr = listener.local_addr().expect("listener has no address");
    drop(listener);
    format!("http://{}/api/chat/stream", addr)
}

#[allow(dead_code)]
pub fn temp_config_file(contents: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("failed to create tempdir");
    let config_path = temp_dir.path().join("config.yaml");
    fs::write(&config_path, contents).expect("failed to write config file");
    (temp_dir, config_path)
}
