//! Common test utilities for integration tests.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use reqwest::Client;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;

use sensorcast_cache::TtlCache;
use sensorcast_sensors::{CachedSensorService, InMemorySensorRepository};
use sensorcast_server::{AppState, Server, ServerConfig, StreamSettings};

/// A test server that runs in the background.
pub struct TestServer {
    /// The server's address.
    pub addr: SocketAddr,
    /// HTTP client configured for this server.
    pub client: Client,
    /// Cancelled when the test server is dropped.
    pub shutdown: CancellationToken,
    /// Handle to the server task.
    handle: Option<JoinHandle<()>>,
}

impl TestServer {
    /// Start a new test server with default capacity.
    pub async fn start() -> Result<Self> {
        Self::start_with_capacity(100).await
    }

    /// Start a new test server admitting at most `max_connections` requests.
    pub async fn start_with_capacity(max_connections: usize) -> Result<Self> {
        let addr = find_available_port().await?;

        let service = CachedSensorService::new(
            Arc::new(InMemorySensorRepository::seeded()),
            TtlCache::default(),
        );

        let config = ServerConfig::new()
            .with_bind_address(addr)
            .with_server_id("test-node")
            .with_max_connections(max_connections)
            .with_rate_limiting(false)
            .with_request_logging(false)
            .with_stream(
                StreamSettings::default().with_refresh_interval(Duration::from_millis(100)),
            );

        let shutdown = CancellationToken::new();
        let state = AppState::new(Arc::new(service), config).with_shutdown(shutdown.clone());

        let server = Server::from_state(state);
        let handle = tokio::spawn(async move {
            let _ = server.run_on(addr).await;
        });

        let client = Client::new();
        wait_for_server(&client, addr).await?;

        Ok(Self {
            addr,
            client,
            shutdown,
            handle: Some(handle),
        })
    }

    /// Get the base URL for the server.
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Get a request builder.
    pub fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.client.get(format!("{}{}", self.base_url(), path))
    }

    /// Check if server is healthy.
    pub async fn health(&self) -> Result<bool> {
        let resp = self.get("/health").send().await?;
        Ok(resp.status().is_success())
    }

    /// Cancel the shutdown token and wait for the server task to finish.
    pub async fn stop(mut self) -> Result<()> {
        self.shutdown.cancel();
        if let Some(handle) = self.handle.take() {
            timeout(Duration::from_secs(5), handle).await??;
        }
        Ok(())
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

/// Read from an event stream response until `count` complete frames arrived.
pub async fn read_frames(resp: &mut reqwest::Response, count: usize) -> Result<Vec<String>> {
    let mut buffer = String::new();
    let mut frames = Vec::new();

    timeout(Duration::from_secs(5), async {
        while frames.len() < count {
            let Some(chunk) = resp.chunk().await? else {
                anyhow::bail!("stream ended after {} frames", frames.len());
            };
            buffer.push_str(std::str::from_utf8(&chunk)?);
            while let Some(end) = buffer.find("\n\n") {
                frames.push(buffer[..end].to_string());
                buffer.drain(..end + 2);
            }
        }
        anyhow::Ok(())
    })
    .await??;

    Ok(frames)
}

/// Find an available port for the test server.
async fn find_available_port() -> Result<SocketAddr> {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    drop(listener);
    Ok(addr)
}

/// Wait for the server to become ready.
async fn wait_for_server(client: &Client, addr: SocketAddr) -> Result<()> {
    let url = format!("http://{}/health", addr);

    let result = timeout(Duration::from_secs(5), async {
        loop {
            match client.get(&url).send().await {
                Ok(resp) if resp.status().is_success() => return,
                _ => tokio::time::sleep(Duration::from_millis(50)).await,
            }
        }
    })
    .await;

    match result {
        Ok(()) => Ok(()),
        Err(_) => anyhow::bail!("Timeout waiting for server to start"),
    }
}
