//! Serve command - run the HTTP server until interrupted.

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context as _, Result};
use clap::Args;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use sensorcast_cache::{CacheConfig, TtlCache};
use sensorcast_config::{Environment, SensorcastConfig};
use sensorcast_sensors::{CachedSensorService, InMemorySensorRepository, SensorSimulator};
use sensorcast_server::{AppState, Server, ServerConfig, StreamSettings};

use super::Context;

/// How long open connections get to finish after a shutdown signal.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

/// Arguments for the serve command.
#[derive(Args, Debug, Default)]
pub struct ServeArgs {
    /// Port to listen on
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Address to bind to
    #[arg(long)]
    pub bind: Option<String>,

    /// Maximum concurrently admitted API requests, open streams included
    #[arg(long)]
    pub max_connections: Option<usize>,

    /// Deployment environment: dev, uat or prod
    #[arg(long)]
    pub env: Option<Environment>,
}

/// Run the serve command.
pub async fn run(args: ServeArgs, ctx: &Context) -> Result<()> {
    let config = apply_overrides(ctx.loaded.config.clone(), args);
    config.validate().context("invalid configuration")?;

    let server_section = config.server();
    let bind: IpAddr = server_section
        .bind
        .parse()
        .with_context(|| format!("invalid bind address '{}'", server_section.bind))?;
    let addr = SocketAddr::new(bind, server_section.port);

    let shutdown = CancellationToken::new();

    // Data source and its simulated updates
    let repository = Arc::new(InMemorySensorRepository::seeded());
    let simulator = SensorSimulator::new(repository.clone())
        .with_interval(config.sensors().update_interval())
        .spawn(shutdown.child_token());

    // Payload cache in front of the data source
    let cache_section = config.cache();
    let cache = TtlCache::new(
        CacheConfig::new()
            .with_default_ttl(cache_section.ttl())
            .with_sweep_interval(cache_section.sweep_interval()),
    );
    let sweeper = cache.spawn_sweeper(cache.config().sweep_interval, shutdown.child_token());
    let service = CachedSensorService::new(repository, cache);

    let server_config = server_config(&config, addr);
    info!(
        env = %server_config.env,
        server_id = %server_config.server_id,
        max_connections = server_config.max_connections,
        "Configuration loaded"
    );

    let state = AppState::new(Arc::new(service), server_config).with_shutdown(shutdown.clone());
    let mut server_task = tokio::spawn(Server::from_state(state).run());

    tokio::select! {
        result = &mut server_task => {
            shutdown.cancel();
            result.context("server task panicked")??;
        }
        _ = shutdown_signal() => {
            // Ends every open stream so graceful shutdown can complete
            shutdown.cancel();
            match tokio::time::timeout(SHUTDOWN_TIMEOUT, &mut server_task).await {
                Ok(result) => result.context("server task panicked")??,
                Err(_) => {
                    warn!(timeout_secs = SHUTDOWN_TIMEOUT.as_secs(), "Server did not stop in time");
                    server_task.abort();
                }
            }
        }
    }

    let _ = simulator.await;
    let _ = sweeper.await;
    info!("Shutdown complete");

    Ok(())
}

/// Apply command-line flags on top of the loaded configuration.
fn apply_overrides(mut config: SensorcastConfig, args: ServeArgs) -> SensorcastConfig {
    let mut server = config.server();
    if let Some(port) = args.port {
        server.port = port;
    }
    if let Some(bind) = args.bind {
        server.bind = bind;
    }
    if let Some(max_connections) = args.max_connections {
        server.max_connections = max_connections;
    }
    config.server = Some(server);

    if let Some(env) = args.env {
        config.env = Some(env);
    }
    config
}

/// Translate the file configuration into the server's runtime configuration.
fn server_config(config: &SensorcastConfig, addr: SocketAddr) -> ServerConfig {
    let server = config.server();
    let rate_limit = config.rate_limit();
    let (requests_per_second, burst) = rate_limit.effective(server.max_connections);
    let stream = config.stream();

    let mut server_config = ServerConfig::new()
        .with_bind_address(addr)
        .with_env(config.env())
        .with_server_id(server.resolved_server_id())
        .with_max_connections(server.max_connections)
        .with_rate_limiting(rate_limit.enabled)
        .with_rate_limit(requests_per_second, burst)
        .with_request_logging(server.request_logging)
        .with_cors_origins(server.cors_origins.clone())
        .with_security(config.security())
        .with_stream(
            StreamSettings::default()
                .with_refresh_interval(stream.refresh_interval())
                .with_keepalive_interval(stream.keepalive_interval())
                .with_buffer(stream.buffer),
        );

    if let Some(path) = server.static_path {
        server_config = server_config.with_static_path(path);
    }
    server_config
}

/// Resolves on Ctrl-C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
        _ = terminate => info!("Received SIGTERM, shutting down..."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides_replace_file_values() {
        let file = SensorcastConfig::from_toml("[server]\nport = 9000\nmax_connections = 50\n").unwrap();
        let args = ServeArgs {
            port: Some(9100),
            env: Some(Environment::Uat),
            ..Default::default()
        };

        let config = apply_overrides(file, args);
        assert_eq!(config.server().port, 9100);
        assert_eq!(config.server().max_connections, 50);
        assert_eq!(config.env(), Environment::Uat);
    }

    #[test]
    fn test_server_config_derives_rate_limit() {
        let config = SensorcastConfig::from_toml(
            "[server]\nmax_connections = 200\nserver_id = \"node-3\"\n[stream]\nbuffer = 4\n",
        )
        .unwrap();
        let addr: SocketAddr = "127.0.0.1:9000".parse().unwrap();

        let server = server_config(&config, addr);
        assert_eq!(server.bind_address, addr);
        assert_eq!(server.server_id, "node-3");
        assert_eq!(server.max_connections, 200);
        assert_eq!((server.requests_per_second, server.burst), (200, 300));
        assert_eq!(server.stream.buffer, 4);
        assert!(server.static_path.is_none());
    }
}
