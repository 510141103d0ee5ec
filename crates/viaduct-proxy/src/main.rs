mod config;
mod network;

use config::ProxyConfig;
use std::path::Path;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};
use viaduct_data::MappingData;
use viaduct_protocol_core::{ProtocolManager, ProtocolProvider, ProtocolVersion};
use viaduct_protocol_v1_20_2::Protocol1_20_2To1_20;
use viaduct_protocol_v1_20_5::Protocol1_20_5To1_20_3;
use viaduct_protocol_v1_9::Protocol1_9To1_8;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    info!("Starting Viaduct proxy...");

    let config = Arc::new(ProxyConfig::load(Path::new("config/proxy.toml"))?);
    let server_version = ProtocolVersion::from_name(&config.server_version)
        .ok_or_else(|| anyhow::anyhow!("Unknown server version {}", config.server_version))?;
    info!(
        "Config loaded: bind={}:{}, backend={} ({})",
        config.bind, config.port, config.backend, server_version
    );

    let manager = Arc::new(load_protocols(&config)?);
    let clients: Vec<_> = manager
        .supported_clients(server_version)
        .into_iter()
        .map(ProtocolVersion::name)
        .collect();
    info!("Accepting clients on {}", clients.join(", "));

    let addr = format!("{}:{}", config.bind, config.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Listening on {}", addr);

    tokio::select! {
        _ = accept_loop(listener, config, manager, server_version) => {
            error!("Accept loop exited unexpectedly");
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received shutdown signal");
        }
    }

    Ok(())
}

/// Builds every protocol definition once; connections share them read-only.
fn load_protocols(config: &ProxyConfig) -> anyhow::Result<ProtocolManager> {
    let providers: [&dyn ProtocolProvider; 3] = [
        &Protocol1_9To1_8,
        &Protocol1_20_2To1_20,
        &Protocol1_20_5To1_20_3,
    ];
    let mut manager = ProtocolManager::new();
    for provider in providers {
        let mappings =
            MappingData::load_or_bundled(config.mappings_dir.as_deref(), &provider.mapping_name())?;
        manager.register_provider(provider, Arc::new(mappings))?;
    }
    Ok(manager)
}

async fn accept_loop(
    listener: TcpListener,
    config: Arc<ProxyConfig>,
    manager: Arc<ProtocolManager>,
    server_version: ProtocolVersion,
) {
    loop {
        match listener.accept().await {
            Ok((socket, peer)) => {
                info!("New connection from {}", peer);
                let config = config.clone();
                let manager = manager.clone();
                tokio::spawn(async move {
                    network::handle_connection(socket, config, manager, server_version).await;
                });
            }
            Err(e) => {
                error!("Failed to accept connection: {}", e);
            }
        }
    }
}
