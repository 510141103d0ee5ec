use crate::config::ProxyConfig;
use anyhow::Result;
use std::sync::Arc;
use tokio::net::TcpStream;
use tracing::{debug, info, warn};
use viaduct_protocol_core::codec::read_varint;
use viaduct_protocol_core::{
    Connection, ConnectionPipeline, ConnectionState, ProtocolManager, ProtocolVersion, RawPacket,
};

/// Login clientbound encryption request, identical in every supported version.
const ENCRYPTION_REQUEST: i32 = 0x01;

/// Proxy one client connection to the backend until either side closes.
pub async fn handle_connection(
    stream: TcpStream,
    config: Arc<ProxyConfig>,
    manager: Arc<ProtocolManager>,
    server_version: ProtocolVersion,
) {
    let peer = stream
        .peer_addr()
        .map(|addr| addr.to_string())
        .unwrap_or_else(|_| "unknown".into());
    if let Err(e) = stream.set_nodelay(true) {
        debug!("Failed to set nodelay for {}: {}", peer, e);
    }
    let mut client = Connection::new(stream);

    if let Err(e) = proxy(&mut client, &config, &manager, server_version).await {
        debug!("Connection {} ended: {}", peer, e);
    }
}

/// Picks the definition chain for a client. Unsupported clients get an
/// identity pipeline so status pings still reach the backend.
fn negotiate(
    manager: &ProtocolManager,
    client_version: ProtocolVersion,
    server_version: ProtocolVersion,
) -> (ConnectionPipeline, bool) {
    match manager.path(client_version, server_version) {
        Some(path) => (
            ConnectionPipeline::new(client_version, server_version, path),
            true,
        ),
        None => (
            ConnectionPipeline::new(client_version, client_version, Vec::new()),
            false,
        ),
    }
}

async fn proxy(
    client: &mut Connection,
    config: &ProxyConfig,
    manager: &ProtocolManager,
    server_version: ProtocolVersion,
) -> Result<()> {
    // === Handshake ===
    let (id, handshake) = client.read_packet().await?;
    if id != 0x00 {
        return Err(anyhow::anyhow!("Expected handshake, got 0x{:02X}", id));
    }
    let client_version = ProtocolVersion(read_varint(&mut handshake.clone())?);
    let (mut pipeline, supported) = negotiate(manager, client_version, server_version);
    let handshake = pipeline.handle_serverbound(id, handshake)?;

    if !supported && pipeline.client_link().phase == ConnectionState::Login {
        let versions: Vec<_> = manager
            .supported_clients(server_version)
            .into_iter()
            .map(ProtocolVersion::name)
            .collect();
        let reason = format!(
            "Client version {} is not supported, use one of: {}",
            client_version,
            versions.join(", ")
        );
        send_disconnect(client, &pipeline, &reason).await;
        return Err(anyhow::anyhow!(reason));
    }
    info!(
        "Client {} -> server {} over {} stage(s)",
        client_version,
        server_version,
        pipeline.stage_count()
    );

    let mut server = Connection::connect(config.backend.as_str()).await?;
    write_all(&mut server, &handshake).await?;

    let result = relay(client, &mut server, &mut pipeline).await;
    let stats = pipeline.stats();
    if stats != Default::default() {
        debug!("Translation stats: {:?}", stats);
    }
    pipeline.close();
    result
}

async fn relay(
    client: &mut Connection,
    server: &mut Connection,
    pipeline: &mut ConnectionPipeline,
) -> Result<()> {
    let mut threshold = -1;
    loop {
        tokio::select! {
            read = client.read_packet() => {
                let (id, payload) = read?;
                match pipeline.handle_serverbound(id, payload) {
                    Ok(packets) => write_all(server, &packets).await?,
                    Err(e) => {
                        warn!("Dropping client: {}", e);
                        send_disconnect(client, pipeline, &e.to_string()).await;
                        return Err(e.into());
                    }
                }
            }
            read = server.read_packet() => {
                let (id, payload) = read?;
                let link = pipeline.server_link();
                if link.phase == ConnectionState::Login {
                    if id == link.version.set_compression_id() {
                        threshold = read_varint(&mut payload.clone())?;
                        server.enable_compression(threshold);
                    } else if id == ENCRYPTION_REQUEST {
                        let reason = "The backend must run in offline mode";
                        send_disconnect(client, pipeline, reason).await;
                        return Err(anyhow::anyhow!(reason));
                    }
                }

                let packets = match pipeline.handle_clientbound(id, payload) {
                    Ok(packets) => packets,
                    Err(e) => {
                        warn!("Dropping client: {}", e);
                        send_disconnect(client, pipeline, &e.to_string()).await;
                        return Err(e.into());
                    }
                };
                let client_version = pipeline.client_link().version;
                for packet in packets {
                    client.write_packet(packet.id, &packet.payload).await?;
                    if packet.phase == ConnectionState::Login
                        && packet.id == client_version.set_compression_id()
                    {
                        client.enable_compression(threshold);
                    }
                }
            }
        }
    }
}

async fn write_all(conn: &mut Connection, packets: &[RawPacket]) -> Result<()> {
    for packet in packets {
        conn.write_packet(packet.id, &packet.payload).await?;
    }
    Ok(())
}

async fn send_disconnect(client: &mut Connection, pipeline: &ConnectionPipeline, reason: &str) {
    let Some(packet) = pipeline.disconnect_packet(reason) else {
        return;
    };
    if let Err(e) = client.write_packet(packet.id, &packet.payload).await {
        debug!("Failed to send disconnect: {}", e);
    }
}
