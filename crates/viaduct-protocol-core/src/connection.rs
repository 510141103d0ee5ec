use crate::codec::{read_varint, varint_len, write_varint, CodecError};
use bytes::{Buf, Bytes, BytesMut};
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use std::io::{Read as _, Write as _};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpStream, ToSocketAddrs};
use tracing::trace;

/// Largest uncompressed packet the vanilla client accepts.
const MAX_PACKET_LEN: usize = 8 * 1024 * 1024;

/// A framed Minecraft protocol connection with optional compression.
pub struct Connection {
    stream: TcpStream,
    read_buf: BytesMut,
    compression_threshold: Option<i32>,
}

impl Connection {
    pub fn new(stream: TcpStream) -> Self {
        Self {
            stream,
            read_buf: BytesMut::with_capacity(4096),
            compression_threshold: None,
        }
    }

    pub async fn connect(addr: impl ToSocketAddrs) -> anyhow::Result<Self> {
        let stream = TcpStream::connect(addr).await?;
        stream.set_nodelay(true)?;
        Ok(Self::new(stream))
    }

    /// Enable zlib compression with the given threshold. Negative disables it.
    pub fn enable_compression(&mut self, threshold: i32) {
        self.compression_threshold = (threshold >= 0).then_some(threshold);
    }

    pub fn compression_threshold(&self) -> Option<i32> {
        self.compression_threshold
    }

    /// Read a single packet frame, returning (packet_id, payload).
    ///
    /// Cancel safe: bytes are only buffered once a read has completed.
    pub async fn read_packet(&mut self) -> anyhow::Result<(i32, Bytes)> {
        loop {
            if let Some(result) = try_parse_packet(&mut self.read_buf, self.compression_threshold)?
            {
                return Ok(result);
            }
            let mut tmp = [0u8; 4096];
            let n = self.stream.read(&mut tmp).await?;
            if n == 0 {
                return Err(anyhow::anyhow!("Connection closed"));
            }
            self.read_buf.extend_from_slice(&tmp[..n]);
        }
    }

    /// Write a packet with the given ID and payload.
    pub async fn write_packet(&mut self, packet_id: i32, payload: &[u8]) -> anyhow::Result<()> {
        let frame = build_frame(packet_id, payload, self.compression_threshold)?;
        self.stream.write_all(&frame).await?;
        Ok(())
    }

    pub fn peer_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.stream.peer_addr()
    }
}

fn try_parse_packet(
    read_buf: &mut BytesMut,
    compression_threshold: Option<i32>,
) -> anyhow::Result<Option<(i32, Bytes)>> {
    if read_buf.is_empty() {
        return Ok(None);
    }

    let mut peek = &read_buf[..];
    let length = match read_varint(&mut peek) {
        Ok(len) => len as usize,
        Err(CodecError::NotEnoughData) => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    if length > MAX_PACKET_LEN {
        anyhow::bail!("Packet length {} exceeds limit", length);
    }

    let varint_bytes = read_buf.len() - peek.len();

    if peek.remaining() < length {
        return Ok(None);
    }

    read_buf.advance(varint_bytes);
    let mut packet_data = read_buf.split_to(length).freeze();

    if compression_threshold.is_some() {
        let data_length = read_varint(&mut packet_data)? as usize;
        if data_length > MAX_PACKET_LEN {
            anyhow::bail!("Decompressed length {} exceeds limit", data_length);
        }
        if data_length > 0 {
            let mut decompressed = vec![0u8; data_length];
            let mut decoder = ZlibDecoder::new(&packet_data[..]);
            decoder.read_exact(&mut decompressed)?;
            packet_data = Bytes::from(decompressed);
        }
    }

    let packet_id = read_varint(&mut packet_data)?;
    trace!("Read packet id=0x{:02X} len={}", packet_id, packet_data.len());

    Ok(Some((packet_id, packet_data)))
}

fn build_frame(
    packet_id: i32,
    payload: &[u8],
    compression_threshold: Option<i32>,
) -> std::io::Result<BytesMut> {
    let mut packet_buf = BytesMut::new();
    write_varint(&mut packet_buf, packet_id);
    packet_buf.extend_from_slice(payload);

    let mut frame = BytesMut::new();

    if let Some(threshold) = compression_threshold {
        let uncompressed_len = packet_buf.len() as i32;
        if uncompressed_len >= threshold {
            let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
            encoder.write_all(&packet_buf)?;
            let compressed = encoder.finish()?;

            let data_length_size = varint_len(uncompressed_len);
            let total_length = data_length_size + compressed.len();
            write_varint(&mut frame, total_length as i32);
            write_varint(&mut frame, uncompressed_len);
            frame.extend_from_slice(&compressed);
        } else {
            let total_length = 1 + packet_buf.len();
            write_varint(&mut frame, total_length as i32);
            write_varint(&mut frame, 0);
            frame.extend_from_slice(&packet_buf);
        }
    } else {
        write_varint(&mut frame, packet_buf.len() as i32);
        frame.extend_from_slice(&packet_buf);
    }

    Ok(frame)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uncompressed_frame_roundtrip() {
        let mut buf = build_frame(0x21, &[1, 2, 3], None).unwrap();
        assert_eq!(&buf[..], &[4, 0x21, 1, 2, 3]);
        let (id, payload) = try_parse_packet(&mut buf, None).unwrap().unwrap();
        assert_eq!((id, &payload[..]), (0x21, &[1, 2, 3][..]));
        assert!(buf.is_empty());
    }

    #[test]
    fn test_compressed_frame_roundtrip() {
        let payload = vec![7u8; 600];
        let mut buf = build_frame(0x05, &payload, Some(256)).unwrap();
        assert!(buf.len() < payload.len(), "repetitive payload compresses");
        let (id, out) = try_parse_packet(&mut buf, Some(256)).unwrap().unwrap();
        assert_eq!(id, 0x05);
        assert_eq!(&out[..], &payload[..]);

        let mut small = build_frame(0x05, &[1], Some(256)).unwrap();
        assert_eq!(small[1], 0, "below threshold is sent with data length 0");
        let (_, out) = try_parse_packet(&mut small, Some(256)).unwrap().unwrap();
        assert_eq!(&out[..], &[1]);
    }

    #[test]
    fn test_partial_frame_waits() {
        let frame = build_frame(0x01, &[9; 10], None).unwrap();
        let mut partial = BytesMut::from(&frame[..5]);
        assert!(try_parse_packet(&mut partial, None).unwrap().is_none());
        assert_eq!(partial.len(), 5);
    }
}
