use super::TransportError;
use tokio::io::{
    AsyncRead,
    AsyncReadExt,
    AsyncWrite,
    AsyncWriteExt,
};

pub(crate) const TYPE_LOGIN: i32 = 3;
pub(crate) const TYPE_COMMAND: i32 = 2;
pub(crate) const TYPE_AUTH_RESPONSE: i32 = 2;
pub(crate) const TYPE_RESPONSE_VALUE: i32 = 0;

/// Minecraft drops requests whose body is longer than this.
pub(crate) const MAX_COMMAND_LEN: usize = 1446;
/// Upper bound for a single response packet, well above the 4096 byte body the
/// vanilla server sends.
pub(crate) const MAX_RESPONSE_PACKET: usize = 1 << 20;

/// id + type + two trailing NULs
const HEADER_LEN: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Packet {
    pub(crate) id: i32,
    pub(crate) kind: i32,
    pub(crate) body: String,
}

impl Packet {
    pub(crate) fn new(id: i32, kind: i32, body: impl Into<String>) -> Self {
        Self {
            id,
            kind,
            body: body.into(),
        }
    }

    pub(crate) fn encode(&self) -> Vec<u8> {
        let length = (HEADER_LEN + self.body.len()) as i32;
        let mut buf = Vec::with_capacity(4 + HEADER_LEN + self.body.len());
        buf.extend_from_slice(&length.to_le_bytes());
        buf.extend_from_slice(&self.id.to_le_bytes());
        buf.extend_from_slice(&self.kind.to_le_bytes());
        buf.extend_from_slice(self.body.as_bytes());
        buf.extend_from_slice(&[0, 0]);
        buf
    }
}

pub(crate) async fn write_packet<W>(writer: &mut W, packet: &Packet) -> Result<(), TransportError>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(&packet.encode()).await?;
    writer.flush().await?;
    Ok(())
}

pub(crate) async fn read_packet<R>(reader: &mut R) -> Result<Packet, TransportError>
where
    R: AsyncRead + Unpin,
{
    let length = reader.read_i32_le().await?;
    let length = usize::try_from(length).map_err(|_| TransportError::Protocol(format!("negative length {length}")))?;
    if !(HEADER_LEN..=MAX_RESPONSE_PACKET).contains(&length) {
        return Err(TransportError::Protocol(format!("packet length {length} out of range")));
    }

    let mut buf = vec![0u8; length];
    reader.read_exact(&mut buf).await?;

    let id = i32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]);
    let kind = i32::from_le_bytes([buf[4], buf[5], buf[6], buf[7]]);
    let body = &buf[8..];
    let body = match body.iter().position(|byte| *byte == 0) {
        Some(end) => &body[..end],
        None => body,
    };

    Ok(Packet {
        id,
        kind,
        body: String::from_utf8_lossy(body).into_owned(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn encodes_little_endian_frame() {
        let bytes = Packet::new(7, TYPE_COMMAND, "list").encode();
        assert_eq!(
            bytes,
            vec![14, 0, 0, 0, 7, 0, 0, 0, 2, 0, 0, 0, b'l', b'i', b's', b't', 0, 0]
        );
    }

    #[tokio::test]
    async fn reads_back_what_was_written() {
        let packet = Packet::new(-1, TYPE_AUTH_RESPONSE, "");
        let bytes = packet.encode();
        let decoded = read_packet(&mut bytes.as_slice()).await.unwrap();
        assert_eq!(decoded, packet);
    }

    #[tokio::test]
    async fn rejects_short_frames() {
        let bytes = [4i32.to_le_bytes(), 0i32.to_le_bytes()].concat();
        let err = read_packet(&mut bytes.as_slice()).await.unwrap_err();
        assert!(matches!(err, TransportError::Protocol(_)), "{err}");
    }

    #[tokio::test]
    async fn truncated_stream_is_an_io_error() {
        let mut bytes = Packet::new(1, TYPE_RESPONSE_VALUE, "hello").encode();
        bytes.truncate(9);
        let err = read_packet(&mut bytes.as_slice()).await.unwrap_err();
        assert!(matches!(err, TransportError::Io(_)), "{err}");
    }
}
