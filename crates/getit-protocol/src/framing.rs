//! Length-prefixed message framing.
//!
//! Every request and response travels as `len:u16 big-endian | payload`.

use crate::{ProtocolError, ProtocolResult};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Maximum frame payload length (the length prefix is a u16).
pub const MAX_FRAME_LEN: usize = u16::MAX as usize;

/// Write one framed payload.
pub async fn write_frame<W: AsyncWrite + Unpin>(writer: &mut W, payload: &[u8]) -> ProtocolResult<()> {
    if payload.len() > MAX_FRAME_LEN {
        return Err(ProtocolError::FrameTooLarge(payload.len()));
    }
    writer.write_all(&(payload.len() as u16).to_be_bytes()).await?;
    writer.write_all(payload).await?;
    writer.flush().await?;
    Ok(())
}

/// Read one framed payload.
pub async fn read_frame<R: AsyncRead + Unpin>(reader: &mut R) -> ProtocolResult<Vec<u8>> {
    let mut len_buf = [0u8; 2];
    reader.read_exact(&mut len_buf).await?;
    let len = u16::from_be_bytes(len_buf) as usize;

    let mut payload = vec![0u8; len];
    reader.read_exact(&mut payload).await?;
    Ok(payload)
}
