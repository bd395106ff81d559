use serde::{Serialize, de::DeserializeOwned};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use utilities::result::Result;

/// Upper bound on a single frame. Chunk payloads are base64 so a frame is
/// roughly 4/3 of the chunk size plus the envelope.
pub const MAX_FRAME_BYTES: u32 = 64 * 1024 * 1024;

/// Writes one length-prefixed JSON frame: u32 little-endian byte count
/// followed by the document itself.
pub async fn write_frame<T: Serialize>(
    stream: &mut (impl AsyncWrite + Unpin),
    message: &T,
) -> Result<()> {
    let payload = serde_json::to_vec(message)?;
    if payload.len() > MAX_FRAME_BYTES as usize {
        return Err(format!(
            "refusing to send a {} byte frame (limit {MAX_FRAME_BYTES})",
            payload.len()
        )
        .into());
    }
    stream.write_u32_le(payload.len() as u32).await?;
    stream.write_all(&payload).await?;
    stream.flush().await?;
    Ok(())
}

/// Reads one frame. `Ok(None)` means the peer closed the connection at a
/// frame boundary.
pub async fn read_frame<T: DeserializeOwned>(
    stream: &mut (impl AsyncRead + Unpin),
) -> Result<Option<T>> {
    let frame_size = match stream.read_u32_le().await {
        Ok(v) => v,
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    if frame_size > MAX_FRAME_BYTES {
        return Err(
            format!("peer announced a {frame_size} byte frame (limit {MAX_FRAME_BYTES})").into(),
        );
    }
    let mut raw = vec![0u8; frame_size as usize];
    stream.read_exact(&mut raw).await?;
    Ok(Some(serde_json::from_slice(&raw)?))
}

/// One request/response exchange on an established stream.
pub async fn call<Req, Resp>(
    stream: &mut (impl AsyncRead + AsyncWrite + Unpin),
    request: &Req,
) -> Result<Resp>
where
    Req: Serialize,
    Resp: DeserializeOwned,
{
    write_frame(stream, request).await?;
    match read_frame(stream).await? {
        Some(response) => Ok(response),
        None => Err("connection closed before a response frame arrived".into()),
    }
}
