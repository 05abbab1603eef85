//! `Content-Length` message framing.
//!
//! ```text
//! Content-Length: 42\r\n
//! \r\n
//! {"jsonrpc":"2.0","id":1,"method":"..."}
//! ```

use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::trace;

use crate::error::{AgentError, AgentResult};

/// Largest body accepted from the agent (64 MiB).
const MAX_FRAME_SIZE: usize = 64 * 1024 * 1024;

/// Read one framed JSON message.
///
/// Returns `Ok(None)` on a clean end of stream before any header byte.
///
/// # Errors
///
/// Returns [`AgentError::Protocol`] for a missing or oversized
/// `Content-Length` and I/O errors as they occur. A body that is not JSON
/// gives [`AgentError::MalformedMessage`] after the whole frame is consumed,
/// so the caller can keep reading.
pub async fn read_message<R>(reader: &mut R) -> AgentResult<Option<Value>>
where
    R: AsyncBufRead + Unpin,
{
    let mut content_length: Option<usize> = None;
    let mut line = String::new();
    let mut saw_header = false;

    loop {
        line.clear();
        let read = reader.read_line(&mut line).await?;
        if read == 0 {
            if saw_header {
                return Err(AgentError::Protocol("stream ended inside headers".to_owned()));
            }
            return Ok(None);
        }

        let trimmed = line.trim();
        if trimmed.is_empty() {
            if content_length.is_some() {
                break;
            }
            continue;
        }
        saw_header = true;

        if let Some((name, value)) = trimmed.split_once(':')
            && name.trim().eq_ignore_ascii_case("content-length")
        {
            let len = value
                .trim()
                .parse::<usize>()
                .map_err(|_| AgentError::Protocol(format!("bad Content-Length '{}'", value.trim())))?;
            content_length = Some(len);
        }
    }

    let len = content_length.unwrap_or_default();
    if len > MAX_FRAME_SIZE {
        return Err(AgentError::Protocol(format!(
            "frame of {len} bytes exceeds the {MAX_FRAME_SIZE} byte limit"
        )));
    }

    let mut body = vec![0u8; len];
    reader.read_exact(&mut body).await?;
    trace!(bytes = len, "frame received");
    serde_json::from_slice(&body)
        .map(Some)
        .map_err(AgentError::MalformedMessage)
}

/// Write one framed JSON message and flush.
///
/// # Errors
///
/// Returns I/O or serialization errors.
pub async fn write_message<W>(writer: &mut W, message: &Value) -> AgentResult<()>
where
    W: AsyncWrite + Unpin + ?Sized,
{
    let body = serde_json::to_vec(message)?;
    let header = format!("Content-Length: {}\r\n\r\n", body.len());
    writer.write_all(header.as_bytes()).await?;
    writer.write_all(&body).await?;
    writer.flush().await?;
    trace!(bytes = body.len(), "frame sent");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tokio::io::BufReader;

    #[tokio::test]
    async fn test_write_then_read() {
        let mut buf = Vec::new();
        write_message(&mut buf, &json!({"jsonrpc": "2.0", "method": "ping"}))
            .await
            .unwrap();
        write_message(&mut buf, &json!({"jsonrpc": "2.0", "id": 1, "result": null}))
            .await
            .unwrap();

        let mut reader = BufReader::new(buf.as_slice());
        let first = read_message(&mut reader).await.unwrap().unwrap();
        assert_eq!(first["method"], json!("ping"));
        let second = read_message(&mut reader).await.unwrap().unwrap();
        assert_eq!(second["id"], json!(1));
        assert!(read_message(&mut reader).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_header_is_case_insensitive_and_extra_headers_ignored() {
        let raw = b"content-length: 2\r\nContent-Type: application/json\r\n\r\n{}";
        let mut reader = BufReader::new(&raw[..]);
        assert_eq!(read_message(&mut reader).await.unwrap(), Some(json!({})));
    }

    #[tokio::test]
    async fn test_bad_length_is_protocol_error() {
        let raw = b"Content-Length: lots\r\n\r\n{}";
        let mut reader = BufReader::new(&raw[..]);
        assert!(matches!(
            read_message(&mut reader).await,
            Err(AgentError::Protocol(_))
        ));
    }

    #[tokio::test]
    async fn test_truncated_headers() {
        let raw = b"Content-Length: 2\r\n";
        let mut reader = BufReader::new(&raw[..]);
        assert!(matches!(
            read_message(&mut reader).await,
            Err(AgentError::Protocol(_))
        ));
    }

    #[tokio::test]
    async fn test_oversized_frame_rejected() {
        let raw = format!("Content-Length: {}\r\n\r\n", MAX_FRAME_SIZE.saturating_add(1));
        let mut reader = BufReader::new(raw.as_bytes());
        assert!(matches!(
            read_message(&mut reader).await,
            Err(AgentError::Protocol(_))
        ));
    }

    #[tokio::test]
    async fn test_bad_body_keeps_stream_aligned() {
        let raw = b"Content-Length: 9\r\n\r\n{not jsonContent-Length: 2\r\n\r\n{}";
        let mut reader = BufReader::new(&raw[..]);
        assert!(matches!(
            read_message(&mut reader).await,
            Err(AgentError::MalformedMessage(_))
        ));
        assert_eq!(read_message(&mut reader).await.unwrap(), Some(json!({})));
    }
}
