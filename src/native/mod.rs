//! Native messaging transport.
//!
//! Every message is a 32-bit length in native byte order followed by that
//! many bytes of UTF-8 JSON. Hosts are located through their manifest and
//! spawned once per message.

pub mod manifest;
pub mod stdio;

pub use stdio::StdioNativeMessenger;

use crate::error::NativeMessagingError;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Largest response a host may send back
pub const MAX_FROM_HOST: u64 = 1024 * 1024;

/// Largest message that can be sent to a host
pub const MAX_TO_HOST: u64 = u32::MAX as u64;

/// Write one framed message
pub async fn write_message<W>(
    writer: &mut W,
    message: &serde_json::Value,
) -> Result<(), NativeMessagingError>
where
    W: AsyncWrite + Unpin,
{
    let body = serde_json::to_vec(message)?;
    let len = body.len() as u64;
    if len > MAX_TO_HOST {
        return Err(NativeMessagingError::FrameTooLarge {
            len,
            max: MAX_TO_HOST,
        });
    }

    writer.write_all(&(len as u32).to_ne_bytes()).await?;
    writer.write_all(&body).await?;
    writer.flush().await?;
    ::log::trace!("Wrote native message of {} bytes", len);
    Ok(())
}

/// Read one framed message
///
/// Returns `None` when the stream ends cleanly before a new frame starts.
/// Frames longer than `max` bytes are rejected without reading the body.
pub async fn read_message<R>(
    reader: &mut R,
    max: u64,
) -> Result<Option<serde_json::Value>, NativeMessagingError>
where
    R: AsyncRead + Unpin,
{
    let mut header = [0u8; 4];
    let mut filled = 0;
    while filled < header.len() {
        let n = reader.read(&mut header[filled..]).await?;
        if n == 0 {
            if filled == 0 {
                return Ok(None);
            }
            return Err(NativeMessagingError::Io(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "truncated native message header",
            )));
        }
        filled += n;
    }

    let len = u32::from_ne_bytes(header) as u64;
    if len > max {
        return Err(NativeMessagingError::FrameTooLarge { len, max });
    }

    let mut body = vec![0u8; len as usize];
    reader.read_exact(&mut body).await?;
    ::log::trace!("Read native message of {} bytes", len);

    Ok(Some(serde_json::from_slice(&body)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn frame(body: &[u8]) -> Vec<u8> {
        let mut bytes = (body.len() as u32).to_ne_bytes().to_vec();
        bytes.extend_from_slice(body);
        bytes
    }

    #[tokio::test]
    async fn test_write_uses_native_endian_length_prefix() {
        let mut out: Vec<u8> = Vec::new();
        write_message(&mut out, &json!({"status": "ok"})).await.unwrap();

        let body = br#"{"status":"ok"}"#;
        assert_eq!(out, frame(body));
    }

    #[tokio::test]
    async fn test_read_frames_in_sequence() {
        let mut bytes = frame(br#"{"title":"A"}"#);
        bytes.extend(frame(b"[1,2,3]"));
        let mut reader = bytes.as_slice();

        let first = read_message(&mut reader, MAX_FROM_HOST).await.unwrap();
        assert_eq!(first, Some(json!({"title": "A"})));
        let second = read_message(&mut reader, MAX_FROM_HOST).await.unwrap();
        assert_eq!(second, Some(json!([1, 2, 3])));
        let end = read_message(&mut reader, MAX_FROM_HOST).await.unwrap();
        assert_eq!(end, None);
    }

    #[tokio::test]
    async fn test_truncated_frames_are_errors() {
        // Header cut short
        let mut reader: &[u8] = &[5, 0];
        assert!(matches!(
            read_message(&mut reader, MAX_FROM_HOST).await,
            Err(NativeMessagingError::Io(_))
        ));

        // Body cut short
        let bytes = frame(br#"{"title":"A"}"#);
        let mut reader = &bytes[..bytes.len() - 3];
        assert!(matches!(
            read_message(&mut reader, MAX_FROM_HOST).await,
            Err(NativeMessagingError::Io(_))
        ));
    }

    #[tokio::test]
    async fn test_oversize_frame_rejected_before_body() {
        let header = ((MAX_FROM_HOST + 1) as u32).to_ne_bytes();
        let mut reader: &[u8] = &header;
        match read_message(&mut reader, MAX_FROM_HOST).await {
            Err(NativeMessagingError::FrameTooLarge { len, max }) => {
                assert_eq!(len, MAX_FROM_HOST + 1);
                assert_eq!(max, MAX_FROM_HOST);
            }
            other => panic!("expected FrameTooLarge, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_invalid_json_body() {
        let bytes = frame(b"not json");
        let mut reader = bytes.as_slice();
        assert!(matches!(
            read_message(&mut reader, MAX_FROM_HOST).await,
            Err(NativeMessagingError::Json(_))
        ));
    }
}
