use serde::Serialize;
use serde_json::Value;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::FrameError;

const PREFIX_LEN: usize = 4;

/// Reads one frame.
///
/// Returns `Ok(None)` when the stream ends cleanly before a new frame starts.
/// An end of stream anywhere inside a frame is `FrameError::Truncated`.
pub async fn read_message<R>(reader: &mut R, max_len: usize) -> Result<Option<Value>, FrameError>
where
    R: AsyncRead + Unpin,
{
    let mut prefix = [0u8; PREFIX_LEN];
    let mut filled = 0;
    while filled < PREFIX_LEN {
        let n = reader.read(&mut prefix[filled..]).await?;
        if n == 0 {
            if filled == 0 {
                return Ok(None);
            }
            return Err(FrameError::Truncated);
        }
        filled += n;
    }

    let len = u32::from_le_bytes(prefix) as usize;
    if len > max_len {
        return Err(FrameError::TooLarge { len, max: max_len });
    }

    let mut body = vec![0u8; len];
    if let Err(e) = reader.read_exact(&mut body).await {
        if e.kind() == std::io::ErrorKind::UnexpectedEof {
            return Err(FrameError::Truncated);
        }
        return Err(e.into());
    }

    let text = String::from_utf8(body)?;
    Ok(Some(serde_json::from_str(&text)?))
}

/// Writes one frame and flushes, so the browser sees it immediately.
pub async fn write_message<W, T>(writer: &mut W, message: &T) -> Result<(), FrameError>
where
    W: AsyncWrite + Unpin,
    T: Serialize + ?Sized,
{
    let bytes = serde_json::to_vec(message)?;
    let len = u32::try_from(bytes.len()).map_err(|_| FrameError::TooLarge {
        len: bytes.len(),
        max: u32::MAX as usize,
    })?;

    writer.write_all(&len.to_le_bytes()).await?;
    writer.write_all(&bytes).await?;
    writer.flush().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn frame(body: &[u8]) -> Vec<u8> {
        let mut out = (body.len() as u32).to_le_bytes().to_vec();
        out.extend_from_slice(body);
        out
    }

    #[tokio::test]
    async fn test_reads_consecutive_frames_then_eof() {
        let mut input = frame(br#"{"type":"ping"}"#);
        input.extend(frame(br#"{"type":"save_bookmark","data":{"url":"u"}}"#));
        let mut reader = input.as_slice();

        let first = read_message(&mut reader, 1024).await.unwrap();
        assert_eq!(first, Some(json!({"type": "ping"})));
        let second = read_message(&mut reader, 1024).await.unwrap().unwrap();
        assert_eq!(second["data"]["url"], "u");
        assert!(read_message(&mut reader, 1024).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_write_uses_little_endian_prefix() {
        let mut out: Vec<u8> = Vec::new();
        write_message(&mut out, &json!({"type": "pong", "success": true}))
            .await
            .unwrap();

        let body = br#"{"success":true,"type":"pong"}"#;
        assert_eq!(&out[..4], &(body.len() as u32).to_le_bytes());
        let decoded: Value = serde_json::from_slice(&out[4..]).unwrap();
        assert_eq!(decoded, json!({"type": "pong", "success": true}));
    }

    #[tokio::test]
    async fn test_partial_prefix_is_truncated() {
        let mut reader: &[u8] = &[3, 0];
        let err = read_message(&mut reader, 1024).await.unwrap_err();
        assert!(matches!(err, FrameError::Truncated));
    }

    #[tokio::test]
    async fn test_short_body_is_truncated() {
        let mut input = 10u32.to_le_bytes().to_vec();
        input.extend_from_slice(b"{}");
        let mut reader = input.as_slice();
        let err = read_message(&mut reader, 1024).await.unwrap_err();
        assert!(matches!(err, FrameError::Truncated));
    }

    #[tokio::test]
    async fn test_oversized_frame_is_rejected_before_reading_body() {
        let input = 2048u32.to_le_bytes().to_vec();
        let mut reader = input.as_slice();
        let err = read_message(&mut reader, 1024).await.unwrap_err();
        assert!(matches!(err, FrameError::TooLarge { len: 2048, max: 1024 }));
    }

    #[tokio::test]
    async fn test_invalid_utf8_and_json_are_errors() {
        let input = frame(&[0xff, 0xfe]);
        let mut reader = input.as_slice();
        assert!(matches!(
            read_message(&mut reader, 1024).await.unwrap_err(),
            FrameError::Encoding(_)
        ));

        let input = frame(b"{nope");
        let mut reader = input.as_slice();
        assert!(matches!(
            read_message(&mut reader, 1024).await.unwrap_err(),
            FrameError::Json(_)
        ));
    }
}
