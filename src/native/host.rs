use tokio::io::{AsyncRead, AsyncWrite};

use super::framing::{read_message, write_message};
use super::handler::handle_message;
use crate::db::Database;

pub struct NativeHost {
    db: Database,
    max_message_bytes: usize,
}

impl NativeHost {
    pub fn new(db: Database, max_message_bytes: usize) -> Self {
        NativeHost { db, max_message_bytes }
    }

    /// Answers messages one at a time until the input ends.
    ///
    /// A frame that cannot be read ends the session the same way end of
    /// input does. Failed sends are logged and the loop keeps going.
    /// Returns the number of messages handled.
    pub async fn serve<R, W>(&self, mut reader: R, mut writer: W) -> usize
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut handled = 0;

        loop {
            let message = match read_message(&mut reader, self.max_message_bytes).await {
                Ok(Some(message)) => message,
                Ok(None) => {
                    tracing::debug!("no message received (EOF)");
                    break;
                }
                Err(e) => {
                    tracing::error!("failed to receive message: {}", e);
                    break;
                }
            };
            tracing::debug!("received message: {}", message);

            let reply = handle_message(&self.db, &message).await;
            handled += 1;

            match write_message(&mut writer, &reply).await {
                Ok(()) => tracing::debug!("sent message: {:?}", reply),
                Err(e) => tracing::error!("failed to send message: {}", e),
            }
        }

        handled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    fn frame(message: &Value) -> Vec<u8> {
        let body = serde_json::to_vec(message).unwrap();
        let mut out = (body.len() as u32).to_le_bytes().to_vec();
        out.extend(body);
        out
    }

    async fn host(dir: &tempfile::TempDir) -> NativeHost {
        let db = Database::new(&dir.path().join("bookmarks.db")).await.unwrap();
        db.ensure_schema().await.unwrap();
        NativeHost::new(db, 1024 * 1024)
    }

    async fn replies(mut output: &[u8]) -> Vec<Value> {
        let mut out = vec![];
        while let Some(reply) = read_message(&mut output, usize::MAX).await.unwrap() {
            out.push(reply);
        }
        out
    }

    #[tokio::test]
    async fn test_session_answers_every_message_until_eof() {
        let dir = tempfile::tempdir().unwrap();
        let host = host(&dir).await;

        let mut input = frame(&json!({"type": "ping"}));
        input.extend(frame(&json!({"type": "sync"})));
        input.extend(frame(&json!({"type": "save_bookmark", "data": {"url": "u", "title": "t"}})));
        let mut output: Vec<u8> = Vec::new();

        let handled = host.serve(input.as_slice(), &mut output).await;

        assert_eq!(handled, 3);
        assert_eq!(
            replies(&output).await,
            vec![
                json!({"type": "pong", "success": true}),
                json!({"success": false, "error": "Unknown message type: sync"}),
                json!({"success": true, "bookmark_id": 1}),
            ]
        );
    }

    #[tokio::test]
    async fn test_empty_input_ends_cleanly() {
        let dir = tempfile::tempdir().unwrap();
        let host = host(&dir).await;
        let mut output: Vec<u8> = Vec::new();

        assert_eq!(host.serve(&[][..], &mut output).await, 0);
        assert!(output.is_empty());
    }

    #[tokio::test]
    async fn test_unreadable_frame_ends_the_session() {
        let dir = tempfile::tempdir().unwrap();
        let host = host(&dir).await;

        let mut input = frame(&json!({"type": "ping"}));
        input.extend(5u32.to_le_bytes());
        input.extend(b"{oops");
        input.extend(frame(&json!({"type": "ping"})));
        let mut output: Vec<u8> = Vec::new();

        assert_eq!(host.serve(input.as_slice(), &mut output).await, 1);
        assert_eq!(replies(&output).await.len(), 1);
    }
}
