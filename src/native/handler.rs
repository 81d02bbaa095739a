use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::api::SaveResponse;
use crate::db::Database;
use crate::model::BookmarkPayload;

const PING: &str = "ping";
const SAVE_BOOKMARK: &str = "save_bookmark";

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(untagged)]
pub enum Reply {
    Pong {
        #[serde(rename = "type")]
        kind: &'static str,
        success: bool,
    },
    Outcome(SaveResponse),
}

impl Reply {
    fn pong() -> Self {
        Reply::Pong {
            kind: "pong",
            success: true,
        }
    }
}

pub async fn handle_message(db: &Database, message: &Value) -> Reply {
    let message_type = message.get("type");

    match message_type.and_then(Value::as_str) {
        Some(PING) => Reply::pong(),
        Some(SAVE_BOOKMARK) => {
            let data = message.get("data").filter(|d| !d.is_null());
            let payload = match data {
                Some(data) => BookmarkPayload::deserialize(data),
                None => Ok(BookmarkPayload::default()),
            };
            match payload {
                Ok(payload) => Reply::Outcome(db.insert_bookmark(payload).await),
                Err(e) => {
                    tracing::error!("invalid bookmark data: {}", e);
                    Reply::Outcome(SaveResponse::failed(format!("Invalid bookmark data: {e}")))
                }
            }
        }
        _ => {
            let shown = match message_type {
                Some(Value::String(s)) => s.clone(),
                Some(other) => other.to_string(),
                None => "null".to_string(),
            };
            tracing::warn!("unknown message type: {}", shown);
            Reply::Outcome(SaveResponse::failed(format!("Unknown message type: {shown}")))
        }
    }
}
