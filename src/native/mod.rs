//! Native Messaging Host
//!
//! Serves the bookmark store to a browser extension that launches this
//! process through a native-messaging manifest. The browser talks over the
//! child's stdin/stdout using length-prefixed JSON frames.
//!
//! # Protocol
//!
//! - Every frame is a 4-byte little-endian length followed by that many bytes
//!   of UTF-8 JSON, in both directions
//! - `{"type":"ping"}` answers `{"type":"pong","success":true}`
//! - `{"type":"save_bookmark","data":{...}}` answers the same
//!   `{success, bookmark_id}` / `{success, error}` body the HTTP endpoint uses
//! - Any other type answers `{"success":false,"error":"Unknown message type: ..."}`
//!
//! # Usage
//!
//! ```rust,ignore
//! use bookmark_host::native::NativeHost;
//!
//! let host = NativeHost::new(db, cfg.native.max_message_bytes);
//! host.serve(tokio::io::stdin(), tokio::io::stdout()).await;
//! ```

mod framing;
mod handler;
mod host;

pub use framing::{read_message, write_message};
pub use handler::{Reply, handle_message};
pub use host::NativeHost;
