//! Media source adapters.
//!
//! - `fs` - directory mirror (`<root>/<chat>/<message>`)
//! - `http` - HTTP bridge (`{base}/chats/{chat}/messages/{message}/media`)

mod fs;
mod http;

pub use fs::{CHUNK_SIZE, FsMediaSource};
pub use http::HttpMediaSource;
