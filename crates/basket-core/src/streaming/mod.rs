mod connection;
mod framing;
mod types;

pub use connection::{EventCallback, StreamError, StreamManager, StreamState};
pub use framing::{decode_line, LineDecoder, DATA_PREFIX};
pub use types::{StreamEvent, Topic};
