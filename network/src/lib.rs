//! TCP networking for prand.
//!
//! Every protocol message travels as one frame: a big-endian `u32` length
//! followed by that many bytes of signed envelope. Servers accept one client
//! session per connection; the client opens one connection per roster
//! server and runs the rounds over all of them in parallel.

pub mod blocking;
pub mod connector;
pub mod error;
pub mod framing;
pub mod listener;
pub mod shutdown;

pub use blocking::FramedStream;
pub use connector::{run_client, ConnectorConfig};
pub use error::NetworkError;
pub use framing::{read_frame, write_frame, MAX_FRAME_SIZE};
pub use listener::{serve_connection, ServerListener};
pub use shutdown::ShutdownController;
