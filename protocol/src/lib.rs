//! prand protocol engine: signed envelopes, insurer selection, and the
//! server and client sides of the four-round exchange.

mod audit;
pub mod client;
pub mod config;
pub mod envelope;
pub mod error;
pub mod selection;
pub mod server;
pub mod transcript;
pub mod transport;

pub use client::{ClientSession, RandomOutput};
pub use config::{MalformedDealPolicy, RevealPolicy, SessionConfig};
pub use envelope::MAX_ENVELOPE_SIZE;
pub use error::{AuthError, ClientError, SessionError, TransportError};
pub use selection::select_insurers;
pub use server::{Phase, ServerIdentity, ServerSession, SessionOutcome};
pub use transcript::{verify_transcript, Transcript};
pub use transport::Transport;
