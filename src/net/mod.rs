//! Network contract with the game server
//!
//! Only message shapes and rates live here; the socket itself belongs to the
//! embedding application, which feeds received text in and drains outgoing
//! envelopes.

pub mod outbound;
pub mod protocol;

pub use outbound::{InputStream, PingTracker};
pub use protocol::{ClientEnvelope, EventWatcher, InputSnapshot, ServerEnvelope};
