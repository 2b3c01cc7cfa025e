//! WebSocket protocol message definitions
//!
//! JSON text frames tagged by `type`. These are the wire types for
//! client-server communication.

use serde::{Deserialize, Serialize};

use crate::error::ProtocolError;
use crate::sim::{ControlInput, MatchEvent, MatchState};

/// One sampled control input as sent to the server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputSnapshot {
    pub player_id: String,
    /// Monotonic per-connection counter
    pub sequence: u64,
    pub throttle: f64,
    pub steer: f64,
    pub boost: bool,
    pub jump: bool,
    pub handbrake: bool,
    /// Client wall clock when sampled (Unix ms)
    pub client_ms: i64,
}

impl InputSnapshot {
    pub fn new(player_id: impl Into<String>, sequence: u64, input: &ControlInput, client_ms: i64) -> Self {
        let input = input.sanitized();
        Self {
            player_id: player_id.into(),
            sequence,
            throttle: input.throttle,
            steer: input.steer,
            boost: input.boost,
            jump: input.jump,
            handbrake: input.handbrake,
            client_ms,
        }
    }

    pub fn control(&self) -> ControlInput {
        ControlInput {
            throttle: self.throttle,
            steer: self.steer,
            boost: self.boost,
            jump: self.jump,
            handbrake: self.handbrake,
        }
    }
}

/// Messages sent from client to server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientEnvelope {
    /// Sent once after the socket opens
    Hello,
    /// Latest control input
    Input { input: InputSnapshot },
    /// Latency probe, answered by `pong`
    Ping,
}

impl ClientEnvelope {
    pub fn encode(&self) -> Result<String, ProtocolError> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Messages sent from server to client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerEnvelope {
    /// Greeting after join, usually with the current state
    Welcome {
        #[serde(default)]
        tick: u64,
        #[serde(default)]
        state: Option<Box<MatchState>>,
        #[serde(default)]
        server_ms: i64,
    },

    /// Authoritative snapshot
    State {
        #[serde(default)]
        tick: u64,
        #[serde(default)]
        state: Option<Box<MatchState>>,
        #[serde(default)]
        server_ms: i64,
    },

    /// Answer to `ping`
    Pong {
        #[serde(default)]
        server_ms: i64,
        #[serde(default)]
        ack_seq: u64,
    },

    /// Server-side failure report
    Error {
        #[serde(default)]
        message: String,
    },

    /// Anything newer than this client understands
    #[serde(other)]
    Unknown,
}

impl ServerEnvelope {
    pub fn decode(text: &str) -> Result<Self, ProtocolError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Wire name of the message type
    pub fn kind(&self) -> &'static str {
        match self {
            ServerEnvelope::Welcome { .. } => "welcome",
            ServerEnvelope::State { .. } => "state",
            ServerEnvelope::Pong { .. } => "pong",
            ServerEnvelope::Error { .. } => "error",
            ServerEnvelope::Unknown => "unknown",
        }
    }

    /// Extract an authoritative match state, if this message carries one
    ///
    /// A `state` message without a payload and any `error` message are
    /// errors; a bare `welcome`, `pong` or unknown message is simply empty.
    pub fn into_state(self) -> Result<Option<MatchState>, ProtocolError> {
        match self {
            ServerEnvelope::Welcome { state, .. } => Ok(state.map(|s| *s)),
            ServerEnvelope::State { state: Some(state), .. } => Ok(Some(*state)),
            ServerEnvelope::State { state: None, .. } => Err(ProtocolError::MissingState("state")),
            ServerEnvelope::Error { message } => Err(ProtocolError::Server(if message.is_empty() {
                "unknown".to_string()
            } else {
                message
            })),
            ServerEnvelope::Pong { .. } | ServerEnvelope::Unknown => Ok(None),
        }
    }
}

/// Reports each snapshot's newest event once
///
/// Snapshots repeat for several frames and the server may resend a tick's
/// events, so the newest event is compared by signature with the last one
/// reported.
#[derive(Debug, Clone, Default)]
pub struct EventWatcher {
    last_signature: Option<String>,
}

impl EventWatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// The snapshot's newest event if it has not been seen yet
    pub fn observe<'a>(&mut self, state: &'a MatchState) -> Option<&'a MatchEvent> {
        let event = state.last_event()?;
        let signature = event.signature();
        if self.last_signature.as_deref() == Some(signature.as_str()) {
            return None;
        }
        self.last_signature = Some(signature);
        Some(event)
    }

    /// Forget history (new session)
    pub fn reset(&mut self) {
        self.last_signature = None;
    }
}
