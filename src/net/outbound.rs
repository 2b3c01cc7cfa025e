//! Outbound traffic pacing
//!
//! Inputs go out at a fixed rate regardless of render rate, and pings go out
//! on a slower fixed interval. Neither is acknowledged or retried: a lost
//! input is superseded by the next one.

use super::protocol::InputSnapshot;
use crate::sim::ControlInput;

/// Most send intervals allowed to pile up after a stall
const MAX_BACKLOG_INTERVALS: f64 = 2.0;

/// Fixed-rate input sender for one connection
#[derive(Debug, Clone)]
pub struct InputStream {
    player_id: String,
    interval_ms: f64,
    pending_ms: f64,
    next_sequence: u64,
}

impl InputStream {
    /// `send_hz` must be positive; `Settings::validate` enforces this
    pub fn new(player_id: impl Into<String>, send_hz: f64) -> Self {
        Self {
            player_id: player_id.into(),
            interval_ms: 1000.0 / send_hz,
            pending_ms: 0.0,
            next_sequence: 0,
        }
    }

    pub fn player_id(&self) -> &str {
        &self.player_id
    }

    /// Sequence number the next snapshot will carry
    pub fn next_sequence(&self) -> u64 {
        self.next_sequence
    }

    /// Account for elapsed frame time
    pub fn advance(&mut self, elapsed_ms: f64) {
        if elapsed_ms.is_finite() && elapsed_ms > 0.0 {
            self.pending_ms = (self.pending_ms + elapsed_ms).min(self.interval_ms * MAX_BACKLOG_INTERVALS);
        }
    }

    /// Next due input snapshot, if a send interval has elapsed
    pub fn next_due(&mut self, input: &ControlInput, client_ms: i64) -> Option<InputSnapshot> {
        if self.pending_ms < self.interval_ms {
            return None;
        }
        self.pending_ms -= self.interval_ms;
        let snapshot = InputSnapshot::new(self.player_id.clone(), self.next_sequence, input, client_ms);
        self.next_sequence += 1;
        Some(snapshot)
    }
}

/// Periodic ping with round-trip measurement
#[derive(Debug, Clone)]
pub struct PingTracker {
    interval_ms: f64,
    since_last_ms: f64,
    sent_at_ms: Option<i64>,
    rtt_ms: Option<i64>,
}

impl PingTracker {
    pub fn new(interval_ms: f64) -> Self {
        Self {
            interval_ms,
            since_last_ms: 0.0,
            sent_at_ms: None,
            rtt_ms: None,
        }
    }

    /// Account for elapsed time; returns true when a ping should go out now
    pub fn advance(&mut self, elapsed_ms: f64, now_ms: i64) -> bool {
        if elapsed_ms.is_finite() && elapsed_ms > 0.0 {
            self.since_last_ms += elapsed_ms;
        }
        if self.since_last_ms < self.interval_ms {
            return false;
        }
        self.since_last_ms = 0.0;
        self.sent_at_ms = Some(now_ms);
        true
    }

    /// Record a pong; returns the measured round trip
    pub fn on_pong(&mut self, now_ms: i64) -> Option<i64> {
        let sent = self.sent_at_ms.take()?;
        let rtt = (now_ms - sent).max(0);
        self.rtt_ms = Some(rtt);
        Some(rtt)
    }

    /// Last measured round trip
    pub fn rtt_ms(&self) -> Option<i64> {
        self.rtt_ms
    }
}
