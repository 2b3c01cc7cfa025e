//! Session lifecycle
//!
//! Exactly one producer writes match state at a time: the local simulation
//! when offline, the server when online. Switching modes replaces the whole
//! session value, so the old mode's accumulator, jump contexts and network
//! pacing are dropped together and nothing from it can land afterwards.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use crate::driver::{FixedStepDriver, SnapshotSink};
use crate::error::ProtocolError;
use crate::net::{ClientEnvelope, InputStream, PingTracker, ServerEnvelope};
use crate::settings::Settings;
use crate::sim::{InputSource, MatchSim, MatchState};

/// Which producer currently owns the match state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionMode {
    Idle,
    Offline,
    Online,
}

impl SessionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionMode::Idle => "idle",
            SessionMode::Offline => "offline",
            SessionMode::Online => "online",
        }
    }
}

/// Single-player match simulated locally
pub struct OfflineSession {
    sim: MatchSim,
    driver: FixedStepDriver,
    local_id: String,
    bot_id: Option<String>,
}

impl OfflineSession {
    /// Fresh match with the local player and, if enabled, a bot opponent
    ///
    /// Match and bot ids come from the seeded RNG so a given seed always
    /// produces the same session.
    pub fn new(settings: &Settings, local_id: &str) -> Self {
        let mut rng = Pcg32::seed_from_u64(settings.offline_seed);
        let match_id = format!("offline-{:08x}", rng.random::<u32>());

        let mut sim = MatchSim::new(match_id, settings.match_duration_ms, &[]);
        let team = sim.ensure_player(local_id, &settings.display_name);
        let bot_id = if settings.bot_fill {
            let candidate = format!("bot_{}_{:08x}", team.opponent().as_str(), rng.random::<u32>());
            sim.ensure_bot_opponent(local_id, &candidate)
        } else {
            None
        };

        Self {
            sim,
            driver: FixedStepDriver::new(settings.max_frame_dt),
            local_id: local_id.to_string(),
            bot_id,
        }
    }

    pub fn sim(&self) -> &MatchSim {
        &self.sim
    }

    pub fn local_id(&self) -> &str {
        &self.local_id
    }

    pub fn bot_id(&self) -> Option<&str> {
        self.bot_id.as_deref()
    }

    pub fn driver(&self) -> &FixedStepDriver {
        &self.driver
    }

    /// Sample local input, run the due ticks and publish one snapshot
    fn frame(&mut self, frame_dt: f64, local: &mut dyn InputSource, sink: &mut dyn SnapshotSink) -> u32 {
        let input = local.control_for(&self.local_id, self.sim.state());
        self.sim.apply_input(&self.local_id, input);
        self.driver.frame(&mut self.sim, frame_dt, sink)
    }
}

/// Match simulated by the server; this side only mirrors and sends input
pub struct OnlineSession {
    player_id: String,
    match_id: String,
    latest: MatchState,
    snapshots_received: u64,
    inputs: InputStream,
    ping: PingTracker,
    outbox: Vec<ClientEnvelope>,
}

impl OnlineSession {
    pub fn new(settings: &Settings, player_id: &str, match_id: &str) -> Self {
        Self {
            player_id: player_id.to_string(),
            match_id: match_id.to_string(),
            latest: MatchState::new(match_id, 0),
            snapshots_received: 0,
            inputs: InputStream::new(player_id, settings.input_send_hz),
            ping: PingTracker::new(settings.ping_interval_ms as f64),
            outbox: vec![ClientEnvelope::Hello],
        }
    }

    pub fn player_id(&self) -> &str {
        &self.player_id
    }

    pub fn match_id(&self) -> &str {
        &self.match_id
    }

    /// Newest authoritative state, once one has arrived
    pub fn latest(&self) -> Option<&MatchState> {
        (self.snapshots_received > 0).then_some(&self.latest)
    }

    pub fn rtt_ms(&self) -> Option<i64> {
        self.ping.rtt_ms()
    }

    fn frame(&mut self, frame_dt: f64, now_ms: i64, local: &mut dyn InputSource, sink: &mut dyn SnapshotSink) {
        let elapsed_ms = frame_dt * 1000.0;
        let input = local.control_for(&self.player_id, &self.latest);

        self.inputs.advance(elapsed_ms);
        while let Some(snapshot) = self.inputs.next_due(&input, now_ms) {
            self.outbox.push(ClientEnvelope::Input { input: snapshot });
        }
        if self.ping.advance(elapsed_ms, now_ms) {
            self.outbox.push(ClientEnvelope::Ping);
        }

        if self.snapshots_received > 0 {
            sink.publish(self.latest.clone());
        }
    }

    fn handle(&mut self, envelope: ServerEnvelope, now_ms: i64) -> Result<(), ProtocolError> {
        if let ServerEnvelope::Pong { .. } = envelope {
            if let Some(rtt) = self.ping.on_pong(now_ms) {
                log::debug!("RTT {} ms", rtt);
            }
            return Ok(());
        }

        let kind = envelope.kind();
        let Some(state) = envelope.into_state()? else {
            log::debug!("Ignoring empty '{}' message", kind);
            return Ok(());
        };

        if self.snapshots_received > 0 && state.match_id == self.latest.match_id && state.tick < self.latest.tick {
            log::debug!("Dropping stale snapshot (tick {} < {})", state.tick, self.latest.tick);
            return Ok(());
        }
        self.latest = state;
        self.snapshots_received += 1;
        Ok(())
    }
}

/// The active session
#[derive(Default)]
pub enum Session {
    #[default]
    Idle,
    Offline(OfflineSession),
    Online(OnlineSession),
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> SessionMode {
        match self {
            Session::Idle => SessionMode::Idle,
            Session::Offline(_) => SessionMode::Offline,
            Session::Online(_) => SessionMode::Online,
        }
    }

    /// Replace whatever is running with a fresh offline match
    pub fn start_offline(&mut self, settings: &Settings, local_id: &str) {
        let offline = OfflineSession::new(settings, local_id);
        let started = format!(
            "Offline session started (match {}, bot {})",
            offline.sim.state().match_id,
            offline.bot_id().unwrap_or("none")
        );
        self.replace(Session::Offline(offline));
        log::info!("{}", started);
    }

    /// Replace whatever is running with a server-driven session
    pub fn start_online(&mut self, settings: &Settings, player_id: &str, match_id: &str) {
        self.replace(Session::Online(OnlineSession::new(settings, player_id, match_id)));
        log::info!("Online session started (match {}, player {})", match_id, player_id);
    }

    pub fn stop(&mut self) {
        self.replace(Session::Idle);
    }

    fn replace(&mut self, next: Session) {
        let previous = std::mem::replace(self, next);
        if previous.mode() != SessionMode::Idle {
            log::info!("Stopped {} session", previous.mode().as_str());
        }
    }

    /// Run one render frame
    ///
    /// Offline this steps the simulation; online it paces outbound traffic
    /// and republishes the newest server state. Returns the number of
    /// simulation ticks run.
    pub fn frame(
        &mut self,
        frame_dt: f64,
        now_ms: i64,
        local: &mut dyn InputSource,
        sink: &mut dyn SnapshotSink,
    ) -> u32 {
        match self {
            Session::Idle => 0,
            Session::Offline(offline) => offline.frame(frame_dt, local, sink),
            Session::Online(online) => {
                online.frame(frame_dt, now_ms, local, sink);
                0
            }
        }
    }

    /// Feed one text frame received from the server
    ///
    /// Ignored unless online. Malformed messages are logged and returned as
    /// errors; the session keeps its last good state.
    pub fn handle_server_message(&mut self, text: &str, now_ms: i64) -> Result<(), ProtocolError> {
        let Session::Online(online) = self else {
            log::debug!("Ignoring server message while {}", self.mode().as_str());
            return Ok(());
        };

        let result = ServerEnvelope::decode(text).and_then(|envelope| online.handle(envelope, now_ms));
        if let Err(e) = &result {
            log::warn!("Bad server message: {}", e);
        }
        result
    }

    /// Drain envelopes waiting to be written to the socket
    pub fn take_outgoing(&mut self) -> Vec<ClientEnvelope> {
        match self {
            Session::Online(online) => std::mem::take(&mut online.outbox),
            _ => Vec::new(),
        }
    }

    /// Current match state from whichever producer is active
    pub fn current_state(&self) -> Option<&MatchState> {
        match self {
            Session::Idle => None,
            Session::Offline(offline) => Some(offline.sim.state()),
            Session::Online(online) => online.latest(),
        }
    }
}
