//! Match state and core simulation types
//!
//! Everything here is plain data that crosses the wire: the server sends the
//! same shape in online mode, and the offline simulation publishes it as its
//! snapshot. Per-car jump contexts and other simulation-only bookkeeping live
//! on `MatchSim`, not here.

use std::collections::BTreeMap;

use glam::DVec3;
use serde::{Deserialize, Serialize};

use super::arena;
use super::input::ControlInput;
use crate::consts::*;

/// `{x, y, z}` object encoding for vectors (glam's own serde uses arrays)
mod xyz {
    use glam::DVec3;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    #[derive(Serialize, Deserialize)]
    struct Xyz {
        #[serde(default)]
        x: f64,
        #[serde(default)]
        y: f64,
        #[serde(default)]
        z: f64,
    }

    pub fn serialize<S: Serializer>(v: &DVec3, serializer: S) -> Result<S::Ok, S::Error> {
        Xyz { x: v.x, y: v.y, z: v.z }.serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DVec3, D::Error> {
        let Xyz { x, y, z } = Xyz::deserialize(deserializer)?;
        Ok(DVec3::new(x, y, z))
    }
}

/// Team colors
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Team {
    Orange,
    Blue,
}

impl Team {
    pub fn as_str(&self) -> &'static str {
        match self {
            Team::Orange => "orange",
            Team::Blue => "blue",
        }
    }

    pub fn opponent(&self) -> Team {
        match self {
            Team::Orange => Team::Blue,
            Team::Blue => Team::Orange,
        }
    }
}

/// Orientation in degrees. Only yaw is simulated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rotator {
    #[serde(default)]
    pub pitch: f64,
    #[serde(default)]
    pub yaw: f64,
    #[serde(default)]
    pub roll: f64,
}

impl Rotator {
    pub fn from_yaw(yaw: f64) -> Self {
        Self {
            yaw,
            ..Default::default()
        }
    }
}

/// A car as replicated to every client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CarState {
    pub player_id: String,
    #[serde(default)]
    pub display_name: String,
    pub team: Team,
    #[serde(default)]
    pub is_bot: bool,
    #[serde(with = "xyz")]
    pub position: DVec3,
    #[serde(with = "xyz")]
    pub velocity: DVec3,
    #[serde(default)]
    pub rotation: Rotator,
    /// Boost meter, 0..=100
    pub boost: f64,
    pub is_grounded: bool,
    /// Most recent applied control input
    #[serde(default)]
    pub last_input: ControlInput,
}

impl CarState {
    /// A car parked at its team's kickoff slot with a full tank
    pub fn at_kickoff(
        player_id: impl Into<String>,
        display_name: impl Into<String>,
        team: Team,
        is_bot: bool,
        slot: usize,
    ) -> Self {
        let (position, yaw) = arena::kickoff_spawn(team, slot);
        Self {
            player_id: player_id.into(),
            display_name: display_name.into(),
            team,
            is_bot,
            position,
            velocity: DVec3::ZERO,
            rotation: Rotator::from_yaw(yaw),
            boost: BOOST_MAX,
            is_grounded: true,
            last_input: ControlInput::default(),
        }
    }

    /// Horizontal speed
    #[inline]
    pub fn speed_2d(&self) -> f64 {
        self.velocity.truncate().length()
    }
}

fn default_ball_radius() -> f64 {
    BALL_RADIUS
}

/// The ball. No spin is modeled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BallState {
    #[serde(with = "xyz")]
    pub position: DVec3,
    #[serde(with = "xyz")]
    pub velocity: DVec3,
    #[serde(default = "default_ball_radius")]
    pub radius: f64,
}

impl Default for BallState {
    fn default() -> Self {
        Self {
            position: arena::kickoff_ball_position(),
            velocity: DVec3::ZERO,
            radius: BALL_RADIUS,
        }
    }
}

/// Goals and match clock
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Score {
    #[serde(default)]
    pub orange: u32,
    #[serde(default)]
    pub blue: u32,
    #[serde(default)]
    pub time_remaining_ms: i64,
}

impl Score {
    pub fn new(duration_ms: i64) -> Self {
        Self {
            orange: 0,
            blue: 0,
            time_remaining_ms: duration_ms.max(0),
        }
    }

    pub fn goals(&self, team: Team) -> u32 {
        match team {
            Team::Orange => self.orange,
            Team::Blue => self.blue,
        }
    }

    pub fn credit(&mut self, team: Team) {
        match team {
            Team::Orange => self.orange += 1,
            Team::Blue => self.blue += 1,
        }
    }

    /// Count the clock down, never below zero
    pub fn run_clock(&mut self, elapsed_ms: i64) {
        self.time_remaining_ms = (self.time_remaining_ms - elapsed_ms.max(0)).max(0);
    }

    pub fn is_tied(&self) -> bool {
        self.orange == self.blue
    }

    /// Team ahead on goals, if any
    pub fn leader(&self) -> Option<Team> {
        use std::cmp::Ordering;
        match self.orange.cmp(&self.blue) {
            Ordering::Greater => Some(Team::Orange),
            Ordering::Less => Some(Team::Blue),
            Ordering::Equal => None,
        }
    }
}

/// Gameplay event types
///
/// Unknown server-side types are preserved so a snapshot never fails to
/// decode because of a new event kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EventKind {
    Kickoff,
    Goal,
    ShotOnGoal,
    PlayerJoin,
    PlayerLeave,
    Other(String),
}

impl EventKind {
    pub fn as_str(&self) -> &str {
        match self {
            EventKind::Kickoff => "kickoff",
            EventKind::Goal => "goal",
            EventKind::ShotOnGoal => "shot_on_goal",
            EventKind::PlayerJoin => "player_join",
            EventKind::PlayerLeave => "player_leave",
            EventKind::Other(name) => name,
        }
    }
}

impl From<String> for EventKind {
    fn from(name: String) -> Self {
        match name.as_str() {
            "kickoff" => EventKind::Kickoff,
            "goal" => EventKind::Goal,
            "shot_on_goal" => EventKind::ShotOnGoal,
            "player_join" => EventKind::PlayerJoin,
            "player_leave" => EventKind::PlayerLeave,
            _ => EventKind::Other(name),
        }
    }
}

impl From<EventKind> for String {
    fn from(kind: EventKind) -> Self {
        kind.as_str().to_string()
    }
}

/// A gameplay event. Only lives for the tick that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchEvent {
    #[serde(rename = "type")]
    pub kind: EventKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub player_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team: Option<Team>,
    #[serde(default)]
    pub occurred_ms: i64,
}

impl MatchEvent {
    pub fn new(kind: EventKind, team: Option<Team>, occurred_ms: i64) -> Self {
        Self {
            kind,
            player_id: None,
            team,
            occurred_ms,
        }
    }

    pub fn with_player(mut self, player_id: impl Into<String>) -> Self {
        self.player_id = Some(player_id.into());
        self
    }

    /// `type|team|occurred_ms`, used by consumers to avoid re-triggering
    pub fn signature(&self) -> String {
        format!(
            "{}|{}|{}",
            self.kind.as_str(),
            self.team.map(|t| t.as_str()).unwrap_or(""),
            self.occurred_ms
        )
    }

    /// Short HUD caption
    pub fn label(&self) -> String {
        match &self.kind {
            EventKind::Goal => format!(
                "{} GOAL",
                self.team.map(|t| t.as_str()).unwrap_or("").to_uppercase()
            ),
            EventKind::ShotOnGoal => "SHOT ON GOAL".to_string(),
            EventKind::Kickoff => "KICKOFF".to_string(),
            EventKind::PlayerJoin => "PLAYER JOINED".to_string(),
            other => other.as_str().replace('_', " ").to_uppercase(),
        }
    }
}

/// Complete match state (aggregate root of the snapshot)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchState {
    pub match_id: String,
    /// Monotonic simulation tick counter
    #[serde(default)]
    pub tick: u64,
    /// Server creation timestamp (RFC 3339), absent for offline matches
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    /// Cars keyed by player id (sorted for deterministic iteration)
    #[serde(default)]
    pub cars: BTreeMap<String, CarState>,
    pub ball: BallState,
    pub score: Score,
    /// Events produced by the most recent tick only
    #[serde(default)]
    pub events: Vec<MatchEvent>,
}

impl MatchState {
    pub fn new(match_id: impl Into<String>, duration_ms: i64) -> Self {
        Self {
            match_id: match_id.into(),
            tick: 0,
            created_at: None,
            cars: BTreeMap::new(),
            ball: BallState::default(),
            score: Score::new(duration_ms),
            events: Vec::new(),
        }
    }

    pub fn car(&self, player_id: &str) -> Option<&CarState> {
        self.cars.get(player_id)
    }

    /// Regulation is over and somebody is ahead
    pub fn is_over(&self) -> bool {
        self.score.time_remaining_ms == 0 && !self.score.is_tied()
    }

    /// Winner once the match is over
    pub fn winner(&self) -> Option<Team> {
        if self.is_over() {
            self.score.leader()
        } else {
            None
        }
    }

    /// Clock ran out with the score level
    pub fn in_overtime(&self) -> bool {
        self.score.time_remaining_ms == 0 && self.score.is_tied()
    }

    /// Newest event of this tick
    pub fn last_event(&self) -> Option<&MatchEvent> {
        self.events.last()
    }
}

/// Format milliseconds as `mm:ss` for clock displays
pub fn format_clock(ms: i64) -> String {
    let total_secs = (ms / 1000).max(0);
    format!("{:02}:{:02}", total_secs / 60, total_secs % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_car_state_wire_shape() {
        let car = CarState::at_kickoff("p1", "Pilot", Team::Blue, false, 0);
        let json = serde_json::to_value(&car).unwrap();
        assert_eq!(json["team"], "blue");
        assert_eq!(json["position"]["x"], 2048.0);
        assert_eq!(json["position"]["z"], CAR_RADIUS);
        assert_eq!(json["rotation"]["yaw"], 180.0);
        assert_eq!(json["boost"], 100.0);
        assert_eq!(json["is_grounded"], true);
    }

    #[test]
    fn test_server_snapshot_decodes() {
        let json = r#"{
            "match_id": "m1",
            "tick": 42,
            "created_at": "2026-01-01T00:00:00Z",
            "cars": {
                "p1": {
                    "player_id": "p1",
                    "display_name": "Pilot",
                    "team": "orange",
                    "is_bot": false,
                    "position": {"x": -2048, "y": 0, "z": 95},
                    "velocity": {"x": 0, "y": 0, "z": 0},
                    "rotation": {"pitch": 0, "yaw": 0, "roll": 0},
                    "boost": 100,
                    "is_grounded": true,
                    "last_input": {"player_id": "p1", "sequence": 7, "throttle": 1, "steer": 0,
                                   "boost": false, "jump": false, "handbrake": false, "client_ms": 0}
                }
            },
            "ball": {"position": {"x": 0, "y": 0, "z": 111.25}, "velocity": {"x": 0, "y": 0, "z": 0}, "radius": 91.25},
            "score": {"orange": 1, "blue": 0, "time_remaining_ms": 1000},
            "events": [{"type": "demo", "team": "blue", "occurred_ms": 5}]
        }"#;

        let state: MatchState = serde_json::from_str(json).unwrap();
        assert_eq!(state.tick, 42);
        assert_eq!(state.cars["p1"].last_input.throttle, 1.0);
        assert_eq!(state.score.orange, 1);
        assert_eq!(state.events[0].kind, EventKind::Other("demo".to_string()));
        assert_eq!(state.events[0].label(), "DEMO");
    }

    #[test]
    fn test_event_signature_and_label() {
        let goal = MatchEvent::new(EventKind::Goal, Some(Team::Orange), 1234);
        assert_eq!(goal.signature(), "goal|orange|1234");
        assert_eq!(goal.label(), "ORANGE GOAL");

        let kickoff = MatchEvent::new(EventKind::Kickoff, None, 0);
        assert_eq!(kickoff.signature(), "kickoff||0");

        let json = serde_json::to_value(&goal).unwrap();
        assert_eq!(json["type"], "goal");
        assert!(json.get("player_id").is_none());
    }

    #[test]
    fn test_score_clock_floors_at_zero() {
        let mut score = Score::new(10);
        score.run_clock(8);
        assert_eq!(score.time_remaining_ms, 2);
        score.run_clock(8);
        assert_eq!(score.time_remaining_ms, 0);
        score.run_clock(-5);
        assert_eq!(score.time_remaining_ms, 0);
    }

    #[test]
    fn test_match_end_and_overtime() {
        let mut state = MatchState::new("m", 0);
        assert!(state.in_overtime());
        assert!(!state.is_over());

        state.score.credit(Team::Blue);
        assert!(state.is_over());
        assert_eq!(state.winner(), Some(Team::Blue));
    }

    #[test]
    fn test_format_clock() {
        assert_eq!(format_clock(300_000), "05:00");
        assert_eq!(format_clock(61_999), "01:01");
        assert_eq!(format_clock(-5), "00:00");
    }
}
