//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only (ids are generated by the session, never here)
//! - Stable iteration order (cars keyed by id in a BTreeMap)
//! - No rendering, transport or platform dependencies

pub mod arena;
pub mod ball;
pub mod car;
pub mod collision;
pub mod input;
pub mod jump;
pub mod state;
pub mod tick;

pub use ball::update_ball;
pub use car::update_car;
pub use collision::{clamp_ball_bounds, clamp_car_bounds, resolve_car_ball, CarBallContact};
pub use input::{BotController, ControlInput, InputSource, Key, KeyboardState};
pub use jump::{JumpContext, JumpState};
pub use state::{
    BallState, CarState, EventKind, MatchEvent, MatchState, Rotator, Score, Team,
};
pub use tick::{MatchSim, PlayerSpawn};
