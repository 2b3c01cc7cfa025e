//! Velocity - client-side car soccer simulation core
//!
//! Core modules:
//! - `sim`: Deterministic simulation (car controller, ball, collisions, match rules)
//! - `driver`: Fixed-timestep accumulator that advances the simulation
//! - `session`: Offline/online session lifecycle
//! - `net`: Wire contract with the game server (envelopes, input stream)
//! - `settings`: Client configuration

pub mod driver;
pub mod error;
pub mod net;
pub mod session;
pub mod settings;
pub mod sim;

pub use driver::{FixedStepDriver, SnapshotSink};
pub use error::{ProtocolError, SettingsError};
pub use session::{Session, SessionMode};
pub use settings::Settings;

use glam::DVec3;

/// Game configuration constants
///
/// All values are in simulation units (uu) and seconds. They are shared
/// verbatim with the server simulation that online mode trusts.
pub mod consts {
    /// Simulation tick rate
    pub const TICK_HZ: f64 = 120.0;
    /// Fixed simulation timestep
    pub const SIM_DT: f64 = 1.0 / TICK_HZ;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;
    /// Frame deltas above this are clamped before accumulation
    pub const MAX_FRAME_DT: f64 = 0.1;

    /// Arena dimensions (X = length, Y = width, Z = height)
    pub const ARENA_LENGTH: f64 = 8192.0;
    pub const ARENA_WIDTH: f64 = 10240.0;
    pub const ARENA_HEIGHT: f64 = 2044.0;

    /// Goal mouth, centered on Y, sitting on the floor
    pub const GOAL_WIDTH: f64 = 1785.51;
    pub const GOAL_HEIGHT: f64 = 642.775;

    pub const CAR_RADIUS: f64 = 95.0;
    pub const BALL_RADIUS: f64 = 91.25;

    /// Kickoff layout
    pub const KICKOFF_SPAWN_X: f64 = 2048.0;
    pub const KICKOFF_BALL_HEIGHT: f64 = BALL_RADIUS + 20.0;
    pub const KICKOFF_SLOT_OFFSETS: [f64; 3] = [0.0, -500.0, 500.0];

    /// Car locomotion
    pub const MAX_CAR_SPEED: f64 = 2300.0;
    pub const MAX_DRIVE_SPEED: f64 = 1410.0;
    pub const THROTTLE_ACCEL: f64 = 1600.0;
    pub const BRAKE_ACCEL: f64 = 3500.0;
    pub const BOOST_ACCEL: f64 = 991.666;
    pub const AIR_THROTTLE_ACCEL: f64 = 66.667;
    pub const AIR_REVERSE_ACCEL: f64 = 33.334;
    /// Baseline yaw rate (rad/s)
    pub const TURN_RATE: f64 = 3.4;
    pub const HANDBRAKE_TURN_BOOST: f64 = 1.35;

    /// Boost meter (units per second)
    pub const BOOST_MAX: f64 = 100.0;
    pub const BOOST_DRAIN_RATE: f64 = 34.0;
    pub const BOOST_REGEN_RATE: f64 = 8.0;

    /// Per-tick velocity retention factors
    pub const GROUND_FRICTION: f64 = 0.9965;
    pub const COAST_FRICTION: f64 = 0.9960;
    pub const LATERAL_GRIP: f64 = 0.78;
    pub const HANDBRAKE_GRIP: f64 = 0.90;
    pub const AIR_LATERAL_DAMPING: f64 = 0.985;
    pub const AIR_RESISTANCE: f64 = 0.9992;
    /// Throttle magnitude below which a grounded car coasts
    pub const COAST_THRESHOLD: f64 = 0.05;

    /// Jumping
    pub const GRAVITY: f64 = -650.0;
    pub const JUMP_VELOCITY: f64 = 292.0;
    pub const JUMP_HOLD_ACCEL: f64 = 1460.0;
    pub const JUMP_HOLD_MAX: f64 = 0.2;
    pub const STICKY_FORCE: f64 = 325.0;
    pub const STICKY_TIME: f64 = 3.0 / 120.0;
    pub const DOUBLE_JUMP_MAX: f64 = 1.25;
    pub const DODGE_IMPULSE: f64 = 500.0;
    /// Dodge input magnitude below which the dodge goes straight forward
    pub const DODGE_DEADZONE: f64 = 0.1;
    /// Vertical velocity retained (and inverted) on a ceiling hit
    pub const CEILING_DAMPING: f64 = 0.25;

    /// Ball dynamics
    pub const BALL_MAX_SPEED: f64 = 6000.0;
    pub const BALL_GROUND_DRAG: f64 = 0.9975;
    pub const BALL_AIR_DRAG: f64 = 0.9995;
    pub const BALL_VERTICAL_DAMPING: f64 = 0.9994;
    /// Height above rest at which rolling drag still applies
    pub const BALL_GROUND_DRAG_BAND: f64 = 8.0;

    /// Collision response
    pub const BALL_RESTITUTION: f64 = 0.60;
    pub const WALL_RESTITUTION: f64 = 0.78;
    pub const CAR_WALL_RESTITUTION: f64 = 0.3;
    pub const CAR_BALL_ELASTICITY: f64 = 0.94;
    /// Share of car-ball penetration resolved by moving the ball
    pub const BALL_PUSHOUT_SHARE: f64 = 0.85;
    pub const CAR_PUSHOUT_SHARE: f64 = 0.15;

    /// Match rules
    pub const MATCH_DURATION_MS: i64 = 300_000;
    pub const SHOT_ZONE_FRACTION: f64 = 0.35;
    pub const SHOT_MIN_SPEED: f64 = 200.0;
    pub const SHOT_WIDTH_FRACTION: f64 = 0.7;
    pub const SHOT_DEBOUNCE_MS: i64 = 700;

    /// Bot heuristic
    pub const BOT_STEER_NORMALIZATION: f64 = 35.0;
    pub const BOT_DISPLAY_NAME: &str = "Velocity Bot";
}

/// Normalize an angle in degrees to [0, 360)
#[inline]
pub fn normalize_deg(deg: f64) -> f64 {
    let wrapped = deg.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs
    if wrapped >= 360.0 { 0.0 } else { wrapped }
}

/// Normalize an angle in degrees to (-180, 180]
#[inline]
pub fn normalize_signed_deg(mut deg: f64) -> f64 {
    while deg > 180.0 {
        deg -= 360.0;
    }
    while deg <= -180.0 {
        deg += 360.0;
    }
    deg
}

/// Forward and right unit vectors on the ground plane for a yaw in degrees
#[inline]
pub fn yaw_basis(yaw_deg: f64) -> (DVec3, DVec3) {
    let yaw = yaw_deg.to_radians();
    let forward = DVec3::new(yaw.cos(), yaw.sin(), 0.0);
    let right = DVec3::new(-forward.y, forward.x, 0.0);
    (forward, right)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_deg_wraps() {
        assert_eq!(normalize_deg(370.0), 10.0);
        assert_eq!(normalize_deg(-10.0), 350.0);
        assert_eq!(normalize_deg(360.0), 0.0);
        assert!(normalize_deg(-1e-18) < 360.0);
    }

    #[test]
    fn test_normalize_signed_deg() {
        assert_eq!(normalize_signed_deg(190.0), -170.0);
        assert_eq!(normalize_signed_deg(-190.0), 170.0);
        assert_eq!(normalize_signed_deg(180.0), 180.0);
    }

    #[test]
    fn test_yaw_basis_is_orthonormal() {
        let (forward, right) = yaw_basis(37.0);
        assert!((forward.length() - 1.0).abs() < 1e-12);
        assert!(forward.dot(right).abs() < 1e-12);

        let (forward, right) = yaw_basis(0.0);
        assert!((forward.x - 1.0).abs() < 1e-12);
        assert!((right.y - 1.0).abs() < 1e-12);
    }
}
