//! Static arena geometry
//!
//! The arena is an axis-aligned box centered on the origin:
//! - X spans the length, goals sit at each X extreme
//! - Y spans the width, the goal mouth is centered on Y = 0
//! - Z is up, the floor is Z = 0

use glam::DVec3;

use super::state::Team;
use crate::consts::*;

/// Half extents of the playable box
#[inline]
pub fn half_length() -> f64 {
    ARENA_LENGTH / 2.0
}

#[inline]
pub fn half_width() -> f64 {
    ARENA_WIDTH / 2.0
}

/// Whether a point lies inside the goal mouth's cross-section
///
/// Only Y and Z are tested; the X test (past the end wall) is separate so the
/// wall resolver can exempt the aperture without deciding about goals.
#[inline]
pub fn in_goal_aperture(pos: DVec3) -> bool {
    pos.y.abs() <= GOAL_WIDTH / 2.0 && pos.z <= GOAL_HEIGHT
}

/// Which team a ball at this position has scored for, if any
///
/// Orange defends -X and attacks +X, so a ball past the +X end credits orange.
pub fn scoring_team(pos: DVec3) -> Option<Team> {
    if !in_goal_aperture(pos) {
        return None;
    }
    if pos.x >= half_length() {
        Some(Team::Orange)
    } else if pos.x <= -half_length() {
        Some(Team::Blue)
    } else {
        None
    }
}

/// Lateral offset of a kickoff slot (cycles through the slot table)
#[inline]
pub fn kickoff_slot_offset(slot: usize) -> f64 {
    KICKOFF_SLOT_OFFSETS[slot % KICKOFF_SLOT_OFFSETS.len()]
}

/// Kickoff position and yaw (degrees) for a team's Nth car
pub fn kickoff_spawn(team: Team, slot: usize) -> (DVec3, f64) {
    let y = kickoff_slot_offset(slot);
    match team {
        Team::Orange => (DVec3::new(-KICKOFF_SPAWN_X, y, CAR_RADIUS), 0.0),
        Team::Blue => (DVec3::new(KICKOFF_SPAWN_X, y, CAR_RADIUS), 180.0),
    }
}

/// Ball position at kickoff
#[inline]
pub fn kickoff_ball_position() -> DVec3 {
    DVec3::new(0.0, 0.0, KICKOFF_BALL_HEIGHT)
}
