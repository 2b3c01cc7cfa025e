//! Control inputs and the sources that produce them
//!
//! The car controller only ever sees a `ControlInput`. Where it came from
//! (held keys, the bot heuristic, a replay) is behind `InputSource`.

use serde::{Deserialize, Serialize};

use super::state::{CarState, MatchState};
use crate::consts::*;
use crate::normalize_signed_deg;

/// Normalized per-tick control vector
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ControlInput {
    /// -1.0 (full reverse) ..= 1.0 (full forward)
    #[serde(default)]
    pub throttle: f64,
    /// -1.0 (left) ..= 1.0 (right)
    #[serde(default)]
    pub steer: f64,
    #[serde(default)]
    pub boost: bool,
    #[serde(default)]
    pub jump: bool,
    #[serde(default)]
    pub handbrake: bool,
}

impl ControlInput {
    /// Clamp axes to [-1, 1]; non-finite axes become 0
    pub fn sanitized(self) -> Self {
        Self {
            throttle: sanitize_axis(self.throttle),
            steer: sanitize_axis(self.steer),
            ..self
        }
    }
}

#[inline]
fn sanitize_axis(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(-1.0, 1.0)
    } else {
        0.0
    }
}

/// Anything that can drive a car for one tick
pub trait InputSource {
    /// Produce the control input for `car_id` given the current state
    fn control_for(&mut self, car_id: &str, state: &MatchState) -> ControlInput;
}

/// Logical control keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Forward,
    Reverse,
    Left,
    Right,
    Boost,
    Jump,
    Handbrake,
}

impl Key {
    /// Map a DOM `KeyboardEvent.code` to a control key
    pub fn from_code(code: &str) -> Option<Key> {
        match code {
            "KeyW" | "ArrowUp" => Some(Key::Forward),
            "KeyS" | "ArrowDown" => Some(Key::Reverse),
            "KeyA" | "ArrowLeft" => Some(Key::Left),
            "KeyD" | "ArrowRight" => Some(Key::Right),
            "ShiftLeft" | "ShiftRight" => Some(Key::Boost),
            "Space" => Some(Key::Jump),
            "ControlLeft" | "ControlRight" => Some(Key::Handbrake),
            _ => None,
        }
    }
}

/// Held-key state for the local human player
///
/// Press/release events update the set; the car controller does the jump
/// edge detection, so a held jump key is reported as held every tick.
#[derive(Debug, Clone, Default)]
pub struct KeyboardState {
    forward: bool,
    reverse: bool,
    left: bool,
    right: bool,
    boost: bool,
    jump: bool,
    handbrake: bool,
}

impl KeyboardState {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&mut self, key: Key) -> &mut bool {
        match key {
            Key::Forward => &mut self.forward,
            Key::Reverse => &mut self.reverse,
            Key::Left => &mut self.left,
            Key::Right => &mut self.right,
            Key::Boost => &mut self.boost,
            Key::Jump => &mut self.jump,
            Key::Handbrake => &mut self.handbrake,
        }
    }

    pub fn press(&mut self, key: Key) {
        *self.slot(key) = true;
    }

    pub fn release(&mut self, key: Key) {
        *self.slot(key) = false;
    }

    /// Drop every held key (window blur)
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Current control vector
    pub fn control(&self) -> ControlInput {
        let axis = |pos: bool, neg: bool| f64::from(u8::from(pos)) - f64::from(u8::from(neg));
        ControlInput {
            throttle: axis(self.forward, self.reverse),
            steer: axis(self.right, self.left),
            boost: self.boost,
            jump: self.jump,
            handbrake: self.handbrake,
        }
    }
}

impl InputSource for KeyboardState {
    fn control_for(&mut self, _car_id: &str, _state: &MatchState) -> ControlInput {
        self.control()
    }
}

/// Ball-chasing heuristic for offline opponents
#[derive(Debug, Clone, Copy, Default)]
pub struct BotController;

impl BotController {
    /// Steer at the ball, reverse out when it is behind, jump when it is overhead
    pub fn decide(car: &CarState, state: &MatchState) -> ControlInput {
        let to_ball = state.ball.position - car.position;
        let dist_2d = to_ball.truncate().length();

        let target_yaw = to_ball.y.atan2(to_ball.x).to_degrees();
        let delta = normalize_signed_deg(target_yaw - car.rotation.yaw);
        let steer = (delta / BOT_STEER_NORMALIZATION).clamp(-1.0, 1.0);

        let throttle = if delta.abs() > 120.0 { -0.25 } else { 1.0 };

        ControlInput {
            throttle,
            steer,
            boost: delta.abs() < 12.0 && dist_2d > 600.0 && car.boost > 15.0,
            jump: car.is_grounded && dist_2d < 250.0 && to_ball.z > 110.0,
            handbrake: delta.abs() > 75.0,
        }
    }
}

impl InputSource for BotController {
    fn control_for(&mut self, car_id: &str, state: &MatchState) -> ControlInput {
        state
            .car(car_id)
            .map(|car| Self::decide(car, state))
            .unwrap_or_default()
    }
}
