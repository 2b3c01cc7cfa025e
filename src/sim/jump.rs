//! Jump / double-jump (dodge) sequencing
//!
//! States: Grounded -> SingleJump -> DoubleJumpUsed, and back to Grounded on
//! ground contact from any state. The transitions here only touch the
//! context; the car controller applies the matching velocity changes.

use crate::consts::*;

/// Per-car jump state
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum JumpState {
    /// Wheels on the floor, both jumps available
    #[default]
    Grounded,
    /// First jump consumed, dodge still available within the window
    SingleJump {
        /// Seconds since liftoff
        time_since_jump: f64,
        /// Seconds of jump-hold thrust already applied
        hold_time: f64,
        /// Remaining ground-adhesion window
        sticky_time: f64,
    },
    /// Both jumps consumed until the next landing
    DoubleJumpUsed { time_since_jump: f64 },
}

/// Simulation-only jump bookkeeping for one car (never serialized)
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct JumpContext {
    pub state: JumpState,
    /// Jump button state on the previous tick, for press-edge detection
    pub prev_jump: bool,
}

impl JumpContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// 0 = none, 1 = single jump, 2 = double jump / dodge
    pub fn used_jumps(&self) -> u8 {
        match self.state {
            JumpState::Grounded => 0,
            JumpState::SingleJump { .. } => 1,
            JumpState::DoubleJumpUsed { .. } => 2,
        }
    }

    pub fn time_since_jump(&self) -> f64 {
        match self.state {
            JumpState::Grounded => 0.0,
            JumpState::SingleJump { time_since_jump, .. }
            | JumpState::DoubleJumpUsed { time_since_jump } => time_since_jump,
        }
    }

    /// Record this tick's jump button and report whether it was just pressed
    pub fn press_edge(&mut self, jump_held: bool) -> bool {
        let pressed = jump_held && !self.prev_jump;
        self.prev_jump = jump_held;
        pressed
    }

    /// Ground contact: every counter and timer resets
    pub fn land(&mut self) {
        self.state = JumpState::Grounded;
    }

    /// Grounded -> SingleJump. Returns false if a jump is not available.
    pub fn start_jump(&mut self) -> bool {
        if self.state != JumpState::Grounded {
            return false;
        }
        self.state = JumpState::SingleJump {
            time_since_jump: 0.0,
            hold_time: 0.0,
            sticky_time: STICKY_TIME,
        };
        true
    }

    /// Advance airborne timers by `dt`
    pub fn advance(&mut self, dt: f64) {
        match &mut self.state {
            JumpState::Grounded => {}
            JumpState::SingleJump { time_since_jump, .. }
            | JumpState::DoubleJumpUsed { time_since_jump } => *time_since_jump += dt,
        }
    }

    /// Consume jump-hold time if still inside the hold window; returns the
    /// seconds of thrust to apply this tick (0 when the window is spent)
    pub fn take_hold(&mut self, dt: f64) -> f64 {
        match &mut self.state {
            JumpState::SingleJump { hold_time, .. } if *hold_time < JUMP_HOLD_MAX => {
                *hold_time += dt;
                dt
            }
            _ => 0.0,
        }
    }

    /// Consume sticky time; returns the seconds of counter-force to apply
    pub fn take_sticky(&mut self, dt: f64) -> f64 {
        match &mut self.state {
            JumpState::SingleJump { sticky_time, .. } if *sticky_time > 0.0 => {
                *sticky_time -= dt;
                dt
            }
            _ => 0.0,
        }
    }

    /// SingleJump -> DoubleJumpUsed if inside the double-jump window
    pub fn try_double_jump(&mut self) -> bool {
        match self.state {
            JumpState::SingleJump { time_since_jump, .. } if time_since_jump <= DOUBLE_JUMP_MAX => {
                self.state = JumpState::DoubleJumpUsed { time_since_jump };
                true
            }
            _ => false,
        }
    }
}
