//! Ball dynamics
//!
//! Gravity, drag and a hard speed cap. Bounces are handled by the arena
//! resolver in `collision`, not here.

use super::state::BallState;
use crate::consts::*;

/// Advance the ball by `dt` seconds
pub fn update_ball(ball: &mut BallState, dt: f64) {
    ball.velocity.z += GRAVITY * dt;
    ball.position += ball.velocity * dt;

    // Rolling drag near the floor, thinner air drag above it
    let drag = if ball.position.z <= ball.radius + BALL_GROUND_DRAG_BAND {
        BALL_GROUND_DRAG
    } else {
        BALL_AIR_DRAG
    };
    ball.velocity.x *= drag;
    ball.velocity.y *= drag;
    ball.velocity.z *= BALL_VERTICAL_DAMPING;

    let speed = ball.velocity.length();
    if speed > BALL_MAX_SPEED && speed > 0.0 {
        ball.velocity *= BALL_MAX_SPEED / speed;
    }
}
