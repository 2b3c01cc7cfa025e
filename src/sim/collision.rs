//! Collision detection and response
//!
//! Arena contacts are axis-aligned clamps with restitution. Car-ball contact
//! treats both bodies as spheres; the impulse goes entirely to the ball and
//! penetration is split unevenly between the two.

use glam::DVec3;

use super::arena;
use super::state::{BallState, CarState};
use crate::consts::*;

/// Result of a resolved car-ball contact
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CarBallContact {
    /// Unit normal from car center toward ball center
    pub normal: DVec3,
    /// Impulse magnitude added to the ball along `normal`
    pub impulse: f64,
    /// Penetration depth before correction
    pub penetration: f64,
}

/// Keep a car inside the side and end walls
///
/// Cars never enter the goal mouth; the end walls are solid for them.
pub fn clamp_car_bounds(car: &mut CarState) {
    let max_x = arena::half_length() - CAR_RADIUS;
    let max_y = arena::half_width() - CAR_RADIUS;

    if car.position.x.abs() > max_x {
        car.position.x = max_x.copysign(car.position.x);
        car.velocity.x *= -CAR_WALL_RESTITUTION;
    }
    if car.position.y.abs() > max_y {
        car.position.y = max_y.copysign(car.position.y);
        car.velocity.y *= -CAR_WALL_RESTITUTION;
    }
}

/// Bounce the ball off the floor, ceiling and walls
///
/// The end-wall (X) bounce is skipped while the ball is inside the goal
/// aperture so it can travel through the mouth.
pub fn clamp_ball_bounds(ball: &mut BallState) {
    let r = ball.radius;

    if ball.position.z < r {
        ball.position.z = r;
        ball.velocity.z = -ball.velocity.z * BALL_RESTITUTION;
    }
    if ball.position.z > ARENA_HEIGHT - r {
        ball.position.z = ARENA_HEIGHT - r;
        ball.velocity.z = -ball.velocity.z * BALL_RESTITUTION;
    }

    if !arena::in_goal_aperture(ball.position) {
        let max_x = arena::half_length() - r;
        if ball.position.x.abs() > max_x {
            ball.position.x = max_x.copysign(ball.position.x);
            ball.velocity.x = -ball.velocity.x * WALL_RESTITUTION;
        }
    }

    let max_y = arena::half_width() - r;
    if ball.position.y.abs() > max_y {
        ball.position.y = max_y.copysign(ball.position.y);
        ball.velocity.y = -ball.velocity.y * WALL_RESTITUTION;
    }
}

/// Resolve one car against the ball
///
/// Returns `None` when the spheres do not overlap, share a center, or are
/// already separating along the contact normal.
pub fn resolve_car_ball(car: &mut CarState, ball: &mut BallState) -> Option<CarBallContact> {
    let offset = ball.position - car.position;
    let dist = offset.length();
    let min_dist = CAR_RADIUS + ball.radius;
    if dist <= 0.0 || dist >= min_dist {
        return None;
    }

    let normal = offset / dist;
    let rel = ball.velocity.dot(normal) - car.velocity.dot(normal);
    if rel > 0.0 {
        return None;
    }

    let impulse = -(1.0 + CAR_BALL_ELASTICITY) * rel;
    ball.velocity += normal * impulse;

    let penetration = min_dist - dist;
    ball.position += normal * (penetration * BALL_PUSHOUT_SHARE);
    car.position -= normal * (penetration * CAR_PUSHOUT_SHARE);

    // The pushout must not move the car back through a wall
    let max_x = arena::half_length() - CAR_RADIUS;
    let max_y = arena::half_width() - CAR_RADIUS;
    car.position.x = car.position.x.clamp(-max_x, max_x);
    car.position.y = car.position.y.clamp(-max_y, max_y);

    // A grounded car stays glued to the floor
    if car.is_grounded {
        car.position.z = CAR_RADIUS;
    } else {
        car.position.z = car.position.z.max(CAR_RADIUS);
    }

    Some(CarBallContact {
        normal,
        impulse,
        penetration,
    })
}
