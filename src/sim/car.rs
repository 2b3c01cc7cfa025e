//! Car controller
//!
//! Turns one tick of control input into new car kinematics. Cars have yaw
//! only; pitch and roll stay at zero. The tick runs in a fixed order:
//! turn, drive forces in the forward/lateral frame, jump state machine,
//! gravity and friction, explicit Euler integration, floor and ceiling.

use glam::DVec3;

use super::input::ControlInput;
use super::jump::JumpContext;
use super::state::CarState;
use crate::consts::*;
use crate::{normalize_deg, yaw_basis};

/// Advance one car by `dt` seconds
pub fn update_car(car: &mut CarState, input: &ControlInput, jump: &mut JumpContext, dt: f64) {
    let input = input.sanitized();
    let grounded = car.is_grounded;

    // Turning gets tighter as the car slows down
    let speed_2d = car.speed_2d();
    let mut turn_rate = TURN_RATE * (0.55 + (1.0 - (speed_2d / MAX_CAR_SPEED).min(0.75)));
    if input.handbrake && grounded {
        turn_rate *= HANDBRAKE_TURN_BOOST;
    }
    car.rotation.yaw = normalize_deg(car.rotation.yaw + (input.steer * turn_rate * dt).to_degrees());

    let (forward, right) = yaw_basis(car.rotation.yaw);
    let mut forward_speed = car.velocity.dot(forward);
    let mut lateral_speed = car.velocity.dot(right);

    forward_speed += drive_accel(input.throttle, forward_speed, grounded) * dt;

    let boosting = input.boost && car.boost > 0.0 && input.throttle > 0.0;
    if boosting {
        forward_speed += BOOST_ACCEL * dt;
        car.boost = (car.boost - BOOST_DRAIN_RATE * dt).clamp(0.0, BOOST_MAX);
    } else {
        car.boost = (car.boost + BOOST_REGEN_RATE * dt).clamp(0.0, BOOST_MAX);
    }

    if grounded && input.throttle.abs() < COAST_THRESHOLD {
        forward_speed *= COAST_FRICTION;
    }

    let top_speed = if boosting { MAX_CAR_SPEED } else { MAX_DRIVE_SPEED };
    forward_speed = forward_speed.clamp(-MAX_CAR_SPEED, top_speed);

    lateral_speed *= match (grounded, input.handbrake) {
        (true, true) => HANDBRAKE_GRIP,
        (true, false) => LATERAL_GRIP,
        (false, _) => AIR_LATERAL_DAMPING,
    };

    car.velocity = forward * forward_speed + right * lateral_speed + DVec3::Z * car.velocity.z;

    apply_jump(car, &input, jump, forward, right, dt);

    car.velocity.z += GRAVITY * dt;
    let friction = if car.is_grounded { GROUND_FRICTION } else { AIR_RESISTANCE };
    car.velocity.x *= friction;
    car.velocity.y *= friction;

    car.position += car.velocity * dt;

    if car.position.z <= CAR_RADIUS {
        car.position.z = CAR_RADIUS;
        car.velocity.z = car.velocity.z.max(0.0);
        car.is_grounded = true;
        jump.land();
    }
    if car.position.z > ARENA_HEIGHT - CAR_RADIUS {
        car.position.z = ARENA_HEIGHT - CAR_RADIUS;
        car.velocity.z *= -CEILING_DAMPING;
    }

    car.last_input = input;
}

/// Longitudinal acceleration along the car's forward axis
///
/// On the ground, throttle against the current direction of travel brakes
/// (harder than it accelerates). In the air only weak pitch-free thrust is
/// available.
fn drive_accel(throttle: f64, forward_speed: f64, grounded: bool) -> f64 {
    if grounded {
        if throttle * forward_speed < 0.0 {
            throttle * BRAKE_ACCEL
        } else {
            throttle * THROTTLE_ACCEL
        }
    } else if throttle >= 0.0 {
        throttle * AIR_THROTTLE_ACCEL
    } else {
        throttle * AIR_REVERSE_ACCEL
    }
}

/// Jump press, jump hold, sticky separation and dodge
fn apply_jump(
    car: &mut CarState,
    input: &ControlInput,
    jump: &mut JumpContext,
    forward: DVec3,
    right: DVec3,
    dt: f64,
) {
    let pressed = jump.press_edge(input.jump);
    if car.is_grounded {
        jump.land();
    }

    let mut lifted_off = false;
    if pressed && car.is_grounded && jump.start_jump() {
        car.velocity.z += JUMP_VELOCITY;
        car.is_grounded = false;
        lifted_off = true;
    }

    if car.is_grounded {
        return;
    }

    jump.advance(dt);
    if input.jump {
        car.velocity.z += JUMP_HOLD_ACCEL * jump.take_hold(dt);
    }
    car.velocity.z -= STICKY_FORCE * jump.take_sticky(dt);

    if pressed && !lifted_off && jump.try_double_jump() {
        car.velocity.z += JUMP_VELOCITY;
        car.velocity += dodge_direction(input, forward, right) * DODGE_IMPULSE;
    }
}

/// Horizontal dodge direction from stick input, straight ahead when neutral
fn dodge_direction(input: &ControlInput, forward: DVec3, right: DVec3) -> DVec3 {
    let wish = forward * input.throttle + right * input.steer;
    let magnitude = wish.length();
    if magnitude < DODGE_DEADZONE {
        forward
    } else {
        wish / magnitude
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::Team;
    use proptest::prelude::*;

    fn parked_car() -> (CarState, JumpContext) {
        let mut car = CarState::at_kickoff("p1", "Pilot", Team::Orange, false, 0);
        car.position = DVec3::new(0.0, 0.0, CAR_RADIUS);
        (car, JumpContext::new())
    }

    fn run(car: &mut CarState, jump: &mut JumpContext, input: ControlInput, ticks: usize) {
        for _ in 0..ticks {
            update_car(car, &input, jump, SIM_DT);
        }
    }

    fn throttle(value: f64) -> ControlInput {
        ControlInput {
            throttle: value,
            ..Default::default()
        }
    }

    fn jump_held(held: bool) -> ControlInput {
        ControlInput {
            jump: held,
            ..Default::default()
        }
    }

    #[test]
    fn test_forward_acceleration_is_responsive() {
        let (mut car, mut jump) = parked_car();
        run(&mut car, &mut jump, throttle(1.0), 120);
        assert!(car.speed_2d() > 1200.0, "speed = {}", car.speed_2d());
        assert!(car.speed_2d() <= MAX_DRIVE_SPEED);
        assert!(car.velocity.x > 0.0);
        assert!(car.is_grounded);
        assert_eq!(car.position.z, CAR_RADIUS);
    }

    #[test]
    fn test_opposing_throttle_brakes_harder_than_reverse() {
        let (mut braking, mut jump_a) = parked_car();
        braking.velocity = DVec3::new(1000.0, 0.0, 0.0);
        update_car(&mut braking, &throttle(-1.0), &mut jump_a, SIM_DT);

        let (mut reversing, mut jump_b) = parked_car();
        update_car(&mut reversing, &throttle(-1.0), &mut jump_b, SIM_DT);

        let brake_delta = 1000.0 - braking.velocity.x / GROUND_FRICTION;
        let reverse_delta = -reversing.velocity.x / GROUND_FRICTION;
        assert!((brake_delta - BRAKE_ACCEL * SIM_DT).abs() < 1e-6);
        assert!((reverse_delta - THROTTLE_ACCEL * SIM_DT).abs() < 1e-6);
    }

    #[test]
    fn test_turn_rate_drops_with_speed() {
        let steer = ControlInput {
            steer: 1.0,
            ..Default::default()
        };

        let (mut parked, mut jump_a) = parked_car();
        update_car(&mut parked, &steer, &mut jump_a, SIM_DT);

        let (mut fast, mut jump_b) = parked_car();
        fast.velocity = DVec3::new(0.75 * MAX_CAR_SPEED, 0.0, 0.0);
        update_car(&mut fast, &steer, &mut jump_b, SIM_DT);

        let slow_turn = (TURN_RATE * 1.55 * SIM_DT).to_degrees();
        let fast_turn = (TURN_RATE * 0.80 * SIM_DT).to_degrees();
        assert!((parked.rotation.yaw - slow_turn).abs() < 1e-9);
        assert!((fast.rotation.yaw - fast_turn).abs() < 1e-9);
    }

    #[test]
    fn test_air_throttle_is_weak() {
        let airborne = || {
            let (mut car, jump) = parked_car();
            car.position.z = 500.0;
            car.is_grounded = false;
            (car, jump)
        };

        let (mut forward, mut jump_a) = airborne();
        update_car(&mut forward, &throttle(1.0), &mut jump_a, SIM_DT);
        assert!((forward.velocity.x - AIR_THROTTLE_ACCEL * SIM_DT * AIR_RESISTANCE).abs() < 1e-9);

        let (mut reverse, mut jump_b) = airborne();
        update_car(&mut reverse, &throttle(-1.0), &mut jump_b, SIM_DT);
        assert!((reverse.velocity.x + AIR_REVERSE_ACCEL * SIM_DT * AIR_RESISTANCE).abs() < 1e-9);
        assert!(!reverse.is_grounded);
    }

    #[test]
    fn test_airborne_lateral_speed_decays_slowly() {
        let (mut car, mut jump) = parked_car();
        car.position.z = 500.0;
        car.is_grounded = false;
        car.velocity = DVec3::new(0.0, 800.0, 0.0);
        update_car(&mut car, &ControlInput::default(), &mut jump, SIM_DT);

        assert!((car.velocity.y - 800.0 * AIR_LATERAL_DAMPING * AIR_RESISTANCE).abs() < 1e-9);
        assert!(car.velocity.x.abs() < 1e-9);
    }

    #[test]
    fn test_coasting_decays_speed() {
        let (mut car, mut jump) = parked_car();
        car.velocity = DVec3::new(1000.0, 0.0, 0.0);
        run(&mut car, &mut jump, ControlInput::default(), 60);
        assert!(car.velocity.x < 1000.0 * 0.8);
        assert!(car.velocity.x > 0.0);
    }

    #[test]
    fn test_boost_drains_and_regenerates() {
        let (mut car, mut jump) = parked_car();
        let boost = ControlInput {
            throttle: 1.0,
            boost: true,
            ..Default::default()
        };
        run(&mut car, &mut jump, boost, 120);
        let after_boost = car.boost;
        assert!((after_boost - (BOOST_MAX - BOOST_DRAIN_RATE)).abs() < 1e-6);
        assert!(car.speed_2d() > MAX_DRIVE_SPEED);

        run(&mut car, &mut jump, ControlInput::default(), 240);
        assert!(car.boost > after_boost);
        assert!(car.boost <= BOOST_MAX);
    }

    #[test]
    fn test_boost_needs_forward_throttle() {
        let (mut car, mut jump) = parked_car();
        car.boost = 50.0;
        let input = ControlInput {
            throttle: 0.0,
            boost: true,
            ..Default::default()
        };
        update_car(&mut car, &input, &mut jump, SIM_DT);
        assert!(car.boost > 50.0);
        assert_eq!(car.velocity.x, 0.0);
    }

    #[test]
    fn test_empty_tank_does_not_boost() {
        let (mut car, mut jump) = parked_car();
        car.boost = 0.0;
        car.velocity = DVec3::new(MAX_DRIVE_SPEED, 0.0, 0.0);
        let input = ControlInput {
            throttle: 1.0,
            boost: true,
            ..Default::default()
        };
        update_car(&mut car, &input, &mut jump, SIM_DT);
        assert!(car.speed_2d() <= MAX_DRIVE_SPEED);
    }

    #[test]
    fn test_steering_wraps_yaw() {
        let (mut car, mut jump) = parked_car();
        car.rotation.yaw = 1.0;
        let input = ControlInput {
            steer: -1.0,
            ..Default::default()
        };
        run(&mut car, &mut jump, input, 10);
        assert!(car.rotation.yaw > 300.0 && car.rotation.yaw < 360.0);
    }

    #[test]
    fn test_handbrake_turns_faster_and_slides() {
        let (mut normal, mut jump_a) = parked_car();
        let (mut drifting, mut jump_b) = parked_car();
        for car in [&mut normal, &mut drifting] {
            car.velocity = DVec3::new(0.0, 800.0, 0.0);
        }
        let steer = ControlInput {
            steer: 1.0,
            ..Default::default()
        };
        let handbrake = ControlInput {
            steer: 1.0,
            handbrake: true,
            ..Default::default()
        };
        update_car(&mut normal, &steer, &mut jump_a, SIM_DT);
        update_car(&mut drifting, &handbrake, &mut jump_b, SIM_DT);

        assert!(drifting.rotation.yaw > normal.rotation.yaw);
        // Handbrake keeps more of the sideways velocity
        assert!(drifting.velocity.y.abs() > normal.velocity.y.abs());
    }

    #[test]
    fn test_single_jump_impulse_applies_once() {
        let (mut car, mut jump) = parked_car();
        update_car(&mut car, &jump_held(true), &mut jump, SIM_DT);

        let expected = JUMP_VELOCITY + (JUMP_HOLD_ACCEL - STICKY_FORCE + GRAVITY) * SIM_DT;
        assert!((car.velocity.z - expected).abs() < 1e-9);
        assert!(!car.is_grounded);
        assert_eq!(jump.used_jumps(), 1);

        // Holding the button keeps thrusting but never re-fires the impulse
        let before = car.velocity.z;
        update_car(&mut car, &jump_held(true), &mut jump, SIM_DT);
        assert!(car.velocity.z - before < JUMP_VELOCITY / 2.0);
        assert_eq!(jump.used_jumps(), 1);
    }

    #[test]
    fn test_double_jump_dodges_toward_input() {
        let (mut car, mut jump) = parked_car();
        update_car(&mut car, &jump_held(true), &mut jump, SIM_DT);
        run(&mut car, &mut jump, jump_held(false), 8);

        let vz_before = car.velocity.z;
        let vx_before = car.velocity.x;
        let dodge = ControlInput {
            throttle: 1.0,
            jump: true,
            ..Default::default()
        };
        update_car(&mut car, &dodge, &mut jump, SIM_DT);

        assert_eq!(jump.used_jumps(), 2);
        assert!(car.velocity.z > vz_before + JUMP_VELOCITY * 0.9);
        assert!(car.velocity.x > vx_before + DODGE_IMPULSE * 0.9);
        assert!(car.velocity.y.abs() < 1e-6);
    }

    #[test]
    fn test_neutral_dodge_goes_forward() {
        let (mut car, mut jump) = parked_car();
        car.rotation.yaw = 90.0;
        update_car(&mut car, &jump_held(true), &mut jump, SIM_DT);
        run(&mut car, &mut jump, jump_held(false), 4);
        update_car(&mut car, &jump_held(true), &mut jump, SIM_DT);

        assert_eq!(jump.used_jumps(), 2);
        assert!(car.velocity.y > DODGE_IMPULSE * 0.9);
        assert!(car.velocity.x.abs() < 1e-6);
    }

    #[test]
    fn test_third_press_has_no_effect() {
        let (mut car, mut jump) = parked_car();
        update_car(&mut car, &jump_held(true), &mut jump, SIM_DT);
        run(&mut car, &mut jump, jump_held(false), 4);
        update_car(&mut car, &jump_held(true), &mut jump, SIM_DT);
        run(&mut car, &mut jump, jump_held(false), 4);
        assert_eq!(jump.used_jumps(), 2);

        let before = car.velocity;
        update_car(&mut car, &jump_held(true), &mut jump, SIM_DT);
        assert_eq!(jump.used_jumps(), 2);
        assert!((car.velocity.z - (before.z + GRAVITY * SIM_DT)).abs() < 1e-9);
        assert!((car.velocity.x - before.x * AIR_RESISTANCE).abs() < 1e-9);
    }

    #[test]
    fn test_late_second_press_is_ignored() {
        let (mut car, mut jump) = parked_car();
        // Full jump hold for maximum hang time
        run(&mut car, &mut jump, jump_held(true), 30);
        for _ in 0..400 {
            if jump.time_since_jump() > DOUBLE_JUMP_MAX {
                break;
            }
            update_car(&mut car, &jump_held(false), &mut jump, SIM_DT);
        }
        assert!(!car.is_grounded, "car landed before the window closed");
        assert!(jump.time_since_jump() > DOUBLE_JUMP_MAX);

        let before = car.velocity;
        update_car(&mut car, &jump_held(true), &mut jump, SIM_DT);
        assert_eq!(jump.used_jumps(), 1);
        assert!((car.velocity.z - (before.z + GRAVITY * SIM_DT)).abs() < 1e-9);
        assert_eq!(car.velocity.x, 0.0);
        assert_eq!(car.velocity.y, 0.0);
    }

    #[test]
    fn test_landing_resets_jump_state() {
        let (mut car, mut jump) = parked_car();
        update_car(&mut car, &jump_held(true), &mut jump, SIM_DT);
        for _ in 0..600 {
            update_car(&mut car, &jump_held(false), &mut jump, SIM_DT);
            if car.is_grounded {
                break;
            }
        }
        assert!(car.is_grounded);
        assert_eq!(car.position.z, CAR_RADIUS);
        assert_eq!(car.velocity.z, 0.0);
        assert_eq!(jump.used_jumps(), 0);

        // And a fresh press works again
        update_car(&mut car, &jump_held(true), &mut jump, SIM_DT);
        assert_eq!(jump.used_jumps(), 1);
    }

    #[test]
    fn test_ceiling_clamps_and_damps() {
        let (mut car, mut jump) = parked_car();
        car.is_grounded = false;
        car.position.z = ARENA_HEIGHT - CAR_RADIUS - 1.0;
        car.velocity.z = 1000.0;
        update_car(&mut car, &ControlInput::default(), &mut jump, SIM_DT);
        assert_eq!(car.position.z, ARENA_HEIGHT - CAR_RADIUS);
        assert!(car.velocity.z < 0.0);
        assert!(car.velocity.z.abs() < 1000.0 * CEILING_DAMPING + 1.0);
    }

    #[test]
    fn test_out_of_range_input_is_clamped() {
        let (mut a, mut jump_a) = parked_car();
        let (mut b, mut jump_b) = parked_car();
        update_car(&mut a, &throttle(5.0), &mut jump_a, SIM_DT);
        update_car(&mut b, &throttle(1.0), &mut jump_b, SIM_DT);
        assert_eq!(a.velocity, b.velocity);
        assert_eq!(a.last_input.throttle, 1.0);

        let (mut c, mut jump_c) = parked_car();
        update_car(&mut c, &throttle(f64::NAN), &mut jump_c, SIM_DT);
        assert!(c.position.is_finite());
    }

    fn arb_input() -> impl Strategy<Value = ControlInput> {
        (
            -1.5f64..1.5,
            -1.5f64..1.5,
            any::<bool>(),
            any::<bool>(),
            any::<bool>(),
        )
            .prop_map(|(throttle, steer, boost, jump, handbrake)| ControlInput {
                throttle,
                steer,
                boost,
                jump,
                handbrake,
            })
    }

    proptest! {
        #[test]
        fn prop_car_invariants_hold(inputs in prop::collection::vec(arb_input(), 1..400)) {
            let (mut car, mut jump) = parked_car();
            let mut used = jump.used_jumps();
            for input in inputs {
                update_car(&mut car, &input, &mut jump, SIM_DT);

                prop_assert!((0.0..=BOOST_MAX).contains(&car.boost));
                prop_assert!(car.rotation.yaw >= 0.0 && car.rotation.yaw < 360.0);
                if car.is_grounded {
                    prop_assert_eq!(car.position.z, CAR_RADIUS);
                    prop_assert_eq!(jump.used_jumps(), 0);
                } else {
                    prop_assert!(jump.used_jumps() >= used);
                    prop_assert!(car.position.z > CAR_RADIUS);
                }
                used = jump.used_jumps();
            }
        }
    }
}
