//! Fixed-timestep driver
//!
//! Turns variable render-frame deltas into whole simulation ticks and hands
//! one snapshot per frame to whoever draws it.

use crate::consts::*;
use crate::sim::{MatchSim, MatchState};

/// Receives one immutable snapshot per rendered frame
pub trait SnapshotSink {
    fn publish(&mut self, snapshot: MatchState);
}

impl<F: FnMut(MatchState)> SnapshotSink for F {
    fn publish(&mut self, snapshot: MatchState) {
        self(snapshot)
    }
}

/// Accumulator state for the fixed-step loop
#[derive(Debug, Clone)]
pub struct FixedStepDriver {
    accumulator: f64,
    max_frame_dt: f64,
    total_steps: u64,
}

impl Default for FixedStepDriver {
    fn default() -> Self {
        Self::new(MAX_FRAME_DT)
    }
}

impl FixedStepDriver {
    /// A `max_frame_dt` that is not finite and positive falls back to
    /// `MAX_FRAME_DT`
    pub fn new(max_frame_dt: f64) -> Self {
        let max_frame_dt = if max_frame_dt.is_finite() && max_frame_dt > 0.0 {
            max_frame_dt
        } else {
            log::warn!("Invalid max frame dt {}, using {}", max_frame_dt, MAX_FRAME_DT);
            MAX_FRAME_DT
        };
        Self {
            accumulator: 0.0,
            max_frame_dt,
            total_steps: 0,
        }
    }

    /// Unconsumed simulation time, in seconds
    pub fn accumulator(&self) -> f64 {
        self.accumulator
    }

    pub fn total_steps(&self) -> u64 {
        self.total_steps
    }

    /// Drop any pending time (mode switch, resume after pause)
    pub fn reset(&mut self) {
        self.accumulator = 0.0;
    }

    /// Accumulate a frame delta and run `step` once per whole tick
    ///
    /// The delta is clamped first and at most `MAX_SUBSTEPS` ticks run per
    /// frame; leftover time stays in the accumulator for the next frame.
    /// Returns the number of ticks run.
    pub fn advance(&mut self, frame_dt: f64, mut step: impl FnMut(f64)) -> u32 {
        let dt = if frame_dt.is_finite() {
            frame_dt.clamp(0.0, self.max_frame_dt)
        } else {
            0.0
        };
        self.accumulator += dt;

        let mut substeps = 0;
        while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            step(SIM_DT);
            self.accumulator -= SIM_DT;
            substeps += 1;
        }
        self.total_steps += u64::from(substeps);
        substeps
    }

    /// Advance `sim` for one render frame and publish the result
    pub fn frame(&mut self, sim: &mut MatchSim, frame_dt: f64, sink: &mut dyn SnapshotSink) -> u32 {
        let substeps = self.advance(frame_dt, |dt| sim.tick(dt));
        sink.publish(sim.snapshot());
        substeps
    }
}
