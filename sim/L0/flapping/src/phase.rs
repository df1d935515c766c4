//! Phase accumulation across variable-rate ticks.
//!
//! Two quantities are tracked:
//!
//! - `tau`: simulated seconds during which oscillation was enabled. It never
//!   decreases and is frozen while oscillation is off.
//! - One phase angle per channel, integrated as `2π·f·dt` with the frequency
//!   in effect for each tick and kept in `[0, 2π)`.
//!
//! Integrating the phase rather than evaluating `2π·f·tau` keeps the waveform
//! continuous when the frequency changes: only the slope of the phase
//! changes, never its value.

use std::f64::consts::TAU;

use sim_types::SimTime;

use crate::params::MotionParams;

/// Phase state owned by the tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhaseAccumulator {
    tau: f64,
    flap_phase: f64,
    z_phase: f64,
    last_time: SimTime,
}

impl PhaseAccumulator {
    /// Start accumulating from simulated time `start`.
    #[must_use]
    pub fn new(start: SimTime) -> Self {
        Self {
            tau: 0.0,
            flap_phase: 0.0,
            z_phase: 0.0,
            last_time: start,
        }
    }

    /// Advance to `now`.
    ///
    /// The elapsed time since the previous call is clamped at zero, so a host
    /// that rewinds its clock freezes the phase instead of reversing it. The
    /// reference time always moves to `now`. Phases only advance while
    /// `oscillating`. Returns the elapsed time that was applied.
    pub fn advance(&mut self, now: SimTime, oscillating: bool, params: &MotionParams) -> f64 {
        let dt = now.secs_since(self.last_time);
        self.last_time = now;
        if !oscillating {
            return 0.0;
        }

        self.tau += dt;
        self.flap_phase = integrate(self.flap_phase, params.frequency, dt);
        self.z_phase = integrate(self.z_phase, params.z_frequency, dt);
        dt
    }

    /// Accumulated oscillation time in seconds.
    #[must_use]
    pub fn tau(&self) -> f64 {
        self.tau
    }

    /// Flap channel phase in radians, in `[0, 2π)`.
    #[must_use]
    pub fn flap_phase(&self) -> f64 {
        self.flap_phase
    }

    /// Bounce channel phase in radians, in `[0, 2π)`.
    #[must_use]
    pub fn z_phase(&self) -> f64 {
        self.z_phase
    }

    /// Simulated time of the last advance.
    #[must_use]
    pub fn last_time(&self) -> SimTime {
        self.last_time
    }
}

/// One integration step. A non-finite increment leaves the phase untouched.
fn integrate(phase: f64, frequency: f64, dt: f64) -> f64 {
    let step = TAU * frequency * dt;
    if step.is_finite() {
        (phase + step).rem_euclid(TAU)
    } else {
        phase
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::PI;

    fn at(secs: f64) -> SimTime {
        SimTime::from_secs_f64(secs)
    }

    #[test]
    fn test_advance_while_enabled() {
        let params = MotionParams::default();
        let mut phase = PhaseAccumulator::new(at(1.0));

        let dt = phase.advance(at(1.1), true, &params);
        assert_relative_eq!(dt, 0.1, epsilon = 1e-12);
        assert_relative_eq!(phase.tau(), 0.1, epsilon = 1e-12);
        // 2 Hz for 0.1 s
        assert_relative_eq!(phase.flap_phase(), 0.4 * PI, epsilon = 1e-12);
        // 1 Hz for 0.1 s
        assert_relative_eq!(phase.z_phase(), 0.2 * PI, epsilon = 1e-12);
    }

    #[test]
    fn test_disabled_freezes_but_tracks_time() {
        let params = MotionParams::default();
        let mut phase = PhaseAccumulator::new(SimTime::ZERO);
        phase.advance(at(0.1), true, &params);
        let frozen = phase;

        assert_eq!(phase.advance(at(0.4), false, &params), 0.0);
        assert_eq!(phase.tau(), frozen.tau());
        assert_eq!(phase.flap_phase(), frozen.flap_phase());
        assert_eq!(phase.last_time(), at(0.4));

        // Resuming does not replay the paused interval
        phase.advance(at(0.401), true, &params);
        assert_relative_eq!(phase.tau(), 0.101, epsilon = 1e-12);
    }

    #[test]
    fn test_rewind_clamps_to_zero() {
        let params = MotionParams::default();
        let mut phase = PhaseAccumulator::new(at(0.5));
        phase.advance(at(0.6), true, &params);
        let tau = phase.tau();

        assert_eq!(phase.advance(at(0.2), true, &params), 0.0);
        assert_eq!(phase.tau(), tau);
        assert_eq!(phase.last_time(), at(0.2));

        phase.advance(at(0.3), true, &params);
        assert_relative_eq!(phase.tau(), tau + 0.1, epsilon = 1e-12);
    }

    #[test]
    fn test_frequency_change_keeps_phase_continuous() {
        let mut params = MotionParams::default();
        let mut phase = PhaseAccumulator::new(SimTime::ZERO);
        phase.advance(at(0.25), true, &params);
        assert_relative_eq!(phase.flap_phase(), PI, epsilon = 1e-12);

        params.frequency = 4.0;
        phase.advance(at(0.30), true, &params);
        assert_relative_eq!(phase.flap_phase(), 1.4 * PI, epsilon = 1e-12);
    }

    #[test]
    fn test_phase_wraps() {
        let params = MotionParams {
            frequency: 1000.0,
            ..MotionParams::default()
        };
        let mut phase = PhaseAccumulator::new(SimTime::ZERO);
        phase.advance(at(12.345_678), true, &params);
        assert!((0.0..TAU).contains(&phase.flap_phase()));
    }

    #[test]
    fn test_non_finite_frequency_is_skipped() {
        let mut params = MotionParams::default();
        let mut phase = PhaseAccumulator::new(SimTime::ZERO);
        phase.advance(at(0.1), true, &params);
        let before = phase.flap_phase();

        params.frequency = f64::NAN;
        phase.advance(at(0.2), true, &params);
        assert_eq!(phase.flap_phase(), before);
        // tau and the other channel still advance
        assert_relative_eq!(phase.tau(), 0.2, epsilon = 1e-12);
        assert_relative_eq!(phase.z_phase(), 0.4 * PI, epsilon = 1e-12);
    }

    #[test]
    fn test_zero_dt_is_bit_identical() {
        let params = MotionParams::default();
        let mut phase = PhaseAccumulator::new(SimTime::ZERO);
        phase.advance(at(0.123), true, &params);
        let before = phase;
        phase.advance(at(0.123), true, &params);
        assert_eq!(phase, before);
    }
}
