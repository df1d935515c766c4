//! The motion law.

use crate::params::MotionParams;
use crate::phase::PhaseAccumulator;

/// Commanded joint angle and model height for one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionTarget {
    /// Flap joint angle in radians.
    pub joint_position: f64,
    /// World Z of the model in meters.
    pub z: f64,
}

/// Evaluate `θ = A_f·sin(φ_f)` and `z = A_z·sin(φ_z)`.
///
/// With constant frequencies this is `A·sin(2π·f·τ)`. The bounce replaces the
/// model's Z outright; it is not an offset from the spawn height.
///
/// # Example
///
/// ```
/// use sim_flapping::{MotionParams, PhaseAccumulator, evaluate};
/// use sim_types::SimTime;
///
/// let params = MotionParams::default();
/// let mut phase = PhaseAccumulator::new(SimTime::ZERO);
/// phase.advance(SimTime::from_secs_f64(0.25), true, &params);
///
/// let target = evaluate(&params, &phase);
/// assert!(target.joint_position.abs() < 1e-9);
/// assert!((target.z - 0.1).abs() < 1e-9);
/// ```
#[must_use]
pub fn evaluate(params: &MotionParams, phase: &PhaseAccumulator) -> MotionTarget {
    MotionTarget {
        joint_position: params.amplitude * phase.flap_phase().sin(),
        z: params.z_amplitude * phase.z_phase().sin(),
    }
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use sim_types::SimTime;

    fn phase_at(secs: f64, params: &MotionParams) -> PhaseAccumulator {
        let mut phase = PhaseAccumulator::new(SimTime::ZERO);
        phase.advance(SimTime::from_secs_f64(secs), true, params);
        phase
    }

    #[test]
    fn test_quarter_periods() {
        let params = MotionParams::default();

        // 2 Hz flap peaks at 0.125 s, 1 Hz bounce at 0.25 s
        let target = evaluate(&params, &phase_at(0.125, &params));
        assert_relative_eq!(target.joint_position, 0.5, epsilon = 1e-12);

        let target = evaluate(&params, &phase_at(0.25, &params));
        assert_relative_eq!(target.joint_position, 0.0, epsilon = 1e-12);
        assert_relative_eq!(target.z, 0.1, epsilon = 1e-12);
    }

    #[test]
    fn test_negative_amplitude_inverts() {
        let params = MotionParams::default();
        let inverted = MotionParams {
            amplitude: -0.5,
            ..params
        };
        let phase = phase_at(0.1, &params);
        assert_relative_eq!(
            evaluate(&inverted, &phase).joint_position,
            -evaluate(&params, &phase).joint_position
        );
    }

    #[test]
    fn test_zero_amplitude_or_frequency_is_flat() {
        let params = MotionParams {
            amplitude: 0.0,
            z_frequency: 0.0,
            ..MotionParams::default()
        };
        let target = evaluate(&params, &phase_at(0.3, &params));
        assert_eq!(target.joint_position, 0.0);
        assert_eq!(target.z, 0.0);
    }
}
