//! Runtime motion parameters shared between the tick and the control topics.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// One consistent read of the four motion parameters.
///
/// The tick takes exactly one snapshot and uses it for the whole step.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MotionParams {
    /// Flap amplitude in radians. Negative values invert the waveform.
    pub amplitude: f64,
    /// Flap frequency in Hz.
    pub frequency: f64,
    /// Bounce amplitude in meters.
    pub z_amplitude: f64,
    /// Bounce frequency in Hz.
    pub z_frequency: f64,
}

impl Default for MotionParams {
    fn default() -> Self {
        Self {
            amplitude: 0.5,
            frequency: 2.0,
            z_amplitude: 0.1,
            z_frequency: 1.0,
        }
    }
}

/// `f64` stored as bits in an `AtomicU64`.
#[derive(Debug)]
struct AtomicF64(AtomicU64);

impl AtomicF64 {
    fn new(value: f64) -> Self {
        Self(AtomicU64::new(value.to_bits()))
    }

    fn load(&self) -> f64 {
        f64::from_bits(self.0.load(Ordering::Acquire))
    }

    fn store(&self, value: f64) {
        self.0.store(value.to_bits(), Ordering::Release);
    }
}

/// The live parameter record.
///
/// Each field is its own atomic: a control message is a single store and the
/// tick never blocks on a writer. There is no ordering between fields, so a
/// snapshot taken while two messages land may see one update and not the
/// other; the next tick sees both.
#[derive(Debug)]
pub struct FlapParams {
    amplitude: AtomicF64,
    frequency: AtomicF64,
    z_amplitude: AtomicF64,
    z_frequency: AtomicF64,
    oscillating: AtomicBool,
}

impl Default for FlapParams {
    fn default() -> Self {
        Self::new(MotionParams::default())
    }
}

impl FlapParams {
    /// Create a record holding `motion`, with oscillation disabled.
    #[must_use]
    pub fn new(motion: MotionParams) -> Self {
        Self {
            amplitude: AtomicF64::new(motion.amplitude),
            frequency: AtomicF64::new(motion.frequency),
            z_amplitude: AtomicF64::new(motion.z_amplitude),
            z_frequency: AtomicF64::new(motion.z_frequency),
            oscillating: AtomicBool::new(false),
        }
    }

    /// Overwrite all four motion parameters.
    pub fn reset(&self, motion: MotionParams) {
        self.amplitude.store(motion.amplitude);
        self.frequency.store(motion.frequency);
        self.z_amplitude.store(motion.z_amplitude);
        self.z_frequency.store(motion.z_frequency);
    }

    /// Read all four motion parameters.
    #[must_use]
    pub fn snapshot(&self) -> MotionParams {
        MotionParams {
            amplitude: self.amplitude.load(),
            frequency: self.frequency.load(),
            z_amplitude: self.z_amplitude.load(),
            z_frequency: self.z_frequency.load(),
        }
    }

    /// Set the flap amplitude.
    pub fn set_amplitude(&self, value: f64) {
        self.amplitude.store(value);
    }

    /// Set the flap frequency.
    pub fn set_frequency(&self, value: f64) {
        self.frequency.store(value);
    }

    /// Set the bounce amplitude.
    pub fn set_z_amplitude(&self, value: f64) {
        self.z_amplitude.store(value);
    }

    /// Set the bounce frequency.
    pub fn set_z_frequency(&self, value: f64) {
        self.z_frequency.store(value);
    }

    /// Enable or disable oscillation.
    pub fn set_oscillating(&self, enabled: bool) {
        self.oscillating.store(enabled, Ordering::Release);
    }

    /// Whether oscillation is enabled.
    #[must_use]
    pub fn is_oscillating(&self) -> bool {
        self.oscillating.load(Ordering::Acquire)
    }
}
