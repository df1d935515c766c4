//! Simulated time.
//!
//! The host's clock is authoritative: it may pause, single-step, scale or even
//! rewind time. [`SimTime`] is a nanosecond count so that per-tick deltas of a
//! kilohertz simulator are exact.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

const NANOS_PER_SEC: u64 = 1_000_000_000;

/// Nanosecond-precision simulated time since world start.
///
/// # Example
///
/// ```
/// use sim_types::SimTime;
///
/// let t = SimTime::from_secs_f64(1.5);
/// assert_eq!(t.as_nanos(), 1_500_000_000);
/// assert_eq!(t.to_string(), "1.500000000s");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SimTime {
    nanos: u64,
}

impl SimTime {
    /// The start of simulated time.
    pub const ZERO: Self = Self { nanos: 0 };

    /// Creates a time from nanoseconds.
    #[must_use]
    pub const fn from_nanos(nanos: u64) -> Self {
        Self { nanos }
    }

    /// Creates a time from seconds, rounded to the nearest nanosecond.
    ///
    /// Negative and `NaN` inputs map to [`SimTime::ZERO`].
    #[must_use]
    #[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
    pub fn from_secs_f64(secs: f64) -> Self {
        let nanos = (secs * 1e9).round().max(0.0) as u64;
        Self { nanos }
    }

    /// Returns the time as nanoseconds.
    #[must_use]
    pub const fn as_nanos(self) -> u64 {
        self.nanos
    }

    /// Returns the time as seconds.
    #[must_use]
    pub fn as_secs_f64(self) -> f64 {
        self.nanos as f64 / 1e9
    }

    /// Seconds elapsed since `earlier`, clamped to zero.
    ///
    /// A host that rewinds its clock yields `0.0` here instead of a negative
    /// duration.
    #[must_use]
    pub fn secs_since(self, earlier: Self) -> f64 {
        self.nanos.saturating_sub(earlier.nanos) as f64 / 1e9
    }
}

impl std::fmt::Display for SimTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}.{:09}s",
            self.nanos / NANOS_PER_SEC,
            self.nanos % NANOS_PER_SEC
        )
    }
}
