//! Flapping actuator plugin.
//!
//! Drives a model with two superposed sinusoids:
//!
//! - a **flap**: `θ = A_f·sin(φ_f)` written to axis 0 of a revolute joint
//! - a **bounce**: `z = A_z·sin(φ_z)` written as the Z of the model's world pose
//!
//! where each phase `φ` integrates `2π·f·dt` over simulated time while
//! oscillation is enabled. Amplitudes, frequencies and the enable flag are
//! retuned at runtime over five control topics:
//!
//! | Topic               | Payload | Sets              |
//! |---------------------|---------|-------------------|
//! | `/flap_frequency`   | float32 | flap frequency    |
//! | `/flap_amplitude`   | float32 | flap amplitude    |
//! | `/flap_oscillation` | bool    | oscillation on/off|
//! | `/z_amplitude`      | float32 | bounce amplitude  |
//! | `/z_frequency`      | float32 | bounce frequency  |
//!
//! # Per-tick pipeline
//!
//! ```text
//! WorldClock::now ─► PhaseAccumulator::advance ─► evaluate ─► Actuator::apply
//!                                                             (joint, then pose)
//! ControlListener ─► FlapParams   (any time, from the bus spinner thread)
//! ```
//!
//! Pausing keeps the reference time moving but freezes the phase, so resuming
//! continues the waveform exactly where it stopped. A frequency change
//! changes the slope of the phase, never its value.
//!
//! # Layer 0 Crate
//!
//! This is a Layer 0 crate with **zero Bevy dependencies**.

#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![warn(missing_docs)]
#![warn(clippy::all)]

mod actuation;
mod clock;
mod config;
mod control;
mod error;
mod motion;
mod params;
mod phase;
mod plugin;
pub mod teleop;

pub use actuation::{Actuator, FLAP_AXIS};
pub use clock::WorldClock;
pub use config::{ControlTopics, FlappingConfig};
pub use control::{ControlListener, ControlUpdate};
pub use error::{FlapError, Result};
pub use motion::{MotionTarget, evaluate};
pub use params::{FlapParams, MotionParams};
pub use phase::PhaseAccumulator;
pub use plugin::{FlappingPlugin, OscillationState};
pub use teleop::{Teleop, TeleopCommand};
