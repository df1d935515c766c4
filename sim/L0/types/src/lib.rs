//! Core data types shared between simulator hosts and model plugins.
//!
//! This crate provides the vocabulary a host and a plugin use to talk to each
//! other:
//!
//! - [`Pose`] - Position and orientation of a model in the world frame
//! - [`JointType`] - Kind of joint and its degrees of freedom
//! - [`SimTime`] - Nanosecond-resolution simulated time
//! - [`SimError`] - Failures reported by host primitives
//!
//! # Design Philosophy
//!
//! These types are **pure data**. They have no behavior beyond small
//! conversions and queries. The host owns the physics, the plugin owns its
//! motion law, and this crate is the common language between them.
//!
//! # Layer 0
//!
//! This is a Layer 0 crate with **zero Bevy dependencies**.
//!
//! # Coordinate System
//!
//! - X: right
//! - Y: forward
//! - Z: up
//! - Right-handed
//!
//! # Example
//!
//! ```
//! use sim_types::{Pose, SimTime};
//! use nalgebra::Point3;
//!
//! let pose = Pose::from_position(Point3::new(1.0, 2.0, 3.0)).with_z(0.5);
//! assert_eq!(pose.position.z, 0.5);
//!
//! let t0 = SimTime::from_secs_f64(1.0);
//! let t1 = SimTime::from_secs_f64(1.25);
//! assert!((t1.secs_since(t0) - 0.25).abs() < 1e-12);
//! ```

#![doc(html_root_url = "https://docs.rs/sim-types/0.7.0")]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![warn(missing_docs)]
#![allow(
    clippy::missing_const_for_fn,     // Many methods can't be const due to nalgebra
    clippy::cast_precision_loss,       // u64 nanoseconds to f64 seconds is intended
    clippy::missing_errors_doc,        // Error docs added where non-obvious
)]

mod error;
mod joint;
mod pose;
mod time;

pub use error::SimError;
pub use joint::JointType;
pub use pose::Pose;
pub use time::SimTime;

// Re-export math types for convenience
pub use nalgebra::{Point3, UnitQuaternion};

/// Result type for host primitive operations.
pub type Result<T> = std::result::Result<T, SimError>;
