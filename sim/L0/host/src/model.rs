//! Host-side handles a plugin manipulates.
//!
//! These traits are the whole surface a model plugin sees of the simulator.
//! A host implements them over its own scene graph; [`crate::headless`]
//! implements them over a plain kinematic store.

use std::sync::Arc;

use sim_types::{JointType, Pose, SimTime};

use crate::event::{Connection, UpdateCallback};

/// A joint of a model.
pub trait Joint: Send + Sync {
    /// Joint name, unique within its model.
    fn name(&self) -> &str;

    /// Kind of joint.
    fn joint_type(&self) -> JointType;

    /// Kinematically set the position of one axis, in radians for rotational
    /// axes and meters for translational ones.
    ///
    /// # Errors
    ///
    /// Returns an error if the axis does not exist, the value is not finite
    /// or the host refuses the write.
    fn set_position(&self, axis: usize, position: f64) -> sim_types::Result<()>;

    /// Current position of one axis, `None` if the axis does not exist.
    fn position(&self, axis: usize) -> Option<f64>;
}

/// A model in the world.
pub trait Model: Send + Sync {
    /// Model name.
    fn name(&self) -> &str;

    /// Look up a joint by name.
    fn joint(&self, name: &str) -> Option<Arc<dyn Joint>>;

    /// Pose of the model's root in the world frame.
    fn world_pose(&self) -> Pose;

    /// Kinematically override the model's world pose.
    ///
    /// # Errors
    ///
    /// Returns an error if the pose is not finite or the host refuses the
    /// write.
    fn set_world_pose(&self, pose: Pose) -> sim_types::Result<()>;

    /// The world this model lives in.
    fn world(&self) -> Arc<dyn World>;
}

/// The simulated world.
pub trait World: Send + Sync {
    /// World name.
    fn name(&self) -> &str;

    /// Authoritative simulated time. The host may pause, step, scale or
    /// rewind it.
    fn sim_time(&self) -> SimTime;

    /// Register a callback fired at the beginning of every world update.
    fn connect_world_update_begin(&self, callback: UpdateCallback) -> Connection;
}
