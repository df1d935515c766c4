//! Writing the motion into the host.

use std::sync::Arc;

use sim_host::{Joint, Model};

use crate::motion::MotionTarget;

/// Joint axis the flap drives.
pub const FLAP_AXIS: usize = 0;

/// Applies a [`MotionTarget`] to a model and its flap joint.
///
/// Both writes are kinematic overrides. The joint is written first; if the
/// host rejects it, the pose write is not attempted, so a tick is applied
/// either whole or as a joint write alone, never as a pose write alone.
#[derive(Clone)]
pub struct Actuator {
    model: Arc<dyn Model>,
    joint: Arc<dyn Joint>,
}

impl std::fmt::Debug for Actuator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Actuator")
            .field("model", &self.model.name())
            .field("joint", &self.joint.name())
            .finish()
    }
}

impl Actuator {
    /// Drive `joint` of `model`.
    #[must_use]
    pub fn new(model: Arc<dyn Model>, joint: Arc<dyn Joint>) -> Self {
        Self { model, joint }
    }

    /// Write the joint angle, then replace the Z of the model's world pose.
    ///
    /// X, Y and orientation of the pose are preserved.
    ///
    /// # Errors
    ///
    /// Returns the first host write failure.
    pub fn apply(&self, target: &MotionTarget) -> sim_types::Result<()> {
        self.joint.set_position(FLAP_AXIS, target.joint_position)?;
        let pose = self.model.world_pose().with_z(target.z);
        self.model.set_world_pose(pose)
    }
}
