//! World pose of a model.

use nalgebra::{Point3, UnitQuaternion};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Position and orientation of a model's reference frame in the world.
///
/// # Example
///
/// ```
/// use sim_types::Pose;
/// use nalgebra::{Point3, UnitQuaternion};
///
/// let pose = Pose::from_position_rotation(
///     Point3::new(1.0, 2.0, 3.0),
///     UnitQuaternion::from_euler_angles(0.0, 0.0, 0.3),
/// );
///
/// // Replacing Z keeps X, Y and the orientation
/// let lifted = pose.with_z(-0.1);
/// assert_eq!(lifted.position.x, 1.0);
/// assert_eq!(lifted.position.y, 2.0);
/// assert_eq!(lifted.position.z, -0.1);
/// assert_eq!(lifted.rotation, pose.rotation);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Pose {
    /// Position in world coordinates.
    pub position: Point3<f64>,
    /// Orientation as a unit quaternion.
    pub rotation: UnitQuaternion<f64>,
}

impl Default for Pose {
    fn default() -> Self {
        Self::identity()
    }
}

impl Pose {
    /// Create an identity pose (origin, no rotation).
    #[must_use]
    pub fn identity() -> Self {
        Self {
            position: Point3::origin(),
            rotation: UnitQuaternion::identity(),
        }
    }

    /// Create a pose from position only (identity rotation).
    #[must_use]
    pub fn from_position(position: Point3<f64>) -> Self {
        Self {
            position,
            rotation: UnitQuaternion::identity(),
        }
    }

    /// Create a pose from position and rotation.
    #[must_use]
    pub const fn from_position_rotation(
        position: Point3<f64>,
        rotation: UnitQuaternion<f64>,
    ) -> Self {
        Self { position, rotation }
    }

    /// Return a copy of this pose with the Z translation replaced.
    ///
    /// X, Y and the orientation are preserved bit for bit.
    #[must_use]
    pub fn with_z(mut self, z: f64) -> Self {
        self.position.z = z;
        self
    }

    /// Check if the pose contains `NaN` or `Inf` values.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.position.coords.iter().all(|x| x.is_finite())
            && self.rotation.coords.iter().all(|x| x.is_finite())
    }
}
