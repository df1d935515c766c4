//! Joint kinds.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Type of joint constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum JointType {
    /// Fixed joint - no relative motion allowed.
    Fixed,
    /// Revolute joint - rotation around a single axis.
    Revolute,
    /// Prismatic joint - translation along a single axis.
    Prismatic,
    /// Spherical joint - rotation around all axes (ball joint).
    Spherical,
    /// Free joint - 6 DOF (floating base).
    Free,
}

impl JointType {
    /// Get the number of degrees of freedom for this joint type.
    #[must_use]
    pub const fn dof(self) -> usize {
        match self {
            Self::Fixed => 0,
            Self::Revolute | Self::Prismatic => 1,
            Self::Spherical => 3,
            Self::Free => 6,
        }
    }

    /// Check whether `axis` addresses one of this joint's degrees of freedom.
    #[must_use]
    pub const fn has_axis(self, axis: usize) -> bool {
        axis < self.dof()
    }
}

impl std::fmt::Display for JointType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Fixed => write!(f, "fixed"),
            Self::Revolute => write!(f, "revolute"),
            Self::Prismatic => write!(f, "prismatic"),
            Self::Spherical => write!(f, "spherical"),
            Self::Free => write!(f, "free"),
        }
    }
}
