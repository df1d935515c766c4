//! Error types for host primitive operations.

use thiserror::Error;

/// Errors a host can report when a plugin manipulates its models and joints.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SimError {
    /// A joint axis index outside the joint's degrees of freedom.
    #[error("joint {joint} has no axis {axis} ({dof} DOF)")]
    InvalidAxis {
        /// Name of the joint.
        joint: String,
        /// The requested axis index.
        axis: usize,
        /// Degrees of freedom of the joint.
        dof: usize,
    },

    /// A write carried `NaN` or `Inf` values.
    #[error("non-finite value written to {target}")]
    NonFinite {
        /// What the write targeted.
        target: String,
    },

    /// The host refused a write for its own reasons.
    #[error("write to {target} rejected: {reason}")]
    WriteRejected {
        /// What the write targeted.
        target: String,
        /// Description of why the host refused.
        reason: String,
    },
}

impl SimError {
    /// Create a non-finite write error.
    #[must_use]
    pub fn non_finite(target: impl Into<String>) -> Self {
        Self::NonFinite {
            target: target.into(),
        }
    }

    /// Create a rejected write error.
    #[must_use]
    pub fn write_rejected(target: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::WriteRejected {
            target: target.into(),
            reason: reason.into(),
        }
    }

    /// Check if this error is a per-step write failure the caller may simply
    /// skip, as opposed to a misaddressed write.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::NonFinite { .. } | Self::WriteRejected { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SimError::non_finite("joint wing_joint");
        assert_eq!(err.to_string(), "non-finite value written to joint wing_joint");

        let err = SimError::InvalidAxis {
            joint: "hinge".into(),
            axis: 2,
            dof: 1,
        };
        assert_eq!(err.to_string(), "joint hinge has no axis 2 (1 DOF)");

        let err = SimError::write_rejected("model pose", "paused");
        assert!(err.to_string().contains("paused"));
    }

    #[test]
    fn test_error_predicates() {
        assert!(SimError::non_finite("pose").is_transient());
        assert!(SimError::write_rejected("pose", "busy").is_transient());
        assert!(
            !SimError::InvalidAxis {
                joint: "hinge".into(),
                axis: 1,
                dof: 1,
            }
            .is_transient()
        );
    }
}
