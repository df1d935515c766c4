//! Error types for the flapping plugin.

use sim_host::DescriptorError;
use sim_transport::TransportError;
use sim_types::JointType;
use thiserror::Error;

/// Errors that can occur while loading the flapping plugin.
///
/// Every variant leaves the plugin inert. Nothing here is raised from the
/// per-tick path; tick failures are logged and the tick is skipped.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum FlapError {
    /// The `<plugin>` descriptor is missing a field or has a bad value.
    #[error(transparent)]
    Descriptor(#[from] DescriptorError),

    /// The configuration parsed but is not usable.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The configured joint does not exist on the model.
    #[error("could not find joint {joint} on model {model}")]
    JointNotFound {
        /// Model name.
        model: String,
        /// Configured joint name.
        joint: String,
    },

    /// The joint exists but has no axis to drive.
    #[error("joint {joint} is {joint_type} and has no axis 0")]
    NoAxis {
        /// Joint name.
        joint: String,
        /// Its kind.
        joint_type: JointType,
    },

    /// Subscribing to a control topic failed.
    #[error("control topic wiring failed: {0}")]
    Transport(#[from] TransportError),

    /// `load` was called twice on the same plugin.
    #[error("plugin is already loaded")]
    AlreadyLoaded,
}

impl FlapError {
    /// Create an invalid configuration error.
    #[must_use]
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Check if this error came from the plugin descriptor or configuration.
    #[must_use]
    pub fn is_config_error(&self) -> bool {
        matches!(self, Self::Descriptor(_) | Self::InvalidConfig(_))
    }
}

/// Result type for plugin loading.
pub type Result<T> = std::result::Result<T, FlapError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = FlapError::JointNotFound {
            model: "flapper".into(),
            joint: "nonexistent".into(),
        };
        assert_eq!(
            err.to_string(),
            "could not find joint nonexistent on model flapper"
        );
        assert!(!err.is_config_error());

        let err = FlapError::NoAxis {
            joint: "mount".into(),
            joint_type: JointType::Fixed,
        };
        assert!(err.to_string().contains("fixed"));
    }

    #[test]
    fn test_from_descriptor_error() {
        let err: FlapError = DescriptorError::missing_field("flapping", "joint_name").into();
        assert!(err.is_config_error());
        assert!(err.to_string().contains("joint_name"));
    }
}
