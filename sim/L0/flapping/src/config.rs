//! Plugin configuration.

use sim_host::PluginElement;
use sim_transport::{DEFAULT_QUEUE_DEPTH, TopicName};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{FlapError, Result};
use crate::params::MotionParams;

/// Names of the five control topics.
///
/// The defaults are global names (`/flap_frequency`, ...), so every flapping
/// plugin in a process listens on the same topics.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ControlTopics {
    /// Flap frequency in Hz (float).
    pub flap_frequency: String,
    /// Flap amplitude in radians (float).
    pub flap_amplitude: String,
    /// Oscillation enable (bool).
    pub flap_oscillation: String,
    /// Bounce amplitude in meters (float).
    pub z_amplitude: String,
    /// Bounce frequency in Hz (float).
    pub z_frequency: String,
}

impl Default for ControlTopics {
    fn default() -> Self {
        Self {
            flap_frequency: "/flap_frequency".into(),
            flap_amplitude: "/flap_amplitude".into(),
            flap_oscillation: "/flap_oscillation".into(),
            z_amplitude: "/z_amplitude".into(),
            z_frequency: "/z_frequency".into(),
        }
    }
}

impl ControlTopics {
    /// The default topic names re-rooted under `namespace`.
    ///
    /// # Errors
    ///
    /// Returns an error if `namespace` does not form valid topic names.
    pub fn in_namespace(namespace: &str) -> Result<Self> {
        let resolve = |name: &str| -> Result<String> {
            Ok(TopicName::resolve(namespace, name)?.to_string())
        };
        Ok(Self {
            flap_frequency: resolve("flap_frequency")?,
            flap_amplitude: resolve("flap_amplitude")?,
            flap_oscillation: resolve("flap_oscillation")?,
            z_amplitude: resolve("z_amplitude")?,
            z_frequency: resolve("z_frequency")?,
        })
    }

    /// All topic names, in a fixed order.
    #[must_use]
    pub fn all(&self) -> [&str; 5] {
        [
            &self.flap_frequency,
            &self.flap_amplitude,
            &self.flap_oscillation,
            &self.z_amplitude,
            &self.z_frequency,
        ]
    }
}

/// Configuration of one flapping plugin instance.
///
/// # Example
///
/// ```
/// use sim_flapping::FlappingConfig;
///
/// let config = FlappingConfig::new("wing_joint")
///     .amplitude(0.3)
///     .frequency(4.0);
///
/// assert!(config.validate().is_ok());
/// assert_eq!(config.z_amplitude, 0.1);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FlappingConfig {
    /// Name of the joint to flap.
    pub joint_name: String,
    /// Initial flap amplitude in radians.
    pub amplitude: f64,
    /// Initial flap frequency in Hz.
    pub frequency: f64,
    /// Initial bounce amplitude in meters.
    pub z_amplitude: f64,
    /// Initial bounce frequency in Hz.
    pub z_frequency: f64,
    /// Control topic names.
    pub topics: ControlTopics,
    /// Queue depth of each control subscription.
    pub queue_depth: usize,
}

impl Default for FlappingConfig {
    fn default() -> Self {
        let motion = MotionParams::default();
        Self {
            joint_name: String::new(),
            amplitude: motion.amplitude,
            frequency: motion.frequency,
            z_amplitude: motion.z_amplitude,
            z_frequency: motion.z_frequency,
            topics: ControlTopics::default(),
            queue_depth: DEFAULT_QUEUE_DEPTH,
        }
    }
}

impl FlappingConfig {
    /// Default configuration driving `joint_name`.
    #[must_use]
    pub fn new(joint_name: impl Into<String>) -> Self {
        Self {
            joint_name: joint_name.into(),
            ..Self::default()
        }
    }

    /// Set the initial flap amplitude.
    #[must_use]
    pub fn amplitude(mut self, amplitude: f64) -> Self {
        self.amplitude = amplitude;
        self
    }

    /// Set the initial flap frequency.
    #[must_use]
    pub fn frequency(mut self, frequency: f64) -> Self {
        self.frequency = frequency;
        self
    }

    /// Set the initial bounce amplitude.
    #[must_use]
    pub fn z_amplitude(mut self, z_amplitude: f64) -> Self {
        self.z_amplitude = z_amplitude;
        self
    }

    /// Set the initial bounce frequency.
    #[must_use]
    pub fn z_frequency(mut self, z_frequency: f64) -> Self {
        self.z_frequency = z_frequency;
        self
    }

    /// Use different control topic names.
    #[must_use]
    pub fn topics(mut self, topics: ControlTopics) -> Self {
        self.topics = topics;
        self
    }

    /// Set the control subscription queue depth.
    #[must_use]
    pub fn queue_depth(mut self, depth: usize) -> Self {
        self.queue_depth = depth;
        self
    }

    /// Read the configuration from a `<plugin>` element.
    ///
    /// `joint_name`, `amplitude`, `frequency`, `z_amplitude` and
    /// `z_frequency` are required. `namespace` and `queue_depth` are
    /// optional.
    ///
    /// # Errors
    ///
    /// Returns an error if a required field is missing, any field fails to
    /// parse, or the result does not [`validate`](Self::validate).
    pub fn from_element(element: &PluginElement) -> Result<Self> {
        let topics = match element.get_str("namespace") {
            Some(namespace) => ControlTopics::in_namespace(namespace)?,
            None => ControlTopics::default(),
        };
        let config = Self {
            joint_name: element.get("joint_name")?,
            amplitude: element.get("amplitude")?,
            frequency: element.get("frequency")?,
            z_amplitude: element.get("z_amplitude")?,
            z_frequency: element.get("z_frequency")?,
            topics,
            queue_depth: element.get_or("queue_depth", DEFAULT_QUEUE_DEPTH)?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Write this configuration into a `<plugin>` element.
    ///
    /// Topic names are not written; an element only carries a namespace.
    #[must_use]
    pub fn to_element(&self, name: &str, filename: &str) -> PluginElement {
        PluginElement::new(name, filename)
            .with("joint_name", &self.joint_name)
            .with("amplitude", self.amplitude)
            .with("frequency", self.frequency)
            .with("z_amplitude", self.z_amplitude)
            .with("z_frequency", self.z_frequency)
            .with("queue_depth", self.queue_depth)
    }

    /// Check that the configuration is usable.
    ///
    /// # Errors
    ///
    /// Returns an error if the joint name is empty, a parameter is not
    /// finite or the queue depth is zero.
    pub fn validate(&self) -> Result<()> {
        if self.joint_name.trim().is_empty() {
            return Err(FlapError::invalid_config("joint_name must not be empty"));
        }
        let values = [
            ("amplitude", self.amplitude),
            ("frequency", self.frequency),
            ("z_amplitude", self.z_amplitude),
            ("z_frequency", self.z_frequency),
        ];
        for (field, value) in values {
            if !value.is_finite() {
                return Err(FlapError::invalid_config(format!(
                    "{field} must be finite, got {value}"
                )));
            }
        }
        if self.queue_depth == 0 {
            return Err(FlapError::invalid_config("queue_depth must be at least 1"));
        }
        Ok(())
    }

    /// The initial motion parameters.
    #[must_use]
    pub fn motion(&self) -> MotionParams {
        MotionParams {
            amplitude: self.amplitude,
            frequency: self.frequency,
            z_amplitude: self.z_amplitude,
            z_frequency: self.z_frequency,
        }
    }
}
