//! The flapping model plugin.

use std::fmt;
use std::sync::Arc;

use sim_host::{Model, ModelPlugin, PluginElement, UpdateInfo};
use sim_transport::{Bus, SubscriptionStats, TopicName};
use tracing::{debug, info, trace, warn};

use crate::actuation::{Actuator, FLAP_AXIS};
use crate::clock::WorldClock;
use crate::config::FlappingConfig;
use crate::control::ControlListener;
use crate::error::{FlapError, Result};
use crate::motion::{self, MotionTarget};
use crate::params::FlapParams;
use crate::phase::PhaseAccumulator;

/// Whether the plugin is currently driving the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OscillationState {
    /// Oscillation disabled: no writes, phase frozen.
    #[default]
    Idle,
    /// Oscillation enabled: phase advances and both writes happen each tick.
    Active,
}

impl From<bool> for OscillationState {
    fn from(enabled: bool) -> Self {
        if enabled { Self::Active } else { Self::Idle }
    }
}

impl fmt::Display for OscillationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Active => write!(f, "active"),
        }
    }
}

/// Everything created by a successful load.
#[derive(Debug)]
struct Binding {
    config: FlappingConfig,
    clock: WorldClock,
    phase: PhaseAccumulator,
    actuator: Actuator,
    listener: ControlListener,
    last_target: Option<MotionTarget>,
}

/// Drives a revolute joint with a sinusoidal flap and the model's height
/// with a sinusoidal bounce.
///
/// Parameters start at the values in the plugin descriptor and are retuned
/// at runtime through the control topics. Oscillation starts disabled; the
/// first `true` on the oscillation topic starts it.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use sim_flapping::{FlappingConfig, FlappingPlugin};
/// use sim_host::{HeadlessWorld, PluginInstance};
/// use sim_transport::{Bus, Payload};
/// use sim_types::{JointType, Pose};
///
/// let bus = Bus::new();
/// let world = HeadlessWorld::new("default");
/// let model = world.spawn_model("flapper", Pose::identity());
/// model.add_joint("wing_joint", JointType::Revolute);
///
/// let element = FlappingConfig::new("wing_joint").to_element("flapping", "");
/// let plugin = PluginInstance::load(FlappingPlugin::new(bus.clone()), model.clone(), &element);
/// assert!(plugin.is_active());
///
/// bus.publish("/flap_oscillation", Payload::Bool(true)).unwrap();
/// bus.spin_once();
/// world.step_n(125, Duration::from_millis(1));
///
/// // Quarter period of the 2 Hz flap
/// let angle = plugin.with(|p| p.last_target()).unwrap().joint_position;
/// assert!((angle - 0.5).abs() < 1e-9);
/// ```
pub struct FlappingPlugin {
    bus: Bus,
    params: Arc<FlapParams>,
    state: OscillationState,
    skipped_ticks: u64,
    binding: Option<Binding>,
}

impl fmt::Debug for FlappingPlugin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlappingPlugin")
            .field("params", &self.params)
            .field("state", &self.state)
            .field("skipped_ticks", &self.skipped_ticks)
            .field("binding", &self.binding)
            .finish_non_exhaustive()
    }
}

impl FlappingPlugin {
    /// A plugin that will take its control topics from `bus`.
    #[must_use]
    pub fn new(bus: Bus) -> Self {
        Self {
            bus,
            params: Arc::new(FlapParams::default()),
            state: OscillationState::Idle,
            skipped_ticks: 0,
            binding: None,
        }
    }

    /// Bind to `model` with an already parsed configuration.
    ///
    /// The joint is resolved first; control topics are only subscribed once
    /// the joint is known to exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid, the joint is missing
    /// or has no axis 0, or the control topics cannot be subscribed.
    pub fn bind(&mut self, model: Arc<dyn Model>, config: FlappingConfig) -> Result<()> {
        if self.binding.is_some() {
            return Err(FlapError::AlreadyLoaded);
        }
        config.validate()?;

        let joint = model
            .joint(&config.joint_name)
            .ok_or_else(|| FlapError::JointNotFound {
                model: model.name().to_string(),
                joint: config.joint_name.clone(),
            })?;
        let joint_type = joint.joint_type();
        if !joint_type.has_axis(FLAP_AXIS) {
            return Err(FlapError::NoAxis {
                joint: config.joint_name.clone(),
                joint_type,
            });
        }

        self.params.reset(config.motion());
        self.params.set_oscillating(false);
        self.state = OscillationState::Idle;

        let listener =
            ControlListener::bind(&self.bus, &config.topics, config.queue_depth, &self.params)?;
        let clock = WorldClock::new(model.world());
        let phase = PhaseAccumulator::new(clock.now());

        info!(
            model = %model.name(),
            joint = %config.joint_name,
            amplitude = config.amplitude,
            frequency = config.frequency,
            z_amplitude = config.z_amplitude,
            z_frequency = config.z_frequency,
            "flapping plugin bound"
        );
        self.binding = Some(Binding {
            config,
            clock,
            phase,
            actuator: Actuator::new(model, joint),
            listener,
            last_target: None,
        });
        Ok(())
    }

    /// One tick: read the clock, advance the phase, then write joint and pose
    /// if oscillation is enabled.
    pub fn tick(&mut self) {
        let Some(binding) = self.binding.as_mut() else {
            return;
        };

        let oscillating = self.params.is_oscillating();
        let state = OscillationState::from(oscillating);
        if state != self.state {
            info!(
                from = %self.state,
                to = %state,
                tau = binding.phase.tau(),
                "oscillation state changed"
            );
            self.state = state;
        }

        let snapshot = self.params.snapshot();
        let now = binding.clock.now();
        let dt = binding.phase.advance(now, oscillating, &snapshot);
        if !oscillating {
            return;
        }

        let target = motion::evaluate(&snapshot, &binding.phase);
        match binding.actuator.apply(&target) {
            Ok(()) => {
                trace!(
                    %now,
                    dt,
                    tau = binding.phase.tau(),
                    theta = target.joint_position,
                    z = target.z,
                    "flap tick"
                );
                binding.last_target = Some(target);
            }
            Err(err) => {
                self.skipped_ticks += 1;
                if self.skipped_ticks == 1 {
                    warn!(error = %err, %now, "host rejected flap write, skipping tick");
                } else {
                    debug!(error = %err, %now, skipped = self.skipped_ticks, "skipping tick");
                }
            }
        }
    }

    /// The shared parameter record.
    #[must_use]
    pub fn params(&self) -> &Arc<FlapParams> {
        &self.params
    }

    /// Oscillation state as last observed by the tick.
    #[must_use]
    pub fn state(&self) -> OscillationState {
        self.state
    }

    /// Whether a load succeeded.
    #[must_use]
    pub fn is_bound(&self) -> bool {
        self.binding.is_some()
    }

    /// The configuration in effect, once bound.
    #[must_use]
    pub fn config(&self) -> Option<&FlappingConfig> {
        self.binding.as_ref().map(|b| &b.config)
    }

    /// Phase state, once bound.
    #[must_use]
    pub fn phase(&self) -> Option<&PhaseAccumulator> {
        self.binding.as_ref().map(|b| &b.phase)
    }

    /// The target of the last tick whose joint and pose writes both
    /// succeeded. A tick that is skipped leaves it unchanged, even when its
    /// joint write went through.
    #[must_use]
    pub fn last_target(&self) -> Option<MotionTarget> {
        self.binding.as_ref().and_then(|b| b.last_target)
    }

    /// Number of ticks skipped because the host rejected a write.
    #[must_use]
    pub fn skipped_ticks(&self) -> u64 {
        self.skipped_ticks
    }

    /// Delivery counters of the control topics, once bound.
    #[must_use]
    pub fn control_stats(&self) -> Vec<(TopicName, SubscriptionStats)> {
        self.binding
            .as_ref()
            .map(|b| b.listener.stats())
            .unwrap_or_default()
    }
}

impl ModelPlugin for FlappingPlugin {
    type Error = FlapError;

    fn load(&mut self, model: Arc<dyn Model>, element: &PluginElement) -> Result<()> {
        let config = FlappingConfig::from_element(element)?;
        self.bind(model, config)
    }

    fn on_update(&mut self, _info: &UpdateInfo) {
        self.tick();
    }
}

impl Drop for FlappingPlugin {
    fn drop(&mut self) {
        if let Some(binding) = self.binding.take() {
            // Unsubscribing waits out any control callback in flight, so
            // nothing can re-enable oscillation after this point.
            drop(binding);
            self.params.set_oscillating(false);
            self.state = OscillationState::Idle;
            debug!(skipped_ticks = self.skipped_ticks, "flapping plugin torn down");
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use sim_host::{HeadlessModel, HeadlessWorld, Joint, World};
    use sim_types::{JointType, Pose, SimTime};
    use std::time::Duration;

    const MS: Duration = Duration::from_millis(1);

    fn setup() -> (Bus, HeadlessWorld, Arc<HeadlessModel>) {
        let bus = Bus::new();
        let world = HeadlessWorld::new("w");
        let model = world.spawn_model("flapper", Pose::identity());
        model.add_joint("wing_joint", JointType::Revolute);
        model.add_joint("mount", JointType::Fixed);
        (bus, world, model)
    }

    #[test]
    fn test_bind_reads_clock_and_starts_idle() {
        let (bus, world, model) = setup();
        world.step_n(7, MS);

        let mut plugin = FlappingPlugin::new(bus.clone());
        plugin
            .bind(model, FlappingConfig::new("wing_joint").amplitude(0.3))
            .unwrap();

        assert!(plugin.is_bound());
        assert_eq!(plugin.state(), OscillationState::Idle);
        assert_eq!(plugin.phase().unwrap().last_time(), SimTime::from_nanos(7_000_000));
        assert_eq!(plugin.phase().unwrap().tau(), 0.0);
        assert_eq!(plugin.params().snapshot().amplitude, 0.3);
        assert_eq!(bus.topics().len(), 5);
    }

    #[test]
    fn test_bind_errors() {
        let (bus, _world, model) = setup();

        let mut plugin = FlappingPlugin::new(bus.clone());
        let err = plugin
            .bind(model.clone(), FlappingConfig::new("nonexistent"))
            .unwrap_err();
        assert!(matches!(err, FlapError::JointNotFound { .. }));
        // No subscriptions are made for a plugin that failed to bind
        assert!(bus.topics().is_empty());

        let err = plugin
            .bind(model.clone(), FlappingConfig::new("mount"))
            .unwrap_err();
        assert!(matches!(err, FlapError::NoAxis { joint_type: JointType::Fixed, .. }));

        plugin
            .bind(model.clone(), FlappingConfig::new("wing_joint"))
            .unwrap();
        let err = plugin
            .bind(model, FlappingConfig::new("wing_joint"))
            .unwrap_err();
        assert_eq!(err, FlapError::AlreadyLoaded);
    }

    #[test]
    fn test_idle_ticks_write_nothing() {
        let (bus, world, model) = setup();
        let mut plugin = FlappingPlugin::new(bus);
        plugin.bind(model.clone(), FlappingConfig::new("wing_joint")).unwrap();

        for _ in 0..10 {
            world.step(MS);
            plugin.tick();
        }
        let joint = model.headless_joint("wing_joint").unwrap();
        assert_eq!(joint.writes(), 0);
        assert_eq!(model.pose_writes(), 0);
        assert_eq!(plugin.last_target(), None);
        assert_eq!(plugin.phase().unwrap().last_time(), world.sim_time());
    }

    #[test]
    fn test_tick_drives_joint_and_height() {
        let (bus, world, model) = setup();
        let mut plugin = FlappingPlugin::new(bus);
        plugin.bind(model.clone(), FlappingConfig::new("wing_joint")).unwrap();
        plugin.params().set_oscillating(true);

        for _ in 0..125 {
            world.step(MS);
            plugin.tick();
        }
        assert_eq!(plugin.state(), OscillationState::Active);
        let joint = model.headless_joint("wing_joint").unwrap();
        assert_eq!(joint.writes(), 125);
        assert_eq!(model.pose_writes(), 125);
        assert_relative_eq!(joint.position(0).unwrap(), 0.5, epsilon = 1e-9);
        // 1 Hz bounce at 0.125 s
        assert_relative_eq!(
            model.world_pose().position.z,
            0.1 * (std::f64::consts::PI / 4.0).sin(),
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_rejected_writes_skip_ticks_without_stalling_phase() {
        let (bus, world, model) = setup();
        let mut plugin = FlappingPlugin::new(bus);
        plugin.bind(model.clone(), FlappingConfig::new("wing_joint")).unwrap();
        plugin.params().set_oscillating(true);

        let joint = model.headless_joint("wing_joint").unwrap();
        joint.reject_writes(true);
        for _ in 0..5 {
            world.step(MS);
            plugin.tick();
        }
        assert_eq!(plugin.skipped_ticks(), 5);
        assert_eq!(model.pose_writes(), 0);
        assert_relative_eq!(plugin.phase().unwrap().tau(), 0.005, epsilon = 1e-12);

        joint.reject_writes(false);
        world.step(MS);
        plugin.tick();
        assert_eq!(plugin.skipped_ticks(), 5);
        assert_eq!(model.pose_writes(), 1);
    }

    #[test]
    fn test_rejected_pose_write_counts_as_skipped() {
        let (bus, world, model) = setup();
        let mut plugin = FlappingPlugin::new(bus);
        plugin.bind(model.clone(), FlappingConfig::new("wing_joint")).unwrap();
        plugin.params().set_oscillating(true);

        let joint = model.headless_joint("wing_joint").unwrap();
        model.reject_pose_writes(true);
        for _ in 0..5 {
            world.step(MS);
            plugin.tick();
        }
        assert_eq!(plugin.skipped_ticks(), 5);
        assert_eq!(joint.writes(), 5);
        assert_eq!(model.pose_writes(), 0);
        assert_relative_eq!(plugin.phase().unwrap().tau(), 0.005, epsilon = 1e-12);
        assert!(joint.position(0).unwrap() > 0.0);
        // The joint moved, but no tick was applied whole
        assert_eq!(plugin.last_target(), None);

        model.reject_pose_writes(false);
        world.step(MS);
        plugin.tick();
        assert_eq!(plugin.skipped_ticks(), 5);
        assert_eq!(joint.writes(), 6);
        assert_eq!(model.pose_writes(), 1);
        let target = plugin.last_target().unwrap();
        assert_relative_eq!(target.joint_position, joint.position(0).unwrap());
        assert_relative_eq!(target.z, model.world_pose().position.z);
        assert_relative_eq!(plugin.phase().unwrap().tau(), 0.006, epsilon = 1e-12);
    }

    #[test]
    fn test_drop_reports_idle() {
        let (bus, _world, model) = setup();
        let mut plugin = FlappingPlugin::new(bus.clone());
        plugin.bind(model, FlappingConfig::new("wing_joint")).unwrap();
        plugin.params().set_oscillating(true);

        let params = Arc::clone(plugin.params());
        drop(plugin);
        assert!(!params.is_oscillating());
        assert!(bus.topics().is_empty());
    }
}
