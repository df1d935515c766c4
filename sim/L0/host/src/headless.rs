//! Headless kinematic reference host.
//!
//! No dynamics: joints and poses hold whatever was last written to them, and
//! the clock advances only when [`HeadlessWorld::step`] is called. This is
//! enough to run model plugins in tests and demos without a simulator.
//!
//! Writes are counted and can be made to fail on demand, so callers can
//! check exactly what a plugin wrote and how it copes with a host that
//! refuses writes.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use hashbrown::HashMap;
use parking_lot::Mutex;
use sim_types::{JointType, Pose, SimError, SimTime};
use tracing::trace;

use crate::event::{Connection, EventHub, UpdateCallback, UpdateInfo};
use crate::model::{Joint, Model, World};

struct WorldState {
    name: String,
    time: Mutex<SimTime>,
    iterations: AtomicU64,
    events: Arc<EventHub>,
}

/// A world with a manually stepped clock.
///
/// Cloning yields another handle to the same world.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use sim_host::{HeadlessWorld, World};
/// use sim_types::{JointType, Pose, SimTime};
///
/// let world = HeadlessWorld::new("default");
/// let model = world.spawn_model("flapper", Pose::identity());
/// model.add_joint("wing_joint", JointType::Revolute);
///
/// world.step(Duration::from_millis(1));
/// assert_eq!(world.sim_time(), SimTime::from_nanos(1_000_000));
/// ```
#[derive(Clone)]
pub struct HeadlessWorld {
    inner: Arc<WorldState>,
}

impl std::fmt::Debug for HeadlessWorld {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HeadlessWorld")
            .field("name", &self.inner.name)
            .field("time", &*self.inner.time.lock())
            .field("iterations", &self.iterations())
            .finish()
    }
}

impl HeadlessWorld {
    /// Create a world at time zero.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(WorldState {
                name: name.into(),
                time: Mutex::new(SimTime::ZERO),
                iterations: AtomicU64::new(0),
                events: EventHub::new(),
            }),
        }
    }

    /// Insert a model at `pose`.
    #[must_use]
    pub fn spawn_model(&self, name: impl Into<String>, pose: Pose) -> Arc<HeadlessModel> {
        Arc::new(HeadlessModel {
            name: name.into(),
            world: self.clone(),
            pose: Mutex::new(pose),
            joints: Mutex::new(HashMap::new()),
            pose_writes: AtomicU64::new(0),
            reject_pose_writes: AtomicBool::new(false),
        })
    }

    /// Advance the clock by `dt`, then fire the update event.
    ///
    /// A zero `dt` fires an update without advancing time.
    pub fn step(&self, dt: Duration) -> UpdateInfo {
        let delta = u64::try_from(dt.as_nanos()).unwrap_or(u64::MAX);
        let sim_time = {
            let mut time = self.inner.time.lock();
            *time = SimTime::from_nanos(time.as_nanos().saturating_add(delta));
            *time
        };
        let iteration = self.inner.iterations.fetch_add(1, Ordering::Relaxed) + 1;
        let info = UpdateInfo {
            sim_time,
            iteration,
        };
        trace!(world = %self.inner.name, %sim_time, iteration, "world update");
        self.inner.events.fire(&info);
        info
    }

    /// Take `count` steps of `dt` each. Returns the final simulated time.
    pub fn step_n(&self, count: u64, dt: Duration) -> SimTime {
        for _ in 0..count {
            self.step(dt);
        }
        self.sim_time()
    }

    /// Jump the clock to `time`, forwards or backwards, without firing.
    pub fn set_sim_time(&self, time: SimTime) {
        *self.inner.time.lock() = time;
    }

    /// Number of steps taken.
    #[must_use]
    pub fn iterations(&self) -> u64 {
        self.inner.iterations.load(Ordering::Relaxed)
    }

    /// Number of connected update listeners.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.inner.events.len()
    }
}

impl World for HeadlessWorld {
    fn name(&self) -> &str {
        &self.inner.name
    }

    fn sim_time(&self) -> SimTime {
        *self.inner.time.lock()
    }

    fn connect_world_update_begin(&self, callback: UpdateCallback) -> Connection {
        self.inner.events.connect(callback)
    }
}

/// A model whose pose and joints are plain stored values.
pub struct HeadlessModel {
    name: String,
    world: HeadlessWorld,
    pose: Mutex<Pose>,
    joints: Mutex<HashMap<String, Arc<HeadlessJoint>>>,
    pose_writes: AtomicU64,
    reject_pose_writes: AtomicBool,
}

impl std::fmt::Debug for HeadlessModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HeadlessModel")
            .field("name", &self.name)
            .field("pose", &*self.pose.lock())
            .field("joints", &self.joints.lock().len())
            .finish_non_exhaustive()
    }
}

impl HeadlessModel {
    /// Add a joint with all axes at zero, replacing any joint of that name.
    pub fn add_joint(&self, name: impl Into<String>, joint_type: JointType) -> Arc<HeadlessJoint> {
        let name = name.into();
        let joint = Arc::new(HeadlessJoint {
            name: name.clone(),
            joint_type,
            positions: Mutex::new(vec![0.0; joint_type.dof()]),
            writes: AtomicU64::new(0),
            reject_writes: AtomicBool::new(false),
        });
        self.joints.lock().insert(name, Arc::clone(&joint));
        joint
    }

    /// Concrete handle to a joint.
    #[must_use]
    pub fn headless_joint(&self, name: &str) -> Option<Arc<HeadlessJoint>> {
        self.joints.lock().get(name).cloned()
    }

    /// Number of accepted world pose writes.
    #[must_use]
    pub fn pose_writes(&self) -> u64 {
        self.pose_writes.load(Ordering::Relaxed)
    }

    /// Make subsequent pose writes fail (or succeed again).
    pub fn reject_pose_writes(&self, reject: bool) {
        self.reject_pose_writes.store(reject, Ordering::Relaxed);
    }

    /// The world this model lives in, as its concrete type.
    #[must_use]
    pub fn headless_world(&self) -> &HeadlessWorld {
        &self.world
    }
}

impl Model for HeadlessModel {
    fn name(&self) -> &str {
        &self.name
    }

    fn joint(&self, name: &str) -> Option<Arc<dyn Joint>> {
        self.headless_joint(name)
            .map(|joint| joint as Arc<dyn Joint>)
    }

    fn world_pose(&self) -> Pose {
        *self.pose.lock()
    }

    fn set_world_pose(&self, pose: Pose) -> sim_types::Result<()> {
        let target = || format!("model {} pose", self.name);
        if self.reject_pose_writes.load(Ordering::Relaxed) {
            return Err(SimError::write_rejected(target(), "pose writes disabled"));
        }
        if !pose.is_finite() {
            return Err(SimError::non_finite(target()));
        }
        *self.pose.lock() = pose;
        self.pose_writes.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn world(&self) -> Arc<dyn World> {
        Arc::new(self.world.clone())
    }
}

/// A joint whose axis positions are plain stored values.
#[derive(Debug)]
pub struct HeadlessJoint {
    name: String,
    joint_type: JointType,
    positions: Mutex<Vec<f64>>,
    writes: AtomicU64,
    reject_writes: AtomicBool,
}

impl HeadlessJoint {
    /// Number of accepted position writes.
    #[must_use]
    pub fn writes(&self) -> u64 {
        self.writes.load(Ordering::Relaxed)
    }

    /// Make subsequent position writes fail (or succeed again).
    pub fn reject_writes(&self, reject: bool) {
        self.reject_writes.store(reject, Ordering::Relaxed);
    }
}

impl Joint for HeadlessJoint {
    fn name(&self) -> &str {
        &self.name
    }

    fn joint_type(&self) -> JointType {
        self.joint_type
    }

    fn set_position(&self, axis: usize, position: f64) -> sim_types::Result<()> {
        if self.reject_writes.load(Ordering::Relaxed) {
            return Err(SimError::write_rejected(
                format!("joint {}", self.name),
                "joint writes disabled",
            ));
        }
        if !position.is_finite() {
            return Err(SimError::non_finite(format!("joint {}", self.name)));
        }
        let mut positions = self.positions.lock();
        let dof = positions.len();
        let slot = positions.get_mut(axis).ok_or_else(|| SimError::InvalidAxis {
            joint: self.name.clone(),
            axis,
            dof,
        })?;
        *slot = position;
        self.writes.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn position(&self, axis: usize) -> Option<f64> {
        self.positions.lock().get(axis).copied()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use sim_types::Point3;

    const MS: Duration = Duration::from_millis(1);

    #[test]
    fn test_step_advances_then_fires() {
        let world = HeadlessWorld::new("w");
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let _conn = world.connect_world_update_begin(UpdateCallback::new(move |info| {
            sink.lock().push(info.sim_time);
        }));

        world.step(MS);
        world.step(MS);
        world.step(Duration::ZERO);

        assert_eq!(
            *seen.lock(),
            vec![
                SimTime::from_nanos(1_000_000),
                SimTime::from_nanos(2_000_000),
                SimTime::from_nanos(2_000_000),
            ]
        );
        assert_eq!(world.iterations(), 3);
    }

    #[test]
    fn test_step_n_and_rewind() {
        let world = HeadlessWorld::new("w");
        assert_eq!(world.step_n(250, MS), SimTime::from_secs_f64(0.25));

        world.set_sim_time(SimTime::from_secs_f64(0.1));
        assert_relative_eq!(world.sim_time().as_secs_f64(), 0.1);
        assert_eq!(world.iterations(), 250);
    }

    #[test]
    fn test_joint_writes() {
        let world = HeadlessWorld::new("w");
        let model = world.spawn_model("m", Pose::identity());
        model.add_joint("hinge", JointType::Revolute);

        let joint = model.joint("hinge").unwrap();
        assert_eq!(joint.joint_type(), JointType::Revolute);
        joint.set_position(0, 0.3).unwrap();
        assert_eq!(joint.position(0), Some(0.3));
        assert_eq!(joint.position(1), None);

        let err = joint.set_position(1, 0.3).unwrap_err();
        assert!(matches!(err, SimError::InvalidAxis { axis: 1, dof: 1, .. }));
        assert!(joint.set_position(0, f64::NAN).unwrap_err().is_transient());

        let concrete = model.headless_joint("hinge").unwrap();
        assert_eq!(concrete.writes(), 1);
        concrete.reject_writes(true);
        assert!(joint.set_position(0, 0.1).is_err());
        assert_eq!(joint.position(0), Some(0.3));

        assert!(model.joint("missing").is_none());
    }

    #[test]
    fn test_pose_writes() {
        let world = HeadlessWorld::new("w");
        let model = world.spawn_model("m", Pose::from_position(Point3::new(1.0, 2.0, 3.0)));

        let pose = model.world_pose().with_z(0.5);
        model.set_world_pose(pose).unwrap();
        assert_eq!(model.world_pose().position, Point3::new(1.0, 2.0, 0.5));
        assert_eq!(model.pose_writes(), 1);

        assert!(model.set_world_pose(pose.with_z(f64::INFINITY)).is_err());
        model.reject_pose_writes(true);
        assert!(model.set_world_pose(pose.with_z(0.0)).is_err());
        assert_eq!(model.pose_writes(), 1);
        assert_eq!(model.world_pose().position.z, 0.5);
    }

    #[test]
    fn test_model_world_shares_clock() {
        let world = HeadlessWorld::new("w");
        let model = world.spawn_model("m", Pose::identity());
        world.step(MS);
        assert_eq!(model.world().sim_time(), SimTime::from_nanos(1_000_000));
        assert_eq!(model.world().name(), "w");
        assert_eq!(model.headless_world().iterations(), 1);
    }
}
