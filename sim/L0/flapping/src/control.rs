//! Control topics: parameter updates arriving over the bus.

use std::sync::Arc;

use sim_transport::{Bus, Payload, Subscriber, SubscriptionStats, TopicName};
use tracing::debug;

use crate::config::ControlTopics;
use crate::params::FlapParams;

/// One parameter update, as carried by a control topic.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ControlUpdate {
    /// New flap frequency in Hz.
    FlapFrequency(f32),
    /// New flap amplitude in radians.
    FlapAmplitude(f32),
    /// Enable or disable oscillation.
    Oscillation(bool),
    /// New bounce amplitude in meters.
    ZAmplitude(f32),
    /// New bounce frequency in Hz.
    ZFrequency(f32),
}

impl ControlUpdate {
    /// Store the update. No validation: the codec already guaranteed the
    /// payload kind, and the value is taken as is.
    pub fn apply(self, params: &FlapParams) {
        match self {
            Self::FlapFrequency(hz) => params.set_frequency(f64::from(hz)),
            Self::FlapAmplitude(rad) => params.set_amplitude(f64::from(rad)),
            Self::Oscillation(enabled) => params.set_oscillating(enabled),
            Self::ZAmplitude(m) => params.set_z_amplitude(f64::from(m)),
            Self::ZFrequency(hz) => params.set_z_frequency(f64::from(hz)),
        }
    }

    /// The topic this update travels on.
    #[must_use]
    pub fn topic<'a>(&self, topics: &'a ControlTopics) -> &'a str {
        match self {
            Self::FlapFrequency(_) => &topics.flap_frequency,
            Self::FlapAmplitude(_) => &topics.flap_amplitude,
            Self::Oscillation(_) => &topics.flap_oscillation,
            Self::ZAmplitude(_) => &topics.z_amplitude,
            Self::ZFrequency(_) => &topics.z_frequency,
        }
    }

    /// The wire payload.
    #[must_use]
    pub fn payload(&self) -> Payload {
        match *self {
            Self::FlapFrequency(v)
            | Self::FlapAmplitude(v)
            | Self::ZAmplitude(v)
            | Self::ZFrequency(v) => Payload::Float32(v),
            Self::Oscillation(enabled) => Payload::Bool(enabled),
        }
    }

    /// Publish on the matching topic. Returns the number of subscriptions
    /// that queued it.
    ///
    /// # Errors
    ///
    /// Returns an error if the topic name is invalid.
    pub fn publish(&self, bus: &Bus, topics: &ControlTopics) -> sim_transport::Result<usize> {
        bus.publish(self.topic(topics), self.payload())
    }
}

/// Live subscriptions to the five control topics.
///
/// Each handler performs one atomic store into the shared [`FlapParams`].
/// Dropping the listener unsubscribes from every topic.
#[derive(Debug)]
pub struct ControlListener {
    subscribers: Vec<Subscriber>,
}

impl ControlListener {
    /// Subscribe to every topic in `topics` with queues of `depth`.
    ///
    /// # Errors
    ///
    /// Returns an error if any subscription fails; subscriptions made before
    /// the failure are released.
    pub fn bind(
        bus: &Bus,
        topics: &ControlTopics,
        depth: usize,
        params: &Arc<FlapParams>,
    ) -> sim_transport::Result<Self> {
        let float = |topic: &str, update: fn(f32) -> ControlUpdate| {
            let params = Arc::clone(params);
            bus.subscribe::<f32, _>(topic, depth, move |value| update(value).apply(&params))
        };

        let oscillation = {
            let params = Arc::clone(params);
            bus.subscribe::<bool, _>(&topics.flap_oscillation, depth, move |enabled| {
                ControlUpdate::Oscillation(enabled).apply(&params);
            })?
        };
        let subscribers = vec![
            float(&topics.flap_frequency, ControlUpdate::FlapFrequency)?,
            float(&topics.flap_amplitude, ControlUpdate::FlapAmplitude)?,
            oscillation,
            float(&topics.z_amplitude, ControlUpdate::ZAmplitude)?,
            float(&topics.z_frequency, ControlUpdate::ZFrequency)?,
        ];

        debug!(topics = ?topics.all(), depth, "control topics bound");
        Ok(Self { subscribers })
    }

    /// Delivery counters per topic.
    #[must_use]
    pub fn stats(&self) -> Vec<(TopicName, SubscriptionStats)> {
        self.subscribers
            .iter()
            .map(|sub| (sub.topic().clone(), sub.stats()))
            .collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use sim_transport::TransportError;

    fn bound() -> (Bus, Arc<FlapParams>, ControlListener) {
        let bus = Bus::new();
        let params = Arc::new(FlapParams::default());
        let listener = ControlListener::bind(&bus, &ControlTopics::default(), 10, &params).unwrap();
        (bus, params, listener)
    }

    #[test]
    fn test_every_topic_updates_its_field() {
        let (bus, params, _listener) = bound();
        let topics = ControlTopics::default();

        for update in [
            ControlUpdate::FlapFrequency(4.0),
            ControlUpdate::FlapAmplitude(-0.25),
            ControlUpdate::Oscillation(true),
            ControlUpdate::ZAmplitude(0.5),
            ControlUpdate::ZFrequency(0.75),
        ] {
            assert_eq!(update.publish(&bus, &topics).unwrap(), 1);
        }
        // Not applied until the bus is spun
        assert!(!params.is_oscillating());

        assert_eq!(bus.spin_once(), 5);
        let snap = params.snapshot();
        assert_eq!(snap.frequency, 4.0);
        assert_eq!(snap.amplitude, -0.25);
        assert_eq!(snap.z_amplitude, 0.5);
        assert_eq!(snap.z_frequency, 0.75);
        assert!(params.is_oscillating());
    }

    #[test]
    fn test_same_value_twice_is_idempotent() {
        let (bus, params, _listener) = bound();
        let topics = ControlTopics::default();
        let update = ControlUpdate::FlapAmplitude(0.3);

        update.publish(&bus, &topics).unwrap();
        bus.spin_once();
        let once = params.snapshot();

        update.publish(&bus, &topics).unwrap();
        bus.spin_once();
        assert_eq!(params.snapshot(), once);
    }

    #[test]
    fn test_mistyped_message_is_filtered() {
        let (bus, params, listener) = bound();
        bus.publish("/flap_amplitude", Payload::Bool(true)).unwrap();
        bus.publish("/flap_oscillation", Payload::Float32(1.0)).unwrap();
        bus.spin_once();

        assert_eq!(params.snapshot().amplitude, 0.5);
        assert!(!params.is_oscillating());
        let rejected: u64 = listener.stats().iter().map(|(_, s)| s.rejected).sum();
        assert_eq!(rejected, 2);
    }

    #[test]
    fn test_drop_unsubscribes() {
        let (bus, params, listener) = bound();
        assert_eq!(bus.topics().len(), 5);
        drop(listener);
        assert!(bus.topics().is_empty());

        let sent = ControlUpdate::FlapFrequency(9.0)
            .publish(&bus, &ControlTopics::default())
            .unwrap();
        assert_eq!(sent, 0);
        bus.spin_once();
        assert_eq!(params.snapshot().frequency, 2.0);
    }

    #[test]
    fn test_bind_fails_on_conflicting_topic_kind() {
        let bus = Bus::new();
        let _squatter = bus.subscribe::<bool, _>("/z_frequency", 10, |_| {}).unwrap();
        let params = Arc::new(FlapParams::default());

        let err = ControlListener::bind(&bus, &ControlTopics::default(), 10, &params).unwrap_err();
        assert!(matches!(err, TransportError::KindMismatch { .. }));
        // Earlier subscriptions were released
        assert_eq!(bus.topics().len(), 1);
    }

    #[test]
    fn test_payloads() {
        assert_eq!(ControlUpdate::ZFrequency(1.5).payload(), Payload::Float32(1.5));
        assert_eq!(ControlUpdate::Oscillation(false).payload(), Payload::Bool(false));
        let topics = ControlTopics::default();
        assert_eq!(ControlUpdate::ZAmplitude(0.0).topic(&topics), "/z_amplitude");
    }
}
