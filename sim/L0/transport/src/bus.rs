//! Topic registry, publishers and subscribers.

use std::cell::Cell;
use std::fmt;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use hashbrown::HashMap;
use parking_lot::{Condvar, Mutex, ReentrantMutex};
use tracing::{debug, warn};

use crate::error::{Result, TransportError};
use crate::message::{Message, Payload, PayloadKind};
use crate::queue::MessageQueue;
use crate::spinner::Spinner;
use crate::topic::TopicName;

/// Type-erased subscription callback.
type Handler = Box<dyn Fn(Payload) + Send + Sync>;

#[derive(Default)]
pub(crate) struct BusInner {
    topics: Mutex<HashMap<TopicName, Vec<Arc<Subscription>>>>,
    next_id: AtomicU64,
    /// Bumped on every successful enqueue; spinners wait on it.
    pub(crate) generation: Mutex<u64>,
    pub(crate) wake: Condvar,
}

struct Subscription {
    id: u64,
    topic: TopicName,
    kind: PayloadKind,
    queue: Mutex<MessageQueue>,
    handler: Handler,
    /// Cleared on unsubscribe. Held for the duration of each callback.
    alive: ReentrantMutex<Cell<bool>>,
    delivered: AtomicU64,
    rejected: AtomicU64,
    overflow_reported: AtomicBool,
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("topic", &self.topic)
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

/// Counters for one subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SubscriptionStats {
    /// Messages handed to the callback.
    pub delivered: u64,
    /// Messages dropped because the queue overflowed.
    pub dropped: u64,
    /// Messages discarded because their payload kind did not match.
    pub rejected: u64,
    /// Messages currently waiting in the queue.
    pub pending: usize,
}

/// An in-process topic bus.
///
/// Cloning a `Bus` yields another handle to the same registry.
#[derive(Clone, Default)]
pub struct Bus {
    inner: Arc<BusInner>,
}

impl fmt::Debug for Bus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bus")
            .field("topics", &self.inner.topics.lock().len())
            .finish()
    }
}

impl Bus {
    /// Create an empty bus.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn inner(&self) -> &Arc<BusInner> {
        &self.inner
    }

    /// Subscribe `callback` to `topic` with a queue of `depth` messages.
    ///
    /// The callback runs on whichever thread spins the bus. The returned
    /// [`Subscriber`] unsubscribes when dropped.
    ///
    /// # Errors
    ///
    /// Returns an error if the topic name is invalid, `depth` is zero, or the
    /// topic already carries another payload kind.
    pub fn subscribe<M, F>(&self, topic: &str, depth: usize, callback: F) -> Result<Subscriber>
    where
        M: Message,
        F: Fn(M) + Send + Sync + 'static,
    {
        if depth == 0 {
            return Err(TransportError::ZeroDepth);
        }
        let topic = TopicName::new(topic)?;

        let mut topics = self.inner.topics.lock();
        let subscriptions = topics.entry(topic.clone()).or_default();
        if let Some(existing) = subscriptions.first() {
            check_kind(&topic, existing.kind, M::KIND)?;
        }

        let handler: Handler = Box::new(move |payload| {
            if let Some(message) = M::from_payload(&payload) {
                callback(message);
            }
        });
        let subscription = Arc::new(Subscription {
            id: self.inner.next_id.fetch_add(1, Ordering::Relaxed),
            topic: topic.clone(),
            kind: M::KIND,
            queue: Mutex::new(MessageQueue::new(depth)),
            handler,
            alive: ReentrantMutex::new(Cell::new(true)),
            delivered: AtomicU64::new(0),
            rejected: AtomicU64::new(0),
            overflow_reported: AtomicBool::new(false),
        });
        subscriptions.push(Arc::clone(&subscription));
        drop(topics);

        debug!(topic = %topic, kind = %M::KIND, depth, "subscribed");
        Ok(Subscriber {
            bus: Arc::downgrade(&self.inner),
            subscription,
        })
    }

    /// Create a typed publisher for `topic`.
    ///
    /// # Errors
    ///
    /// Returns an error if the topic name is invalid or existing subscribers
    /// expect another payload kind.
    pub fn advertise<M: Message>(&self, topic: &str) -> Result<Publisher<M>> {
        let topic = TopicName::new(topic)?;
        if let Some(existing) = self
            .inner
            .topics
            .lock()
            .get(&topic)
            .and_then(|subs| subs.first())
        {
            check_kind(&topic, existing.kind, M::KIND)?;
        }
        Ok(Publisher {
            bus: self.clone(),
            topic,
            _message: PhantomData,
        })
    }

    /// Publish an untyped payload on `topic`.
    ///
    /// Returns the number of subscriptions that queued the message.
    ///
    /// # Errors
    ///
    /// Returns an error if the topic name is invalid.
    pub fn publish(&self, topic: &str, payload: Payload) -> Result<usize> {
        let topic = TopicName::new(topic)?;
        Ok(self.publish_to(&topic, payload))
    }

    /// Publish an untyped payload on an already validated topic.
    ///
    /// Subscriptions expecting another payload kind discard the message
    /// here; it never reaches their callback.
    pub fn publish_to(&self, topic: &TopicName, payload: Payload) -> usize {
        let subscriptions = self
            .inner
            .topics
            .lock()
            .get(topic)
            .cloned()
            .unwrap_or_default();

        let mut queued = 0;
        for sub in &subscriptions {
            if payload.kind() != sub.kind {
                sub.rejected.fetch_add(1, Ordering::Relaxed);
                warn!(
                    topic = %topic,
                    expected = %sub.kind,
                    actual = %payload.kind(),
                    "discarding mistyped message"
                );
                continue;
            }

            let overflowed = sub.queue.lock().push(payload);
            if overflowed {
                if sub.overflow_reported.swap(true, Ordering::Relaxed) {
                    debug!(topic = %topic, "dropped oldest queued message");
                } else {
                    warn!(
                        topic = %topic,
                        "subscription queue full, dropping oldest messages"
                    );
                }
            }
            queued += 1;
        }

        if queued > 0 {
            self.notify();
        }
        queued
    }

    /// Run every queued callback once on the calling thread.
    ///
    /// A subscription dropped while its messages are being dispatched
    /// receives none of the rest. Returns the number of messages delivered.
    pub fn spin_once(&self) -> usize {
        let subscriptions: Vec<Arc<Subscription>> = self
            .inner
            .topics
            .lock()
            .values()
            .flatten()
            .cloned()
            .collect();

        let mut delivered = 0;
        for sub in subscriptions {
            // Release the queue lock before running callbacks
            let pending = sub.queue.lock().take();
            for payload in pending {
                let alive = sub.alive.lock();
                if !alive.get() {
                    break;
                }
                (sub.handler)(payload);
                drop(alive);
                sub.delivered.fetch_add(1, Ordering::Relaxed);
                delivered += 1;
            }
        }
        delivered
    }

    /// Start a background thread that spins the bus whenever messages arrive.
    ///
    /// # Errors
    ///
    /// Returns an error if the thread cannot be spawned.
    pub fn spawn_spinner(&self) -> Result<Spinner> {
        Spinner::spawn(self.clone())
    }

    /// Number of live subscriptions on `topic`.
    #[must_use]
    pub fn subscriber_count(&self, topic: &str) -> usize {
        TopicName::new(topic).map_or(0, |topic| {
            self.inner.topics.lock().get(&topic).map_or(0, Vec::len)
        })
    }

    /// All topics with at least one subscription, sorted.
    #[must_use]
    pub fn topics(&self) -> Vec<TopicName> {
        let mut names: Vec<TopicName> = self.inner.topics.lock().keys().cloned().collect();
        names.sort();
        names
    }

    pub(crate) fn notify(&self) {
        let mut generation = self.inner.generation.lock();
        *generation = generation.wrapping_add(1);
        self.inner.wake.notify_all();
    }
}

fn check_kind(topic: &TopicName, existing: PayloadKind, requested: PayloadKind) -> Result<()> {
    if existing == requested {
        Ok(())
    } else {
        Err(TransportError::KindMismatch {
            topic: topic.to_string(),
            existing,
            requested,
        })
    }
}

/// Handle to a live subscription. Dropping it unsubscribes.
///
/// Dropping waits for a callback of this subscription that is running on
/// another thread; once the drop returns, the callback is never called again.
#[derive(Debug)]
pub struct Subscriber {
    bus: Weak<BusInner>,
    subscription: Arc<Subscription>,
}

impl Subscriber {
    /// The topic this subscription listens on.
    #[must_use]
    pub fn topic(&self) -> &TopicName {
        &self.subscription.topic
    }

    /// Current delivery counters.
    #[must_use]
    pub fn stats(&self) -> SubscriptionStats {
        let queue = self.subscription.queue.lock();
        SubscriptionStats {
            delivered: self.subscription.delivered.load(Ordering::Relaxed),
            dropped: queue.dropped(),
            rejected: self.subscription.rejected.load(Ordering::Relaxed),
            pending: queue.len(),
        }
    }
}

impl Drop for Subscriber {
    fn drop(&mut self) {
        self.subscription.alive.lock().set(false);
        // Queued messages die with the subscription
        drop(self.subscription.queue.lock().take());

        let Some(inner) = self.bus.upgrade() else {
            return;
        };
        let mut topics = inner.topics.lock();
        let topic = &self.subscription.topic;
        if let Some(subscriptions) = topics.get_mut(topic) {
            subscriptions.retain(|sub| sub.id != self.subscription.id);
            if subscriptions.is_empty() {
                topics.remove(topic);
            }
        }
        debug!(topic = %topic, "unsubscribed");
    }
}

/// Typed publisher bound to one topic.
pub struct Publisher<M> {
    bus: Bus,
    topic: TopicName,
    _message: PhantomData<fn(M)>,
}

impl<M> fmt::Debug for Publisher<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Publisher")
            .field("topic", &self.topic)
            .finish_non_exhaustive()
    }
}

impl<M> Clone for Publisher<M> {
    fn clone(&self) -> Self {
        Self {
            bus: self.bus.clone(),
            topic: self.topic.clone(),
            _message: PhantomData,
        }
    }
}

impl<M: Message> Publisher<M> {
    /// The topic this publisher writes to.
    #[must_use]
    pub fn topic(&self) -> &TopicName {
        &self.topic
    }

    /// Publish a message. Returns the number of subscriptions that queued it.
    pub fn publish(&self, message: M) -> usize {
        self.bus.publish_to(&self.topic, message.into_payload())
    }
}
