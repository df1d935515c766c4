//! In-process topic bus for runtime control of simulation plugins.
//!
//! Plugins that expose a control surface subscribe to named topics; tools and
//! operators publish small typed messages onto them. The bus mirrors the
//! semantics of a robotics middleware closely enough that a plugin written
//! against it behaves the same way under a networked transport:
//!
//! - [`Bus`] - Topic registry, publish entry point, manual spinning
//! - [`Subscriber`] - RAII subscription handle (drop to unsubscribe)
//! - [`Publisher`] - Typed publisher bound to one topic
//! - [`Spinner`] - Background thread that runs subscription callbacks
//! - [`Message`] - Codec between Rust values and wire [`Payload`]s
//!
//! # Delivery model
//!
//! Publishing never blocks. Each subscription has a bounded queue; when it
//! overflows the **oldest** queued message is dropped. Callbacks run on the
//! thread that spins the bus, never on the publisher's thread. Payloads whose
//! kind does not match the subscription are discarded at publish time and
//! never reach the callback.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicU32, Ordering};
//! use sim_transport::Bus;
//!
//! let bus = Bus::new();
//! let last = Arc::new(AtomicU32::new(0));
//!
//! let sink = Arc::clone(&last);
//! let _sub = bus
//!     .subscribe::<f32, _>("/flap_frequency", 10, move |hz| {
//!         sink.store(hz.to_bits(), Ordering::Release);
//!     })
//!     .unwrap();
//!
//! let publisher = bus.advertise::<f32>("/flap_frequency").unwrap();
//! publisher.publish(4.0);
//! bus.spin_once();
//!
//! assert_eq!(f32::from_bits(last.load(Ordering::Acquire)), 4.0);
//! ```
//!
//! # Layer 0 Crate
//!
//! This is a Layer 0 crate with **zero Bevy dependencies**.

#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![warn(missing_docs)]
#![warn(clippy::all)]

mod bus;
mod error;
mod message;
mod queue;
mod spinner;
mod topic;

pub use bus::{Bus, Publisher, Subscriber, SubscriptionStats};
pub use error::{Result, TransportError};
pub use message::{Message, Payload, PayloadKind};
pub use queue::MessageQueue;
pub use spinner::Spinner;
pub use topic::TopicName;

/// Queue depth used by control subscriptions unless configured otherwise.
pub const DEFAULT_QUEUE_DEPTH: usize = 10;
