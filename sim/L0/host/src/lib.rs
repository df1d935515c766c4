//! Host seams for simulator model plugins.
//!
//! A model plugin never talks to a physics engine directly. It sees the
//! simulator through a handful of traits and events:
//!
//! - [`World`], [`Model`], [`Joint`] - Handles the plugin reads and writes
//! - [`UpdateInfo`], [`UpdateCallback`], [`Connection`] - Per-step update event
//! - [`PluginElement`] - The `<plugin>` descriptor from the model file
//! - [`ModelPlugin`], [`PluginInstance`] - Plugin interface and lifecycle
//!
//! [`headless`] provides a kinematic reference host implementing all of the
//! above, used by tests and the demo binaries.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use std::time::Duration;
//! use sim_host::{HeadlessWorld, Model, ModelPlugin, PluginElement, PluginInstance, UpdateInfo};
//! use sim_types::Pose;
//!
//! #[derive(Default)]
//! struct Ticker(u64);
//!
//! impl ModelPlugin for Ticker {
//!     type Error = std::convert::Infallible;
//!
//!     fn load(&mut self, _: Arc<dyn Model>, _: &PluginElement) -> Result<(), Self::Error> {
//!         Ok(())
//!     }
//!
//!     fn on_update(&mut self, _: &UpdateInfo) {
//!         self.0 += 1;
//!     }
//! }
//!
//! let world = HeadlessWorld::new("default");
//! let model = world.spawn_model("box", Pose::identity());
//! let plugin = PluginInstance::load(Ticker::default(), model, &PluginElement::new("ticker", ""));
//!
//! world.step_n(10, Duration::from_millis(1));
//! assert_eq!(plugin.with(|t| t.0), 10);
//! ```
//!
//! # Layer 0 Crate
//!
//! This is a Layer 0 crate with **zero Bevy dependencies**.

#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![warn(missing_docs)]
#![warn(clippy::all)]

mod descriptor;
mod error;
mod event;
pub mod headless;
mod model;
mod plugin;

pub use descriptor::PluginElement;
pub use error::{DescriptorError, Result};
pub use event::{Callback, Connection, EventHub, UpdateCallback, UpdateInfo};
pub use headless::{HeadlessJoint, HeadlessModel, HeadlessWorld};
pub use model::{Joint, Model, World};
pub use plugin::{ModelPlugin, PluginInstance};
