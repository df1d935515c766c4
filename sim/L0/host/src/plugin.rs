//! Model plugin interface and per-model plugin lifecycle.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, error, info};

use crate::descriptor::PluginElement;
use crate::event::{Connection, UpdateCallback, UpdateInfo};
use crate::model::Model;

/// A plugin attached to one model.
///
/// The host calls [`load`](Self::load) once. If it succeeds the host calls
/// [`on_update`](Self::on_update) at the beginning of every world step until
/// the plugin is unloaded.
pub trait ModelPlugin: Send + 'static {
    /// Load failure.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Bind to `model` using the configuration in `element`.
    ///
    /// # Errors
    ///
    /// A failed load leaves the plugin inert; it never receives updates.
    fn load(&mut self, model: Arc<dyn Model>, element: &PluginElement) -> Result<(), Self::Error>;

    /// Called at the beginning of every world step.
    fn on_update(&mut self, info: &UpdateInfo);
}

/// A loaded (or inert) plugin instance owned by the host.
///
/// The world's update slot holds only a weak reference to the plugin, so
/// dropping the instance is a complete teardown: the update connection is
/// released and no further ticks reach the plugin.
#[derive(Debug)]
pub struct PluginInstance<P> {
    name: String,
    model_name: String,
    plugin: Arc<Mutex<P>>,
    connection: Option<Connection>,
    load_error: Option<String>,
}

impl<P: ModelPlugin> PluginInstance<P> {
    /// Load `plugin` onto `model`.
    ///
    /// Load failures are reported once through `tracing::error!` and leave the
    /// instance inert; they never propagate to the host.
    pub fn load(mut plugin: P, model: Arc<dyn Model>, element: &PluginElement) -> Self {
        let name = element.name().to_string();
        let model_name = model.name().to_string();
        let loaded = plugin.load(Arc::clone(&model), element);
        let plugin = Arc::new(Mutex::new(plugin));

        let (connection, load_error) = match loaded {
            Ok(()) => {
                let weak = Arc::downgrade(&plugin);
                let connection = model.world().connect_world_update_begin(UpdateCallback::new(
                    move |info| {
                        if let Some(plugin) = weak.upgrade() {
                            plugin.lock().on_update(info);
                        }
                    },
                ));
                info!(plugin = %name, model = %model_name, "plugin loaded");
                (Some(connection), None)
            }
            Err(err) => {
                error!(
                    plugin = %name,
                    model = %model_name,
                    error = %err,
                    "plugin failed to load and stays inert"
                );
                (None, Some(err.to_string()))
            }
        };

        Self {
            name,
            model_name,
            plugin,
            connection,
            load_error,
        }
    }

    /// Plugin instance name from the descriptor.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name of the model the plugin is attached to.
    #[must_use]
    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    /// Returns true if the plugin loaded and still receives updates.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.connection.as_ref().is_some_and(Connection::is_connected)
    }

    /// The load error message, if loading failed.
    #[must_use]
    pub fn load_error(&self) -> Option<&str> {
        self.load_error.as_deref()
    }

    /// Run `f` with exclusive access to the plugin.
    ///
    /// This serializes with the update callback.
    pub fn with<R>(&self, f: impl FnOnce(&mut P) -> R) -> R {
        f(&mut self.plugin.lock())
    }

    /// Tear the plugin down.
    pub fn unload(self) {}
}

impl<P> Drop for PluginInstance<P> {
    fn drop(&mut self) {
        if self.connection.take().is_some() {
            debug!(plugin = %self.name, model = %self.model_name, "plugin unloaded");
        }
    }
}
