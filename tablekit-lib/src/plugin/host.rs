//! Attached plugin lifecycle

use log::debug;
use log::warn;
use uuid::Uuid;

use crate::error::PluginError;
use crate::pipeline::GridView;
use crate::state::GridState;
use crate::state::StatePatch;

use super::Plugin;
use super::PluginContext;
use super::PluginRegistry;
use super::PluginSpec;

/// Information about an attached plugin.
#[derive(Debug, Clone, PartialEq)]
pub struct AttachedInfo {
    /// Unique id of this instance.
    pub instance_id: Uuid,
    /// Registered name.
    pub name: String,
    /// Options the instance was initialized with.
    pub options: serde_json::Value,
}

struct AttachedPlugin {
    info: AttachedInfo,
    instance: Box<dyn Plugin>,
}

/// Holds attached plugin instances in attach order.
///
/// Attach order is notification order. Re-attaching a name replaces the
/// previous instance (destroyed first) and moves the name to the end.
#[derive(Default)]
pub struct PluginHost {
    attached: Vec<AttachedPlugin>,
}

impl PluginHost {
    /// Creates an empty host.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches one plugin, returning the patches its `init` requested.
    pub fn attach(
        &mut self,
        registry: &PluginRegistry,
        spec: PluginSpec,
        state: &GridState,
        view: &GridView,
    ) -> Result<Vec<StatePatch>, PluginError> {
        let Some(mut instance) = registry.create(&spec.name) else {
            warn!("attach: plugin '{}' not found", spec.name);
            return Err(PluginError::not_found(spec.name));
        };

        if self.detach_one(&spec.name) {
            debug!("attach: replacing existing '{}'", spec.name);
        }

        let mut cx = PluginContext::new(state, view);
        if let Err(e) = instance.init(&mut cx, &spec.options) {
            warn!("attach: '{}' failed to initialize: {}", spec.name, e);
            instance.destroy();
            return Err(e);
        }

        let info = AttachedInfo {
            instance_id: Uuid::new_v4(),
            name: spec.name,
            options: spec.options,
        };
        debug!("attach: '{}' ({})", info.name, info.instance_id);
        self.attached.push(AttachedPlugin { info, instance });
        Ok(cx.into_patches())
    }

    /// Destroys and removes a plugin. Returns `true` if it was attached.
    pub fn detach_one(&mut self, name: &str) -> bool {
        let Some(pos) = self.attached.iter().position(|p| p.info.name == name) else {
            return false;
        };
        let mut plugin = self.attached.remove(pos);
        plugin.instance.destroy();
        debug!("detach: '{}' ({})", plugin.info.name, plugin.info.instance_id);
        true
    }

    /// Destroys and removes every plugin, in attach order.
    pub fn detach_all(&mut self) -> Vec<String> {
        self.attached
            .drain(..)
            .map(|mut plugin| {
                plugin.instance.destroy();
                debug!("detach: '{}' ({})", plugin.info.name, plugin.info.instance_id);
                plugin.info.name
            })
            .collect()
    }

    /// Notifies every plugin of a committed change, in attach order.
    ///
    /// Returns the patches the plugins requested, in the same order.
    pub fn notify(&mut self, state: &GridState, view: &GridView) -> Vec<StatePatch> {
        let mut requested = Vec::new();
        for plugin in &mut self.attached {
            let mut cx = PluginContext::new(state, view);
            plugin.instance.on_state_change(&mut cx);
            requested.extend(cx.into_patches());
        }
        requested
    }

    /// Returns the attached plugin under `name`.
    pub fn get(&self, name: &str) -> Option<&dyn Plugin> {
        self.attached
            .iter()
            .find(|p| p.info.name == name)
            .map(|p| p.instance.as_ref())
    }

    /// Returns the attached plugin under `name`, mutably.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut (dyn Plugin + 'static)> {
        match self.attached.iter_mut().find(|p| p.info.name == name) {
            Some(p) => Some(p.instance.as_mut()),
            None => None,
        }
    }

    /// Returns the attached plugins in attach order.
    pub fn attached(&self) -> Vec<AttachedInfo> {
        self.attached.iter().map(|p| p.info.clone()).collect()
    }

    /// Returns the attached names in attach order.
    pub fn names(&self) -> Vec<&str> {
        self.attached.iter().map(|p| p.info.name.as_str()).collect()
    }

    /// Checks if a plugin is attached under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.attached.iter().any(|p| p.info.name == name)
    }

    /// Returns the number of attached plugins.
    pub fn len(&self) -> usize {
        self.attached.len()
    }

    /// Returns `true` if no plugin is attached.
    pub fn is_empty(&self) -> bool {
        self.attached.is_empty()
    }
}

impl Drop for PluginHost {
    fn drop(&mut self) {
        self.detach_all();
    }
}

impl std::fmt::Debug for PluginHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginHost")
            .field("attached", &self.names())
            .finish()
    }
}
