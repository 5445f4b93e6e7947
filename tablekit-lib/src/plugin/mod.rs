//! Feature plugins composed over the grid state
//!
//! A plugin is a named feature module (sorting, pagination, SQL query, …)
//! attached to a [`Grid`](crate::Grid). Plugins never mutate state directly:
//! they read the state through a [`PluginContext`] and request
//! [`StatePatch`]es, which the grid commits after the fan-out finishes.

pub mod builtin;
mod host;
mod registry;

pub use host::*;
pub use registry::*;

use std::any::Any;

use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::error::PluginError;
use crate::pipeline::GridView;
use crate::state::GridState;
use crate::state::StatePatch;

/// A feature module with an explicit lifecycle.
///
/// `init` runs once per attach with the options given to `attach`.
/// `on_state_change` runs after every committed change, in attach order.
/// `destroy` runs exactly once before the instance is dropped, including
/// after a failed `init`, so it must tolerate partially initialized state.
pub trait Plugin: Any + Send {
    /// The name the plugin is registered under.
    fn name(&self) -> &str;

    /// Initializes the plugin from its options.
    fn init(
        &mut self,
        cx: &mut PluginContext<'_>,
        options: &serde_json::Value,
    ) -> Result<(), PluginError>;

    /// Tears the plugin down.
    fn destroy(&mut self) {}

    /// Reacts to a committed state change.
    fn on_state_change(&mut self, _cx: &mut PluginContext<'_>) {}

    /// Upcast for typed access through [`Grid::plugin`](crate::Grid::plugin).
    fn as_any(&self) -> &dyn Any;

    /// Mutable upcast for typed access.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Read access to the grid plus a queue for requested patches.
pub struct PluginContext<'a> {
    state: &'a GridState,
    view: &'a GridView,
    patches: Vec<StatePatch>,
}

impl<'a> PluginContext<'a> {
    /// Creates a context over a committed state.
    pub fn new(state: &'a GridState, view: &'a GridView) -> Self {
        Self {
            state,
            view,
            patches: Vec::new(),
        }
    }

    /// Returns the committed state.
    pub fn state(&self) -> &'a GridState {
        self.state
    }

    /// Returns the committed view.
    pub fn view(&self) -> &'a GridView {
        self.view
    }

    /// Queues a patch to commit once the current fan-out completes.
    pub fn request(&mut self, patch: StatePatch) {
        self.patches.push(patch);
    }

    /// Consumes the context, returning the queued patches.
    pub fn into_patches(self) -> Vec<StatePatch> {
        self.patches
    }
}

/// Deserializes a plugin's options, treating `null` as all defaults.
pub fn parse_options<T>(plugin: &str, options: &serde_json::Value) -> Result<T, PluginError>
where
    T: DeserializeOwned + Default,
{
    if options.is_null() {
        return Ok(T::default());
    }
    serde_json::from_value(options.clone()).map_err(|e| PluginError::config(plugin, e.to_string()))
}

/// One entry of an attach list: a bare name or a name with options.
///
/// Deserializes from either form:
///
/// ```
/// use tablekit_lib::plugin::PluginSpec;
///
/// let specs: Vec<PluginSpec> = serde_json::from_str(
///     r#"["sorting", {"name": "pagination", "options": {"pageSize": 25}}]"#,
/// ).unwrap();
/// assert_eq!(specs[1].name, "pagination");
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "PluginSpecRepr")]
pub struct PluginSpec {
    /// Registered plugin name.
    pub name: String,
    /// Options object; `null` means defaults.
    pub options: serde_json::Value,
}

impl PluginSpec {
    /// Creates a spec with default options.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            options: serde_json::Value::Null,
        }
    }

    /// Creates a spec with an options object.
    pub fn with_options(name: impl Into<String>, options: serde_json::Value) -> Self {
        Self {
            name: name.into(),
            options,
        }
    }
}

impl From<&str> for PluginSpec {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for PluginSpec {
    fn from(name: String) -> Self {
        Self::new(name)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PluginSpecRepr {
    Name(String),
    Full {
        name: String,
        #[serde(default)]
        options: serde_json::Value,
    },
}

impl From<PluginSpecRepr> for PluginSpec {
    fn from(repr: PluginSpecRepr) -> Self {
        match repr {
            PluginSpecRepr::Name(name) => Self::new(name),
            PluginSpecRepr::Full { name, options } => Self::with_options(name, options),
        }
    }
}

/// Outcome of an attach batch.
///
/// Attach is best-effort: each name succeeds or fails on its own.
#[derive(Debug, Default)]
pub struct AttachReport {
    /// Names attached successfully, in attach order.
    pub attached: Vec<String>,
    /// Names that failed, with the reason.
    pub failed: Vec<PluginError>,
}

impl AttachReport {
    /// Returns `true` if every requested plugin attached.
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}
