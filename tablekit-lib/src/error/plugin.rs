//! Plugin lifecycle error types

/// Errors reported per plugin name by `attach`.
///
/// These never abort the rest of an attach batch.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PluginError {
    /// No factory is registered under this name.
    #[error("Plugin '{name}' not found")]
    NotFound { name: String },

    /// The options object didn't match the plugin's option schema.
    #[error("Invalid options for plugin '{plugin}': {message}")]
    ConfigValidation { plugin: String, message: String },

    /// The plugin rejected initialization against the current state.
    #[error("Plugin '{plugin}' failed to initialize: {message}")]
    Init { plugin: String, message: String },
}

impl PluginError {
    /// Creates a new not-found error.
    pub fn not_found(name: impl Into<String>) -> Self {
        Self::NotFound { name: name.into() }
    }

    /// Creates a new config validation error.
    pub fn config(plugin: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            plugin: plugin.into(),
            message: message.into(),
        }
    }

    /// Creates a new init error.
    pub fn init(plugin: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Init {
            plugin: plugin.into(),
            message: message.into(),
        }
    }

    /// Returns the plugin name this error refers to.
    pub fn plugin_name(&self) -> &str {
        match self {
            Self::NotFound { name } => name,
            Self::ConfigValidation { plugin, .. } | Self::Init { plugin, .. } => plugin,
        }
    }
}
