//! Plugin factory registry

use std::collections::HashMap;

use super::Plugin;
use super::builtin;

/// Creates a fresh plugin instance.
pub type PluginFactory = Box<dyn Fn() -> Box<dyn Plugin> + Send + Sync>;

/// Maps plugin names to factories.
///
/// Each grid owns its own registry; registering a factory on one grid never
/// affects another.
pub struct PluginRegistry {
    factories: HashMap<String, PluginFactory>,
}

impl PluginRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Creates a registry with every built-in plugin registered.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(builtin::SORTING, || Box::new(builtin::SortingPlugin::default()));
        registry.register(builtin::FILTERING, || Box::new(builtin::FilteringPlugin::default()));
        registry.register(builtin::PAGINATION, || Box::new(builtin::PaginationPlugin::default()));
        registry.register(builtin::SELECTION, || Box::new(builtin::SelectionPlugin::default()));
        registry.register(builtin::COLUMN_RESIZING, || {
            Box::new(builtin::ColumnResizePlugin::default())
        });
        registry.register(builtin::EXPORT, || Box::new(builtin::ExportPlugin::default()));
        registry.register(builtin::SQL_QUERY, || Box::new(builtin::SqlQueryPlugin::default()));
        registry
    }

    /// Registers a factory, replacing any existing one under the same name.
    pub fn register<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn() -> Box<dyn Plugin> + Send + Sync + 'static,
    {
        self.factories.insert(name.into(), Box::new(factory));
    }

    /// Removes a factory. Returns `true` if one was registered.
    pub fn unregister(&mut self, name: &str) -> bool {
        self.factories.remove(name).is_some()
    }

    /// Creates a new instance of the named plugin.
    pub fn create(&self, name: &str) -> Option<Box<dyn Plugin>> {
        self.factories.get(name).map(|factory| factory())
    }

    /// Checks if a factory is registered under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Returns the registered names in sorted order.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl Default for PluginRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl std::fmt::Debug for PluginRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginRegistry")
            .field("names", &self.names())
            .finish()
    }
}
