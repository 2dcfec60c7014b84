//! Plugin registry: ordered catalog of generator plugins.
//!
//! Built once at startup and read-only afterwards, so lookups need no
//! locking. Order is significant: the first plugin whose predicate matches
//! owns the directive.

use crate::directive::Directive;
use crate::error::RegistryError;
use crate::plugin::counterfeiter::CounterfeiterPlugin;
use crate::plugin::mockgen::MockgenPlugin;
use crate::plugin::moq::MoqPlugin;
use crate::plugin::protoc::ProtocPlugin;
use crate::plugin::stringer::StringerPlugin;
use crate::plugin::Plugin;
use std::sync::Arc;
use tracing::{debug, warn};

/// Built-in plugins in registration order.
pub fn builtin_plugins() -> Vec<Arc<dyn Plugin>> {
    vec![
        Arc::new(CounterfeiterPlugin::new()),
        Arc::new(StringerPlugin::new()),
        Arc::new(ProtocPlugin::new()),
        Arc::new(MockgenPlugin::new()),
        Arc::new(MoqPlugin::new()),
    ]
}

#[derive(Default)]
pub struct Registry {
    plugins: Vec<Arc<dyn Plugin>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry of the built-ins minus the `disabled` names.
    ///
    /// Naming a plugin that does not exist is an error so typos in the
    /// configuration are not silently ignored.
    pub fn with_builtins(disabled: &[String]) -> Result<Self, RegistryError> {
        let builtins = builtin_plugins();
        if let Some(unknown) = disabled
            .iter()
            .find(|name| !builtins.iter().any(|p| p.name() == name.as_str()))
        {
            return Err(RegistryError::UnknownPlugin(unknown.clone()));
        }

        let mut registry = Self::new();
        for plugin in builtins {
            if disabled.iter().any(|name| name == plugin.name()) {
                debug!(plugin = plugin.name(), "Plugin disabled by configuration");
                continue;
            }
            registry.register(plugin)?;
        }
        Ok(registry)
    }

    /// Append a plugin. Names must be unique.
    pub fn register(&mut self, plugin: Arc<dyn Plugin>) -> Result<(), RegistryError> {
        if self.get(plugin.name()).is_some() {
            return Err(RegistryError::Duplicate(plugin.name().to_string()));
        }
        self.plugins.push(plugin);
        Ok(())
    }

    /// Owning plugin of a directive, without ambiguity diagnostics.
    pub fn owner(&self, directive: &Directive) -> Option<&Arc<dyn Plugin>> {
        self.plugins.iter().find(|p| p.matches(directive))
    }

    /// First registered plugin matching the directive.
    pub fn lookup(&self, directive: &Directive) -> Option<Arc<dyn Plugin>> {
        let mut matching = self.plugins.iter().filter(|p| p.matches(directive));
        let first = matching.next()?;
        let shadowed: Vec<&str> = matching.map(|p| p.name()).collect();
        if !shadowed.is_empty() {
            warn!(
                directive = %directive,
                plugin = first.name(),
                shadowed = ?shadowed,
                "Directive matches several plugins; using the first registered"
            );
        }
        Some(Arc::clone(first))
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Plugin>> {
        self.plugins.iter().find(|p| p.name() == name)
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.plugins.iter().map(|p| p.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }
}
