// crates/kryon-runtime/src/handlers.rs
//! Two flat, per-runtime-instance registries (spec §4.5): event handlers
//! keyed by the callback name a `.krb` file references, and custom
//! component constructors keyed by component name. Scoped to a single
//! [`crate::app::KryonApp`] instance, not a process-global, so multiple
//! apps (and tests) never share registration state.

use kryon_layout::LayoutResult;
use kryon_render::{RenderIndex, ResolvedTree};
use std::collections::{HashMap, HashSet};

pub type EventHandlerFn = Box<dyn FnMut() + Send>;
/// Runs against the element named by `_componentName`, after Pass 2 (spec
/// §4.3: "the only extensibility point in layout"). Takes the element's
/// index plus mutable access to the whole resolved tree and the computed
/// layout, since an adjuster may need to change a child's visibility or
/// geometry, not just its own.
pub type LayoutAdjuster = Box<dyn Fn(RenderIndex, &mut ResolvedTree, &mut LayoutResult) + Send + Sync>;

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("custom component '{0}' is already registered")]
    AlreadyRegistered(String),
}

/// Maps a callback name to a handler closure. A `.krb` file referencing a
/// name with no registered handler is not fatal: the runtime logs once per
/// name (debounced) and otherwise ignores the event.
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: HashMap<String, EventHandlerFn>,
    warned_missing: HashSet<String>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: impl Into<String>, handler: EventHandlerFn) {
        self.handlers.insert(name.into(), handler);
    }

    /// Invokes the handler for `name`, if any. Logs a warning the first
    /// time a given name goes unhandled, then stays silent for it.
    pub fn invoke(&mut self, name: &str) {
        if let Some(handler) = self.handlers.get_mut(name) {
            handler();
            return;
        }
        if self.warned_missing.insert(name.to_string()) {
            tracing::warn!(handler = name, "no event handler registered for this name");
        }
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }
}

/// Maps a custom component's declared name to the layout adjuster it
/// contributes (spec §1 Non-goals: custom component behavior is limited to
/// layout hooks). Registering the same name twice is a programmer error
/// the caller must handle, not a silent overwrite.
#[derive(Default)]
pub struct CustomComponentRegistry {
    adjusters: HashMap<String, LayoutAdjuster>,
}

impl CustomComponentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: impl Into<String>, adjuster: LayoutAdjuster) -> Result<(), RegistryError> {
        let name = name.into();
        if self.adjusters.contains_key(&name) {
            return Err(RegistryError::AlreadyRegistered(name));
        }
        self.adjusters.insert(name, adjuster);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&LayoutAdjuster> {
        self.adjusters.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_handler_is_debounced() {
        let mut registry = HandlerRegistry::new();
        registry.invoke("on_click");
        registry.invoke("on_click");
        assert_eq!(registry.warned_missing.len(), 1);
    }

    #[test]
    fn duplicate_component_registration_errors() {
        let mut registry = CustomComponentRegistry::new();
        registry.register("Badge", Box::new(|_, _, _| {})).unwrap();
        let err = registry.register("Badge", Box::new(|_, _, _| {})).unwrap_err();
        assert!(matches!(err, RegistryError::AlreadyRegistered(name) if name == "Badge"));
    }
}
