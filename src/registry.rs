//! Definition registry: bean name to merged definition.

use std::collections::HashMap;

use parking_lot::RwLock;

use crate::definition::BeanDefinition;
use crate::error::{BeansError, BeansResult};
use std::sync::Arc;

#[derive(Default)]
struct RegistryState {
    definitions: HashMap<String, Arc<BeanDefinition>>,
    /// Registration order, driving warm-up iteration.
    order: Vec<String>,
}

/// Maps bean names to merged, resolved definitions.
///
/// The creation core only reads from this registry; registration and
/// removal are container-assembly concerns. Re-registering a name replaces
/// the definition but keeps its original warm-up position.
#[derive(Default)]
pub struct DefinitionRegistry {
    state: RwLock<RegistryState>,
}

impl DefinitionRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a definition under the given bean name, replacing any
    /// previous definition for that name.
    pub fn register(&self, name: impl Into<String>, definition: BeanDefinition) {
        let name = name.into();
        let mut state = self.state.write();
        if !state.definitions.contains_key(&name) {
            state.order.push(name.clone());
        }
        state.definitions.insert(name, Arc::new(definition));
    }

    /// Removes the definition for the given name, returning it if present.
    pub fn remove(&self, name: &str) -> Option<Arc<BeanDefinition>> {
        let mut state = self.state.write();
        let removed = state.definitions.remove(name);
        if removed.is_some() {
            state.order.retain(|n| n != name);
        }
        removed
    }

    /// Looks up the merged definition for a bean name.
    pub fn get_merged(&self, name: &str) -> BeansResult<Arc<BeanDefinition>> {
        self.state
            .read()
            .definitions
            .get(name)
            .cloned()
            .ok_or_else(|| BeansError::NoSuchDefinition(name.to_string()))
    }

    /// True when a definition exists for the name.
    pub fn contains(&self, name: &str) -> bool {
        self.state.read().definitions.contains_key(name)
    }

    /// Registered bean names in registration order.
    pub fn names(&self) -> Vec<String> {
        self.state.read().order.clone()
    }

    /// Number of registered definitions.
    pub fn len(&self) -> usize {
        self.state.read().definitions.len()
    }

    /// True when no definitions are registered.
    pub fn is_empty(&self) -> bool {
        self.state.read().definitions.is_empty()
    }
}
