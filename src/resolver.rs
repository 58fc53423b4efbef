//! Dependency resolution during another bean's creation.

use tracing::trace;

use crate::container::BeanContainer;
use crate::definition::BeanHandle;
use crate::error::BeansResult;

/// Resolves a required bean reference to a usable handle.
///
/// A target currently mid-creation is served its early reference
/// (consuming the one-shot factory if it hasn't been pulled yet) instead
/// of triggering a second construction. Everything else goes through full
/// resolution: cached singletons come from the finished cache, prototypes
/// get a fresh creation run.
pub(crate) struct DependencyResolver<'a> {
    container: &'a BeanContainer,
}

impl<'a> DependencyResolver<'a> {
    pub(crate) fn new(container: &'a BeanContainer) -> Self {
        Self { container }
    }

    pub(crate) fn resolve_reference(&self, target: &str) -> BeansResult<BeanHandle> {
        let registry = self.container.singleton_registry();
        if registry.is_singleton_currently_in_creation(target) {
            if let Some(early) = registry.get_singleton_cached(target, true) {
                trace!(bean = target, "resolved early singleton reference");
                return Ok(early);
            }
            // In creation but not yet early-exposed: the target is still
            // resolving its own constructor arguments. Falling through to
            // full resolution re-enters the registry for the same name and
            // surfaces the constructor-level cycle.
        }
        self.container.get_bean_handle(target)
    }
}
