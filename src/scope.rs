//! Bean scope definitions.

/// Bean scopes controlling instance caching behavior.
///
/// # Scope Characteristics
///
/// - **Singleton**: one shared instance per container per bean name, cached
///   in the singleton registry after first creation
/// - **Prototype**: a fresh instance per request, never cached
///
/// # Examples
///
/// ```rust
/// use wirebox::{BeanContainer, BeanDefinition, BeanScope};
/// use std::sync::Arc;
///
/// struct Ticket(u64);
///
/// let mut container = BeanContainer::builder();
/// container.register(
///     "ticket",
///     BeanDefinition::builder()
///         .scope(BeanScope::Prototype)
///         .constructor(|_args| Ok(Arc::new(Ticket(7))))
///         .build(),
/// );
/// let container = container.build();
///
/// let a = container.get_bean::<Ticket>("ticket").unwrap();
/// let b = container.get_bean::<Ticket>("ticket").unwrap();
/// assert!(!Arc::ptr_eq(&a, &b)); // Prototype: always a fresh instance
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BeanScope {
    /// Single instance per container, created at most once and cached
    /// forever (until explicit destruction). The same instance is shared
    /// across all callers and threads.
    #[default]
    Singleton,
    /// New instance per resolution, never cached. A prototype cannot hold
    /// an early-reference slot and therefore cannot participate in a
    /// resolvable dependency cycle.
    Prototype,
}

impl BeanScope {
    /// True for the singleton scope.
    pub fn is_singleton(self) -> bool {
        matches!(self, BeanScope::Singleton)
    }

    /// True for the prototype scope.
    pub fn is_prototype(self) -> bool {
        matches!(self, BeanScope::Prototype)
    }
}
