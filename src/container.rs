//! The bean container facade and its builder.

use std::sync::Arc;

use tracing::debug;

use crate::convert::{SimpleTypeConverter, TypeConverter};
use crate::creator::BeanCreator;
use crate::definition::{downcast_handle, BeanDefinition, BeanHandle};
use crate::error::{BeansError, BeansResult};
use crate::internal::PrototypeGuard;
use crate::registry::DefinitionRegistry;
use crate::scope::BeanScope;
use crate::singleton::SingletonRegistry;

/// The bean container: resolves named beans from merged definitions,
/// enforcing per-name lifecycle scopes and resolving reference cycles
/// between mutually dependent singletons.
///
/// The container is cheaply cloneable (`Arc` internally) and fully
/// thread-safe; concurrent `get_bean` calls for the same singleton observe
/// exactly one construction.
///
/// # Examples
///
/// ```rust
/// use wirebox::{BeanContainer, BeanDefinition};
/// use std::sync::Arc;
///
/// struct Greeter { greeting: String }
///
/// let mut builder = BeanContainer::builder();
/// builder.register(
///     "greeter",
///     BeanDefinition::builder()
///         .constructor(|_| Ok(Arc::new(Greeter { greeting: "hello".into() })))
///         .build(),
/// );
/// let container = builder.build();
///
/// let a = container.get_bean::<Greeter>("greeter").unwrap();
/// let b = container.get_bean::<Greeter>("greeter").unwrap();
/// assert_eq!(a.greeting, "hello");
/// assert!(Arc::ptr_eq(&a, &b)); // Singleton: same instance
/// ```
pub struct BeanContainer {
    inner: Arc<ContainerInner>,
}

struct ContainerInner {
    definitions: DefinitionRegistry,
    singletons: SingletonRegistry,
    converter: Arc<dyn TypeConverter>,
}

impl BeanContainer {
    /// Starts assembling a container.
    pub fn builder() -> ContainerBuilder {
        ContainerBuilder::new()
    }

    /// Resolves a bean by name as a type-erased handle.
    ///
    /// Singletons are served from the finished cache or created at most
    /// once; prototypes are created fresh on every call and never cached.
    pub fn get_bean_handle(&self, name: &str) -> BeansResult<BeanHandle> {
        let definition = self.inner.definitions.get_merged(name)?;
        match definition.scope() {
            BeanScope::Singleton => self.inner.singletons.get_singleton(name, || {
                BeanCreator::new(self).create_bean(name, &definition)
            }),
            BeanScope::Prototype => {
                let _guard = PrototypeGuard::enter(name)?;
                debug!(bean = name, "creating prototype");
                BeanCreator::new(self)
                    .create_bean(name, &definition)
                    .map_err(|err| BeansError::Creation {
                        bean: name.to_string(),
                        source: Box::new(err),
                    })
            }
        }
    }

    /// Resolves a bean by name and downcasts it to `T`.
    pub fn get_bean<T: Send + Sync + 'static>(&self, name: &str) -> BeansResult<Arc<T>> {
        let handle = self.get_bean_handle(name)?;
        downcast_handle(name, handle)
    }

    /// Eagerly creates every non-lazy singleton definition, in
    /// registration order. Lazy singletons and prototypes are skipped.
    pub fn preinstantiate_singletons(&self) -> BeansResult<()> {
        debug!("pre-instantiating non-lazy singletons");
        for name in self.inner.definitions.names() {
            let Ok(definition) = self.inner.definitions.get_merged(&name) else {
                continue;
            };
            if definition.scope().is_singleton() && !definition.is_lazy_init() {
                self.get_bean_handle(&name)?;
            }
        }
        Ok(())
    }

    /// Registers (or replaces) a definition after build. Replacement drops
    /// any cached singleton state for the name, so a corrected definition
    /// resolves fresh.
    pub fn register(&self, name: impl Into<String>, definition: BeanDefinition) {
        let name = name.into();
        self.inner.singletons.remove_singleton(&name);
        self.inner.definitions.register(name, definition);
    }

    /// Removes a definition, tearing down its cached singleton (running
    /// the destruction callback, if registered). Returns whether a
    /// definition existed.
    pub fn remove_definition(&self, name: &str) -> bool {
        if self.inner.definitions.remove(name).is_some() {
            self.inner.singletons.destroy_singleton(name);
            true
        } else {
            false
        }
    }

    /// True when a definition exists for the name.
    pub fn contains_bean(&self, name: &str) -> bool {
        self.inner.definitions.contains(name)
    }

    /// Whether the named definition is singleton-scoped.
    pub fn is_singleton(&self, name: &str) -> BeansResult<bool> {
        Ok(self.inner.definitions.get_merged(name)?.scope().is_singleton())
    }

    /// Registered definition names in registration order.
    pub fn definition_names(&self) -> Vec<String> {
        self.inner.definitions.names()
    }

    /// True when the finished singleton cache holds the name.
    pub fn contains_singleton(&self, name: &str) -> bool {
        self.inner.singletons.contains_singleton(name)
    }

    /// Number of finished singletons.
    pub fn singleton_count(&self) -> usize {
        self.inner.singletons.singleton_count()
    }

    /// True while the named singleton is mid-creation.
    pub fn is_singleton_currently_in_creation(&self, name: &str) -> bool {
        self.inner
            .singletons
            .is_singleton_currently_in_creation(name)
    }

    /// Tears down all disposable singletons in reverse registration order
    /// and clears the singleton caches. Definitions stay registered.
    pub fn destroy_singletons(&self) {
        self.inner.singletons.destroy_singletons();
    }

    /// Closes the container: currently equivalent to
    /// [`destroy_singletons`](Self::destroy_singletons).
    pub fn close(&self) {
        self.destroy_singletons();
    }

    pub(crate) fn singleton_registry(&self) -> &SingletonRegistry {
        &self.inner.singletons
    }

    pub(crate) fn converter(&self) -> &dyn TypeConverter {
        self.inner.converter.as_ref()
    }
}

impl Clone for BeanContainer {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

/// Assembles a [`BeanContainer`]: definitions plus the type-conversion
/// collaborator.
pub struct ContainerBuilder {
    definitions: DefinitionRegistry,
    converter: Arc<dyn TypeConverter>,
}

impl ContainerBuilder {
    fn new() -> Self {
        Self {
            definitions: DefinitionRegistry::new(),
            converter: Arc::new(SimpleTypeConverter),
        }
    }

    /// Registers a definition under the given bean name.
    pub fn register(&mut self, name: impl Into<String>, definition: BeanDefinition) -> &mut Self {
        self.definitions.register(name, definition);
        self
    }

    /// Replaces the default [`SimpleTypeConverter`].
    pub fn converter(&mut self, converter: impl TypeConverter + 'static) -> &mut Self {
        self.converter = Arc::new(converter);
        self
    }

    /// Finalizes the container.
    pub fn build(self) -> BeanContainer {
        BeanContainer {
            inner: Arc::new(ContainerInner {
                definitions: self.definitions,
                singletons: SingletonRegistry::new(),
                converter: self.converter,
            }),
        }
    }
}

impl Default for ContainerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
