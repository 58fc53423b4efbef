//! # wirebox
//!
//! Named-bean dependency injection for Rust: a container that instantiates
//! and wires a graph of objects from merged definitions, enforces
//! per-name lifecycle scopes, and resolves reference cycles between
//! mutually dependent singletons without corrupting the graph.
//!
//! ## Features
//!
//! - **Named beans**: definitions are registered and resolved by name
//! - **Scopes**: singleton (created at most once, shared) and prototype
//!   (fresh instance per request, never cached)
//! - **Circular-reference resolution**: setter-level cycles are broken via
//!   early references from a three-tier singleton cache; constructor-level
//!   cycles are detected and reported with the full cycle path
//! - **Thread-safe**: concurrent `get_bean` calls observe exactly one
//!   construction per singleton
//! - **Lifecycle callbacks**: ordered init callbacks, destruction
//!   callbacks run in reverse registration order at container close
//!
//! ## Quick Start
//!
//! ```rust
//! use wirebox::{BeanContainer, BeanDefinition, RawValue, ValueHolder};
//! use parking_lot::RwLock;
//! use std::sync::Arc;
//!
//! struct Database {
//!     url: String,
//! }
//!
//! struct UserService {
//!     db: RwLock<Option<Arc<Database>>>,
//! }
//!
//! let mut builder = BeanContainer::builder();
//! builder.register(
//!     "database",
//!     BeanDefinition::builder()
//!         .constructor(|_| {
//!             Ok(Arc::new(Database { url: "postgres://localhost".into() }))
//!         })
//!         .build(),
//! );
//! builder.register(
//!     "userService",
//!     BeanDefinition::builder()
//!         .constructor(|_| Ok(Arc::new(UserService { db: RwLock::new(None) })))
//!         .property::<UserService, _>(
//!             "db",
//!             ValueHolder::new(RawValue::Ref("database".into())),
//!             |service, value| {
//!                 *service.db.write() = Some(value.downcast::<Database>().unwrap());
//!                 Ok(())
//!             },
//!         )
//!         .build(),
//! );
//!
//! let container = builder.build();
//! let service = container.get_bean::<UserService>("userService").unwrap();
//! let db = service.db.read().clone().unwrap();
//! assert_eq!(db.url, "postgres://localhost");
//! ```
//!
//! ## Cycle Resolution
//!
//! Two singletons may reference each other through properties: while bean
//! A is still being constructed it hands out a not-yet-populated *early
//! reference* that bean B wires in, and once A's own population completes
//! both instances point at each other. Cycles between *constructors*
//! cannot be broken this way and fail with
//! [`BeansError::CircularCreation`] naming the cycle.

// Module declarations
pub mod container;
pub mod convert;
pub mod definition;
pub mod error;
pub mod registry;
pub mod scope;
pub mod singleton;
pub mod values;

// Internal modules
mod creator;
mod internal;
mod resolver;

// Re-export core types
pub use container::{BeanContainer, ContainerBuilder};
pub use convert::{SimpleTypeConverter, TypeConverter};
pub use definition::{
    BeanDefinition, BeanDefinitionBuilder, BeanHandle, ConstructorFn, DestroyFn,
    EarlyReferenceHook, InitFn, ParameterSpec, PropertySpec, SetterFn,
};
pub use error::{BeansError, BeansResult};
pub use registry::DefinitionRegistry;
pub use scope::BeanScope;
pub use singleton::{ObjectFactory, SingletonRegistry};
pub use values::{ConstructorArgumentValues, RawValue, ValueHolder};

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    struct Config {
        port: i64,
    }

    #[test]
    fn test_singleton_resolution() {
        let mut builder = BeanContainer::builder();
        builder.register(
            "config",
            BeanDefinition::builder()
                .parameter(ParameterSpec::typed("i64"))
                .indexed_arg(0, 8080i64)
                .constructor(|args| {
                    let port = *args[0].clone().downcast::<i64>().unwrap();
                    Ok(Arc::new(Config { port }))
                })
                .build(),
        );
        let container = builder.build();

        let a = container.get_bean::<Config>("config").unwrap();
        let b = container.get_bean::<Config>("config").unwrap();

        assert_eq!(a.port, 8080);
        assert!(Arc::ptr_eq(&a, &b)); // Same instance
    }

    #[test]
    fn test_prototype_resolution() {
        let mut builder = BeanContainer::builder();
        builder.register(
            "config",
            BeanDefinition::builder()
                .scope(BeanScope::Prototype)
                .constructor(|_| Ok(Arc::new(Config { port: 1 })))
                .build(),
        );
        let container = builder.build();

        let a = container.get_bean::<Config>("config").unwrap();
        let b = container.get_bean::<Config>("config").unwrap();

        assert!(!Arc::ptr_eq(&a, &b)); // Different instances
        assert!(!container.contains_singleton("config"));
    }

    #[test]
    fn test_type_mismatch_on_downcast() {
        let mut builder = BeanContainer::builder();
        builder.register("number", BeanDefinition::from_instance(42i64));
        let container = builder.build();

        assert!(matches!(
            container.get_bean::<String>("number"),
            Err(BeansError::TypeMismatch { bean, .. }) if bean == "number"
        ));
    }
}
