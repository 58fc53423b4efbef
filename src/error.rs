//! Error types for the bean container.

use thiserror::Error;

/// Bean container errors.
///
/// Covers every failure mode of definition lookup, bean creation, and
/// container teardown. Creation failures nest their cause, so the error
/// returned from the outermost [`get_bean`](crate::BeanContainer::get_bean)
/// call reflects the full dependency path that failed.
///
/// # Examples
///
/// ```rust
/// use wirebox::{BeanContainer, BeansError};
///
/// let container = BeanContainer::builder().build();
/// match container.get_bean_handle("missing") {
///     Err(BeansError::NoSuchDefinition(name)) => assert_eq!(name, "missing"),
///     _ => unreachable!(),
/// }
/// ```
#[derive(Debug, Error)]
pub enum BeansError {
    /// No definition registered under the requested bean name.
    #[error("no bean definition registered for '{0}'")]
    NoSuchDefinition(String),

    /// A required constructor argument or property has no resolvable source.
    #[error("unsatisfied dependency for bean '{bean}': {detail}")]
    UnsatisfiedDependency {
        /// Name of the bean whose resolution failed.
        bean: String,
        /// Which argument or property could not be satisfied, and why.
        detail: String,
    },

    /// Constructor-level dependency cycle (includes the full cycle path).
    #[error("circular dependency between bean constructors: {}", path.join(" -> "))]
    CircularCreation {
        /// Creation stack at detection time, ending with the repeated name.
        path: Vec<String>,
    },

    /// A cycle routed through a prototype-scoped bean, which has no
    /// early-reference slot and therefore cannot participate in one.
    #[error("unresolvable circular reference through prototype bean '{0}'")]
    UnresolvableCircularReference(String),

    /// Wraps any failure during raw construction, property population, or
    /// callback invocation of the named bean.
    #[error("error creating bean '{bean}'")]
    Creation {
        /// Name of the bean whose creation aborted.
        bean: String,
        /// Underlying failure, possibly another nested `Creation`.
        #[source]
        source: Box<BeansError>,
    },

    /// The singleton is being torn down; no recreation during shutdown.
    #[error("singleton '{0}' is currently being destroyed")]
    CurrentlyInDestruction(String),

    /// The early reference handed out during creation is not the same
    /// instance the creator finished with; dependents would hold a stale
    /// reference.
    #[error("early reference for singleton '{0}' differs from its finished instance")]
    IllegalSingletonState(String),

    /// Bean exists but does not downcast to the requested type.
    #[error("bean '{bean}' is not of the requested type '{requested}'")]
    TypeMismatch {
        /// Name of the bean that was resolved.
        bean: String,
        /// Type name the caller asked for.
        requested: &'static str,
    },

    /// A literal value could not be coerced to its declared target type.
    #[error("cannot convert value to '{target}': {detail}")]
    Conversion {
        /// Declared target type name.
        target: String,
        /// Converter diagnostic.
        detail: String,
    },
}

impl BeansError {
    /// Walks the `Creation` nesting down to the originating failure.
    pub fn root_cause(&self) -> &BeansError {
        match self {
            BeansError::Creation { source, .. } => source.root_cause(),
            other => other,
        }
    }

    /// Bean names along the `Creation` chain, outermost first.
    ///
    /// Useful for diagnosing which dependency path a cascading abort
    /// travelled through.
    pub fn creation_path(&self) -> Vec<&str> {
        let mut path = Vec::new();
        let mut cur = self;
        while let BeansError::Creation { bean, source } = cur {
            path.push(bean.as_str());
            cur = source;
        }
        path
    }
}

/// Result type for container operations.
pub type BeansResult<T> = Result<T, BeansError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creation_chain_reports_path_and_root_cause() {
        let err = BeansError::Creation {
            bean: "a".into(),
            source: Box::new(BeansError::Creation {
                bean: "b".into(),
                source: Box::new(BeansError::NoSuchDefinition("c".into())),
            }),
        };
        assert_eq!(err.creation_path(), vec!["a", "b"]);
        assert!(matches!(
            err.root_cause(),
            BeansError::NoSuchDefinition(name) if name == "c"
        ));
    }

    #[test]
    fn display_includes_cycle_path() {
        let err = BeansError::CircularCreation {
            path: vec!["a".into(), "b".into(), "a".into()],
        };
        assert_eq!(
            err.to_string(),
            "circular dependency between bean constructors: a -> b -> a"
        );
    }
}
