//! Merged bean definitions: the construction recipe the container consumes.
//!
//! Definitions arrive fully merged (no parent/child inheritance left to
//! resolve) and are immutable once registered. Because Rust has no runtime
//! reflection, the instantiation and property-application mechanics are
//! capabilities carried by the definition itself: a type-erased constructor
//! closure plus one setter closure per property.

use std::any::Any;
use std::sync::Arc;

use crate::error::{BeansError, BeansResult};
use crate::scope::BeanScope;
use crate::values::{ConstructorArgumentValues, ValueHolder};

/// Shared handle to a container-managed bean instance.
///
/// Shared ownership is what makes cycle resolution work: the early
/// reference handed out mid-construction and the finished instance are the
/// same underlying storage, so property population is observed in place by
/// whoever already holds the handle.
pub type BeanHandle = Arc<dyn Any + Send + Sync>;

/// Raw construction from resolved, converted argument values.
pub type ConstructorFn = Arc<dyn Fn(&[BeanHandle]) -> BeansResult<BeanHandle> + Send + Sync>;

/// Applies one resolved property value to an instance, in place.
pub type SetterFn = Arc<dyn Fn(&BeanHandle, BeanHandle) -> BeansResult<()> + Send + Sync>;

/// Initialization callback, invoked after property population.
pub type InitFn = Arc<dyn Fn(&BeanHandle) -> BeansResult<()> + Send + Sync>;

/// Destruction callback, invoked at container teardown.
pub type DestroyFn = Arc<dyn Fn(&BeanHandle) + Send + Sync>;

/// Hook applied exactly once when a singleton's early reference is first
/// pulled by a dependent, before any other bean observes it. Defaults to
/// identity; a wrapping collaborator may substitute the raw instance here.
pub type EarlyReferenceHook = Arc<dyn Fn(BeanHandle) -> BeanHandle + Send + Sync>;

/// Downcasts a type-erased handle, reporting the offending bean name.
pub(crate) fn downcast_handle<T: Send + Sync + 'static>(
    bean: &str,
    handle: BeanHandle,
) -> BeansResult<Arc<T>> {
    handle.downcast::<T>().map_err(|_| BeansError::TypeMismatch {
        bean: bean.to_string(),
        requested: std::any::type_name::<T>(),
    })
}

/// Declared shape of one constructor parameter position.
///
/// Both fields are optional; an undeclared parameter accepts any argument
/// value the matching rules allow.
#[derive(Debug, Clone, Default)]
pub struct ParameterSpec {
    name: Option<String>,
    type_name: Option<String>,
}

impl ParameterSpec {
    /// An unconstrained parameter position.
    pub fn any() -> Self {
        Self::default()
    }

    /// A parameter matched by name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            type_name: None,
        }
    }

    /// A parameter matched by declared type name.
    pub fn typed(type_name: impl Into<String>) -> Self {
        Self {
            name: None,
            type_name: Some(type_name.into()),
        }
    }

    /// Constrains the parameter name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Declared parameter name, if any.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Declared type name, if any.
    pub fn type_name(&self) -> Option<&str> {
        self.type_name.as_deref()
    }
}

/// One named property of a definition: the value to resolve and the setter
/// that writes it into the instance.
pub struct PropertySpec {
    pub(crate) name: String,
    pub(crate) value: ValueHolder,
    pub(crate) setter: SetterFn,
}

impl PropertySpec {
    /// Property name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The value holder backing this property.
    pub fn value(&self) -> &ValueHolder {
        &self.value
    }
}

/// A merged, resolved bean definition.
///
/// Identity is the bean name it is registered under; the definition itself
/// only describes how to build and wire the instance.
///
/// # Examples
///
/// ```rust
/// use wirebox::{BeanContainer, BeanDefinition, ParameterSpec, RawValue};
/// use std::sync::Arc;
///
/// struct Server { port: i64 }
///
/// let mut builder = BeanContainer::builder();
/// builder.register(
///     "server",
///     BeanDefinition::builder()
///         .parameter(ParameterSpec::typed("i64").with_name("port"))
///         .indexed_arg(0, RawValue::Int(8080))
///         .constructor(|args| {
///             let port = args[0].clone().downcast::<i64>().unwrap();
///             Ok(Arc::new(Server { port: *port }))
///         })
///         .build(),
/// );
/// let container = builder.build();
/// let server = container.get_bean::<Server>("server").unwrap();
/// assert_eq!(server.port, 8080);
/// ```
pub struct BeanDefinition {
    scope: BeanScope,
    constructor: ConstructorFn,
    parameters: Vec<ParameterSpec>,
    constructor_args: ConstructorArgumentValues,
    properties: Vec<PropertySpec>,
    depends_on: Vec<String>,
    lazy_init: bool,
    init_callbacks: Vec<InitFn>,
    destroy_callback: Option<DestroyFn>,
    early_reference_hook: Option<EarlyReferenceHook>,
}

impl BeanDefinition {
    /// Starts building a definition.
    pub fn builder() -> BeanDefinitionBuilder {
        BeanDefinitionBuilder::new()
    }

    /// Shorthand for a zero-argument singleton definition around an
    /// existing value; every resolution returns the same shared handle.
    pub fn from_instance<T: Send + Sync + 'static>(value: T) -> Self {
        let handle: BeanHandle = Arc::new(value);
        BeanDefinition::builder()
            .constructor(move |_| Ok(handle.clone()))
            .build()
    }

    /// The definition's scope.
    pub fn scope(&self) -> BeanScope {
        self.scope
    }

    /// Whether this singleton is skipped at container warm-up.
    pub fn is_lazy_init(&self) -> bool {
        self.lazy_init
    }

    /// Bean names to force-create before this bean.
    pub fn depends_on(&self) -> &[String] {
        &self.depends_on
    }

    /// Declared constructor parameter positions.
    pub fn parameters(&self) -> &[ParameterSpec] {
        &self.parameters
    }

    /// Indexed and generic constructor argument values.
    pub fn constructor_args(&self) -> &ConstructorArgumentValues {
        &self.constructor_args
    }

    /// Named property specs, applied in declaration order.
    pub fn properties(&self) -> &[PropertySpec] {
        &self.properties
    }

    pub(crate) fn constructor(&self) -> &ConstructorFn {
        &self.constructor
    }

    pub(crate) fn init_callbacks(&self) -> &[InitFn] {
        &self.init_callbacks
    }

    pub(crate) fn destroy_callback(&self) -> Option<&DestroyFn> {
        self.destroy_callback.as_ref()
    }

    pub(crate) fn early_reference_hook(&self) -> Option<&EarlyReferenceHook> {
        self.early_reference_hook.as_ref()
    }
}

/// Fluent builder for [`BeanDefinition`].
pub struct BeanDefinitionBuilder {
    scope: BeanScope,
    constructor: Option<ConstructorFn>,
    parameters: Vec<ParameterSpec>,
    constructor_args: ConstructorArgumentValues,
    properties: Vec<PropertySpec>,
    depends_on: Vec<String>,
    lazy_init: bool,
    init_callbacks: Vec<InitFn>,
    destroy_callback: Option<DestroyFn>,
    early_reference_hook: Option<EarlyReferenceHook>,
}

impl BeanDefinitionBuilder {
    fn new() -> Self {
        Self {
            scope: BeanScope::Singleton,
            constructor: None,
            parameters: Vec::new(),
            constructor_args: ConstructorArgumentValues::new(),
            properties: Vec::new(),
            depends_on: Vec::new(),
            lazy_init: false,
            init_callbacks: Vec::new(),
            destroy_callback: None,
            early_reference_hook: None,
        }
    }

    /// Sets the bean scope (singleton by default).
    pub fn scope(mut self, scope: BeanScope) -> Self {
        self.scope = scope;
        self
    }

    /// Sets the raw constructor. It receives the resolved argument values
    /// in parameter order.
    pub fn constructor<F>(mut self, f: F) -> Self
    where
        F: Fn(&[BeanHandle]) -> BeansResult<BeanHandle> + Send + Sync + 'static,
    {
        self.constructor = Some(Arc::new(f));
        self
    }

    /// Appends one declared constructor parameter position.
    pub fn parameter(mut self, spec: ParameterSpec) -> Self {
        self.parameters.push(spec);
        self
    }

    /// Binds an argument value to an exact parameter index.
    pub fn indexed_arg(mut self, index: usize, value: impl Into<crate::RawValue>) -> Self {
        self.constructor_args
            .add_indexed(index, ValueHolder::new(value));
        self
    }

    /// Binds a pre-built holder to an exact parameter index.
    pub fn indexed_arg_holder(mut self, index: usize, holder: ValueHolder) -> Self {
        self.constructor_args.add_indexed(index, holder);
        self
    }

    /// Adds a generic (unindexed) argument value.
    pub fn generic_arg(mut self, value: impl Into<crate::RawValue>) -> Self {
        self.constructor_args.add_generic(ValueHolder::new(value));
        self
    }

    /// Adds a pre-built generic argument holder.
    pub fn generic_arg_holder(mut self, holder: ValueHolder) -> Self {
        self.constructor_args.add_generic(holder);
        self
    }

    /// Declares a named property with a raw setter closure.
    pub fn property_raw<F>(
        mut self,
        name: impl Into<String>,
        value: ValueHolder,
        setter: F,
    ) -> Self
    where
        F: Fn(&BeanHandle, BeanHandle) -> BeansResult<()> + Send + Sync + 'static,
    {
        self.properties.push(PropertySpec {
            name: name.into(),
            value,
            setter: Arc::new(setter),
        });
        self
    }

    /// Declares a named property with a typed setter: the target handle is
    /// downcast to `T` before `apply` runs.
    pub fn property<T, F>(self, name: impl Into<String>, value: ValueHolder, apply: F) -> Self
    where
        T: Send + Sync + 'static,
        F: Fn(&Arc<T>, BeanHandle) -> BeansResult<()> + Send + Sync + 'static,
    {
        let name = name.into();
        let label = name.clone();
        self.property_raw(name, value, move |target, value| {
            let target = downcast_handle::<T>(&label, target.clone())?;
            apply(&target, value)
        })
    }

    /// Adds a bean name to force-create before this bean.
    pub fn depends_on(mut self, name: impl Into<String>) -> Self {
        self.depends_on.push(name.into());
        self
    }

    /// Marks this singleton as lazy: skipped at warm-up, created on first
    /// request.
    pub fn lazy_init(mut self, lazy: bool) -> Self {
        self.lazy_init = lazy;
        self
    }

    /// Appends an initialization callback; callbacks run in declaration
    /// order after property population.
    pub fn init<F>(mut self, f: F) -> Self
    where
        F: Fn(&BeanHandle) -> BeansResult<()> + Send + Sync + 'static,
    {
        self.init_callbacks.push(Arc::new(f));
        self
    }

    /// Sets the destruction callback, invoked at container teardown.
    pub fn destroy<F>(mut self, f: F) -> Self
    where
        F: Fn(&BeanHandle) + Send + Sync + 'static,
    {
        self.destroy_callback = Some(Arc::new(f));
        self
    }

    /// Installs the wrap-once early-reference hook.
    pub fn early_reference_hook<F>(mut self, f: F) -> Self
    where
        F: Fn(BeanHandle) -> BeanHandle + Send + Sync + 'static,
    {
        self.early_reference_hook = Some(Arc::new(f));
        self
    }

    /// Finalizes the definition. A definition built without a constructor
    /// fails at creation time with an unsatisfied-dependency error rather
    /// than at registration.
    pub fn build(self) -> BeanDefinition {
        let constructor = self.constructor.unwrap_or_else(|| {
            Arc::new(|_args: &[BeanHandle]| {
                Err(BeansError::UnsatisfiedDependency {
                    bean: String::new(),
                    detail: "definition has no constructor configured".to_string(),
                })
            })
        });
        BeanDefinition {
            scope: self.scope,
            constructor,
            parameters: self.parameters,
            constructor_args: self.constructor_args,
            properties: self.properties,
            depends_on: self.depends_on,
            lazy_init: self.lazy_init,
            init_callbacks: self.init_callbacks,
            destroy_callback: self.destroy_callback,
            early_reference_hook: self.early_reference_hook,
        }
    }
}

impl Default for BeanDefinitionBuilder {
    fn default() -> Self {
        Self::new()
    }
}
