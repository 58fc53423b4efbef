//! Bean creation: from merged definition to fully wired instance.
//!
//! The creator runs the construction pipeline: force `depends_on` names,
//! resolve and convert constructor arguments, raw-construct, expose the
//! early reference (singletons only), populate properties, run init
//! callbacks, and register the destruction callback. The early-exposure
//! step between raw construction and property population is what lets a
//! sibling bean mid-cycle receive a working reference to this instance
//! instead of recursing into a second construction attempt.

use tracing::trace;

use crate::container::BeanContainer;
use crate::definition::{BeanDefinition, BeanHandle};
use crate::error::{BeansError, BeansResult};
use crate::resolver::DependencyResolver;
use crate::values::{RawValue, UsedValues, ValueHolder};

pub(crate) struct BeanCreator<'a> {
    container: &'a BeanContainer,
}

impl<'a> BeanCreator<'a> {
    pub(crate) fn new(container: &'a BeanContainer) -> Self {
        Self { container }
    }

    /// Turns one merged definition into a wired instance. For singletons
    /// this runs inside the registry's guarded in-creation region; the
    /// caller wraps any error with the bean name.
    pub(crate) fn create_bean(
        &self,
        name: &str,
        definition: &BeanDefinition,
    ) -> BeansResult<BeanHandle> {
        for dependency in definition.depends_on() {
            trace!(bean = name, dependency = dependency.as_str(), "forcing depends-on");
            self.container.get_bean_handle(dependency)?;
        }

        let args = self.resolve_constructor_args(name, definition)?;
        let raw = (definition.constructor())(&args).map_err(|err| match err {
            // The no-constructor default doesn't know its bean name.
            BeansError::UnsatisfiedDependency { bean, detail } if bean.is_empty() => {
                BeansError::UnsatisfiedDependency {
                    bean: name.to_string(),
                    detail,
                }
            }
            other => other,
        })?;

        let registry = self.container.singleton_registry();
        let early_eligible = definition.scope().is_singleton()
            && registry.is_singleton_currently_in_creation(name);
        if early_eligible {
            let hook = definition.early_reference_hook().cloned();
            let raw_for_factory = raw.clone();
            registry.add_singleton_factory(
                name,
                Box::new(move || match hook {
                    Some(hook) => hook(raw_for_factory),
                    None => raw_for_factory,
                }),
            );
        }

        self.populate_properties(name, definition, &raw)?;

        for callback in definition.init_callbacks() {
            callback(&raw)?;
        }

        // If a dependent already pulled the early reference, that exact
        // instance (possibly hook-substituted) is the one to publish.
        let exposed = if early_eligible {
            registry
                .get_singleton_cached(name, false)
                .unwrap_or_else(|| raw.clone())
        } else {
            raw
        };

        if definition.scope().is_singleton() {
            if let Some(destroy) = definition.destroy_callback() {
                registry.register_disposable(name, exposed.clone(), destroy.clone());
            }
        }

        Ok(exposed)
    }

    /// Resolves one value per declared parameter position: indexed match
    /// first, then the next unused generic value. Each matched holder is
    /// marked used for this pass only, then converted (memoized) or
    /// resolved as a bean reference.
    fn resolve_constructor_args(
        &self,
        name: &str,
        definition: &BeanDefinition,
    ) -> BeansResult<Vec<BeanHandle>> {
        let parameters = definition.parameters();
        let values = definition.constructor_args();
        let mut used = UsedValues::default();
        let mut resolved = Vec::with_capacity(parameters.len());

        for (index, parameter) in parameters.iter().enumerate() {
            let holder = values
                .get_argument_value(index, parameter.type_name(), parameter.name(), &used)
                .ok_or_else(|| BeansError::UnsatisfiedDependency {
                    bean: name.to_string(),
                    detail: match parameter.name() {
                        Some(pname) => {
                            format!("no value for constructor parameter {index} ('{pname}')")
                        }
                        None => format!("no value for constructor parameter {index}"),
                    },
                })?;
            used.mark(holder);
            resolved.push(self.resolve_value(holder, parameter.type_name())?);
        }
        Ok(resolved)
    }

    /// Applies property values in declaration order, resolving bean
    /// references through the dependency resolver. This recursion is where
    /// setter-level cycles break: a referenced bean mid-construction comes
    /// back as its early reference.
    fn populate_properties(
        &self,
        name: &str,
        definition: &BeanDefinition,
        target: &BeanHandle,
    ) -> BeansResult<()> {
        for property in definition.properties() {
            trace!(bean = name, property = property.name(), "applying property");
            let value = self.resolve_value(property.value(), None)?;
            (property.setter)(target, value)?;
        }
        Ok(())
    }

    /// Resolves one holder: bean references go through the resolver every
    /// time (never memoized); literals are converted once and cached on
    /// the holder.
    fn resolve_value(
        &self,
        holder: &ValueHolder,
        fallback_type: Option<&str>,
    ) -> BeansResult<BeanHandle> {
        if let RawValue::Ref(target) = holder.value() {
            return DependencyResolver::new(self.container).resolve_reference(target);
        }
        if holder.is_converted() {
            if let Some(cached) = holder.converted_value() {
                return Ok(cached);
            }
        }
        let target_type = holder.type_name().or(fallback_type);
        let converted = self
            .container
            .converter()
            .convert(holder.value(), target_type)?;
        holder.set_converted_value(converted.clone());
        Ok(converted)
    }
}
