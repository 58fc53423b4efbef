//! Constructor argument and property value holders.
//!
//! A merged bean definition carries its constructor arguments in two forms:
//! indexed values bound to an exact parameter position, and generic values
//! matched by declared type, parameter name, or value assignability. Both
//! forms share the [`ValueHolder`] carrier, which also memoizes the result
//! of type conversion so repeated prototype creation does not re-run
//! expensive coercion.

use std::collections::BTreeMap;

use parking_lot::Mutex;

use crate::definition::BeanHandle;

/// Raw value carried by a definition before conversion or resolution.
///
/// Literals are coerced to their declared target type by the container's
/// [`TypeConverter`](crate::TypeConverter); `Ref` values name another bean
/// and are resolved through the dependency resolver instead.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    /// Explicit absence of a value.
    Null,
    /// Boolean literal.
    Bool(bool),
    /// Integer literal.
    Int(i64),
    /// Floating-point literal.
    Float(f64),
    /// String literal.
    Str(String),
    /// Reference to another bean by name.
    Ref(String),
}

impl RawValue {
    /// True when this raw value names another bean.
    pub fn is_ref(&self) -> bool {
        matches!(self, RawValue::Ref(_))
    }

    /// Runtime-assignability check against a required type name, used for
    /// generic argument matching when the holder declares neither a type
    /// nor a parameter name.
    pub(crate) fn assignable_to(&self, required_type: &str) -> bool {
        match self {
            RawValue::Bool(_) => required_type == "bool",
            RawValue::Int(_) => matches!(required_type, "i64" | "i32" | "u64" | "u32" | "usize"),
            RawValue::Float(_) => matches!(required_type, "f64" | "f32"),
            RawValue::Str(_) => matches!(required_type, "String" | "str"),
            // The referenced bean's runtime type is unknown until resolution.
            RawValue::Ref(_) => true,
            RawValue::Null => true,
        }
    }
}

impl From<bool> for RawValue {
    fn from(v: bool) -> Self {
        RawValue::Bool(v)
    }
}

impl From<i64> for RawValue {
    fn from(v: i64) -> Self {
        RawValue::Int(v)
    }
}

impl From<f64> for RawValue {
    fn from(v: f64) -> Self {
        RawValue::Float(v)
    }
}

impl From<&str> for RawValue {
    fn from(v: &str) -> Self {
        RawValue::Str(v.to_string())
    }
}

impl From<String> for RawValue {
    fn from(v: String) -> Self {
        RawValue::Str(v)
    }
}

#[derive(Default)]
struct ConvertedSlot {
    converted: bool,
    value: Option<BeanHandle>,
}

/// Holder for a single constructor argument or property value.
///
/// Carries the raw value, an optional declared type name, and an optional
/// parameter name. The converted form is cached on the holder after the
/// first coercion; subsequent creations that reuse the same definition
/// observe a single conversion.
///
/// Holders deliberately do not implement `PartialEq`: matching during
/// argument resolution is by identity, while definition-level comparison
/// uses [`content_equals`](ValueHolder::content_equals), which excludes the
/// parameter name so positional and generic values can compare equal.
pub struct ValueHolder {
    value: RawValue,
    type_name: Option<String>,
    name: Option<String>,
    slot: Mutex<ConvertedSlot>,
}

impl ValueHolder {
    /// Creates a holder for a raw value with no declared type or name.
    pub fn new(value: impl Into<RawValue>) -> Self {
        Self {
            value: value.into(),
            type_name: None,
            name: None,
            slot: Mutex::new(ConvertedSlot::default()),
        }
    }

    /// Declares the target type name for this value.
    pub fn with_type(mut self, type_name: impl Into<String>) -> Self {
        self.type_name = Some(type_name.into());
        self
    }

    /// Declares the parameter name this value is intended for.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// The raw, unconverted value.
    pub fn value(&self) -> &RawValue {
        &self.value
    }

    /// Declared target type name, if any.
    pub fn type_name(&self) -> Option<&str> {
        self.type_name.as_deref()
    }

    /// Declared parameter name, if any.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Whether a converted value has already been cached on this holder.
    pub fn is_converted(&self) -> bool {
        self.slot.lock().converted
    }

    /// Caches the converted value after type coercion.
    pub fn set_converted_value(&self, value: BeanHandle) {
        let mut slot = self.slot.lock();
        slot.converted = true;
        slot.value = Some(value);
    }

    /// The cached converted value, if conversion already ran.
    pub fn converted_value(&self) -> Option<BeanHandle> {
        self.slot.lock().value.clone()
    }

    /// Content equality: raw value and declared type only. The parameter
    /// name is excluded so that a positionally declared value and a generic
    /// one carrying the same content compare equal.
    pub fn content_equals(&self, other: &ValueHolder) -> bool {
        std::ptr::eq(self, other)
            || (self.value == other.value && self.type_name == other.type_name)
    }
}

impl Clone for ValueHolder {
    /// Produces an independent holder with the same content. The conversion
    /// cache is not carried over; the copy converts on its own first use.
    fn clone(&self) -> Self {
        Self {
            value: self.value.clone(),
            type_name: self.type_name.clone(),
            name: self.name.clone(),
            slot: Mutex::new(ConvertedSlot::default()),
        }
    }
}

impl std::fmt::Debug for ValueHolder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValueHolder")
            .field("value", &self.value)
            .field("type_name", &self.type_name)
            .field("name", &self.name)
            .field("converted", &self.is_converted())
            .finish()
    }
}

/// Identity set of holders already consumed during one resolution pass.
///
/// Generic argument values may be matched at most once per construction;
/// the set compares by holder identity, not content, so two holders with
/// equal content remain independently consumable.
#[derive(Default)]
pub(crate) struct UsedValues<'a> {
    used: Vec<&'a ValueHolder>,
}

impl<'a> UsedValues<'a> {
    pub(crate) fn contains(&self, holder: &ValueHolder) -> bool {
        self.used.iter().any(|u| std::ptr::eq(*u, holder))
    }

    pub(crate) fn mark(&mut self, holder: &'a ValueHolder) {
        self.used.push(holder);
    }
}

/// Constructor argument values of a merged bean definition.
///
/// Supports values bound to a specific index in the constructor argument
/// list as well as generic values matched by type or parameter name.
#[derive(Default)]
pub struct ConstructorArgumentValues {
    indexed: BTreeMap<usize, ValueHolder>,
    generic: Vec<ValueHolder>,
}

impl ConstructorArgumentValues {
    /// Creates an empty argument value set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds a holder to an exact parameter position.
    pub fn add_indexed(&mut self, index: usize, holder: ValueHolder) {
        self.indexed.insert(index, holder);
    }

    /// Adds a generic (unindexed) holder, matched by type or name.
    pub fn add_generic(&mut self, holder: ValueHolder) {
        self.generic.push(holder);
    }

    /// Matches the holder bound to the given index.
    ///
    /// A holder that declares a type only matches when the required type is
    /// given and equal; a holder that declares a name only matches when the
    /// required name is given and equal, where an *empty* required name
    /// accepts any declared name.
    pub fn get_indexed(
        &self,
        index: usize,
        required_type: Option<&str>,
        required_name: Option<&str>,
    ) -> Option<&ValueHolder> {
        let holder = self.indexed.get(&index)?;
        if let Some(declared) = holder.type_name() {
            match required_type {
                Some(required) if declared == required => {}
                _ => return None,
            }
        }
        if let Some(declared) = holder.name() {
            match required_name {
                Some("") => {}
                Some(required) if declared == required => {}
                _ => return None,
            }
        }
        Some(holder)
    }

    /// Scans generic values for the next unused match.
    ///
    /// A holder is skipped when it was already used in this resolution
    /// pass, when it declares a name or type the required ones are missing
    /// or do not match (an empty required name accepts any declared name),
    /// or, for fully undeclared holders, when its value is not assignable
    /// to the required type.
    pub(crate) fn get_generic(
        &self,
        required_type: Option<&str>,
        required_name: Option<&str>,
        used: &UsedValues<'_>,
    ) -> Option<&ValueHolder> {
        self.generic.iter().find(|holder| {
            if used.contains(holder) {
                return false;
            }
            if let Some(declared) = holder.name() {
                match required_name {
                    Some("") => {}
                    Some(required) if declared == required => {}
                    _ => return false,
                }
            }
            if let Some(declared) = holder.type_name() {
                match required_type {
                    Some(required) if declared == required => {}
                    _ => return false,
                }
            }
            if let Some(required) = required_type {
                if holder.type_name().is_none()
                    && holder.name().is_none()
                    && !holder.value().assignable_to(required)
                {
                    return false;
                }
            }
            true
        })
    }

    /// Indexed-first lookup for one parameter position: an indexed match
    /// wins, otherwise the next unused generic value is taken.
    pub(crate) fn get_argument_value(
        &self,
        index: usize,
        required_type: Option<&str>,
        required_name: Option<&str>,
        used: &UsedValues<'_>,
    ) -> Option<&ValueHolder> {
        self.get_indexed(index, required_type, required_name)
            .or_else(|| self.get_generic(required_type, required_name, used))
    }

    /// Number of distinct argument values, indexed plus generic.
    pub fn len(&self) -> usize {
        self.indexed.len() + self.generic.len()
    }

    /// True when no argument values are registered.
    pub fn is_empty(&self) -> bool {
        self.indexed.is_empty() && self.generic.is_empty()
    }
}

impl PartialEq for ConstructorArgumentValues {
    /// Compares by holder content (value and type), position-sensitively
    /// for indexed values and order-sensitively for generic ones.
    fn eq(&self, other: &Self) -> bool {
        self.indexed.len() == other.indexed.len()
            && self.generic.len() == other.generic.len()
            && self.indexed.iter().all(|(idx, holder)| {
                other
                    .indexed
                    .get(idx)
                    .is_some_and(|o| holder.content_equals(o))
            })
            && self
                .generic
                .iter()
                .zip(&other.generic)
                .all(|(a, b)| a.content_equals(b))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_equality_ignores_parameter_name() {
        let a = ValueHolder::new(42i64).with_type("i64").with_name("port");
        let b = ValueHolder::new(42i64).with_type("i64");
        assert!(a.content_equals(&b));

        let c = ValueHolder::new(42i64).with_type("u32");
        assert!(!a.content_equals(&c));
    }

    #[test]
    fn generic_match_skips_used_holders() {
        let mut args = ConstructorArgumentValues::new();
        args.add_generic(ValueHolder::new("first"));
        args.add_generic(ValueHolder::new("second"));

        let mut used = UsedValues::default();
        let first = args.get_generic(Some("String"), None, &used).unwrap();
        assert_eq!(first.value(), &RawValue::Str("first".into()));
        used.mark(first);

        let second = args.get_generic(Some("String"), None, &used).unwrap();
        assert_eq!(second.value(), &RawValue::Str("second".into()));
        used.mark(second);

        assert!(args.get_generic(Some("String"), None, &used).is_none());
    }

    #[test]
    fn indexed_match_wins_over_generic() {
        let mut args = ConstructorArgumentValues::new();
        args.add_generic(ValueHolder::new(1i64));
        args.add_indexed(0, ValueHolder::new(2i64));

        let used = UsedValues::default();
        let holder = args.get_argument_value(0, Some("i64"), None, &used).unwrap();
        assert_eq!(holder.value(), &RawValue::Int(2));
    }

    #[test]
    fn indexed_match_requires_the_declared_type_to_be_requested() {
        let mut args = ConstructorArgumentValues::new();
        args.add_indexed(0, ValueHolder::new(2i64).with_type("i64"));
        assert!(args.get_indexed(0, Some("String"), None).is_none());
        assert!(args.get_indexed(0, Some("i64"), None).is_some());
        // A typed holder does not satisfy an untyped position.
        assert!(args.get_indexed(0, None, None).is_none());
    }

    #[test]
    fn empty_required_name_matches_any_declared_name() {
        let mut args = ConstructorArgumentValues::new();
        args.add_indexed(0, ValueHolder::new(2i64).with_name("port"));
        args.add_generic(ValueHolder::new("host").with_name("host"));

        assert!(args.get_indexed(0, None, None).is_none());
        assert!(args.get_indexed(0, None, Some("port")).is_some());
        assert!(args.get_indexed(0, None, Some("")).is_some());
        assert!(args.get_indexed(0, None, Some("other")).is_none());

        let used = UsedValues::default();
        assert!(args.get_generic(None, None, &used).is_none());
        assert!(args.get_generic(None, Some(""), &used).is_some());
        assert!(args.get_generic(None, Some("host"), &used).is_some());
    }

    #[test]
    fn assignability_fallback_for_undeclared_holders() {
        let mut args = ConstructorArgumentValues::new();
        args.add_generic(ValueHolder::new(3.5f64));
        let used = UsedValues::default();
        assert!(args.get_generic(Some("String"), None, &used).is_none());
        assert!(args.get_generic(Some("f64"), None, &used).is_some());
    }

    #[test]
    fn cloned_holder_drops_conversion_cache() {
        let holder = ValueHolder::new(1i64);
        holder.set_converted_value(std::sync::Arc::new(1i64));
        assert!(holder.is_converted());
        let copy = holder.clone();
        assert!(!copy.is_converted());
        assert!(copy.content_equals(&holder));
    }
}
