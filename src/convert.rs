//! Literal type conversion.
//!
//! Conversion is a narrow collaborator seam: the creation core hands a raw
//! literal and a declared target type name to the converter and memoizes
//! the result on the value holder. Bean references never reach the
//! converter; they are resolved through the container instead.

use std::sync::Arc;

use crate::definition::BeanHandle;
use crate::error::{BeansError, BeansResult};
use crate::values::RawValue;

/// Coerces raw literal values to their declared target types.
pub trait TypeConverter: Send + Sync {
    /// Converts `value` to the type named by `target`. A `None` target
    /// keeps the literal's natural type.
    fn convert(&self, value: &RawValue, target: Option<&str>) -> BeansResult<BeanHandle>;
}

/// Default converter covering the primitive literal types and the usual
/// string coercions (`"8080"` to `i64`, `"true"` to `bool`, numeric
/// widening to `f64`).
#[derive(Debug, Default, Clone, Copy)]
pub struct SimpleTypeConverter;

impl SimpleTypeConverter {
    fn natural(&self, value: &RawValue) -> BeanHandle {
        match value {
            RawValue::Null => Arc::new(()),
            RawValue::Bool(v) => Arc::new(*v),
            RawValue::Int(v) => Arc::new(*v),
            RawValue::Float(v) => Arc::new(*v),
            RawValue::Str(v) => Arc::new(v.clone()),
            // Unreachable through the creation core; refs are resolved,
            // not converted.
            RawValue::Ref(name) => Arc::new(name.clone()),
        }
    }
}

impl TypeConverter for SimpleTypeConverter {
    fn convert(&self, value: &RawValue, target: Option<&str>) -> BeansResult<BeanHandle> {
        let Some(target) = target else {
            return Ok(self.natural(value));
        };
        let mismatch = |detail: String| BeansError::Conversion {
            target: target.to_string(),
            detail,
        };
        match target {
            "bool" => match value {
                RawValue::Bool(v) => Ok(Arc::new(*v)),
                RawValue::Str(s) => s
                    .parse::<bool>()
                    .map(|v| Arc::new(v) as BeanHandle)
                    .map_err(|e| mismatch(format!("'{s}': {e}"))),
                other => Err(mismatch(format!("{other:?} is not a bool"))),
            },
            "i64" | "i32" | "u64" | "u32" | "usize" => {
                let parsed = match value {
                    RawValue::Int(v) => Ok(*v),
                    RawValue::Str(s) => s
                        .parse::<i64>()
                        .map_err(|e| mismatch(format!("'{s}': {e}"))),
                    other => Err(mismatch(format!("{other:?} is not an integer"))),
                }?;
                match target {
                    "i64" => Ok(Arc::new(parsed)),
                    "i32" => i32::try_from(parsed)
                        .map(|v| Arc::new(v) as BeanHandle)
                        .map_err(|_| mismatch(format!("{parsed} out of range"))),
                    "u64" => u64::try_from(parsed)
                        .map(|v| Arc::new(v) as BeanHandle)
                        .map_err(|_| mismatch(format!("{parsed} out of range"))),
                    "u32" => u32::try_from(parsed)
                        .map(|v| Arc::new(v) as BeanHandle)
                        .map_err(|_| mismatch(format!("{parsed} out of range"))),
                    _ => usize::try_from(parsed)
                        .map(|v| Arc::new(v) as BeanHandle)
                        .map_err(|_| mismatch(format!("{parsed} out of range"))),
                }
            }
            "f64" | "f32" => {
                let parsed = match value {
                    RawValue::Float(v) => Ok(*v),
                    RawValue::Int(v) => Ok(*v as f64),
                    RawValue::Str(s) => s
                        .parse::<f64>()
                        .map_err(|e| mismatch(format!("'{s}': {e}"))),
                    other => Err(mismatch(format!("{other:?} is not a float"))),
                }?;
                if target == "f64" {
                    Ok(Arc::new(parsed))
                } else {
                    Ok(Arc::new(parsed as f32))
                }
            }
            "String" | "str" => match value {
                RawValue::Str(s) => Ok(Arc::new(s.clone())),
                RawValue::Bool(v) => Ok(Arc::new(v.to_string())),
                RawValue::Int(v) => Ok(Arc::new(v.to_string())),
                RawValue::Float(v) => Ok(Arc::new(v.to_string())),
                other => Err(mismatch(format!("{other:?} is not convertible to String"))),
            },
            other => Err(mismatch(format!("unsupported target type '{other}'"))),
        }
    }
}
