//! Provides a dynamic value type abstraction.
//!
//! This module gives access to the dynamically typed value which is used by
//! the template engine during rendering.  Contexts are converted into values
//! via [`serde`] when a template is rendered; this can also be triggered
//! manually by using the [`Value::from_serialize`] method:
//!
//! ```
//! # use minitem::value::Value;
//! let value = Value::from_serialize(&[1, 2, 3]);
//! ```
//!
//! Values are immutable objects which are internally reference counted which
//! means they can be copied relatively cheaply.  They are also `Send + Sync`
//! so compiled templates can be rendered from multiple threads at once.
use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use indexmap::IndexMap;

mod serialize;

pub use serialize::ValueSerializer;

pub(crate) type RcType<T> = Arc<T>;

/// The type used for map values.
///
/// Insertion order is preserved so that loops over keyed mappings iterate
/// entries in definition order.
pub type ValueMap = IndexMap<String, Value>;

/// Describes the kind of a [`Value`].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ValueKind {
    /// The undefined marker.
    Undefined,
    /// A boolean.
    Bool,
    /// A number (integer or float).
    Number,
    /// A string.
    String,
    /// An ordered sequence.
    Seq,
    /// A keyed mapping.
    Map,
}

#[derive(Clone)]
pub(crate) enum Repr {
    Undefined,
    Bool(bool),
    I64(i64),
    F64(f64),
    String(RcType<String>),
    Seq(RcType<Vec<Value>>),
    Map(RcType<ValueMap>),
}

/// Represents a dynamically typed value in the template engine.
#[derive(Clone)]
pub struct Value(pub(crate) Repr);

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Repr::Undefined => f.write_str("undefined"),
            Repr::Bool(val) => fmt::Debug::fmt(&val, f),
            Repr::I64(val) => fmt::Debug::fmt(&val, f),
            Repr::F64(val) => fmt::Debug::fmt(&val, f),
            Repr::String(ref val) => fmt::Debug::fmt(val, f),
            Repr::Seq(ref val) => f.debug_list().entries(val.iter()).finish(),
            Repr::Map(ref val) => f.debug_map().entries(val.iter()).finish(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Repr::Undefined => f.write_str("undefined"),
            Repr::Bool(val) => write!(f, "{}", val),
            Repr::I64(val) => write!(f, "{}", val),
            Repr::F64(val) => write!(f, "{}", val),
            Repr::String(ref val) => f.write_str(val),
            Repr::Seq(_) | Repr::Map(_) => fmt::Debug::fmt(self, f),
        }
    }
}

impl Default for Value {
    fn default() -> Value {
        Value::UNDEFINED
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (&self.0, &other.0) {
            (Repr::Undefined, Repr::Undefined) => true,
            (Repr::Bool(a), Repr::Bool(b)) => a == b,
            (Repr::I64(a), Repr::I64(b)) => a == b,
            (Repr::F64(a), Repr::F64(b)) => a == b,
            (Repr::I64(a), Repr::F64(b)) | (Repr::F64(b), Repr::I64(a)) => *a as f64 == *b,
            (Repr::String(a), Repr::String(b)) => a == b,
            (Repr::Seq(a), Repr::Seq(b)) => a == b,
            (Repr::Map(a), Repr::Map(b)) => a == b,
            _ => false,
        }
    }
}

macro_rules! value_from {
    ($src:ty, $dst:ident) => {
        impl From<$src> for Value {
            fn from(val: $src) -> Value {
                Value(Repr::$dst(val as _))
            }
        }
    };
}

value_from!(bool, Bool);
value_from!(i8, I64);
value_from!(i16, I64);
value_from!(i32, I64);
value_from!(i64, I64);
value_from!(u8, I64);
value_from!(u16, I64);
value_from!(u32, I64);
value_from!(f32, F64);
value_from!(f64, F64);

impl From<u64> for Value {
    fn from(val: u64) -> Value {
        match i64::try_from(val) {
            Ok(val) => Value(Repr::I64(val)),
            Err(_) => Value(Repr::F64(val as f64)),
        }
    }
}

impl From<usize> for Value {
    fn from(val: usize) -> Value {
        Value::from(val as u64)
    }
}

impl From<()> for Value {
    fn from(_: ()) -> Value {
        Value::UNDEFINED
    }
}

impl From<&str> for Value {
    fn from(val: &str) -> Value {
        Value(Repr::String(RcType::new(val.to_string())))
    }
}

impl From<String> for Value {
    fn from(val: String) -> Value {
        Value(Repr::String(RcType::new(val)))
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(val: Vec<T>) -> Value {
        Value(Repr::Seq(RcType::new(
            val.into_iter().map(Into::into).collect(),
        )))
    }
}

impl From<ValueMap> for Value {
    fn from(val: ValueMap) -> Value {
        Value(Repr::Map(RcType::new(val)))
    }
}

#[allow(clippy::len_without_is_empty)]
impl Value {
    /// The undefined marker value.
    pub const UNDEFINED: Value = Value(Repr::Undefined);

    /// Creates a value from something that can be serialized.
    ///
    /// Values that fail to serialize become the undefined marker.
    pub fn from_serialize<T: Serialize>(value: &T) -> Value {
        value.serialize(ValueSerializer).unwrap_or(Value::UNDEFINED)
    }

    /// Returns the value kind.
    pub fn kind(&self) -> ValueKind {
        match self.0 {
            Repr::Undefined => ValueKind::Undefined,
            Repr::Bool(_) => ValueKind::Bool,
            Repr::I64(_) | Repr::F64(_) => ValueKind::Number,
            Repr::String(_) => ValueKind::String,
            Repr::Seq(_) => ValueKind::Seq,
            Repr::Map(_) => ValueKind::Map,
        }
    }

    /// Returns `true` if this value is the undefined marker.
    pub fn is_undefined(&self) -> bool {
        matches!(self.0, Repr::Undefined)
    }

    /// If the value is a string, return it.
    pub fn as_str(&self) -> Option<&str> {
        match self.0 {
            Repr::String(ref val) => Some(val.as_str()),
            _ => None,
        }
    }

    /// If the value is a sequence, return its elements.
    pub fn as_seq(&self) -> Option<&[Value]> {
        match self.0 {
            Repr::Seq(ref val) => Some(&val[..]),
            _ => None,
        }
    }

    /// Is this value truthy?
    ///
    /// The undefined marker, `false`, empty strings, numeric zero and empty
    /// collections are falsy; every other value is truthy.
    pub fn is_true(&self) -> bool {
        match self.0 {
            Repr::Undefined => false,
            Repr::Bool(val) => val,
            Repr::I64(val) => val != 0,
            Repr::F64(val) => val != 0.0,
            Repr::String(ref val) => !val.is_empty(),
            Repr::Seq(ref val) => !val.is_empty(),
            Repr::Map(ref val) => !val.is_empty(),
        }
    }

    /// Returns the length of the contained value, if it has one.
    pub fn len(&self) -> Option<usize> {
        match self.0 {
            Repr::String(ref val) => Some(val.chars().count()),
            Repr::Seq(ref val) => Some(val.len()),
            Repr::Map(ref val) => Some(val.len()),
            _ => None,
        }
    }

    /// Looks up an attribute by name.
    ///
    /// Anything missing (and any lookup on a non-mapping value) produces the
    /// undefined marker instead of failing.
    pub fn get_attr(&self, key: &str) -> Value {
        match self.0 {
            Repr::Map(ref items) => items.get(key).cloned().unwrap_or(Value::UNDEFINED),
            _ => Value::UNDEFINED,
        }
    }

    /// Returns the values to iterate for a loop, in order.
    ///
    /// Sequences yield their elements, mappings their entry values in
    /// insertion order.  Everything else iterates zero times.
    pub(crate) fn iter_values(&self) -> Vec<Value> {
        match self.0 {
            Repr::Seq(ref items) => items.to_vec(),
            Repr::Map(ref items) => items.values().cloned().collect(),
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_undefined_stringifies() {
        assert_eq!(Value::UNDEFINED.to_string(), "undefined");
    }

    #[test]
    fn test_truthiness() {
        assert!(!Value::UNDEFINED.is_true());
        assert!(!Value::from(false).is_true());
        assert!(!Value::from("").is_true());
        assert!(!Value::from(0).is_true());
        assert!(!Value::from(0.0).is_true());
        assert!(!Value::from(Vec::<Value>::new()).is_true());
        assert!(!Value::from(ValueMap::new()).is_true());
        assert!(Value::from(true).is_true());
        assert!(Value::from("x").is_true());
        assert!(Value::from(-1).is_true());
        assert!(Value::from(vec![0]).is_true());
    }

    #[test]
    fn test_from_serialize() {
        let value = Value::from_serialize(&vec![1, 2, 3]);
        assert_eq!(value.len(), Some(3));
        assert_eq!(value.as_seq().unwrap()[0], Value::from(1));

        #[derive(serde::Serialize)]
        struct Point {
            x: i32,
            y: i32,
        }
        let value = Value::from_serialize(&Point { x: 1, y: -1 });
        assert_eq!(value.kind(), ValueKind::Map);
        assert_eq!(value.get_attr("y"), Value::from(-1));
    }

    #[test]
    fn test_get_attr_missing() {
        let value = Value::from_serialize(&serde_json::json!({"person": {}}));
        assert!(value.get_attr("person").get_attr("name").is_undefined());
        assert!(Value::from(42).get_attr("anything").is_undefined());
    }

    #[test]
    fn test_map_iteration_order() {
        let mut map = ValueMap::new();
        map.insert("z".into(), Value::from(1));
        map.insert("a".into(), Value::from(2));
        map.insert("m".into(), Value::from(3));
        let values = Value::from(map).iter_values();
        assert_eq!(values, vec![Value::from(1), Value::from(2), Value::from(3)]);
    }
}
