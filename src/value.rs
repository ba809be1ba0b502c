//! Runtime values produced by unpacking and consumed by packing, plus the
//! declared type tags checked when a [crate::schema::Schema] is built.

use crate::record::Record;

/// A value held by one field of a [Record].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Value {
    I64(i64),
    U64(u64),
    F64(f64),
    Bool(bool),
    Bytes(Vec<u8>),
    Array(Vec<Value>),
    Struct(Record),
    /// A built field's value before its first pack: not yet computed,
    /// distinct from any real value and from absence.
    Unset,
}

impl Value {
    /// Returns the value as an unsigned integer, accepting non-negative
    /// signed values as well.
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Value::U64(v) => Some(*v),
            Value::I64(v) if *v >= 0 => Some(*v as u64),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::I64(v) => Some(*v),
            Value::U64(v) if *v <= i64::MAX as u64 => Some(*v as i64),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::F64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_struct(&self) -> Option<&Record> {
        match self {
            Value::Struct(r) => Some(r),
            _ => None,
        }
    }

    /// Short description of the value's shape, used in error messages.
    pub(crate) fn describe(&self) -> String {
        match self {
            Value::I64(v) => format!("int {v}"),
            Value::U64(v) => format!("uint {v}"),
            Value::F64(v) => format!("float {v}"),
            Value::Bool(v) => format!("bool {v}"),
            Value::Bytes(b) => format!("{} bytes", b.len()),
            Value::Array(a) => format!("array of {}", a.len()),
            Value::Struct(_) => "struct".to_string(),
            Value::Unset => "unset".to_string(),
        }
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Value::U64(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::I64(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::F64(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Bytes(v)
    }
}

impl From<&[u8]> for Value {
    fn from(v: &[u8]) -> Self {
        Value::Bytes(v.to_vec())
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Bytes(v.as_bytes().to_vec())
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Value::Array(v)
    }
}

impl From<Record> for Value {
    fn from(r: Record) -> Self {
        Value::Struct(r)
    }
}

/// The declared type of a field, validated once at schema build time.
///
/// `NoValue` marks padding-family fields that never store a value;
/// `Any` is an explicit escape that bypasses coverage checks.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeTag {
    Int,
    Uint,
    Float,
    Bool,
    Bytes,
    Array,
    Struct,
    NoValue,
    Any,
    Union(Vec<TypeTag>),
}

impl TypeTag {
    /// Whether a runtime value fits this declared type. `Int` and `Uint`
    /// both accept either integer representation; ranges are checked by the
    /// primitive codec, not here.
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            TypeTag::Any => true,
            TypeTag::Int | TypeTag::Uint => {
                matches!(value, Value::I64(_) | Value::U64(_))
            }
            TypeTag::Float => matches!(value, Value::F64(_)),
            TypeTag::Bool => matches!(value, Value::Bool(_)),
            TypeTag::Bytes => matches!(value, Value::Bytes(_)),
            TypeTag::Array => matches!(value, Value::Array(_)),
            TypeTag::Struct => matches!(value, Value::Struct(_)),
            TypeTag::NoValue => false,
            TypeTag::Union(tags) => tags.iter().any(|t| t.matches(value)),
        }
    }

    /// Whether this declared type covers another tag as one of its cases.
    pub(crate) fn covers(&self, other: &TypeTag) -> bool {
        match self {
            TypeTag::Any => true,
            TypeTag::Union(tags) => tags.iter().any(|t| t.covers(other)),
            _ => self == other,
        }
    }

    /// Whether this declared type is exactly the union of `tags`
    /// (order-insensitive, duplicates ignored). `Any` always qualifies,
    /// as the explicit bypass of the coverage check.
    pub(crate) fn is_union_of(&self, tags: &[TypeTag]) -> bool {
        if *self == TypeTag::Any {
            return true;
        }
        let declared: Vec<&TypeTag> = match self {
            TypeTag::Union(ts) => ts.iter().collect(),
            single => vec![single],
        };
        tags.iter().all(|t| declared.contains(&t))
            && declared.iter().all(|d| tags.contains(d))
    }
}
