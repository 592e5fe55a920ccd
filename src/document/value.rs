use crate::document::Document;
use std::cmp::Ordering;
use std::fmt::{Debug, Display, Formatter};

/// Compare two floats for equality with NaN treated as equal to itself.
#[inline]
fn num_eq_float(a: f64, b: f64) -> bool {
    if a.is_nan() && b.is_nan() {
        true
    } else {
        a == b
    }
}

/// Represents a [Document] field value.
///
/// `Value` is the recursive tagged type used uniformly for document fields
/// and filter literals. It covers the schema-less data model: strings,
/// numbers, booleans, arrays, nested documents, and null.
///
/// # Numbers
///
/// `Int` and `Float` are both "number" values: they compare and test equal
/// numerically across the two variants, so `Value::Int(3)` equals
/// `Value::Float(3.0)`. Every other cross-variant comparison is unordered.
///
/// # Usage
///
/// Values are normally built through `From` conversions or the [`doc!`]
/// macro:
///
/// ```text
/// let v1: Value = 42i64.into();
/// let v2 = Value::from("hello");
/// let doc = doc! { "age": 42, "name": "Alice" };
/// ```
///
/// [`doc!`]: crate::doc
#[derive(Clone, Default)]
pub enum Value {
    /// Represents the absence of a value.
    #[default]
    Null,
    /// Represents a boolean value.
    Bool(bool),
    /// Represents an integer number.
    Int(i64),
    /// Represents a floating point number.
    Float(f64),
    /// Represents a string value.
    String(String),
    /// Represents an array of values.
    Array(Vec<Value>),
    /// Represents a nested document.
    Document(Document),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_number(&self) -> bool {
        matches!(self, Value::Int(_) | Value::Float(_))
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Returns the numeric value as `f64` for either number variant.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&Vec<Value>> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_document(&self) -> Option<&Document> {
        match self {
            Value::Document(d) => Some(d),
            _ => None,
        }
    }

    /// Coerces a scalar value to its string form for pattern matching.
    ///
    /// Strings are used as-is; numbers and booleans use their display
    /// form. `Null`, arrays, and nested documents yield `None`.
    pub fn coerce_to_string(&self) -> Option<String> {
        match self {
            Value::String(s) => Some(s.clone()),
            Value::Int(i) => Some(i.to_string()),
            Value::Float(f) => Some(f.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            Value::Null | Value::Array(_) | Value::Document(_) => None,
        }
    }

    /// Compares two values for range operators.
    ///
    /// Ordering is defined only for same-typed operands: number/number
    /// (numerically, across `Int` and `Float`), string/string, and
    /// bool/bool. Every other pairing is unordered and yields `None`, so
    /// range operators evaluate false without implicit coercion.
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
            (a, b) if a.is_number() && b.is_number() => {
                // mixed Int/Float, compare numerically
                a.as_f64()?.partial_cmp(&b.as_f64()?)
            }
            (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
            (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Document(a), Value::Document(b)) => a == b,
            (a, b) if a.is_number() && b.is_number() => {
                match (a.as_f64(), b.as_f64()) {
                    (Some(a), Some(b)) => num_eq_float(a, b),
                    _ => false,
                }
            }
            _ => false,
        }
    }
}

impl Debug for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(v) => write!(f, "{}", v),
            Value::String(s) => write!(f, "{:?}", s),
            Value::Array(a) => f.debug_list().entries(a.iter()).finish(),
            Value::Document(d) => write!(f, "{:?}", d),
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int(value as i64)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Value::Int(value as i64)
    }
}

impl From<usize> for Value {
    fn from(value: usize) -> Self {
        Value::Int(value as i64)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Value::Array(value)
    }
}

impl From<Document> for Value {
    fn from(value: Document) -> Self {
        Value::Document(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => v.into(),
            None => Value::Null,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doc;

    #[test]
    fn test_numeric_equality_across_variants() {
        assert_eq!(Value::Int(3), Value::Float(3.0));
        assert_eq!(Value::Float(3.0), Value::Int(3));
        assert_ne!(Value::Int(3), Value::Float(3.5));
    }

    #[test]
    fn test_no_cross_type_equality() {
        assert_ne!(Value::Int(1), Value::Bool(true));
        assert_ne!(Value::String("1".to_string()), Value::Int(1));
        assert_ne!(Value::Null, Value::Bool(false));
    }

    #[test]
    fn test_null_equality() {
        assert_eq!(Value::Null, Value::Null);
    }

    #[test]
    fn test_compare_numbers() {
        assert_eq!(Value::Int(2).compare(&Value::Int(3)), Some(Ordering::Less));
        assert_eq!(
            Value::Int(3).compare(&Value::Float(2.5)),
            Some(Ordering::Greater)
        );
        assert_eq!(
            Value::Float(1.5).compare(&Value::Float(1.5)),
            Some(Ordering::Equal)
        );
    }

    #[test]
    fn test_compare_strings() {
        assert_eq!(
            Value::from("abc").compare(&Value::from("abd")),
            Some(Ordering::Less)
        );
    }

    #[test]
    fn test_compare_mismatched_types_is_unordered() {
        assert_eq!(Value::Int(1).compare(&Value::from("1")), None);
        assert_eq!(Value::Bool(true).compare(&Value::Int(1)), None);
        assert_eq!(Value::Null.compare(&Value::Null), None);
    }

    #[test]
    fn test_coerce_to_string() {
        assert_eq!(Value::from("abc").coerce_to_string(), Some("abc".to_string()));
        assert_eq!(Value::Int(42).coerce_to_string(), Some("42".to_string()));
        assert_eq!(Value::Bool(true).coerce_to_string(), Some("true".to_string()));
        assert_eq!(Value::Null.coerce_to_string(), None);
        assert_eq!(Value::Array(vec![]).coerce_to_string(), None);
    }

    #[test]
    fn test_deep_equality_of_nested_documents() {
        let a = doc! { name: "a", meta: { tags: ["x"] } };
        let b = doc! { name: "a", meta: { tags: ["x"] } };
        assert_eq!(Value::Document(a), Value::Document(b));
    }

    #[test]
    fn test_accessors() {
        assert_eq!(Value::Int(1).as_i64(), Some(1));
        assert_eq!(Value::Float(1.5).as_f64(), Some(1.5));
        assert_eq!(Value::Int(2).as_f64(), Some(2.0));
        assert_eq!(Value::from("x").as_str(), Some("x"));
        assert_eq!(Value::Bool(true).as_bool(), Some(true));
        assert!(Value::Null.is_null());
    }

    #[test]
    fn test_from_option() {
        let v: Value = Option::<i64>::None.into();
        assert!(v.is_null());
        let v: Value = Some(7i64).into();
        assert_eq!(v, Value::Int(7));
    }
}
