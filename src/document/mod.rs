pub mod value;

pub use value::Value;

use crate::common::DOC_ID;
use crate::errors::{DocketError, DocketResult, ErrorKind};
use indexmap::IndexMap;
use std::fmt::{Debug, Formatter};

/// A schema-less record of field/value pairs representing one entity.
///
/// Fields keep their insertion order, so documents render and iterate the
/// way they were built. Every persisted document carries a unique `_id`
/// assigned at insert, plus `created_at`/`updated_at` timestamps stamped by
/// the store.
///
/// # Examples
///
/// ```rust
/// use docket::doc;
///
/// let doc = doc! {
///     name: "Skyline",
///     category: "architecture",
///     views: 120
/// };
/// assert_eq!(doc.get("views"), Some(&docket::document::Value::Int(120)));
/// ```
#[derive(Clone, Default, PartialEq)]
pub struct Document {
    fields: IndexMap<String, Value>,
}

impl Document {
    /// Creates a new empty document.
    pub fn new() -> Self {
        Document {
            fields: IndexMap::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Returns the number of fields in the document.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Puts a field into the document, replacing any previous value.
    ///
    /// # Arguments
    ///
    /// * `key` - The field name; must not be empty
    /// * `value` - Any type convertible into [Value]
    ///
    /// # Errors
    ///
    /// Returns a `ValidationError` for an empty field name.
    pub fn put<T: Into<Value>>(&mut self, key: &str, value: T) -> DocketResult<()> {
        if key.is_empty() {
            log::error!("Attempt to put a value under an empty field name");
            return Err(DocketError::new(
                "field name must not be empty",
                ErrorKind::ValidationError,
            ));
        }
        self.fields.insert(key.to_string(), value.into());
        Ok(())
    }

    /// Gets a field value, or `None` when the field is absent.
    ///
    /// An absent field is a missing value; the predicate matcher treats it
    /// differently from an explicit `Value::Null`.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Removes a field, returning its previous value.
    ///
    /// Keeps the order of the remaining fields intact.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.fields.shift_remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    /// Gets the `_id` value if the document has been assigned one.
    pub fn id(&self) -> Option<&Value> {
        self.fields.get(DOC_ID)
    }

    pub fn has_id(&self) -> bool {
        self.fields.contains_key(DOC_ID)
    }

    /// Merges all fields of `other` into this document.
    ///
    /// Existing fields are overwritten, new fields are appended. This is the
    /// `$set` merge: top-level field replacement, no recursive merging of
    /// nested documents.
    pub fn merge(&mut self, other: &Document) -> DocketResult<()> {
        for (key, value) in other.iter() {
            self.put(key, value.clone())?;
        }
        Ok(())
    }

    /// Iterates fields in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.fields.iter()
    }

    /// Returns the field names in insertion order.
    pub fn field_names(&self) -> Vec<&str> {
        self.fields.keys().map(|k| k.as_str()).collect()
    }
}

impl Debug for Document {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut map = f.debug_map();
        for (key, value) in &self.fields {
            map.entry(key, value);
        }
        map.finish()
    }
}

/// Strips surrounding quotes from a stringified macro key.
///
/// `doc!` accepts both bare identifiers and string-literal keys; the latter
/// stringify with quotes that must not become part of the field name.
pub fn normalize(value: &str) -> String {
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value)
        .to_string()
}

/// Creates a [Document] from key-value pairs.
///
/// Keys may be bare identifiers or string literals (required for operator
/// keys such as `"$gte"`). Values may be literals, expressions in
/// parentheses, nested `{ ... }` documents, or `[ ... ]` arrays.
///
/// # Examples
///
/// ```rust
/// use docket::doc;
///
/// let filter = doc! {
///     category: "architecture",
///     age: { "$gte": 18, "$lte": 65 },
///     tags: ["modern", "urban"]
/// };
/// ```
#[macro_export]
macro_rules! doc {
    // empty document
    () => {
        $crate::document::Document::new()
    };

    // key value pairs
    ($($key:tt : $value:tt),* $(,)?) => {
        {
            #[allow(unused_imports)]
            use $crate::doc_value;

            let mut doc = $crate::document::Document::new();
            $(
                doc.put(&$crate::document::normalize(stringify!($key)), $crate::doc_value!($value))
                .expect(&format!("Failed to put value {} in document", stringify!($value)));
            )*
            doc
        }
    };
}

/// Helper macro to convert values for the `doc!` macro.
/// Handles nested documents, arrays, and expressions.
#[macro_export]
macro_rules! doc_value {
    // nested document
    ({ $($key:tt : $value:tt),* $(,)? }) => {
        $crate::document::Value::Document($crate::doc!{ $($key : $value),* })
    };

    // array of values
    ([ $($value:tt),* $(,)? ]) => {
        $crate::document::Value::Array(vec![$($crate::doc_value!($value)),*])
    };

    // expression (variable, literal, function call, arithmetic in parens)
    ($value:expr) => {
        $crate::document::Value::from($value)
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doc;

    #[test]
    fn test_empty_document() {
        let doc = doc! {};
        assert!(doc.is_empty());
        assert_eq!(doc.len(), 0);
    }

    #[test]
    fn test_put_and_get() {
        let mut doc = Document::new();
        doc.put("name", "Alice").unwrap();
        doc.put("age", 30i64).unwrap();
        assert_eq!(doc.get("name"), Some(&Value::from("Alice")));
        assert_eq!(doc.get("age"), Some(&Value::Int(30)));
        assert_eq!(doc.get("missing"), None);
    }

    #[test]
    fn test_put_empty_field_name_fails() {
        let mut doc = Document::new();
        let result = doc.put("", 1i64);
        assert!(result.is_err());
        assert_eq!(
            result.err().unwrap().kind(),
            &crate::errors::ErrorKind::ValidationError
        );
    }

    #[test]
    fn test_put_overwrites() {
        let mut doc = Document::new();
        doc.put("count", 1i64).unwrap();
        doc.put("count", 2i64).unwrap();
        assert_eq!(doc.get("count"), Some(&Value::Int(2)));
        assert_eq!(doc.len(), 1);
    }

    #[test]
    fn test_insertion_order_preserved() {
        let doc = doc! { z: 1, a: 2, m: 3 };
        assert_eq!(doc.field_names(), vec!["z", "a", "m"]);
    }

    #[test]
    fn test_remove() {
        let mut doc = doc! { a: 1, b: 2, c: 3 };
        let removed = doc.remove("b");
        assert_eq!(removed, Some(Value::Int(2)));
        assert_eq!(doc.field_names(), vec!["a", "c"]);
        assert_eq!(doc.remove("b"), None);
    }

    #[test]
    fn test_merge_overwrites_and_appends() {
        let mut base = doc! { name: "old", kept: true };
        let patch = doc! { name: "new", extra: 1 };
        base.merge(&patch).unwrap();
        assert_eq!(base.get("name"), Some(&Value::from("new")));
        assert_eq!(base.get("kept"), Some(&Value::Bool(true)));
        assert_eq!(base.get("extra"), Some(&Value::Int(1)));
    }

    #[test]
    fn test_id_accessors() {
        let mut doc = doc! { name: "x" };
        assert!(!doc.has_id());
        assert!(doc.id().is_none());
        doc.put("_id", "12345").unwrap();
        assert!(doc.has_id());
        assert_eq!(doc.id(), Some(&Value::from("12345")));
    }

    #[test]
    fn test_doc_macro_nested() {
        let doc = doc! {
            score: 1034,
            location: {
                state: "NY",
                city: "New York"
            },
            category: ["food", "produce", "grocery"]
        };

        let location = doc.get("location").unwrap().as_document().unwrap();
        assert_eq!(location.get("state"), Some(&Value::from("NY")));

        let category = doc.get("category").unwrap().as_array().unwrap();
        assert_eq!(category.len(), 3);
    }

    #[test]
    fn test_doc_macro_string_literal_keys() {
        let filter = doc! { age: { "$gte": 18 } };
        let op = filter.get("age").unwrap().as_document().unwrap();
        assert_eq!(op.get("$gte"), Some(&Value::Int(18)));
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("\"$gte\""), "$gte");
        assert_eq!(normalize("plain"), "plain");
    }

    #[test]
    fn test_structural_equality() {
        let a = doc! { x: 1, y: { z: "deep" } };
        let b = doc! { x: 1, y: { z: "deep" } };
        assert_eq!(a, b);

        let c = doc! { x: 1, y: { z: "other" } };
        assert_ne!(a, c);
    }
}
