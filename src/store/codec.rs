use crate::document::{Document, Value};
use crate::errors::{DocketError, DocketResult, ErrorKind};

/// Converts a [Value] to its on-disk JSON form.
///
/// # Errors
///
/// `EncodingError` for non-finite floats, which have no JSON representation.
pub(crate) fn value_to_json(value: &Value) -> DocketResult<serde_json::Value> {
    match value {
        Value::Null => Ok(serde_json::Value::Null),
        Value::Bool(b) => Ok(serde_json::Value::Bool(*b)),
        Value::Int(i) => Ok(serde_json::Value::Number((*i).into())),
        Value::Float(f) => serde_json::Number::from_f64(*f)
            .map(serde_json::Value::Number)
            .ok_or_else(|| {
                log::error!("Cannot encode non-finite float {} as JSON", f);
                DocketError::new(
                    &format!("cannot encode non-finite float: {}", f),
                    ErrorKind::EncodingError,
                )
            }),
        Value::String(s) => Ok(serde_json::Value::String(s.clone())),
        Value::Array(items) => {
            let mut array = Vec::with_capacity(items.len());
            for item in items {
                array.push(value_to_json(item)?);
            }
            Ok(serde_json::Value::Array(array))
        }
        Value::Document(doc) => document_to_json(doc),
    }
}

pub(crate) fn document_to_json(doc: &Document) -> DocketResult<serde_json::Value> {
    let mut map = serde_json::Map::with_capacity(doc.len());
    for (key, value) in doc.iter() {
        map.insert(key.clone(), value_to_json(value)?);
    }
    Ok(serde_json::Value::Object(map))
}

/// Converts on-disk JSON back to a [Value].
///
/// Integral JSON numbers become `Int`, everything else `Float`, so values
/// written by [value_to_json] read back structurally equal.
pub(crate) fn value_from_json(json: &serde_json::Value) -> DocketResult<Value> {
    match json {
        serde_json::Value::Null => Ok(Value::Null),
        serde_json::Value::Bool(b) => Ok(Value::Bool(*b)),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(Value::Int(i))
            } else if let Some(f) = n.as_f64() {
                Ok(Value::Float(f))
            } else {
                // u64 beyond i64::MAX
                Err(DocketError::new(
                    &format!("number out of supported range: {}", n),
                    ErrorKind::EncodingError,
                ))
            }
        }
        serde_json::Value::String(s) => Ok(Value::String(s.clone())),
        serde_json::Value::Array(items) => {
            let mut array = Vec::with_capacity(items.len());
            for item in items {
                array.push(value_from_json(item)?);
            }
            Ok(Value::Array(array))
        }
        serde_json::Value::Object(_) => Ok(Value::Document(document_from_json(json)?)),
    }
}

pub(crate) fn document_from_json(json: &serde_json::Value) -> DocketResult<Document> {
    let map = json.as_object().ok_or_else(|| {
        DocketError::new(
            "expected a JSON object for a document",
            ErrorKind::EncodingError,
        )
    })?;
    let mut doc = Document::new();
    for (key, value) in map {
        doc.put(key, value_from_json(value)?)?;
    }
    Ok(doc)
}

/// Serializes a whole collection as a JSON array of documents.
pub(crate) fn collection_to_json(docs: &[Document]) -> DocketResult<String> {
    let mut array = Vec::with_capacity(docs.len());
    for doc in docs {
        array.push(document_to_json(doc)?);
    }
    Ok(serde_json::Value::Array(array).to_string())
}

/// Deserializes a whole collection from its JSON array form.
///
/// # Errors
///
/// `EncodingError` when the payload is not an array of objects; callers
/// dealing with the backing medium wrap this into a `StorageError`.
pub(crate) fn collection_from_json(text: &str) -> DocketResult<Vec<Document>> {
    let json: serde_json::Value = serde_json::from_str(text)?;
    let items = json.as_array().ok_or_else(|| {
        DocketError::new(
            "expected a JSON array of documents",
            ErrorKind::EncodingError,
        )
    })?;
    let mut docs = Vec::with_capacity(items.len());
    for item in items {
        docs.push(document_from_json(item)?);
    }
    Ok(docs)
}
