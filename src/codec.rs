//! JSON codec for field-backed records
//!
//! Decoding is shallow: scalar fields are parsed into typed values, nested
//! object and array fields are kept as raw JSON text and only decoded when
//! their accessor is first called (see [`FieldStore::nested`]). A malformed
//! document never yields a partially populated record.
//!
//! # Example
//!
//! ```
//! use social_client::codec;
//! use social_client::model::Comment;
//!
//! let comment: Comment = codec::decode_one(r#"{"id":"1","text":"hello","postedTime":1000}"#).unwrap();
//! assert_eq!(comment.text().unwrap().as_deref(), Some("hello"));
//! ```

use std::borrow::Cow;
use std::collections::BTreeMap;

use serde_json::value::RawValue;
use serde_json::Value;

use crate::error::CodecError;
use crate::model::{FieldKind, FieldName, FieldStore, FieldValue, Record};

#[cfg(test)]
thread_local! {
    static NESTED_PARSES: std::cell::Cell<usize> = const { std::cell::Cell::new(0) };
}

/// Number of lazy nested decodes performed on this thread
#[cfg(test)]
pub(crate) fn nested_parse_count() -> usize {
    NESTED_PARSES.with(|count| count.get())
}

#[cfg(test)]
fn record_nested_parse() {
    NESTED_PARSES.with(|count| count.set(count.get() + 1));
}

/// Decode a JSON object into a record of the requested variant
pub fn decode_one<R: Record>(json: &str) -> Result<R, CodecError> {
    decode_object(json)
}

/// Decode a JSON array into records, preserving order
///
/// Fails as a whole if any element is malformed.
pub fn decode_many<R: Record>(json: &str) -> Result<Vec<R>, CodecError> {
    let items: Vec<Box<RawValue>> = serde_json::from_str(json)?;
    items.iter().map(|raw| decode_object::<R>(raw.get())).collect()
}

/// Serialize the record's current fields into a JSON object
pub fn encode<R: Record>(record: &R) -> Result<String, CodecError> {
    serde_json::to_string(record.fields()).map_err(|source| CodecError::Encode {
        record: R::NAME,
        source,
    })
}

/// Same as [`encode`], as a JSON value
pub fn encode_value<R: Record>(record: &R) -> Result<Value, CodecError> {
    serde_json::to_value(record.fields()).map_err(|source| CodecError::Encode {
        record: R::NAME,
        source,
    })
}

/// Decode a raw nested object stored in a field
pub(crate) fn decode_nested<R: Record>(raw: &RawValue) -> Result<R, CodecError> {
    #[cfg(test)]
    record_nested_parse();

    let text = nested_text(raw)?;
    if is_empty_json(&text) {
        return Ok(R::default());
    }
    decode_object(&text)
}

/// Decode a raw nested array stored in a field
pub(crate) fn decode_nested_list<R: Record>(raw: &RawValue) -> Result<Vec<R>, CodecError> {
    #[cfg(test)]
    record_nested_parse();

    let text = nested_text(raw)?;
    if is_empty_json(&text) {
        return Ok(Vec::new());
    }
    decode_many(&text)
}

/// Whether a JSON fragment carries no content
///
/// Empty objects and arrays may carry any amount of whitespace; a JSON string
/// is judged by the JSON text it embeds.
pub(crate) fn is_empty_json(text: &str) -> bool {
    let text = text.trim();
    if text.is_empty() || text == "null" {
        return true;
    }
    let inner = text
        .strip_prefix('{')
        .and_then(|t| t.strip_suffix('}'))
        .or_else(|| text.strip_prefix('[').and_then(|t| t.strip_suffix(']')));
    if let Some(inner) = inner {
        return inner.trim().is_empty();
    }
    if text.starts_with('"') {
        return serde_json::from_str::<String>(text)
            .map(|embedded| is_empty_json(&embedded))
            .unwrap_or(false);
    }
    false
}

/// Nested JSON, unwrapping values the server sent as an embedded JSON string
fn nested_text(raw: &RawValue) -> Result<Cow<'_, str>, CodecError> {
    let text = raw.get();
    if text.trim_start().starts_with('"') {
        Ok(Cow::Owned(serde_json::from_str::<String>(text)?))
    } else {
        Ok(Cow::Borrowed(text))
    }
}

fn decode_object<R: Record>(json: &str) -> Result<R, CodecError> {
    // The whole document is validated here, before any field is stored
    let entries: BTreeMap<String, Box<RawValue>> = serde_json::from_str(json)?;

    let mut fields = FieldStore::<R::Field>::new();
    for (key, raw) in entries {
        let Some(field) = R::Field::from_key(&key) else {
            tracing::trace!(record = R::NAME, key = %key, "ignoring unknown field");
            continue;
        };
        fields.set(field, field_value(field.kind(), raw)?);
    }
    Ok(R::from_fields(fields))
}

fn field_value(kind: FieldKind, raw: Box<RawValue>) -> Result<FieldValue, CodecError> {
    let text = raw.get().trim();
    if text == "null" {
        return Ok(FieldValue::Null);
    }
    if kind.is_nested() {
        return Ok(FieldValue::Raw(raw));
    }
    // Structured JSON under a scalar field is kept verbatim
    if kind != FieldKind::Map && (text.starts_with('{') || text.starts_with('[')) {
        return Ok(FieldValue::Raw(raw));
    }

    let value = match serde_json::from_str::<Value>(text)? {
        Value::Null => FieldValue::Null,
        Value::Bool(b) => FieldValue::Boolean(b),
        Value::Number(n) if kind == FieldKind::Double => {
            n.as_f64().map_or(FieldValue::Null, FieldValue::Double)
        }
        Value::Number(n) => match n.as_i64() {
            Some(i) => FieldValue::Integer(i),
            None => n.as_f64().map_or(FieldValue::Null, FieldValue::Double),
        },
        Value::String(s) => FieldValue::Text(s),
        Value::Object(map) => FieldValue::Map(
            map.into_iter()
                .map(|(k, v)| {
                    let v = match v {
                        Value::String(s) => s,
                        other => other.to_string(),
                    };
                    (k, v)
                })
                .collect(),
        ),
        Value::Array(_) => FieldValue::Raw(raw),
    };
    Ok(value)
}
