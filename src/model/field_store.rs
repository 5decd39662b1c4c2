//! Field storage shared by every record variant
//!
//! Values are not type-checked on write. A typed read against a value of an
//! incompatible kind fails with [`Error::TypeMismatch`] instead of coercing.
//! Nested records arrive from the codec as raw JSON and are promoted to
//! decoded records in place the first time they are read.

use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;

use serde::ser::{Error as _, Serialize, SerializeMap, Serializer};
use serde_json::value::RawValue;

use super::{FieldName, Record};
use crate::codec;
use crate::error::{Error, Result, ServiceError};

/// A decoded nested value stored behind a type-erased box
pub trait NestedValue: Any + fmt::Debug + Send + Sync {
    fn as_any(&self) -> &dyn Any;

    fn clone_box(&self) -> Box<dyn NestedValue>;

    fn to_json(&self) -> serde_json::Result<serde_json::Value>;

    fn is_empty(&self) -> bool;
}

/// A single decoded nested record
#[derive(Debug, Clone)]
struct One<R>(R);

/// A decoded nested record list
#[derive(Debug, Clone)]
struct Many<R>(Vec<R>);

impl<R: Record> NestedValue for One<R> {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn clone_box(&self) -> Box<dyn NestedValue> {
        Box::new(self.clone())
    }

    fn to_json(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(self.0.fields())
    }

    fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<R: Record> NestedValue for Many<R> {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn clone_box(&self) -> Box<dyn NestedValue> {
        Box::new(self.clone())
    }

    fn to_json(&self) -> serde_json::Result<serde_json::Value> {
        self.0
            .iter()
            .map(|record| serde_json::to_value(record.fields()))
            .collect::<serde_json::Result<Vec<_>>>()
            .map(serde_json::Value::Array)
    }

    fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A dynamically-typed field value
#[derive(Debug)]
pub enum FieldValue {
    Null,
    Text(String),
    Integer(i64),
    Double(f64),
    Boolean(bool),
    Map(BTreeMap<String, String>),
    /// Undecoded JSON for a nested field
    Raw(Box<RawValue>),
    /// A nested record (or record list) decoded on demand
    Decoded(Box<dyn NestedValue>),
}

impl FieldValue {
    /// Short name of the stored kind, for diagnostics
    pub fn type_name(&self) -> &'static str {
        match self {
            FieldValue::Null => "null",
            FieldValue::Text(_) => "string",
            FieldValue::Integer(_) => "integer",
            FieldValue::Double(_) => "double",
            FieldValue::Boolean(_) => "boolean",
            FieldValue::Map(_) => "map",
            FieldValue::Raw(_) => "raw JSON",
            FieldValue::Decoded(_) => "record",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }
}

impl Clone for FieldValue {
    fn clone(&self) -> Self {
        match self {
            FieldValue::Null => FieldValue::Null,
            FieldValue::Text(s) => FieldValue::Text(s.clone()),
            FieldValue::Integer(i) => FieldValue::Integer(*i),
            FieldValue::Double(d) => FieldValue::Double(*d),
            FieldValue::Boolean(b) => FieldValue::Boolean(*b),
            FieldValue::Map(m) => FieldValue::Map(m.clone()),
            FieldValue::Raw(raw) => FieldValue::Raw(raw.clone()),
            FieldValue::Decoded(value) => FieldValue::Decoded(value.clone_box()),
        }
    }
}

impl PartialEq for FieldValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (FieldValue::Null, FieldValue::Null) => true,
            (FieldValue::Text(a), FieldValue::Text(b)) => a == b,
            (FieldValue::Integer(a), FieldValue::Integer(b)) => a == b,
            (FieldValue::Double(a), FieldValue::Double(b)) => a == b,
            (FieldValue::Boolean(a), FieldValue::Boolean(b)) => a == b,
            (FieldValue::Map(a), FieldValue::Map(b)) => a == b,
            (FieldValue::Raw(a), FieldValue::Raw(b)) => a.get() == b.get(),
            (FieldValue::Decoded(a), FieldValue::Decoded(b)) => match (a.to_json(), b.to_json()) {
                (Ok(a), Ok(b)) => a == b,
                _ => false,
            },
            _ => false,
        }
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Integer(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Double(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Boolean(value)
    }
}

impl From<BTreeMap<String, String>> for FieldValue {
    fn from(value: BTreeMap<String, String>) -> Self {
        FieldValue::Map(value)
    }
}

impl From<Box<RawValue>> for FieldValue {
    fn from(value: Box<RawValue>) -> Self {
        FieldValue::Raw(value)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(FieldValue::Null, Into::into)
    }
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            FieldValue::Null => serializer.serialize_unit(),
            FieldValue::Text(s) => serializer.serialize_str(s),
            FieldValue::Integer(i) => serializer.serialize_i64(*i),
            FieldValue::Double(d) => serializer.serialize_f64(*d),
            FieldValue::Boolean(b) => serializer.serialize_bool(*b),
            FieldValue::Map(m) => serializer.collect_map(m),
            FieldValue::Raw(raw) => raw.serialize(serializer),
            FieldValue::Decoded(value) => value
                .to_json()
                .map_err(S::Error::custom)?
                .serialize(serializer),
        }
    }
}

/// Mapping from a record's field enum to its stored values
#[derive(Debug, Clone, PartialEq)]
pub struct FieldStore<F: FieldName> {
    values: BTreeMap<F, FieldValue>,
}

impl<F: FieldName> Default for FieldStore<F> {
    fn default() -> Self {
        Self {
            values: BTreeMap::new(),
        }
    }
}

impl<F: FieldName> FieldStore<F> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn contains(&self, field: F) -> bool {
        self.values.contains_key(&field)
    }

    /// Stored value, unmodified
    pub fn get(&self, field: F) -> Option<&FieldValue> {
        self.values.get(&field)
    }

    /// Insert or overwrite a value
    pub fn set(&mut self, field: F, value: impl Into<FieldValue>) {
        self.values.insert(field, value.into());
    }

    pub fn remove(&mut self, field: F) -> Option<FieldValue> {
        self.values.remove(&field)
    }

    pub fn iter(&self) -> impl Iterator<Item = (F, &FieldValue)> {
        self.values.iter().map(|(field, value)| (*field, value))
    }

    /// Read a field as a string
    ///
    /// Scalars are stringified and raw nested JSON is returned as text. Maps
    /// and decoded records are not string-representable.
    pub fn get_as_string(&self, field: F) -> Result<Option<String>> {
        match self.values.get(&field) {
            None | Some(FieldValue::Null) => Ok(None),
            Some(FieldValue::Text(s)) => Ok(Some(s.clone())),
            Some(FieldValue::Integer(i)) => Ok(Some(i.to_string())),
            Some(FieldValue::Double(d)) => Ok(Some(d.to_string())),
            Some(FieldValue::Boolean(b)) => Ok(Some(b.to_string())),
            Some(FieldValue::Raw(raw)) => Ok(Some(raw.get().to_string())),
            Some(other) => Err(Error::type_mismatch(
                field.as_str(),
                "string",
                other.type_name(),
            )),
        }
    }

    /// Read a free-form key/value field
    pub fn get_as_map(&self, field: F) -> Result<Option<&BTreeMap<String, String>>> {
        match self.values.get(&field) {
            None | Some(FieldValue::Null) => Ok(None),
            Some(FieldValue::Map(m)) => Ok(Some(m)),
            Some(other) => Err(Error::type_mismatch(field.as_str(), "map", other.type_name())),
        }
    }

    /// Read an integer; numeric strings are accepted
    pub fn get_as_i64(&self, field: F) -> Result<Option<i64>> {
        match self.values.get(&field) {
            None | Some(FieldValue::Null) => Ok(None),
            Some(FieldValue::Integer(i)) => Ok(Some(*i)),
            Some(FieldValue::Text(s)) => s
                .trim()
                .parse()
                .map(Some)
                .map_err(|_| Error::type_mismatch(field.as_str(), "integer", "non-numeric string")),
            Some(other) => Err(Error::type_mismatch(
                field.as_str(),
                "integer",
                other.type_name(),
            )),
        }
    }

    pub fn get_as_f64(&self, field: F) -> Result<Option<f64>> {
        match self.values.get(&field) {
            None | Some(FieldValue::Null) => Ok(None),
            Some(FieldValue::Double(d)) => Ok(Some(*d)),
            Some(FieldValue::Integer(i)) => Ok(Some(*i as f64)),
            Some(other) => Err(Error::type_mismatch(field.as_str(), "double", other.type_name())),
        }
    }

    /// Read a boolean; the strings "true" and "false" are accepted
    pub fn get_as_bool(&self, field: F) -> Result<Option<bool>> {
        match self.values.get(&field) {
            None | Some(FieldValue::Null) => Ok(None),
            Some(FieldValue::Boolean(b)) => Ok(Some(*b)),
            Some(FieldValue::Text(s)) if s.eq_ignore_ascii_case("true") => Ok(Some(true)),
            Some(FieldValue::Text(s)) if s.eq_ignore_ascii_case("false") => Ok(Some(false)),
            Some(other) => Err(Error::type_mismatch(
                field.as_str(),
                "boolean",
                other.type_name(),
            )),
        }
    }

    /// Nested record, decoded on first access and cached in place
    ///
    /// An absent or null field yields an empty record.
    pub fn nested<T: Record>(&mut self, field: F) -> Result<&T> {
        if !self.materialize(field, decode_one::<T>)? {
            self.values
                .insert(field, FieldValue::Decoded(Box::new(One(T::default()))));
        }
        self.downcast::<One<T>>(field, T::NAME).map(|one| &one.0)
    }

    /// Nested record, or `None` when the field is absent or null
    pub fn nested_opt<T: Record>(&mut self, field: F) -> Result<Option<&T>> {
        if !self.materialize(field, decode_one::<T>)? {
            return Ok(None);
        }
        self.downcast::<One<T>>(field, T::NAME).map(|one| Some(&one.0))
    }

    /// Nested record list, decoded on first access and cached in place
    pub fn nested_list<T: Record>(&mut self, field: F) -> Result<&[T]> {
        if !self.materialize(field, decode_many::<T>)? {
            self.values
                .insert(field, FieldValue::Decoded(Box::new(Many::<T>(Vec::new()))));
        }
        self.downcast::<Many<T>>(field, T::NAME).map(|many| many.0.as_slice())
    }

    pub fn set_record<T: Record>(&mut self, field: F, record: T) {
        self.values
            .insert(field, FieldValue::Decoded(Box::new(One(record))));
    }

    pub fn set_records<T: Record>(&mut self, field: F, records: Vec<T>) {
        self.values
            .insert(field, FieldValue::Decoded(Box::new(Many(records))));
    }

    /// Whether a nested field has been promoted to a decoded value
    pub fn is_decoded(&self, field: F) -> bool {
        matches!(self.values.get(&field), Some(FieldValue::Decoded(_)))
    }

    /// Whether a nested field carries no content (absent, null, `{}`, `[]`, `""`)
    pub fn nested_is_empty(&self, field: F) -> bool {
        match self.values.get(&field) {
            None | Some(FieldValue::Null) => true,
            Some(FieldValue::Raw(raw)) => codec::is_empty_json(raw.get()),
            Some(FieldValue::Decoded(value)) => value.is_empty(),
            Some(_) => false,
        }
    }

    /// Promote a raw nested value to its decoded form
    ///
    /// Returns `false` when there is nothing to decode.
    fn materialize<N: NestedValue>(
        &mut self,
        field: F,
        decode: impl FnOnce(&RawValue) -> Result<N>,
    ) -> Result<bool> {
        let decoded = match self.values.get(&field) {
            None | Some(FieldValue::Null) => return Ok(false),
            Some(FieldValue::Decoded(_)) => return Ok(true),
            Some(FieldValue::Raw(raw)) => decode(raw)?,
            Some(other) => {
                return Err(Error::type_mismatch(
                    field.as_str(),
                    "nested record",
                    other.type_name(),
                ))
            }
        };
        self.values.insert(field, FieldValue::Decoded(Box::new(decoded)));
        Ok(true)
    }

    fn downcast<N: NestedValue>(&self, field: F, expected: &'static str) -> Result<&N> {
        match self.values.get(&field) {
            Some(FieldValue::Decoded(value)) => value
                .as_any()
                .downcast_ref::<N>()
                .ok_or_else(|| Error::type_mismatch(field.as_str(), expected, "another record type")),
            Some(other) => Err(Error::type_mismatch(field.as_str(), expected, other.type_name())),
            None => Err(Error::type_mismatch(field.as_str(), expected, "nothing")),
        }
    }
}

fn decode_one<T: Record>(raw: &RawValue) -> Result<One<T>> {
    codec::decode_nested::<T>(raw)
        .map(One)
        .map_err(|e| ServiceError::parse(T::NAME, e).into())
}

fn decode_many<T: Record>(raw: &RawValue) -> Result<Many<T>> {
    codec::decode_nested_list::<T>(raw)
        .map(Many)
        .map_err(|e| ServiceError::parse(T::NAME, e).into())
}

impl<F: FieldName> Serialize for FieldStore<F> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        for (field, value) in &self.values {
            // Defaulted nested values must not change the wire form
            if let FieldValue::Decoded(nested) = value {
                if nested.is_empty() {
                    continue;
                }
            }
            map.serialize_entry(field.as_str(), value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ActivityField, Identity, IdentityField};

    #[test]
    fn test_get_returns_stored_value_unmodified() {
        let mut store = FieldStore::<ActivityField>::new();
        assert!(store.get(ActivityField::Title).is_none());

        store.set(ActivityField::Title, "hello");
        store.set(ActivityField::PostedTime, 1000_i64);
        assert_eq!(
            store.get(ActivityField::Title),
            Some(&FieldValue::Text("hello".to_string()))
        );
        assert_eq!(store.get(ActivityField::PostedTime), Some(&FieldValue::Integer(1000)));

        store.set(ActivityField::Title, "again");
        assert_eq!(store.len(), 2);
        assert_eq!(store.get_as_string(ActivityField::Title).unwrap().as_deref(), Some("again"));
    }

    #[test]
    fn test_get_as_string_null_rule() {
        let mut store = FieldStore::<ActivityField>::new();
        assert_eq!(store.get_as_string(ActivityField::Body).unwrap(), None);
        store.set(ActivityField::Body, None::<String>);
        assert_eq!(store.get_as_string(ActivityField::Body).unwrap(), None);
    }

    #[test]
    fn test_get_as_string_stringifies_scalars() {
        let mut store = FieldStore::<ActivityField>::new();
        store.set(ActivityField::TotalNumberOfLikes, 3_i64);
        store.set(ActivityField::Liked, true);
        assert_eq!(
            store.get_as_string(ActivityField::TotalNumberOfLikes).unwrap().as_deref(),
            Some("3")
        );
        assert_eq!(store.get_as_string(ActivityField::Liked).unwrap().as_deref(), Some("true"));
    }

    #[test]
    fn test_get_as_string_rejects_map() {
        let mut store = FieldStore::<ActivityField>::new();
        let mut params = BTreeMap::new();
        params.insert("k".to_string(), "v".to_string());
        store.set(ActivityField::TemplateParams, params);

        let err = store.get_as_string(ActivityField::TemplateParams).unwrap_err();
        match err {
            Error::TypeMismatch {
                field,
                expected,
                found,
            } => {
                assert_eq!(field, "templateParams");
                assert_eq!(expected, "string");
                assert_eq!(found, "map");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        // State is untouched by the failed read
        assert!(store.get_as_map(ActivityField::TemplateParams).unwrap().is_some());
    }

    #[test]
    fn test_get_as_string_rejects_decoded_record() {
        let mut identity = Identity::new();
        identity.fields_mut().set(IdentityField::Id, "id-1");
        let mut store = FieldStore::<ActivityField>::new();
        store.set_record(ActivityField::PosterIdentity, identity);

        let err = store.get_as_string(ActivityField::PosterIdentity).unwrap_err();
        assert!(matches!(
            err,
            Error::TypeMismatch {
                field: "posterIdentity",
                expected: "string",
                found: "record",
            }
        ));
        assert!(store.is_decoded(ActivityField::PosterIdentity));
    }

    #[test]
    fn test_get_as_string_rejects_lazily_decoded_record() {
        let mut activity: crate::model::Activity =
            codec::decode_one(r#"{"posterIdentity":{"id":"id-1"}}"#).unwrap();
        let store = activity.fields_mut();
        // Raw nested JSON is still string-representable
        assert_eq!(
            store.get_as_string(ActivityField::PosterIdentity).unwrap().as_deref(),
            Some(r#"{"id":"id-1"}"#)
        );

        store.nested::<Identity>(ActivityField::PosterIdentity).unwrap();
        assert!(matches!(
            store.get_as_string(ActivityField::PosterIdentity),
            Err(Error::TypeMismatch { found: "record", .. })
        ));
    }

    #[test]
    fn test_typed_reads_fail_explicitly() {
        let mut store = FieldStore::<ActivityField>::new();
        store.set(ActivityField::PostedTime, "yesterday");
        store.set(ActivityField::Priority, "high");
        store.set(ActivityField::Liked, 1_i64);

        assert!(matches!(
            store.get_as_i64(ActivityField::PostedTime),
            Err(Error::TypeMismatch { .. })
        ));
        assert!(matches!(
            store.get_as_f64(ActivityField::Priority),
            Err(Error::TypeMismatch { .. })
        ));
        assert!(matches!(
            store.get_as_bool(ActivityField::Liked),
            Err(Error::TypeMismatch { .. })
        ));
        assert!(matches!(
            store.get_as_map(ActivityField::Liked),
            Err(Error::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_best_effort_coercions() {
        let mut store = FieldStore::<ActivityField>::new();
        store.set(ActivityField::TotalNumberOfComments, " 12 ");
        store.set(ActivityField::Priority, 2_i64);
        store.set(ActivityField::Liked, "TRUE");

        assert_eq!(store.get_as_i64(ActivityField::TotalNumberOfComments).unwrap(), Some(12));
        assert_eq!(store.get_as_f64(ActivityField::Priority).unwrap(), Some(2.0));
        assert_eq!(store.get_as_bool(ActivityField::Liked).unwrap(), Some(true));
    }

    #[test]
    fn test_nested_on_scalar_is_type_mismatch() {
        let mut store = FieldStore::<ActivityField>::new();
        store.set(ActivityField::PosterIdentity, 42_i64);
        let err = store.nested::<Identity>(ActivityField::PosterIdentity).unwrap_err();
        assert!(matches!(err, Error::TypeMismatch { field: "posterIdentity", .. }));
    }

    #[test]
    fn test_nested_absent_yields_empty_record() {
        let mut store = FieldStore::<ActivityField>::new();
        let identity = store.nested::<Identity>(ActivityField::PosterIdentity).unwrap();
        assert!(identity.is_empty());
        assert!(store.nested_is_empty(ActivityField::PosterIdentity));
        // Defaulted value is not serialized
        assert_eq!(serde_json::to_string(&store).unwrap(), "{}");
    }

    #[test]
    fn test_nested_opt_absent_is_none() {
        let mut store = FieldStore::<ActivityField>::new();
        assert!(store
            .nested_opt::<Identity>(ActivityField::PosterIdentity)
            .unwrap()
            .is_none());
        assert!(!store.contains(ActivityField::PosterIdentity));
    }

    #[test]
    fn test_set_record_is_readable_and_serialized() {
        let mut identity = Identity::new();
        identity.fields_mut().set(IdentityField::Id, "id-1");

        let mut store = FieldStore::<ActivityField>::new();
        store.set_record(ActivityField::PosterIdentity, identity);
        assert!(store.is_decoded(ActivityField::PosterIdentity));

        let read = store.nested::<Identity>(ActivityField::PosterIdentity).unwrap();
        assert_eq!(read.id().unwrap().as_deref(), Some("id-1"));
        assert_eq!(
            serde_json::to_string(&store).unwrap(),
            r#"{"posterIdentity":{"id":"id-1"}}"#
        );
    }
}
