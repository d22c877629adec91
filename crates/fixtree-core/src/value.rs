//! Entity descriptions.
//!
//! A [`Description`] maps field names to [`FieldValue`]s. Whether a field is a
//! relationship or a plain column is never decided here: the value shape only
//! says what the caller handed in, the model's relationship table decides what
//! it means.

use indexmap::IndexMap;
use indexmap::map::{IntoIter, Iter};
use serde_json::Value;

use crate::error::{FixtureError, FixtureResult};
use crate::record::{PendingRecord, Record};

/// Storage-level field values, in insertion order.
pub type Row = IndexMap<String, Value>;

/// A single value inside an entity description.
#[derive(Debug, Clone)]
pub enum FieldValue {
	/// Explicit `null`.
	Null,
	/// A scalar (string, number, boolean).
	Scalar(Value),
	/// A nested entity description.
	Nested(Description),
	/// An ordered sequence of values.
	List(Vec<FieldValue>),
	/// An already persisted record.
	Record(Record),
	/// A record that is still being resolved.
	Pending(PendingRecord),
}

impl FieldValue {
	/// Returns true for [`FieldValue::Null`].
	pub fn is_null(&self) -> bool {
		matches!(self, Self::Null)
	}

	/// Returns the nested description, if this is one.
	pub fn as_description(&self) -> Option<&Description> {
		match self {
			Self::Nested(description) => Some(description),
			_ => None,
		}
	}

	/// Converts the value into something a storage engine can hold.
	///
	/// Nested descriptions and sequences convert to JSON objects and arrays as
	/// long as they only contain plain data. Records and pending records have
	/// no storage representation and yield `None`.
	pub fn to_storage_value(&self) -> Option<Value> {
		match self {
			Self::Null => Some(Value::Null),
			Self::Scalar(value) => Some(value.clone()),
			Self::Nested(description) => description
				.iter()
				.map(|(k, v)| v.to_storage_value().map(|v| (k.clone(), v)))
				.collect::<Option<serde_json::Map<_, _>>>()
				.map(Value::Object),
			Self::List(items) => items
				.iter()
				.map(FieldValue::to_storage_value)
				.collect::<Option<Vec<_>>>()
				.map(Value::Array),
			Self::Record(_) | Self::Pending(_) => None,
		}
	}

	/// Short name of the variant, for error messages.
	pub fn kind(&self) -> &'static str {
		match self {
			Self::Null => "null",
			Self::Scalar(_) => "scalar",
			Self::Nested(_) => "description",
			Self::List(_) => "sequence",
			Self::Record(_) => "record",
			Self::Pending(_) => "pending record",
		}
	}
}

impl PartialEq for FieldValue {
	fn eq(&self, other: &Self) -> bool {
		match (self, other) {
			(Self::Null, Self::Null) => true,
			(Self::Scalar(a), Self::Scalar(b)) => a == b,
			(Self::Nested(a), Self::Nested(b)) => a == b,
			(Self::List(a), Self::List(b)) => a == b,
			(Self::Record(a), Self::Record(b)) => a == b,
			(Self::Pending(a), Self::Pending(b)) => a.same_resolution(b),
			_ => false,
		}
	}
}

impl From<Value> for FieldValue {
	fn from(value: Value) -> Self {
		match value {
			Value::Null => Self::Null,
			Value::Object(map) => Self::Nested(Description::from_map(map)),
			Value::Array(items) => Self::List(items.into_iter().map(FieldValue::from).collect()),
			scalar => Self::Scalar(scalar),
		}
	}
}

impl From<Description> for FieldValue {
	fn from(description: Description) -> Self {
		Self::Nested(description)
	}
}

impl From<Vec<Description>> for FieldValue {
	fn from(descriptions: Vec<Description>) -> Self {
		Self::List(descriptions.into_iter().map(FieldValue::Nested).collect())
	}
}

impl From<Vec<FieldValue>> for FieldValue {
	fn from(items: Vec<FieldValue>) -> Self {
		Self::List(items)
	}
}

impl From<Record> for FieldValue {
	fn from(record: Record) -> Self {
		Self::Record(record)
	}
}

impl From<PendingRecord> for FieldValue {
	fn from(pending: PendingRecord) -> Self {
		Self::Pending(pending)
	}
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
	fn from(value: Option<T>) -> Self {
		value.map_or(Self::Null, Into::into)
	}
}

macro_rules! scalar_from {
	($($ty:ty),* $(,)?) => {
		$(
			impl From<$ty> for FieldValue {
				fn from(value: $ty) -> Self {
					Self::Scalar(Value::from(value))
				}
			}
		)*
	};
}

scalar_from!(&str, String, bool, i32, i64, u32, u64, f64);

/// Caller-supplied field values for one record, in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Description {
	fields: IndexMap<String, FieldValue>,
}

impl Description {
	/// Creates an empty description.
	pub fn new() -> Self {
		Self::default()
	}

	fn from_map(map: serde_json::Map<String, Value>) -> Self {
		Self {
			fields: map
				.into_iter()
				.map(|(k, v)| (k, FieldValue::from(v)))
				.collect(),
		}
	}

	/// Adds a field, builder style.
	///
	/// # Example
	///
	/// ```
	/// # use fixtree_core::{Description, FieldValue};
	/// let post = Description::new()
	///     .with("title", "Hello")
	///     .with("User", Description::new().with("name", "Amy"));
	/// assert!(post.get("User").and_then(FieldValue::as_description).is_some());
	/// ```
	pub fn with(mut self, field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
		self.insert(field, value);
		self
	}

	/// Sets a field, returning the previous value.
	pub fn insert(
		&mut self,
		field: impl Into<String>,
		value: impl Into<FieldValue>,
	) -> Option<FieldValue> {
		self.fields.insert(field.into(), value.into())
	}

	/// Returns the value of `field`.
	pub fn get(&self, field: &str) -> Option<&FieldValue> {
		self.fields.get(field)
	}

	/// Removes `field`, keeping the order of the others.
	pub fn remove(&mut self, field: &str) -> Option<FieldValue> {
		self.fields.shift_remove(field)
	}

	/// Returns true if `field` is present.
	pub fn contains(&self, field: &str) -> bool {
		self.fields.contains_key(field)
	}

	/// Returns the number of fields.
	pub fn len(&self) -> usize {
		self.fields.len()
	}

	/// Returns true if no field is set.
	pub fn is_empty(&self) -> bool {
		self.fields.is_empty()
	}

	/// Returns the field names in insertion order.
	pub fn keys(&self) -> impl Iterator<Item = &str> {
		self.fields.keys().map(String::as_str)
	}

	/// Iterates over fields in insertion order.
	pub fn iter(&self) -> Iter<'_, String, FieldValue> {
		self.fields.iter()
	}

	/// Layers `other` on top of `self`; fields of `other` win.
	pub fn merge(&mut self, other: Description) {
		for (field, value) in other {
			self.fields.insert(field, value);
		}
	}
}

impl IntoIterator for Description {
	type Item = (String, FieldValue);
	type IntoIter = IntoIter<String, FieldValue>;

	fn into_iter(self) -> Self::IntoIter {
		self.fields.into_iter()
	}
}

impl<'a> IntoIterator for &'a Description {
	type Item = (&'a String, &'a FieldValue);
	type IntoIter = Iter<'a, String, FieldValue>;

	fn into_iter(self) -> Self::IntoIter {
		self.fields.iter()
	}
}

impl<K: Into<String>, V: Into<FieldValue>> FromIterator<(K, V)> for Description {
	fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
		Self {
			fields: iter
				.into_iter()
				.map(|(k, v)| (k.into(), v.into()))
				.collect(),
		}
	}
}

impl TryFrom<Value> for Description {
	type Error = FixtureError;

	fn try_from(value: Value) -> FixtureResult<Self> {
		match value {
			Value::Object(map) => Ok(Self::from_map(map)),
			other => Err(FixtureError::malformed(
				"<description>",
				format!("expected a JSON object, got {}", other),
			)),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use serde_json::json;

	#[rstest]
	fn test_from_json_keeps_shape() {
		let value = FieldValue::from(json!({
			"title": "T",
			"User": {"name": "Amy"},
			"Comments": [{"body": "first"}],
			"deleted": null,
		}));

		let FieldValue::Nested(description) = value else {
			panic!("expected a nested description");
		};
		assert_eq!(description.get("title"), Some(&FieldValue::from("T")));
		assert!(matches!(description.get("User"), Some(FieldValue::Nested(_))));
		assert!(matches!(description.get("Comments"), Some(FieldValue::List(items)) if items.len() == 1));
		assert!(description.get("deleted").unwrap().is_null());
	}

	#[rstest]
	fn test_insertion_order_is_kept() {
		let description: Description = [("b", 1), ("a", 2), ("c", 3)].into_iter().collect();
		assert_eq!(description.keys().collect::<Vec<_>>(), vec!["b", "a", "c"]);
	}

	#[rstest]
	fn test_merge_overrides() {
		let mut base = Description::new().with("name", "Amy").with("email", "a@x.com");
		base.merge(Description::new().with("name", "Steve"));
		assert_eq!(base.get("name"), Some(&FieldValue::from("Steve")));
		assert_eq!(base.len(), 2);
	}

	#[rstest]
	fn test_try_from_rejects_non_objects() {
		let result = Description::try_from(json!([1, 2]));
		assert!(matches!(result, Err(FixtureError::MalformedDescription { .. })));
	}

	#[rstest]
	#[case(FieldValue::Null, Some(json!(null)))]
	#[case(FieldValue::from(3), Some(json!(3)))]
	#[case(FieldValue::from(json!({"tags": ["a", "b"]})), Some(json!({"tags": ["a", "b"]})))]
	#[case(FieldValue::Record(Record::new("User", "id", Row::new())), None)]
	fn test_to_storage_value(#[case] value: FieldValue, #[case] expected: Option<Value>) {
		assert_eq!(value.to_storage_value(), expected);
	}

	#[rstest]
	fn test_record_inside_nested_has_no_storage_value() {
		let value = FieldValue::from(
			Description::new().with("owner", Record::new("User", "id", Row::new())),
		);
		assert_eq!(value.to_storage_value(), None);
	}

	#[rstest]
	fn test_option_into_field_value() {
		assert!(FieldValue::from(None::<&str>).is_null());
		assert_eq!(FieldValue::from(Some("x")), FieldValue::from("x"));
	}
}
