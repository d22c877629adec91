//! Resolved records and pending resolutions.

use std::fmt;
use std::future::Future;

use futures::future::{BoxFuture, FutureExt, Shared};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::FixtureResult;
use crate::value::Row;

/// A row handed back by the storage layer.
///
/// The resolver only reads from it: the key a relationship joins on, and the
/// values it was created with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
	model: String,
	primary_key: String,
	values: Row,
}

impl Record {
	/// Creates a record for `model` whose identity lives in `primary_key`.
	pub fn new(model: impl Into<String>, primary_key: impl Into<String>, values: Row) -> Self {
		Self {
			model: model.into(),
			primary_key: primary_key.into(),
			values,
		}
	}

	/// Returns the model name.
	pub fn model(&self) -> &str {
		&self.model
	}

	/// Returns the name of the identity field.
	pub fn primary_key_field(&self) -> &str {
		&self.primary_key
	}

	/// Returns the generated identity, if the storage layer assigned one.
	pub fn key(&self) -> Option<&Value> {
		self.values.get(&self.primary_key)
	}

	/// Returns the value of `field`.
	pub fn get(&self, field: &str) -> Option<&Value> {
		self.values.get(field)
	}

	/// Returns all field values.
	pub fn values(&self) -> &Row {
		&self.values
	}

	/// Consumes the record, returning its field values.
	pub fn into_values(self) -> Row {
		self.values
	}

	/// Returns the field values as a JSON object.
	///
	/// # Example
	///
	/// ```
	/// # use fixtree_core::{Record, Row};
	/// # use serde_json::json;
	/// let mut row = Row::new();
	/// row.insert("id".to_string(), json!(1));
	/// row.insert("name".to_string(), json!("Amy"));
	/// let record = Record::new("User", "id", row);
	/// assert_eq!(record.to_json(), json!({"id": 1, "name": "Amy"}));
	/// ```
	pub fn to_json(&self) -> Value {
		Value::Object(
			self.values
				.iter()
				.map(|(k, v)| (k.clone(), v.clone()))
				.collect(),
		)
	}
}

type SharedResolution = Shared<BoxFuture<'static, FixtureResult<Record>>>;

/// A record that is still being resolved.
///
/// Cloning the handle does not start a second resolution: every clone awaits
/// the same underlying future and observes the same record (or the same
/// failure). Nothing runs until the first clone is awaited.
#[derive(Clone)]
pub struct PendingRecord {
	inner: SharedResolution,
}

impl PendingRecord {
	/// Wraps a future producing a record.
	pub fn from_future<F>(future: F) -> Self
	where
		F: Future<Output = FixtureResult<Record>> + Send + 'static,
	{
		Self {
			inner: future.boxed().shared(),
		}
	}

	/// Wraps an already available record.
	pub fn ready(record: Record) -> Self {
		Self::from_future(futures::future::ready(Ok(record)))
	}

	/// Waits for the record.
	///
	/// Every awaiter of a failed resolution gets its own copy of the original
	/// error.
	pub async fn resolve(&self) -> FixtureResult<Record> {
		self.inner.clone().await
	}

	/// Returns the record if the resolution already completed successfully.
	pub fn peek(&self) -> Option<&Record> {
		self.inner.peek().and_then(|result| result.as_ref().ok())
	}

	/// Returns true if both handles share one resolution.
	pub fn same_resolution(&self, other: &Self) -> bool {
		self.inner.ptr_eq(&other.inner)
	}
}

impl fmt::Debug for PendingRecord {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("PendingRecord")
			.field("completed", &self.inner.peek().is_some())
			.finish()
	}
}
