//! In-memory models.

use std::sync::Arc;

use async_trait::async_trait;
use fixtree_core::{DEFAULT_KEY, Model, Record, Relationship, Row, StorageError};
use indexmap::IndexMap;
use serde_json::Value;

use crate::store::{MemoryStore, Table};

#[derive(Debug, Clone)]
struct Column {
	name: String,
	nullable: bool,
}

/// Declares a [`MemoryModel`].
///
/// # Example
///
/// ```
/// # use fixtree_memory::MemoryStore;
/// let store = MemoryStore::new();
/// let post = store
///     .model("Post")
///     .column("title")
///     .nullable("body")
///     .optional_belongs_to("User", "User", "UserId")
///     .has_many("Comments", "Comment", "PostId")
///     .build();
/// assert_eq!(post.columns(), vec!["title", "body", "UserId"]);
/// ```
#[derive(Debug)]
pub struct ModelBuilder {
	store: MemoryStore,
	name: String,
	primary_key: String,
	columns: Vec<Column>,
	unique: Vec<Vec<String>>,
	derived: Vec<String>,
	relationships: IndexMap<String, Relationship>,
}

impl ModelBuilder {
	pub(crate) fn new(store: MemoryStore, name: impl Into<String>) -> Self {
		Self {
			store,
			name: name.into(),
			primary_key: DEFAULT_KEY.to_string(),
			columns: Vec::new(),
			unique: Vec::new(),
			derived: Vec::new(),
			relationships: IndexMap::new(),
		}
	}

	/// Renames the auto-increment primary key (default `id`).
	pub fn primary_key(mut self, name: impl Into<String>) -> Self {
		self.primary_key = name.into();
		self
	}

	/// Adds a non-nullable column.
	pub fn column(self, name: impl Into<String>) -> Self {
		self.add_column(name.into(), false)
	}

	/// Adds a nullable column.
	pub fn nullable(self, name: impl Into<String>) -> Self {
		self.add_column(name.into(), true)
	}

	/// Adds a unique constraint over `fields`.
	pub fn unique<I, S>(mut self, fields: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.unique
			.push(fields.into_iter().map(Into::into).collect());
		self
	}

	/// Adds a derived field: accepted when a record is built, never persisted.
	pub fn derived(mut self, name: impl Into<String>) -> Self {
		self.derived.push(name.into());
		self
	}

	/// Declares a belongs-to relationship with a non-nullable foreign key.
	pub fn belongs_to(
		self,
		field: impl Into<String>,
		related: impl Into<String>,
		foreign_key: impl Into<String>,
	) -> Self {
		let foreign_key = foreign_key.into();
		self.add_column(foreign_key.clone(), false)
			.relationship(field, Relationship::belongs_to(related, foreign_key))
	}

	/// Declares a belongs-to relationship with a nullable foreign key.
	pub fn optional_belongs_to(
		self,
		field: impl Into<String>,
		related: impl Into<String>,
		foreign_key: impl Into<String>,
	) -> Self {
		let foreign_key = foreign_key.into();
		self.add_column(foreign_key.clone(), true)
			.relationship(field, Relationship::belongs_to(related, foreign_key))
	}

	/// Declares a has-many relationship. The foreign key column belongs to
	/// the related model.
	pub fn has_many(
		self,
		field: impl Into<String>,
		related: impl Into<String>,
		foreign_key: impl Into<String>,
	) -> Self {
		self.relationship(field, Relationship::has_many(related, foreign_key))
	}

	/// Declares a has-one relationship. Resolved like has-many with a single
	/// child.
	pub fn has_one(
		self,
		field: impl Into<String>,
		related: impl Into<String>,
		foreign_key: impl Into<String>,
	) -> Self {
		self.has_many(field, related, foreign_key)
	}

	/// Declares an arbitrary relationship.
	pub fn relationship(mut self, field: impl Into<String>, relationship: Relationship) -> Self {
		self.relationships.insert(field.into(), relationship);
		self
	}

	fn add_column(mut self, name: String, nullable: bool) -> Self {
		match self.columns.iter_mut().find(|c| c.name == name) {
			Some(column) => column.nullable = nullable,
			None => self.columns.push(Column { name, nullable }),
		}
		self
	}

	/// Creates the table and returns the model.
	pub fn build(self) -> Arc<MemoryModel> {
		self.store.create_table(&self.name);
		let attributes = std::iter::once(self.primary_key.clone())
			.chain(self.columns.iter().map(|c| c.name.clone()))
			.collect();
		Arc::new(MemoryModel {
			store: self.store,
			name: self.name,
			primary_key: self.primary_key,
			columns: self.columns,
			unique: self.unique,
			derived: self.derived,
			relationships: self.relationships,
			attributes,
		})
	}
}

/// A model whose rows live in a [`MemoryStore`].
#[derive(Debug)]
pub struct MemoryModel {
	store: MemoryStore,
	name: String,
	primary_key: String,
	columns: Vec<Column>,
	unique: Vec<Vec<String>>,
	derived: Vec<String>,
	relationships: IndexMap<String, Relationship>,
	attributes: Vec<String>,
}

impl MemoryModel {
	/// Returns the store holding this model's table.
	pub fn store(&self) -> &MemoryStore {
		&self.store
	}

	/// Returns the column names, primary key excluded.
	pub fn columns(&self) -> Vec<&str> {
		self.columns.iter().map(|c| c.name.as_str()).collect()
	}

	/// Returns the derived field names.
	pub fn derived_fields(&self) -> &[String] {
		&self.derived
	}

	/// Returns every row as a record, in key order.
	pub fn all(&self) -> Vec<Record> {
		self.store
			.rows(&self.name)
			.into_iter()
			.map(|row| self.record(row))
			.collect()
	}

	/// Returns the records whose values equal every entry of `predicate`.
	pub fn filter(&self, predicate: &Row) -> Vec<Record> {
		self.store
			.rows(&self.name)
			.into_iter()
			.filter(|row| matches_predicate(row, predicate))
			.map(|row| self.record(row))
			.collect()
	}

	/// Returns the record with primary key `id`.
	pub fn get(&self, id: i64) -> Option<Record> {
		self.store
			.with_table(&self.name, |table| table.rows.get(&id).cloned())
			.map(|row| self.record(row))
	}

	/// Returns the number of rows.
	pub fn count(&self) -> usize {
		self.store.count(&self.name)
	}

	fn record(&self, row: Row) -> Record {
		Record::new(self.name.clone(), self.primary_key.clone(), row)
	}

	fn column(&self, name: &str) -> Option<&Column> {
		self.columns.iter().find(|c| c.name == name)
	}

	fn unknown_column(&self, field: &str) -> StorageError {
		StorageError::UnknownColumn {
			model: self.name.clone(),
			field: field.to_string(),
		}
	}

	/// Splits `values` into persisted and derived parts.
	fn partition(&self, values: Row) -> Result<(Row, Row), StorageError> {
		let mut persisted = Row::new();
		let mut derived = Row::new();
		for (field, value) in values {
			if self.derived.contains(&field) {
				derived.insert(field, value);
			} else if field == self.primary_key || self.column(&field).is_some() {
				persisted.insert(field, value);
			} else {
				return Err(self.unknown_column(&field));
			}
		}
		Ok((persisted, derived))
	}

	fn check_not_null(&self, row: &Row) -> Result<(), StorageError> {
		for column in self.columns.iter().filter(|c| !c.nullable) {
			if row.get(&column.name).is_none_or(Value::is_null) {
				return Err(StorageError::NotNull {
					model: self.name.clone(),
					field: column.name.clone(),
				});
			}
		}
		Ok(())
	}

	fn check_unique(&self, table: &Table, id: i64, row: &Row) -> Result<(), StorageError> {
		for fields in &self.unique {
			let values: Vec<&Value> = fields
				.iter()
				.map(|f| row.get(f).unwrap_or(&Value::Null))
				.collect();
			if values.iter().any(|v| v.is_null()) {
				continue;
			}
			let taken = table.rows.iter().any(|(other, existing)| {
				*other != id
					&& fields
						.iter()
						.zip(&values)
						.all(|(f, v)| existing.get(f) == Some(*v))
			});
			if taken {
				return Err(StorageError::Unique {
					model: self.name.clone(),
					fields: fields.clone(),
				});
			}
		}
		Ok(())
	}

	fn key_of(&self, value: &Value) -> Result<i64, StorageError> {
		value.as_i64().ok_or_else(|| {
			StorageError::Backend(format!(
				"{}.{} must be an integer, got {}",
				self.name, self.primary_key, value
			))
		})
	}
}

fn matches_predicate(row: &Row, predicate: &Row) -> bool {
	predicate
		.iter()
		.all(|(field, expected)| row.get(field).unwrap_or(&Value::Null) == expected)
}

#[async_trait]
impl Model for MemoryModel {
	fn name(&self) -> &str {
		&self.name
	}

	fn relationship(&self, field: &str) -> Option<&Relationship> {
		self.relationships.get(field)
	}

	fn attributes(&self) -> &[String] {
		&self.attributes
	}

	async fn find_one(&self, predicate: &Row) -> Result<Option<Record>, StorageError> {
		if let Some(field) = predicate.keys().find(|f| !self.is_persisted(f)) {
			return Err(self.unknown_column(field));
		}
		let row = self.store.with_table(&self.name, |table| {
			table
				.rows
				.values()
				.find(|row| matches_predicate(row, predicate))
				.cloned()
		});
		Ok(row.map(|row| self.record(row)))
	}

	async fn create(&self, values: Row) -> Result<Record, StorageError> {
		let _write = self.store.begin_write(&self.name)?;
		self.store.write_latency().await;

		let (persisted, derived) = self.partition(values)?;
		let explicit_id = persisted
			.get(&self.primary_key)
			.filter(|v| !v.is_null())
			.map(|v| self.key_of(v))
			.transpose()?;

		let mut row = Row::new();
		for column in &self.columns {
			let value = persisted.get(&column.name).cloned().unwrap_or(Value::Null);
			row.insert(column.name.clone(), value);
		}
		self.check_not_null(&row)?;

		let row = self.store.with_table(&self.name, |table| -> Result<Row, StorageError> {
			let id = explicit_id.unwrap_or(table.next_id + 1);
			if table.rows.contains_key(&id) {
				return Err(StorageError::Unique {
					model: self.name.clone(),
					fields: vec![self.primary_key.clone()],
				});
			}
			self.check_unique(table, id, &row)?;
			match explicit_id {
				Some(id) => table.reserve_id(id),
				None => {
					table.allocate_id();
				}
			}
			let mut stored = Row::new();
			stored.insert(self.primary_key.clone(), Value::from(id));
			stored.extend(row);
			table.rows.insert(id, stored.clone());
			Ok(stored)
		})?;

		let mut values = row;
		values.extend(derived);
		Ok(self.record(values))
	}

	async fn update(&self, record: &Record, values: Row) -> Result<Record, StorageError> {
		let _write = self.store.begin_write(&self.name)?;
		self.store.write_latency().await;

		let id = record
			.get(&self.primary_key)
			.ok_or_else(|| StorageError::RecordNotFound {
				model: self.name.clone(),
			})
			.and_then(|v| self.key_of(v))?;
		let (mut persisted, derived) = self.partition(values)?;
		if persisted.shift_remove(&self.primary_key).is_some() {
			return Err(StorageError::Backend(format!(
				"{}.{} cannot be changed",
				self.name, self.primary_key
			)));
		}

		let row = self.store.with_table(&self.name, |table| -> Result<Row, StorageError> {
			let mut row = table
				.rows
				.get(&id)
				.cloned()
				.ok_or_else(|| StorageError::RecordNotFound {
					model: self.name.clone(),
				})?;
			row.extend(persisted);
			self.check_not_null(&row)?;
			self.check_unique(table, id, &row)?;
			table.rows.insert(id, row.clone());
			Ok(row)
		})?;

		let mut values = row;
		values.extend(derived);
		Ok(self.record(values))
	}
}
