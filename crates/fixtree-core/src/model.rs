//! The model capability surface and the registry that resolves models by name.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::error::{FixtureError, FixtureResult, StorageError};
use crate::record::Record;
use crate::relationship::Relationship;
use crate::value::Row;

/// Everything the resolver needs from a model and its storage.
///
/// Implement this for each model type that fixtures should be able to build.
/// Relationship metadata is read-only; the resolver never changes the schema.
#[async_trait]
pub trait Model: Send + Sync {
	/// Returns the model name used by relationship metadata.
	fn name(&self) -> &str;

	/// Returns the relationship declared under `field`, if any.
	///
	/// Any field name this returns `Some` for is treated as relational.
	fn relationship(&self, field: &str) -> Option<&Relationship>;

	/// Returns the persisted attribute names.
	///
	/// Derived fields are left out; they are never used as lookup predicates.
	fn attributes(&self) -> &[String];

	/// Returns true if `field` is a persisted attribute.
	fn is_persisted(&self, field: &str) -> bool {
		self.attributes().iter().any(|attr| attr == field)
	}

	/// Finds one record whose values equal every entry of `predicate`.
	async fn find_one(&self, predicate: &Row) -> Result<Option<Record>, StorageError>;

	/// Creates a record from `values`.
	async fn create(&self, values: Row) -> Result<Record, StorageError>;

	/// Writes `values` onto an existing record and returns its new state.
	async fn update(&self, record: &Record, values: Row) -> Result<Record, StorageError>;
}

/// Models available to a resolver, looked up by name.
///
/// Relationship metadata names its related model instead of owning it,
/// because models routinely point at each other.
#[derive(Default)]
pub struct ModelRegistry {
	models: RwLock<HashMap<String, Arc<dyn Model>>>,
}

impl ModelRegistry {
	/// Creates an empty registry.
	pub fn new() -> Self {
		Self::default()
	}

	/// Registers a model under its own name, replacing any previous entry.
	pub fn register(&self, model: Arc<dyn Model>) {
		let name = model.name().to_string();
		self.models.write().insert(name, model);
	}

	/// Registers a model, builder style.
	pub fn with(self, model: Arc<dyn Model>) -> Self {
		self.register(model);
		self
	}

	/// Gets a model by name.
	pub fn get(&self, name: &str) -> Option<Arc<dyn Model>> {
		self.models.read().get(name).cloned()
	}

	/// Gets a model by name, failing with [`FixtureError::UnknownModel`].
	pub fn require(&self, name: &str) -> FixtureResult<Arc<dyn Model>> {
		self.get(name)
			.ok_or_else(|| FixtureError::UnknownModel(name.to_string()))
	}

	/// Checks if a model is registered under `name`.
	pub fn has(&self, name: &str) -> bool {
		self.models.read().contains_key(name)
	}

	/// Returns all registered model names, sorted.
	pub fn model_names(&self) -> Vec<String> {
		let mut names: Vec<String> = self.models.read().keys().cloned().collect();
		names.sort();
		names
	}

	/// Returns the number of registered models.
	pub fn len(&self) -> usize {
		self.models.read().len()
	}

	/// Returns true if no models are registered.
	pub fn is_empty(&self) -> bool {
		self.models.read().is_empty()
	}
}

impl fmt::Debug for ModelRegistry {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ModelRegistry")
			.field("models", &self.model_names())
			.finish()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	struct TestModel {
		name: String,
		attributes: Vec<String>,
	}

	impl TestModel {
		fn new(name: &str) -> Self {
			Self {
				name: name.to_string(),
				attributes: vec!["id".to_string(), "name".to_string()],
			}
		}
	}

	#[async_trait]
	impl Model for TestModel {
		fn name(&self) -> &str {
			&self.name
		}

		fn relationship(&self, _field: &str) -> Option<&Relationship> {
			None
		}

		fn attributes(&self) -> &[String] {
			&self.attributes
		}

		async fn find_one(&self, _predicate: &Row) -> Result<Option<Record>, StorageError> {
			Ok(None)
		}

		async fn create(&self, values: Row) -> Result<Record, StorageError> {
			Ok(Record::new(self.name.clone(), "id", values))
		}

		async fn update(&self, _record: &Record, values: Row) -> Result<Record, StorageError> {
			Ok(Record::new(self.name.clone(), "id", values))
		}
	}

	#[rstest]
	fn test_register_and_get_model() {
		let registry = ModelRegistry::new();
		registry.register(Arc::new(TestModel::new("User")));

		assert!(registry.has("User"));
		assert!(!registry.has("Post"));
		assert_eq!(registry.get("User").unwrap().name(), "User");
	}

	#[rstest]
	fn test_require_unknown_model() {
		let registry = ModelRegistry::new();
		let result = registry.require("Ghost");
		assert!(matches!(result, Err(FixtureError::UnknownModel(name)) if name == "Ghost"));
	}

	#[rstest]
	fn test_model_names_are_sorted() {
		let registry = ModelRegistry::new()
			.with(Arc::new(TestModel::new("Post")))
			.with(Arc::new(TestModel::new("Comment")))
			.with(Arc::new(TestModel::new("User")));

		assert_eq!(registry.len(), 3);
		assert_eq!(registry.model_names(), vec!["Comment", "Post", "User"]);
	}

	#[rstest]
	fn test_is_persisted_uses_attributes() {
		let model = TestModel::new("User");
		assert!(model.is_persisted("name"));
		assert!(!model.is_persisted("fullName"));
	}
}
