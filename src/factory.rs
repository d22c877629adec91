//! Per-model fixture factories.
//!
//! A factory binds a model name to a resolver, so fixture code reads as
//! `users.create(..)` instead of passing the model name around.

use std::collections::BTreeMap;

use fixtree_core::{Description, FieldValue, FixtureError, FixtureResult, PendingRecord, Record};
use fixtree_resolver::{Resolved, Resolver};

/// Resolves descriptions of one model.
#[derive(Debug, Clone)]
pub struct FixtureFactory {
	resolver: Resolver,
	model: String,
}

impl FixtureFactory {
	/// Creates a factory for `model`. Fails if the model is not registered.
	pub fn new(resolver: &Resolver, model: impl Into<String>) -> FixtureResult<Self> {
		let model = model.into();
		resolver.registry().require(&model)?;
		Ok(Self {
			resolver: resolver.clone(),
			model,
		})
	}

	/// Returns the model name.
	pub fn model(&self) -> &str {
		&self.model
	}

	/// Finds or creates one record.
	pub async fn create(&self, description: Description) -> FixtureResult<Record> {
		self.resolver.resolve_one(&self.model, description).await
	}

	/// Finds or creates one record per description, in order.
	pub async fn create_many<I>(&self, descriptions: I) -> FixtureResult<Vec<Record>>
	where
		I: IntoIterator<Item = Description>,
	{
		let input: Vec<FieldValue> = descriptions.into_iter().map(FieldValue::from).collect();
		self.resolver
			.resolve(&self.model, input)
			.await
			.map(Resolved::into_many)
	}

	/// Resolves a description or a sequence of them.
	pub async fn resolve(&self, input: impl Into<FieldValue>) -> FixtureResult<Resolved> {
		self.resolver.resolve(&self.model, input).await
	}

	/// Resolves `input` with positional defaults.
	pub async fn resolve_with_defaults(
		&self,
		input: impl Into<FieldValue>,
		defaults: impl Into<FieldValue>,
	) -> FixtureResult<Resolved> {
		self.resolver
			.resolve_with_defaults(&self.model, input, defaults)
			.await
	}

	/// Returns a shared, lazily started resolution of `description`.
	pub fn pending(&self, description: Description) -> PendingRecord {
		self.resolver.pending(self.model.clone(), description)
	}
}

/// Factories for every model of a registry, by model name.
#[derive(Debug, Clone, Default)]
pub struct FixtureFactories {
	factories: BTreeMap<String, FixtureFactory>,
}

impl FixtureFactories {
	/// Returns the factory for `model`, if any.
	pub fn get(&self, model: &str) -> Option<&FixtureFactory> {
		self.factories.get(model)
	}

	/// Returns the factory for `model`.
	pub fn require(&self, model: &str) -> FixtureResult<&FixtureFactory> {
		self.get(model)
			.ok_or_else(|| FixtureError::UnknownModel(model.to_string()))
	}

	/// Returns the model names, sorted.
	pub fn names(&self) -> Vec<&str> {
		self.factories.keys().map(String::as_str).collect()
	}

	/// Returns the number of factories.
	pub fn len(&self) -> usize {
		self.factories.len()
	}

	/// Returns true if there are no factories.
	pub fn is_empty(&self) -> bool {
		self.factories.is_empty()
	}

	/// Iterates over the factories in name order.
	pub fn iter(&self) -> impl Iterator<Item = (&str, &FixtureFactory)> {
		self.factories.iter().map(|(name, factory)| (name.as_str(), factory))
	}
}

/// Builds a factory for every model registered with `resolver`.
///
/// Models registered afterwards are not included.
///
/// # Example
///
/// ```
/// # use std::sync::Arc;
/// # use fixtree::{ModelRegistry, Resolver, build_fixture_factories};
/// # use fixtree::memory::MemoryStore;
/// let store = MemoryStore::new();
/// let registry = ModelRegistry::new()
///     .with(store.model("User").column("name").build())
///     .with(store.model("Post").column("title").build());
/// let factories = build_fixture_factories(&Resolver::new(Arc::new(registry)));
/// assert_eq!(factories.names(), vec!["Post", "User"]);
/// ```
pub fn build_fixture_factories(resolver: &Resolver) -> FixtureFactories {
	let factories: BTreeMap<_, _> = resolver
		.registry()
		.model_names()
		.into_iter()
		.map(|name| {
			let factory = FixtureFactory {
				resolver: resolver.clone(),
				model: name.clone(),
			};
			(name, factory)
		})
		.collect();
	tracing::debug!("Built {} fixture factories", factories.len());
	FixtureFactories { factories }
}
