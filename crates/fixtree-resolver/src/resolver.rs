//! Fixture resolution entry point.
//!
//! One call resolves one description like this:
//!
//! 1. normalize it into `where` / `defaults` / `sets`
//! 2. split each bucket into base fields and associations
//! 3. resolve the to-one associations of `where` and `defaults`, writing
//!    their keys into the base fields
//! 4. find a record matching the base `where` fields, or create one from
//!    `where` overlaid with `defaults`
//! 5. if the record already existed, resolve the to-one associations of
//!    `sets` and write the base `sets` fields onto it
//! 6. resolve the to-many associations against the persisted record
//!
//! A description resolved as the child of a to-many relationship carries a
//! parent key. The parent's key is the child's foreign key no matter what
//! the child's own fields or belongs-to associations put there.
//!
//! Every create and update passes through the resolver's [`WriteGate`].

use std::sync::Arc;

use fixtree_core::{
	Description, FieldValue, FixtureError, FixtureResult, Model, ModelRegistry, PendingRecord,
	Record, Relationship, ResolverConfig, Row, WriteGate,
};
use futures::FutureExt;
use futures::future::BoxFuture;
use serde_json::Value;

use crate::dependents::resolve_dependents;
use crate::normalize::{Normalized, NormalizedDescription, normalize, normalize_input};
use crate::prerequisites::resolve_prerequisites;
use crate::split::split;

/// Result of a top-level resolution.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolved {
	/// The input was a single description.
	One(Record),
	/// The input was a sequence; records are in input order.
	Many(Vec<Record>),
}

impl Resolved {
	/// Returns the record of a single-description input.
	pub fn into_one(self) -> Option<Record> {
		match self {
			Self::One(record) => Some(record),
			Self::Many(_) => None,
		}
	}

	/// Returns every resolved record, in input order.
	pub fn into_many(self) -> Vec<Record> {
		match self {
			Self::One(record) => vec![record],
			Self::Many(records) => records,
		}
	}
}

/// Whether find-or-create found or created its record.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Outcome {
	Found(Record),
	Created(Record),
}

/// The foreign key a to-many child must carry.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ParentKey {
	pub(crate) field: String,
	pub(crate) value: Value,
}

impl ParentKey {
	/// Puts the parent's key into the child's lookup.
	fn pin(&self, model: &dyn Model, base_where: &mut Row) {
		if let Some(own) = base_where.insert(self.field.clone(), self.value.clone()) {
			self.report(model, own);
		}
	}

	/// Drops the child's own value for the foreign key from `row`.
	fn strip(&self, model: &dyn Model, row: &mut Row) {
		if let Some(own) = row.shift_remove(&self.field) {
			self.report(model, own);
		}
	}

	fn report(&self, model: &dyn Model, own: Value) {
		if own != self.value {
			tracing::warn!(
				"Ignoring {}.{} = {} on dependent, the parent key is {}",
				model.name(),
				self.field,
				own,
				self.value
			);
		}
	}
}

struct ResolverInner {
	registry: Arc<ModelRegistry>,
	config: ResolverConfig,
	gate: WriteGate,
}

/// Resolves nested fixture descriptions into persisted records.
///
/// Cloning a resolver is cheap; clones share the registry and the write gate.
///
/// # Example
///
/// ```
/// # use std::sync::Arc;
/// # use fixtree_core::{Description, ModelRegistry};
/// # use fixtree_memory::MemoryStore;
/// # use fixtree_resolver::Resolver;
/// # use serde_json::json;
/// # tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(async {
/// let store = MemoryStore::new();
/// let registry = ModelRegistry::new()
///     .with(store.model("User").column("name").has_many("Articles", "Post", "UserId").build())
///     .with(store.model("Post").column("title").optional_belongs_to("User", "User", "UserId").build());
/// let resolver = Resolver::new(Arc::new(registry));
///
/// let post = resolver
///     .resolve_one("Post", Description::try_from(json!({
///         "title": "Hello",
///         "User": {"name": "Amy"},
///     }))?)
///     .await?;
/// assert_eq!(post.get("UserId"), Some(&json!(1)));
/// # Ok::<(), fixtree_core::FixtureError>(())
/// # }).unwrap();
/// ```
#[derive(Clone)]
pub struct Resolver {
	inner: Arc<ResolverInner>,
}

impl std::fmt::Debug for Resolver {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Resolver")
			.field("models", &self.inner.registry.model_names())
			.field("config", &self.inner.config)
			.finish()
	}
}

impl Resolver {
	/// Creates a resolver with the default configuration.
	pub fn new(registry: Arc<ModelRegistry>) -> Self {
		Self::with_config(registry, ResolverConfig::default())
	}

	/// Creates a resolver with `config`.
	pub fn with_config(registry: Arc<ModelRegistry>, config: ResolverConfig) -> Self {
		let gate = WriteGate::new(config.write_mode);
		Self {
			inner: Arc::new(ResolverInner {
				registry,
				config,
				gate,
			}),
		}
	}

	/// Returns the model registry.
	pub fn registry(&self) -> &Arc<ModelRegistry> {
		&self.inner.registry
	}

	/// Returns the configuration.
	pub fn config(&self) -> &ResolverConfig {
		&self.inner.config
	}

	/// Returns the write gate every create and update goes through.
	pub fn gate(&self) -> &WriteGate {
		&self.inner.gate
	}

	/// Finds or creates the records described by `input`.
	///
	/// `input` is a description (flat or structured) or a sequence of them.
	/// Sequence elements are resolved one after the other, in input order.
	pub async fn resolve(
		&self,
		model: &str,
		input: impl Into<FieldValue>,
	) -> FixtureResult<Resolved> {
		let model = self.inner.registry.require(model)?;
		let normalized = normalize_input(model.name(), input.into(), None)?;
		self.resolve_all(model, normalized).await
	}

	/// Like [`Resolver::resolve`], with positional defaults.
	///
	/// A sequence of defaults is paired element-wise with a sequence input; a
	/// single defaults description applies to every element.
	pub async fn resolve_with_defaults(
		&self,
		model: &str,
		input: impl Into<FieldValue>,
		defaults: impl Into<FieldValue>,
	) -> FixtureResult<Resolved> {
		let model = self.inner.registry.require(model)?;
		let normalized = normalize_input(model.name(), input.into(), Some(defaults.into()))?;
		self.resolve_all(model, normalized).await
	}

	/// Finds or creates the single record described by `description`.
	pub async fn resolve_one(&self, model: &str, description: Description) -> FixtureResult<Record> {
		let model = self.inner.registry.require(model)?;
		self.resolve_normalized(model, normalize(description)).await
	}

	/// Returns a shareable handle to the resolution of `description`.
	///
	/// Nothing runs until the handle (or any clone of it) is first awaited,
	/// and every clone observes that one resolution. Passing the same handle
	/// to several places of a fixture tree is how a caller gets one record
	/// for all of them.
	pub fn pending(&self, model: impl Into<String>, description: Description) -> PendingRecord {
		let resolver = self.clone();
		let model = model.into();
		PendingRecord::from_future(async move { resolver.resolve_one(&model, description).await })
	}

	async fn resolve_all(
		&self,
		model: Arc<dyn Model>,
		normalized: Normalized,
	) -> FixtureResult<Resolved> {
		match normalized {
			Normalized::One(item) => self.resolve_normalized(model, item).await.map(Resolved::One),
			Normalized::Many(items) => {
				let mut records = Vec::with_capacity(items.len());
				for item in items {
					records.push(self.resolve_normalized(model.clone(), item).await?);
				}
				Ok(Resolved::Many(records))
			}
		}
	}

	/// Resolves one normalized description against `model`.
	pub(crate) fn resolve_normalized(
		&self,
		model: Arc<dyn Model>,
		normalized: NormalizedDescription,
	) -> BoxFuture<'static, FixtureResult<Record>> {
		self.resolve_description(model, normalized, None)
	}

	/// Resolves a to-many child whose foreign key is fixed to `parent`.
	pub(crate) fn resolve_child(
		&self,
		model: Arc<dyn Model>,
		normalized: NormalizedDescription,
		parent: ParentKey,
	) -> BoxFuture<'static, FixtureResult<Record>> {
		self.resolve_description(model, normalized, Some(parent))
	}

	fn resolve_description(
		&self,
		model: Arc<dyn Model>,
		normalized: NormalizedDescription,
		parent: Option<ParentKey>,
	) -> BoxFuture<'static, FixtureResult<Record>> {
		let resolver = self.clone();
		async move {
			let NormalizedDescription {
				lookup,
				defaults,
				sets,
			} = normalized;
			let (mut base_where, where_to_one, where_to_many) = split(&*model, lookup)?.into_parts();
			let (mut base_defaults, defaults_to_one, defaults_to_many) =
				split(&*model, defaults)?.into_parts();
			let (mut base_sets, sets_to_one, sets_to_many) = split(&*model, sets)?.into_parts();

			resolve_prerequisites(&resolver, &model, where_to_one, &mut base_where).await?;
			resolve_prerequisites(&resolver, &model, defaults_to_one, &mut base_defaults).await?;
			if let Some(parent) = &parent {
				parent.pin(&*model, &mut base_where);
				parent.strip(&*model, &mut base_defaults);
			}

			let outcome = resolver.find_or_create(&model, base_where, base_defaults).await?;
			let (record, created) = match outcome {
				Outcome::Created(record) => (record, true),
				Outcome::Found(record) => {
					resolve_prerequisites(&resolver, &model, sets_to_one, &mut base_sets).await?;
					if let Some(parent) = &parent {
						parent.strip(&*model, &mut base_sets);
					}
					(resolver.apply_sets(&model, record, base_sets).await?, false)
				}
			};

			resolve_dependents(&resolver, &model, &record, where_to_many).await?;
			if created {
				resolve_dependents(&resolver, &model, &record, defaults_to_many).await?;
			} else {
				resolve_dependents(&resolver, &model, &record, sets_to_many).await?;
			}
			Ok(record)
		}
		.boxed()
	}

	/// Finds the record matching `base_where`, or creates it from `base_where`
	/// overlaid with `base_defaults`.
	///
	/// Lookup and create run as one gated operation, so two resolutions of
	/// the same description cannot both miss and both create.
	pub(crate) async fn find_or_create(
		&self,
		model: &Arc<dyn Model>,
		base_where: Row,
		base_defaults: Row,
	) -> FixtureResult<Outcome> {
		self.inner
			.gate
			.run(find_or_create_ungated(&**model, base_where, base_defaults))
			.await
	}

	async fn apply_sets(
		&self,
		model: &Arc<dyn Model>,
		record: Record,
		base_sets: Row,
	) -> FixtureResult<Record> {
		if base_sets.is_empty() {
			return Ok(record);
		}
		let updated = self.inner.gate.run(model.update(&record, base_sets)).await?;
		tracing::debug!("Updated {} {:?}", model.name(), updated.key());
		Ok(updated)
	}

	/// Looks up the model on the other side of `relationship`.
	pub(crate) fn related_model(
		&self,
		model: &dyn Model,
		field: &str,
		relationship: &Relationship,
	) -> FixtureResult<Arc<dyn Model>> {
		self.inner
			.registry
			.get(&relationship.related_model)
			.ok_or_else(|| FixtureError::UnknownRelatedModel {
				model: model.name().to_string(),
				field: field.to_string(),
				related: relationship.related_model.clone(),
			})
	}

	/// Turns a relationship value into a record of `related`.
	///
	/// Records are used as they are, pending records are awaited and nested
	/// descriptions are resolved recursively.
	pub(crate) fn resolve_related(
		&self,
		related: Arc<dyn Model>,
		value: FieldValue,
	) -> BoxFuture<'static, FixtureResult<Record>> {
		let resolver = self.clone();
		async move {
			let record = match value {
				FieldValue::Nested(description) => {
					return resolver.resolve_normalized(related, normalize(description)).await;
				}
				FieldValue::Record(record) => record,
				FieldValue::Pending(pending) => pending.resolve().await?,
				other => {
					return Err(FixtureError::malformed(
						related.name(),
						format!("expected a description or a record, got {}", other.kind()),
					));
				}
			};
			if record.model() != related.name() {
				return Err(FixtureError::malformed(
					related.name(),
					format!("got a {} record", record.model()),
				));
			}
			Ok(record)
		}
		.boxed()
	}
}

async fn find_or_create_ungated(
	model: &dyn Model,
	base_where: Row,
	base_defaults: Row,
) -> FixtureResult<Outcome> {
	let predicate = lookup_predicate(model, &base_where);
	if let Some(record) = model.find_one(&predicate).await? {
		tracing::debug!("Found {} {:?}", model.name(), record.key());
		return Ok(Outcome::Found(record));
	}

	let mut values = base_where;
	values.extend(base_defaults);
	let record = model.create(values).await?;
	tracing::debug!("Created {} {:?}", model.name(), record.key());
	Ok(Outcome::Created(record))
}

/// Keeps the persisted fields of `base`; derived fields are no lookup
/// predicate.
fn lookup_predicate(model: &dyn Model, base: &Row) -> Row {
	base.iter()
		.filter(|(field, _)| {
			let persisted = model.is_persisted(field);
			if !persisted {
				tracing::trace!("Dropping derived field {}.{} from lookup", model.name(), field);
			}
			persisted
		})
		.map(|(field, value)| (field.clone(), value.clone()))
		.collect()
}
