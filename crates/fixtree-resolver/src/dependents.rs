//! To-many (has-many, has-one) resolution.
//!
//! Runs once the owner is persisted. Each child gets the owner's key in its
//! foreign key field and is then found or created like any top-level
//! description. The owner's key overrides any foreign key value the child
//! itself names. Children listed under one field are resolved in input order.

use std::sync::Arc;

use fixtree_core::{FieldValue, FixtureError, FixtureResult, Model, Record, Row, Scheduling};
use futures::FutureExt;
use futures::future::{BoxFuture, try_join_all};
use serde_json::Value;

use crate::normalize::normalize;
use crate::prerequisites::key_of;
use crate::resolver::{ParentKey, Resolver};
use crate::split::Association;

/// Resolves the to-many `associations` of `parent`.
pub(crate) async fn resolve_dependents(
	resolver: &Resolver,
	model: &Arc<dyn Model>,
	parent: &Record,
	associations: Vec<Association>,
) -> FixtureResult<()> {
	if associations.is_empty() {
		return Ok(());
	}

	let mut fields = Vec::with_capacity(associations.len());
	for association in associations {
		let related =
			resolver.related_model(&**model, &association.field, &association.relationship)?;
		let parent_key = key_of(parent, &association.relationship.source_key)?;
		fields.push(resolve_field(
			resolver.clone(),
			related,
			association.relationship.foreign_key,
			parent_key,
			association.value,
		));
	}

	match resolver.config().dependents {
		Scheduling::Concurrent => {
			try_join_all(fields).await?;
		}
		Scheduling::Sequential => {
			for field in fields {
				field.await?;
			}
		}
	}
	Ok(())
}

/// Resolves the children under one relationship field, in order.
fn resolve_field(
	resolver: Resolver,
	related: Arc<dyn Model>,
	foreign_key: String,
	parent_key: Value,
	value: FieldValue,
) -> BoxFuture<'static, FixtureResult<()>> {
	async move {
		match value {
			FieldValue::Null => Ok(()),
			FieldValue::List(children) => {
				for child in children {
					resolve_field(
						resolver.clone(),
						related.clone(),
						foreign_key.clone(),
						parent_key.clone(),
						child,
					)
					.await?;
				}
				Ok(())
			}
			FieldValue::Nested(description) => {
				tracing::trace!(
					"Setting {}.{} = {} on dependent",
					related.name(),
					foreign_key,
					parent_key
				);
				let parent = ParentKey {
					field: foreign_key,
					value: parent_key,
				};
				resolver
					.resolve_child(related, normalize(description), parent)
					.await?;
				Ok(())
			}
			FieldValue::Scalar(scalar) => Err(FixtureError::malformed(
				related.name(),
				format!("expected a description or a record, got scalar {}", scalar),
			)),
			value => {
				let record = resolver.resolve_related(related.clone(), value).await?;
				attach(&resolver, &*related, record, foreign_key, parent_key).await
			}
		}
	}
	.boxed()
}

/// Points an existing child record at its new parent.
async fn attach(
	resolver: &Resolver,
	related: &dyn Model,
	record: Record,
	foreign_key: String,
	parent_key: Value,
) -> FixtureResult<()> {
	let current = record.get(&foreign_key).cloned().unwrap_or(Value::Null);
	if current == parent_key {
		return Ok(());
	}
	if !current.is_null() {
		tracing::warn!(
			"Re-pointing {} {:?} from {} = {} to {}",
			related.name(),
			record.key(),
			foreign_key,
			current,
			parent_key
		);
	}

	let mut values = Row::new();
	values.insert(foreign_key, parent_key);
	let updated = resolver.gate().run(related.update(&record, values)).await?;
	tracing::debug!("Updated {} {:?}", related.name(), updated.key());
	Ok(())
}
