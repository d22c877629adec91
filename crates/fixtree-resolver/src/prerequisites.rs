//! To-one (belongs-to) resolution.
//!
//! The related records are resolved before their owner is looked up or
//! written, and their keys are copied into the owner's foreign key fields.

use std::sync::Arc;

use fixtree_core::{FieldValue, FixtureError, FixtureResult, Model, Record, Row, Scheduling};
use futures::FutureExt;
use futures::future::{BoxFuture, try_join_all};
use serde_json::Value;

use crate::resolver::Resolver;
use crate::split::Association;

/// Resolves `associations` and writes their keys into `base`.
///
/// `base` is only touched once every association resolved; on failure it is
/// left as it was.
pub(crate) async fn resolve_prerequisites(
	resolver: &Resolver,
	model: &Arc<dyn Model>,
	associations: Vec<Association>,
	base: &mut Row,
) -> FixtureResult<()> {
	if associations.is_empty() {
		return Ok(());
	}

	let keys = match resolver.config().prerequisites {
		Scheduling::Concurrent => {
			try_join_all(
				associations
					.into_iter()
					.map(|association| foreign_key(resolver, model, association)),
			)
			.await?
		}
		Scheduling::Sequential => {
			let mut keys = Vec::with_capacity(associations.len());
			for association in associations {
				keys.push(foreign_key(resolver, model, association).await?);
			}
			keys
		}
	};

	for (field, key) in keys {
		tracing::trace!("Setting {}.{} = {}", model.name(), field, key);
		base.insert(field, key);
	}
	Ok(())
}

/// Resolves one association into its foreign key field and value.
fn foreign_key(
	resolver: &Resolver,
	model: &Arc<dyn Model>,
	association: Association,
) -> BoxFuture<'static, FixtureResult<(String, Value)>> {
	let resolver = resolver.clone();
	let model = model.clone();
	async move {
		let Association {
			field,
			relationship,
			value,
		} = association;
		let related = resolver.related_model(&*model, &field, &relationship)?;
		let key = target_key(resolver, related, relationship.target_key, value).await?;
		Ok((relationship.foreign_key, key))
	}
	.boxed()
}

/// Resolves a to-one value into the key its owner stores.
///
/// `null` stays `null`. A sequence yields the keys of its elements, resolved
/// one after the other.
fn target_key(
	resolver: Resolver,
	related: Arc<dyn Model>,
	key_field: String,
	value: FieldValue,
) -> BoxFuture<'static, FixtureResult<Value>> {
	async move {
		match value {
			FieldValue::Null => Ok(Value::Null),
			FieldValue::List(items) => {
				let mut keys = Vec::with_capacity(items.len());
				for item in items {
					keys.push(
						target_key(resolver.clone(), related.clone(), key_field.clone(), item)
							.await?,
					);
				}
				Ok(Value::Array(keys))
			}
			FieldValue::Scalar(scalar) => Err(FixtureError::malformed(
				related.name(),
				format!("expected a description or a record, got scalar {}", scalar),
			)),
			value => {
				let record = resolver.resolve_related(related, value).await?;
				key_of(&record, &key_field)
			}
		}
	}
	.boxed()
}

pub(crate) fn key_of(record: &Record, field: &str) -> FixtureResult<Value> {
	match record.get(field) {
		Some(value) if !value.is_null() => Ok(value.clone()),
		_ => Err(FixtureError::MissingKey {
			model: record.model().to_string(),
			field: field.to_string(),
		}),
	}
}
