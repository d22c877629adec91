//! Relationship splitting.
//!
//! A field bucket is partitioned into base fields, which go to the storage
//! layer as they are, and associations, which are resolved against another
//! model. The model's relationship table decides which is which; the shape of
//! the value never does.

use fixtree_core::{
	Description, FieldValue, FixtureError, FixtureResult, Model, Relationship, Row,
};
use indexmap::IndexMap;

/// A relationship-valued field of a description.
#[derive(Debug, Clone, PartialEq)]
pub struct Association {
	/// Field name the relationship is declared under.
	pub field: String,
	/// Relationship metadata copied from the model.
	pub relationship: Relationship,
	/// The caller's value for the field.
	pub value: FieldValue,
}

/// A field bucket partitioned into base fields and associations.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Split {
	/// Storage values of the non-relational fields.
	pub base: Row,
	/// Relationship-valued fields, in input order.
	pub associations: IndexMap<String, Association>,
}

impl Split {
	/// Returns true if the bucket had no fields at all.
	pub fn is_empty(&self) -> bool {
		self.base.is_empty() && self.associations.is_empty()
	}

	/// Separates the associations by kind.
	///
	/// Returns the base fields, the to-one associations and the to-many
	/// associations.
	pub fn into_parts(self) -> (Row, Vec<Association>, Vec<Association>) {
		let (to_one, to_many) = self
			.associations
			.into_values()
			.partition(|association| association.relationship.is_to_one());
		(self.base, to_one, to_many)
	}
}

/// Partitions `description` using the relationship metadata of `model`.
///
/// Base values must have a storage representation: a record or a pending
/// record under a field that is not a declared relationship is rejected.
pub fn split(model: &dyn Model, description: Description) -> FixtureResult<Split> {
	let mut out = Split::default();
	for (field, value) in description {
		if let Some(relationship) = model.relationship(&field) {
			out.associations.insert(
				field.clone(),
				Association {
					field,
					relationship: relationship.clone(),
					value,
				},
			);
			continue;
		}

		let stored = value.to_storage_value().ok_or_else(|| {
			FixtureError::malformed(
				model.name(),
				format!(
					"{} is not a relationship and cannot hold a {}",
					field,
					value.kind()
				),
			)
		})?;
		out.base.insert(field, stored);
	}

	tracing::trace!(
		"Split {} fields into {} base and {} relational",
		model.name(),
		out.base.len(),
		out.associations.len()
	);
	Ok(out)
}
