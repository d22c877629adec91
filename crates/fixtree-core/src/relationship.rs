//! Relationship metadata.

use serde::{Deserialize, Serialize};

/// Default identity field used as join key.
pub const DEFAULT_KEY: &str = "id";

/// Which side of a relationship stores the foreign key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipKind {
	/// The owning record stores the foreign key (belongs-to). The related
	/// record has to exist before the owner is written.
	ToOne,
	/// The related records store the foreign key (has-many, has-one). They
	/// can only be written once the owner has an identity.
	ToMany,
}

/// How a relationship field of one model joins another model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relationship {
	/// Relationship kind.
	pub kind: RelationshipKind,
	/// Name of the related model.
	pub related_model: String,
	/// Column holding the foreign key. Lives on the owner for
	/// [`RelationshipKind::ToOne`] and on the related model otherwise.
	pub foreign_key: String,
	/// Key on the owner that dependents point at.
	pub source_key: String,
	/// Key on the related model that the owner's foreign key points at.
	pub target_key: String,
}

impl Relationship {
	/// A belongs-to relationship joined on the related model's `id`.
	pub fn belongs_to(related_model: impl Into<String>, foreign_key: impl Into<String>) -> Self {
		let foreign_key = foreign_key.into();
		Self {
			kind: RelationshipKind::ToOne,
			related_model: related_model.into(),
			source_key: foreign_key.clone(),
			foreign_key,
			target_key: DEFAULT_KEY.to_string(),
		}
	}

	/// A has-many (or has-one) relationship keyed by the owner's `id`.
	pub fn has_many(related_model: impl Into<String>, foreign_key: impl Into<String>) -> Self {
		let foreign_key = foreign_key.into();
		Self {
			kind: RelationshipKind::ToMany,
			related_model: related_model.into(),
			target_key: foreign_key.clone(),
			foreign_key,
			source_key: DEFAULT_KEY.to_string(),
		}
	}

	/// Overrides the owner-side join key.
	pub fn with_source_key(mut self, key: impl Into<String>) -> Self {
		self.source_key = key.into();
		self
	}

	/// Overrides the related-side join key.
	pub fn with_target_key(mut self, key: impl Into<String>) -> Self {
		self.target_key = key.into();
		self
	}

	/// Returns true if the related record must be resolved before the owner.
	pub fn is_to_one(&self) -> bool {
		self.kind == RelationshipKind::ToOne
	}
}
