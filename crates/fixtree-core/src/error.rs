//! Error types for fixture resolution.
//!
//! Storage failures are kept in their own enum so that they travel through
//! every enclosing resolution untouched. Both enums are `Clone`: a failed
//! shared resolution hands the same error to every awaiter.

use thiserror::Error;

/// Errors raised by a storage engine while reading or writing rows.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
	/// A non-nullable column was missing or set to `null`.
	#[error("{model}.{field} cannot be null")]
	NotNull {
		/// Model the write targeted.
		model: String,
		/// Offending column.
		field: String,
	},

	/// A unique constraint would be violated.
	#[error("{model}: unique constraint violated on ({})", fields.join(", "))]
	Unique {
		/// Model the write targeted.
		model: String,
		/// Columns forming the violated constraint.
		fields: Vec<String>,
	},

	/// The write or lookup named a column the model does not have.
	#[error("{model} has no column named {field}")]
	UnknownColumn {
		/// Model the operation targeted.
		model: String,
		/// Unknown column.
		field: String,
	},

	/// The engine rejected a write because another write was in flight.
	#[error("{model}: write rejected, another write transaction is in progress")]
	WriteConflict {
		/// Model the rejected write targeted.
		model: String,
	},

	/// The record to update no longer exists.
	#[error("{model}: record not found")]
	RecordNotFound {
		/// Model the update targeted.
		model: String,
	},

	/// Any other backend failure.
	#[error("Backend error: {0}")]
	Backend(String),
}

/// Errors that can occur while resolving a fixture tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FixtureError {
	/// A description could not be classified or converted.
	#[error("Malformed description for {model}: {message}")]
	MalformedDescription {
		/// Model the description was resolved against.
		model: String,
		/// What was wrong with it.
		message: String,
	},

	/// Model was not found in the registry.
	#[error("Model not found: {0}")]
	UnknownModel(String),

	/// A relationship points at a model that is not registered.
	#[error("{model}.{field} refers to unregistered model {related}")]
	UnknownRelatedModel {
		/// Model declaring the relationship.
		model: String,
		/// Relationship field.
		field: String,
		/// Missing related model.
		related: String,
	},

	/// A record lacks the key a relationship joins on.
	#[error("{model} record has no value for key {field}")]
	MissingKey {
		/// Model of the record.
		model: String,
		/// Missing key field.
		field: String,
	},

	/// The storage layer failed; carried verbatim.
	#[error(transparent)]
	Storage(#[from] StorageError),

	/// Resolver configuration could not be read.
	#[error("Configuration error: {0}")]
	Config(String),
}

impl FixtureError {
	/// Creates a [`FixtureError::MalformedDescription`].
	pub fn malformed(model: impl Into<String>, message: impl Into<String>) -> Self {
		Self::MalformedDescription {
			model: model.into(),
			message: message.into(),
		}
	}

	/// Returns the storage error behind this failure, if any.
	pub fn storage(&self) -> Option<&StorageError> {
		match self {
			Self::Storage(err) => Some(err),
			_ => None,
		}
	}
}

/// Result type alias for fixture operations.
pub type FixtureResult<T> = Result<T, FixtureError>;
