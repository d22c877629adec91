//! Core types for fixtree.
//!
//! This crate holds everything the resolver and a storage engine have to
//! agree on:
//!
//! - [`Description`] / [`FieldValue`]: caller-supplied nested fixture data
//! - [`Relationship`]: read-only relationship metadata of a model
//! - [`Model`]: the capability surface a storage engine implements
//! - [`ModelRegistry`]: models looked up by name
//! - [`Record`] / [`PendingRecord`]: resolved and in-flight rows
//! - [`WriteGate`]: the serialized-write primitive
//! - [`ResolverConfig`]: scheduling options
//!
//! The resolution algorithm itself lives in `fixtree-resolver`.

#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod gate;
pub mod model;
pub mod record;
pub mod relationship;
pub mod value;

pub use config::{ResolverConfig, Scheduling, WriteMode};
pub use error::{FixtureError, FixtureResult, StorageError};
pub use gate::WriteGate;
pub use model::{Model, ModelRegistry};
pub use record::{PendingRecord, Record};
pub use relationship::{DEFAULT_KEY, Relationship, RelationshipKind};
pub use value::{Description, FieldValue, Row};
