//! # fixtree
//!
//! Recursive find-or-create fixture trees for relational object models.
//!
//! Test data is declared as plain nested data: a post that belongs to a user
//! and has two comments, each written by a user. fixtree finds or creates every
//! record in that tree, writing belongs-to relationships before their owner and
//! has-many relationships after it, and returns the persisted records.
//!
//! ## Crates
//!
//! - `fixtree-core` - descriptions, relationship metadata, the [`Model`]
//!   capability a storage engine implements, the [`WriteGate`]
//! - `fixtree-resolver` - the [`Resolver`]
//! - `fixtree-memory` - an in-memory storage engine (feature `memory`, on by
//!   default)
//!
//! ## Quick Example
//!
//! ```
//! use std::sync::Arc;
//! use fixtree::prelude::*;
//! use fixtree::memory::MemoryStore;
//!
//! # tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(async {
//! let store = MemoryStore::new();
//! let registry = ModelRegistry::new()
//!     .with(
//!         store
//!             .model("User")
//!             .column("name")
//!             .has_many("Articles", "Post", "UserId")
//!             .build(),
//!     )
//!     .with(
//!         store
//!             .model("Post")
//!             .column("title")
//!             .optional_belongs_to("User", "User", "UserId")
//!             .build(),
//!     );
//! let resolver = Resolver::new(Arc::new(registry));
//!
//! let amy = resolver
//!     .resolve_one(
//!         "User",
//!         Description::try_from(json!({
//!             "name": "Amy",
//!             "Articles": [{"title": "T1"}, {"title": "T2"}],
//!         }))?,
//!     )
//!     .await?;
//!
//! assert_eq!(amy.key(), Some(&json!(1)));
//! assert_eq!(store.count("Post"), 2);
//! # Ok::<(), FixtureError>(())
//! # }).unwrap();
//! ```
//!
//! ## Configuration
//!
//! [`ResolverConfig`] can be built in code or read from TOML:
//!
//! ```toml
//! [resolver]
//! write_mode = "serialized"   # or "concurrent"
//! prerequisites = "concurrent" # or "sequential"
//! dependents = "sequential"
//! ```

pub mod factory;

pub use factory::{FixtureFactories, FixtureFactory, build_fixture_factories};
pub use fixtree_core::{
	DEFAULT_KEY, Description, FieldValue, FixtureError, FixtureResult, Model, ModelRegistry,
	PendingRecord, Record, Relationship, RelationshipKind, ResolverConfig, Row, Scheduling,
	StorageError, WriteGate, WriteMode,
};
pub use fixtree_resolver::{Resolved, Resolver, normalize, split};

/// In-memory storage engine.
#[cfg(feature = "memory")]
pub use fixtree_memory as memory;

/// Commonly used types.
pub mod prelude {
	pub use crate::factory::{FixtureFactories, FixtureFactory, build_fixture_factories};
	pub use fixtree_core::{
		Description, FieldValue, FixtureError, FixtureResult, Model, ModelRegistry, PendingRecord,
		Record, Relationship, ResolverConfig, Row, StorageError,
	};
	pub use fixtree_resolver::{Resolved, Resolver};
	pub use serde_json::json;
}
