//! Blog schema: users write posts, posts and users have comments.
//!
//! - `User` has many `Post` (as `Articles`) and many `Comment`
//! - `Post` optionally belongs to `User` and has many `Comment`
//! - `Comment` belongs to both `User` and `Post`
//!
//! `User.email` is unique and `User.nickname` is a derived field.

use std::sync::Arc;

use fixtree::memory::{MemoryModel, MemoryStore, StoreOptions};
use fixtree::{Description, ModelRegistry, Resolver, ResolverConfig};
use rstest::fixture;

/// The blog models sharing one store.
pub struct Blog {
	pub store: MemoryStore,
	pub users: Arc<MemoryModel>,
	pub posts: Arc<MemoryModel>,
	pub comments: Arc<MemoryModel>,
	pub registry: Arc<ModelRegistry>,
}

impl Blog {
	pub fn new() -> Self {
		Self::with_options(StoreOptions::default())
	}

	pub fn with_options(options: StoreOptions) -> Self {
		let store = MemoryStore::with_options(options);
		let users = store
			.model("User")
			.column("name")
			.nullable("email")
			.nullable("isActive")
			.unique(["email"])
			.derived("nickname")
			.has_many("Articles", "Post", "UserId")
			.has_many("Comments", "Comment", "UserId")
			.build();
		let posts = store
			.model("Post")
			.column("title")
			.nullable("body")
			.optional_belongs_to("User", "User", "UserId")
			.has_many("Comments", "Comment", "PostId")
			.build();
		let comments = store
			.model("Comment")
			.column("body")
			.belongs_to("User", "User", "UserId")
			.belongs_to("Post", "Post", "PostId")
			.build();
		let registry = ModelRegistry::new()
			.with(users.clone())
			.with(posts.clone())
			.with(comments.clone());

		Self {
			store,
			users,
			posts,
			comments,
			registry: Arc::new(registry),
		}
	}

	pub fn resolver(&self) -> Resolver {
		Resolver::new(self.registry.clone())
	}

	pub fn resolver_with(&self, config: ResolverConfig) -> Resolver {
		Resolver::with_config(self.registry.clone(), config)
	}
}

#[fixture]
pub fn blog() -> Blog {
	Blog::new()
}

/// Builds a description from a JSON object.
pub fn description(value: serde_json::Value) -> Description {
	Description::try_from(value).unwrap()
}
