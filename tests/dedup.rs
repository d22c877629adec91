//! Repeated references to one entity inside a fixture tree.

mod helpers;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use fixtree::memory::StoreOptions;
use fixtree::{FixtureError, Model, PendingRecord, ResolverConfig, StorageError, WriteMode};
use helpers::blog_schema::{Blog, blog, description};
use rstest::rstest;
use serde_json::json;

#[rstest]
#[tokio::test]
async fn test_shared_pending_resolves_once(blog: Blog) {
	// Arrange
	let resolver = blog.resolver();
	let rolf = resolver.pending("User", description(json!({"name": "Rolf"})));
	let input = description(json!({"title": "Second post", "body": "B"}))
		.with("User", rolf.clone())
		.with(
			"Comments",
			vec![
				description(json!({"body": "c1"})).with("User", rolf.clone()),
				description(json!({"body": "c2"})).with("User", rolf.clone()),
			],
		);

	// Act
	let post = resolver.resolve_one("Post", input).await.unwrap();

	// Assert
	let rolf = rolf.resolve().await.unwrap();
	assert_eq!(post.get("UserId"), rolf.key());
	assert_eq!(blog.users.count(), 1);
	assert!(
		blog.comments
			.all()
			.iter()
			.all(|comment| comment.get("UserId") == rolf.key())
	);
	// One user, one post, two comments.
	assert_eq!(blog.store.write_count(), 4);
}

#[rstest]
#[tokio::test]
async fn test_caller_future_as_pending(blog: Blog) {
	let users = blog.users.clone();
	let calls = Arc::new(AtomicUsize::new(0));
	let counter = calls.clone();
	let direct = PendingRecord::from_future(async move {
		counter.fetch_add(1, Ordering::SeqCst);
		let values = serde_json::from_value(json!({"name": "Direct"})).unwrap();
		Ok::<_, FixtureError>(users.create(values).await?)
	});

	let resolver = blog.resolver();
	for title in ["A", "B", "C"] {
		resolver
			.resolve_one(
				"Post",
				description(json!({"title": title})).with("User", direct.clone()),
			)
			.await
			.unwrap();
	}

	assert_eq!(calls.load(Ordering::SeqCst), 1);
	assert_eq!(blog.users.count(), 1);
	assert!(
		blog.posts
			.all()
			.iter()
			.all(|post| post.get("UserId") == Some(&json!(1)))
	);
}

#[rstest]
#[tokio::test]
async fn test_failed_pending_fails_every_reference(blog: Blog) {
	let resolver = blog.resolver();
	// Comment requires a post, so this resolution fails.
	let broken = resolver.pending("Comment", description(json!({"body": "orphan"})));

	let first = resolver
		.resolve_one("User", description(json!({"name": "Amy"})).with("Comments", broken.clone()))
		.await
		.unwrap_err();
	let second = broken.resolve().await.unwrap_err();

	assert!(
		matches!(first, FixtureError::Storage(StorageError::NotNull { ref model, .. }) if model == "Comment"),
		"Expected the storage failure itself, but got: {:?}",
		first
	);
	assert_eq!(first, second);
	assert_eq!(blog.comments.count(), 0);
}

#[rstest]
#[tokio::test]
async fn test_identical_descriptions_converge_through_gate() {
	// Arrange
	let blog = Blog::with_options(StoreOptions::new().with_write_latency(Duration::from_millis(5)));
	let resolver = blog.resolver();

	// Act
	let comment = resolver
		.resolve_one(
			"Comment",
			description(json!({
				"body": "Nice",
				"User": {"name": "Amy"},
				"Post": {"title": "T", "User": {"name": "Amy"}},
			})),
		)
		.await
		.unwrap();

	// Assert
	assert_eq!(blog.users.count(), 1);
	assert_eq!(comment.get("UserId"), Some(&json!(1)));
	assert_eq!(blog.posts.all()[0].get("UserId"), Some(&json!(1)));
}

#[rstest]
#[tokio::test]
async fn test_ungated_siblings_may_duplicate() {
	let blog = Blog::with_options(StoreOptions::new().with_write_latency(Duration::from_millis(5)));
	let resolver = blog.resolver_with(ResolverConfig::new().with_write_mode(WriteMode::Concurrent));

	resolver
		.resolve_one(
			"Comment",
			description(json!({
				"body": "Nice",
				"User": {"name": "Amy"},
				"Post": {"title": "T", "User": {"name": "Amy"}},
			})),
		)
		.await
		.unwrap();

	// Both siblings missed before either row was written.
	assert_eq!(blog.users.count(), 2);
}
