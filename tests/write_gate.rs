//! Resolution against a store that rejects overlapping writes.

mod helpers;

use std::time::Duration;

use fixtree::memory::StoreOptions;
use fixtree::{ResolverConfig, Scheduling, StorageError, WriteMode};
use helpers::blog_schema::{Blog, description};
use rstest::{fixture, rstest};
use serde_json::json;

#[fixture]
fn exclusive_blog() -> Blog {
	Blog::with_options(
		StoreOptions::new()
			.with_exclusive_writes(true)
			.with_write_latency(Duration::from_millis(5)),
	)
}

fn comment_with_siblings() -> serde_json::Value {
	json!({
		"body": "Nice",
		"User": {"name": "Amy"},
		"Post": {
			"title": "T",
			"User": {"name": "Bob"},
			"Comments": [{"body": "first", "User": {"name": "Cid"}}],
		},
	})
}

#[rstest]
#[tokio::test]
async fn test_serialized_writes_never_conflict(exclusive_blog: Blog) {
	let resolver = exclusive_blog.resolver();

	let comment = resolver
		.resolve_one("Comment", description(comment_with_siblings()))
		.await
		.unwrap();

	assert_eq!(exclusive_blog.users.count(), 3);
	assert_eq!(exclusive_blog.posts.count(), 1);
	assert_eq!(exclusive_blog.comments.count(), 2);
	assert_eq!(comment.get("PostId"), Some(&json!(1)));
}

#[rstest]
#[tokio::test]
async fn test_ungated_concurrent_writes_conflict(exclusive_blog: Blog) {
	let resolver =
		exclusive_blog.resolver_with(ResolverConfig::new().with_write_mode(WriteMode::Concurrent));

	let err = resolver
		.resolve_one("Comment", description(comment_with_siblings()))
		.await
		.unwrap_err();

	assert!(matches!(
		err.storage(),
		Some(StorageError::WriteConflict { .. })
	));
}

#[rstest]
#[tokio::test]
async fn test_sequential_scheduling_without_gate(exclusive_blog: Blog) {
	let config = ResolverConfig::new()
		.with_write_mode(WriteMode::Concurrent)
		.with_prerequisites(Scheduling::Sequential)
		.with_dependents(Scheduling::Sequential);
	let resolver = exclusive_blog.resolver_with(config);

	resolver
		.resolve_one("Comment", description(comment_with_siblings()))
		.await
		.unwrap();

	assert_eq!(exclusive_blog.comments.count(), 2);
}

#[rstest]
#[tokio::test]
async fn test_sibling_to_many_fields_share_the_gate(exclusive_blog: Blog) {
	let resolver = exclusive_blog.resolver();

	resolver
		.resolve_one(
			"User",
			description(json!({
				"name": "Amy",
				"Articles": [{"title": "T1"}, {"title": "T2"}],
				"Comments": [{"body": "c", "Post": {"title": "Elsewhere"}}],
			})),
		)
		.await
		.unwrap();

	assert_eq!(exclusive_blog.posts.count(), 3);
	assert_eq!(exclusive_blog.comments.count(), 1);
	assert!(
		exclusive_blog
			.posts
			.all()
			.iter()
			.filter(|post| post.get("title") != Some(&json!("Elsewhere")))
			.all(|post| post.get("UserId") == Some(&json!(1)))
	);
}

#[rstest]
#[tokio::test]
async fn test_gate_mode_follows_config(exclusive_blog: Blog) {
	assert_eq!(exclusive_blog.resolver().gate().mode(), WriteMode::Serialized);
	let concurrent =
		exclusive_blog.resolver_with(ResolverConfig::new().with_write_mode(WriteMode::Concurrent));
	assert_eq!(concurrent.gate().mode(), WriteMode::Concurrent);
}
