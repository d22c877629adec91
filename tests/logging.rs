//! Log output of the resolver.

mod helpers;

use std::sync::{Arc, Mutex};

use helpers::blog_schema::{Blog, blog, description};
use rstest::rstest;
use serde_json::json;
use tracing_subscriber::layer::SubscriberExt as _;
use tracing_subscriber::util::SubscriberInitExt as _;

/// A tracing layer that captures log messages to a Vec<String>
struct LogCapture {
	logs: Arc<Mutex<Vec<String>>>,
}

impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for LogCapture {
	fn on_event(&self, event: &tracing::Event<'_>, _ctx: tracing_subscriber::layer::Context<'_, S>) {
		struct MessageVisitor {
			message: String,
		}

		impl tracing::field::Visit for MessageVisitor {
			fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
				if field.name() == "message" {
					self.message = format!("{:?}", value);
				}
			}
		}

		let mut visitor = MessageVisitor {
			message: String::new(),
		};
		event.record(&mut visitor);

		let mut logs = self.logs.lock().unwrap();
		logs.push(format!("[{}] {}", event.metadata().level(), visitor.message));
	}
}

fn capture() -> (Arc<Mutex<Vec<String>>>, tracing::dispatcher::DefaultGuard) {
	let logs = Arc::new(Mutex::new(Vec::new()));
	let capture = LogCapture { logs: logs.clone() };
	let guard = tracing_subscriber::registry().with(capture).set_default();
	(logs, guard)
}

#[rstest]
#[tokio::test]
async fn test_repointing_a_child_logs_warning(blog: Blog) {
	// Arrange
	let resolver = blog.resolver();
	resolver
		.resolve_one("Post", description(json!({"title": "A"})))
		.await
		.unwrap();
	let comment = resolver
		.resolve_one(
			"Comment",
			description(json!({"body": "moved", "User": {"name": "Amy"}, "Post": {"title": "A"}})),
		)
		.await
		.unwrap();
	let (logs, _guard) = capture();

	// Act
	resolver
		.resolve_one(
			"Post",
			description(json!({"title": "B"})).with("Comments", vec![fixtree::FieldValue::from(comment)]),
		)
		.await
		.unwrap();

	// Assert
	let captured = logs.lock().unwrap();
	assert!(
		captured
			.iter()
			.any(|log| log.contains("WARN") && log.contains("Re-pointing Comment")),
		"Expected re-pointing warning, but got: {:?}",
		*captured
	);
	assert_eq!(blog.comments.get(1).unwrap().get("PostId"), Some(&json!(2)));
}

#[rstest]
#[tokio::test]
async fn test_found_and_created_are_logged(blog: Blog) {
	let (logs, _guard) = capture();
	let resolver = blog.resolver();

	resolver.resolve_one("User", description(json!({"name": "Amy"}))).await.unwrap();
	resolver.resolve_one("User", description(json!({"name": "Amy"}))).await.unwrap();

	let captured = logs.lock().unwrap();
	assert!(captured.iter().any(|log| log.contains("DEBUG") && log.contains("Created User")));
	assert!(captured.iter().any(|log| log.contains("DEBUG") && log.contains("Found User")));
	assert!(!captured.iter().any(|log| log.contains("WARN")));
}

#[rstest]
#[tokio::test]
async fn test_overridden_child_foreign_key_logs_warning(blog: Blog) {
	let resolver = blog.resolver();
	let (logs, _guard) = capture();

	resolver
		.resolve_one(
			"User",
			description(json!({
				"name": "Amy",
				"Articles": [{"title": "T", "User": {"name": "Bob"}}],
			})),
		)
		.await
		.unwrap();

	let captured = logs.lock().unwrap();
	assert!(
		captured
			.iter()
			.any(|log| log.contains("WARN") && log.contains("Ignoring Post.UserId = 2")),
		"Expected override warning, but got: {:?}",
		*captured
	);
}
