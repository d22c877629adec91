//! Table storage shared by all models of one store.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use fixtree_core::{Row, StorageError};
use parking_lot::Mutex;

use crate::model::ModelBuilder;

/// Options for a [`MemoryStore`].
#[derive(Debug, Clone, Default)]
pub struct StoreOptions {
	/// Reject a write that starts while another one is in flight, the way an
	/// engine with a single store-wide write lock does.
	pub exclusive_writes: bool,

	/// Time each write stays in flight.
	pub write_latency: Option<Duration>,
}

impl StoreOptions {
	/// Creates default options.
	pub fn new() -> Self {
		Self::default()
	}

	/// Sets the exclusive writes flag.
	pub fn with_exclusive_writes(mut self, exclusive: bool) -> Self {
		self.exclusive_writes = exclusive;
		self
	}

	/// Sets the write latency.
	pub fn with_write_latency(mut self, latency: Duration) -> Self {
		self.write_latency = Some(latency);
		self
	}
}

#[derive(Debug, Default)]
pub(crate) struct Table {
	pub(crate) rows: BTreeMap<i64, Row>,
	pub(crate) next_id: i64,
}

impl Table {
	pub(crate) fn allocate_id(&mut self) -> i64 {
		self.next_id += 1;
		self.next_id
	}

	pub(crate) fn reserve_id(&mut self, id: i64) {
		self.next_id = self.next_id.max(id);
	}
}

#[derive(Debug, Default)]
struct StoreInner {
	options: StoreOptions,
	tables: Mutex<HashMap<String, Table>>,
	writing: AtomicBool,
	writes: AtomicUsize,
}

/// An in-memory relational store.
///
/// Cloning the store yields another handle to the same tables.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
	inner: Arc<StoreInner>,
}

/// Marks a write as in flight until dropped.
pub(crate) struct WriteGuard<'a> {
	store: &'a StoreInner,
	held: bool,
}

impl Drop for WriteGuard<'_> {
	fn drop(&mut self) {
		if self.held {
			self.store.writing.store(false, Ordering::SeqCst);
		}
	}
}

impl MemoryStore {
	/// Creates an empty store with default options.
	pub fn new() -> Self {
		Self::with_options(StoreOptions::default())
	}

	/// Creates an empty store.
	pub fn with_options(options: StoreOptions) -> Self {
		Self {
			inner: Arc::new(StoreInner {
				options,
				..StoreInner::default()
			}),
		}
	}

	/// Creates an empty store that rejects overlapping writes.
	pub fn exclusive() -> Self {
		Self::with_options(StoreOptions::new().with_exclusive_writes(true))
	}

	/// Returns the store options.
	pub fn options(&self) -> &StoreOptions {
		&self.inner.options
	}

	/// Starts declaring a model stored in this store.
	pub fn model(&self, name: impl Into<String>) -> ModelBuilder {
		ModelBuilder::new(self.clone(), name)
	}

	/// Returns the rows of `table` in key order.
	pub fn rows(&self, table: &str) -> Vec<Row> {
		self.inner
			.tables
			.lock()
			.get(table)
			.map(|t| t.rows.values().cloned().collect())
			.unwrap_or_default()
	}

	/// Returns the number of rows in `table`.
	pub fn count(&self, table: &str) -> usize {
		self.inner
			.tables
			.lock()
			.get(table)
			.map_or(0, |t| t.rows.len())
	}

	/// Returns the number of successful and failed writes so far.
	pub fn write_count(&self) -> usize {
		self.inner.writes.load(Ordering::SeqCst)
	}

	/// Removes every row, keeping the tables.
	pub fn truncate(&self) {
		for table in self.inner.tables.lock().values_mut() {
			*table = Table::default();
		}
	}

	pub(crate) fn create_table(&self, name: &str) {
		self.inner
			.tables
			.lock()
			.entry(name.to_string())
			.or_default();
	}

	pub(crate) fn with_table<R>(&self, name: &str, f: impl FnOnce(&mut Table) -> R) -> R {
		let mut tables = self.inner.tables.lock();
		f(tables.entry(name.to_string()).or_default())
	}

	/// Opens a write. Fails if the store is exclusive and a write is in flight.
	pub(crate) fn begin_write(&self, model: &str) -> Result<WriteGuard<'_>, StorageError> {
		self.inner.writes.fetch_add(1, Ordering::SeqCst);
		if !self.inner.options.exclusive_writes {
			return Ok(WriteGuard {
				store: &self.inner,
				held: false,
			});
		}
		if self.inner.writing.swap(true, Ordering::SeqCst) {
			tracing::debug!("Rejecting overlapping write on {}", model);
			return Err(StorageError::WriteConflict {
				model: model.to_string(),
			});
		}
		Ok(WriteGuard {
			store: &self.inner,
			held: true,
		})
	}

	pub(crate) async fn write_latency(&self) {
		if let Some(latency) = self.inner.options.write_latency {
			tokio::time::sleep(latency).await;
		}
	}
}
