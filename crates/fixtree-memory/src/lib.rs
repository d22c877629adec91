//! In-memory reference storage engine for fixtree.
//!
//! Every model built from one [`MemoryStore`] shares its tables. Rows get
//! auto-increment integer keys starting at 1, and writes are validated for
//! unknown columns, not-null columns and unique constraints. Derived fields
//! are accepted on create and returned on the record, but never persisted.
//!
//! A store created with [`StoreOptions::exclusive_writes`] rejects a write
//! that starts while another is still in flight, which makes it a stand-in for
//! embedded engines that lock the whole store per write transaction.
//!
//! ```
//! # use fixtree_core::Model;
//! # use fixtree_memory::MemoryStore;
//! # use serde_json::json;
//! # tokio_test_block_on(async {
//! let store = MemoryStore::new();
//! let users = store.model("User").column("name").build();
//! let amy = users
//!     .create(serde_json::from_value(json!({"name": "Amy"})).unwrap())
//!     .await
//!     .unwrap();
//! assert_eq!(amy.key(), Some(&json!(1)));
//! # });
//! # fn tokio_test_block_on<F: std::future::Future>(f: F) -> F::Output {
//! #     tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(f)
//! # }
//! ```

#![warn(missing_docs)]

pub mod model;
pub mod store;

pub use model::{MemoryModel, ModelBuilder};
pub use store::{MemoryStore, StoreOptions};
