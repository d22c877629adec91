//! Find-or-create resolution of nested fixture descriptions.
//!
//! [`Resolver`] takes a model name and a description such as
//!
//! ```json
//! {
//!   "title": "Hello",
//!   "User": {"name": "Amy", "email": "amy@example.com"},
//!   "Comments": [{"text": "first"}, {"text": "second"}]
//! }
//! ```
//!
//! and finds or creates every record in it. `User` is a belongs-to
//! relationship of `Post`, so the user is resolved first and its key lands in
//! `Post.UserId`. `Comments` is a has-many relationship, so the comments are
//! resolved after the post exists, each with `PostId` set to the post's key.
//!
//! A description can also be given in the structured form
//! `{"where": .., "defaults": .., "sets": ..}`:
//!
//! - `where` fields are matched against existing records
//! - `defaults` fields are only used when the record has to be created
//! - `sets` fields are only written onto a record that already existed
//!
//! Repeating an identical description finds the record the first one
//! created. Nothing is cached, so two independent descriptions only meet in
//! the same record through their `where` fields. To share one resolution
//! between several places of a tree, pass one [`PendingRecord`] from
//! [`Resolver::pending`].
//!
//! [`PendingRecord`]: fixtree_core::PendingRecord

#![warn(missing_docs)]

mod dependents;
pub mod normalize;
mod prerequisites;
pub mod resolver;
pub mod split;

pub use normalize::{
	DEFAULTS_KEY, Normalized, NormalizedDescription, SETS_KEY, WHERE_KEY, normalize,
	normalize_input,
};
pub use resolver::{Resolved, Resolver};
pub use split::{Association, Split, split};
