//! Test helpers for fixtree integration tests.
//!
//! This module provides the blog schema shared by the scenario tests.

#[path = "helpers/blog_schema.rs"]
pub mod blog_schema;
