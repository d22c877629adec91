//! Resolver configuration.

use serde::{Deserialize, Serialize};

use crate::error::{FixtureError, FixtureResult};

/// How create and update calls reach the storage layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteMode {
	/// One write at a time, each fully completed before the next starts.
	/// Required for engines that lock the whole store per write.
	#[default]
	Serialized,
	/// Writes go straight to the storage layer and may overlap.
	Concurrent,
}

/// How sibling relationships of one record are scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scheduling {
	/// Siblings are started together and awaited as a group.
	#[default]
	Concurrent,
	/// Each sibling is fully resolved before the next one starts.
	Sequential,
}

/// Options controlling fixture resolution.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
	/// Write scheduling against the storage layer.
	pub write_mode: WriteMode,

	/// Scheduling of sibling to-one relationships.
	pub prerequisites: Scheduling,

	/// Scheduling of distinct to-many relationship fields. Children listed
	/// under one field are always resolved in order.
	pub dependents: Scheduling,
}

#[derive(Deserialize)]
struct ConfigFile {
	#[serde(default)]
	resolver: ResolverConfig,
}

impl ResolverConfig {
	/// Creates the default configuration.
	pub fn new() -> Self {
		Self::default()
	}

	/// Sets the write mode.
	pub fn with_write_mode(mut self, mode: WriteMode) -> Self {
		self.write_mode = mode;
		self
	}

	/// Sets scheduling for to-one relationships.
	pub fn with_prerequisites(mut self, scheduling: Scheduling) -> Self {
		self.prerequisites = scheduling;
		self
	}

	/// Sets scheduling for to-many relationship fields.
	pub fn with_dependents(mut self, scheduling: Scheduling) -> Self {
		self.dependents = scheduling;
		self
	}

	/// Reads the `[resolver]` table of a TOML document.
	///
	/// Missing keys fall back to their defaults.
	///
	/// # Example
	///
	/// ```
	/// # use fixtree_core::{ResolverConfig, Scheduling, WriteMode};
	/// let config = ResolverConfig::from_toml_str(r#"
	///     [resolver]
	///     write_mode = "concurrent"
	///     prerequisites = "sequential"
	/// "#).unwrap();
	/// assert_eq!(config.write_mode, WriteMode::Concurrent);
	/// assert_eq!(config.prerequisites, Scheduling::Sequential);
	/// assert_eq!(config.dependents, Scheduling::Concurrent);
	/// ```
	pub fn from_toml_str(source: &str) -> FixtureResult<Self> {
		toml::from_str::<ConfigFile>(source)
			.map(|file| file.resolver)
			.map_err(|e| FixtureError::Config(e.to_string()))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_defaults() {
		let config = ResolverConfig::new();
		assert_eq!(config.write_mode, WriteMode::Serialized);
		assert_eq!(config.prerequisites, Scheduling::Concurrent);
		assert_eq!(config.dependents, Scheduling::Concurrent);
	}

	#[rstest]
	fn test_builder() {
		let config = ResolverConfig::new()
			.with_write_mode(WriteMode::Concurrent)
			.with_prerequisites(Scheduling::Sequential)
			.with_dependents(Scheduling::Sequential);

		assert_eq!(config.write_mode, WriteMode::Concurrent);
		assert_eq!(config.prerequisites, Scheduling::Sequential);
		assert_eq!(config.dependents, Scheduling::Sequential);
	}

	#[rstest]
	fn test_empty_document_uses_defaults() {
		let config = ResolverConfig::from_toml_str("").unwrap();
		assert_eq!(config, ResolverConfig::default());
	}

	#[rstest]
	fn test_invalid_value_is_config_error() {
		let result = ResolverConfig::from_toml_str(
			r#"
			[resolver]
			write_mode = "sometimes"
			"#,
		);
		assert!(matches!(result, Err(FixtureError::Config(_))));
	}
}
