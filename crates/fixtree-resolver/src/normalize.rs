//! Descriptor normalization.
//!
//! Every description becomes one `{ where, defaults, sets }` triple:
//!
//! - `where` fields identify the record and are used for the lookup
//! - `defaults` fields are only written when the record is created
//! - `sets` fields are only written onto a record that already existed
//!
//! A description is read in the structured form only if it has a `where` key
//! holding a description and no keys other than `where`, `defaults` and
//! `sets`. Anything else is a flat description: all of it is `where`.
//!
//! In the structured form, a `defaults` or `sets` bucket that is `null` or
//! not a description at all is an empty bucket.

use fixtree_core::{Description, FieldValue, FixtureError, FixtureResult};

/// Key of the lookup bucket in the structured form.
pub const WHERE_KEY: &str = "where";
/// Key of the create-only bucket in the structured form.
pub const DEFAULTS_KEY: &str = "defaults";
/// Key of the update-only bucket in the structured form.
pub const SETS_KEY: &str = "sets";

/// A description split into its three field buckets.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedDescription {
	/// Fields identifying the record (the `where` bucket).
	pub lookup: Description,
	/// Fields written only on creation.
	pub defaults: Description,
	/// Fields written only onto an existing record.
	pub sets: Description,
}

impl NormalizedDescription {
	/// A triple with only lookup fields.
	pub fn lookup_only(lookup: Description) -> Self {
		Self {
			lookup,
			..Self::default()
		}
	}
}

/// The normalized form of a top-level input.
#[derive(Debug, Clone, PartialEq)]
pub enum Normalized {
	/// A single description.
	One(NormalizedDescription),
	/// A sequence of descriptions, flattened in input order.
	Many(Vec<NormalizedDescription>),
}

impl Normalized {
	/// Returns the number of descriptions.
	pub fn len(&self) -> usize {
		match self {
			Self::One(_) => 1,
			Self::Many(items) => items.len(),
		}
	}

	/// Returns true for an empty sequence.
	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}
}

/// Classifies one description into its three buckets.
///
/// Never fails: every description is either structured or flat.
///
/// # Example
///
/// ```
/// # use fixtree_core::Description;
/// # use fixtree_resolver::normalize;
/// # use serde_json::json;
/// let structured = Description::try_from(json!({
///     "where": {"email": "amy@example.com"},
///     "defaults": {"name": "Amy"},
/// })).unwrap();
/// let normalized = normalize(structured);
/// assert!(normalized.lookup.contains("email"));
/// assert!(normalized.defaults.contains("name"));
/// assert!(normalized.sets.is_empty());
///
/// // Extra keys next to `where` make it a flat description.
/// let flat = Description::try_from(json!({"where": {"a": 1}, "name": "x"})).unwrap();
/// assert_eq!(normalize(flat.clone()).lookup, flat);
/// ```
pub fn normalize(description: Description) -> NormalizedDescription {
	if !is_structured(&description) {
		return NormalizedDescription::lookup_only(description);
	}

	let mut normalized = NormalizedDescription::default();
	for (key, value) in description {
		let bucket = match value {
			FieldValue::Nested(bucket) => bucket,
			FieldValue::Null => Description::new(),
			other => {
				tracing::warn!("Ignoring {} bucket holding a {}", key, other.kind());
				Description::new()
			}
		};
		match key.as_str() {
			WHERE_KEY => normalized.lookup = bucket,
			DEFAULTS_KEY => normalized.defaults = bucket,
			_ => normalized.sets = bucket,
		}
	}
	normalized
}

fn is_structured(description: &Description) -> bool {
	matches!(description.get(WHERE_KEY), Some(FieldValue::Nested(_)))
		&& description
			.keys()
			.all(|key| matches!(key, WHERE_KEY | DEFAULTS_KEY | SETS_KEY))
}

/// Normalizes a top-level input: a description or a sequence of them.
///
/// `defaults` follows the positional convention: a sequence of defaults is
/// paired element-wise with a sequence input, a single defaults description
/// applies to every element. Paired defaults are layered over the element's
/// own `defaults` bucket.
pub fn normalize_input(
	model: &str,
	input: FieldValue,
	defaults: Option<FieldValue>,
) -> FixtureResult<Normalized> {
	match input {
		FieldValue::Nested(description) => {
			let extra = match defaults {
				None | Some(FieldValue::Null) => None,
				Some(FieldValue::Nested(extra)) => Some(extra),
				Some(other) => {
					return Err(FixtureError::malformed(
						model,
						format!(
							"defaults for a single description must be a description, got {}",
							other.kind()
						),
					));
				}
			};
			Ok(Normalized::One(with_defaults(normalize(description), extra)))
		}
		FieldValue::List(items) => {
			let mut out = Vec::with_capacity(items.len());
			flatten(model, items, defaults, &mut out)?;
			Ok(Normalized::Many(out))
		}
		other => Err(FixtureError::malformed(
			model,
			format!("expected a description or a sequence, got {}", other.kind()),
		)),
	}
}

fn flatten(
	model: &str,
	items: Vec<FieldValue>,
	defaults: Option<FieldValue>,
	out: &mut Vec<NormalizedDescription>,
) -> FixtureResult<()> {
	let paired: Vec<Option<FieldValue>> = match defaults {
		Some(FieldValue::List(defaults)) => {
			if defaults.len() != items.len() {
				return Err(FixtureError::malformed(
					model,
					format!(
						"{} descriptions but {} positional defaults",
						items.len(),
						defaults.len()
					),
				));
			}
			defaults.into_iter().map(Some).collect()
		}
		shared => vec![shared; items.len()],
	};

	for (item, defaults) in items.into_iter().zip(paired) {
		match item {
			FieldValue::List(nested) => flatten(model, nested, defaults, out)?,
			item => match normalize_input(model, item, defaults)? {
				Normalized::One(normalized) => out.push(normalized),
				Normalized::Many(many) => out.extend(many),
			},
		}
	}
	Ok(())
}

fn with_defaults(
	mut normalized: NormalizedDescription,
	extra: Option<Description>,
) -> NormalizedDescription {
	if let Some(extra) = extra {
		normalized.defaults.merge(extra);
	}
	normalized
}
